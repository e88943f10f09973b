use crate::{
	find::{ClusterLister, Error, Result},
	kubemodel::{Reference, ResourceKind},
};
use k8s_openapi::api::core::v1::{EnvFromSource, EnvVar, Pod, Volume};
use kube::ResourceExt;

/// References made by all scanned pods
///
/// Built once by [`collect`], never modified afterwards. May contain
/// duplicates, consumers only check for presence.
#[derive(Debug, Default)]
pub struct Inventory {
	used: Vec<Reference>,
}

impl Inventory {
	pub fn used(&self, kind: ResourceKind) -> impl Iterator<Item = &Reference> {
		self.used.iter().filter(move |r| r.kind == kind)
	}

	pub fn len(&self) -> usize {
		self.used.len()
	}
}

#[cfg(test)]
impl FromIterator<Reference> for Inventory {
	fn from_iter<T: IntoIterator<Item = Reference>>(iter: T) -> Self {
		Self {
			used: iter.into_iter().collect(),
		}
	}
}

/// Scan pods of every namespace, fails on first namespace which can't be listed
pub async fn collect(lister: &impl ClusterLister, namespaces: &[String]) -> Result<Inventory> {
	if namespaces.is_empty() {
		return Err(Error::NoNamespaces);
	}
	let mut used = Vec::new();
	for namespace in namespaces {
		let pods = lister.list_pods(namespace).await?;
		log::debug!("Scanning {} pods in {}", pods.len(), namespace);
		for pod in &pods {
			used.extend(pod_references(pod, namespace));
		}
	}
	Ok(Inventory { used })
}

/// Every secret, configmap, service account and pvc mentioned in pod spec
pub fn pod_references(pod: &Pod, listed_namespace: &str) -> Vec<Reference> {
	let namespace = pod
		.namespace()
		.unwrap_or_else(|| listed_namespace.to_owned());
	let mut extractor = Extractor {
		namespace: &namespace,
		out: Vec::new(),
	};
	let spec = match &pod.spec {
		Some(spec) => spec,
		None => return extractor.out,
	};

	for container in &spec.containers {
		extractor.env(container.env.as_deref(), container.env_from.as_deref());
	}
	for volume in spec.volumes.iter().flatten() {
		extractor.volume(volume);
	}
	if let Some(service_account) = &spec.service_account_name {
		extractor.push(ResourceKind::ServiceAccount, service_account);
	}

	log::trace!(
		"Pod {} in {} references {} objects",
		pod.name_any(),
		namespace,
		extractor.out.len()
	);
	extractor.out
}

struct Extractor<'a> {
	namespace: &'a str,
	out: Vec<Reference>,
}

impl Extractor<'_> {
	fn push(&mut self, kind: ResourceKind, name: &str) {
		if name.is_empty() {
			return;
		}
		self.out.push(Reference::new(kind, name, self.namespace));
	}

	fn env(&mut self, env: Option<&[EnvVar]>, env_from: Option<&[EnvFromSource]>) {
		for source in env.into_iter().flatten().filter_map(|e| e.value_from.as_ref()) {
			if let Some(secret) = &source.secret_key_ref {
				self.push(ResourceKind::Secret, &secret.name);
			}
			if let Some(config_map) = &source.config_map_key_ref {
				self.push(ResourceKind::ConfigMap, &config_map.name);
			}
		}
		for source in env_from.into_iter().flatten() {
			if let Some(secret) = &source.secret_ref {
				self.push(ResourceKind::Secret, &secret.name);
			}
			if let Some(config_map) = &source.config_map_ref {
				self.push(ResourceKind::ConfigMap, &config_map.name);
			}
		}
	}

	fn volume(&mut self, volume: &Volume) {
		if let Some(name) = volume.secret.as_ref().and_then(|s| s.secret_name.as_ref()) {
			self.push(ResourceKind::Secret, name);
		}
		if let Some(config_map) = &volume.config_map {
			self.push(ResourceKind::ConfigMap, &config_map.name);
		}
		if let Some(claim) = &volume.persistent_volume_claim {
			self.push(ResourceKind::PersistentVolumeClaim, &claim.claim_name);
		}
	}
}
