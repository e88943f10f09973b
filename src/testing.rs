//! In-memory cluster for exercising collection and reporting
use crate::{
	find::{ClusterLister, Error, Result},
	kubemodel::{Reference, ResourceKind},
};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use serde_json::Value;
use std::cell::RefCell;

#[derive(Default)]
pub struct FakeCluster {
	pub pods: Vec<Pod>,
	pub objects: Vec<Reference>,
	/// Namespaces for which every list call fails
	pub broken: Vec<String>,
	/// Kinds which fail to list in every namespace
	pub broken_kinds: Vec<&'static str>,
	/// Pod listing never completes
	pub hang: bool,
	pub calls: RefCell<Vec<String>>,
}

impl FakeCluster {
	pub fn with_pods(pods: impl IntoIterator<Item = Value>) -> Self {
		Self {
			pods: pods.into_iter().map(pod).collect(),
			..Default::default()
		}
	}

	fn check(&self, kind: &'static str, namespace: &str) -> Result<()> {
		self.calls
			.borrow_mut()
			.push(format!("{}/{}", kind, namespace));
		if self.broken.iter().any(|b| b == namespace) || self.broken_kinds.contains(&kind) {
			return Err(Error::List {
				kind,
				namespace: namespace.to_owned(),
				source: "listing is broken".into(),
			});
		}
		Ok(())
	}
}

impl ClusterLister for FakeCluster {
	async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
		self.check("pods", namespace)?;
		if self.hang {
			std::future::pending::<()>().await;
		}
		Ok(self
			.pods
			.iter()
			.filter(|pod| pod.namespace().as_deref() == Some(namespace))
			.cloned()
			.collect())
	}

	async fn list_objects(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Reference>> {
		self.check(kind.plural(), namespace)?;
		Ok(self
			.objects
			.iter()
			.filter(|o| o.kind == kind && o.namespace == namespace)
			.cloned()
			.collect())
	}
}

pub fn pod(value: Value) -> Pod {
	serde_json::from_value(value).expect("valid pod manifest")
}
