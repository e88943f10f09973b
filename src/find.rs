use crate::kubemodel::{Reference, ResourceKind};
use k8s_openapi::{
	api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, ServiceAccount},
	NamespaceResourceScope,
};
use kube::{
	api::{Api, ListParams},
	Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("failed to list {kind} in namespace {namespace}")]
	List {
		kind: &'static str,
		namespace: String,
		source: Box<dyn std::error::Error + Send + Sync>,
	},
	#[error("no namespaces specified")]
	NoNamespaces,
	#[error("run deadline of {0:?} exceeded")]
	DeadlineExceeded(Duration),
}
pub type Result<T> = std::result::Result<T, Error>;

/// Read-only view of cluster, scoped to single namespace per call
#[allow(async_fn_in_trait)]
pub trait ClusterLister {
	async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>>;
	/// List objects of given kind, in order returned by api
	async fn list_objects(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Reference>>;
}

pub struct KubeLister {
	client: Client,
}

impl KubeLister {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	async fn list<K>(&self, plural: &'static str, namespace: &str) -> Result<Vec<K>>
	where
		K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
		K::DynamicType: Default,
	{
		log::debug!("Listing {} in {}", plural, namespace);
		let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
		let list = api
			.list(&ListParams::default())
			.await
			.map_err(|e| Error::List {
				kind: plural,
				namespace: namespace.to_owned(),
				source: Box::new(e),
			})?;
		Ok(list.items)
	}

	async fn list_references<K>(
		&self,
		kind: ResourceKind,
		namespace: &str,
	) -> Result<Vec<Reference>>
	where
		K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
		K::DynamicType: Default,
	{
		Ok(self
			.list::<K>(kind.plural(), namespace)
			.await?
			.into_iter()
			.map(|object| {
				let object_namespace = object
					.namespace()
					.unwrap_or_else(|| namespace.to_owned());
				Reference::new(kind, object.name_any(), object_namespace)
			})
			.collect())
	}
}

impl ClusterLister for KubeLister {
	async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
		self.list::<Pod>("pods", namespace).await
	}

	async fn list_objects(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Reference>> {
		match kind {
			ResourceKind::Secret => self.list_references::<Secret>(kind, namespace).await,
			ResourceKind::ConfigMap => self.list_references::<ConfigMap>(kind, namespace).await,
			ResourceKind::ServiceAccount => {
				self.list_references::<ServiceAccount>(kind, namespace).await
			}
			ResourceKind::PersistentVolumeClaim => {
				self.list_references::<PersistentVolumeClaim>(kind, namespace).await
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use kube::Config;
	use serde_json::json;
	use wiremock::{
		matchers::{method, path},
		Mock, MockServer, ResponseTemplate,
	};

	async fn lister_for(server: &MockServer) -> KubeLister {
		let config = Config::new(server.uri().parse().unwrap());
		KubeLister::new(Client::try_from(config).unwrap())
	}

	#[tokio::test]
	async fn lists_objects_in_api_order() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/namespaces/test/configmaps"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"apiVersion": "v1",
				"kind": "ConfigMapList",
				"metadata": {},
				"items": [
					{ "metadata": { "name": "zeta", "namespace": "test" } },
					{ "metadata": { "name": "alpha", "namespace": "test" } },
				],
			})))
			.mount(&server)
			.await;

		let lister = lister_for(&server).await;
		let found = lister
			.list_objects(ResourceKind::ConfigMap, "test")
			.await
			.unwrap();
		assert_eq!(
			found,
			vec![
				Reference::new(ResourceKind::ConfigMap, "zeta", "test"),
				Reference::new(ResourceKind::ConfigMap, "alpha", "test"),
			]
		);
	}

	#[tokio::test]
	async fn lists_pods() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/namespaces/test/pods"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"apiVersion": "v1",
				"kind": "PodList",
				"metadata": {},
				"items": [{
					"metadata": { "name": "web", "namespace": "test" },
					"spec": {
						"serviceAccountName": "web",
						"containers": [{ "name": "web", "image": "nginx" }],
					},
				}],
			})))
			.mount(&server)
			.await;

		let lister = lister_for(&server).await;
		let pods = lister.list_pods("test").await.unwrap();
		assert_eq!(pods.len(), 1);
		assert_eq!(pods[0].name_any(), "web");
	}

	#[tokio::test]
	async fn api_error_carries_kind_and_namespace() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/namespaces/locked/secrets"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({
				"apiVersion": "v1",
				"kind": "Status",
				"metadata": {},
				"status": "Failure",
				"message": "secrets is forbidden",
				"reason": "Forbidden",
				"code": 403,
			})))
			.mount(&server)
			.await;

		let lister = lister_for(&server).await;
		let result = lister.list_objects(ResourceKind::Secret, "locked").await;
		assert_matches!(
			result,
			Err(Error::List { kind: "secrets", namespace, .. }) if namespace == "locked"
		);
	}
}
