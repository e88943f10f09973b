use serde::Serialize;
use std::fmt::{self, Display};

/// Object kinds which may be referenced from a pod spec
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum ResourceKind {
	Secret,
	ConfigMap,
	ServiceAccount,
	PersistentVolumeClaim,
}

impl ResourceKind {
	/// All kinds, in report order
	pub const ALL: [ResourceKind; 4] = [
		ResourceKind::Secret,
		ResourceKind::ConfigMap,
		ResourceKind::ServiceAccount,
		ResourceKind::PersistentVolumeClaim,
	];

	/// Resource name, as used in api paths
	pub fn plural(self) -> &'static str {
		match self {
			Self::Secret => "secrets",
			Self::ConfigMap => "configmaps",
			Self::ServiceAccount => "serviceaccounts",
			Self::PersistentVolumeClaim => "persistentvolumeclaims",
		}
	}

	pub fn title(self) -> &'static str {
		match self {
			Self::Secret => "Secrets",
			Self::ConfigMap => "ConfigMaps",
			Self::ServiceAccount => "Service Accounts",
			Self::PersistentVolumeClaim => "Persistent Volume Claims",
		}
	}
}

impl Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self {
			Self::Secret => "Secret",
			Self::ConfigMap => "ConfigMap",
			Self::ServiceAccount => "ServiceAccount",
			Self::PersistentVolumeClaim => "PersistentVolumeClaim",
		};
		f.write_str(kind)
	}
}

/// Identifies namespaced object of known kind in cluster
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Reference {
	#[serde(skip)]
	pub kind: ResourceKind,

	pub name: String,
	pub namespace: String,
}

impl Reference {
	pub fn new(kind: ResourceKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			kind,
			name: name.into(),
			namespace: namespace.into(),
		}
	}

	/// Identity of referenced object, kind is implied by caller
	pub fn key(&self) -> (&str, &str) {
		(&self.name, &self.namespace)
	}
}

impl Display for Reference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} in {}", self.kind, self.name, self.namespace)
	}
}
