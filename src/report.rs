use crate::{
	collect::Inventory,
	find::{ClusterLister, Error, Result},
	kubemodel::{Reference, ResourceKind},
};
use rustc_hash::FxHashSet;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::fmt::{self, Display};

/// Elements of `existing` whose name and namespace don't occur in `used`
///
/// Order of `existing` is preserved, duplicates in it are kept as-is.
pub fn missing<'a>(
	used: impl IntoIterator<Item = &'a Reference>,
	existing: impl IntoIterator<Item = Reference>,
) -> Vec<Reference> {
	let index: FxHashSet<(&str, &str)> = used.into_iter().map(Reference::key).collect();
	existing
		.into_iter()
		.filter(|r| !index.contains(&r.key()))
		.collect()
}

/// Objects of `kind` in `namespaces`, which aren't referenced by any collected pod
pub async fn find_unused(
	lister: &impl ClusterLister,
	kind: ResourceKind,
	namespaces: &[String],
	inventory: &Inventory,
) -> Result<Vec<Reference>> {
	if namespaces.is_empty() {
		return Err(Error::NoNamespaces);
	}
	let mut existing = Vec::new();
	for namespace in namespaces {
		existing.extend(lister.list_objects(kind, namespace).await?);
	}
	log::debug!("Found {} existing {}", existing.len(), kind.plural());
	Ok(missing(inventory.used(kind), existing))
}

/// Unused objects, grouped by kind
#[derive(Debug, Default)]
pub struct Report {
	sections: Vec<(ResourceKind, Vec<Reference>)>,
}

impl Report {
	pub fn push(&mut self, kind: ResourceKind, unused: Vec<Reference>) {
		self.sections.push((kind, unused));
	}

	pub fn total(&self) -> usize {
		self.sections.iter().map(|(_, unused)| unused.len()).sum()
	}
}

/// Serialized as map from resource name to unused objects
impl Serialize for Report {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.sections.len()))?;
		for (kind, unused) in &self.sections {
			map.serialize_entry(kind.plural(), unused)?;
		}
		map.end()
	}
}

impl Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (kind, unused) in &self.sections {
			writeln!(f, "Unused {}", kind.title())?;
			for reference in unused {
				writeln!(f, "\t{} {}", reference.name, reference.namespace)?;
			}
		}
		Ok(())
	}
}
