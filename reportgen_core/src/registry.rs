use std::collections::BTreeMap;

use crate::DataSetDefinition;
use crate::DataSourceDefinition;
use crate::Named;
use crate::ReportError;
use crate::ReportResult;

/// Definitions of one kind keyed by their unique name.
#[derive(Debug, Clone)]
pub struct Registry<T> {
	kind: &'static str,
	entries: BTreeMap<String, T>,
}

impl<T: Named> Registry<T> {
	pub fn new(kind: &'static str) -> Self {
		Self {
			kind,
			entries: BTreeMap::new(),
		}
	}

	/// Store `value` under its name. A second definition with the same name is
	/// rejected.
	pub fn register(&mut self, value: T) -> ReportResult<()> {
		let name = value.name().to_string();
		if self.entries.contains_key(&name) {
			return Err(ReportError::DuplicateDefinition {
				kind: self.kind,
				name,
			});
		}

		self.entries.insert(name, value);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&T> {
		self.entries.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Definitions ordered by name.
	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.entries.values()
	}
}

/// The datasource and dataset registries built by the declaration parser and
/// read by every later pass.
#[derive(Debug, Clone)]
pub struct Registries {
	pub data_sources: Registry<DataSourceDefinition>,
	pub data_sets: Registry<DataSetDefinition>,
}

impl Default for Registries {
	fn default() -> Self {
		Self {
			data_sources: Registry::new("datasource"),
			data_sets: Registry::new("dataset"),
		}
	}
}

impl Registries {
	/// The datasource a dataset runs against.
	pub fn data_source_for(&self, data_set: &DataSetDefinition) -> Option<&DataSourceDefinition> {
		self.data_sources.get(&data_set.data_source)
	}
}
