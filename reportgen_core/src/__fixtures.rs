use std::collections::HashMap;

use serde_json::Value;

use crate::DataSourceDefinition;
use crate::Invocation;
use crate::QueryEngine;
use crate::QueryFailure;
use crate::Row;
use crate::RowSet;

/// An in-memory engine that answers by routine name and records every call.
#[derive(Debug, Default)]
pub struct RecordingEngine {
	pub results: HashMap<String, Result<RowSet, QueryFailure>>,
	/// `(datasource, object)` of every executed call, in order.
	pub calls: Vec<(String, String)>,
}

impl RecordingEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_rows(mut self, object: &str, rows: RowSet) -> Self {
		self.results.insert(object.to_string(), Ok(rows));
		self
	}

	pub fn with_failure(mut self, object: &str, failure: QueryFailure) -> Self {
		self.results.insert(object.to_string(), Err(failure));
		self
	}
}

impl QueryEngine for RecordingEngine {
	fn execute(
		&mut self,
		source: &DataSourceDefinition,
		invocation: &Invocation<'_>,
	) -> Result<RowSet, QueryFailure> {
		let object = invocation.object();
		self.calls.push((source.name.clone(), object.to_string()));
		self.results.get(object).cloned().unwrap_or_else(|| Ok(RowSet::new()))
	}
}

pub fn row(cells: &[(&str, &str)]) -> Row {
	cells
		.iter()
		.map(|(column, value)| (*column, Value::String((*value).to_string())))
		.collect()
}

pub fn datasource_line(name: &str) -> String {
	format!(
		r#"{{% datasource name="{name}" server="db01" database="sales" user="report" password="secret" %}}"#
	)
}

pub fn dataset_line(datasource: &str, name: &str, object: &str) -> String {
	format!(
		r#"{{% dataset datasource="{datasource}" name="{name}" object="{object}" type="stored procedure" %}}"#
	)
}

/// A template declaring datasource `primary` with datasets `DS`, `DS1` and
/// `DS2` over routines `sp_ds`, `sp_ds1` and `sp_ds2`, followed by `body`.
pub fn template_with(body: &str) -> String {
	[
		datasource_line("primary"),
		dataset_line("primary", "DS", "sp_ds"),
		dataset_line("primary", "DS1", "sp_ds1"),
		dataset_line("primary", "DS2", "sp_ds2"),
		body.to_string(),
	]
	.join("\n")
}
