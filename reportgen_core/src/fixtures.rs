//! An in-process [`QueryEngine`] that answers from a fixture file instead of a
//! live database. Useful for previews, demos and tests.
//!
//! The file maps datasource names to routine names to rows:
//!
//! ```toml
//! [[primary.sp_orders]]
//! customer = "Ada"
//! total = 120
//!
//! [[primary.sp_orders]]
//! customer = "Grace"
//! total = 75
//! ```
//!
//! JSON and YAML files with the same shape are accepted too.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::DataSourceDefinition;
use crate::Invocation;
use crate::QueryEngine;
use crate::QueryFailure;
use crate::ReportError;
use crate::ReportResult;
use crate::Row;
use crate::RowSet;

#[derive(Debug, Clone, Default)]
pub struct FixtureQueryEngine {
	sources: HashMap<String, HashMap<String, RowSet>>,
}

impl FixtureQueryEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the rows a routine returns for a datasource.
	#[must_use]
	pub fn with_rows(
		mut self,
		data_source: impl Into<String>,
		object: impl Into<String>,
		rows: RowSet,
	) -> Self {
		self.sources
			.entry(data_source.into())
			.or_default()
			.insert(object.into(), rows);
		self
	}

	/// Load fixtures from a file, choosing the format from its extension.
	pub fn load(path: &Path) -> ReportResult<Self> {
		let path_display = path.display().to_string();
		let content = std::fs::read_to_string(path).map_err(|e| {
			ReportError::FixtureFile {
				path: path_display.clone(),
				reason: e.to_string(),
			}
		})?;
		let format = path
			.extension()
			.and_then(|e| e.to_str())
			.unwrap_or("")
			.to_ascii_lowercase();

		Self::parse(&content, &format, &path_display)
	}

	/// Parse fixture content in the given format (`json`, `toml`, `yaml` or
	/// `yml`).
	pub fn parse(content: &str, format: &str, path_display: &str) -> ReportResult<Self> {
		let value = parse_fixture_file(content, format, path_display)?;
		Self::from_value(&value, path_display)
	}

	fn from_value(value: &Value, path_display: &str) -> ReportResult<Self> {
		let invalid = |reason: String| {
			ReportError::FixtureFile {
				path: path_display.to_string(),
				reason,
			}
		};

		let Value::Object(sources) = value else {
			return Err(invalid("expected a table of datasources".to_string()));
		};

		let mut engine = Self::new();
		for (data_source, objects) in sources {
			let Value::Object(objects) = objects else {
				return Err(invalid(format!(
					"datasource `{data_source}` must be a table of routines"
				)));
			};

			for (object, rows) in objects {
				let Value::Array(rows) = rows else {
					return Err(invalid(format!(
						"`{data_source}.{object}` must be a list of rows"
					)));
				};

				let rows = rows
					.iter()
					.map(|row| {
						match row {
							Value::Object(cells) => {
								Ok(cells
									.iter()
									.map(|(column, value)| (column.clone(), value.clone()))
									.collect::<Row>())
							}
							_ => {
								Err(invalid(format!(
									"rows of `{data_source}.{object}` must be tables"
								)))
							}
						}
					})
					.collect::<ReportResult<RowSet>>()?;

				engine
					.sources
					.entry(data_source.clone())
					.or_default()
					.insert(object.clone(), rows);
			}
		}

		Ok(engine)
	}
}

impl QueryEngine for FixtureQueryEngine {
	fn execute(
		&mut self,
		source: &DataSourceDefinition,
		invocation: &Invocation<'_>,
	) -> Result<RowSet, QueryFailure> {
		let Some(objects) = self.sources.get(&source.name) else {
			return Err(QueryFailure::Connection {
				data_source: source.name.clone(),
				reason: "no fixtures for this datasource".to_string(),
			});
		};

		let object = invocation.object();
		objects.get(object).cloned().ok_or_else(|| {
			QueryFailure::Execution {
				object: object.to_string(),
				reason: format!("no fixture rows in `{}`", source.name),
			}
		})
	}
}

fn parse_fixture_file(content: &str, format: &str, path_display: &str) -> ReportResult<Value> {
	match format {
		"json" => {
			serde_json::from_str(content).map_err(|e| {
				ReportError::FixtureFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})
		}
		"toml" => {
			let toml_value: toml::Value = toml::from_str(content).map_err(|e| {
				ReportError::FixtureFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})?;
			Ok(toml_to_json(toml_value))
		}
		"yaml" | "yml" => {
			serde_yaml_ng::from_str(content).map_err(|e| {
				ReportError::FixtureFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})
		}
		other => Err(ReportError::UnsupportedFixtureFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`. Integers stay integers
/// and non-finite floats become strings so every cell stays printable.
fn toml_to_json(value: toml::Value) -> Value {
	match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::Number(i.into()),
		toml::Value::Float(f) => {
			serde_json::Number::from_f64(f).map_or_else(|| Value::String(f.to_string()), Value::Number)
		}
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
		toml::Value::Table(table) => {
			Value::Object(
				table
					.into_iter()
					.map(|(k, v)| (k, toml_to_json(v)))
					.collect(),
			)
		}
	}
}
