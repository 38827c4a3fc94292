use serde_json::Value;
use thiserror::Error;

use crate::DataSetParameter;
use crate::DataSetType;
use crate::DataSourceDefinition;

/// What to run against a datasource on behalf of a dataset.
///
/// Each dataset type that can be executed has its own variant; adding an
/// execution path for another type is a new variant here plus a new arm in
/// [`DataSetType::invocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Invocation<'a> {
	/// Call a named stored routine. Declared parameters are passed along for
	/// engines that want to bind them.
	StoredProcedure {
		object: &'a str,
		parameters: &'a [DataSetParameter],
	},
}

impl Invocation<'_> {
	/// The identifier being executed.
	pub fn object(&self) -> &str {
		match self {
			Self::StoredProcedure { object, .. } => object,
		}
	}
}

/// A non-fatal failure to obtain rows for a dataset. The pipeline treats
/// every variant as "no rows".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QueryFailure {
	#[error("cannot connect to datasource `{data_source}`: {reason}")]
	Connection { data_source: String, reason: String },

	#[error("executing `{object}` failed: {reason}")]
	Execution { object: String, reason: String },

	#[error("{dataset_type} datasets have no execution path")]
	Unsupported { dataset_type: DataSetType },
}

/// One result row: named cells in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
	cells: Vec<(String, Value)>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
		self.cells.push((column.into(), value.into()));
		self
	}

	/// Look up a column, exactly first and then ignoring ASCII case.
	pub fn get(&self, column: &str) -> Option<&Value> {
		self.cells
			.iter()
			.find(|(name, _)| name == column)
			.or_else(|| {
				self.cells
					.iter()
					.find(|(name, _)| name.eq_ignore_ascii_case(column))
			})
			.map(|(_, value)| value)
	}

	/// The string form of a column's value, or `None` if the row has no such
	/// column.
	pub fn text(&self, column: &str) -> Option<String> {
		self.get(column).map(cell_text)
	}
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
	fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
		Self {
			cells: iter
				.into_iter()
				.map(|(name, value)| (name.into(), value))
				.collect(),
		}
	}
}

/// Rows in the order the engine returned them.
pub type RowSet = Vec<Row>;

/// Null becomes the empty string and strings are used verbatim. Anything else
/// uses its JSON form.
pub fn cell_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

/// The external relational engine.
///
/// Implementations open a connection from the datasource's
/// [`connection_string`](DataSourceDefinition::connection_string), run the
/// invocation, close the connection and hand back every row. Calls are
/// blocking and are made once per loop or tag being resolved.
pub trait QueryEngine {
	fn execute(
		&mut self,
		source: &DataSourceDefinition,
		invocation: &Invocation<'_>,
	) -> Result<RowSet, QueryFailure>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &mut E {
	fn execute(
		&mut self,
		source: &DataSourceDefinition,
		invocation: &Invocation<'_>,
	) -> Result<RowSet, QueryFailure> {
		(**self).execute(source, invocation)
	}
}

impl<E: QueryEngine + ?Sized> QueryEngine for Box<E> {
	fn execute(
		&mut self,
		source: &DataSourceDefinition,
		invocation: &Invocation<'_>,
	) -> Result<RowSet, QueryFailure> {
		(**self).execute(source, invocation)
	}
}
