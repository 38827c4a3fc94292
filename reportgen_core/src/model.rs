use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::DefinitionError;
use crate::grammar::Attributes;
use crate::query::Invocation;

/// Upper bound on `param` attributes read from one dataset declaration.
pub const MAX_DATASET_PARAMETERS: usize = 100;

/// Something stored in a [`Registry`](crate::Registry) under its own name.
pub trait Named {
	fn name(&self) -> &str;
}

/// Connection details for one relational datasource.
///
/// ```html
/// {% datasource name="primary" server="db01" database="sales" user="report" password="secret" %}
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceDefinition {
	pub name: String,
	pub server: String,
	pub database: String,
	pub user: String,
	#[serde(skip)]
	pub password: String,
}

impl DataSourceDefinition {
	/// Build a definition from declaration attributes. All five attributes are
	/// mandatory.
	pub fn from_attributes(attributes: &Attributes) -> Result<Self, DefinitionError> {
		Ok(Self {
			name: attributes.require("name")?.to_string(),
			server: attributes.require("server")?.to_string(),
			database: attributes.require("database")?.to_string(),
			user: attributes.require("user")?.to_string(),
			password: attributes.require("password")?.to_string(),
		})
	}

	/// The connection descriptor handed to the query engine.
	pub fn connection_string(&self) -> String {
		format!(
			"Data Source={}; Initial Catalog={}; User ID={}; Password={}",
			self.server, self.database, self.user, self.password
		)
	}
}

impl fmt::Debug for DataSourceDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DataSourceDefinition")
			.field("name", &self.name)
			.field("server", &self.server)
			.field("database", &self.database)
			.field("user", &self.user)
			.field("password", &"<redacted>")
			.finish()
	}
}

impl Named for DataSourceDefinition {
	fn name(&self) -> &str {
		&self.name
	}
}

/// What kind of object a dataset reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DataSetType {
	Table,
	View,
	StoredProcedure,
	Function,
}

impl DataSetType {
	/// How a dataset of this type is executed, if it can be executed at all.
	///
	/// Only stored procedures have an execution path. Tables, views and
	/// functions are accepted in declarations but yield `None` here.
	pub fn invocation<'a>(&self, data_set: &'a DataSetDefinition) -> Option<Invocation<'a>> {
		match self {
			Self::StoredProcedure => {
				Some(Invocation::StoredProcedure {
					object: &data_set.object,
					parameters: &data_set.parameters,
				})
			}
			Self::Table | Self::View | Self::Function => None,
		}
	}
}

impl FromStr for DataSetType {
	type Err = DefinitionError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"table" => Ok(Self::Table),
			"view" => Ok(Self::View),
			"stored procedure" => Ok(Self::StoredProcedure),
			"function" => Ok(Self::Function),
			other => Err(DefinitionError::InvalidDataSetType(other.to_string())),
		}
	}
}

impl fmt::Display for DataSetType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Table => write!(f, "table"),
			Self::View => write!(f, "view"),
			Self::StoredProcedure => write!(f, "stored procedure"),
			Self::Function => write!(f, "function"),
		}
	}
}

/// Column types a dataset parameter may declare. Parsing is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterDataType {
	Bit,
	TinyInt,
	Int,
	BigInt,
	Decimal,
	Float,
	Real,
	Char,
	VarChar,
	Text,
	NChar,
	NVarChar,
	NText,
	Date,
	DateTime,
	Time,
}

impl ParameterDataType {
	pub const ALL: [Self; 16] = [
		Self::Bit,
		Self::TinyInt,
		Self::Int,
		Self::BigInt,
		Self::Decimal,
		Self::Float,
		Self::Real,
		Self::Char,
		Self::VarChar,
		Self::Text,
		Self::NChar,
		Self::NVarChar,
		Self::NText,
		Self::Date,
		Self::DateTime,
		Self::Time,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Bit => "BIT",
			Self::TinyInt => "TINYINT",
			Self::Int => "INT",
			Self::BigInt => "BIGINT",
			Self::Decimal => "DECIMAL",
			Self::Float => "FLOAT",
			Self::Real => "REAL",
			Self::Char => "CHAR",
			Self::VarChar => "VARCHAR",
			Self::Text => "TEXT",
			Self::NChar => "NCHAR",
			Self::NVarChar => "NVARCHAR",
			Self::NText => "NTEXT",
			Self::Date => "DATE",
			Self::DateTime => "DATETIME",
			Self::Time => "TIME",
		}
	}
}

impl FromStr for ParameterDataType {
	type Err = DefinitionError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|data_type| data_type.as_str().eq_ignore_ascii_case(value))
			.ok_or_else(|| DefinitionError::InvalidParameterType(value.to_string()))
	}
}

impl fmt::Display for ParameterDataType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One declared parameter of a dataset: `param="name,type,size"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSetParameter {
	pub name: String,
	pub data_type: ParameterDataType,
	pub size: u32,
}

impl DataSetParameter {
	/// Parse a `name,type,size` definition. Empty fields are dropped before
	/// counting, and exactly three must remain.
	pub fn parse_definition(definition: &str) -> Result<Self, DefinitionError> {
		let fields: Vec<&str> = definition
			.split(',')
			.map(str::trim)
			.filter(|field| !field.is_empty())
			.collect();

		let [name, data_type, size] = fields.as_slice() else {
			return Err(DefinitionError::ParameterFieldCount {
				definition: definition.to_string(),
				found: fields.len(),
			});
		};

		let data_type = data_type.parse::<ParameterDataType>()?;
		let size = size
			.parse::<u32>()
			.map_err(|_| DefinitionError::InvalidParameterSize((*size).to_string()))?;

		Ok(Self {
			name: (*name).to_string(),
			data_type,
			size,
		})
	}
}

impl FromStr for DataSetParameter {
	type Err = DefinitionError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Self::parse_definition(value)
	}
}

/// A named query bound to one datasource.
///
/// ```html
/// {% dataset datasource="primary" name="orders" object="sp_orders" type="stored procedure" param="year,int,4" %}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSetDefinition {
	/// Name of the datasource this dataset runs against.
	pub data_source: String,
	pub dataset_type: DataSetType,
	pub name: String,
	/// The table, view, procedure or function identifier.
	pub object: String,
	/// Parameters in declaration order.
	pub parameters: Vec<DataSetParameter>,
}

impl DataSetDefinition {
	/// Build a definition from declaration attributes. `datasource`, `name`,
	/// `type` and `object` are mandatory. Parameters are read from successive
	/// `param` attributes up to the first empty one.
	pub fn from_attributes(attributes: &Attributes) -> Result<Self, DefinitionError> {
		let data_source = attributes.require("datasource")?.to_string();
		let name = attributes.require("name")?.to_string();
		let dataset_type = attributes
			.get("type")
			.ok_or(DefinitionError::MissingAttribute("type"))?
			.parse::<DataSetType>()?;
		let object = attributes.require("object")?.to_string();

		let parameters = attributes
			.params()
			.iter()
			.take(MAX_DATASET_PARAMETERS)
			.take_while(|definition| !definition.is_empty())
			.map(|definition| DataSetParameter::parse_definition(definition))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			data_source,
			dataset_type,
			name,
			object,
			parameters,
		})
	}

	/// Parameters keyed `param1..paramN` in declaration order.
	pub fn keyed_parameters(&self) -> impl Iterator<Item = (String, &DataSetParameter)> {
		self.parameters
			.iter()
			.enumerate()
			.map(|(index, parameter)| (format!("param{}", index + 1), parameter))
	}
}

impl Named for DataSetDefinition {
	fn name(&self) -> &str {
		&self.name
	}
}
