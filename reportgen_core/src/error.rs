use miette::Diagnostic;
use thiserror::Error;

/// Fatal failures. Any of these aborts the run before a final document is
/// produced.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ReportError {
	#[error(transparent)]
	#[diagnostic(code(reportgen::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(reportgen::config_parse),
		help("check that reportgen.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("missing setting: `{0}`")]
	#[diagnostic(
		code(reportgen::missing_setting),
		help("set `{0}` in reportgen.toml or pass it on the command line")
	)]
	MissingSetting(String),

	#[error("malformed {kind} declaration on line {line}: {reason}")]
	#[diagnostic(code(reportgen::malformed_declaration))]
	MalformedDeclaration {
		kind: &'static str,
		line: usize,
		reason: DefinitionError,
	},

	#[error("duplicate {kind} `{name}`")]
	#[diagnostic(
		code(reportgen::duplicate_definition),
		help("each {kind} name must be unique within a template")
	)]
	DuplicateDefinition { kind: &'static str, name: String },

	#[error("dataset `{dataset}` references undeclared datasource `{datasource}`")]
	#[diagnostic(
		code(reportgen::unknown_reference),
		help("declare `{{% datasource name=\"{datasource}\" ... %}}` above the dataset")
	)]
	UnknownReference { dataset: String, datasource: String },

	#[error("invalid value `{value}` for `{setting}`")]
	#[diagnostic(code(reportgen::invalid_setting), help("expected one of: {expected}"))]
	InvalidSetting {
		setting: &'static str,
		value: String,
		expected: &'static str,
	},

	#[error("failed to load fixture file `{path}`: {reason}")]
	#[diagnostic(code(reportgen::fixture_file))]
	FixtureFile { path: String, reason: String },

	#[error("unsupported fixture file format: `{0}`")]
	#[diagnostic(
		code(reportgen::unsupported_format),
		help("supported formats: json, toml, yaml, yml")
	)]
	UnsupportedFixtureFormat(String),

	#[error("rendering failed: {0}")]
	#[diagnostic(code(reportgen::render))]
	Render(String),
}

/// Why a single declaration could not be turned into a definition. The
/// declaration parser wraps these into
/// [`ReportError::MalformedDeclaration`] together with the line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DefinitionError {
	#[error("missing mandatory attribute `{0}`")]
	MissingAttribute(&'static str),

	#[error("invalid dataset type `{0}`, expected one of: table, view, stored procedure, function")]
	InvalidDataSetType(String),

	#[error("parameter definition `{definition}` has {found} field(s), expected 3 (name,type,size)")]
	ParameterFieldCount { definition: String, found: usize },

	#[error("invalid parameter data type `{0}`")]
	InvalidParameterType(String),

	#[error("invalid parameter size `{0}`")]
	InvalidParameterSize(String),

	#[error("invalid attribute syntax: {0}")]
	AttributeSyntax(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
