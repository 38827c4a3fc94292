use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::PageSize;
use crate::ReportError;
use crate::ReportResult;

/// Default ceiling on datasource declarations per template.
pub const DEFAULT_MAX_DATASOURCES: usize = 10;

/// Default ceiling on dataset declarations per template.
pub const DEFAULT_MAX_DATASETS: usize = 50;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"reportgen.toml",
	".reportgen.toml",
	".config/reportgen.toml",
];

/// Settings for a report run, read from `reportgen.toml`.
///
/// ```toml
/// template_path = "templates"
/// template_file = "sales.html"
/// output_path = "out"
/// page_size = "a4"
///
/// [limits]
/// max_datasources = 10
/// max_datasets = 50
///
/// [fixtures]
/// path = "fixtures/sales.toml"
/// ```
///
/// Relative paths are resolved against the project root.
#[derive(Debug, Default, Deserialize)]
pub struct ReportConfig {
	/// Directory containing templates.
	#[serde(default)]
	pub template_path: Option<PathBuf>,
	/// Template file name inside `template_path`.
	#[serde(default)]
	pub template_file: Option<PathBuf>,
	/// Directory the rendered report is written to.
	#[serde(default)]
	pub output_path: Option<PathBuf>,
	#[serde(default)]
	pub page_size: PageSize,
	#[serde(default)]
	pub limits: DeclarationLimits,
	#[serde(default)]
	pub fixtures: FixturesConfig,
}

/// How many declarations of each kind the parser accepts. Declarations past
/// a ceiling are left in the document as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeclarationLimits {
	#[serde(default = "default_max_datasources")]
	pub max_datasources: usize,
	#[serde(default = "default_max_datasets")]
	pub max_datasets: usize,
}

impl Default for DeclarationLimits {
	fn default() -> Self {
		Self {
			max_datasources: DEFAULT_MAX_DATASOURCES,
			max_datasets: DEFAULT_MAX_DATASETS,
		}
	}
}

fn default_max_datasources() -> usize {
	DEFAULT_MAX_DATASOURCES
}

fn default_max_datasets() -> usize {
	DEFAULT_MAX_DATASETS
}

/// Where query results come from when no database engine is wired in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixturesConfig {
	#[serde(default)]
	pub path: Option<PathBuf>,
}

impl ReportConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> ReportResult<Option<ReportConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: ReportConfig =
			toml::from_str(&content).map_err(|e| ReportError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}

	/// The full template path, `template_path` joined with `template_file`,
	/// relative to `root`.
	pub fn template(&self, root: &Path) -> ReportResult<PathBuf> {
		let file = self
			.template_file
			.as_ref()
			.ok_or_else(|| ReportError::MissingSetting("template_file".to_string()))?;
		let directory = self
			.template_path
			.as_ref()
			.ok_or_else(|| ReportError::MissingSetting("template_path".to_string()))?;

		Ok(root.join(directory).join(file))
	}

	/// The output directory relative to `root`.
	pub fn output_directory(&self, root: &Path) -> ReportResult<PathBuf> {
		self.output_path
			.as_ref()
			.map(|path| root.join(path))
			.ok_or_else(|| ReportError::MissingSetting("output_path".to_string()))
	}

	/// The fixture file relative to `root`, if configured.
	pub fn fixtures_file(&self, root: &Path) -> Option<PathBuf> {
		self.fixtures.path.as_ref().map(|path| root.join(path))
	}
}
