use crate::DataSetDefinition;
use crate::DataSourceDefinition;
use crate::DeclarationLimits;
use crate::DefinitionError;
use crate::Document;
use crate::Registries;
use crate::ReportError;
use crate::ReportResult;
use crate::document::split_lines;
use crate::grammar::DataSetGrammar;
use crate::grammar::DataSourceGrammar;
use crate::grammar::Grammar;
use crate::grammar::TokenizedLine;
use crate::grammar::parse_attributes;

/// The declarations of a template, separated from its body.
#[derive(Debug, Clone)]
pub struct ParsedTemplate {
	pub registries: Registries,
	/// Every line that was not an accepted declaration, verbatim and in order.
	pub body: Document,
}

/// Extract and validate the datasource and dataset declarations of a raw
/// template.
///
/// Lines are read in order, so a dataset can only reference a datasource
/// declared above it. Each kind keeps a running count of matching lines and a
/// declaration is only accepted while the count before it is at most the
/// kind's ceiling. A declaration past its ceiling is not treated specially and
/// ends up in the body as plain text.
///
/// Any malformed declaration, duplicate name or unknown datasource reference
/// aborts the parse.
pub fn parse_declarations(template: &str, limits: &DeclarationLimits) -> ReportResult<ParsedTemplate> {
	let mut registries = Registries::default();
	let mut body = Document::new();
	let mut source_count = 0usize;
	let mut set_count = 0usize;

	for (index, line) in split_lines(template).into_iter().enumerate() {
		let line_number = index + 1;
		let tokens = TokenizedLine::new(line);

		if let Some(declaration) = DataSourceGrammar.parse_tokens(&tokens) {
			let within = source_count <= limits.max_datasources;
			source_count += 1;

			if within {
				let definition = parse_data_source(&declaration.definition)
					.map_err(|reason| malformed("datasource", line_number, reason))?;
				tracing::debug!(
					name = %definition.name,
					line = line_number,
					"registered datasource"
				);
				registries.data_sources.register(definition)?;
				continue;
			}

			tracing::debug!(line = line_number, "datasource ceiling reached");
		}

		if let Some(declaration) = DataSetGrammar.parse_tokens(&tokens) {
			let within = set_count <= limits.max_datasets;
			set_count += 1;

			if within {
				let definition = parse_data_set(&declaration.definition)
					.map_err(|reason| malformed("dataset", line_number, reason))?;

				if !registries.data_sources.contains(&definition.data_source) {
					return Err(ReportError::UnknownReference {
						dataset: definition.name,
						datasource: definition.data_source,
					});
				}

				tracing::debug!(
					name = %definition.name,
					datasource = %definition.data_source,
					line = line_number,
					"registered dataset"
				);
				registries.data_sets.register(definition)?;
				continue;
			}

			tracing::debug!(line = line_number, "dataset ceiling reached");
		}

		body.push_text(line);
	}

	tracing::debug!(
		datasources = registries.data_sources.len(),
		datasets = registries.data_sets.len(),
		lines = body.len(),
		"parsed declarations"
	);

	Ok(ParsedTemplate { registries, body })
}

fn parse_data_source(definition: &str) -> Result<DataSourceDefinition, DefinitionError> {
	DataSourceDefinition::from_attributes(&parse_attributes(definition)?)
}

fn parse_data_set(definition: &str) -> Result<DataSetDefinition, DefinitionError> {
	DataSetDefinition::from_attributes(&parse_attributes(definition)?)
}

fn malformed(kind: &'static str, line: usize, reason: DefinitionError) -> ReportError {
	ReportError::MalformedDeclaration { kind, line, reason }
}
