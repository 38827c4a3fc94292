//! The three rewrite passes run after declaration parsing.
//!
//! 1. [`extract_loops`] swaps each `{% for %}` ... `{% endfor %}` block for a
//!    typed placeholder line and captures the block body in a
//!    [`LoopRegistry`].
//! 2. [`TemplateProcessor::resolve_loops`] replaces each placeholder with one
//!    expansion of the captured body per row of the loop's dataset.
//! 3. [`TemplateProcessor::resolve_single_tags`] replaces every remaining
//!    `{{ dataset.field }}` with the field of the dataset's first row.
//!
//! Each pass reads a [`Document`] and builds a fresh one.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::DeclarationLimits;
use crate::Document;
use crate::DocumentLine;
use crate::LoopId;
use crate::QueryEngine;
use crate::QueryFailure;
use crate::Registries;
use crate::ReportResult;
use crate::Row;
use crate::RowSet;
use crate::grammar::Grammar;
use crate::grammar::LineNode;
use crate::grammar::SubstitutionGrammar;
use crate::grammar::SubstitutionTag;
use crate::grammar::classify;
use crate::parser::ParsedTemplate;
use crate::parser::parse_declarations;

/// A captured loop block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopTag {
	pub id: LoopId,
	/// The `{% for ... %}` line as written.
	pub raw: String,
	/// The dataset iterated over.
	pub data_set: String,
	/// The alias rows are bound to inside the body.
	pub inner_var: String,
	/// Every body line, trimmed and concatenated without separators.
	pub inner_html: String,
}

/// Loop blocks captured by [`extract_loops`], keyed by their placeholder id.
#[derive(Debug, Clone, Default)]
pub struct LoopRegistry {
	next_id: u32,
	loops: BTreeMap<LoopId, LoopTag>,
	unterminated: Option<LoopId>,
}

impl LoopRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	fn open(&mut self, raw: &str, data_set: String, inner_var: String) -> LoopId {
		let id = LoopId(self.next_id);
		self.next_id += 1;
		self.loops.insert(
			id,
			LoopTag {
				id,
				raw: raw.to_string(),
				data_set,
				inner_var,
				inner_html: String::new(),
			},
		);
		id
	}

	fn append(&mut self, id: LoopId, line: &str) {
		if let Some(tag) = self.loops.get_mut(&id) {
			tag.inner_html.push_str(line.trim());
		}
	}

	pub fn get(&self, id: LoopId) -> Option<&LoopTag> {
		self.loops.get(&id)
	}

	pub fn len(&self) -> usize {
		self.loops.len()
	}

	pub fn is_empty(&self) -> bool {
		self.loops.is_empty()
	}

	/// Loops in the order they were opened.
	pub fn iter(&self) -> impl Iterator<Item = &LoopTag> {
		self.loops.values()
	}

	/// The loop still open when the input ended, if any. Its body runs to the
	/// end of the document.
	pub fn unterminated(&self) -> Option<&LoopTag> {
		self.unterminated.and_then(|id| self.get(id))
	}
}

/// Capture loop blocks and leave a placeholder line where each one started.
///
/// Lines outside a loop are emitted trimmed. Lines inside a loop are appended
/// to its body and emit nothing, and a loop start found inside a loop is
/// captured as ordinary body text.
pub fn extract_loops(body: &Document) -> (Document, LoopRegistry) {
	let mut loops = LoopRegistry::new();
	let mut output = Document::new();
	let mut current: Option<LoopId> = None;

	for line in body.iter() {
		let text = match line {
			DocumentLine::Text(text) => text,
			DocumentLine::LoopPlaceholder(_) => {
				output.push(line.clone());
				continue;
			}
		};

		match current {
			None => {
				if let LineNode::LoopStart(header) = classify(text) {
					let id = loops.open(text, header.collection, header.element);
					output.push(DocumentLine::LoopPlaceholder(id));
					current = Some(id);
				} else {
					output.push_text(text.trim());
				}
			}
			Some(id) => {
				if classify(text) == LineNode::LoopEnd {
					current = None;
				} else {
					loops.append(id, text);
				}
			}
		}
	}

	loops.unterminated = current;
	(output, loops)
}

/// A problem that did not stop generation but changed its output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolutionWarning {
	#[error("loop {loop_id} iterates over undeclared dataset `{data_set}` and was dropped")]
	UnresolvedLoop { loop_id: LoopId, data_set: String },

	#[error("`{tag}` references undeclared dataset `{data_set}` and was left as written")]
	UnresolvedTag { tag: String, data_set: String },

	#[error("dataset `{data_set}` returned no rows: {failure}")]
	QueryFailed {
		data_set: String,
		failure: QueryFailure,
	},

	#[error("loop {loop_id} over `{data_set}` has no `{{% endfor %}}`; its body runs to the end of the template")]
	UnterminatedLoop { loop_id: LoopId, data_set: String },
}

/// Runs the loop and single-tag passes against a query engine.
///
/// The processor borrows the registries built by the declaration parser and
/// collects a [`ResolutionWarning`] for every degradation it absorbs.
pub struct TemplateProcessor<'a, E: QueryEngine + ?Sized> {
	registries: &'a Registries,
	engine: &'a mut E,
	warnings: Vec<ResolutionWarning>,
}

impl<'a, E: QueryEngine + ?Sized> TemplateProcessor<'a, E> {
	pub fn new(registries: &'a Registries, engine: &'a mut E) -> Self {
		Self {
			registries,
			engine,
			warnings: Vec::new(),
		}
	}

	/// Run loop extraction, loop resolution and single-tag resolution in
	/// order.
	pub fn process(&mut self, body: &Document) -> Document {
		let (with_placeholders, loops) = self.extract_loops(body);
		let with_loops = self.resolve_loops(&with_placeholders, &loops);
		self.resolve_single_tags(&with_loops)
	}

	/// [`extract_loops`], recording a warning for a loop left open at the end.
	pub fn extract_loops(&mut self, body: &Document) -> (Document, LoopRegistry) {
		let (output, loops) = extract_loops(body);
		tracing::debug!(loops = loops.len(), "extracted loops");

		if let Some(tag) = loops.unterminated() {
			self.warn(ResolutionWarning::UnterminatedLoop {
				loop_id: tag.id,
				data_set: tag.data_set.clone(),
			});
		}

		(output, loops)
	}

	/// Replace every placeholder with the row expansions of its loop.
	///
	/// A loop over an undeclared dataset is dropped. A loop whose query fails
	/// or returns no rows emits nothing. Otherwise the expansions are joined
	/// without a separator into one trimmed line.
	pub fn resolve_loops(&mut self, body: &Document, loops: &LoopRegistry) -> Document {
		let mut output = Document::new();

		for line in body.iter() {
			let id = match line {
				DocumentLine::LoopPlaceholder(id) => *id,
				DocumentLine::Text(text) => {
					output.push_text(text.as_str());
					continue;
				}
			};

			let Some(tag) = loops.get(id) else {
				continue;
			};

			let Some(rows) = self.fetch(&tag.data_set) else {
				self.warn(ResolutionWarning::UnresolvedLoop {
					loop_id: id,
					data_set: tag.data_set.clone(),
				});
				continue;
			};

			if rows.is_empty() {
				continue;
			}

			let body_tags = SubstitutionGrammar
				.parse(&tag.inner_html)
				.unwrap_or_default()
				.into_iter()
				.filter(|substitution| substitution.data_set == tag.inner_var)
				.collect::<Vec<_>>();

			let expanded = rows
				.iter()
				.map(|row| expand_row(&tag.inner_html, &body_tags, row))
				.collect::<String>();

			tracing::debug!(%id, rows = rows.len(), "resolved loop");
			output.push_text(expanded.trim());
		}

		output
	}

	/// Replace each `{{ dataset.field }}` with the field of the first row its
	/// dataset returns.
	///
	/// Every occurrence runs its own query. Tags whose dataset is undeclared,
	/// returns no rows or lacks the field are left as written. Lines with at
	/// least one tag are emitted trimmed and all other lines unchanged.
	pub fn resolve_single_tags(&mut self, body: &Document) -> Document {
		let mut output = Document::new();

		for line in body.iter() {
			let text = match line {
				DocumentLine::Text(text) => text,
				DocumentLine::LoopPlaceholder(_) => {
					output.push(line.clone());
					continue;
				}
			};

			let Some(tags) = SubstitutionGrammar.parse(text) else {
				output.push_text(text.as_str());
				continue;
			};

			let mut resolved = String::with_capacity(text.len());
			let mut cursor = 0;

			for tag in &tags {
				resolved.push_str(&text[cursor..tag.span.start]);
				cursor = tag.span.end;

				let value = match self.fetch(&tag.data_set) {
					Some(rows) => rows.first().and_then(|row| row.text(&tag.field)),
					None => {
						self.warn(ResolutionWarning::UnresolvedTag {
							tag: tag.raw.clone(),
							data_set: tag.data_set.clone(),
						});
						None
					}
				};

				resolved.push_str(value.as_deref().unwrap_or(&tag.raw));
			}

			resolved.push_str(&text[cursor..]);
			output.push_text(resolved.trim());
		}

		output
	}

	pub fn warnings(&self) -> &[ResolutionWarning] {
		&self.warnings
	}

	pub fn into_warnings(self) -> Vec<ResolutionWarning> {
		self.warnings
	}

	/// The rows of a declared dataset, or `None` when no dataset has that
	/// name. Failed queries are recorded and produce no rows.
	fn fetch(&mut self, data_set_name: &str) -> Option<RowSet> {
		let registries = self.registries;
		let data_set = registries.data_sets.get(data_set_name)?;

		let result = match registries.data_source_for(data_set) {
			None => {
				Err(QueryFailure::Connection {
					data_source: data_set.data_source.clone(),
					reason: "datasource is not declared".to_string(),
				})
			}
			Some(source) => {
				match data_set.dataset_type.invocation(data_set) {
					Some(invocation) => self.engine.execute(source, &invocation),
					None => {
						Err(QueryFailure::Unsupported {
							dataset_type: data_set.dataset_type,
						})
					}
				}
			}
		};

		match result {
			Ok(rows) => Some(rows),
			Err(failure) => {
				self.warn(ResolutionWarning::QueryFailed {
					data_set: data_set_name.to_string(),
					failure,
				});
				Some(RowSet::new())
			}
		}
	}

	fn warn(&mut self, warning: ResolutionWarning) {
		tracing::warn!("{warning}");
		self.warnings.push(warning);
	}
}

/// One instantiation of a loop body. Tags naming a column the row lacks stay
/// as written.
fn expand_row(inner_html: &str, tags: &[SubstitutionTag], row: &Row) -> String {
	let mut expanded = String::with_capacity(inner_html.len());
	let mut cursor = 0;

	for tag in tags {
		expanded.push_str(&inner_html[cursor..tag.span.start]);
		cursor = tag.span.end;

		match row.text(&tag.field) {
			Some(value) => expanded.push_str(&value),
			None => expanded.push_str(&tag.raw),
		}
	}

	expanded.push_str(&inner_html[cursor..]);
	expanded
}

/// The outcome of a generation run.
#[derive(Debug, Clone)]
pub struct Generation {
	/// The fully resolved document, ready for a renderer.
	pub document: Document,
	pub registries: Registries,
	pub warnings: Vec<ResolutionWarning>,
}

/// Parse declarations, then run all three passes over the body.
pub fn generate<E: QueryEngine + ?Sized>(
	template: &str,
	engine: &mut E,
	limits: &DeclarationLimits,
) -> ReportResult<Generation> {
	let ParsedTemplate { registries, body } = parse_declarations(template, limits)?;

	let mut processor = TemplateProcessor::new(&registries, engine);
	let document = processor.process(&body);
	let warnings = processor.into_warnings();

	tracing::debug!(
		lines = document.len(),
		warnings = warnings.len(),
		"generated document"
	);

	Ok(Generation {
		document,
		registries,
		warnings,
	})
}

/// [`generate`] for a template file.
pub fn generate_file<E: QueryEngine + ?Sized>(
	path: &Path,
	engine: &mut E,
	limits: &DeclarationLimits,
) -> ReportResult<Generation> {
	let template = std::fs::read_to_string(path)?;
	tracing::debug!(path = %path.display(), "read template");
	generate(&template, engine, limits)
}
