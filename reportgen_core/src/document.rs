use std::fmt;

use derive_more::Deref;
use derive_more::DerefMut;
use derive_more::Display;

/// Identifier of a captured loop body, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("loop{_0}")]
pub struct LoopId(pub(crate) u32);

/// One line of a document between passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLine {
	Text(String),
	/// Stands in for a loop body between loop extraction and loop resolution.
	LoopPlaceholder(LoopId),
}

impl DocumentLine {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::LoopPlaceholder(_) => None,
		}
	}
}

impl fmt::Display for DocumentLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.write_str(text),
			Self::LoopPlaceholder(id) => write!(f, "{{% looptag {id} %}}"),
		}
	}
}

/// The full text of a template at some stage of the pipeline, as lines.
///
/// Every pass reads one `Document` and builds a new one, so a document is
/// never modified after a later pass has started reading it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Document(Vec<DocumentLine>);

impl Document {
	pub fn new() -> Self {
		Self::default()
	}

	/// Split `text` into text lines on `\n`, `\r\n` or `\r`. A terminator at
	/// the very end does not start another line.
	pub fn from_text(text: &str) -> Self {
		split_lines(text)
			.into_iter()
			.map(|line| DocumentLine::Text(line.to_string()))
			.collect()
	}

	pub fn push_text(&mut self, text: impl Into<String>) {
		self.0.push(DocumentLine::Text(text.into()));
	}

	pub fn placeholders(&self) -> impl Iterator<Item = LoopId> + '_ {
		self.0.iter().filter_map(|line| {
			match line {
				DocumentLine::LoopPlaceholder(id) => Some(*id),
				DocumentLine::Text(_) => None,
			}
		})
	}
}

impl FromIterator<DocumentLine> for Document {
	fn from_iter<I: IntoIterator<Item = DocumentLine>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for Document {
	type IntoIter = std::vec::IntoIter<DocumentLine>;
	type Item = DocumentLine;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Writes every line followed by `\n`.
impl fmt::Display for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for line in &self.0 {
			writeln!(f, "{line}")?;
		}
		Ok(())
	}
}

pub(crate) fn split_lines(text: &str) -> Vec<&str> {
	let mut lines = Vec::new();
	let mut rest = text;

	while !rest.is_empty() {
		let Some(index) = rest.find(['\r', '\n']) else {
			lines.push(rest);
			break;
		};

		lines.push(&rest[..index]);
		let terminator = if rest[index..].starts_with("\r\n") { 2 } else { 1 };
		rest = &rest[index + terminator..];
	}

	lines
}
