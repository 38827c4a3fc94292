//! Recognizers for the template mini-language.
//!
//! | Construct              | Syntax                                                  |
//! |------------------------|---------------------------------------------------------|
//! | Datasource declaration | `{% datasource name="X" server="S" ... %}`              |
//! | Dataset declaration    | `{% dataset datasource="X" name="N" ... %}`             |
//! | Loop start             | `{% for var in dataset %}`                              |
//! | Loop end               | `{% endfor %}`                                          |
//! | Single substitution    | `{{ dataset.field }}`                                   |
//!
//! Declarations and loop markers must sit alone on one physical line, with any
//! amount of surrounding whitespace. Substitutions may appear anywhere inside a
//! line. A line is tokenized once with [`TokenizedLine::new`] and can then be
//! tested against every grammar without lexing again.

use std::ops::Range;

use crate::DefinitionError;
use crate::lexer::Lexeme;
use crate::lexer::LexemeCursor;
use crate::lexer::RawToken;
use crate::lexer::lex;

/// A line of template text together with its tokens.
#[derive(Debug, Clone)]
pub struct TokenizedLine<'a> {
	source: &'a str,
	lexemes: Vec<Lexeme<'a>>,
}

impl<'a> TokenizedLine<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			lexemes: lex(source),
		}
	}

	pub fn source(&self) -> &'a str {
		self.source
	}
}

/// A recognizer for one construct of the template language.
///
/// Both operations are pure. `parse` returns `None` when the text is not an
/// instance of the construct, which is not an error: the text is then just
/// something else (usually plain text).
pub trait Grammar {
	type Output;

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output>;

	fn parse(&self, text: &str) -> Option<Self::Output> {
		self.parse_tokens(&TokenizedLine::new(text))
	}

	fn matches(&self, text: &str) -> bool {
		self.parse(text).is_some()
	}
}

/// The body of a `{% <keyword> ... %}` declaration line, between the keyword
/// and the closing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSource {
	pub definition: String,
}

/// `element` and `collection` of a `{% for element in collection %}` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopHeader {
	pub element: String,
	pub collection: String,
}

/// One `{{ dataset.field }}` occurrence inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionTag {
	/// The exact text of the tag, braces included.
	pub raw: String,
	/// Byte range of `raw` inside the scanned text.
	pub span: Range<usize>,
	pub data_set: String,
	pub field: String,
}

/// Matches `{% datasource <definition> %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSourceGrammar;

/// Matches `{% dataset <definition> %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSetGrammar;

/// Matches `{% for <element> in <collection> %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopStartGrammar;

/// Matches `{% endfor %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopEndGrammar;

/// Finds every `{{ dataset.field }}` occurrence in a text. Yields `None` when
/// there are none.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionGrammar;

impl Grammar for DataSourceGrammar {
	type Output = DeclarationSource;

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output> {
		parse_declaration(line, "datasource")
	}
}

impl Grammar for DataSetGrammar {
	type Output = DeclarationSource;

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output> {
		parse_declaration(line, "dataset")
	}
}

impl Grammar for LoopStartGrammar {
	type Output = LoopHeader;

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output> {
		let mut cursor = LexemeCursor::new(&line.lexemes);
		cursor.skip_whitespace();
		cursor.expect(RawToken::StatementOpen)?;
		cursor.expect_whitespace()?;
		cursor.expect_keyword("for")?;
		cursor.expect_whitespace()?;
		let element = cursor.expect_word()?;
		cursor.expect_whitespace()?;
		cursor.expect_keyword("in")?;
		cursor.expect_whitespace()?;
		let collection = cursor.expect_word()?;
		cursor.expect_whitespace()?;
		cursor.expect(RawToken::StatementClose)?;
		cursor.expect_end()?;

		Some(LoopHeader {
			element: element.to_string(),
			collection: collection.to_string(),
		})
	}
}

impl Grammar for LoopEndGrammar {
	type Output = ();

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output> {
		let mut cursor = LexemeCursor::new(&line.lexemes);
		cursor.skip_whitespace();
		cursor.expect(RawToken::StatementOpen)?;
		cursor.expect_whitespace()?;
		cursor.expect_keyword("endfor")?;
		cursor.expect_whitespace()?;
		cursor.expect(RawToken::StatementClose)?;
		cursor.expect_end()
	}
}

impl Grammar for SubstitutionGrammar {
	type Output = Vec<SubstitutionTag>;

	fn parse_tokens(&self, line: &TokenizedLine<'_>) -> Option<Self::Output> {
		let lexemes = &line.lexemes;
		let mut tags = Vec::new();
		let mut index = 0;

		while index < lexemes.len() {
			let open = &lexemes[index];
			if !open.is(RawToken::ExpressionOpen) {
				index += 1;
				continue;
			}

			let mut cursor = LexemeCursor::at(lexemes, index + 1);
			if let Some((data_set, field)) = substitution_body(&mut cursor) {
				let end = lexemes[cursor.position() - 1].span.end;
				tags.push(SubstitutionTag::new(
					line.source,
					open.span.start..end,
					data_set,
					field,
				));
				index = cursor.position();
				continue;
			}

			// In `{{{ a.b }}}` the lexer pairs the first two braces, so the tag
			// opening on the second brace is only found by lexing again there.
			if line.source[open.span.end..].starts_with('{') {
				if let Some(tag) = substitution_at(line.source, open.span.start + 1) {
					index = lexemes
						.iter()
						.position(|lexeme| lexeme.span.start >= tag.span.end)
						.unwrap_or(lexemes.len());
					tags.push(tag);
					continue;
				}
			}

			index += 1;
		}

		(!tags.is_empty()).then_some(tags)
	}
}

impl SubstitutionTag {
	fn new(source: &str, span: Range<usize>, data_set: &str, field: &str) -> Self {
		Self {
			raw: source[span.clone()].to_string(),
			span,
			data_set: data_set.to_string(),
			field: field.to_string(),
		}
	}
}

/// A tag whose `{{` starts exactly at byte `start` of `source`.
fn substitution_at(source: &str, start: usize) -> Option<SubstitutionTag> {
	let rest = &source[start..];
	let lexemes = lex(rest);
	let mut cursor = LexemeCursor::new(&lexemes);

	if cursor.expect(RawToken::ExpressionOpen).is_some() {
		if let Some((data_set, field)) = substitution_body(&mut cursor) {
			let end = start + lexemes[cursor.position() - 1].span.end;
			return Some(SubstitutionTag::new(source, start..end, data_set, field));
		}
	}

	// `{{{{{`: keep moving right while braces remain.
	if rest.get(2..).is_some_and(|tail| tail.starts_with('{')) {
		return substitution_at(source, start + 1);
	}

	None
}

/// `<ws> dataset . field <ws> }}` following an opening `{{`.
fn substitution_body<'a>(cursor: &mut LexemeCursor<'_, 'a>) -> Option<(&'a str, &'a str)> {
	cursor.expect_whitespace()?;
	let data_set = cursor.expect_word()?;
	cursor.expect(RawToken::Dot)?;
	let field = cursor.expect_word()?;
	cursor.expect_whitespace()?;
	cursor.expect(RawToken::ExpressionClose)?;
	Some((data_set, field))
}

/// Shared envelope of both declaration kinds: the line must be exactly
/// `{%`, whitespace, the keyword, whitespace, a non-empty definition,
/// whitespace and `%}`, with optional whitespace around the whole.
fn parse_declaration(line: &TokenizedLine<'_>, keyword: &str) -> Option<DeclarationSource> {
	let lexemes = &line.lexemes;
	let mut cursor = LexemeCursor::new(lexemes);
	cursor.skip_whitespace();
	cursor.expect(RawToken::StatementOpen)?;
	cursor.expect_whitespace()?;
	cursor.expect_keyword(keyword)?;
	cursor.expect_whitespace()?;
	let definition_start = cursor.peek()?.span.start;

	// The closing marker is the last non-whitespace token of the line and
	// must itself be preceded by whitespace.
	let close = lexemes
		.iter()
		.rposition(|lexeme| !lexeme.is(RawToken::Whitespace))?;
	if close < cursor.position() + 1 || !lexemes[close].is(RawToken::StatementClose) {
		return None;
	}
	let before_close = &lexemes[close - 1];
	if !before_close.is(RawToken::Whitespace) || before_close.span.start <= definition_start {
		return None;
	}

	let definition = line.source[definition_start..before_close.span.start].to_string();
	Some(DeclarationSource { definition })
}

/// The classification of one template line, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineNode {
	DataSourceDeclaration(DeclarationSource),
	DataSetDeclaration(DeclarationSource),
	LoopStart(LoopHeader),
	LoopEnd,
	Substitution(Vec<SubstitutionTag>),
	Plain,
}

/// Tokenize `line` once and classify it. Grammars are tried in the order
/// datasource, dataset, loop start, loop end, substitution.
pub fn classify(line: &str) -> LineNode {
	let tokens = TokenizedLine::new(line);

	if let Some(source) = DataSourceGrammar.parse_tokens(&tokens) {
		return LineNode::DataSourceDeclaration(source);
	}
	if let Some(source) = DataSetGrammar.parse_tokens(&tokens) {
		return LineNode::DataSetDeclaration(source);
	}
	if let Some(header) = LoopStartGrammar.parse_tokens(&tokens) {
		return LineNode::LoopStart(header);
	}
	if LoopEndGrammar.parse_tokens(&tokens).is_some() {
		return LineNode::LoopEnd;
	}
	if let Some(tags) = SubstitutionGrammar.parse_tokens(&tokens) {
		return LineNode::Substitution(tags);
	}

	LineNode::Plain
}

/// The ordered `key="value"` pairs of a declaration definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
	entries: Vec<(String, String)>,
	params: Vec<String>,
}

impl Attributes {
	/// The value of the first attribute named `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.as_str())
	}

	/// The value of `key`, treating an empty value as absent.
	pub fn require(&self, key: &'static str) -> Result<&str, DefinitionError> {
		self.get(key)
			.filter(|value| !value.is_empty())
			.ok_or(DefinitionError::MissingAttribute(key))
	}

	/// Values of the repeated `param` attribute in declaration order.
	pub fn params(&self) -> &[String] {
		&self.params
	}

	fn insert(&mut self, key: &str, value: String) {
		if key == "param" {
			self.params.push(value);
		} else if self.get(key).is_none() {
			self.entries.push((key.to_string(), value));
		}
	}
}

/// Parse the `key = "value"` pairs of a declaration definition. Values are
/// trimmed and cannot contain a double quote. Whitespace may surround `=`.
pub fn parse_attributes(definition: &str) -> Result<Attributes, DefinitionError> {
	let lexemes = lex(definition);
	let mut cursor = LexemeCursor::new(&lexemes);
	let mut attributes = Attributes::default();

	loop {
		cursor.skip_whitespace();
		let Some(lexeme) = cursor.advance() else {
			break;
		};

		if !lexeme.is(RawToken::Word) {
			return Err(DefinitionError::AttributeSyntax(format!(
				"expected an attribute name, found `{}`",
				lexeme.slice
			)));
		}
		let key = lexeme.slice;

		cursor.skip_whitespace();
		if cursor.expect(RawToken::Equals).is_none() {
			return Err(DefinitionError::AttributeSyntax(format!(
				"expected `=` after `{key}`"
			)));
		}
		cursor.skip_whitespace();
		let Some(open) = cursor.expect(RawToken::Quote) else {
			return Err(DefinitionError::AttributeSyntax(format!(
				"expected a quoted value for `{key}`"
			)));
		};

		let mut close = None;
		while let Some(lexeme) = cursor.advance() {
			if lexeme.is(RawToken::Quote) {
				close = Some(lexeme);
				break;
			}
		}
		let Some(close) = close else {
			return Err(DefinitionError::AttributeSyntax(format!(
				"unterminated value for `{key}`"
			)));
		};

		let value = definition[open.span.end..close.span.start].trim().to_string();
		attributes.insert(key, value);
	}

	Ok(attributes)
}
