use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for flat tokenization of a single template
/// line. Anything else is an error token, which only ever makes a line plain
/// text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
	#[token("{%")]
	StatementOpen,
	#[token("%}")]
	StatementClose,
	#[token("{{")]
	ExpressionOpen,
	#[token("}}")]
	ExpressionClose,
	#[token("=")]
	Equals,
	#[token(".")]
	Dot,
	#[token("\"")]
	Quote,
	/// Unicode whitespace, so a non-breaking space separates like a space.
	#[regex(r"\s+")]
	Whitespace,
	/// Unicode word characters: `{{ Ventas.año }}` is a valid tag.
	#[regex(r"\w+")]
	Word,
}

/// A token together with the slice of source it was lexed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
	/// `None` for bytes that are not part of the template grammar.
	pub token: Option<RawToken>,
	pub slice: &'a str,
	pub span: Range<usize>,
}

impl Lexeme<'_> {
	pub fn is(&self, token: RawToken) -> bool {
		self.token == Some(token)
	}

	pub fn is_word(&self, word: &str) -> bool {
		self.is(RawToken::Word) && self.slice == word
	}
}

pub fn lex(source: &str) -> Vec<Lexeme<'_>> {
	RawToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			Lexeme {
				token: result.ok(),
				slice: &source[span.clone()],
				span,
			}
		})
		.collect()
}

/// Walks a lexeme slice for the fixed-shape grammars. Every `expect_*` method
/// consumes on success and leaves the cursor untouched on failure.
pub struct LexemeCursor<'l, 'a> {
	lexemes: &'l [Lexeme<'a>],
	index: usize,
}

impl<'l, 'a> LexemeCursor<'l, 'a> {
	pub fn new(lexemes: &'l [Lexeme<'a>]) -> Self {
		Self { lexemes, index: 0 }
	}

	pub fn at(lexemes: &'l [Lexeme<'a>], index: usize) -> Self {
		Self { lexemes, index }
	}

	pub fn position(&self) -> usize {
		self.index
	}

	pub fn peek(&self) -> Option<&'l Lexeme<'a>> {
		self.lexemes.get(self.index)
	}

	pub fn is_done(&self) -> bool {
		self.index >= self.lexemes.len()
	}

	pub fn advance(&mut self) -> Option<&'l Lexeme<'a>> {
		let lexeme = self.lexemes.get(self.index)?;
		self.index += 1;
		Some(lexeme)
	}

	/// Skip zero or more whitespace tokens.
	pub fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(|lexeme| lexeme.is(RawToken::Whitespace)) {
			self.index += 1;
		}
	}

	/// Require one whitespace run.
	pub fn expect_whitespace(&mut self) -> Option<()> {
		self.expect(RawToken::Whitespace).map(|_| ())
	}

	pub fn expect(&mut self, token: RawToken) -> Option<&'l Lexeme<'a>> {
		let lexeme = self.peek()?;
		if lexeme.is(token) {
			self.index += 1;
			Some(lexeme)
		} else {
			None
		}
	}

	pub fn expect_keyword(&mut self, keyword: &str) -> Option<()> {
		let lexeme = self.peek()?;
		if lexeme.is_word(keyword) {
			self.index += 1;
			Some(())
		} else {
			None
		}
	}

	pub fn expect_word(&mut self) -> Option<&'a str> {
		self.expect(RawToken::Word).map(|lexeme| lexeme.slice)
	}

	/// Consume trailing whitespace and succeed only at the end of input.
	pub fn expect_end(&mut self) -> Option<()> {
		self.skip_whitespace();
		self.is_done().then_some(())
	}
}
