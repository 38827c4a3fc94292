use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::ReportError;
use crate::ReportResult;

/// Page size of the rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
	#[default]
	Letter,
	Legal,
	A4,
}

impl PageSize {
	/// The value of the CSS `@page { size: ... }` descriptor.
	pub fn css_size(&self) -> &'static str {
		match self {
			Self::Letter => "letter",
			Self::Legal => "legal",
			Self::A4 => "A4",
		}
	}
}

impl FromStr for PageSize {
	type Err = ReportError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"letter" => Ok(Self::Letter),
			"legal" => Ok(Self::Legal),
			"a4" => Ok(Self::A4),
			_ => {
				Err(ReportError::InvalidSetting {
					setting: "page_size",
					value: value.to_string(),
					expected: "letter, legal, a4",
				})
			}
		}
	}
}

impl fmt::Display for PageSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Letter => write!(f, "letter"),
			Self::Legal => write!(f, "legal"),
			Self::A4 => write!(f, "a4"),
		}
	}
}

/// The bytes of a rendered report and the file extension they belong under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
	pub bytes: Vec<u8>,
	pub extension: &'static str,
}

/// Turns a fully resolved document into an output artifact.
pub trait Renderer {
	fn render(&self, html: &str, page: PageSize) -> ReportResult<RenderedArtifact>;
}

/// Writes the resolved document as a standalone HTML page with an `@page`
/// rule for the requested size, ready for a browser or an HTML-to-PDF tool.
///
/// The rule goes right after the `<head>` tag, or after a leading
/// `<!DOCTYPE>` when there is no head. Fragments get it prepended.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
	fn render(&self, html: &str, page: PageSize) -> ReportResult<RenderedArtifact> {
		let rule = format!("<style>@page {{ size: {}; }}</style>", page.css_size());
		let output = match style_insertion_point(html) {
			Some(at) => format!("{}\n{rule}{}", &html[..at], &html[at..]),
			None => format!("{rule}\n{html}"),
		};

		Ok(RenderedArtifact {
			bytes: output.into_bytes(),
			extension: "html",
		})
	}
}

/// Byte offset just past the opening `<head>` tag, or else past a leading
/// `<!DOCTYPE ...>` declaration.
fn style_insertion_point(html: &str) -> Option<usize> {
	let lower = html.to_ascii_lowercase();
	let tag_end = |start: usize| lower[start..].find('>').map(|end| start + end + 1);

	let mut from = 0;
	while let Some(found) = lower[from..].find("<head") {
		let start = from + found;
		// `<header>` and friends are not the head.
		let next = lower.as_bytes().get(start + 5).copied();
		if next.is_some_and(|byte| byte == b'>' || byte.is_ascii_whitespace()) {
			return tag_end(start);
		}
		from = start + 5;
	}

	let start = lower.len() - lower.trim_start().len();
	if lower[start..].starts_with("<!doctype") {
		return tag_end(start);
	}

	None
}

/// `<stem>-YYYYMMDD-HHMMSS.<extension>` for a template file name.
///
/// ```
/// use chrono::NaiveDate;
/// use reportgen_core::output_file_name;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 9)
/// 	.and_then(|date| date.and_hms_opt(14, 5, 7))
/// 	.unwrap();
/// assert_eq!(
/// 	output_file_name("templates/sales.html", at, "html"),
/// 	"sales-20240309-140507.html"
/// );
/// ```
pub fn output_file_name(template_file: impl AsRef<Path>, at: NaiveDateTime, extension: &str) -> String {
	let stem = template_file
		.as_ref()
		.file_stem()
		.and_then(|stem| stem.to_str())
		.unwrap_or("report");

	format!("{stem}-{}.{extension}", at.format("%Y%m%d-%H%M%S"))
}
