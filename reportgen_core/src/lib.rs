//! `reportgen_core` is the core library for the reportgen report generator. It
//! turns an annotated HTML template into a fully resolved document by
//! declaring datasources and datasets in the template itself and
//! substituting loop and single-value tags with rows fetched at generation
//! time.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Raw template
//!   -> Declaration parser (datasource / dataset lines into registries, the rest into a body)
//!   -> Loop extraction (for ... endfor blocks into placeholders + loop registry)
//!   -> Loop resolution (one body expansion per row of the loop's dataset)
//!   -> Single-tag resolution ({{ dataset.field }} from the first row)
//!   -> Renderer (final document into an output artifact)
//! ```
//!
//! ## Template Language
//!
//! ```html
//! {% datasource name="primary" server="db01" database="sales" user="report" password="secret" %}
//! {% dataset datasource="primary" name="orders" object="sp_orders" type="stored procedure" %}
//! {% dataset datasource="primary" name="totals" object="sp_totals" type="stored procedure" %}
//! <table>
//! {% for order in orders %}
//!   <tr><td>{{ order.customer }}</td><td>{{ order.total }}</td></tr>
//! {% endfor %}
//! </table>
//! <p>Grand total: {{ totals.amount }}</p>
//! ```
//!
//! Declarations and loop markers must each sit on one line of their own.
//!
//! ## Key Types
//!
//! - [`Registries`]: the datasource and dataset definitions of one template.
//! - [`Document`]: a template body between passes.
//! - [`TemplateProcessor`]: runs the three rewrite passes against a
//!   [`QueryEngine`].
//! - [`FixtureQueryEngine`]: a [`QueryEngine`] backed by a JSON, TOML or YAML
//!   file.
//! - [`ReportConfig`]: configuration loaded from `reportgen.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use reportgen_core::DeclarationLimits;
//! use reportgen_core::FixtureQueryEngine;
//! use reportgen_core::Row;
//! use reportgen_core::generate;
//!
//! let template = "{% datasource name=\"db\" server=\"s\" database=\"d\" user=\"u\" password=\"p\" %}\n{% dataset datasource=\"db\" name=\"greeting\" object=\"sp_greeting\" type=\"stored procedure\" %}\n<h1>{{ greeting.text }}</h1>\n";
//! let mut engine = FixtureQueryEngine::new().with_rows(
//! 	"db",
//! 	"sp_greeting",
//! 	vec![Row::new().with("text", "Hello")],
//! );
//!
//! let generation = generate(template, &mut engine, &DeclarationLimits::default())?;
//! assert_eq!(generation.document.to_string(), "<h1>Hello</h1>\n");
//! # Ok::<(), reportgen_core::ReportError>(())
//! ```

pub use config::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use fixtures::*;
pub use grammar::*;
pub use model::*;
pub use parser::*;
pub use query::*;
pub use registry::*;
pub use render::*;

pub mod config;
mod document;
mod engine;
#[allow(unused_assignments)]
mod error;
mod fixtures;
mod grammar;
pub(crate) mod lexer;
mod model;
mod parser;
mod query;
mod registry;
mod render;

#[cfg(test)]
mod __fixtures;
