use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use reportgen_core::PageSize;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn data-bound HTML templates into finished report documents.",
	long_about = "reportgen reads an HTML template that declares its own datasources and \
	              datasets, runs the declared queries and substitutes loop and single-value \
	              tags with the rows they return.\n\nQuick start:\n  reportgen check     \
	              Validate the template declarations\n  reportgen list      Show declared \
	              datasources, datasets and loops\n  reportgen generate  Resolve the template \
	              and write the report"
)]
pub struct ReportgenCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory holding `reportgen.toml`.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Resolve the template and write the finished report.
	///
	/// Parses the declarations, runs every loop and single tag against the
	/// configured data and renders the result into the output directory as
	/// `<template>-YYYYMMDD-HHMMSS.html`. Tags that cannot be resolved are
	/// reported as warnings and do not fail the run.
	Generate {
		/// Template file to render. Defaults to `template_path` joined with
		/// `template_file` from `reportgen.toml`.
		#[arg(long, short)]
		template: Option<PathBuf>,

		/// Directory the report is written to. Defaults to `output_path` from
		/// `reportgen.toml`.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Fixture file (json, toml, yaml) answering the declared datasets.
		/// Defaults to `[fixtures] path` from `reportgen.toml`.
		#[arg(long, short)]
		fixtures: Option<PathBuf>,

		/// Page size of the report: letter, legal or a4.
		#[arg(long)]
		page_size: Option<PageSize>,

		/// Print the resolved report to stdout instead of writing a file.
		#[arg(long, default_value_t = false)]
		stdout: bool,
	},
	/// Validate the template declarations without running any query.
	///
	/// Exits with a non-zero status code when a declaration is malformed,
	/// duplicated or references an undeclared datasource.
	Check {
		/// Template file to check. Defaults to the configured template.
		#[arg(long, short)]
		template: Option<PathBuf>,
	},
	/// List the datasources, datasets and loops declared in the template.
	List {
		/// Template file to inspect. Defaults to the configured template.
		#[arg(long, short)]
		template: Option<PathBuf>,
	},
}
