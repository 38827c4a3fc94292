mod common;

use clap::Parser;
use predicates::prelude::PredicateBooleanExt;
use reportgen_cli::Commands;
use reportgen_cli::ReportgenCli;
use reportgen_core::AnyEmptyResult;
use reportgen_core::PageSize;

#[test]
fn generate_to_stdout() -> AnyEmptyResult {
	let tmp = common::project()?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--stdout")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			"<style>@page { size: letter; }</style>\n<h1>Orders</h1>\n<ul>\n<li>Ada: \
			 120</li><li>Grace: 75</li>\n</ul>\n<p>Total: 195</p>\n",
		);

	Ok(())
}

#[test]
fn generate_writes_timestamped_file() -> AnyEmptyResult {
	let tmp = common::project()?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Generated out/sales-"));

	let files = std::fs::read_dir(tmp.path().join("out"))?
		.map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().to_string()))
		.collect::<Result<Vec<_>, _>>()?;
	assert_eq!(files.len(), 1);
	assert!(files[0].starts_with("sales-"));
	assert!(files[0].ends_with(".html"));
	// sales-YYYYMMDD-HHMMSS.html
	assert_eq!(files[0].len(), "sales-20240101-000000.html".len());

	let content = std::fs::read_to_string(tmp.path().join("out").join(&files[0]))?;
	assert!(content.contains("<li>Ada: 120</li><li>Grace: 75</li>"));

	Ok(())
}

#[test]
fn generate_flags_override_config() -> AnyEmptyResult {
	let tmp = common::project()?;
	std::fs::write(
		tmp.path().join("other.html"),
		"{% datasource name=\"primary\" server=\"s\" database=\"d\" user=\"u\" password=\"p\" %}\n{% dataset datasource=\"primary\" name=\"totals\" object=\"sp_totals\" type=\"stored procedure\" %}\n<b>{{ totals.amount }}</b>\n",
	)?;
	std::fs::write(
		tmp.path().join("other.json"),
		r#"{ "primary": { "sp_totals": [{ "amount": 42 }] } }"#,
	)?;

	common::reportgen_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg("generate")
		.arg("--template")
		.arg("other.html")
		.arg("--fixtures")
		.arg("other.json")
		.arg("--page-size")
		.arg("a4")
		.arg("--stdout")
		.assert()
		.success()
		.stdout("<style>@page { size: A4; }</style>\n<b>42</b>\n");

	Ok(())
}

#[test]
fn generate_reports_unresolved_tags_as_warnings() -> AnyEmptyResult {
	let tmp = common::project()?;
	std::fs::write(
		tmp.path().join("templates/sales.html"),
		format!("{}<p>{{{{ regions.name }}}} {{{{ missing.x }}}}</p>\n", common::TEMPLATE),
	)?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--stdout")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"<p>{{ regions.name }} {{ missing.x }}</p>",
		))
		.stderr(
			predicates::str::contains("warning:")
				.and(predicates::str::contains("table datasets have no execution path"))
				.and(predicates::str::contains("undeclared dataset `missing`")),
		);

	Ok(())
}

#[test]
fn generate_without_config_needs_a_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--stdout")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("template_file"));

	Ok(())
}

#[test]
fn generate_fails_for_missing_template() -> AnyEmptyResult {
	let tmp = common::project()?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--template")
		.arg("missing.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2);

	assert!(!tmp.path().join("out").exists());

	Ok(())
}

#[test]
fn generate_fails_for_unsupported_fixtures() -> AnyEmptyResult {
	let tmp = common::project()?;
	std::fs::write(tmp.path().join("fixtures.xml"), "<rows />")?;

	common::reportgen_cmd()
		.arg("generate")
		.arg("--stdout")
		.arg("--fixtures")
		.arg("fixtures.xml")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unsupported fixture file format"));

	Ok(())
}

#[test]
fn generate_arguments_parse() {
	let cli = ReportgenCli::parse_from(["reportgen", "generate", "--stdout", "--page-size", "legal"]);
	match cli.command {
		Some(Commands::Generate {
			stdout,
			page_size,
			template,
			..
		}) => {
			assert!(stdout);
			assert_eq!(page_size, Some(PageSize::Legal));
			assert!(template.is_none());
		}
		_ => panic!("expected Generate command"),
	}

	let cli = ReportgenCli::try_parse_from(["reportgen", "generate", "--page-size", "tabloid"]);
	assert!(cli.is_err());
}
