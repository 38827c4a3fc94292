mod common;

use reportgen_core::AnyEmptyResult;

#[test]
fn check_passes_for_valid_template() -> AnyEmptyResult {
	let tmp = common::project()?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Template is valid: 1 datasource(s) and 3 dataset(s) declared.",
		));

	Ok(())
}

#[test]
fn check_does_not_need_fixtures() -> AnyEmptyResult {
	let tmp = common::project()?;
	std::fs::remove_file(tmp.path().join("fixtures.toml"))?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}

#[test]
fn check_rejects_duplicate_datasource() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let declaration =
		r#"{% datasource name="primary" server="db01" database="sales" user="u" password="p" %}"#;
	std::fs::write(
		tmp.path().join("report.html"),
		format!("{declaration}\n{declaration}\n"),
	)?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--template")
		.arg("report.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("duplicate datasource `primary`"));

	Ok(())
}

#[test]
fn check_rejects_unknown_datasource() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("report.html"),
		r#"{% dataset datasource="nowhere" name="orders" object="sp_orders" type="stored procedure" %}"#,
	)?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--template")
		.arg("report.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("undeclared datasource `nowhere`"));

	Ok(())
}

#[test]
fn check_rejects_malformed_declaration() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("report.html"),
		"<html>\n{% datasource name=\"primary\" server=\"db01\" %}\n",
	)?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--template")
		.arg("report.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("malformed datasource declaration on line 2"));

	Ok(())
}

#[test]
fn invalid_config_fails() -> AnyEmptyResult {
	let tmp = common::project()?;
	std::fs::write(tmp.path().join("reportgen.toml"), "page_size = 3\n")?;

	common::reportgen_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn list_shows_declarations_and_loops() -> AnyEmptyResult {
	let tmp = common::project()?;

	common::reportgen_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			"Datasources:\n  primary db01/sales\nDatasets:\n  orders primary.sp_orders [stored \
			 procedure] 1 param(s)\n  regions primary.regions [table] 0 param(s) (not \
			 executable)\n  totals primary.sp_totals [stored procedure] 0 param(s)\nLoops:\n  \
			 loop0 for order in orders (linked)\n",
		);

	Ok(())
}

#[test]
fn list_empty_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("plain.html"), "<p>static</p>\n")?;

	common::reportgen_cmd()
		.arg("list")
		.arg("--template")
		.arg("plain.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("No declarations or loops found.\n");

	Ok(())
}
