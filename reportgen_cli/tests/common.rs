use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn reportgen_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("reportgen"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

pub const TEMPLATE: &str = r#"{% datasource name="primary" server="db01" database="sales" user="report" password="secret" %}
{% dataset datasource="primary" name="orders" object="sp_orders" type="stored procedure" param="year,int,4" %}
{% dataset datasource="primary" name="totals" object="sp_totals" type="stored procedure" %}
{% dataset datasource="primary" name="regions" object="regions" type="table" %}
<h1>Orders</h1>
<ul>
  {% for order in orders %}
    <li>{{ order.customer }}: {{ order.total }}</li>
  {% endfor %}
</ul>
<p>Total: {{ totals.amount }}</p>
"#;

pub const FIXTURES: &str = r#"[[primary.sp_orders]]
customer = "Ada"
total = 120

[[primary.sp_orders]]
customer = "Grace"
total = 75

[[primary.sp_totals]]
amount = 195
"#;

/// A project with a config, a template and fixtures.
pub fn project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(tmp.path().join("templates/sales.html"), TEMPLATE)?;
	std::fs::write(tmp.path().join("fixtures.toml"), FIXTURES)?;
	std::fs::write(
		tmp.path().join("reportgen.toml"),
		"template_path = \"templates\"\ntemplate_file = \"sales.html\"\noutput_path = \"out\"\n\n[fixtures]\npath = \"fixtures.toml\"\n",
	)?;

	Ok(tmp)
}
