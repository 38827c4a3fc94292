use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use reportgen_cli::Commands;
use reportgen_cli::ReportgenCli;
use reportgen_core::AnyEmptyResult;
use reportgen_core::DataSetType;
use reportgen_core::FixtureQueryEngine;
use reportgen_core::HtmlRenderer;
use reportgen_core::PageSize;
use reportgen_core::ParsedTemplate;
use reportgen_core::Renderer;
use reportgen_core::ReportConfig;
use reportgen_core::ReportResult;
use reportgen_core::ResolutionWarning;
use reportgen_core::extract_loops;
use reportgen_core::generate_file;
use reportgen_core::output_file_name;
use reportgen_core::parse_declarations;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ReportgenCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Generate {
			template,
			output,
			fixtures,
			page_size,
			stdout,
		}) => {
			run_generate(
				&args,
				GenerateOptions {
					template: template.as_deref(),
					output: output.as_deref(),
					fixtures: fixtures.as_deref(),
					page_size: *page_size,
					stdout: *stdout,
				},
			)
		}
		Some(Commands::Check { template }) => run_check(&args, template.as_deref()),
		Some(Commands::List { template }) => run_list(&args, template.as_deref()),
		None => {
			eprintln!("No subcommand specified. Run `reportgen --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<reportgen_core::ReportError>() {
			Ok(report_err) => {
				let report: miette::Report = (*report_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`, which wins over the quiet
/// default.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directives = if verbose {
		"reportgen=debug,reportgen_core=debug"
	} else {
		"error"
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.with_target(verbose),
		)
		.try_init()
		.ok();
}

fn resolve_root(args: &ReportgenCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(root: &Path) -> ReportResult<ReportConfig> {
	Ok(ReportConfig::load(root)?.unwrap_or_default())
}

/// The template named on the command line, or the configured one.
fn resolve_template(
	template: Option<&Path>,
	config: &ReportConfig,
	root: &Path,
) -> ReportResult<PathBuf> {
	match template {
		Some(path) => Ok(root.join(path)),
		None => config.template(root),
	}
}

fn read_declarations(
	args: &ReportgenCli,
	template: Option<&Path>,
) -> ReportResult<(PathBuf, ParsedTemplate)> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let template_path = resolve_template(template, &config, &root)?;
	let content = std::fs::read_to_string(&template_path)?;
	let parsed = parse_declarations(&content, &config.limits)?;

	Ok((template_path, parsed))
}

struct GenerateOptions<'a> {
	template: Option<&'a Path>,
	output: Option<&'a Path>,
	fixtures: Option<&'a Path>,
	page_size: Option<PageSize>,
	stdout: bool,
}

fn run_generate(args: &ReportgenCli, options: GenerateOptions<'_>) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let template_path = resolve_template(options.template, &config, &root)?;

	let fixtures_path = options
		.fixtures
		.map(|path| root.join(path))
		.or_else(|| config.fixtures_file(&root));
	let mut engine = match &fixtures_path {
		Some(path) => FixtureQueryEngine::load(path)?,
		None => {
			tracing::debug!("no fixtures configured, every dataset query will fail");
			FixtureQueryEngine::new()
		}
	};

	let generation = generate_file(&template_path, &mut engine, &config.limits)?;
	print_warnings(&generation.warnings);

	let page_size = options.page_size.unwrap_or(config.page_size);
	let artifact = HtmlRenderer.render(&generation.document.to_string(), page_size)?;

	if options.stdout {
		let mut stdout = std::io::stdout().lock();
		stdout.write_all(&artifact.bytes)?;
		stdout.flush()?;
		return Ok(());
	}

	let output_dir = match options.output {
		Some(path) => root.join(path),
		None => config.output_directory(&root)?,
	};
	std::fs::create_dir_all(&output_dir)?;

	let file_name = output_file_name(
		&template_path,
		chrono::Local::now().naive_local(),
		artifact.extension,
	);
	let destination = output_dir.join(file_name);
	std::fs::write(&destination, &artifact.bytes)?;

	println!(
		"{} {} ({page_size})",
		colored!("Generated", green),
		make_relative(&destination, &root)
	);

	Ok(())
}

fn run_check(args: &ReportgenCli, template: Option<&Path>) -> AnyEmptyResult {
	let (template_path, parsed) = read_declarations(args, template)?;
	let root = resolve_root(args);

	if args.verbose {
		println!("Checked {}", make_relative(&template_path, &root));
	}

	println!(
		"{} {} datasource(s) and {} dataset(s) declared.",
		colored!("Template is valid:", green),
		parsed.registries.data_sources.len(),
		parsed.registries.data_sets.len()
	);

	Ok(())
}

fn run_list(args: &ReportgenCli, template: Option<&Path>) -> AnyEmptyResult {
	let (_, parsed) = read_declarations(args, template)?;
	let (_, loops) = extract_loops(&parsed.body);
	let registries = &parsed.registries;

	if registries.data_sources.is_empty() && registries.data_sets.is_empty() && loops.is_empty() {
		println!("No declarations or loops found.");
		return Ok(());
	}

	if !registries.data_sources.is_empty() {
		println!("{}", colored!("Datasources:", bold));
		for source in registries.data_sources.iter() {
			println!("  {} {}/{}", source.name, source.server, source.database);
		}
	}

	if !registries.data_sets.is_empty() {
		println!("{}", colored!("Datasets:", bold));
		for data_set in registries.data_sets.iter() {
			let note = if data_set.dataset_type == DataSetType::StoredProcedure {
				String::new()
			} else {
				format!(" {}", colored!("(not executable)", yellow))
			};
			println!(
				"  {} {}.{} [{}] {} param(s){note}",
				data_set.name,
				data_set.data_source,
				data_set.object,
				data_set.dataset_type,
				data_set.parameters.len()
			);
		}
	}

	if !loops.is_empty() {
		println!("{}", colored!("Loops:", bold));
		for tag in loops.iter() {
			let status = if registries.data_sets.contains(&tag.data_set) {
				"linked".to_string()
			} else {
				colored!("undeclared", yellow)
			};
			println!(
				"  {} for {} in {} ({status})",
				tag.id, tag.inner_var, tag.data_set
			);
		}
	}

	Ok(())
}

fn print_warnings(warnings: &[ResolutionWarning]) {
	for warning in warnings {
		eprintln!("{} {warning}", colored!("warning:", yellow));
	}
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
