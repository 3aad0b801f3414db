use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mockweave_cli::MockweaveCli;
use mockweave_cli::OutputFormat;
use mockweave_core::DEFAULT_OUTPUT_DIR;
use mockweave_core::DEFAULT_TEMPLATE_DIR;
use mockweave_core::DEFAULT_WORKERS;
use mockweave_core::MockweaveConfig;
use mockweave_core::RunOptions;
use mockweave_core::RunReport;
use mockweave_core::run;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "MOCKWEAVE_LOG";

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
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MockweaveCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

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

	init_logging(args.verbose, use_color);

	match run_generate(&args) {
		Ok(report) if report.is_ok() => {}
		Ok(_) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<mockweave_core::MockweaveError>() {
				Ok(mockweave_err) => {
					let report: miette::Report = (*mockweave_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &MockweaveCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Flags win over the config file, which wins over built-in defaults.
fn build_options(
	args: &MockweaveCli,
	root: &Path,
	config: &MockweaveConfig,
) -> Result<RunOptions, Box<dyn std::error::Error>> {
	let settings = config.fixture_settings(args.dialect.map(Into::into))?;

	let template_dir = args
		.template_dir
		.clone()
		.or_else(|| config.template_dir.clone())
		.unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));
	let output_dir = args
		.output_dir
		.clone()
		.or_else(|| config.output_dir.clone())
		.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
	let workers = args.workers.or(config.workers).unwrap_or(DEFAULT_WORKERS);

	let mut options =
		RunOptions::new(root.join(template_dir), root.join(output_dir), settings).with_workers(workers);
	options.scanners = args.scanners.or(config.scanners).unwrap_or(workers);
	options.resolvers = args.resolvers.or(config.resolvers).unwrap_or(workers);
	options.mergers = args.mergers.or(config.mergers).unwrap_or(workers);
	options.cases.clone_from(&args.cases);

	tracing::debug!(
		template_root = %options.template_root.display(),
		output_root = %options.output_root.display(),
		dialect = ?options.settings.dialect,
		scanners = options.scanners,
		resolvers = options.resolvers,
		mergers = options.mergers,
		"resolved run options"
	);

	Ok(options)
}

fn run_generate(args: &MockweaveCli) -> Result<RunReport, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = match &args.config {
		Some(path) => MockweaveConfig::load_from(path)?,
		None => MockweaveConfig::load(&root)?.unwrap_or_default(),
	};

	let options = build_options(args, &root, &config)?;
	let report = run(options)?;

	match args.format {
		OutputFormat::Text => print_report(&report, &root, args.verbose),
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
	}

	Ok(report)
}

fn print_report(report: &RunReport, root: &Path, verbose: bool) {
	for path in &report.generated {
		println!("{} {}", colored!("generated", green), make_relative(path, root));
	}

	if verbose {
		for path in &report.up_to_date {
			println!("up to date {}", make_relative(path, root));
		}
	}

	for failure in &report.failed {
		println!(
			"{} {}: {}",
			colored!("failed", red),
			make_relative(&failure.template, root),
			failure.message
		);
	}

	if report.templates == 0 {
		println!("No test templates found.");
		return;
	}

	println!(
		"\n{} {} template(s): {} generated, {} up to date, {} failed. {} fixture(s) compiled.",
		colored!("Processed", bold),
		report.templates,
		report.generated.len(),
		report.up_to_date.len(),
		report.failed.len(),
		report.fixtures_compiled
	);
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
