use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use mockweave_core::Dialect;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile typed CSV fixtures into SQL and weave them into dbt unit tests.",
	long_about = "mockweave reads dbt unit test templates (`test_*.sql`), finds every \
	              `dbt_unit_testing.mock_ref`, `mock_source` and `expect` call that names a \
	              `source_file`, compiles that fixture into `SELECT ... UNION ALL` SQL for the \
	              configured dialect and writes the completed test to the output directory.\n\nOnly \
	              templates whose inputs changed since the last run are rewritten.\n\nQuick \
	              start:\n  mockweave --dialect snowflake\n  mockweave --case 'orders/**' \
	              --format json"
)]
pub struct MockweaveCli {
	/// Path to the project root directory.
	#[arg(long, short)]
	pub path: Option<PathBuf>,

	/// Config file to use instead of discovering `mockweave.toml`.
	#[arg(long, short)]
	pub config: Option<PathBuf>,

	/// Directory searched for `test_*.sql` templates, relative to the project
	/// root.
	#[arg(long)]
	pub template_dir: Option<PathBuf>,

	/// Directory receiving generated tests, relative to the project root.
	#[arg(long)]
	pub output_dir: Option<PathBuf>,

	/// Target SQL dialect. Overrides the configured one.
	#[arg(long, short, value_enum)]
	pub dialect: Option<DialectArg>,

	/// Default size of every worker pool.
	#[arg(long, short)]
	pub workers: Option<usize>,

	/// Threads scanning templates.
	#[arg(long)]
	pub scanners: Option<usize>,

	/// Threads compiling fixtures.
	#[arg(long)]
	pub resolvers: Option<usize>,

	/// Threads writing generated tests.
	#[arg(long)]
	pub mergers: Option<usize>,

	/// Only process templates whose relative path or file name matches this
	/// glob. Can be repeated.
	#[arg(long = "case", value_name = "GLOB")]
	pub cases: Vec<String>,

	/// Output format for the run summary. Use `text` for human-readable
	/// output or `json` for programmatic consumption.
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DialectArg {
	Snowflake,
	Postgres,
}

impl From<DialectArg> for Dialect {
	fn from(value: DialectArg) -> Self {
		match value {
			DialectArg::Snowflake => Self::Snowflake,
			DialectArg::Postgres => Self::Postgres,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
