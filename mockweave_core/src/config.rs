use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::MockweaveError;
use crate::MockweaveResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"mockweave.toml",
	".mockweave.toml",
	".config/mockweave.toml",
];

/// Name of the optional settings file placed next to fixtures. It applies to
/// every fixture in the same directory.
pub const OVERRIDE_FILE_NAME: &str = ".mockweave-fixture.toml";

/// Default directory, relative to the project root, searched for templates.
pub const DEFAULT_TEMPLATE_DIR: &str = "test-templates";

/// Default directory, relative to the project root, receiving generated tests.
pub const DEFAULT_OUTPUT_DIR: &str = "tests/unit";

/// Default size of each worker pool.
pub const DEFAULT_WORKERS: usize = 10;

/// Target SQL engine. Decides type names, literal casing and default
/// precisions of every column codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
	Snowflake,
	Postgres,
}

impl fmt::Display for Dialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Snowflake => f.write_str("snowflake"),
			Self::Postgres => f.write_str("postgres"),
		}
	}
}

/// How fixture files are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
	/// Delimited text whose header row carries type annotations.
	#[default]
	Csv,
	/// Raw SQL copied into the template verbatim.
	Sql,
}

/// Validated tokenizer settings for delimited fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
	pub delimiter: u8,
	pub comment: u8,
	pub trim_leading_space: bool,
}

impl Default for CsvOptions {
	fn default() -> Self {
		Self {
			delimiter: b',',
			comment: b'#',
			trim_leading_space: true,
		}
	}
}

/// The `[csv]` table as written in a config file.
///
/// ```toml
/// [csv]
/// delimiter = ";"
/// comment = "%"
/// trim_leading_space = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvConfig {
	#[serde(default)]
	pub delimiter: Option<String>,
	#[serde(default)]
	pub comment: Option<String>,
	#[serde(default)]
	pub trim_leading_space: Option<bool>,
}

impl CsvConfig {
	/// Check that both the delimiter and the comment prefix are a single ASCII
	/// character and convert into [`CsvOptions`].
	pub fn validate(&self) -> Result<CsvOptions, String> {
		let delimiter = single_byte("delimiter", self.delimiter.as_deref())?;
		let comment = single_byte("comment", self.comment.as_deref())?;

		if delimiter == comment {
			return Err(format!(
				"delimiter and comment must differ, both are `{}`",
				delimiter as char
			));
		}

		Ok(CsvOptions {
			delimiter,
			comment,
			trim_leading_space: self.trim_leading_space.unwrap_or(true),
		})
	}
}

fn single_byte(field: &str, value: Option<&str>) -> Result<u8, String> {
	let Some(value) = value else {
		return Err(format!("`{field}` is missing"));
	};

	match value.as_bytes() {
		[byte] if byte.is_ascii() && !matches!(byte, b'"' | b'\n' | b'\r') => Ok(*byte),
		[] => Err(format!("`{field}` must not be empty")),
		_ => Err(format!("`{field}` must be a single ASCII character, got `{value}`")),
	}
}

/// Configuration loaded from a `mockweave.toml` file.
///
/// ```toml
/// dialect = "snowflake"
/// input = "csv"
/// template_dir = "test-templates"
/// output_dir = "tests/unit"
/// workers = 10
///
/// [csv]
/// delimiter = ","
/// comment = "#"
/// trim_leading_space = true
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct MockweaveConfig {
	/// Target SQL dialect. Required here or on the command line.
	#[serde(default)]
	pub dialect: Option<Dialect>,
	/// Fixture input kind. Defaults to `csv`.
	#[serde(default)]
	pub input: Option<InputKind>,
	/// Directory searched for `test_*.sql` templates.
	#[serde(default)]
	pub template_dir: Option<PathBuf>,
	/// Directory receiving generated tests.
	#[serde(default)]
	pub output_dir: Option<PathBuf>,
	/// Default size of all three worker pools.
	#[serde(default)]
	pub workers: Option<usize>,
	#[serde(default)]
	pub scanners: Option<usize>,
	#[serde(default)]
	pub resolvers: Option<usize>,
	#[serde(default)]
	pub mergers: Option<usize>,
	/// Delimited text settings.
	#[serde(default)]
	pub csv: Option<CsvConfig>,
}

impl MockweaveConfig {
	/// Returns the first existing config path under `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the project configuration from `root`, returning `None` when no
	/// candidate file exists.
	pub fn load(root: &Path) -> MockweaveResult<Option<Self>> {
		let Some(path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&path).map(Some)
	}

	/// Load the configuration from an explicit file.
	pub fn load_from(path: &Path) -> MockweaveResult<Self> {
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content)
			.map_err(|e| MockweaveError::ConfigParse(format!("{}: {e}", path.display())))
	}

	/// Settings every fixture starts from. `dialect` takes precedence over the
	/// configured one.
	pub fn fixture_settings(&self, dialect: Option<Dialect>) -> MockweaveResult<FixtureSettings> {
		let dialect = dialect
			.or(self.dialect)
			.ok_or(MockweaveError::MissingDialect)?;

		let csv = match self.csv.as_ref().map(CsvConfig::validate) {
			None => CsvOptions::default(),
			Some(Ok(csv)) => csv,
			Some(Err(reason)) => {
				tracing::warn!(%reason, "invalid [csv] configuration, using defaults");
				CsvOptions::default()
			}
		};

		Ok(FixtureSettings {
			dialect,
			input: self.input.unwrap_or_default(),
			csv,
		})
	}
}

/// Effective settings used to compile one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSettings {
	pub dialect: Dialect,
	pub input: InputKind,
	pub csv: CsvOptions,
}

impl FixtureSettings {
	/// Built-in defaults for the given dialect.
	pub fn new(dialect: Dialect) -> Self {
		Self {
			dialect,
			input: InputKind::default(),
			csv: CsvOptions::default(),
		}
	}

	/// Settings for fixtures in `dir`: the directory's override file layered
	/// on top of `self`. An unreadable or malformed override falls back to the
	/// built-in defaults.
	pub fn for_directory(&self, dir: &Path) -> Self {
		match self.load_override(dir) {
			Ok(Some(settings)) => settings,
			Ok(None) => *self,
			Err(error) => {
				tracing::warn!(%error, "falling back to default fixture settings");
				Self::new(self.dialect)
			}
		}
	}

	/// Parse the override file in `dir`, if one exists.
	pub fn load_override(&self, dir: &Path) -> MockweaveResult<Option<Self>> {
		let path = dir.join(OVERRIDE_FILE_NAME);
		if !path.is_file() {
			return Ok(None);
		}

		let content =
			std::fs::read_to_string(&path).map_err(|e| MockweaveError::ConfigOverride {
				path: path.clone(),
				reason: e.to_string(),
			})?;
		let raw: FixtureOverride =
			toml::from_str(&content).map_err(|e| MockweaveError::ConfigOverride {
				path: path.clone(),
				reason: e.to_string(),
			})?;

		let csv = match raw.csv.as_ref().map(CsvConfig::validate) {
			None => self.csv,
			Some(Ok(csv)) => csv,
			Some(Err(reason)) => {
				tracing::warn!(path = %path.display(), %reason, "invalid [csv] override, using defaults");
				CsvOptions::default()
			}
		};

		tracing::debug!(path = %path.display(), "applied fixture settings override");

		Ok(Some(Self {
			dialect: raw.dialect.unwrap_or(self.dialect),
			input: raw.input.unwrap_or(self.input),
			csv,
		}))
	}
}

#[derive(Debug, Default, Deserialize)]
struct FixtureOverride {
	#[serde(default)]
	dialect: Option<Dialect>,
	#[serde(default)]
	input: Option<InputKind>,
	#[serde(default)]
	csv: Option<CsvConfig>,
}
