use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Malformed type annotation in a fixture header cell.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
	#[error("invalid signature '{0}'. Signature should be of the form <name>[type(...)]")]
	#[diagnostic(
		code(mockweave::signature::missing_bracket),
		help("close the type annotation with `]`, e.g. `Id[number(10,0)]`")
	)]
	MissingBracket(String),

	#[error("unbalanced parentheses in signature '{0}'")]
	#[diagnostic(code(mockweave::signature::unbalanced_parentheses))]
	UnbalancedParentheses(String),

	#[error("unable to parse header '{0}'")]
	#[diagnostic(
		code(mockweave::signature::unknown_type),
		help("the type must be one of the registered types for the configured dialect")
	)]
	UnknownType(String),

	#[error("invalid signature '{0}'. Unexpected content after the type annotation")]
	#[diagnostic(code(mockweave::signature::trailing_content))]
	TrailingContent(String),

	#[error("invalid signature '{signature}'. Expected at most {expected} parameter(s), got {got}")]
	#[diagnostic(code(mockweave::signature::wrong_arity))]
	WrongArity {
		signature: String,
		expected: usize,
		got: usize,
	},

	#[error("invalid signature '{0}'. Column name must not be empty")]
	#[diagnostic(code(mockweave::signature::invalid_name))]
	InvalidName(String),

	#[error("invalid signature '{signature}'. {parameter} must be specified along with {requires}")]
	#[diagnostic(code(mockweave::signature::missing_parameter))]
	MissingParameter {
		signature: String,
		parameter: &'static str,
		requires: &'static str,
	},

	#[error("invalid {parameter} '{value}' in signature '{signature}'. {reason}")]
	#[diagnostic(code(mockweave::signature::invalid_parameter))]
	InvalidParameter {
		signature: String,
		parameter: &'static str,
		value: String,
		reason: String,
	},
}

/// A cell value that its column codec refused.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueError {
	#[error("error converting value '{value}' to {target}")]
	#[diagnostic(code(mockweave::value::conversion))]
	Conversion { value: String, target: &'static str },

	#[error("value {value} is out of range for {type_name}, must be in range {min} to {max}")]
	#[diagnostic(code(mockweave::value::out_of_range))]
	OutOfRange {
		value: String,
		type_name: &'static str,
		min: i64,
		max: i64,
	},

	#[error("invalid boolean value '{value}', expected '{truthy}' (true) or '{falsy}' (false)")]
	#[diagnostic(code(mockweave::value::boolean))]
	Boolean {
		value: String,
		truthy: String,
		falsy: String,
	},

	#[error("not able to convert value '{value}' to {kind} using the '{format}' format")]
	#[diagnostic(code(mockweave::value::temporal))]
	Temporal {
		value: String,
		kind: &'static str,
		format: String,
	},
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MockweaveError {
	#[error(transparent)]
	#[diagnostic(code(mockweave::io_error))]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	#[diagnostic(transparent)]
	Grammar(#[from] SignatureError),

	#[error("error parsing value '{value}' for column '{column}' in line {line}")]
	#[diagnostic(code(mockweave::value))]
	Value {
		value: String,
		column: String,
		line: usize,
		#[source]
		source: ValueError,
	},

	#[error("line {line} has {got} field(s), but the header has {expected}")]
	#[diagnostic(
		code(mockweave::field_count),
		help("every row of a fixture must have as many fields as its header")
	)]
	FieldCount {
		line: usize,
		expected: usize,
		got: usize,
	},

	#[error("fixture '{0}' has no header row")]
	#[diagnostic(code(mockweave::empty_fixture))]
	EmptyFixture(PathBuf),

	#[error("error reading fixture: {0}")]
	#[diagnostic(code(mockweave::csv))]
	Csv(#[from] csv::Error),

	#[error("error reading file '{0}': file not found")]
	#[diagnostic(code(mockweave::source_not_found))]
	SourceNotFound(PathBuf),

	#[error("invalid configuration override `{path}`: {reason}")]
	#[diagnostic(
		code(mockweave::config_override),
		help("fix or remove the override file; built-in defaults are used meanwhile")
	)]
	ConfigOverride { path: PathBuf, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mockweave::config_parse),
		help("check that mockweave.toml is valid TOML with top-level settings and an optional [csv] table")
	)]
	ConfigParse(String),

	#[error("no SQL dialect configured")]
	#[diagnostic(
		code(mockweave::missing_dialect),
		help("set `dialect = \"snowflake\"` or `dialect = \"postgres\"` in mockweave.toml, or pass `--dialect`")
	)]
	MissingDialect,

	#[error("template directory `{0}` does not exist")]
	#[diagnostic(
		code(mockweave::missing_template_root),
		help("pass `--template-dir` or set `template_dir` in mockweave.toml")
	)]
	MissingTemplateRoot(PathBuf),

	#[error("symlink cycle detected at: `{0}`")]
	#[diagnostic(
		code(mockweave::symlink_cycle),
		help("remove the circular symlink from the template directory")
	)]
	SymlinkCycle(PathBuf),

	#[error("invalid template filter pattern `{pattern}`: {reason}")]
	#[diagnostic(code(mockweave::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to scan template `{path}`: {source}")]
	#[diagnostic(code(mockweave::scan))]
	Scan {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to generate `{path}`: {reason}")]
	#[diagnostic(code(mockweave::merge))]
	Merge { path: PathBuf, reason: String },

	#[error("failed to start worker pool: {0}")]
	#[diagnostic(code(mockweave::worker_pool))]
	WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type MockweaveResult<T> = Result<T, MockweaveError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
