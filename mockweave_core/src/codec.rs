use crate::Dialect;
use crate::TemporalFormat;
use crate::ValueError;

/// Bit width of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
	Small,
	Regular,
	Big,
}

impl IntegerWidth {
	pub fn bounds(self) -> (i64, i64) {
		match self {
			Self::Small => (i16::MIN.into(), i16::MAX.into()),
			Self::Regular => (i32::MIN.into(), i32::MAX.into()),
			Self::Big => (i64::MIN, i64::MAX),
		}
	}

	pub fn type_name(self) -> &'static str {
		match self {
			Self::Small => "smallint",
			Self::Regular => "integer",
			Self::Big => "bigint",
		}
	}
}

/// How a single cell is validated and turned into a SQL literal. The cast
/// applied to the literal is stored alongside in [`ColumnCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecKind {
	/// Quoted passthrough.
	Text,
	/// Case-sensitive match against two tokens.
	Boolean { truthy: String, falsy: String },
	/// Whole number within the width's inclusive bounds.
	Integer(IntegerWidth),
	/// Finite decimal number. `integral` demands a whole number, as a zero
	/// scale does.
	Decimal { integral: bool },
	/// Date, time or timestamp re-rendered in a canonical format.
	Temporal(TemporalFormat),
	/// Quoted passthrough of a semi-structured value.
	Document,
}

/// A parsed header cell: the column's output name and how to write its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCodec {
	name: String,
	dialect: Dialect,
	cast: String,
	kind: CodecKind,
}

impl ColumnCodec {
	/// `name` is normalized for the dialect: Snowflake folds to uppercase,
	/// Postgres keeps it as written.
	pub fn new(name: &str, dialect: Dialect, cast: impl Into<String>, kind: CodecKind) -> Self {
		let name = match dialect {
			Dialect::Snowflake => name.trim().to_uppercase(),
			Dialect::Postgres => name.trim().to_string(),
		};

		Self {
			name,
			dialect,
			cast: cast.into(),
			kind,
		}
	}

	/// Column alias as it appears in the generated SQL.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// SQL type the literal is cast to.
	pub fn cast(&self) -> &str {
		&self.cast
	}

	pub fn kind(&self) -> &CodecKind {
		&self.kind
	}

	/// Convert one raw cell into `<literal>::<cast> AS <name>`.
	pub fn write(&self, raw: &str) -> Result<String, ValueError> {
		let literal = self.literal(raw)?;
		let alias = match self.dialect {
			Dialect::Snowflake => "AS",
			Dialect::Postgres => "as",
		};

		Ok(format!("{literal}::{} {alias} {}", self.cast, self.name))
	}

	fn literal(&self, raw: &str) -> Result<String, ValueError> {
		match &self.kind {
			CodecKind::Text | CodecKind::Document => Ok(quote(raw)),
			CodecKind::Boolean { truthy, falsy } => {
				if raw == truthy {
					Ok("true".to_string())
				} else if raw == falsy {
					Ok("false".to_string())
				} else {
					Err(ValueError::Boolean {
						value: raw.to_string(),
						truthy: truthy.clone(),
						falsy: falsy.clone(),
					})
				}
			}
			CodecKind::Integer(width) => check_integer(raw, *width).map(|()| raw.to_string()),
			CodecKind::Decimal { integral: true } => {
				raw.parse::<i64>()
					.map(|_| raw.to_string())
					.map_err(|_| {
						ValueError::Conversion {
							value: raw.to_string(),
							target: "integer",
						}
					})
			}
			CodecKind::Decimal { integral: false } => {
				match raw.parse::<f64>() {
					Ok(value) if value.is_finite() => Ok(raw.to_string()),
					_ => {
						Err(ValueError::Conversion {
							value: raw.to_string(),
							target: "float",
						})
					}
				}
			}
			CodecKind::Temporal(format) => format.render(raw).map(|value| quote(&value)),
		}
	}
}

fn check_integer(raw: &str, width: IntegerWidth) -> Result<(), ValueError> {
	let (min, max) = width.bounds();
	let out_of_range = || {
		ValueError::OutOfRange {
			value: raw.to_string(),
			type_name: width.type_name(),
			min,
			max,
		}
	};

	// Digits that overflow i64 are still a number, just an out-of-range one.
	let value = match raw.parse::<i64>() {
		Ok(value) => value,
		Err(error)
			if matches!(
				error.kind(),
				std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow
			) =>
		{
			return Err(out_of_range());
		}
		Err(_) => {
			return Err(ValueError::Conversion {
				value: raw.to_string(),
				target: "integer",
			});
		}
	};

	if (min..=max).contains(&value) {
		Ok(())
	} else {
		Err(out_of_range())
	}
}

/// Single-quote a literal, doubling embedded quotes.
pub fn quote(value: &str) -> String {
	format!("'{}'", value.replace('\'', "''"))
}
