use std::sync::LazyLock;

use derive_more::Deref;

use crate::CodecKind;
use crate::ColumnCodec;
use crate::ColumnSignature;
use crate::Dialect;
use crate::IntegerWidth;
use crate::SignatureError;
use crate::TemporalFormat;
use crate::TemporalKind;

pub type CodecFactory = fn(&ColumnSignature) -> Result<ColumnCodec, SignatureError>;

/// One registered column type.
#[derive(Debug, Clone, Copy)]
pub struct TypeEntry {
	/// Lowercase probe including the opening bracket, e.g. `[number(`.
	pub prefix: &'static str,
	/// Maximum number of parameters.
	pub arity: usize,
	pub build: CodecFactory,
}

/// The ordered type table of one dialect. Probing is first-match-wins, so
/// prefixes that overlap are registered most specific first.
#[derive(Debug, Deref)]
pub struct Registry {
	dialect: Dialect,
	#[deref]
	entries: Vec<TypeEntry>,
	bare: CodecFactory,
}

static SNOWFLAKE: LazyLock<Registry> = LazyLock::new(Registry::snowflake);
static POSTGRES: LazyLock<Registry> = LazyLock::new(Registry::postgres);

impl Registry {
	/// The shared registry for `dialect`, built on first use.
	pub fn for_dialect(dialect: Dialect) -> &'static Self {
		match dialect {
			Dialect::Snowflake => &SNOWFLAKE,
			Dialect::Postgres => &POSTGRES,
		}
	}

	pub fn dialect(&self) -> Dialect {
		self.dialect
	}

	/// Factory for header cells without a type annotation.
	pub fn bare(&self) -> CodecFactory {
		self.bare
	}

	/// Parse a header cell with this registry.
	pub fn parse_header(&self, cell: &str) -> Result<ColumnCodec, SignatureError> {
		crate::parse_signature(self, cell)
	}

	fn snowflake() -> Self {
		Self {
			dialect: Dialect::Snowflake,
			entries: vec![
				entry("[varchar(", 1, snowflake::varchar),
				entry("[boolean(", 2, snowflake::boolean),
				entry("[number(", 2, snowflake::number),
				entry("[date(", 1, snowflake::date),
				entry("[time(", 2, snowflake::time),
				entry("[datetime(", 2, snowflake::datetime),
				entry("[timestamp_ntz(", 2, snowflake::timestamp_ntz),
				entry("[timestamp_ltz(", 2, snowflake::timestamp_ltz),
				entry("[timestamp_tz(", 2, snowflake::timestamp_tz),
				entry("[timestamp(", 3, snowflake::timestamp),
				entry("[variant(", 0, snowflake::variant),
			],
			bare: snowflake::varchar,
		}
	}

	fn postgres() -> Self {
		Self {
			dialect: Dialect::Postgres,
			entries: vec![
				entry("[text(", 0, postgres::text),
				entry("[smallint(", 0, postgres::smallint),
				entry("[bigint(", 0, postgres::bigint),
				entry("[int(", 0, postgres::int),
				entry("[numeric(", 2, postgres::numeric),
				entry("[boolean(", 2, postgres::boolean),
				entry("[jsonb(", 0, postgres::jsonb),
				entry("[date(", 1, postgres::date),
				entry("[time_tz(", 2, postgres::time_tz),
				entry("[time(", 2, postgres::time),
				entry("[timestamp_tz(", 2, postgres::timestamp_tz),
				entry("[timestamp(", 2, postgres::timestamp),
			],
			bare: postgres::text,
		}
	}
}

fn entry(prefix: &'static str, arity: usize, build: CodecFactory) -> TypeEntry {
	TypeEntry {
		prefix,
		arity,
		build,
	}
}

fn boolean_tokens(signature: &ColumnSignature) -> CodecKind {
	CodecKind::Boolean {
		truthy: signature.param(0).unwrap_or("true").to_string(),
		falsy: signature.param(1).unwrap_or("false").to_string(),
	}
}

fn temporal(signature: &ColumnSignature, kind: TemporalKind) -> CodecKind {
	CodecKind::Temporal(TemporalFormat::new(kind, signature.param(0)))
}

mod snowflake {
	use super::*;

	const MAX_VARCHAR: u32 = 16_777_216;
	const MAX_PRECISION: u32 = 38;
	const DEFAULT_SCALE: u32 = 2;
	const MAX_FRACTION: u32 = 9;

	fn codec(signature: &ColumnSignature, cast: String, kind: CodecKind) -> ColumnCodec {
		ColumnCodec::new(&signature.name, Dialect::Snowflake, cast, kind)
	}

	fn fraction(signature: &ColumnSignature) -> Result<u32, SignatureError> {
		signature.int_param(1, "precision", 0..=MAX_FRACTION, MAX_FRACTION)
	}

	pub(super) fn varchar(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let bytes = signature.int_param(0, "bytes", 0..=MAX_VARCHAR, MAX_VARCHAR)?;
		Ok(codec(signature, format!("VARCHAR({bytes})"), CodecKind::Text))
	}

	pub(super) fn boolean(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"BOOLEAN".to_string(),
			boolean_tokens(signature),
		))
	}

	pub(super) fn number(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = signature.int_param(0, "precision", 0..=MAX_PRECISION, MAX_PRECISION)?;
		let scale = signature.int_param(1, "scale", 0..=MAX_PRECISION, DEFAULT_SCALE)?;

		if scale > precision {
			return Err(SignatureError::InvalidParameter {
				signature: signature.raw.clone(),
				parameter: "scale",
				value: scale.to_string(),
				reason: format!("scale must not exceed precision {precision}"),
			});
		}

		Ok(codec(
			signature,
			format!("NUMBER({precision},{scale})"),
			CodecKind::Decimal {
				integral: scale == 0,
			},
		))
	}

	pub(super) fn date(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"DATE".to_string(),
			temporal(signature, TemporalKind::Date),
		))
	}

	pub(super) fn time(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("TIME({precision})"),
			temporal(signature, TemporalKind::Time),
		))
	}

	pub(super) fn datetime(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("DATETIME({precision})"),
			temporal(signature, TemporalKind::Timestamp),
		))
	}

	fn timestamp_of(
		signature: &ColumnSignature,
		suffix: &str,
	) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("TIMESTAMP{suffix}({precision})"),
			temporal(signature, TemporalKind::Timestamp),
		))
	}

	pub(super) fn timestamp(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let suffix = match signature.param(2).map(str::to_ascii_uppercase) {
			None => String::new(),
			Some(kind) if matches!(kind.as_str(), "NTZ" | "LTZ" | "TZ") => format!("_{kind}"),
			Some(kind) => {
				return Err(SignatureError::InvalidParameter {
					signature: signature.raw.clone(),
					parameter: "timestamp type",
					value: kind,
					reason: "Expected 'TZ', 'LTZ', 'NTZ' or empty".to_string(),
				});
			}
		};

		timestamp_of(signature, &suffix)
	}

	pub(super) fn timestamp_ntz(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		timestamp_of(signature, "_NTZ")
	}

	pub(super) fn timestamp_ltz(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		timestamp_of(signature, "_LTZ")
	}

	pub(super) fn timestamp_tz(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		timestamp_of(signature, "_TZ")
	}

	pub(super) fn variant(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(signature, "VARIANT".to_string(), CodecKind::Document))
	}
}

mod postgres {
	use super::*;

	const MAX_NUMERIC_PRECISION: u32 = 1000;
	const MAX_FRACTION: u32 = 6;

	fn codec(signature: &ColumnSignature, cast: String, kind: CodecKind) -> ColumnCodec {
		ColumnCodec::new(&signature.name, Dialect::Postgres, cast, kind)
	}

	fn fraction(signature: &ColumnSignature) -> Result<u32, SignatureError> {
		signature.int_param(1, "precision", 0..=MAX_FRACTION, MAX_FRACTION)
	}

	pub(super) fn text(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(signature, "text".to_string(), CodecKind::Text))
	}

	pub(super) fn smallint(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"smallint".to_string(),
			CodecKind::Integer(IntegerWidth::Small),
		))
	}

	pub(super) fn int(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"int".to_string(),
			CodecKind::Integer(IntegerWidth::Regular),
		))
	}

	pub(super) fn bigint(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"bigint".to_string(),
			CodecKind::Integer(IntegerWidth::Big),
		))
	}

	pub(super) fn numeric(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let kind = CodecKind::Decimal { integral: false };

		match (signature.param(0), signature.param(1)) {
			(None, None) => Ok(codec(signature, "numeric".to_string(), kind)),
			(Some(_), None) => {
				Err(SignatureError::MissingParameter {
					signature: signature.raw.clone(),
					parameter: "precision",
					requires: "scale",
				})
			}
			(None, Some(_)) => {
				Err(SignatureError::MissingParameter {
					signature: signature.raw.clone(),
					parameter: "scale",
					requires: "precision",
				})
			}
			(Some(_), Some(_)) => {
				let precision =
					signature.int_param(0, "precision", 0..=MAX_NUMERIC_PRECISION, 0)?;
				let scale = signature.int_param(1, "scale", 0..=precision, 0)?;
				Ok(codec(signature, format!("numeric({precision},{scale})"), kind))
			}
		}
	}

	pub(super) fn boolean(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"boolean".to_string(),
			boolean_tokens(signature),
		))
	}

	pub(super) fn jsonb(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(signature, "jsonb".to_string(), CodecKind::Document))
	}

	pub(super) fn date(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		Ok(codec(
			signature,
			"date".to_string(),
			temporal(signature, TemporalKind::Date),
		))
	}

	pub(super) fn time(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("time({precision})"),
			temporal(signature, TemporalKind::Time),
		))
	}

	pub(super) fn time_tz(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("time({precision}) with time zone"),
			temporal(signature, TemporalKind::Time),
		))
	}

	pub(super) fn timestamp(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("timestamp({precision})"),
			temporal(signature, TemporalKind::Timestamp),
		))
	}

	pub(super) fn timestamp_tz(signature: &ColumnSignature) -> Result<ColumnCodec, SignatureError> {
		let precision = fraction(signature)?;
		Ok(codec(
			signature,
			format!("timestamp({precision}) with time zone"),
			temporal(signature, TemporalKind::Timestamp),
		))
	}
}
