use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::format::ParseErrorKind;

use crate::ValueError;

/// Symbolic date formats accepted in a signature and the `chrono` pattern each
/// one parses with.
pub const DATE_FORMATS: [(&str, &str); 9] = [
	("yyyy-MM-dd", "%Y-%m-%d"),
	("dd-MM-yyyy", "%d-%m-%Y"),
	("MM/dd/yyyy", "%m/%d/%Y"),
	("yyyy/MM/dd", "%Y/%m/%d"),
	("dd/MM/yyyy", "%d/%m/%Y"),
	("MMM dd, yyyy", "%b %d, %Y"),
	("MMMM dd, yyyy", "%B %d, %Y"),
	("dd MMM yyyy", "%d %b %Y"),
	("yyyy-MM-ddTHH:mm:ssZ", "%Y-%m-%dT%H:%M:%SZ"),
];

/// Symbolic time-of-day formats. A trailing `Z` only accepts the UTC
/// designator.
pub const TIME_FORMATS: [(&str, &str); 10] = [
	("HH:mm:ss", "%H:%M:%S%.f"),
	("hh:mm:ss tt", "%I:%M:%S %p"),
	("HH:mm", "%H:%M"),
	("hh:mm tt", "%I:%M %p"),
	("HH:mm:ss.SSS", "%H:%M:%S%.3f"),
	("hh:mm:ss.SSS tt", "%I:%M:%S%.3f %p"),
	("HH:mm:ssZ", "%H:%M:%S%.fZ"),
	("hh:mm:ss ttZ", "%I:%M:%S %pZ"),
	("HH:mm:ss.SSSZ", "%H:%M:%S%.3fZ"),
	("hh:mm:ss.SSS ttZ", "%I:%M:%S%.3f %pZ"),
];

/// Symbolic timestamp formats.
pub const TIMESTAMP_FORMATS: [(&str, &str); 26] = [
	("yyyy-MM-dd HH:mm:ss", "%Y-%m-%d %H:%M:%S%.f"),
	("yyyy-MM-ddThh:mm:ssZ", "%Y-%m-%dT%H:%M:%SZ"),
	("yyyy-MM-ddTHH:mm:ssZ", "%Y-%m-%dT%H:%M:%SZ"),
	("yyyy-MM-dd HH:mm:ss.SSSZ", "%Y-%m-%d %H:%M:%S%.3fZ"),
	("yyyy-MM-ddTHH:mm:ss.SSSZ", "%Y-%m-%dT%H:%M:%S%.3fZ"),
	("yyyy-MM-dd HH:mm:ss.SSS", "%Y-%m-%d %H:%M:%S%.3f"),
	("yyyy-MM-ddThh:mm:ss", "%Y-%m-%dT%H:%M:%S"),
	("yyyy-MM-ddTHH:mm:ss", "%Y-%m-%dT%H:%M:%S"),
	("yyyy/MM/dd HH:mm:ss", "%Y/%m/%d %H:%M:%S"),
	("yyyy/MM/dd HH:mm:ss.SSSZ", "%Y/%m/%d %H:%M:%S%.3fZ"),
	("yyyy/MM/ddTHH:mm:ss.SSSZ", "%Y/%m/%dT%H:%M:%S%.3fZ"),
	("yyyy/MM/dd HH:mm:ss.SSS", "%Y/%m/%d %H:%M:%S%.3f"),
	("yyyy/MM/ddThh:mm:ss", "%Y/%m/%dT%H:%M:%S"),
	("yyyy/MM/ddTHH:mm:ss", "%Y/%m/%dT%H:%M:%S"),
	("MM-dd-yyyy HH:mm:ss", "%m-%d-%Y %H:%M:%S"),
	("MM-dd-yyyy HH:mm:ss.SSSZ", "%m-%d-%Y %H:%M:%S%.3fZ"),
	("MM-dd-yyyyTHH:mm:ss.SSSZ", "%m-%d-%YT%H:%M:%S%.3fZ"),
	("MM-dd-yyyy HH:mm:ss.SSS", "%m-%d-%Y %H:%M:%S%.3f"),
	("MM-dd-yyyyThh:mm:ss", "%m-%d-%YT%H:%M:%S"),
	("MM-dd-yyyyTHH:mm:ss", "%m-%d-%YT%H:%M:%S"),
	("MM/dd/yyyy HH:mm:ss", "%m/%d/%Y %H:%M:%S"),
	("MM/dd/yyyy HH:mm:ss.SSSZ", "%m/%d/%Y %H:%M:%S%.3fZ"),
	("MM/dd/yyyyTHH:mm:ss.SSSZ", "%m/%d/%YT%H:%M:%S%.3fZ"),
	("MM/dd/yyyy HH:mm:ss.SSS", "%m/%d/%Y %H:%M:%S%.3f"),
	("MM/dd/yyyyThh:mm:ss", "%m/%d/%YT%H:%M:%S"),
	("MM/dd/yyyyTHH:mm:ss", "%m/%d/%YT%H:%M:%S"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
	Date,
	Time,
	Timestamp,
}

impl TemporalKind {
	/// Lowercase noun used in error messages.
	pub fn label(self) -> &'static str {
		match self {
			Self::Date => "date",
			Self::Time => "time",
			Self::Timestamp => "timestamp",
		}
	}

	/// The symbolic format used when a signature leaves it empty.
	pub fn default_format(self) -> &'static str {
		match self {
			Self::Date => "yyyy-MM-dd",
			Self::Time => "HH:mm:ss",
			Self::Timestamp => "yyyy-MM-dd HH:mm:ss",
		}
	}

	/// Pattern every rendered value is written in, independent of the input
	/// format.
	pub fn canonical_pattern(self) -> &'static str {
		match self {
			Self::Date => "%Y-%m-%d",
			Self::Time => "%H:%M:%S%.f",
			Self::Timestamp => "%Y-%m-%d %H:%M:%S%.f",
		}
	}

	fn table(self) -> &'static [(&'static str, &'static str)] {
		match self {
			Self::Date => &DATE_FORMATS,
			Self::Time => &TIME_FORMATS,
			Self::Timestamp => &TIMESTAMP_FORMATS,
		}
	}
}

/// Look up a symbolic format, or use `format` itself as a `chrono` pattern.
pub fn translate_format(kind: TemporalKind, format: &str) -> String {
	kind.table()
		.iter()
		.find(|(symbolic, _)| *symbolic == format)
		.map_or_else(|| format.to_string(), |(_, pattern)| (*pattern).to_string())
}

/// Parses raw cells with one input format and re-renders them canonically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFormat {
	kind: TemporalKind,
	/// Format as written in the signature, kept for error messages.
	format: String,
	pattern: String,
}

impl TemporalFormat {
	/// `format` is the signature parameter; `None` or blank selects the
	/// default.
	pub fn new(kind: TemporalKind, format: Option<&str>) -> Self {
		let format = format
			.map(str::trim)
			.filter(|format| !format.is_empty())
			.unwrap_or(kind.default_format());

		Self {
			kind,
			format: format.to_string(),
			pattern: translate_format(kind, format),
		}
	}

	pub fn kind(&self) -> TemporalKind {
		self.kind
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Parse `raw` and render it in the canonical pattern.
	pub fn render(&self, raw: &str) -> Result<String, ValueError> {
		let canonical = self.kind.canonical_pattern();
		let rendered = match self.kind {
			TemporalKind::Date => NaiveDate::parse_from_str(raw, &self.pattern)
				.map(|date| date.format(canonical).to_string()),
			TemporalKind::Time => NaiveTime::parse_from_str(raw, &self.pattern)
				.map(|time| time.format(canonical).to_string()),
			TemporalKind::Timestamp => {
				parse_timestamp(raw, &self.pattern).map(|ts| ts.format(canonical).to_string())
			}
		};

		rendered.map_err(|_| {
			ValueError::Temporal {
				value: raw.to_string(),
				kind: self.kind.label(),
				format: self.format.clone(),
			}
		})
	}
}

/// A date-only pattern yields midnight.
fn parse_timestamp(raw: &str, pattern: &str) -> chrono::ParseResult<NaiveDateTime> {
	match NaiveDateTime::parse_from_str(raw, pattern) {
		Err(error) if error.kind() == ParseErrorKind::NotEnough => {
			NaiveDate::parse_from_str(raw, pattern).map(|date| date.and_time(NaiveTime::default()))
		}
		result => result,
	}
}
