use std::ops::RangeInclusive;

use crate::ColumnCodec;
use crate::Registry;
use crate::SignatureError;

/// A header cell split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSignature {
	/// The cell exactly as written, used in error messages.
	pub raw: String,
	pub name: String,
	/// Registry prefix that matched, e.g. `[number(`. Empty for bare columns.
	pub tag: &'static str,
	/// Trimmed parameters, in order. An empty string selects the default.
	pub params: Vec<String>,
}

impl ColumnSignature {
	/// The parameter at `index`, if present and not blank.
	pub fn param(&self, index: usize) -> Option<&str> {
		self.params
			.get(index)
			.map(String::as_str)
			.filter(|param| !param.is_empty())
	}

	/// An integer parameter within `range`, or `default` when absent.
	pub fn int_param(
		&self,
		index: usize,
		parameter: &'static str,
		range: RangeInclusive<u32>,
		default: u32,
	) -> Result<u32, SignatureError> {
		let Some(raw) = self.param(index) else {
			return Ok(default);
		};

		let invalid = |reason: String| {
			SignatureError::InvalidParameter {
				signature: self.raw.clone(),
				parameter,
				value: raw.to_string(),
				reason,
			}
		};

		let value = raw.parse::<u32>().map_err(|_| {
			invalid(format!(
				"Expected int {}-{}",
				range.start(),
				range.end()
			))
		})?;

		if range.contains(&value) {
			Ok(value)
		} else {
			Err(invalid(format!(
				"{parameter} must be between {} and {}",
				range.start(),
				range.end()
			)))
		}
	}
}

/// Whether a header cell carries no type annotation.
pub fn is_bare(cell: &str) -> bool {
	!cell.contains('[') && !cell.contains(']')
}

/// Parse one header cell into a codec using `registry`.
///
/// The checks run in a fixed order and later ones rely on the earlier ones
/// having passed: closing bracket, balanced parentheses, registered type,
/// nothing after the type call, then parameter count.
pub fn parse_signature(registry: &Registry, cell: &str) -> Result<ColumnCodec, SignatureError> {
	let cell = cell.trim();

	if is_bare(cell) {
		if cell.is_empty() {
			return Err(SignatureError::InvalidName(cell.to_string()));
		}

		let signature = ColumnSignature {
			raw: cell.to_string(),
			name: cell.to_string(),
			tag: "",
			params: Vec::new(),
		};
		return (registry.bare())(&signature);
	}

	if !cell.ends_with(']') {
		return Err(if cell.contains(']') {
			SignatureError::TrailingContent(cell.to_string())
		} else {
			SignatureError::MissingBracket(cell.to_string())
		});
	}

	if cell.matches('(').count() != cell.matches(')').count() {
		return Err(SignatureError::UnbalancedParentheses(cell.to_string()));
	}

	let lower = cell.to_ascii_lowercase();
	let Some(entry) = registry
		.iter()
		.find(|entry| lower.contains(entry.prefix) && lower.ends_with(")]"))
	else {
		return Err(SignatureError::UnknownType(cell.to_string()));
	};

	// ASCII lowercasing keeps byte offsets, so positions in `lower` index
	// into `cell`.
	let Some(start) = lower.find(entry.prefix) else {
		return Err(SignatureError::UnknownType(cell.to_string()));
	};
	let params_start = start + entry.prefix.len();
	let Some(close) = cell[params_start..].find(")]").map(|index| params_start + index) else {
		return Err(SignatureError::UnknownType(cell.to_string()));
	};

	if close + 2 != cell.len() {
		return Err(SignatureError::TrailingContent(cell.to_string()));
	}

	let name = &cell[..start];
	if name.trim().is_empty()
		|| !name
			.trim()
			.chars()
			.all(|c| c.is_alphanumeric() || c == '_')
	{
		return Err(SignatureError::InvalidName(cell.to_string()));
	}

	let inner = cell[params_start..close].trim();
	let params: Vec<String> = if inner.is_empty() {
		Vec::new()
	} else if entry.arity == 1 {
		// A lone parameter may itself contain commas, e.g. `MMM dd, yyyy`.
		vec![inner.to_string()]
	} else {
		inner.split(',').map(|param| param.trim().to_string()).collect()
	};

	if params.len() > entry.arity {
		return Err(SignatureError::WrongArity {
			signature: cell.to_string(),
			expected: entry.arity,
			got: params.len(),
		});
	}

	let signature = ColumnSignature {
		raw: cell.to_string(),
		name: name.trim().to_string(),
		tag: entry.prefix,
		params,
	};

	(entry.build)(&signature)
}
