use std::borrow::Cow;
use std::path::Path;

use csv::Position;
use csv::ReaderBuilder;

use crate::ColumnCodec;
use crate::CsvOptions;
use crate::FixtureSettings;
use crate::InputKind;
use crate::MockweaveError;
use crate::MockweaveResult;
use crate::Registry;

/// Separator placed between the `SELECT` of consecutive rows.
pub const ROW_SEPARATOR: &str = "\nUNION ALL\n";

/// Compile fixture `content` read from `path` according to `settings`.
///
/// Raw SQL is returned untouched. Delimited text becomes one `SELECT` per data
/// row joined with `UNION ALL`.
pub fn compile_fixture(
	path: &Path,
	content: &str,
	settings: &FixtureSettings,
) -> MockweaveResult<String> {
	match settings.input {
		InputKind::Sql => Ok(content.to_string()),
		InputKind::Csv => {
			compile_tabular(
				path,
				content,
				&settings.csv,
				Registry::for_dialect(settings.dialect),
			)
		}
	}
}

/// Compile delimited text whose first record is an annotated header.
///
/// Stops at the first problem: an unparseable header cell, a row whose width
/// differs from the header, or a cell its codec rejects. Line numbers in
/// errors are physical lines of `content`, starting at 1.
pub fn compile_tabular(
	path: &Path,
	content: &str,
	csv: &CsvOptions,
	registry: &Registry,
) -> MockweaveResult<String> {
	let content = trim_leading_space(content, csv);
	let mut reader = ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.delimiter(csv.delimiter)
		.comment(Some(csv.comment))
		.from_reader(content.as_bytes());
	let mut records = reader.records();

	let Some(header) = records.next().transpose()? else {
		return Err(MockweaveError::EmptyFixture(path.to_path_buf()));
	};

	let codecs = header
		.iter()
		.map(|cell| registry.parse_header(cell))
		.collect::<Result<Vec<ColumnCodec>, _>>()?;

	let mut selects = Vec::new();

	for (index, record) in records.enumerate() {
		let record = record?;
		let line = record
			.position()
			.map_or(index + 2, |position| record_line(&content, position, csv.comment));

		if record.len() != codecs.len() {
			return Err(MockweaveError::FieldCount {
				line,
				expected: codecs.len(),
				got: record.len(),
			});
		}

		let mut columns = Vec::with_capacity(codecs.len());
		for (codec, raw) in codecs.iter().zip(record.iter()) {
			let literal = codec.write(raw).map_err(|source| {
				MockweaveError::Value {
					value: raw.to_string(),
					column: codec.name().to_string(),
					line,
					source,
				}
			})?;
			columns.push(literal);
		}

		selects.push(format!("SELECT {}", columns.join(", ")));
	}

	tracing::debug!(
		path = %path.display(),
		columns = codecs.len(),
		rows = selects.len(),
		"compiled tabular fixture"
	);

	Ok(selects.join(ROW_SEPARATOR))
}

/// Drop blanks that open a field outside quotes, so `1, "a,b"` keeps its
/// quoted field whole and quoted blanks survive. Blanks in front of the
/// comment byte are kept so that line still reads as data.
fn trim_leading_space<'a>(content: &'a str, csv: &CsvOptions) -> Cow<'a, str> {
	if !csv.trim_leading_space {
		return Cow::Borrowed(content);
	}

	let delimiter = char::from(csv.delimiter);
	let comment = char::from(csv.comment);
	let mut trimmed = String::with_capacity(content.len());
	let mut pending = String::new();
	let mut quoted = false;
	let mut commented = false;
	let mut line_start = true;
	let mut after_delimiter = false;

	for ch in content.chars() {
		if commented {
			trimmed.push(ch);
			commented = ch != '\n';
			line_start = !commented;
			continue;
		}

		let blank = ch != delimiter && matches!(ch, ' ' | '\t');
		if blank && !quoted && (line_start || after_delimiter) {
			if line_start {
				pending.push(ch);
			}
			continue;
		}

		let at_comment = line_start && !quoted && ch == comment;
		after_delimiter = false;
		if at_comment && pending.is_empty() {
			commented = true;
		} else if ch == '"' {
			quoted = !quoted;
		} else if ch == delimiter && !quoted {
			after_delimiter = true;
		}

		if at_comment {
			trimmed.push_str(&pending);
		}
		pending.clear();
		line_start = ch == '\n';
		trimmed.push(ch);
	}

	Cow::Owned(trimmed)
}

/// The reader positions a record where it resumed reading, which is before
/// any blank or comment lines it skipped on the way.
fn record_line(content: &str, position: &Position, comment: u8) -> usize {
	let mut line = position.line() as usize;
	let start = usize::try_from(position.byte()).unwrap_or(content.len());
	let mut rest = content.as_bytes().get(start..).unwrap_or_default();

	loop {
		let skipped = match rest.first() {
			Some(b'\n' | b'\r') => 1,
			Some(&byte) if byte == comment => {
				rest.iter()
					.position(|&byte| byte == b'\n')
					.map_or(rest.len(), |end| end + 1)
			}
			_ => break,
		};
		line += rest[..skipped].iter().filter(|&&byte| byte == b'\n').count();
		rest = &rest[skipped..];
	}

	line
}
