use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Macro calls that may reference a fixture.
static OPEN_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"dbt_unit_testing\.mock_ref|dbt_unit_testing\.mock_source|dbt_unit_testing\.expect",
	)
	.expect("valid open call pattern")
});

/// `{% endcall %}` with any inner whitespace.
pub static END_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{%\s*endcall\s*%\}").expect("valid end call pattern")
});

static SOURCE_FILE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"['"]source_file['"]\s*:\s*['"]([^'"]*)['"]"#)
		.expect("valid source file pattern")
});

static INPUT_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"['"]input_format['"]\s*:\s*['"]([^'"]*)['"]"#)
		.expect("valid input format pattern")
});

/// Suffix that completes a (possibly multi-line) macro statement.
pub const CLOSING_TAG_SUFFIX: &str = "%}";

/// Token that ends an inline mock block the same way `{% endcall %}` does.
pub const BLOCK_SEPARATOR: &str = "UNION ALL";

/// A point in a template where a fixture's compiled content is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReference {
	/// Template containing the macro call.
	pub template: PathBuf,
	/// Absolute path of the referenced fixture.
	pub source: PathBuf,
	/// 1-based line on which the macro statement completes.
	pub call_start: usize,
	/// 1-based line before which the content is inserted. `None` when the
	/// template ended before the call was closed.
	pub call_end: Option<usize>,
	/// The call and its `{% endcall %}` share one line.
	pub wrapped: bool,
}

/// Locate every fixture reference in a template's text.
///
/// A macro statement that does not end with `%}` on its first line absorbs the
/// following physical lines until it does; line numbers keep counting physical
/// lines. References close in last-opened-first-closed order on
/// `{% endcall %}` or `UNION ALL`.
pub fn scan_references(template: &Path, content: &str) -> Vec<TemplateReference> {
	let template_dir = template.parent().unwrap_or(Path::new(""));
	let mut references: Vec<TemplateReference> = Vec::new();
	let mut open: Vec<usize> = Vec::new();
	let mut lines = content.lines();
	let mut line_number = 0;

	while let Some(line) = lines.next() {
		line_number += 1;

		if OPEN_CALL.is_match(line) {
			let mut statement = line.to_string();
			let mut complete = true;
			while !statement.trim().ends_with(CLOSING_TAG_SUFFIX) {
				let Some(next) = lines.next() else {
					complete = false;
					break;
				};
				statement.push_str(next);
				line_number += 1;
			}

			if !complete {
				tracing::warn!(
					template = %template.display(),
					line = line_number,
					"macro statement is never completed"
				);
				break;
			}

			if let Some(format) = capture(&INPUT_FORMAT, &statement) {
				if format != "sql" {
					tracing::warn!(
						template = %template.display(),
						line = line_number,
						input_format = format,
						"only the sql input format is supported for generated mocks"
					);
				}
			}

			let Some(source) = capture(&SOURCE_FILE, &statement) else {
				continue;
			};
			let source = resolve_source(template_dir, source);
			tracing::debug!(
				template = %template.display(),
				source = %source.display(),
				line = line_number,
				"found fixture reference"
			);

			let wrapped = END_CALL.is_match(&statement);
			if !wrapped {
				open.push(references.len());
			}

			references.push(TemplateReference {
				template: template.to_path_buf(),
				source,
				call_start: line_number,
				call_end: wrapped.then_some(line_number),
				wrapped,
			});
		} else if END_CALL.is_match(line) || line.contains(BLOCK_SEPARATOR) {
			if let Some(index) = open.pop() {
				references[index].call_end = Some(line_number);
			}
		}
	}

	for index in open {
		let reference = &references[index];
		tracing::warn!(
			template = %template.display(),
			source = %reference.source.display(),
			line = reference.call_start,
			"fixture reference is never closed and will not be inserted"
		);
	}

	references
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
	pattern
		.captures(text)
		.and_then(|captures| captures.get(1))
		.map(|value| value.as_str())
}

/// Join a relative fixture path onto the template directory and drop `.` and
/// `..` components.
pub fn resolve_source(template_dir: &Path, source: &str) -> PathBuf {
	let source = Path::new(source);
	let joined = if source.is_absolute() {
		source.to_path_buf()
	} else {
		template_dir.join(source)
	};

	clean_path(&joined)
}

/// Lexically normalize a path without touching the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
	let mut cleaned = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !cleaned.pop() {
					cleaned.push(component);
				}
			}
			other => cleaned.push(other),
		}
	}

	cleaned
}
