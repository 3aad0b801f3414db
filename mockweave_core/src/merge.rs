use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::END_CALL;
use crate::MockweaveError;
use crate::MockweaveResult;
use crate::SourceCache;
use crate::TemplateFile;

/// Written at the top of every generated test.
pub const GENERATED_HEADER: &str = "/*###########################################\n### Do NOT modify: generated by \
                                    mockweave ###\n###########################################*/\n";

/// Why a generated test is (or is not) rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
	/// The output does not exist yet.
	Missing,
	/// A referenced fixture is newer than both the template and the output.
	SourceChanged,
	/// The template is newer than the output.
	TemplateChanged,
	/// Nothing changed since the output was generated.
	Fresh,
}

impl Staleness {
	pub fn needs_regeneration(self) -> bool {
		!matches!(self, Self::Fresh)
	}
}

/// Result of merging one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
	Generated { output: PathBuf, reason: Staleness },
	UpToDate { output: PathBuf },
}

/// Most recent modification time among the fixtures `template` references.
pub fn latest_source_modified(template: &TemplateFile, cache: &SourceCache) -> Option<SystemTime> {
	template
		.references
		.iter()
		.filter_map(|reference| cache.get(&reference.source))
		.map(|source| source.modified)
		.max()
}

/// Decide whether the output of `template` must be regenerated. Only
/// modification times are compared.
pub fn staleness(
	template: &TemplateFile,
	output: &Path,
	sources_modified: Option<SystemTime>,
) -> Staleness {
	let Ok(output_modified) = std::fs::metadata(output).and_then(|metadata| metadata.modified())
	else {
		return Staleness::Missing;
	};

	if sources_modified
		.is_some_and(|modified| modified > template.modified && modified > output_modified)
	{
		return Staleness::SourceChanged;
	}

	if template.modified > output_modified {
		Staleness::TemplateChanged
	} else {
		Staleness::Fresh
	}
}

/// Splice compiled fixture content into the template text `content`.
///
/// Every line is copied as is, with its original line ending. On the line
/// where a reference closes, the fixture content goes in front of the line
/// for block references, or between the call and its `{% endcall %}` for
/// references written on a single line.
pub fn render_template(
	template: &TemplateFile,
	content: &str,
	cache: &SourceCache,
) -> MockweaveResult<String> {
	let mut output = String::with_capacity(GENERATED_HEADER.len() + content.len());
	output.push_str(GENERATED_HEADER);

	for (index, line) in content.split_inclusive('\n').enumerate() {
		let line_number = index + 1;
		let Some(reference) = template
			.references
			.iter()
			.find(|reference| reference.call_end == Some(line_number))
		else {
			output.push_str(line);
			continue;
		};

		let Some(source) = cache.get(&reference.source) else {
			return Err(merge_error(
				&template.path,
				format!("fixture `{}` was never resolved", reference.source.display()),
			));
		};

		if reference.wrapped {
			let Some(close) = END_CALL.find(line) else {
				return Err(merge_error(
					&template.path,
					format!("line {line_number} has no `{{% endcall %}}` to insert before"),
				));
			};
			let (before, after) = line.split_at(close.start());
			output.push_str(before);
			output.push('\n');
			push_block(&mut output, &source.content);
			output.push_str(leading_whitespace(before));
			output.push_str(after);
		} else {
			push_block(&mut output, &source.content);
			output.push_str(line);
		}

		tracing::debug!(
			template = %template.path.display(),
			source = %reference.source.display(),
			line = line_number,
			wrapped = reference.wrapped,
			"inserted fixture"
		);
	}

	Ok(output)
}

/// Regenerate the output of `template` under `output_root` when it is stale.
pub fn generate_template(
	template: &TemplateFile,
	output_root: &Path,
	cache: &SourceCache,
) -> MockweaveResult<MergeOutcome> {
	let output = output_root.join(&template.relative_path);
	let reason = staleness(template, &output, latest_source_modified(template, cache));

	if !reason.needs_regeneration() {
		tracing::debug!(output = %output.display(), "generated test is up to date");
		return Ok(MergeOutcome::UpToDate { output });
	}

	let content = std::fs::read_to_string(&template.path)
		.map_err(|e| merge_error(&template.path, e.to_string()))?;
	let rendered = render_template(template, &content, cache)?;

	if let Some(parent) = output.parent() {
		std::fs::create_dir_all(parent).map_err(|e| merge_error(&output, e.to_string()))?;
	}
	std::fs::write(&output, rendered).map_err(|e| merge_error(&output, e.to_string()))?;

	tracing::debug!(output = %output.display(), ?reason, "generated test");

	Ok(MergeOutcome::Generated { output, reason })
}

fn push_block(output: &mut String, content: &str) {
	output.push_str(content);
	if !content.ends_with('\n') {
		output.push('\n');
	}
}

fn leading_whitespace(line: &str) -> &str {
	&line[..line.len() - line.trim_start().len()]
}

fn merge_error(path: &Path, reason: String) -> MockweaveError {
	MockweaveError::Merge {
		path: path.to_path_buf(),
		reason,
	}
}
