use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;

use crate::MockweaveError;
use crate::MockweaveResult;
use crate::TemplateReference;
use crate::scan_references;

/// File name prefix of a test template, compared case-insensitively.
pub const TEMPLATE_PREFIX: &str = "test_";

/// File extension of a test template, compared case-insensitively.
pub const TEMPLATE_SUFFIX: &str = ".sql";

/// A scanned test template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
	pub path: PathBuf,
	/// Path relative to the template root; the generated test is written to
	/// the same relative path under the output root.
	pub relative_path: PathBuf,
	pub modified: SystemTime,
	pub references: Vec<TemplateReference>,
}

/// Check if a file name follows the `test_*.sql` template convention.
pub fn is_template_file(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.map(str::to_ascii_lowercase)
		.is_some_and(|name| name.starts_with(TEMPLATE_PREFIX) && name.ends_with(TEMPLATE_SUFFIX))
}

/// Build a matcher for `--case` patterns. Returns `None` when no pattern is
/// given, meaning every template is selected.
pub fn build_case_filter(patterns: &[String]) -> MockweaveResult<Option<GlobSet>> {
	if patterns.is_empty() {
		return Ok(None);
	}

	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			MockweaveError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
		builder.add(glob);
	}

	builder.build().map(Some).map_err(|e| {
		MockweaveError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Collect every template under `root`, sorted by path. With a `filter`, only
/// templates whose relative path or file name matches are kept.
pub fn discover_templates(root: &Path, filter: Option<&GlobSet>) -> MockweaveResult<Vec<PathBuf>> {
	if !root.is_dir() {
		return Err(MockweaveError::MissingTemplateRoot(root.to_path_buf()));
	}

	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(root, &mut files, &mut visited_dirs)?;

	if let Some(filter) = filter {
		files.retain(|path| {
			let relative = path.strip_prefix(root).unwrap_or(path);
			filter.is_match(relative) || path.file_name().is_some_and(|name| filter.is_match(name))
		});
	}

	files.sort();
	tracing::info!(root = %root.display(), count = files.len(), "discovered test templates");

	Ok(files)
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> MockweaveResult<()> {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(MockweaveError::SymlinkCycle(dir.to_path_buf()));
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_dir() {
			let hidden = path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with('.'));
			if !hidden {
				walk_dir(&path, files, visited_dirs)?;
			}
		} else if is_template_file(&path) {
			files.push(path);
		}
	}

	Ok(())
}

/// Read a template and locate its fixture references.
pub fn scan_template(root: &Path, path: &Path) -> MockweaveResult<TemplateFile> {
	let scan_error = |source| {
		MockweaveError::Scan {
			path: path.to_path_buf(),
			source,
		}
	};

	let modified = std::fs::metadata(path)
		.and_then(|metadata| metadata.modified())
		.map_err(scan_error)?;
	let content = std::fs::read_to_string(path).map_err(scan_error)?;
	let references = scan_references(path, &content);

	tracing::debug!(
		template = %path.display(),
		references = references.len(),
		"scanned test template"
	);

	Ok(TemplateFile {
		path: path.to_path_buf(),
		relative_path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
		modified,
		references,
	})
}
