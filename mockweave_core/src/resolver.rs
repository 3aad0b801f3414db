use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use parking_lot::Mutex;

use crate::FixtureSettings;
use crate::MockweaveError;
use crate::compile_fixture;

/// Seconds since the epoch of `9999-12-31T23:59:00Z`.
const FAR_FUTURE_SECS: u64 = 253_402_300_740;

/// Modification time given to fixtures that could not be found. Nothing is
/// ever newer, so templates referencing a missing fixture are regenerated on
/// every run until it is fixed.
pub fn missing_source_modified() -> SystemTime {
	UNIX_EPOCH + Duration::from_secs(FAR_FUTURE_SECS)
}

/// The result of compiling one fixture. `content` holds either the generated
/// SQL or the error message describing why compilation failed; both are
/// spliced into templates the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSource {
	pub path: PathBuf,
	pub modified: SystemTime,
	pub content: String,
}

type Slot = Arc<OnceLock<Arc<CompiledSource>>>;

/// Compiled fixtures of one run keyed by their case-insensitive path.
///
/// Each distinct path is compiled at most once, even when many resolvers ask
/// for it at the same time: the first caller compiles while the rest wait on
/// the same slot.
#[derive(Debug)]
pub struct SourceCache {
	settings: FixtureSettings,
	slots: Mutex<HashMap<String, Slot>>,
	compiled: AtomicUsize,
	hits: AtomicUsize,
}

impl SourceCache {
	/// `settings` apply to every fixture whose directory has no override.
	pub fn new(settings: FixtureSettings) -> Self {
		Self {
			settings,
			slots: Mutex::new(HashMap::new()),
			compiled: AtomicUsize::new(0),
			hits: AtomicUsize::new(0),
		}
	}

	/// Return the compiled fixture at `path`, compiling it on first request.
	pub fn resolve(&self, path: &Path) -> Arc<CompiledSource> {
		let slot = {
			let mut slots = self.slots.lock();
			let key = cache_key(path);
			if let Some(slot) = slots.get(&key) {
				self.hits.fetch_add(1, Ordering::Relaxed);
				Arc::clone(slot)
			} else {
				let slot = Slot::default();
				slots.insert(key, Arc::clone(&slot));
				slot
			}
		};

		Arc::clone(slot.get_or_init(|| {
			self.compiled.fetch_add(1, Ordering::Relaxed);
			Arc::new(compile_source(path, &self.settings))
		}))
	}

	/// The compiled fixture at `path` if it has already been resolved.
	pub fn get(&self, path: &Path) -> Option<Arc<CompiledSource>> {
		let slot = self.slots.lock().get(&cache_key(path)).cloned()?;
		slot.get().cloned()
	}

	/// Number of fixtures compiled so far.
	pub fn compiled(&self) -> usize {
		self.compiled.load(Ordering::Relaxed)
	}

	/// Number of requests answered from an existing entry.
	pub fn hits(&self) -> usize {
		self.hits.load(Ordering::Relaxed)
	}

	pub fn len(&self) -> usize {
		self.slots.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.lock().is_empty()
	}
}

/// Paths are compared case-insensitively.
pub fn cache_key(path: &Path) -> String {
	path.to_string_lossy().to_lowercase()
}

/// Read and compile the fixture at `path`, turning every failure into the
/// returned content.
pub fn compile_source(path: &Path, settings: &FixtureSettings) -> CompiledSource {
	let metadata = match std::fs::metadata(path) {
		Ok(metadata) if metadata.is_file() => metadata,
		_ => {
			tracing::error!(path = %path.display(), "fixture not found");
			return CompiledSource {
				path: path.to_path_buf(),
				modified: missing_source_modified(),
				content: MockweaveError::SourceNotFound(path.to_path_buf()).to_string(),
			};
		}
	};
	let modified = metadata.modified().unwrap_or_else(|_| missing_source_modified());

	let content = match std::fs::read_to_string(path) {
		Ok(content) => content,
		Err(error) => {
			tracing::error!(path = %path.display(), %error, "failed to read fixture");
			return CompiledSource {
				path: path.to_path_buf(),
				modified,
				content: format!("error reading file '{}': {error}", path.display()),
			};
		}
	};

	let settings = match path.parent() {
		Some(dir) => settings.for_directory(dir),
		None => *settings,
	};

	let content = match compile_fixture(path, &content, &settings) {
		Ok(content) => content,
		Err(error) => {
			tracing::error!(path = %path.display(), %error, "failed to compile fixture");
			error.to_string()
		}
	};

	CompiledSource {
		path: path.to_path_buf(),
		modified,
		content,
	}
}
