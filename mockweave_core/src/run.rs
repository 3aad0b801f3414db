use std::path::Path;
use std::path::PathBuf;

use parking_lot::Mutex;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::DEFAULT_WORKERS;
use crate::FixtureSettings;
use crate::MergeOutcome;
use crate::MockweaveError;
use crate::MockweaveResult;
use crate::SourceCache;
use crate::TemplateFile;
use crate::build_case_filter;
use crate::discover_templates;
use crate::generate_template;
use crate::scan_template;

/// Everything needed to turn a template directory into generated tests.
#[derive(Debug, Clone)]
pub struct RunOptions {
	pub template_root: PathBuf,
	pub output_root: PathBuf,
	/// Fixture settings used wherever no directory override applies.
	pub settings: FixtureSettings,
	/// Threads scanning templates.
	pub scanners: usize,
	/// Threads compiling fixtures.
	pub resolvers: usize,
	/// Threads writing generated tests.
	pub mergers: usize,
	/// Glob patterns restricting which templates run. Empty selects all.
	pub cases: Vec<String>,
}

impl RunOptions {
	pub fn new(
		template_root: impl Into<PathBuf>,
		output_root: impl Into<PathBuf>,
		settings: FixtureSettings,
	) -> Self {
		Self {
			template_root: template_root.into(),
			output_root: output_root.into(),
			settings,
			scanners: DEFAULT_WORKERS,
			resolvers: DEFAULT_WORKERS,
			mergers: DEFAULT_WORKERS,
			cases: Vec::new(),
		}
	}

	/// Use `workers` threads for every stage.
	#[must_use]
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.scanners = workers;
		self.resolvers = workers;
		self.mergers = workers;
		self
	}
}

/// A template that could not be scanned or generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFailure {
	pub template: PathBuf,
	pub message: String,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
	/// Number of templates selected for the run.
	pub templates: usize,
	/// Outputs written by this run.
	pub generated: Vec<PathBuf>,
	/// Outputs left untouched because nothing changed.
	pub up_to_date: Vec<PathBuf>,
	pub failed: Vec<TemplateFailure>,
	/// Distinct fixtures compiled.
	pub fixtures_compiled: usize,
	/// Fixture requests answered from the cache.
	pub cache_hits: usize,
}

impl RunReport {
	/// Returns `true` when every template was processed.
	pub fn is_ok(&self) -> bool {
		self.failed.is_empty()
	}
}

/// State shared by the stages of one run.
#[derive(Debug)]
pub struct RunContext {
	options: RunOptions,
	cache: SourceCache,
	templates: Mutex<Vec<TemplateFile>>,
	failures: Mutex<Vec<TemplateFailure>>,
}

impl RunContext {
	pub fn new(options: RunOptions) -> Self {
		let cache = SourceCache::new(options.settings);

		Self {
			options,
			cache,
			templates: Mutex::new(Vec::new()),
			failures: Mutex::new(Vec::new()),
		}
	}

	pub fn options(&self) -> &RunOptions {
		&self.options
	}

	pub fn cache(&self) -> &SourceCache {
		&self.cache
	}

	/// Scanned templates, sorted by path once scanning has finished.
	pub fn templates(&self) -> Vec<TemplateFile> {
		self.templates.lock().clone()
	}

	pub fn failures(&self) -> Vec<TemplateFailure> {
		self.failures.lock().clone()
	}

	/// Scan every template in `paths`. Returns once all of them are scanned.
	pub fn scan(&self, paths: &[PathBuf]) -> MockweaveResult<()> {
		let pool = build_pool("scan", self.options.scanners)?;
		let root = &self.options.template_root;

		pool.install(|| {
			paths.par_iter().for_each(|path| {
				match scan_template(root, path) {
					Ok(template) => self.templates.lock().push(template),
					Err(error) => self.record_failure(path, &error),
				}
			});
		});

		self.templates.lock().sort_by(|a, b| a.path.cmp(&b.path));

		Ok(())
	}

	/// Compile every referenced fixture. Returns once all of them are in the
	/// cache.
	pub fn resolve(&self) -> MockweaveResult<()> {
		let pool = build_pool("resolve", self.options.resolvers)?;
		let sources: Vec<PathBuf> = self
			.templates
			.lock()
			.iter()
			.flat_map(|template| template.references.iter())
			.map(|reference| reference.source.clone())
			.collect();

		pool.install(|| {
			sources.par_iter().for_each(|source| {
				self.cache.resolve(source);
			});
		});

		tracing::debug!(
			references = sources.len(),
			compiled = self.cache.compiled(),
			"resolved fixtures"
		);

		Ok(())
	}

	/// Write the generated test of every stale template.
	pub fn merge(&self) -> MockweaveResult<Vec<MergeOutcome>> {
		let pool = build_pool("merge", self.options.mergers)?;
		let output_root = &self.options.output_root;
		let guard = self.templates.lock();
		let templates: &[TemplateFile] = &guard;

		let outcomes = pool.install(|| {
			templates
				.par_iter()
				.filter_map(|template| {
					match generate_template(template, output_root, &self.cache) {
						Ok(outcome) => Some(outcome),
						Err(error) => {
							self.record_failure(&template.path, &error);
							None
						}
					}
				})
				.collect()
		});

		Ok(outcomes)
	}

	/// Run all three stages over `paths` and summarize the result.
	pub fn execute(&self, paths: &[PathBuf]) -> MockweaveResult<RunReport> {
		self.scan(paths)?;
		self.resolve()?;
		let outcomes = self.merge()?;

		let mut report = RunReport {
			templates: paths.len(),
			fixtures_compiled: self.cache.compiled(),
			cache_hits: self.cache.hits(),
			..RunReport::default()
		};

		for outcome in outcomes {
			match outcome {
				MergeOutcome::Generated { output, .. } => report.generated.push(output),
				MergeOutcome::UpToDate { output } => report.up_to_date.push(output),
			}
		}

		report.generated.sort();
		report.up_to_date.sort();
		report.failed = self.failures();
		report.failed.sort_by(|a, b| a.template.cmp(&b.template));

		tracing::info!(
			templates = report.templates,
			generated = report.generated.len(),
			up_to_date = report.up_to_date.len(),
			failed = report.failed.len(),
			fixtures = report.fixtures_compiled,
			"finished generating tests"
		);

		Ok(report)
	}

	fn record_failure(&self, template: &Path, error: &MockweaveError) {
		tracing::error!(template = %template.display(), %error, "template failed");
		self.failures.lock().push(TemplateFailure {
			template: template.to_path_buf(),
			message: error.to_string(),
		});
	}
}

/// Discover the templates selected by `options` and generate their tests.
pub fn run(mut options: RunOptions) -> MockweaveResult<RunReport> {
	let filter = build_case_filter(&options.cases)?;
	options.template_root = std::path::absolute(&options.template_root)?;
	let paths = discover_templates(&options.template_root, filter.as_ref())?;

	RunContext::new(options).execute(&paths)
}

fn build_pool(stage: &'static str, threads: usize) -> MockweaveResult<ThreadPool> {
	let pool = ThreadPoolBuilder::new()
		.num_threads(threads.max(1))
		.thread_name(move |index| format!("mockweave-{stage}-{index}"))
		.build()?;

	Ok(pool)
}
