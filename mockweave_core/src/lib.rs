//! `mockweave_core` turns typed fixture files into SQL literals and splices
//! them into dbt unit-test templates.
//!
//! ## Processing Pipeline
//!
//! ```text
//! test-templates/**/test_*.sql
//!   → Scanner (finds `source_file` references inside mock/expect macro calls)
//!   → Resolver (compiles each referenced fixture once into a shared cache)
//!   → Compiler (header signatures → column codecs → `SELECT ... UNION ALL` rows)
//!   → Merge (writes the template with fixture SQL inserted before each call's close)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `mockweave.toml` loading and per-directory fixture overrides.
//! - [`registry`]: Dialect type tables mapping header signatures to codecs.
//! - [`compiler`]: Delimited fixture compilation.
//! - [`run`](mod@run): Parallel scan, resolve and merge stages.
//!
//! ## Fixture Headers
//!
//! Every header cell is a column name with an optional type annotation. Quote
//! cells whose annotation contains the delimiter:
//!
//! ```text
//! "Id[number(10,0)]",Name,Created[timestamp(yyyy-MM-dd HH:mm:ss)]
//! 1,alice,2024-01-02 03:04:05
//! ```
//!
//! compiles (for Snowflake) to
//!
//! ```sql
//! SELECT 1::NUMBER(10,0) AS ID, 'alice'::VARCHAR(16777216) AS NAME, '2024-01-02 03:04:05'::TIMESTAMP(9) AS CREATED
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mockweave_core::Dialect;
//! use mockweave_core::FixtureSettings;
//! use mockweave_core::RunOptions;
//! use mockweave_core::run;
//!
//! let options = RunOptions::new(
//! 	"test-templates",
//! 	"tests/unit",
//! 	FixtureSettings::new(Dialect::Snowflake),
//! );
//! let report = run(options).unwrap();
//! if !report.is_ok() {
//! 	eprintln!("{} template(s) failed", report.failed.len());
//! }
//! ```

pub use codec::*;
pub use compiler::*;
pub use config::*;
pub use error::*;
pub use merge::*;
pub use project::*;
pub use registry::*;
pub use resolver::*;
pub use run::*;
pub use scanner::*;
pub use signature::*;
pub use temporal::*;

mod codec;
pub mod compiler;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod merge;
pub mod project;
pub mod registry;
mod resolver;
pub mod run;
mod scanner;
mod signature;
mod temporal;

#[cfg(test)]
mod __fixtures;
