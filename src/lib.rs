//! # Citation Checker
//!
//! Verifies that the citations used in a LaTeX document point at real papers.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`extract`]: TeX citation scanning and BibTeX parsing
//! - [`sources`]: Bibliographic lookup clients (DBLP, OpenAlex) behind the [`Source`] trait
//! - [`verify`]: Per-key decision pipeline producing verdicts
//! - [`report`]: JSON report writer and summary counts
//! - [`models`]: Core data structures (Citation, BibEntry, LookupResult, Verdict)
//! - [`utils`]: HTTP client with request pacing, fuzzy string similarity
//! - [`config`]: Configuration management
//! - [`ui`]: Progress bar and console summary

pub mod config;
pub mod extract;
pub mod models;
pub mod report;
pub mod sources;
pub mod ui;
pub mod utils;
pub mod verify;

// Re-export commonly used types
pub use models::{BibEntry, Citation, LookupResult, Verdict, VerdictStatus};
pub use sources::Source;
pub use verify::{Verifier, VerifySettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
