//! Core data models for citations, bibliography entries and verdicts.

mod bib;
mod citation;
mod verdict;

pub use bib::{BibDatabase, BibEntry};
pub use citation::{Citation, CitationSet, SourceLocation};
pub use verdict::{
    CitationReport, LookupResult, LookupSource, RiskLevel, Verdict, VerdictStatus,
};
