//! JSON reports and summary counts.
//!
//! Two files are written on every run:
//!
//! - the full report, one [`CitationReport`] per cited key
//! - the issues report, one [`Issue`] per key that is not `Verified`
//!
//! Both are sorted by key and carry no timestamps, so unchanged inputs
//! produce byte-identical files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::models::{CitationReport, LookupSource, RiskLevel, VerdictStatus};
use crate::utils::similarity::{round_score, title_similarity};

/// One record of the issues report
///
/// Which optional fields are present depends on the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,

    pub status: VerdictStatus,

    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<LookupSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_authors: Option<Vec<String>>,
}

impl Issue {
    /// The issue record for a report, or `None` when it was verified
    pub fn from_report(report: &CitationReport) -> Option<Self> {
        let status = report.status();
        if !status.is_issue() {
            return None;
        }

        let mut issue = Issue {
            key: report.key().to_string(),
            status,
            reason: report.verdict.detail.clone(),
            risk_level: status.risk_level(),
            bib_title: None,
            found_title: None,
            similarity_score: None,
            source: None,
            bib_author: None,
            found_authors: None,
        };

        let entry = report.bib_metadata.as_ref();
        let found = report.verification_result.as_ref();
        match status {
            VerdictStatus::NotFound => {
                issue.bib_title = entry.map(|e| e.title.clone());
            }
            VerdictStatus::TitleMismatch => {
                issue.bib_title = entry.map(|e| e.title.clone());
                issue.found_title = found.map(|f| f.title.clone());
                issue.similarity_score = match (entry, found) {
                    (Some(e), Some(f)) => Some(round_score(title_similarity(&e.title, &f.title))),
                    _ => None,
                };
                issue.source = found.map(|f| f.source);
            }
            VerdictStatus::AuthorMismatch => {
                issue.bib_author = entry.map(|e| e.author_field.clone());
                issue.found_authors = found.map(|f| f.authors.clone());
                issue.source = found.map(|f| f.source);
            }
            VerdictStatus::MissingInBib | VerdictStatus::Verified => {}
        }

        Some(issue)
    }
}

/// Verdict counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub verified: usize,
    pub missing_in_bib: usize,
    pub title_mismatch: usize,
    pub author_mismatch: usize,
    pub not_found: usize,
}

impl ReportSummary {
    pub fn from_reports(reports: &[CitationReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.total += 1;
            match report.status() {
                VerdictStatus::Verified => summary.verified += 1,
                VerdictStatus::MissingInBib => summary.missing_in_bib += 1,
                VerdictStatus::TitleMismatch => summary.title_mismatch += 1,
                VerdictStatus::AuthorMismatch => summary.author_mismatch += 1,
                VerdictStatus::NotFound => summary.not_found += 1,
            }
        }
        summary
    }

    pub fn count(&self, status: VerdictStatus) -> usize {
        match status {
            VerdictStatus::Verified => self.verified,
            VerdictStatus::MissingInBib => self.missing_in_bib,
            VerdictStatus::TitleMismatch => self.title_mismatch,
            VerdictStatus::AuthorMismatch => self.author_mismatch,
            VerdictStatus::NotFound => self.not_found,
        }
    }

    /// Number of keys in the issues report
    pub fn issues(&self) -> usize {
        self.total - self.verified
    }
}

/// Where a run's reports were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub all_citations: PathBuf,
    pub issues: PathBuf,
}

/// Writes the full and issues-only reports into one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    directory: PathBuf,
    all_citations_file: String,
    issues_file: String,
}

impl ReportWriter {
    /// Writer using the default file names
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::from_config(&OutputConfig {
            directory: directory.into(),
            ..OutputConfig::default()
        })
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            directory: output.directory.clone(),
            all_citations_file: output.all_citations_file.clone(),
            issues_file: output.issues_file.clone(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write both reports, creating the directory when missing
    pub fn write(&self, reports: &[CitationReport]) -> Result<ReportPaths, ReportError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| ReportError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut sorted: Vec<&CitationReport> = reports.iter().collect();
        sorted.sort_by(|a, b| a.key().cmp(b.key()));
        let issues: Vec<Issue> = sorted.iter().filter_map(|r| Issue::from_report(r)).collect();

        let paths = ReportPaths {
            all_citations: self.directory.join(&self.all_citations_file),
            issues: self.directory.join(&self.issues_file),
        };
        write_json(&paths.all_citations, &sorted)?;
        write_json(&paths.issues, &issues)?;

        tracing::info!(
            "Wrote {} citations to {} and {} issues to {}",
            sorted.len(),
            paths.all_citations.display(),
            issues.len(),
            paths.issues.display()
        );
        Ok(paths)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    std::fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Report writing errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
