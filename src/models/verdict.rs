//! Lookup results and per-citation verdicts.

use serde::{Deserialize, Serialize};

use super::{BibEntry, SourceLocation};

/// The database a lookup result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupSource {
    #[serde(rename = "DBLP")]
    Dblp,
    #[serde(rename = "OpenAlex")]
    OpenAlex,
}

impl LookupSource {
    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            LookupSource::Dblp => "DBLP",
            LookupSource::OpenAlex => "OpenAlex",
        }
    }

    /// Returns the source identifier
    pub fn id(&self) -> &'static str {
        match self {
            LookupSource::Dblp => "dblp",
            LookupSource::OpenAlex => "openalex",
        }
    }
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Best-matching record returned by a bibliographic database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub source: LookupSource,

    /// Title as returned by the database
    pub title: String,

    /// Authors as returned by the database
    pub authors: Vec<String>,

    pub year: Option<String>,

    /// Record page or DOI link
    pub url: Option<String>,

    /// Title similarity against the query, 0-100
    pub confidence_score: f64,
}

/// Terminal state of the verification pipeline for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerdictStatus {
    #[serde(rename = "Verified")]
    Verified,
    #[serde(rename = "Missing in Bib")]
    MissingInBib,
    #[serde(rename = "Title Mismatch")]
    TitleMismatch,
    #[serde(rename = "Author Mismatch")]
    AuthorMismatch,
    #[serde(rename = "Not Found")]
    NotFound,
}

impl VerdictStatus {
    pub const ALL: [VerdictStatus; 5] = [
        VerdictStatus::Verified,
        VerdictStatus::MissingInBib,
        VerdictStatus::TitleMismatch,
        VerdictStatus::AuthorMismatch,
        VerdictStatus::NotFound,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VerdictStatus::Verified => "Verified",
            VerdictStatus::MissingInBib => "Missing in Bib",
            VerdictStatus::TitleMismatch => "Title Mismatch",
            VerdictStatus::AuthorMismatch => "Author Mismatch",
            VerdictStatus::NotFound => "Not Found",
        }
    }

    /// Whether this status belongs in the issues report
    pub fn is_issue(&self) -> bool {
        !matches!(self, VerdictStatus::Verified)
    }

    /// Risk attached to an issue; missing keys carry none
    pub fn risk_level(&self) -> Option<RiskLevel> {
        match self {
            VerdictStatus::NotFound => Some(RiskLevel::High),
            VerdictStatus::TitleMismatch | VerdictStatus::AuthorMismatch => {
                Some(RiskLevel::Medium)
            }
            VerdictStatus::Verified | VerdictStatus::MissingInBib => None,
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How likely an issue is a hallucinated reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
}

/// Outcome of verifying one citation key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub key: String,
    pub status: VerdictStatus,
    /// Human-readable explanation
    pub detail: String,
}

impl Verdict {
    pub fn new(key: impl Into<String>, status: VerdictStatus, detail: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status,
            detail: detail.into(),
        }
    }
}

/// One record of the full report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    #[serde(flatten)]
    pub verdict: Verdict,

    /// Where the key is cited
    pub locations: Vec<SourceLocation>,

    /// The declaring BibTeX entry, null when missing
    pub bib_metadata: Option<BibEntry>,

    /// The candidate the verdict was judged against, null when none was found
    pub verification_result: Option<LookupResult>,
}

impl CitationReport {
    pub fn key(&self) -> &str {
        &self.verdict.key
    }

    pub fn status(&self) -> VerdictStatus {
        self.verdict.status
    }
}
