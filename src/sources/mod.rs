//! Bibliographic lookup clients with a common trait-based interface.
//!
//! This module defines the [`Source`] trait that every lookup client
//! implements. The verifier consults sources in order: the first one whose
//! best candidate clears the fallback threshold wins, otherwise the next
//! source is asked.
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `dblp` - Enable DBLP source (default: enabled)
//! - `openalex` - Enable OpenAlex source (default: enabled)
//!
//! # Runtime Configuration
//!
//! Endpoints, timeouts and the OpenAlex contact email come from
//! [`Config`](crate::config::Config). Set `OPENALEX_EMAIL` to join the
//! OpenAlex polite pool:
//!
//! ```bash
//! export OPENALEX_EMAIL="you@example.org"
//! ```

#[cfg(feature = "source-dblp")]
mod dblp;
#[cfg(feature = "source-openalex")]
mod openalex;

pub mod mock;

#[cfg(feature = "source-dblp")]
pub use dblp::DblpSource;
pub use mock::MockSource;
#[cfg(feature = "source-openalex")]
pub use openalex::OpenAlexSource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{LookupResult, LookupSource};
use crate::utils::similarity::{author_similarity, round_score, title_similarity};
use crate::utils::{HttpClient, Pacer};

/// A title query, optionally hinted with the first author
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    /// Title to search for
    pub title: String,

    /// First author as written in the bibliography; breaks ties between
    /// equally similar titles
    pub first_author: Option<String>,

    /// How many candidates to request from the database
    pub max_candidates: usize,
}

impl LookupQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            first_author: None,
            max_candidates: 3,
        }
    }

    /// Set the first-author hint
    pub fn first_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.first_author = if author.trim().is_empty() {
            None
        } else {
            Some(author)
        };
        self
    }

    /// Set the number of candidates to request (at least one)
    pub fn max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max.max(1);
        self
    }
}

/// A raw record returned by a database, before scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub url: Option<String>,
}

/// Score candidates against the query and keep the best one
///
/// Candidates are ranked by title similarity; the author hint only decides
/// between candidates with the same title score. Earlier candidates win
/// full ties, preserving the database's own ranking.
pub fn best_candidate(
    query: &LookupQuery,
    candidates: Vec<Candidate>,
    source: LookupSource,
) -> Option<LookupResult> {
    let mut best: Option<(f64, f64, Candidate)> = None;

    for candidate in candidates {
        if candidate.title.trim().is_empty() {
            continue;
        }
        let title_score = round_score(title_similarity(&query.title, &candidate.title));
        let author_score = match &query.first_author {
            Some(author) => candidate
                .authors
                .iter()
                .map(|a| author_similarity(author, a))
                .fold(0.0, f64::max),
            None => 0.0,
        };

        let better = match &best {
            None => true,
            Some((best_title, best_author, _)) => {
                title_score > *best_title
                    || (title_score == *best_title && author_score > *best_author)
            }
        };
        if better {
            best = Some((title_score, author_score, candidate));
        }
    }

    best.map(|(score, _, candidate)| LookupResult {
        source,
        title: candidate.title,
        authors: candidate.authors,
        year: candidate.year,
        url: candidate.url,
        confidence_score: score,
    })
}

/// The Source trait defines the interface for all lookup clients.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Fetch raw records in `lookup` and rank them with [`best_candidate`]
/// 3. Add the source to [`build_sources`] in the order it should be consulted
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "dblp", "openalex")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Find the best match for the query, or `None` when nothing matches
    async fn lookup(&self, query: &LookupQuery) -> Result<Option<LookupResult>, SourceError>;
}

/// Build the configured sources in consultation order (DBLP, then OpenAlex)
pub fn build_sources(config: &Config) -> Result<Vec<Arc<dyn Source>>, SourceError> {
    let pacer = Pacer::new(config.request_delay());
    #[allow(unused_mut)]
    let mut sources: Vec<Arc<dyn Source>> = Vec::new();

    #[cfg(feature = "source-dblp")]
    {
        let http = HttpClient::with_user_agent(
            &HttpClient::default_user_agent(),
            config.connect_timeout(),
            pacer.clone(),
        )?;
        sources.push(Arc::new(DblpSource::new(
            http,
            &config.sources.dblp_url,
            config.dblp_timeout(),
        )));
    }

    #[cfg(feature = "source-openalex")]
    {
        let email = config.sources.openalex_email.clone();
        let user_agent = match &email {
            Some(email) => HttpClient::polite_user_agent(email),
            None => HttpClient::default_user_agent(),
        };
        let http = HttpClient::with_user_agent(&user_agent, config.connect_timeout(), pacer.clone())?;
        sources.push(Arc::new(OpenAlexSource::new(
            http,
            &config.sources.openalex_url,
            email,
            config.openalex_timeout(),
        )));
    }

    if sources.is_empty() {
        tracing::warn!("No lookup sources compiled in; every declared key will be reported as not found");
    }

    Ok(sources)
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// API error from the source (non-success status)
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
