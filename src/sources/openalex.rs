//! OpenAlex lookup source.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{LookupResult, LookupSource};
use crate::sources::{best_candidate, Candidate, LookupQuery, Source, SourceError};
use crate::utils::HttpClient;

const SELECT_FIELDS: &str = "id,display_name,publication_year,authorships,doi";

/// OpenAlex lookup source
///
/// Uses the OpenAlex REST API. Broader coverage than DBLP, so it serves as
/// the fallback.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
    timeout: Duration,
}

impl OpenAlexSource {
    /// Create a new OpenAlex source
    ///
    /// With an email the requests join the polite pool: the address goes in
    /// the `mailto` parameter and the user agent of `client` should carry it
    /// too (see [`HttpClient::polite_user_agent`]).
    pub fn new(
        client: HttpClient,
        base_url: &str,
        email: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.filter(|e| !e.trim().is_empty()),
            timeout,
        }
    }

    /// Build request URL
    fn build_url(&self, query: &LookupQuery) -> String {
        let url = format!(
            "{}/works?search={}&per-page={}&select={}",
            self.base_url,
            urlencoding::encode(&query.title),
            query.max_candidates.min(200),
            SELECT_FIELDS
        );
        self.add_email_if_present(&url)
    }

    /// Add email to request URL if available (for polite pool)
    fn add_email_if_present(&self, url: &str) -> String {
        if let Some(ref email) = self.email {
            format!("{}&mailto={}", url, urlencoding::encode(email))
        } else {
            url.to_string()
        }
    }

    /// Convert an OpenAlex work into a candidate
    fn parse_work(work: OAWork) -> Candidate {
        let authors = work
            .authorships
            .into_iter()
            .filter_map(|a| a.author.display_name)
            .filter(|name| !name.trim().is_empty())
            .collect();

        Candidate {
            title: work.display_name.unwrap_or_default(),
            authors,
            year: work.publication_year.map(|y| y.to_string()),
            url: work.doi.or(work.id),
        }
    }
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<LookupResult>, SourceError> {
        let url = self.build_url(query);
        tracing::debug!("OpenAlex query: {}", url);

        let request = self.client.get(&url).timeout(self.timeout);
        let response = self.client.send(request).await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "OpenAlex API returned status: {}",
                status
            )));
        }

        let body = response.text().await?;
        let data: WorksResponse = serde_json::from_str(&body)?;
        let candidates: Vec<Candidate> = data.results.into_iter().map(Self::parse_work).collect();
        tracing::debug!("OpenAlex returned {} candidates", candidates.len());

        Ok(best_candidate(query, candidates, LookupSource::OpenAlex))
    }
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<OAWork>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    id: Option<String>,
    display_name: Option<String>,
    publication_year: Option<i32>,
    doi: Option<String>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    #[serde(default)]
    author: OAAuthor,
}

#[derive(Debug, Default, Deserialize)]
struct OAAuthor {
    display_name: Option<String>,
}
