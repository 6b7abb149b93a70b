//! DBLP lookup source.
//!
//! Uses the DBLP publication search API in XML mode.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::time::Duration;

use crate::models::{LookupResult, LookupSource};
use crate::sources::{best_candidate, Candidate, LookupQuery, Source, SourceError};
use crate::utils::HttpClient;

/// DBLP lookup source
///
/// Computer-science bibliography; tried first because its records are
/// curated and its titles are reliable.
#[derive(Debug, Clone)]
pub struct DblpSource {
    client: HttpClient,
    search_url: String,
    timeout: Duration,
}

impl DblpSource {
    pub fn new(client: HttpClient, search_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            search_url: search_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn build_url(&self, query: &LookupQuery) -> String {
        format!(
            "{}?q={}&h={}&format=xml",
            self.search_url,
            urlencoding::encode(&query.title),
            query.max_candidates.min(1000)
        )
    }

    /// Parse a DBLP XML search response into candidates, in ranking order
    pub(crate) fn parse_xml(xml: &str) -> Result<Vec<Candidate>, SourceError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut candidates = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<Candidate> = None;
        let mut record_url: Option<String> = None;
        let mut ee: Option<String> = None;
        let mut doi: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "hit" {
                        current = Some(Candidate::default());
                        record_url = None;
                        ee = None;
                        doi = None;
                    } else if name == "author" && in_info(&path) {
                        if let Some(candidate) = current.as_mut() {
                            candidate.authors.push(String::new());
                        }
                    }
                    path.push(name);
                }
                Event::End(e) => {
                    path.pop();
                    if e.name().as_ref() == b"hit" {
                        if let Some(mut candidate) = current.take() {
                            candidate.title = clean_title(&candidate.title);
                            candidate.authors = candidate
                                .authors
                                .iter()
                                .map(|a| strip_homonym_suffix(a))
                                .filter(|a| !a.is_empty())
                                .collect();
                            candidate.url = doi
                                .take()
                                .map(|d| format!("https://doi.org/{}", d))
                                .or_else(|| record_url.take())
                                .or_else(|| ee.take());
                            candidates.push(candidate);
                        }
                    }
                }
                Event::Text(e) => {
                    let Some(candidate) = current.as_mut() else {
                        continue;
                    };
                    if !in_info(&path) {
                        continue;
                    }
                    let text = e.unescape()?;
                    let leaf = path.last().map(String::as_str).unwrap_or_default();

                    if path.iter().any(|p| p == "title") {
                        if !candidate.title.is_empty() {
                            candidate.title.push(' ');
                        }
                        candidate.title.push_str(&text);
                    } else if leaf == "author" {
                        if let Some(author) = candidate.authors.last_mut() {
                            author.push_str(&text);
                        }
                    } else if leaf == "year" {
                        candidate.year = Some(text.to_string());
                    } else if leaf == "doi" {
                        doi = Some(text.to_string());
                    } else if leaf == "url" {
                        record_url = Some(text.to_string());
                    } else if leaf == "ee" && ee.is_none() {
                        ee = Some(text.to_string());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(candidates)
    }
}

#[async_trait]
impl Source for DblpSource {
    fn id(&self) -> &str {
        "dblp"
    }

    fn name(&self) -> &str {
        "DBLP"
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<LookupResult>, SourceError> {
        let url = self.build_url(query);
        tracing::debug!("DBLP query: {}", url);

        let request = self
            .client
            .get(&url)
            .header("Accept", "application/xml")
            .timeout(self.timeout);
        let response = self.client.send(request).await?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!("DBLP API returned status: {}", status)));
        }

        let xml = response.text().await?;
        let candidates = Self::parse_xml(&xml)?;
        tracing::debug!("DBLP returned {} candidates", candidates.len());

        Ok(best_candidate(query, candidates, LookupSource::Dblp))
    }
}

// ========== Helper Functions ==========

/// Whether the parser is inside a hit's `<info>` record
fn in_info(path: &[String]) -> bool {
    path.iter().any(|p| p == "info")
}

/// DBLP titles end with a period that is not part of the title
fn clean_title(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    title.strip_suffix('.').unwrap_or(&title).trim().to_string()
}

/// Remove DBLP's homonym disambiguation suffix, e.g. `Wei Wang 0001`
fn strip_homonym_suffix(name: &str) -> String {
    let name = name.trim();
    match name.rsplit_once(' ') {
        Some((rest, suffix)) if suffix.len() == 4 && suffix.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim().to_string()
        }
        _ => name.to_string(),
    }
}
