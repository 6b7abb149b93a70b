//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{LookupResult, LookupSource};
use crate::sources::{best_candidate, Candidate, LookupQuery, Source, SourceError};

/// Canned answer of a [`MockSource`]
#[derive(Debug, Clone)]
enum MockResponse {
    Candidates(Vec<Candidate>),
    NetworkError(String),
}

/// A mock source for testing that returns predefined responses.
#[derive(Debug)]
pub struct MockSource {
    kind: LookupSource,
    response: Mutex<MockResponse>,
    calls: AtomicUsize,
    queries: Mutex<Vec<LookupQuery>>,
}

impl MockSource {
    /// Create a new mock source reporting results as `kind`, with no records.
    pub fn new(kind: LookupSource) -> Self {
        Self {
            kind,
            response: Mutex::new(MockResponse::Candidates(Vec::new())),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Serve these records for every lookup.
    pub fn with_candidates(self, candidates: Vec<Candidate>) -> Self {
        *self.response.lock().unwrap() = MockResponse::Candidates(candidates);
        self
    }

    /// Fail every lookup with a network error.
    pub fn failing(self, message: &str) -> Self {
        *self.response.lock().unwrap() = MockResponse::NetworkError(message.to_string());
        self
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<LookupQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<LookupResult>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let response = self.response.lock().unwrap().clone();
        match response {
            MockResponse::Candidates(candidates) => Ok(best_candidate(query, candidates, self.kind)),
            MockResponse::NetworkError(message) => Err(SourceError::Network(message)),
        }
    }
}

/// Helper function to create a mock record for testing.
pub fn make_candidate(title: &str, authors: &[&str]) -> Candidate {
    Candidate {
        title: title.to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        year: None,
        url: Some(format!(
            "http://example.com/{}",
            title.to_lowercase().replace(' ', "-")
        )),
    }
}
