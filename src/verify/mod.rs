//! Per-key verification pipeline.
//!
//! Each cited key goes through the same steps:
//!
//! 1. Missing from the bibliography: `Missing in Bib`, nothing is queried.
//! 2. The declared title is looked up in each source in turn (see
//!    [`Verifier::lookup`]). No candidate: `Not Found`.
//! 3. Title similarity below the threshold: `Title Mismatch`.
//! 4. No candidate author resembling the declared first author:
//!    `Author Mismatch`.
//! 5. Otherwise `Verified`.
//!
//! Source failures never abort a run; they are logged and the key ends up
//! `Not Found`.

use std::sync::Arc;

use crate::models::{
    BibDatabase, BibEntry, Citation, CitationReport, CitationSet, LookupResult, Verdict,
    VerdictStatus,
};
use crate::sources::{LookupQuery, Source, SourceError};
use crate::utils::similarity::{author_similarity, round_score, title_similarity};

/// Thresholds (0-100) and lookup width used by [`Verifier`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifySettings {
    /// Minimum title similarity for `Verified`
    pub title_threshold: f64,

    /// Below this confidence the next source is consulted
    pub fallback_threshold: f64,

    /// A candidate author must score strictly above this
    pub author_threshold: f64,

    /// Records requested per lookup
    pub max_candidates: usize,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            title_threshold: 90.0,
            fallback_threshold: 70.0,
            author_threshold: 80.0,
            max_candidates: 3,
        }
    }
}

/// Answer of the source chain for one query
#[derive(Debug, Default)]
pub struct LookupOutcome {
    /// The accepted candidate, if any
    pub result: Option<LookupResult>,

    /// Failures met on the way, by source name
    pub errors: Vec<(String, SourceError)>,
}

/// Runs the verification pipeline against an ordered list of sources
#[derive(Debug, Clone)]
pub struct Verifier {
    sources: Vec<Arc<dyn Source>>,
    settings: VerifySettings,
}

impl Verifier {
    /// Sources are consulted in the given order
    pub fn new(sources: Vec<Arc<dyn Source>>, settings: VerifySettings) -> Self {
        Self { sources, settings }
    }

    pub fn settings(&self) -> &VerifySettings {
        &self.settings
    }

    /// Query the source chain
    ///
    /// The first candidate at or above the fallback threshold ends the chain.
    /// Otherwise the last source's answer stands, even when it is empty, so a
    /// weak early candidate is dropped once a later source is asked.
    pub async fn lookup(&self, query: &LookupQuery) -> LookupOutcome {
        let mut outcome = LookupOutcome::default();

        for source in &self.sources {
            match source.lookup(query).await {
                Ok(Some(found)) if found.confidence_score >= self.settings.fallback_threshold => {
                    tracing::debug!(
                        "{} matched '{}' with confidence {:.2}",
                        source.name(),
                        query.title,
                        found.confidence_score
                    );
                    outcome.result = Some(found);
                    return outcome;
                }
                Ok(found) => {
                    if let Some(weak) = &found {
                        tracing::debug!(
                            "{} confidence {:.2} for '{}' is below {:.2}",
                            source.name(),
                            weak.confidence_score,
                            query.title,
                            self.settings.fallback_threshold
                        );
                    } else {
                        tracing::debug!("{} has no match for '{}'", source.name(), query.title);
                    }
                    outcome.result = found;
                }
                Err(e) => {
                    tracing::warn!("{} lookup failed for '{}': {}", source.name(), query.title, e);
                    outcome.result = None;
                    outcome.errors.push((source.name().to_string(), e));
                }
            }
        }

        outcome
    }

    /// Verify one cited key against the bibliography
    pub async fn verify(&self, citation: &Citation, bib: &BibDatabase) -> CitationReport {
        let key = citation.key.as_str();
        let entry = citation.raw_bib_entry.as_ref().or_else(|| bib.get(key));

        let Some(entry) = entry else {
            return report(
                citation,
                None,
                None,
                VerdictStatus::MissingInBib,
                "Citation key found in TeX but missing in .bib files".to_string(),
            );
        };

        if entry.title.trim().is_empty() {
            return report(
                citation,
                Some(entry),
                None,
                VerdictStatus::NotFound,
                "Bib entry has no title to look up".to_string(),
            );
        }

        let first = first_author(&entry.author_field);
        let query = LookupQuery::new(entry.title.clone())
            .first_author(first.clone())
            .max_candidates(self.settings.max_candidates);
        let outcome = self.lookup(&query).await;

        let Some(found) = outcome.result else {
            let mut detail = format!("Paper not found in {}", self.source_names());
            if !outcome.errors.is_empty() {
                let errors: Vec<String> = outcome
                    .errors
                    .iter()
                    .map(|(name, e)| format!("{}: {}", name, e))
                    .collect();
                detail.push_str(&format!(" ({})", errors.join("; ")));
            }
            return report(citation, Some(entry), None, VerdictStatus::NotFound, detail);
        };

        let score = round_score(title_similarity(&entry.title, &found.title));
        let (status, detail) = if score < self.settings.title_threshold {
            (
                VerdictStatus::TitleMismatch,
                "Title similarity below threshold".to_string(),
            )
        } else if !author_matches(&first, &found.authors, self.settings.author_threshold) {
            (
                VerdictStatus::AuthorMismatch,
                "First author mismatch".to_string(),
            )
        } else {
            (
                VerdictStatus::Verified,
                format!("Title and first author match {}", found.source),
            )
        };

        report(citation, Some(entry), Some(found), status, detail)
    }

    /// Verify every key in order, one at a time
    ///
    /// `on_progress` receives the 1-based position, the total and the key
    /// before each key is checked.
    pub async fn verify_all<F>(
        &self,
        citations: &CitationSet,
        bib: &BibDatabase,
        mut on_progress: F,
    ) -> Vec<CitationReport>
    where
        F: FnMut(usize, usize, &str),
    {
        let total = citations.len();
        let mut reports = Vec::with_capacity(total);

        for (idx, citation) in citations.iter().enumerate() {
            on_progress(idx + 1, total, &citation.key);
            let report = self.verify(citation, bib).await;
            tracing::debug!("{}: {}", report.key(), report.status());
            reports.push(report);
        }

        reports
    }

    fn source_names(&self) -> String {
        if self.sources.is_empty() {
            return "any source".to_string();
        }
        self.sources
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

fn report(
    citation: &Citation,
    entry: Option<&BibEntry>,
    found: Option<LookupResult>,
    status: VerdictStatus,
    detail: String,
) -> CitationReport {
    CitationReport {
        verdict: Verdict::new(citation.key.clone(), status, detail),
        locations: citation.source_locations.clone(),
        bib_metadata: entry.cloned(),
        verification_result: found,
    }
}

/// First author of a BibTeX `author` field
///
/// Cut at the first comma, then at the first ` and `. Gives the surname for
/// `Last, First` lists and the full name for `First Last` lists.
pub fn first_author(author_field: &str) -> String {
    let head = author_field.split(',').next().unwrap_or_default();
    let head = head.split(" and ").next().unwrap_or_default();
    head.chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether any candidate author resembles the declared first author
fn author_matches(first: &str, candidates: &[String], threshold: f64) -> bool {
    if first.trim().is_empty() {
        return false;
    }
    candidates
        .iter()
        .any(|candidate| author_similarity(first, candidate) > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LookupSource, SourceLocation};
    use crate::sources::mock::{make_candidate, MockSource};

    fn attention_entry() -> BibEntry {
        BibEntry::new("vaswani2017", "inproceedings")
            .title("Attention Is All You Need")
            .authors(
                "Vaswani, Ashish and Shazeer, Noam",
                vec!["Vaswani, Ashish".to_string(), "Shazeer, Noam".to_string()],
            )
            .year("2017")
    }

    fn bib_with(entry: BibEntry) -> BibDatabase {
        let mut bib = BibDatabase::new();
        bib.insert(entry);
        bib
    }

    fn cited(key: &str) -> Citation {
        let mut citation = Citation::new(key);
        citation.source_locations.push(SourceLocation::new("main.tex", 3));
        citation
    }

    fn verifier(sources: Vec<Arc<MockSource>>) -> Verifier {
        let sources = sources
            .into_iter()
            .map(|s| s as Arc<dyn Source>)
            .collect();
        Verifier::new(sources, VerifySettings::default())
    }

    #[tokio::test]
    async fn test_missing_key_skips_lookup() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp));
        let verifier = verifier(vec![dblp.clone()]);

        let report = verifier.verify(&cited("smith2023"), &BibDatabase::new()).await;

        assert_eq!(report.status(), VerdictStatus::MissingInBib);
        assert!(report.bib_metadata.is_none());
        assert!(report.verification_result.is_none());
        assert_eq!(report.locations.len(), 1);
        assert_eq!(dblp.calls(), 0);
    }

    #[tokio::test]
    async fn test_verified_with_first_source() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("Attention is all you need", &["Ashish Vaswani", "Noam Shazeer"]),
        ]));
        let openalex = Arc::new(MockSource::new(LookupSource::OpenAlex));
        let verifier = verifier(vec![dblp.clone(), openalex.clone()]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::Verified);
        let found = report.verification_result.unwrap();
        assert_eq!(found.source, LookupSource::Dblp);
        assert_eq!(dblp.calls(), 1);
        assert_eq!(openalex.calls(), 0);
        assert_eq!(dblp.queries()[0].first_author.as_deref(), Some("Vaswani"));
    }

    #[tokio::test]
    async fn test_close_title_passes_title_check() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("Attention Is Not All You Need", &["Ashish Vaswani"]),
        ]));
        let verifier = verifier(vec![dblp]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::Verified);
        assert_eq!(report.verification_result.unwrap().confidence_score, 92.59);
    }

    #[tokio::test]
    async fn test_title_mismatch() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate(
                "Attention Is All You Need in Speech Separation",
                &["Cem Subakan"],
            ),
        ]));
        let verifier = verifier(vec![dblp]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::TitleMismatch);
        assert!(report.verification_result.is_some());
    }

    #[tokio::test]
    async fn test_author_mismatch() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("Attention Is All You Need", &["Jane Doe", "John Roe"]),
        ]));
        let verifier = verifier(vec![dblp]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::AuthorMismatch);
        assert_eq!(report.verdict.detail, "First author mismatch");
    }

    #[tokio::test]
    async fn test_entry_without_authors_fails_author_check() {
        let entry = BibEntry::new("anon", "misc").title("Attention Is All You Need");
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("Attention Is All You Need", &["Ashish Vaswani"]),
        ]));
        let verifier = verifier(vec![dblp]);

        let report = verifier.verify(&cited("anon"), &bib_with(entry)).await;
        assert_eq!(report.status(), VerdictStatus::AuthorMismatch);
    }

    #[tokio::test]
    async fn test_low_confidence_falls_back() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("A Survey of Graph Databases", &["Someone"]),
        ]));
        let openalex = Arc::new(MockSource::new(LookupSource::OpenAlex).with_candidates(vec![
            make_candidate("Attention Is All You Need", &["A. Vaswani"]),
        ]));
        let verifier = verifier(vec![dblp.clone(), openalex.clone()]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::Verified);
        assert_eq!(
            report.verification_result.unwrap().source,
            LookupSource::OpenAlex
        );
        assert_eq!(dblp.calls(), 1);
        assert_eq!(openalex.calls(), 1);
    }

    #[tokio::test]
    async fn test_weak_candidate_dropped_when_fallback_is_empty() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("A Survey of Graph Databases", &["Someone"]),
        ]));
        let openalex = Arc::new(MockSource::new(LookupSource::OpenAlex));
        let verifier = verifier(vec![dblp, openalex]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::NotFound);
    }

    #[tokio::test]
    async fn test_last_source_weak_candidate_is_judged() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("A Survey of Graph Databases", &["Someone"]),
        ]));
        let verifier = verifier(vec![dblp]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::TitleMismatch);
    }

    #[tokio::test]
    async fn test_network_error_falls_back() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).failing("connection reset"));
        let openalex = Arc::new(MockSource::new(LookupSource::OpenAlex).with_candidates(vec![
            make_candidate("Attention Is All You Need", &["Ashish Vaswani"]),
        ]));
        let verifier = verifier(vec![dblp, openalex.clone()]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::Verified);
        assert_eq!(openalex.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_not_found() {
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).failing("dns failure"));
        let openalex = Arc::new(MockSource::new(LookupSource::OpenAlex).failing("timeout"));
        let verifier = verifier(vec![dblp, openalex]);

        let report = verifier
            .verify(&cited("vaswani2017"), &bib_with(attention_entry()))
            .await;

        assert_eq!(report.status(), VerdictStatus::NotFound);
        assert!(report.verdict.detail.contains("dns failure"));
        assert!(report.verdict.detail.contains("timeout"));
        assert!(report.bib_metadata.is_some());
    }

    #[tokio::test]
    async fn test_empty_title_is_not_found_without_query() {
        let entry = BibEntry::new("untitled", "misc");
        let dblp = Arc::new(MockSource::new(LookupSource::Dblp));
        let verifier = verifier(vec![dblp.clone()]);

        let report = verifier.verify(&cited("untitled"), &bib_with(entry)).await;

        assert_eq!(report.status(), VerdictStatus::NotFound);
        assert_eq!(dblp.calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_all_reports_every_key_in_order() {
        let mut citations = CitationSet::new();
        citations.record("zeta", SourceLocation::new("a.tex", 1));
        citations.record("vaswani2017", SourceLocation::new("a.tex", 2));
        citations.record("alpha", SourceLocation::new("a.tex", 3));

        let dblp = Arc::new(MockSource::new(LookupSource::Dblp).with_candidates(vec![
            make_candidate("Attention Is All You Need", &["Ashish Vaswani"]),
        ]));
        let verifier = verifier(vec![dblp.clone()]);
        let bib = bib_with(attention_entry());

        let mut seen = Vec::new();
        let reports = verifier
            .verify_all(&citations, &bib, |pos, total, key| {
                seen.push((pos, total, key.to_string()))
            })
            .await;

        let keys: Vec<&str> = reports.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["alpha", "vaswani2017", "zeta"]);
        assert_eq!(reports[0].status(), VerdictStatus::MissingInBib);
        assert_eq!(reports[1].status(), VerdictStatus::Verified);
        assert_eq!(seen[2], (3, 3, "zeta".to_string()));
        assert_eq!(dblp.calls(), 1);
    }

    #[test]
    fn test_first_author() {
        assert_eq!(first_author("Vaswani, Ashish and Shazeer, Noam"), "Vaswani");
        assert_eq!(first_author("Kaiming He and Xiangyu Zhang"), "Kaiming He");
        assert_eq!(first_author("{OpenAI}"), "OpenAI");
        assert_eq!(first_author(""), "");
    }

    #[test]
    fn test_author_matches() {
        let found = vec!["Ashish Vaswani".to_string()];
        assert!(author_matches("Vaswani", &found, 80.0));
        assert!(!author_matches("Hinton", &found, 80.0));
        assert!(!author_matches("", &found, 80.0));
        assert!(!author_matches("Vaswani", &[], 80.0));
    }
}
