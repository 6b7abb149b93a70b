//! Citation keys found in TeX sources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BibDatabase, BibEntry};

/// A place where a citation key is used
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the TeX file, as given on the command line or found by the scan
    pub file: String,

    /// 1-based line of the citation command
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A unique citation key together with every place it is cited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Citation key as written inside `\cite{...}`
    pub key: String,

    /// Every use of the key, in scan order
    pub source_locations: Vec<SourceLocation>,

    /// The declaring BibTeX entry, once the bibliography has been attached
    pub raw_bib_entry: Option<BibEntry>,
}

impl Citation {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source_locations: Vec::new(),
            raw_bib_entry: None,
        }
    }

    /// Whether a BibTeX entry declares this key
    pub fn is_declared(&self) -> bool {
        self.raw_bib_entry.is_some()
    }
}

/// Set of unique citation keys, ordered by key
///
/// Ordering by key keeps reports stable between runs regardless of the
/// order in which files were scanned.
#[derive(Debug, Clone, Default)]
pub struct CitationSet {
    citations: BTreeMap<String, Citation>,
}

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one use of `key` at `location`
    pub fn record(&mut self, key: &str, location: SourceLocation) {
        self.citations
            .entry(key.to_string())
            .or_insert_with(|| Citation::new(key))
            .source_locations
            .push(location);
    }

    /// Link each citation to its BibTeX entry, if declared
    pub fn attach_bibliography(&mut self, bib: &BibDatabase) {
        for citation in self.citations.values_mut() {
            citation.raw_bib_entry = bib.get(&citation.key).cloned();
        }
    }

    pub fn get(&self, key: &str) -> Option<&Citation> {
        self.citations.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.citations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.citations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.citations.values()
    }
}
