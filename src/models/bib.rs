//! BibTeX entries and the merged bibliography.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declared BibTeX entry with its fields cleaned for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibEntry {
    /// Citation key
    pub key: String,

    /// Entry type, lowercased (article, inproceedings, misc, ...)
    pub entry_type: String,

    /// Title with braces removed and whitespace collapsed
    pub title: String,

    /// Authors in declaration order
    pub authors: Vec<String>,

    /// The `author` field with newlines folded into spaces
    #[serde(rename = "author")]
    pub author_field: String,

    /// Publication year, if declared
    pub year: Option<String>,

    /// File the entry was read from
    #[serde(default)]
    pub source_file: String,

    /// 1-based line of the `@type{` opener
    #[serde(default)]
    pub line: usize,

    /// Every field as written, keyed by lowercase field name
    #[serde(default)]
    pub raw_fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            title: String::new(),
            authors: Vec::new(),
            author_field: String::new(),
            year: None,
            source_file: String::new(),
            line: 0,
            raw_fields: BTreeMap::new(),
        }
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the author field and the derived author list
    pub fn authors(mut self, author_field: impl Into<String>, authors: Vec<String>) -> Self {
        self.author_field = author_field.into();
        self.authors = authors;
        self
    }

    /// Set the year
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Look up a raw field by (case-insensitive) name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw_fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Merged bibliography, keyed by citation key
#[derive(Debug, Clone, Default)]
pub struct BibDatabase {
    entries: BTreeMap<String, BibEntry>,
}

impl BibDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the entry it replaced (if any)
    pub fn insert(&mut self, entry: BibEntry) -> Option<BibEntry> {
        self.entries.insert(entry.key.clone(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_duplicate_key() {
        let mut db = BibDatabase::new();
        assert!(db
            .insert(BibEntry::new("a", "article").title("First"))
            .is_none());
        let replaced = db.insert(BibEntry::new("a", "misc").title("Second"));

        assert_eq!(replaced.unwrap().title, "First");
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("a").unwrap().title, "Second");
    }

    #[test]
    fn test_serialized_author_field_name() {
        let entry = BibEntry::new("k", "article").authors(
            "Doe, Jane and Roe, Rick",
            vec!["Doe, Jane".to_string(), "Roe, Rick".to_string()],
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["author"], "Doe, Jane and Roe, Rick");
        assert_eq!(json["authors"][1], "Roe, Rick");
    }
}
