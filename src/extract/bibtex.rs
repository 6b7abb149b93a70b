//! BibTeX parsing.
//!
//! A small recovering parser: each `@type{key, field = value, ...}` block
//! is parsed on its own, and a block that fails to parse is reported and
//! skipped without affecting the blocks around it.

use std::collections::BTreeMap;
use std::path::Path;

use super::{collect_files, ExtractError};
use crate::models::{BibDatabase, BibEntry};

/// An entry the parser could not read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// 1-based line of the `@`
    pub line: usize,

    /// Citation key, when it was readable
    pub key: Option<String>,

    pub reason: String,
}

impl std::fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "line {} ('{}'): {}", self.line, key, self.reason),
            None => write!(f, "line {}: {}", self.line, self.reason),
        }
    }
}

/// Result of parsing one BibTeX document
#[derive(Debug, Clone, Default)]
pub struct BibParseOutcome {
    /// Entries in document order
    pub entries: Vec<BibEntry>,

    /// Entries that were skipped
    pub malformed: Vec<MalformedEntry>,
}

/// Parse BibTeX text; `source_file` is recorded on every entry
pub fn parse_bibtex(content: &str, source_file: &str) -> BibParseOutcome {
    let parser = Parser::new(content);
    let mut outcome = BibParseOutcome::default();
    let mut pos = 0;

    while let Some(at) = parser.next_entry_start(pos) {
        match parser.parse_block(at) {
            Ok((Block::Entry(mut entry), end)) => {
                entry.source_file = source_file.to_string();
                outcome.entries.push(entry);
                pos = end;
            }
            Ok((Block::Skipped, end)) => pos = end,
            Err(failure) => {
                outcome.malformed.push(MalformedEntry {
                    line: parser.line_at(at),
                    key: failure.key,
                    reason: failure.reason,
                });
                pos = at + 1;
            }
        }
    }

    outcome
}

/// Parse a BibTeX file or directory into one database
///
/// Files are merged in sorted path order; on duplicate keys the later file
/// wins. Unreadable files and malformed entries are logged and skipped.
pub fn parse_bib_files(input: &Path) -> Result<BibDatabase, ExtractError> {
    let files = collect_files(input, "bib", "BibTeX")?;
    tracing::info!("Parsing {} .bib files from '{}'...", files.len(), input.display());

    let mut db = BibDatabase::new();
    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Error parsing bib file {}: {}", file.display(), e);
                continue;
            }
        };

        let file_name = file.display().to_string();
        let outcome = parse_bibtex(&content, &file_name);
        for malformed in &outcome.malformed {
            tracing::warn!("{}: skipping malformed entry at {}", file_name, malformed);
        }

        for entry in outcome.entries {
            let key = entry.key.clone();
            if let Some(previous) = db.insert(entry) {
                tracing::warn!(
                    "Duplicate key '{}' in {} overrides the entry from {}",
                    key,
                    file_name,
                    previous.source_file
                );
            }
        }
    }

    tracing::info!("Merged {} entries from all BibTeX files.", db.len());
    Ok(db)
}

enum Block {
    Entry(BibEntry),
    Skipped,
}

struct Failure {
    key: Option<String>,
    reason: String,
}

impl Failure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            key: None,
            reason: reason.into(),
        }
    }

    fn with_key(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: Some(key.to_string()),
            reason: reason.into(),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    line_starts: Vec<usize>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            src,
            bytes: src.as_bytes(),
            line_starts,
        }
    }

    fn line_at(&self, pos: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= pos)
    }

    /// Next `@` that starts a block: at the beginning of the input, after
    /// whitespace, or right after a previous block's closing delimiter
    fn next_entry_start(&self, from: usize) -> Option<usize> {
        (from..self.bytes.len()).find(|&i| {
            self.bytes[i] == b'@'
                && (i == 0 || matches!(self.bytes[i - 1], b' ' | b'\t' | b'\r' | b'\n' | b'}' | b')'))
        })
    }

    /// Parse the block starting at `at`; returns it with the position after it
    fn parse_block(&self, at: usize) -> Result<(Block, usize), Failure> {
        let mut pos = at + 1;
        let type_start = pos;
        while pos < self.bytes.len() && self.bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let entry_type = self.src[type_start..pos].to_ascii_lowercase();
        if entry_type.is_empty() {
            return Err(Failure::new("missing entry type after '@'"));
        }

        pos = self.skip_ws(pos, self.bytes.len());
        let close = match self.bytes.get(pos) {
            Some(b'{') => b'}',
            Some(b'(') => b')',
            _ => {
                return Err(Failure::new(format!(
                    "expected '{{' or '(' after @{}",
                    entry_type
                )))
            }
        };
        let open = pos;
        let end = self
            .find_block_end(open, close)
            .ok_or_else(|| Failure::new(format!("unterminated @{} block", entry_type)))?;

        if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
            return Ok((Block::Skipped, end + 1));
        }

        let mut entry = self.parse_entry(&entry_type, open + 1, end)?;
        entry.line = self.line_at(at);
        Ok((Block::Entry(entry), end + 1))
    }

    /// Index of the delimiter closing the block opened at `open`
    fn find_block_end(&self, open: usize, close: u8) -> Option<usize> {
        let mut braces = 0usize;
        let mut parens = 0usize;
        for i in open + 1..self.bytes.len() {
            match self.bytes[i] {
                b'{' => braces += 1,
                b'}' if braces == 0 => {
                    if close == b'}' {
                        return Some(i);
                    }
                    return None;
                }
                b'}' => braces -= 1,
                b'(' if close == b')' && braces == 0 => parens += 1,
                b')' if close == b')' && braces == 0 => {
                    if parens == 0 {
                        return Some(i);
                    }
                    parens -= 1;
                }
                _ => {}
            }
        }
        None
    }

    /// Parse `key, name = value, ...` between `start` and `end` (exclusive)
    fn parse_entry(&self, entry_type: &str, start: usize, end: usize) -> Result<BibEntry, Failure> {
        let key_end = self.src[start..end]
            .find(',')
            .map(|i| start + i)
            .unwrap_or(end);
        let key = self.src[start..key_end].trim();
        if key.is_empty() || key.contains(|c: char| c.is_whitespace() || matches!(c, '=' | '{' | '}' | '"')) {
            return Err(Failure::new("missing citation key"));
        }

        let mut fields = BTreeMap::new();
        let mut pos = key_end;
        loop {
            while pos < end && (self.bytes[pos] == b',' || self.bytes[pos].is_ascii_whitespace()) {
                pos += 1;
            }
            if pos >= end {
                break;
            }

            let name_start = pos;
            while pos < end
                && (self.bytes[pos].is_ascii_alphanumeric()
                    || matches!(self.bytes[pos], b'_' | b'-' | b':' | b'.' | b'+'))
            {
                pos += 1;
            }
            if pos == name_start {
                let found = self.src[pos..].chars().next().unwrap_or(' ');
                return Err(Failure::with_key(
                    key,
                    format!("unexpected '{}' in field list", found),
                ));
            }
            let name = self.src[name_start..pos].to_ascii_lowercase();

            pos = self.skip_ws(pos, end);
            if self.bytes.get(pos) != Some(&b'=') || pos >= end {
                return Err(Failure::with_key(key, format!("field '{}' is missing '='", name)));
            }
            pos += 1;

            let (value, next) = self
                .read_value(pos, end)
                .map_err(|reason| Failure::with_key(key, format!("field '{}': {}", name, reason)))?;
            pos = self.skip_ws(next, end);
            if pos < end && self.bytes[pos] != b',' {
                return Err(Failure::with_key(
                    key,
                    format!("expected ',' after field '{}'", name),
                ));
            }
            fields.insert(name, value);
        }

        Ok(build_entry(key, entry_type, fields))
    }

    /// Read a value made of `{...}`, `"..."` and bare parts joined by `#`
    fn read_value(&self, mut pos: usize, end: usize) -> Result<(String, usize), String> {
        let mut value = String::new();
        loop {
            pos = self.skip_ws(pos, end);
            match self.bytes.get(pos) {
                Some(b'{') if pos < end => {
                    let close = self.matching_brace(pos, end).ok_or("unbalanced braces")?;
                    value.push_str(&self.src[pos + 1..close]);
                    pos = close + 1;
                }
                Some(b'"') if pos < end => {
                    let close = self.closing_quote(pos, end).ok_or("unterminated quoted value")?;
                    value.push_str(&self.src[pos + 1..close]);
                    pos = close + 1;
                }
                Some(b) if pos < end && (b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')) => {
                    let start = pos;
                    while pos < end
                        && !matches!(self.bytes[pos], b',' | b'#' | b'{' | b'}' | b'"')
                        && !self.bytes[pos].is_ascii_whitespace()
                    {
                        pos += 1;
                    }
                    value.push_str(&self.src[start..pos]);
                }
                _ => return Err("missing value".to_string()),
            }

            let after = self.skip_ws(pos, end);
            if after < end && self.bytes[after] == b'#' {
                pos = after + 1;
            } else {
                return Ok((value, pos));
            }
        }
    }

    fn matching_brace(&self, open: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in open..end {
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn closing_quote(&self, open: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in open + 1..end {
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' if depth == 0 => return Some(i),
                _ => {}
            }
        }
        None
    }

    fn skip_ws(&self, mut pos: usize, end: usize) -> usize {
        while pos < end && self.bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }
}

fn build_entry(key: &str, entry_type: &str, fields: BTreeMap<String, String>) -> BibEntry {
    let title = fields.get("title").map(|t| clean_text(t)).unwrap_or_default();
    let author_raw = fields.get("author").map(String::as_str).unwrap_or_default();
    let author_field = fold_whitespace(author_raw);
    let authors = split_authors(author_raw);
    let year = fields
        .get("year")
        .map(|y| clean_text(y))
        .filter(|y| !y.is_empty());

    let mut entry = BibEntry::new(key, entry_type)
        .title(title)
        .authors(author_field, authors);
    entry.year = year;
    entry.raw_fields = fields;
    entry
}

/// Fold all whitespace runs (including newlines) into single spaces
fn fold_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop grouping braces and common escapes, fold whitespace
fn clean_text(text: &str) -> String {
    let unescaped = text
        .replace("\\&", "&")
        .replace("\\%", "%")
        .replace("\\_", "_")
        .replace('~', " ");
    let without_braces: String = unescaped.chars().filter(|c| !matches!(c, '{' | '}')).collect();
    fold_whitespace(&without_braces)
}

/// Split an author field on top-level `and`, keeping `{Barnes and Noble}` whole
fn split_authors(field: &str) -> Vec<String> {
    let mut authors = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth: i32 = 0;

    for token in field.split_whitespace() {
        if depth == 0 && token.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                authors.push(clean_text(&current.join(" ")));
                current.clear();
            }
            continue;
        }
        for c in token.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
        current.push(token);
    }
    if !current.is_empty() {
        authors.push(clean_text(&current.join(" ")));
    }

    authors.retain(|a| !a.is_empty());
    authors
}
