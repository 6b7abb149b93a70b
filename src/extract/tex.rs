//! Citation-key extraction from TeX sources.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{collect_files, ExtractError};
use crate::models::{CitationSet, SourceLocation};

/// Commands that contain "cite" but take no citation keys
const NON_CITATION_COMMANDS: &[&str] = &["citestyle", "citeindextrue", "citeindexfalse"];

/// Matches `\cite`, `\citep*`, `\parencite[see][12]{a,b}`, `\nocite{x}` and friends
fn cite_regex() -> &'static Regex {
    static CITE_RE: OnceLock<Regex> = OnceLock::new();
    CITE_RE.get_or_init(|| {
        Regex::new(r"\\([A-Za-z]*[Cc]ite[A-Za-z]*)\*?\s*(?:\[[^\]]*\]\s*){0,2}\{([^{}]*)\}")
            .expect("citation pattern is valid")
    })
}

/// Remove TeX comments, keeping line structure intact
///
/// A `%` starts a comment unless escaped; `\\%` is a line break followed
/// by a comment.
pub fn strip_comments(content: &str) -> String {
    content
        .split('\n')
        .map(strip_line_comment)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let backslashes = bytes[..idx].iter().rev().take_while(|&&c| c == b'\\').count();
        if backslashes % 2 == 0 {
            return &line[..idx];
        }
    }
    line
}

/// Extract `(key, line)` pairs from TeX text, in document order
///
/// Comments are stripped first. Keys are split on commas and trimmed; empty
/// keys and the `\nocite{*}` wildcard are dropped.
pub fn extract_citations(content: &str) -> Vec<(String, usize)> {
    let text = strip_comments(content);
    let mut found = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    for caps in cite_regex().captures_iter(&text) {
        let (Some(whole), Some(command), Some(keys)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        line += text[scanned..whole.start()].matches('\n').count();
        scanned = whole.start();

        if NON_CITATION_COMMANDS.contains(&command.as_str()) {
            continue;
        }

        for key in keys.as_str().split(',') {
            let key = key.trim();
            if key.is_empty() || key == "*" {
                continue;
            }
            found.push((key.to_string(), line));
        }
    }

    found
}

/// Scan a TeX file or directory for citation keys
///
/// Unreadable files are logged and skipped; a missing path is an error.
pub fn scan_tex_files(input: &Path) -> Result<CitationSet, ExtractError> {
    let files = collect_files(input, "tex", "TeX")?;
    tracing::info!("Scanning {} .tex files in '{}'...", files.len(), input.display());

    let mut citations = CitationSet::new();
    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Error reading {}: {}", file.display(), e);
                continue;
            }
        };

        let file_name = file.display().to_string();
        let uses = extract_citations(&content);
        tracing::debug!("{}: {} citation uses", file_name, uses.len());
        for (key, line) in uses {
            citations.record(&key, SourceLocation::new(file_name.clone(), line));
        }
    }

    tracing::info!("Found {} unique citation keys.", citations.len());
    Ok(citations)
}
