//! Citation extraction from TeX sources and BibTeX files.
//!
//! Both inputs accept a single file or a directory. Directories are scanned
//! recursively for `*.tex` / `*.bib`, in sorted path order so repeated runs
//! see files in the same order.
//!
//! ```rust,no_run
//! use citation_checker::extract::{parse_bib_files, scan_tex_files};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), citation_checker::extract::ExtractError> {
//! let mut citations = scan_tex_files(Path::new("paper/"))?;
//! let bib = parse_bib_files(Path::new("paper/refs.bib"))?;
//! citations.attach_bibliography(&bib);
//! # Ok(())
//! # }
//! ```

mod bibtex;
mod tex;

pub use bibtex::{parse_bib_files, parse_bibtex, BibParseOutcome, MalformedEntry};
pub use tex::{extract_citations, scan_tex_files, strip_comments};

use std::path::{Path, PathBuf};

/// Errors that abort extraction
///
/// Per-file read failures and malformed entries are logged and skipped
/// instead; only an unusable input path is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{kind} path '{}' does not exist", .path.display())]
    PathNotFound { kind: &'static str, path: PathBuf },

    #[error("Invalid search pattern for '{}': {message}", .path.display())]
    Pattern { path: PathBuf, message: String },
}

/// Resolve `input` to the list of files to read
///
/// A file is returned as-is whatever its extension; a directory yields every
/// file below it ending in `.{extension}`.
pub fn collect_files(
    input: &Path,
    extension: &str,
    kind: &'static str,
) -> Result<Vec<PathBuf>, ExtractError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(ExtractError::PathNotFound {
            kind,
            path: input.to_path_buf(),
        });
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&input.to_string_lossy()),
        extension
    );
    let entries = glob::glob(&pattern).map_err(|e| ExtractError::Pattern {
        path: input.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_files_recurses_and_sorts() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sections/deep")).unwrap();
        std::fs::write(dir.path().join("main.tex"), "").unwrap();
        std::fs::write(dir.path().join("sections/b.tex"), "").unwrap();
        std::fs::write(dir.path().join("sections/deep/a.tex"), "").unwrap();
        std::fs::write(dir.path().join("sections/notes.txt"), "").unwrap();

        let files = collect_files(dir.path(), "tex", "TeX").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(names, vec!["main.tex", "sections/b.tex", "sections/deep/a.tex"]);
    }

    #[test]
    fn test_collect_files_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("refs.txt");
        std::fs::write(&file, "").unwrap();

        assert_eq!(collect_files(&file, "bib", "BibTeX").unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_files_missing_path() {
        let err = collect_files(Path::new("/definitely/not/here"), "tex", "TeX").unwrap_err();
        assert!(err.to_string().contains("TeX path '/definitely/not/here' does not exist"));
    }
}
