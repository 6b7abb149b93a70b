//! E2E tests for the citation-checker binary
//!
//! Every run here is offline: keys missing from the bibliography never
//! trigger a lookup.

#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn checker() -> Command {
    let mut cmd = Command::cargo_bin("citation-checker").unwrap();
    cmd.env_remove("OPENALEX_EMAIL")
        .env_remove("RUST_LOG")
        .env_remove("CITATION_CHECKER_OUTPUT__DIRECTORY");
    cmd
}

#[test]
fn test_help() {
    checker()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--threshold"))
        .stdout(predicate::str::contains("--email"));
}

#[test]
fn test_version() {
    checker()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("citation-checker"));
}

#[test]
fn test_env_listing() {
    checker()
        .arg("--env")
        .assert()
        .success()
        .stdout(predicate::str::contains("OPENALEX_EMAIL"));
}

#[test]
fn test_missing_tex_path_fails() {
    let dir = tempdir().unwrap();
    checker()
        .current_dir(dir.path())
        .args(["no-such-dir", "refs.bib"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_threshold_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.tex"), "").unwrap();
    fs::write(dir.path().join("refs.bib"), "").unwrap();

    checker()
        .current_dir(dir.path())
        .args(["main.tex", "refs.bib", "--threshold", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title_threshold"));
}

#[test]
fn test_offline_run_writes_reports() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("temp/tex")).unwrap();
    fs::create_dir_all(dir.path().join("temp/bib")).unwrap();
    fs::write(
        dir.path().join("temp/tex/main.tex"),
        "As shown in \\cite{smith2023}.\n% \\cite{ignored}\n\\citep{doe2021,smith2023}\n",
    )
    .unwrap();
    fs::write(dir.path().join("temp/bib/refs.bib"), "% nothing declared\n").unwrap();

    checker()
        .current_dir(dir.path())
        .arg("--quiet")
        .assert()
        .success();

    let all = fs::read_to_string(dir.path().join("output/all_citations.json")).unwrap();
    let issues = fs::read_to_string(dir.path().join("output/hallucination_report.json")).unwrap();
    assert!(all.contains("\"Missing in Bib\""));
    assert!(!all.contains("ignored"));
    assert!(issues.contains("\"smith2023\""));
    assert!(issues.contains("\"doe2021\""));

    checker()
        .current_dir(dir.path())
        .arg("--quiet")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("output/all_citations.json")).unwrap(),
        all
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("output/hallucination_report.json")).unwrap(),
        issues
    );
}

#[test]
fn test_custom_output_dir_and_summary() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("paper.tex"), "\\cite{ghost}").unwrap();
    fs::write(dir.path().join("refs.bib"), "").unwrap();

    checker()
        .current_dir(dir.path())
        .args(["paper.tex", "refs.bib", "-o", "reports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Missing in Bib"))
        .stdout(predicate::str::contains("issues in 1 citations"));

    assert!(dir.path().join("reports/all_citations.json").is_file());
    assert!(dir.path().join("reports/hallucination_report.json").is_file());
}

#[test]
fn test_dotenv_file_sets_config_overrides() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("paper.tex"), "\\cite{ghost}").unwrap();
    fs::write(dir.path().join("refs.bib"), "").unwrap();
    fs::write(
        dir.path().join(".env"),
        "CITATION_CHECKER_OUTPUT__DIRECTORY=from-dotenv\n",
    )
    .unwrap();

    checker()
        .current_dir(dir.path())
        .args(["paper.tex", "refs.bib", "--quiet"])
        .assert()
        .success();

    assert!(dir.path().join("from-dotenv/all_citations.json").is_file());
    assert!(!dir.path().join("output").exists());
}
