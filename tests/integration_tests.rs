//! Integration tests for Citation Checker
//!
//! These tests run the whole pipeline (scan, parse, look up, judge, write)
//! against local mock DBLP and OpenAlex servers.

use citation_checker::config::Config;
use citation_checker::extract::{parse_bib_files, scan_tex_files};
use citation_checker::report::{Issue, ReportSummary, ReportWriter};
use citation_checker::sources::build_sources;
use citation_checker::{Verifier, VerdictStatus};
use tempfile::tempdir;

const DBLP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
<hits total="1" computed="1" sent="1" first="0">
<hit score="10" id="1">
<info>
<authors>
<author pid="1">Ashish Vaswani</author>
<author pid="2">Noam Shazeer</author>
</authors>
<title>Attention is All you Need.</title>
<year>2017</year>
<url>https://dblp.org/rec/conf/nips/VaswaniSPUJGKP17</url>
</info>
</hit>
</hits>
</result>"#;

const TEX: &str = r"
\section{Intro}
Transformers \cite{vaswani2017} replaced recurrence.
% \cite{commented_out}
Cats can do physics \citep{ghost2024, missing2020}.
";

const BIB: &str = r#"
@inproceedings{vaswani2017,
  title  = {Attention Is All You Need},
  author = {Vaswani, Ashish and Shazeer, Noam},
  year   = {2017}
}

@article{ghost2024,
  title  = {Quantum Gravity Transformers for Feline Cognition},
  author = {Nobody, Real},
  year   = {2024}
}
"#;

async fn mock_config(server: &mut mockito::ServerGuard) -> Config {
    server
        .mock("GET", "/search/publ/api")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/xml")
        .with_body(DBLP_XML)
        .create_async()
        .await;
    server
        .mock("GET", "/works")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"meta": {"count": 0}, "results": []}"#)
        .create_async()
        .await;

    let mut config = Config::default();
    config.sources.dblp_url = format!("{}/search/publ/api", server.url());
    config.sources.openalex_url = server.url();
    config.http.request_delay_ms = 0;
    config
}

#[tokio::test]
async fn test_full_pipeline_against_mock_services() {
    let mut server = mockito::Server::new_async().await;
    let mut config = mock_config(&mut server).await;

    let dir = tempdir().unwrap();
    let tex_dir = dir.path().join("tex");
    std::fs::create_dir(&tex_dir).unwrap();
    std::fs::write(tex_dir.join("main.tex"), TEX).unwrap();
    let bib_file = dir.path().join("refs.bib");
    std::fs::write(&bib_file, BIB).unwrap();
    config.output.directory = dir.path().join("output");

    let mut citations = scan_tex_files(&tex_dir).unwrap();
    let bib = parse_bib_files(&bib_file).unwrap();
    citations.attach_bibliography(&bib);
    assert_eq!(citations.len(), 3);
    assert!(!citations.contains("commented_out"));

    let verifier = Verifier::new(build_sources(&config).unwrap(), config.verify_settings());
    let reports = verifier.verify_all(&citations, &bib, |_, _, _| {}).await;

    let status_of = |key: &str| {
        reports
            .iter()
            .find(|r| r.key() == key)
            .map(|r| r.status())
            .unwrap()
    };
    assert_eq!(status_of("vaswani2017"), VerdictStatus::Verified);
    assert_eq!(status_of("ghost2024"), VerdictStatus::NotFound);
    assert_eq!(status_of("missing2020"), VerdictStatus::MissingInBib);

    let summary = ReportSummary::from_reports(&reports);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.issues(), 2);

    let paths = ReportWriter::from_config(&config.output)
        .write(&reports)
        .unwrap();
    let issues: Vec<Issue> =
        serde_json::from_str(&std::fs::read_to_string(&paths.issues).unwrap()).unwrap();
    let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["ghost2024", "missing2020"]);

    let all: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.all_citations).unwrap()).unwrap();
    let verified = &all[2];
    assert_eq!(verified["key"], "vaswani2017");
    assert_eq!(verified["verification_result"]["source"], "DBLP");
    assert_eq!(verified["locations"][0]["line"], 3);
}
