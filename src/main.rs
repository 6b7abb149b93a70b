use anyhow::{Context, Result};
use clap::Parser;
use citation_checker::config::{find_config_file, load_config, Config, ENV_PREFIX};
use citation_checker::extract::{parse_bib_files, scan_tex_files};
use citation_checker::report::{ReportSummary, ReportWriter};
use citation_checker::sources::build_sources;
use citation_checker::ui::{print_summary, CheckProgress};
use citation_checker::Verifier;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Citation Checker - Verify that LaTeX citations point at real papers
#[derive(Parser, Debug)]
#[command(name = "citation-checker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check LaTeX citations against DBLP and OpenAlex", long_about = None)]
struct Cli {
    /// TeX file or directory to scan for citation commands
    #[arg(default_value = "./temp/tex")]
    tex_path: PathBuf,

    /// BibTeX file or directory declaring the cited entries
    #[arg(default_value = "./temp/bib")]
    bib_path: PathBuf,

    /// Directory for the JSON reports
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Title similarity (0-100) required for a citation to be verified
    #[arg(long)]
    threshold: Option<f64>,

    /// DBLP confidence (0-100) below which OpenAlex is consulted
    #[arg(long)]
    fallback_threshold: Option<f64>,

    /// Similarity (0-100) a found author must exceed against the first author
    #[arg(long)]
    author_threshold: Option<f64>,

    /// Minimum delay between outbound requests, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Contact email for the OpenAlex polite pool
    #[arg(long, env = "OPENALEX_EMAIL")]
    email: Option<String>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors; no progress bar
    #[arg(long, short)]
    quiet: bool,

    /// Show all environment variables
    #[arg(long)]
    env: bool,
}

impl Cli {
    /// Command-line values win over every other configuration layer
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.verification.title_threshold = threshold;
        }
        if let Some(threshold) = self.fallback_threshold {
            config.verification.fallback_threshold = threshold;
        }
        if let Some(threshold) = self.author_threshold {
            config.verification.author_threshold = threshold;
        }
        if let Some(delay) = self.delay_ms {
            config.http.request_delay_ms = delay;
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            config.sources.openalex_email = Some(email.to_string());
        }
    }
}

fn print_env_vars() {
    println!("Citation Checker - Environment Variables");
    println!();
    println!("OpenAlex:");
    println!("  OPENALEX_EMAIL              Contact email for the OpenAlex 'polite pool'");
    println!();
    println!("Configuration overrides ({}_<SECTION>__<KEY>):", ENV_PREFIX);
    println!("  {}_VERIFICATION__TITLE_THRESHOLD     Title similarity threshold (default: 90)", ENV_PREFIX);
    println!("  {}_VERIFICATION__FALLBACK_THRESHOLD  Confidence below which OpenAlex is tried (default: 70)", ENV_PREFIX);
    println!("  {}_VERIFICATION__AUTHOR_THRESHOLD    First-author similarity threshold (default: 80)", ENV_PREFIX);
    println!("  {}_HTTP__REQUEST_DELAY_MS            Delay between requests in ms (default: 1000)", ENV_PREFIX);
    println!("  {}_HTTP__DBLP_TIMEOUT_SECS           DBLP request timeout (default: 5)", ENV_PREFIX);
    println!("  {}_HTTP__OPENALEX_TIMEOUT_SECS       OpenAlex request timeout (default: 10)", ENV_PREFIX);
    println!("  {}_HTTP__MAX_CANDIDATES              Records requested per lookup (default: 3)", ENV_PREFIX);
    println!("  {}_SOURCES__DBLP_URL                 DBLP search endpoint", ENV_PREFIX);
    println!("  {}_SOURCES__OPENALEX_URL             OpenAlex API base URL", ENV_PREFIX);
    println!("  {}_OUTPUT__DIRECTORY                 Report directory (default: output)", ENV_PREFIX);
    println!();
    println!("Global Proxy Settings:");
    println!("  HTTP_PROXY                  HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                 HTTPS proxy URL (e.g., https://proxy:8080)");
    println!("  NO_PROXY                    Comma-separated list of hosts to bypass proxy");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export OPENALEX_EMAIL=\"you@example.org\"");
    println!("  export {}_HTTP__REQUEST_DELAY_MS=\"500\"", ENV_PREFIX);
    std::process::exit(0);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
    }

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("citation_checker={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    let mut config = load_config(config_path.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let mut citations = scan_tex_files(&cli.tex_path).context("Failed to scan TeX sources")?;
    let bib = parse_bib_files(&cli.bib_path).context("Failed to read the bibliography")?;
    citations.attach_bibliography(&bib);

    let sources = build_sources(&config).context("Failed to set up lookup clients")?;
    let verifier = Verifier::new(sources, config.verify_settings());

    tracing::info!("Starting verification of {} citation keys...", citations.len());
    let progress = CheckProgress::new(citations.len(), cli.quiet);
    let reports = verifier
        .verify_all(&citations, &bib, |position, _total, key| {
            progress.update(position, key)
        })
        .await;
    progress.finish();

    let paths = ReportWriter::from_config(&config.output)
        .write(&reports)
        .context("Failed to write reports")?;

    if !cli.quiet {
        print_summary(&ReportSummary::from_reports(&reports), &paths);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["citation-checker"]);
        assert_eq!(cli.tex_path, PathBuf::from("./temp/tex"));
        assert_eq!(cli.bib_path, PathBuf::from("./temp/bib"));
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.output_dir.is_none());
        assert!(cli.threshold.is_none());
    }

    #[test]
    fn test_cli_positional_paths() {
        let cli = Cli::parse_from(["citation-checker", "paper/main.tex", "paper/refs.bib"]);
        assert_eq!(cli.tex_path, PathBuf::from("paper/main.tex"));
        assert_eq!(cli.bib_path, PathBuf::from("paper/refs.bib"));
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["citation-checker", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["citation-checker", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag() {
        let cli = Cli::parse_from(["citation-checker", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "citation-checker",
            "-o",
            "reports",
            "--threshold",
            "85",
            "--fallback-threshold",
            "60",
            "--author-threshold",
            "75",
            "--delay-ms",
            "0",
            "--email",
            "lab@example.org",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.output.directory, PathBuf::from("reports"));
        assert_eq!(config.verification.title_threshold, 85.0);
        assert_eq!(config.verification.fallback_threshold, 60.0);
        assert_eq!(config.verification.author_threshold, 75.0);
        assert_eq!(config.http.request_delay_ms, 0);
        assert_eq!(
            config.sources.openalex_email.as_deref(),
            Some("lab@example.org")
        );
    }

    #[test]
    fn test_cli_without_overrides_keeps_config() {
        let cli = Cli::parse_from(["citation-checker", "--email", ""]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
    }
}
