//! Configuration management.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `./citation-checker.toml`, or
//!    `<config dir>/citation-checker/config.toml`)
//! 3. `CITATION_CHECKER_<SECTION>__<KEY>` environment variables
//! 4. `OPENALEX_EMAIL`
//! 5. Command-line flags (applied by the binary)
//!
//! # Configuration File Format
//!
//! ```toml
//! [verification]
//! title_threshold = 90.0
//! fallback_threshold = 70.0
//! author_threshold = 80.0
//!
//! [http]
//! request_delay_ms = 1000
//! dblp_timeout_secs = 5
//! openalex_timeout_secs = 10
//! connect_timeout_secs = 10
//! max_candidates = 3
//!
//! [sources]
//! dblp_url = "https://dblp.org/search/publ/api"
//! openalex_url = "https://api.openalex.org"
//! openalex_email = "you@example.org"
//!
//! [output]
//! directory = "output"
//! all_citations_file = "all_citations.json"
//! issues_file = "hallucination_report.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::verify::VerifySettings;

/// Default DBLP publication search endpoint
pub const DEFAULT_DBLP_URL: &str = "https://dblp.org/search/publ/api";

/// Default OpenAlex API base
pub const DEFAULT_OPENALEX_URL: &str = "https://api.openalex.org";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CITATION_CHECKER";

/// Environment variable holding the OpenAlex contact email
pub const OPENALEX_EMAIL_VAR: &str = "OPENALEX_EMAIL";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Similarity thresholds for the verification pipeline
    pub verification: VerificationConfig,

    /// Request pacing and timeouts
    pub http: HttpConfig,

    /// Lookup endpoints and credentials
    pub sources: SourcesConfig,

    /// Report output location
    pub output: OutputConfig,
}

/// Similarity thresholds, all on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Minimum title similarity for the title check to pass
    pub title_threshold: f64,

    /// Candidates scoring below this fall through to the next source
    pub fallback_threshold: f64,

    /// A candidate author must score above this against the first author
    pub author_threshold: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            title_threshold: 90.0,
            fallback_threshold: 70.0,
            author_threshold: 80.0,
        }
    }
}

/// HTTP settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Minimum spacing between outbound requests; 0 disables pacing
    pub request_delay_ms: u64,

    pub dblp_timeout_secs: u64,

    pub openalex_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Records requested per lookup
    pub max_candidates: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            dblp_timeout_secs: 5,
            openalex_timeout_secs: 10,
            connect_timeout_secs: 10,
            max_candidates: 3,
        }
    }
}

/// Lookup endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub dblp_url: String,

    pub openalex_url: String,

    /// Contact email for the OpenAlex polite pool
    pub openalex_email: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dblp_url: DEFAULT_DBLP_URL.to_string(),
            openalex_url: DEFAULT_OPENALEX_URL.to_string(),
            openalex_email: None,
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,

    pub all_citations_file: String,

    pub issues_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            all_citations_file: "all_citations.json".to_string(),
            issues_file: "hallucination_report.json".to_string(),
        }
    }
}

impl Config {
    /// Thresholds and lookup width for the verifier
    pub fn verify_settings(&self) -> VerifySettings {
        VerifySettings {
            title_threshold: self.verification.title_threshold,
            fallback_threshold: self.verification.fallback_threshold,
            author_threshold: self.verification.author_threshold,
            max_candidates: self.http.max_candidates.max(1),
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.http.request_delay_ms)
    }

    pub fn dblp_timeout(&self) -> Duration {
        Duration::from_secs(self.http.dblp_timeout_secs)
    }

    pub fn openalex_timeout(&self) -> Duration {
        Duration::from_secs(self.http.openalex_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("verification.title_threshold", self.verification.title_threshold),
            ("verification.fallback_threshold", self.verification.fallback_threshold),
            ("verification.author_threshold", self.verification.author_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }

        if self.http.max_candidates == 0 {
            return Err(ConfigError::Invalid(
                "http.max_candidates must be at least 1".to_string(),
            ));
        }

        for (name, timeout) in [
            ("http.dblp_timeout_secs", self.http.dblp_timeout_secs),
            ("http.openalex_timeout_secs", self.http.openalex_timeout_secs),
        ] {
            if timeout == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }

        if self.output.all_citations_file == self.output.issues_file {
            return Err(ConfigError::Invalid(
                "output.all_citations_file and output.issues_file must differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;

    if config.sources.openalex_email.is_none() {
        config.sources.openalex_email = std::env::var(OPENALEX_EMAIL_VAR)
            .ok()
            .filter(|e| !e.trim().is_empty());
    }

    Ok(config)
}

/// Find a configuration file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("citation-checker.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("citation-checker").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
