//! Utility modules supporting verification.
//!
//! - [`HttpClient`]: HTTP client whose requests go through a shared [`Pacer`]
//! - [`Pacer`]: Minimum spacing between outbound requests
//! - [`similarity`]: Fuzzy string scores used for title and author checks
//!
//! # HTTP Client with Request Pacing
//!
//! ```rust,no_run
//! use citation_checker::utils::{HttpClient, Pacer};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Pacer::new(Duration::from_secs(1)))?;
//! let request = client.get("https://dblp.org/search/publ/api?q=attention&format=xml");
//! let response = client.send(request).await?;
//! # Ok(())
//! # }
//! ```

mod http;
pub mod similarity;

pub use http::{HttpClient, Pacer};
