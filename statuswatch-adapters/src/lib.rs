//! # statuswatch-adapters
//!
//! Pre-built sources for popular third-party status pages.
//!
//! Every adapter implements [`statuswatch_sdk::Source`]: it fetches one
//! vendor's status endpoint and maps the vendor's vocabulary onto
//! [`NormalizedStatus`]. Targets are usually described by [`TargetConfig`]
//! and turned into sources with [`build_sources`].
//!
//! ## Supported Providers
//!
//! | type | reads |
//! |---|---|
//! | `statuspage` | Atlassian Statuspage `summary.json` |
//! | `cloudflare` | Cloudflare summary or incidents payloads |
//! | `instatus` | Instatus components, legacy summary fallback |
//! | `statusio` | Status.io public status API |
//! | `azuredevops` | Azure DevOps health API |
//! | `gcp` | Google Cloud incident history |
//! | `aws_rss` | AWS Service Health RSS feeds (`aws_rss` feature) |
//! | `betterstack` | Better Stack Uptime API (token required) |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statuswatch_adapters::{build_sources, SourceDefaults, TargetConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let targets = vec![
//!         TargetConfig::new("github", "statuspage", "https://www.githubstatus.com"),
//!         TargetConfig::new("gcp", "gcp", ""),
//!     ];
//!
//!     let sources = build_sources(&targets, &SourceDefaults::default())?;
//!     println!("Configured {} sources", sources.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod duration;
pub mod error;
mod http;

pub mod azuredevops;
pub mod betterstack;
pub mod cloudflare;
pub mod gcp;
pub mod instatus;
pub mod statusio;
pub mod statuspage;

#[cfg(feature = "aws_rss")]
pub mod aws_rss;

pub use config::{build_sources, FeedConfig, SourceDefaults, SourceSettings, TargetConfig};
pub use error::ConfigurationError;
pub use http::HttpClient;

// Re-export types for convenience
pub use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
