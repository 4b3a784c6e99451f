//! CLI command implementations

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::CategoryCatalog;
use crate::downloader::config::{
    RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_SECS,
};
use crate::fetcher::portal_config::{PortalConfig, DEFAULT_BASE_URL};
use crate::output::OutputError;

pub mod categories;
pub mod document;
pub mod error;
pub mod fetch;

pub use categories::CategoriesArgs;
pub use document::DocumentArgs;
pub use error::CliError;
pub use fetch::FetchArgs;

/// GeM bidplus fetcher CLI
#[derive(Parser, Debug)]
#[command(name = "bidplus-fetcher")]
#[command(about = "Collect procurement bids from the GeM bidplus portal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Expose Prometheus metrics on this address (e.g. 0.0.0.0:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Portal base URL
    #[arg(long, global = true, env = "BIDPLUS_PORTAL_URL", default_value = DEFAULT_BASE_URL)]
    pub portal_url: String,

    /// Category catalog JSON file (`[{"category_name", "category_id"}]`);
    /// the built-in catalog is used when omitted
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Attempts per request, the first one included (range: 1-20)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt k waits base × 2^(k-1)
    #[arg(long, global = true, default_value_t = DEFAULT_BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    /// Timeout of each request attempt in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,
}

impl Cli {
    /// Retry policy from the global flags
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }

    /// Portal configuration from the global flags
    pub fn portal(&self) -> PortalConfig {
        PortalConfig::new(self.portal_url.as_str())
    }

    /// The catalog file if one was given, the built-in catalog otherwise
    pub fn load_catalog(&self) -> Result<CategoryCatalog, CliError> {
        let catalog = match &self.catalog {
            Some(path) => CategoryCatalog::from_json_file(path)?,
            None => CategoryCatalog::builtin()?,
        };
        Ok(catalog)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch bids for every catalog category
    Fetch(FetchArgs),

    /// Download one bid document
    Document(DocumentArgs),

    /// List the category catalog
    Categories(CategoriesArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Print `value` as one line of JSON on stdout
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let line = serde_json::to_string(value)
        .map_err(|e| OutputError::SerializationError(format!("Failed to encode output: {e}")))?;
    println!("{line}");
    Ok(())
}
