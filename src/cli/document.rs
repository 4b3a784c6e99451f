//! Document command implementation

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::events::TracingSink;
use crate::fetcher::document::DocumentFetcher;
use crate::fetcher::http::{ReqwestTransport, RetryingClient};
use crate::output::write_document;

use super::{print_json, Cli, CliError, OutputFormat};

/// Document command arguments
#[derive(Parser, Debug)]
pub struct DocumentArgs {
    /// Portal document id (the bid's `id`)
    #[arg(long)]
    pub id: String,

    /// Name the file after this bid number instead of the id
    #[arg(long)]
    pub bid_number: Option<String>,

    /// Directory to save the document in
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl DocumentArgs {
    /// Execute the document command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = RetryingClient::new(Arc::new(ReqwestTransport::shared()), cli.retry_policy())
            .with_events(Arc::new(TracingSink));
        let fetcher = DocumentFetcher::new(client, cli.portal());

        let document = fetcher
            .download(&self.id, self.bid_number.as_deref())
            .await?;
        let path = write_document(&document, &self.output_dir)?;

        match cli.output_format {
            OutputFormat::Json => print_json(&json!({
                "success": true,
                "id": self.id,
                "path": path.display().to_string(),
                "content_type": document.content_type,
                "bytes": document.bytes.len(),
            }))?,
            OutputFormat::Human => {
                println!("Saved {} ({}, {} bytes)", path.display(), document.content_type, document.bytes.len());
            }
        }

        Ok(())
    }
}
