//! Fetch command implementation

use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::downloader::config::{
    BatchConfig, FetchConfig, PaginationConfig, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_INTER_BATCH_DELAY_MS, DEFAULT_INTER_PAGE_DELAY_MS, DEFAULT_MAX_PAGES,
    DEFAULT_PAGE_SIZE,
};
use crate::downloader::{BidCollector, FetchRequest, Report};
use crate::events::{self, log_event, FetchEvent};
use crate::fetcher::http::ReqwestTransport;
use crate::fetcher::portal_config::END_DATE_FORMAT;
use crate::metrics::{self, RunMetrics};
use crate::output::{write_report, ReportFormat};

use super::{print_json, Cli, CliError, OutputFormat};

/// Maximum categories per batch
const MAX_BATCH_SIZE: usize = 32;

/// Parse a `YYYY-MM-DD` end date
fn parse_end_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), END_DATE_FORMAT)
        .map_err(|e| format!("'{s}' is not a YYYY-MM-DD date: {e}"))
}

/// Parse and validate a batch size
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("batch size must be at least 1".to_string());
    }
    if value > MAX_BATCH_SIZE {
        return Err(format!(
            "batch size {value} exceeds maximum of {MAX_BATCH_SIZE}"
        ));
    }
    Ok(value)
}

/// Fetch command arguments
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// CSRF token of a portal session
    #[arg(long, env = "BIDPLUS_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Only bids ending on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_end_date)]
    pub end_date: Option<NaiveDate>,

    /// Write the report here (.csv for CSV, JSON otherwise); without it the
    /// report JSON goes to stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Results per page served by the portal
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: u32,

    /// Stop a category after this many pages
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Categories fetched concurrently (max: 32)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY_LIMIT, value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Pause between pages of a category, in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTER_PAGE_DELAY_MS)]
    pub page_delay_ms: u64,

    /// Pause between batches, in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTER_BATCH_DELAY_MS)]
    pub batch_delay_ms: u64,
}

impl FetchArgs {
    /// Fetch configuration from these arguments and the global flags
    pub fn fetch_config(&self, cli: &Cli) -> FetchConfig {
        FetchConfig {
            retry: cli.retry_policy(),
            pagination: PaginationConfig {
                page_size: self.page_size,
                inter_page_delay: Duration::from_millis(self.page_delay_ms),
                max_pages: self.max_pages,
            },
            batch: BatchConfig {
                concurrency_limit: self.batch_size,
                inter_batch_delay: Duration::from_millis(self.batch_delay_ms),
            },
        }
    }

    /// Execute the fetch command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let request = FetchRequest::new(self.csrf_token.clone(), self.end_date);
        // Nothing is loaded or sent without a token
        request.credential()?;

        let catalog = cli.load_catalog()?;

        if let Some(addr) = cli.metrics_addr {
            metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::ConfigurationError(e.to_string()))?;
        }

        let progress = create_progress_bar(catalog.len() as u64, cli.output_format);
        let (sink, mut receiver) = events::channel();
        let consumer = tokio::spawn({
            let progress = progress.clone();
            async move {
                while let Some(event) = receiver.recv().await {
                    log_event(&event);
                    metrics::record_event(&event);
                    if let FetchEvent::BatchStarted {
                        batch,
                        total_batches,
                        ..
                    } = &event
                    {
                        progress.set_message(format!("batch {batch}/{total_batches}"));
                    }
                    if event.is_category_terminal() {
                        progress.inc(1);
                    }
                }
            }
        });

        let run_metrics = RunMetrics::start();

        let collector = BidCollector::new(
            catalog,
            Arc::new(ReqwestTransport::shared()),
            cli.portal(),
            self.fetch_config(cli),
            Arc::new(sink),
        );
        let result = collector.collect(&request).await;

        // Dropping the collector closes the channel so the consumer drains and exits
        drop(collector);
        if let Err(e) = consumer.await {
            warn!(error = %e, "Event consumer stopped abnormally");
        }
        progress.finish_and_clear();
        run_metrics.record_finished();

        let report = result?;
        match &self.output {
            Some(path) => {
                let format = write_report(&report, path)?;
                match cli.output_format {
                    OutputFormat::Json => output_json(&report, path, format)?,
                    OutputFormat::Human => output_human(&report, path, format),
                }
            }
            None => print_json(&report)?,
        }

        Ok(())
    }
}

/// Summary of a written report as JSON
fn output_json(report: &Report, path: &std::path::Path, format: ReportFormat) -> Result<(), CliError> {
    let output = json!({
        "success": true,
        "output_path": path.display().to_string(),
        "format": match format {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        },
        "stats": report.stats(),
        "failedCategories": report.failed_categories(),
    });
    print_json(&output)
}

/// Summary of a written report for humans
fn output_human(report: &Report, path: &std::path::Path, format: ReportFormat) {
    let stats = report.stats();
    println!("\nFetch completed!");
    println!("Output: {} ({:?})", path.display(), format);
    println!("Categories: {}", stats.total_categories);
    println!("Categories with bids: {}", stats.categories_with_bids);
    println!("Bids: {}", stats.total_bids);

    let failed = report.failed_categories();
    if !failed.is_empty() {
        println!("Failed categories: {}", failed.len());
        for failure in failed {
            println!(
                "  {} ({}) page {}: {}",
                failure.category.name, failure.category.identifier, failure.page, failure.reason
            );
        }
    }
}

/// Create progress bar with style; hidden for JSON output
fn create_progress_bar(categories: u64, format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(categories);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Fetching categories");
    pb
}
