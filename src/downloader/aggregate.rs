//! Report assembly

use serde::{Deserialize, Serialize};

use crate::{CategoryFailure, CategoryOutcome, CategoryResult};

/// Run totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Categories in the catalog
    pub total_categories: usize,
    /// Categories that produced at least one bid
    pub categories_with_bids: usize,
    /// Bids across all categories
    pub total_bids: usize,
}

/// Final result of a fetch run
///
/// `categories` holds only categories that produced bids; empty and failed
/// categories are absent from it. Failures are listed separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    stats: ReportStats,
    categories: Vec<CategoryResult>,
    #[serde(rename = "failedCategories", default)]
    failed_categories: Vec<CategoryFailure>,
}

impl Report {
    /// Totals
    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }

    /// Categories with bids, in catalog order
    pub fn categories(&self) -> &[CategoryResult] {
        &self.categories
    }

    /// Categories whose fetch failed, in catalog order
    pub fn failed_categories(&self) -> &[CategoryFailure] {
        &self.failed_categories
    }
}

/// Fold per-category outcomes into a report
pub fn aggregate(outcomes: Vec<CategoryOutcome>, total_categories: usize) -> Report {
    let mut categories = Vec::new();
    let mut failed_categories = Vec::new();

    for outcome in outcomes {
        match outcome {
            CategoryOutcome::Found(result) => categories.push(result),
            CategoryOutcome::Empty(_) => {}
            CategoryOutcome::Failed(failure) => failed_categories.push(failure),
        }
    }

    let total_bids = categories.iter().map(|c| c.bids.len()).sum();

    Report {
        stats: ReportStats {
            total_categories,
            categories_with_bids: categories.len(),
            total_bids,
        },
        categories,
        failed_categories,
    }
}
