//! Integration tests for report and document output

use bidplus_fetcher::downloader::{aggregate, Report};
use bidplus_fetcher::fetcher::document::Document;
use bidplus_fetcher::output::{write_document, write_report, ReportFormat};
use bidplus_fetcher::{Bid, Category, CategoryFailure, CategoryOutcome, CategoryResult};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;

fn sample_report() -> Report {
    let bids = (1..=3)
        .map(|n| Bid {
            id: n.to_string(),
            bid_number: format!("GEM/2025/B/{n}"),
            quantity: Some(n * 10),
            end_date: Some(Utc.with_ymd_and_hms(2025, 4, 15, 18, 0, 0).unwrap()),
            department: if n == 2 { None } else { Some("Department of Posts".to_string()) },
        })
        .collect();

    aggregate(
        vec![
            CategoryOutcome::Found(CategoryResult {
                category: Category::new("Cloud Service", "home_clou"),
                bids,
            }),
            CategoryOutcome::Empty(Category::new("Laptop", "computers_laptop")),
            CategoryOutcome::Failed(CategoryFailure {
                category: Category::new("Printer", "printer"),
                page: 2,
                reason: "remote rejected request with status 403".to_string(),
            }),
        ],
        3,
    )
}

#[test]
fn test_json_report_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");
    let report = sample_report();

    let format = write_report(&report, &path).unwrap();
    assert_eq!(format, ReportFormat::Json);

    let contents = std::fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(value["stats"]["totalCategories"], 3);
    assert_eq!(value["stats"]["categoriesWithBids"], 1);
    assert_eq!(value["stats"]["totalBids"], 3);
    assert_eq!(value["categories"][0]["category_id"], "home_clou");
    assert_eq!(value["categories"][0]["bids"][1]["department"], Value::Null);
    assert_eq!(value["failedCategories"][0]["category_id"], "printer");
    assert_eq!(value["failedCategories"][0]["page"], 2);

    let parsed: Report = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn test_csv_report_has_one_row_per_bid() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.csv");

    let format = write_report(&sample_report(), &path).unwrap();
    assert_eq!(format, ReportFormat::Csv);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["category_name", "category_id", "id", "bid_number", "quantity", "end_date", "department"]
    );

    let records: Vec<_> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get(2), Some("1"));
    assert_eq!(records[1].get(4), Some("20"));
    assert_eq!(records[1].get(6), Some(""));
}

#[test]
fn test_document_saved_under_its_filename() {
    let temp_dir = TempDir::new().unwrap();
    let document = Document {
        filename: "GEM_2025_B_1.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4"),
    };

    let path = write_document(&document, &temp_dir.path().join("docs")).unwrap();

    assert_eq!(path, temp_dir.path().join("docs").join("GEM_2025_B_1.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
}
