use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curated category: its name and the link fragments that make up its listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub links: Vec<String>,
}

/// One sale as it appears in the item page's sales table, unparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub price: String,
    pub date: String,
    pub time: String,
}

/// Everything scraped from one item detail page.
///
/// `category` is attached by the orchestrator after extraction; the extractor
/// itself leaves it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub product_name: String,
    pub product_ticker: String,
    pub sales: Vec<Sale>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

/// Per-item aggregate written to the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRow {
    pub product_name: String,
    pub product_ticker: String,
    pub category: String,
    pub release_date: Option<String>,
    pub sale_count: usize,
    pub average_sale_price: Option<f64>,
}
