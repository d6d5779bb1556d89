//! Turns stored item details into the flat CSV summary.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{CleanedRow, ItemDetail};
use crate::store;

/// Parses a currency-formatted whole amount such as `"$1,234"`.
pub fn parse_price(raw: &str) -> Result<i128> {
    let digits: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    digits.trim().parse().map_err(|_| Error::PriceParse(raw.to_string()))
}

/// Aggregates one item. Items without sales still get a row here, with no
/// average; [`clean_details`] drops them.
pub fn clean_item(detail: &ItemDetail) -> Result<CleanedRow> {
    let sale_count = detail.sales.len();
    let average_sale_price = if sale_count > 0 {
        let mut sum: i128 = 0;
        for sale in &detail.sales {
            sum = sum
                .checked_add(parse_price(&sale.price)?)
                .ok_or_else(|| Error::PriceParse(sale.price.clone()))?;
        }
        Some(sum as f64 / sale_count as f64)
    } else {
        None
    };

    Ok(CleanedRow {
        product_name: detail.product_name.trim().to_string(),
        product_ticker: detail.product_ticker.trim().to_string(),
        category: detail.category.clone(),
        release_date: detail.release_date.clone(),
        sale_count,
        average_sale_price,
    })
}

/// Rows for every stored item that has at least one sale, in store order.
pub fn clean_details(details: &Map<String, Value>) -> Result<Vec<CleanedRow>> {
    let mut rows = Vec::with_capacity(details.len());
    for (link, value) in details {
        let detail: ItemDetail = serde_json::from_value(value.clone())?;
        let row = clean_item(&detail)?;
        if row.sale_count == 0 {
            debug!(link = link.as_str(), "Dropping item without sales");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_csv(rows: &[CleanedRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record([
            "product_name",
            "product_ticker",
            "category",
            "release_date",
            "sale_count",
            "average_sale_price",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the item-details store and writes the cleaned table. Returns the
/// number of exported rows.
pub fn clean_and_export(details_path: &Path, csv_path: &Path) -> Result<usize> {
    let details = store::load_mapping(details_path)?;
    let rows = clean_details(&details)?;
    write_csv(&rows, csv_path)?;
    info!(
        items = details.len(),
        exported = rows.len(),
        path = %csv_path.display(),
        "Exported cleaned data"
    );
    Ok(rows.len())
}
