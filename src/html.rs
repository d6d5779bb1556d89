//! Extraction over a rendered page's source.
//!
//! The browser only navigates and clicks; everything read from the page goes
//! through these functions so the markup contract lives in one place.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::config::Selectors;
use crate::error::{Error, Result};
use crate::models::{ItemDetail, Sale};

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| Error::InvalidSelector(css.to_string()))
}

/// Concatenated text nodes of an element, the way `textContent` reads them.
fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn required_text(document: &Html, css: &str, url: &str) -> Result<String> {
    let selector = parse_selector(css)?;
    document
        .select(&selector)
        .next()
        .map(text_content)
        .ok_or_else(|| Error::ElementNotFound { selector: css.to_string(), url: url.to_string() })
}

/// Final page index of a category listing.
///
/// A listing without pagination buttons is a single page; otherwise the last
/// button's text is the last page number.
pub fn last_page(html: &str, button_css: &str) -> Result<u32> {
    let document = Html::parse_document(html);
    let selector = parse_selector(button_css)?;

    match document.select(&selector).last() {
        None => Ok(1),
        Some(button) => {
            let text = text_content(button);
            text.trim().parse::<u32>().map_err(|_| Error::PageNumber(text))
        }
    }
}

/// Absolute hrefs of every listing tile, in document order.
///
/// Duplicates are kept.
pub fn tile_hrefs(html: &str, page_url: &str, selectors: &Selectors) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let tile = parse_selector(&selectors.tile)?;
    let anchor = parse_selector(&selectors.tile_anchor)?;
    let base = Url::parse(page_url)
        .map_err(|e| Error::InvalidUrl { url: page_url.to_string(), reason: e.to_string() })?;

    let mut hrefs = Vec::new();
    for element in document.select(&tile) {
        let href = element
            .select(&anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| Error::ElementNotFound {
                selector: format!("{} {}[href]", selectors.tile, selectors.tile_anchor),
                url: page_url.to_string(),
            })?;

        let resolved = base
            .join(href)
            .map_err(|e| Error::InvalidUrl { url: href.to_string(), reason: e.to_string() })?;
        hrefs.push(resolved.to_string());
    }
    Ok(hrefs)
}

/// Reads an item page into an [`ItemDetail`] with an empty category.
pub fn item_detail(html: &str, page_url: &str, selectors: &Selectors) -> Result<ItemDetail> {
    let document = Html::parse_document(html);

    let product_name = required_text(&document, &selectors.product_name, page_url)?;
    let product_ticker = required_text(&document, &selectors.product_ticker, page_url)?;

    let row_selector = parse_selector(&selectors.sales_rows)?;
    let cell_selector = parse_selector(&selectors.sales_cell)?;
    let mut sales = Vec::new();
    for (row_idx, row) in document.select(&row_selector).enumerate() {
        let cells: Vec<String> = row.select(&cell_selector).take(3).map(text_content).collect();
        if cells.len() < 3 {
            return Err(Error::MissingCell { row: row_idx, column: cells.len() });
        }
        let mut cells = cells.into_iter();
        sales.push(Sale {
            price: cells.next().unwrap_or_default(),
            date: cells.next().unwrap_or_default(),
            time: cells.next().unwrap_or_default(),
        });
    }

    let release_selector = parse_selector(&selectors.release_date)?;
    let release_date = document
        .select(&release_selector)
        .next()
        .map(|el| text_content(el).trim().to_string());

    Ok(ItemDetail {
        product_name,
        product_ticker,
        sales,
        release_date,
        category: String::new(),
        scraped_at: None,
    })
}
