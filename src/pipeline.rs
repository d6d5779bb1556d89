//! Sequences the scrape: categories, item links, item details, CSV export.
//!
//! Progress lives in the JSON stores, so a rerun with the skip flags set picks
//! up where the previous one stopped. The first error ends the run.

use std::collections::HashSet;
use std::path::Path;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::{Page, PageSession};
use crate::clean;
use crate::config::Config;
use crate::crawler;
use crate::error::Result;
use crate::extractor;
use crate::models::Category;
use crate::store;

/// Reads the curated category file: category name to link fragments.
pub fn load_categories(path: &Path) -> Result<Vec<Category>> {
    let map = store::load_mapping(path)?;
    let mut categories = Vec::with_capacity(map.len());
    for (name, links) in map {
        let links: Vec<String> = serde_json::from_value(links)?;
        categories.push(Category { name, links });
    }
    Ok(categories)
}

/// Crawls every link of every category and stores each category's links
/// once the whole category is done.
pub async fn collect_all_item_links<P: Page>(
    page: &P,
    config: &Config,
    categories: &[Category],
) -> Result<()> {
    store::ensure_mapping(&config.item_links_path)?;

    for category in categories {
        let mut category_item_links = Vec::new();
        for link in &category.links {
            let item_links = crawler::collect_item_links(page, config, link).await?;
            category_item_links.extend(item_links);
        }
        info!(
            category = category.name.as_str(),
            links = category_item_links.len(),
            "Category crawled"
        );
        store::merge_entry(&category.name, &category_item_links, &config.item_links_path)?;
    }
    Ok(())
}

/// Extracts every stored item link that has no saved details yet. Returns how
/// many items were extracted in this pass.
///
/// Each item is stored as soon as it is extracted. A link listed under several
/// categories is extracted once and keeps the first category it appears under.
pub async fn collect_all_item_details<P: Page>(page: &P, config: &Config) -> Result<usize> {
    store::ensure_mapping(&config.item_details_path)?;

    let category_to_links = store::load_mapping(&config.item_links_path)?;
    let saved_details = store::load_mapping(&config.item_details_path)?;
    let mut saved: HashSet<String> = saved_details.keys().cloned().collect();
    info!(saved = saved.len(), "Saved item details");

    let mut extracted = 0;
    for (category, links) in category_to_links {
        let links: Vec<String> = serde_json::from_value(links)?;
        for link in links {
            if saved.contains(&link) {
                continue;
            }
            let mut detail = extractor::extract_detail(page, config, &link).await?;
            detail.category = category.clone();
            store::merge_entry(&link, &detail, &config.item_details_path)?;
            saved.insert(link);
            extracted += 1;

            sleep(config.item_delay()).await;
        }
    }
    info!(extracted, total = saved.len(), "Item details collected");
    Ok(extracted)
}

/// Browser phases against an already opened page.
pub async fn scrape_with_page<P: Page>(page: &P, config: &Config) -> Result<()> {
    if page.click_if_present(&config.selectors.modal_close).await? {
        info!("Dismissed location modal");
    }
    sleep(config.settle_delay()).await;

    let categories = load_categories(&config.categories_path)?;
    info!(categories = categories.len(), "Loaded categories");

    if config.skip_item_links {
        info!("Skipping item link collection");
    } else {
        collect_all_item_links(page, config, &categories).await?;
    }

    if config.skip_item_details {
        info!("Skipping item detail collection");
    } else {
        collect_all_item_details(page, config).await?;
    }
    Ok(())
}

/// All phases against an already opened page. Returns the exported row count.
pub async fn run_with_page<P: Page>(page: &P, config: &Config) -> Result<usize> {
    scrape_with_page(page, config).await?;
    clean::clean_and_export(&config.item_details_path, &config.cleaned_csv_path)
}

/// Full run: opens the browser session, scrapes, always closes the session,
/// then exports the cleaned table.
pub async fn run(config: &Config) -> Result<usize> {
    let session = PageSession::open(config).await?;
    let scraped = scrape_with_page(&session, config).await;
    let closed = session.close().await;

    if let Err(e) = &closed {
        if scraped.is_err() {
            warn!(error = %e, "Failed to close browser");
        }
    }
    scraped?;
    closed?;

    clean::clean_and_export(&config.item_details_path, &config.cleaned_csv_path)
}
