use chrono::Utc;
use tracing::{debug, info};

use crate::browser::Page;
use crate::config::Config;
use crate::error::Result;
use crate::html;
use crate::models::ItemDetail;

/// Opens an item page and reads its sale history.
///
/// The page is scrolled to the bottom so lazy content renders, and the
/// "show more" button is clicked once if present. The returned record has no
/// category yet.
pub async fn extract_detail<P: Page>(page: &P, config: &Config, link: &str) -> Result<ItemDetail> {
    let selectors = &config.selectors;

    page.goto(link).await?;
    page.scroll_to_bottom().await?;
    if page.click_if_present(&selectors.show_more).await? {
        debug!(link, "Expanded sales table");
    }

    let source = page.source().await?;
    let mut detail = html::item_detail(&source, link, selectors)?;
    detail.scraped_at = Some(Utc::now());

    info!(link, name = detail.product_name.trim(), sales = detail.sales.len(), "Extracted item");
    Ok(detail)
}
