use tracing::{debug, info};

use crate::browser::Page;
use crate::config::Config;
use crate::error::Result;
use crate::html;

/// Collects every item link of one category listing, page by page.
///
/// Links come back in page-then-document order with duplicates preserved.
pub async fn collect_item_links<P: Page>(
    page: &P,
    config: &Config,
    link: &str,
) -> Result<Vec<String>> {
    let selectors = &config.selectors;
    let path = config.category_url(link);

    page.goto(&path).await?;
    page.click(&selectors.modal_close).await?;

    let first_source = page.source().await?;
    let last_page = html::last_page(&first_source, &selectors.pagination_button)?;
    info!(link, last_page, "Crawling category");

    let mut item_hrefs = Vec::new();
    let mut source = first_source;
    for page_no in 1..=last_page {
        let page_url = if page_no == 1 { path.clone() } else { format!("{path}?page={page_no}") };
        if page_no > 1 {
            page.goto(&page_url).await?;
            page.click(&selectors.modal_close).await?;
            source = page.source().await?;
        }

        let hrefs = html::tile_hrefs(&source, &page_url, selectors)?;
        debug!(link, page_no, found = hrefs.len(), "Collected tiles");
        item_hrefs.extend(hrefs);
    }

    Ok(item_hrefs)
}
