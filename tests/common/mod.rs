#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use funko_sales::browser::Page;
use funko_sales::{Config, Error, Result};
use scraper::{Html, Selector};

/// Serves fixed HTML per URL and records what the workflow did with it.
#[derive(Default)]
pub struct FakePage {
    pages: HashMap<String, String>,
    current: RefCell<String>,
    pub visits: RefCell<Vec<String>>,
    pub clicks: RefCell<Vec<String>>,
    pub scrolls: RefCell<usize>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }

    fn current_html(&self) -> String {
        let url = self.current.borrow();
        self.pages.get(url.as_str()).cloned().unwrap_or_default()
    }
}

impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
                reason: "no fixture".to_string(),
            });
        }
        *self.current.borrow_mut() = url.to_string();
        self.visits.borrow_mut().push(url.to_string());
        Ok(())
    }

    async fn click(&self, css: &str) -> Result<()> {
        if self.click_if_present(css).await? {
            Ok(())
        } else {
            Err(Error::ElementNotFound {
                selector: css.to_string(),
                url: self.current.borrow().clone(),
            })
        }
    }

    async fn click_if_present(&self, css: &str) -> Result<bool> {
        let selector = Selector::parse(css).map_err(|_| Error::InvalidSelector(css.to_string()))?;
        let found = Html::parse_document(&self.current_html()).select(&selector).next().is_some();
        if found {
            self.clicks.borrow_mut().push(css.to_string());
        }
        Ok(found)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        *self.scrolls.borrow_mut() += 1;
        Ok(())
    }

    async fn source(&self) -> Result<String> {
        Ok(self.current_html())
    }
}

pub const MODAL: &str =
    r#"<div id="chakra-modal-1"><button class="chakra-modal__close-btn">close</button></div>"#;

/// A listing page with the location modal, optional pagination and tiles.
pub fn listing(pages: u32, hrefs: &[&str]) -> String {
    let buttons: String = (1..=pages)
        .filter(|_| pages > 1)
        .map(|n| format!(r#"<a class="css-1sg3yt8-PaginationButton">{n}</a>"#))
        .collect();
    let tiles: String = hrefs
        .iter()
        .map(|h| format!(r#"<div class="tile browse-tile"><a href="{h}">item</a></div>"#))
        .collect();
    format!("<html><body>{MODAL}{tiles}<nav>{buttons}</nav></body></html>")
}

/// An item page with the given sale prices.
pub fn item_page(name: &str, prices: &[&str], show_more: bool) -> String {
    let rows: String = prices
        .iter()
        .map(|p| format!("<tr><td>{p}</td><td>Mar 3, 2024</td><td>8:00 PM</td></tr>"))
        .collect();
    let button = if show_more { "<button class='btn'>View more</button>" } else { "" };
    format!(
        r#"<html><body>
            <h1 data-testid="product-name">{name}</h1>
            <span data-testid="product-ticker">{name}-T</span>
            <span data-testid="product-detail-release date"> 2021 </span>
            <table><tbody>{rows}</tbody></table>{button}
        </body></html>"#
    )
}

pub const HOME: &str = "https://home.test/";

pub fn test_config(dir: &Path) -> Config {
    Config {
        home_url: HOME.to_string(),
        cookie_path: None,
        category_url_template: "https://stockx.test/funko-pop/{}".to_string(),
        categories_path: dir.join("categories.json"),
        item_links_path: dir.join("item_links.json"),
        item_details_path: dir.join("item_details.json"),
        cleaned_csv_path: dir.join("data.csv"),
        skip_item_links: false,
        skip_item_details: false,
        item_delay_ms: 0,
        settle_delay_ms: 0,
        ..Config::default()
    }
}
