use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Runtime settings for a scraping run.
///
/// Every field has a default, so a config file only needs the keys it changes
/// and running without one reproduces the stock run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page the session opens on before any category is visited.
    pub home_url: String,
    pub headless: bool,
    pub cookie_path: Option<PathBuf>,
    /// Category listing URL; `{}` is replaced by the category link fragment.
    pub category_url_template: String,

    pub categories_path: PathBuf,
    pub item_links_path: PathBuf,
    pub item_details_path: PathBuf,
    pub cleaned_csv_path: PathBuf,

    pub skip_item_links: bool,
    pub skip_item_details: bool,

    /// Pause after each extracted item.
    pub item_delay_ms: u64,
    /// Pause after the home page is loaded and its modal dismissed.
    pub settle_delay_ms: u64,

    pub webdriver: WebDriverConfig,
    pub executables: ExecutablePaths,
    pub geolocation: Geolocation,
    pub viewport: Viewport,
    pub selectors: Selectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_url: "https://google.com".to_string(),
            headless: false,
            cookie_path: Some(PathBuf::from("stockx_cookie_en.json")),
            category_url_template: "https://stockx.com/funko-pop/{}".to_string(),
            categories_path: PathBuf::from("funko_pop_categories.json"),
            item_links_path: PathBuf::from("funko_pop_item_links.json"),
            item_details_path: PathBuf::from("funko_pop_item_details.json"),
            cleaned_csv_path: PathBuf::from("data2.csv"),
            skip_item_links: true,
            skip_item_details: true,
            item_delay_ms: 5000,
            settle_delay_ms: 1000,
            webdriver: WebDriverConfig::default(),
            executables: ExecutablePaths::default(),
            geolocation: Geolocation::default(),
            viewport: Viewport::default(),
            selectors: Selectors::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn category_url(&self, link: &str) -> String {
        self.category_url_template.replacen("{}", link, 1)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Connect to an already running WebDriver server instead of spawning one.
    pub url: Option<String>,
    pub chromedriver_path: PathBuf,
    pub port: u16,
    /// How long to wait for a spawned chromedriver to answer `/status`.
    pub startup_timeout_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: None,
            chromedriver_path: PathBuf::from("chromedriver"),
            port: 9515,
            startup_timeout_ms: 10_000,
        }
    }
}

impl WebDriverConfig {
    pub fn server_url(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }
}

/// Browser executable per host OS family. Only Linux and Windows are known;
/// every non-Linux host gets the Windows path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutablePaths {
    pub linux: PathBuf,
    pub windows: PathBuf,
}

impl Default for ExecutablePaths {
    fn default() -> Self {
        Self {
            linux: PathBuf::from("/usr/bin/google-chrome"),
            windows: PathBuf::from(
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ),
        }
    }
}

impl ExecutablePaths {
    pub fn for_os(&self, os: &str) -> &Path {
        if os == "linux" { &self.linux } else { &self.windows }
    }

    pub fn for_host(&self) -> &Path {
        self.for_os(std::env::consts::OS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl Default for Geolocation {
    fn default() -> Self {
        Self {
            latitude: 40.7128,
            longitude: 74.0060,
            accuracy: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 1440,
        }
    }
}

/// CSS selectors describing the site's current markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub modal_close: String,
    pub pagination_button: String,
    pub tile: String,
    pub tile_anchor: String,
    pub product_name: String,
    pub product_ticker: String,
    pub show_more: String,
    pub sales_rows: String,
    pub sales_cell: String,
    pub release_date: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            modal_close: "#chakra-modal-1 .chakra-modal__close-btn".to_string(),
            pagination_button: r#"a[class="css-1sg3yt8-PaginationButton"]"#.to_string(),
            tile: ".tile.browse-tile".to_string(),
            tile_anchor: "a".to_string(),
            product_name: r#"h1[data-testid="product-name"]"#.to_string(),
            product_ticker: r#"span[data-testid="product-ticker"]"#.to_string(),
            show_more: "button[class='btn']".to_string(),
            sales_rows: "table tbody tr".to_string(),
            sales_cell: "td".to_string(),
            release_date: r#"span[data-testid="product-detail-release date"]"#.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_url_interpolates_link() {
        let cfg = Config::default();
        assert_eq!(cfg.category_url("marvel"), "https://stockx.com/funko-pop/marvel");
    }

    #[test]
    fn executable_path_branches_on_os_family() {
        let paths = ExecutablePaths::default();
        assert_eq!(paths.for_os("linux"), Path::new("/usr/bin/google-chrome"));
        assert_eq!(paths.for_os("windows"), paths.windows.as_path());
        assert_eq!(paths.for_os("macos"), paths.windows.as_path());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{"skip_item_links": false, "selectors": {"tile": ".card"}}"#,
        )
        .unwrap();
        assert!(!cfg.skip_item_links);
        assert!(cfg.skip_item_details);
        assert_eq!(cfg.selectors.tile, ".card");
        assert_eq!(cfg.selectors.tile_anchor, "a");
        assert_eq!(cfg.viewport.width, 1440);
    }

    #[test]
    fn external_webdriver_url_wins_over_port() {
        let mut wd = WebDriverConfig::default();
        assert_eq!(wd.server_url(), "http://localhost:9515");
        wd.url = Some("http://grid:4444/".to_string());
        assert_eq!(wd.server_url(), "http://grid:4444");
    }
}
