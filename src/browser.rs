//! Browser session: a Chrome instance driven over WebDriver.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, WebDriverConfig};
use crate::error::{Error, Result};

/// The page operations the scraping workflow relies on.
#[allow(async_fn_in_trait)]
pub trait Page {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Clicks the first element matching `css`; an absent element is an error.
    async fn click(&self, css: &str) -> Result<()>;

    /// Clicks the first element matching `css` if there is one.
    async fn click_if_present(&self, css: &str) -> Result<bool>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current rendered document.
    async fn source(&self) -> Result<String>;
}

/// One entry of a cookie export file.
///
/// Accepts both the devtools shape (`expires`) and the browser-extension shape
/// (`expirationDate`, lowercase `sameSite` values).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub same_site: Option<String>,
}

impl StoredCookie {
    /// Parameters for `Network.setCookie`. Session cookies (no or non-positive
    /// expiry) and unrecognised `sameSite` values are left out.
    pub fn to_cdp_params(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), json!(self.name));
        map.insert("value".into(), json!(self.value));

        if let Some(url) = &self.url {
            map.insert("url".into(), json!(url));
        }
        if let Some(domain) = &self.domain {
            map.insert("domain".into(), json!(domain));
        }
        if let Some(path) = &self.path {
            map.insert("path".into(), json!(path));
        }
        if let Some(expires) = self.expires.filter(|e| *e > 0.0) {
            map.insert("expires".into(), json!(expires));
        }
        if let Some(http_only) = self.http_only {
            map.insert("httpOnly".into(), json!(http_only));
        }
        if let Some(secure) = self.secure {
            map.insert("secure".into(), json!(secure));
        }
        let same_site = self.same_site.as_deref().and_then(|s| {
            match s.to_ascii_lowercase().as_str() {
                "strict" => Some("Strict"),
                "lax" => Some("Lax"),
                "none" | "no_restriction" => Some("None"),
                _ => None,
            }
        });
        if let Some(same_site) = same_site {
            map.insert("sameSite".into(), json!(same_site));
        }
        Value::Object(map)
    }
}

pub fn load_cookies(path: &Path) -> Result<Vec<StoredCookie>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// A live browser session. Call [`PageSession::close`] when done; dropping it
/// only kills a spawned chromedriver.
pub struct PageSession {
    driver: WebDriver,
    chromedriver: Option<Child>,
}

impl PageSession {
    /// Launches the browser, applies page settings and cookies, then opens
    /// `config.home_url`.
    pub async fn open(config: &Config) -> Result<Self> {
        let chromedriver = match &config.webdriver.url {
            Some(_) => None,
            None => Some(spawn_chromedriver(&config.webdriver)?),
        };
        let server_url = config.webdriver.server_url();
        let startup_timeout = Duration::from_millis(config.webdriver.startup_timeout_ms);
        wait_until_ready(&server_url, startup_timeout).await?;

        let executable = config.executables.for_host();
        let mut caps = DesiredCapabilities::chrome();
        caps.set_binary(&executable.to_string_lossy())?;
        let viewport = &config.viewport;
        caps.add_arg(&format!("--window-size={},{}", viewport.width, viewport.height))?;
        caps.add_arg("--incognito")?;
        if config.headless {
            caps.set_headless()?;
        }

        info!(
            server = %server_url,
            executable = %executable.display(),
            headless = config.headless,
            "Launching browser"
        );
        let driver = WebDriver::new(server_url.as_str(), caps).await?;
        let session = Self { driver, chromedriver };

        if let Err(e) = session.prepare(config).await {
            if let Err(close_err) = session.close().await {
                warn!(error = %close_err, "Failed to close browser after setup error");
            }
            return Err(e);
        }
        Ok(session)
    }

    async fn prepare(&self, config: &Config) -> Result<()> {
        let dev_tools = ChromeDevTools::new(self.driver.handle.clone());

        let geo = &config.geolocation;
        dev_tools
            .execute_cdp_with_params(
                "Emulation.setGeolocationOverride",
                json!({
                    "accuracy": geo.accuracy,
                    "latitude": geo.latitude,
                    "longitude": geo.longitude,
                }),
            )
            .await?;

        dev_tools.execute_cdp("Network.enable").await?;
        tokio::try_join!(
            dev_tools.execute_cdp_with_params(
                "Emulation.setScriptExecutionDisabled",
                json!({ "value": false }),
            ),
            dev_tools.execute_cdp_with_params(
                "Network.setCacheDisabled",
                json!({ "cacheDisabled": true }),
            ),
            dev_tools.execute_cdp_with_params(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": config.viewport.width,
                    "height": config.viewport.height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                }),
            ),
        )?;

        if let Some(cookie_path) = &config.cookie_path {
            let cookies = load_cookies(cookie_path)?;
            info!(count = cookies.len(), path = %cookie_path.display(), "Applying cookies");
            for cookie in &cookies {
                dev_tools
                    .execute_cdp_with_params("Network.setCookie", cookie.to_cdp_params())
                    .await?;
            }
        }

        self.goto(&config.home_url).await
    }

    /// Ends the WebDriver session and stops chromedriver if this session spawned it.
    pub async fn close(self) -> Result<()> {
        let Self { driver, chromedriver } = self;
        let quit = driver.quit().await;
        if let Some(mut child) = chromedriver {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to stop chromedriver");
            }
        }
        info!("Browser closed");
        Ok(quit?)
    }
}

impl Page for PageSession {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn click(&self, css: &str) -> Result<()> {
        if self.click_if_present(css).await? {
            Ok(())
        } else {
            let url = self.driver.current_url().await?;
            Err(Error::ElementNotFound {
                selector: css.to_string(),
                url: url.to_string(),
            })
        }
    }

    async fn click_if_present(&self, css: &str) -> Result<bool> {
        let elements = self.driver.find_all(By::Css(css)).await?;
        match elements.into_iter().next() {
            Some(element) => {
                element.click().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await?;
        Ok(())
    }

    async fn source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }
}

fn spawn_chromedriver(cfg: &WebDriverConfig) -> Result<Child> {
    info!(path = %cfg.chromedriver_path.display(), port = cfg.port, "Starting chromedriver");
    let child = Command::new(&cfg.chromedriver_path)
        .arg(format!("--port={}", cfg.port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    Ok(child)
}

/// Polls the WebDriver `/status` endpoint until it answers or `timeout` passes.
async fn wait_until_ready(server_url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .map_err(|e| Error::Driver(e.to_string()))?;
    let status_url = format!("{server_url}/status");
    let started = Instant::now();

    loop {
        let last_error = match client.get(&status_url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => format!("status {}", resp.status()),
            Err(e) => e.to_string(),
        };
        if started.elapsed() >= timeout {
            return Err(Error::Driver(format!(
                "{status_url} not ready after {timeout:?}: {last_error}"
            )));
        }
        sleep(Duration::from_millis(250)).await;
    }
}
