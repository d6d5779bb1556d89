use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// A selector matched nothing where a value was required.
    #[error("element not found: `{selector}` on {url}")]
    ElementNotFound { selector: String, url: String },

    #[error("invalid selector {0:?}")]
    InvalidSelector(String),

    #[error("sales row {row} has no cell {column}")]
    MissingCell { row: usize, column: usize },

    #[error("pagination button text is not a page number: {0:?}")]
    PageNumber(String),

    #[error("price is not an integer amount: {0:?}")]
    PriceParse(String),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("webdriver unavailable: {0}")]
    Driver(String),

    #[error("{} does not hold a JSON mapping", .0.display())]
    NotAMapping(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
