pub mod browser;
pub mod clean;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod html;
pub mod models;
pub mod pipeline;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
