pub mod config;
pub mod dom;
pub mod extract;
pub mod parser;
pub mod payload;
pub mod pipeline;
pub mod scraper;
pub mod types;

pub use config::Config;
pub use payload::Payload;
pub use pipeline::{RunError, run, run_html};
pub use scraper::{ScraperError, WebScraper};
