use crate::config::{Config, Headings};
use crate::dom::HtmlPage;
use crate::extract::{ExtractError, extract_payload};
use crate::payload::Payload;
use crate::scraper::{ScraperError, WebScraper};
use crate::types::SchemaVersion;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Extraction failed: {0}")]
    ExtractError(#[from] ExtractError),
    #[error("{0}")]
    ScraperError(#[from] ScraperError),
}

/// Parses a rendered page snapshot and extracts a validated payload from it.
pub fn extract_html(
    html: &str,
    headings: &Headings,
    schema: SchemaVersion,
) -> Result<Payload, ExtractError> {
    let page = HtmlPage::parse(html);
    extract_payload(&page, headings, schema)
}

/// Fetches the configured page and extracts the payload without delivering it.
pub async fn collect(scraper: &WebScraper, config: &Config) -> Result<Payload, RunError> {
    let html = scraper
        .fetch_page(&config.page_url, config.page_timeout)
        .await?;
    Ok(extract_html(&html, &config.headings, config.schema)?)
}

async fn deliver_payload(
    scraper: &WebScraper,
    config: &Config,
    payload: Payload,
) -> Result<Payload, RunError> {
    if config.verbose {
        log::info!("Extracted payload:\n{}", payload);
    }
    scraper
        .deliver(
            &config.endpoint_url,
            &config.token,
            &payload,
            config.delivery_timeout,
        )
        .await?;
    Ok(payload)
}

/// One pull-transform-validate-emit cycle. Nothing is sent unless extraction fully succeeds.
pub async fn run(config: &Config) -> Result<Payload, RunError> {
    log::debug!("Starting run with {:?}", config);
    let scraper = WebScraper::new()?;
    let payload = collect(&scraper, config).await?;
    deliver_payload(&scraper, config, payload).await
}

/// Same cycle as [`run`] over a page already rendered by the caller, e.g. a headless browser
/// snapshot. `config.page_url` is only used to describe where the page came from.
pub async fn run_html(config: &Config, html: &str) -> Result<Payload, RunError> {
    log::debug!("Starting run on rendered page with {:?}", config);
    let scraper = WebScraper::new()?;
    let payload = extract_html(html, &config.headings, config.schema)?;
    deliver_payload(&scraper, config, payload).await
}
