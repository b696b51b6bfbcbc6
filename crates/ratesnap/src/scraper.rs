use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::payload::Payload;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Ingestion endpoint answered {status}: {body}")]
    DeliveryError { status: StatusCode, body: String },
}

/// HTTP side of a run: pulls the rendered page and pushes the payload.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, ScraperError> {
        log::info!("Fetching rates page {}...", url);
        Ok(self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }

    /// POSTs the payload once. Any non-2xx answer is returned with its body untouched.
    pub async fn deliver(
        &self,
        endpoint: &str,
        token: &str,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        log::info!("Delivering payload to {}...", endpoint);
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                log::warn!("Could not read rejection body: {e}");
                String::new()
            });
            log::error!("Delivery rejected with {}: {}", status, body);
            return Err(ScraperError::DeliveryError { status, body });
        }

        log::info!("Payload accepted ({})", status);
        Ok(())
    }
}
