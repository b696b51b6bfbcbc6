use std::time::Duration;

use crate::types::SchemaVersion;

pub const PAGE_URL_VAR: &str = "RATESNAP_PAGE_URL";
pub const ENDPOINT_URL_VAR: &str = "RATESNAP_ENDPOINT_URL";
pub const TOKEN_VAR: &str = "RATESNAP_TOKEN";
pub const VERBOSE_VAR: &str = "RATESNAP_VERBOSE";

pub const DEFAULT_TREASURY_HEADING: &str = "U.S. Treasuries";
pub const DEFAULT_SOFR_HEADING: &str = "SOFR Rates";

pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration value {0}")]
    MissingConfiguration(&'static str),
}

/// Visible heading text of each dataset's card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headings {
    pub treasury: String,
    pub sofr: String,
}

impl Default for Headings {
    fn default() -> Self {
        Self {
            treasury: DEFAULT_TREASURY_HEADING.to_string(),
            sofr: DEFAULT_SOFR_HEADING.to_string(),
        }
    }
}

/// Everything one run needs, resolved before any network or extraction work starts.
#[derive(Clone)]
pub struct Config {
    pub page_url: String,
    pub endpoint_url: String,
    pub token: String,
    pub verbose: bool,
    pub schema: SchemaVersion,
    pub headings: Headings,
    pub page_timeout: Duration,
    pub delivery_timeout: Duration,
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingConfiguration(name))
}

impl Config {
    pub fn new(
        page_url: Option<String>,
        endpoint_url: Option<String>,
        token: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            page_url: required(page_url, PAGE_URL_VAR)?,
            endpoint_url: required(endpoint_url, ENDPOINT_URL_VAR)?,
            token: required(token, TOKEN_VAR)?,
            verbose: false,
            schema: SchemaVersion::default(),
            headings: Headings::default(),
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_headings(mut self, headings: Headings) -> Self {
        self.headings = headings;
        self
    }

    pub fn with_timeouts(mut self, page: Duration, delivery: Duration) -> Self {
        self.page_timeout = page;
        self.delivery_timeout = delivery;
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("page_url", &self.page_url)
            .field("endpoint_url", &self.endpoint_url)
            .field("token", &"<redacted>")
            .field("verbose", &self.verbose)
            .field("schema", &self.schema)
            .field("headings", &self.headings)
            .field("page_timeout", &self.page_timeout)
            .field("delivery_timeout", &self.delivery_timeout)
            .finish()
    }
}
