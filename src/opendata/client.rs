//! Open-data feed client.
//!
//! HTTP client for the municipal restaurant inspection endpoint. A non-success
//! status is surfaced as a typed error rather than an empty batch, and every
//! request carries an explicit timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::SourceError;
use crate::opendata::types::RawRestaurantRecord;

const OPEN_DATA_URL: &str = "https://data.cityofnewyork.us/resource/43nn-pn8j.json";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capability to fetch a batch of raw restaurant records, optionally narrowed
/// by name server-side.
#[async_trait]
pub trait RestaurantSource: Send + Sync {
    async fn fetch(&self, name: Option<&str>) -> Result<Vec<RawRestaurantRecord>, SourceError>;
}

pub struct OpenDataClient {
    http: Client,
    base_url: String,
}

impl OpenDataClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(OPEN_DATA_URL)
    }

    /// Create a client against a non-default endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a client honoring the `OPEN_DATA_URL` environment variable.
    pub fn from_env() -> Result<Self, SourceError> {
        match std::env::var("OPEN_DATA_URL") {
            Ok(url) => Self::with_base_url(url),
            Err(_) => Self::new(),
        }
    }
}

#[async_trait]
impl RestaurantSource for OpenDataClient {
    async fn fetch(&self, name: Option<&str>) -> Result<Vec<RawRestaurantRecord>, SourceError> {
        let mut request = self.http.get(&self.base_url);
        if let Some(name) = name {
            request = request.query(&[("dba", name)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { status });
        }

        Ok(response.json().await?)
    }
}
