//! HTTP client for the A-share market data gateway.

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    types::{Constituent, DailyBar, Security, StatementCategory, StatementTable},
    Error,
};

/// HTTP client for a Baostock-style market data gateway.
///
/// Each request builds a fresh `reqwest::Client` with a 30-second timeout.
/// The gateway is typically a local sidecar, so the default base URL points
/// at loopback; override it with [`Client::with_base_url`].
pub struct Client {
    /// Base URL for the gateway. Defaults to `http://127.0.0.1:8686`.
    base_api_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at a locally running gateway.
    pub fn new() -> Self {
        Self {
            base_api_url: "http://127.0.0.1:8686".to_string(),
        }
    }

    /// Creates a new client with a custom base URL. Also used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_api_url: base_url.to_string(),
        }
    }

    fn get_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, Error> {
        let mut url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        for (key, value) in params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    async fn get<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.get_url(path, params)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let resp = client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::RequestFailed
        })?;

        Ok(parsed)
    }

    /// Fetches forward-adjusted daily bars for one instrument over an
    /// inclusive date range. An empty result is valid and means the range
    /// contains no trading days.
    pub async fn get_daily_bars(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, Error> {
        self.get::<Vec<DailyBar>>(
            format!("/v1/daily/{}", code).as_str(),
            &[
                ("start", start.format("%Y-%m-%d").to_string()),
                ("end", end.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }

    /// Fetches the current CSI 500 membership list.
    pub async fn get_csi500_constituents(&self) -> Result<Vec<Constituent>, Error> {
        self.get::<Vec<Constituent>>("/v1/index/csi500", &[]).await
    }

    /// Fetches the full-market security list.
    pub async fn get_all_securities(&self) -> Result<Vec<Security>, Error> {
        self.get::<Vec<Security>>("/v1/securities", &[]).await
    }

    /// Fetches one statement category for an instrument and fiscal quarter.
    /// An empty table means the instrument reported nothing in that category
    /// for the period.
    pub async fn get_statement(
        &self,
        category: StatementCategory,
        code: &str,
        year: i32,
        quarter: u32,
    ) -> Result<StatementTable, Error> {
        self.get::<StatementTable>(
            format!("/v1/financials/{}/{}", category.as_str(), code).as_str(),
            &[("year", year.to_string()), ("quarter", quarter.to_string())],
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}...[truncated]", &body[..MAX])
    }
}
