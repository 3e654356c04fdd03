//! HTTP client for the Frankfurter exchange-rate API.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use url::Url;

use super::{RateProvider, RateQuery};
use crate::error::{BudgetError, Result};

/// Base URL of the public Frankfurter API.
const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Path segment requesting the most recent rates.
const LATEST_PATH: &str = "latest";

/// Body of a Frankfurter rates response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatesResponse {
    /// Quoted amount of the base currency.
    pub amount: f64,
    /// Base currency code.
    pub base: String,
    /// Date the rates were published for.
    pub date: NaiveDate,
    /// `amount` of `base` expressed in each requested currency.
    pub rates: HashMap<String, f64>,
}

/// Builder for constructing a [`FrankfurterClient`].
#[derive(Debug)]
pub struct FrankfurterClientBuilder {
    /// Base URL override (for testing or a self-hosted instance).
    base_url: Option<String>,
}

impl FrankfurterClientBuilder {
    /// Overrides the base URL (useful for testing with a mock server).
    #[inline]
    #[must_use]
    pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Url`] if the base URL cannot be parsed.
    /// Returns [`BudgetError::Http`] if the HTTP client fails to build.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<FrankfurterClient> {
        let raw = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        // A trailing slash makes `Url::join` append instead of replace.
        let base_url = if raw.ends_with('/') {
            Url::parse(&raw)?
        } else {
            Url::parse(&format!("{raw}/"))?
        };
        tracing::debug!(base_url = %base_url, "building rate client");
        let http = reqwest::Client::builder().build()?;
        Ok(FrankfurterClient { http, base_url })
    }
}

/// Async client for the Frankfurter exchange-rate API.
///
/// Use [`FrankfurterClient::builder()`] to construct an instance. The
/// client performs exactly one request per lookup: no retries, no cache.
#[derive(Debug, Clone)]
pub struct FrankfurterClient {
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// API base URL, always ending in `/`.
    base_url: Url,
}

impl FrankfurterClient {
    /// Creates a new builder for configuring the client.
    #[inline]
    #[must_use]
    pub const fn builder() -> FrankfurterClientBuilder {
        FrankfurterClientBuilder { base_url: None }
    }

    /// Fetches the rates response for `query`.
    ///
    /// Requests `latest` or the `YYYY-MM-DD` of `query.date`, with `from`,
    /// `to` and `amount` query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns a
    /// non-success status, or the response cannot be deserialized.
    #[tracing::instrument(skip_all, fields(from = %query.from, to = %query.to))]
    pub async fn fetch(&self, query: &RateQuery) -> Result<RatesResponse> {
        let url = self.request_url(query)?;
        tracing::trace!(url = %url, "sending GET request");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");
        if status.is_success() {
            let body = response.text().await?;
            tracing::trace!(body_len = body.len(), "parsing response body");
            serde_json::from_str(&body).map_err(BudgetError::from)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            tracing::debug!(status = status.as_u16(), message = %message, "API error");
            Err(BudgetError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Builds the request URL for `query`.
    fn request_url(&self, query: &RateQuery) -> Result<Url> {
        let path = query
            .date
            .map_or_else(|| LATEST_PATH.to_owned(), |date| date.format("%Y-%m-%d").to_string());
        let mut url = self.base_url.join(&path)?;
        let _pairs = url
            .query_pairs_mut()
            .append_pair("from", query.from.code())
            .append_pair("to", query.to.code())
            .append_pair("amount", &query.amount.to_string());
        Ok(url)
    }
}

impl RateProvider for FrankfurterClient {
    async fn rate(&self, query: RateQuery) -> Result<f64> {
        let response = self.fetch(&query).await?;
        let quoted = response
            .rates
            .get(query.to.code())
            .copied()
            .ok_or_else(|| query.unavailable())?;
        if query.amount > 0.0 {
            Ok(quoted / query.amount)
        } else {
            Err(query.unavailable())
        }
    }
}
