//! Generic HTTP/JSON source.
//!
//! Fetches a configured URL and reads quote fields from the JSON body through
//! JSON pointers. Providers with a plain "GET returns JSON" API can be wired
//! from configuration alone; anything needing a handshake implements
//! [`SourceClient`] directly.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::HttpEndpoint;
use crate::errors::SourceError;
use crate::models::Quote;
use crate::source::SourceClient;

/// HTTP source reading quotes through JSON pointers.
pub struct HttpJsonSource {
    name: String,
    client: Client,
    endpoint: HttpEndpoint,
}

impl HttpJsonSource {
    /// Source with its own HTTP client.
    pub fn new(name: impl Into<String>, endpoint: HttpEndpoint) -> Self {
        Self::with_client(name, endpoint, Client::new())
    }

    /// Share one connection pool across sources.
    pub fn with_client(name: impl Into<String>, endpoint: HttpEndpoint, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
            endpoint,
        }
    }

    fn map_transport_error(&self, error: reqwest::Error, timeout: Duration) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout {
                source_name: self.name.clone(),
                timeout,
            }
        } else if error.is_decode() {
            SourceError::protocol(&self.name, error.to_string())
        } else {
            SourceError::network(&self.name, error.to_string())
        }
    }

    fn map_status(&self, status: StatusCode) -> SourceError {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            SourceError::unavailable(&self.name, format!("HTTP {}", status.as_u16()))
        } else {
            SourceError::protocol(&self.name, format!("HTTP {}", status.as_u16()))
        }
    }

    /// Build a quote from a response body.
    pub fn parse_body(&self, symbol: &str, body: &Value) -> Result<Quote, SourceError> {
        let endpoint = &self.endpoint;

        let price = decimal_at(body, &endpoint.price_pointer).ok_or_else(|| {
            SourceError::protocol(
                &self.name,
                format!("missing or non-numeric price at {}", endpoint.price_pointer),
            )
        })?;

        let mut quote = Quote::new(symbol, price, &self.name);

        let change = optional_decimal(body, endpoint.change_pointer.as_deref());
        let change_percent = optional_decimal(body, endpoint.change_percent_pointer.as_deref());
        if let (Some(change), Some(change_percent)) = (change, change_percent) {
            quote = quote.with_change(change, change_percent);
        } else if let Some(previous_close) =
            optional_decimal(body, endpoint.previous_close_pointer.as_deref())
        {
            quote = quote.with_previous_close(previous_close);
        }

        let open = optional_decimal(body, endpoint.open_pointer.as_deref());
        let high = optional_decimal(body, endpoint.high_pointer.as_deref());
        let low = optional_decimal(body, endpoint.low_pointer.as_deref());
        if let (Some(open), Some(high), Some(low)) = (open, high, low) {
            quote = quote.with_ohlc(open, high, low);
        }

        Ok(quote)
    }
}

fn optional_decimal(body: &Value, pointer: Option<&str>) -> Option<Decimal> {
    pointer.and_then(|p| decimal_at(body, p))
}

/// Read a number, or a numeric string, at a JSON pointer.
fn decimal_at(body: &Value, pointer: &str) -> Option<Decimal> {
    match body.pointer(pointer)? {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[async_trait]
impl SourceClient for HttpJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, symbol: &str, timeout: Duration) -> Result<Quote, SourceError> {
        let url = self.endpoint.url_for(symbol);
        debug!("{}: GET {}", self.name, url);

        let mut request = self.client.get(&url).timeout(timeout);
        for (key, value) in &self.endpoint.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.map_status(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e, timeout))?;

        self.parse_body(symbol, &body)
    }
}
