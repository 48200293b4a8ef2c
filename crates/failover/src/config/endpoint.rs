use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use urlencoding::encode;

/// Where and how an HTTP source reads a quote.
///
/// `url` is a template; `{symbol}` is replaced by the percent-encoded
/// provider symbol. Field
/// locations are JSON pointers (RFC 6901) into the response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEndpoint {
    pub url: String,

    pub price_pointer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close_pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent_pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_pointer: Option<String>,

    /// Extra request headers (auth tokens, user agent).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Symbol translation, e.g. `NIFTY` -> `^NSEI`. Unmapped symbols are sent as-is.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub symbols: BTreeMap<String, String>,
}

impl HttpEndpoint {
    /// Endpoint reading only the price; optional pointers start unset.
    pub fn new(url: impl Into<String>, price_pointer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            price_pointer: price_pointer.into(),
            previous_close_pointer: None,
            change_pointer: None,
            change_percent_pointer: None,
            open_pointer: None,
            high_pointer: None,
            low_pointer: None,
            headers: BTreeMap::new(),
            symbols: BTreeMap::new(),
        }
    }

    /// Provider-side spelling of `symbol`.
    pub fn provider_symbol<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.symbols.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    /// Request URL for `symbol`, with the provider symbol percent-encoded
    /// so it stays a single path segment or query value.
    pub fn url_for(&self, symbol: &str) -> String {
        self.url
            .replace("{symbol}", &encode(self.provider_symbol(symbol)))
    }
}
