use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single point-in-time reading for a symbol from one source.
///
/// Fields are private: a quote is assembled once by a source client through
/// the consuming `with_*` builders and read-only from then on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    symbol: String,

    /// Last traded price
    price: Decimal,

    /// Absolute change against the previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    change: Option<Decimal>,

    /// Percentage change against the previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    change_percent: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    low: Option<Decimal>,

    /// Name of the source that produced the quote
    source: String,

    timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote carrying only the last price, stamped now.
    pub fn new(symbol: impl Into<String>, price: Decimal, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change: None,
            change_percent: None,
            open: None,
            high: None,
            low: None,
            source: source.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_change(mut self, change: Decimal, change_percent: Decimal) -> Self {
        self.change = Some(change);
        self.change_percent = Some(change_percent);
        self
    }

    pub fn with_ohlc(mut self, open: Decimal, high: Decimal, low: Decimal) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    /// Derive change and change percent from the previous close.
    ///
    /// Leaves both unset when `previous_close` is zero.
    pub fn with_previous_close(self, previous_close: Decimal) -> Self {
        if previous_close.is_zero() {
            return self;
        }
        let change = self.price - previous_close;
        let change_percent = (change / previous_close * Decimal::ONE_HUNDRED).round_dp(4);
        self.with_change(change, change_percent)
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn change(&self) -> Option<Decimal> {
        self.change
    }

    pub fn change_percent(&self) -> Option<Decimal> {
        self.change_percent
    }

    pub fn open(&self) -> Option<Decimal> {
        self.open
    }

    pub fn high(&self) -> Option<Decimal> {
        self.high
    }

    pub fn low(&self) -> Option<Decimal> {
        self.low
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
