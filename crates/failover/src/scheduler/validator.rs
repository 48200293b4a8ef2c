//! Quote sanity checks.
//!
//! A source that answers with nonsense has failed just as surely as one that
//! timed out. Hard issues reject the quote as a protocol error, which counts
//! against the source's health and moves the fetch on to the next source.
//! Soft issues are logged and the quote is accepted.

use log::warn;
use rust_decimal::Decimal;

use crate::errors::SourceError;
use crate::models::Quote;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the quote.
    Hard,
    /// Accept the quote but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Reject quotes whose price is zero or negative.
    pub reject_non_positive_price: bool,
    /// Reject quotes where high < low or any OHLC leg is negative.
    pub reject_invalid_ohlc: bool,
    /// Warn above this price.
    pub max_price: Option<Decimal>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_non_positive_price: true,
            reject_invalid_ohlc: true,
            max_price: Some(Decimal::from(1_000_000_000i64)),
        }
    }
}

/// Checks a source's answer before the scheduler accepts it.
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    /// Validator with the default [`ValidatorConfig`].
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Validator with custom rules.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote on its own terms, naming the quote's source in any
    /// error.
    pub fn validate(&self, quote: &Quote) -> Result<(), SourceError> {
        self.validate_for(quote, quote.source(), quote.symbol())
    }

    /// Validate a quote returned by `source_name` for a request for `symbol`.
    ///
    /// A quote stamped with another source or answering another symbol is a
    /// hard issue. Hard issues are joined into a single
    /// [`SourceError::Protocol`] attributed to `source_name`. Soft issues are
    /// only logged.
    pub fn validate_for(
        &self,
        quote: &Quote,
        source_name: &str,
        symbol: &str,
    ) -> Result<(), SourceError> {
        let mut issues = identity_issues(quote, source_name, symbol);
        issues.extend(self.issues(quote));

        let hard: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !hard.is_empty() {
            return Err(SourceError::protocol(
                source_name,
                format!("invalid quote for {}: {}", symbol, hard.join("; ")),
            ));
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Quote validation warning for {} from '{}': {}",
                symbol, source_name, issue.message
            );
        }

        Ok(())
    }

    /// Every issue found in the quote, hard and soft.
    pub fn issues(&self, quote: &Quote) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_price(quote, &mut issues);
        self.check_ohlc(quote, &mut issues);
        self.check_range(quote, &mut issues);
        issues
    }

    fn check_price(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if self.config.reject_non_positive_price && quote.price() <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive price: {}", quote.price()),
            });
        }
    }

    fn check_ohlc(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if !self.config.reject_invalid_ohlc {
            return;
        }

        for (label, value) in [
            ("open", quote.open()),
            ("high", quote.high()),
            ("low", quote.low()),
        ] {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!("Negative {} price: {}", label, v),
                    });
                }
            }
        }

        if let (Some(high), Some(low)) = (quote.high(), quote.low()) {
            if high < low {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("High ({}) is less than Low ({})", high, low),
                });
            } else if quote.price() < low || quote.price() > high {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "Price ({}) is outside High/Low range ({}-{})",
                        quote.price(),
                        low,
                        high
                    ),
                });
            }
        }
    }

    fn check_range(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if let Some(max_price) = self.config.max_price {
            if quote.price() > max_price {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "Price ({}) exceeds max threshold ({})",
                        quote.price(),
                        max_price
                    ),
                });
            }
        }
    }
}

fn identity_issues(quote: &Quote, source_name: &str, symbol: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if quote.source() != source_name {
        issues.push(ValidationIssue {
            severity: ValidationSeverity::Hard,
            message: format!("Quote attributed to '{}'", quote.source()),
        });
    }
    if quote.symbol() != symbol {
        issues.push(ValidationIssue {
            severity: ValidationSeverity::Hard,
            message: format!("Quote is for {}", quote.symbol()),
        });
    }
    issues
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}
