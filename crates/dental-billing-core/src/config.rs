//! Session configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound for an uploaded clinic logo (2 MiB).
pub const DEFAULT_MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

/// Default backup file name offered by the export action.
pub const DEFAULT_EXPORT_FILE: &str = "dental-hub-data.json";

/// How digits left of the decimal point are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitGrouping {
    /// `1,234,567.00`
    Thousands,
    /// Lakh/crore grouping: `12,34,567.00`
    Indian,
}

impl DigitGrouping {
    /// Grouping customary for an ISO 4217 currency code.
    pub fn for_currency(code: &str) -> Self {
        if code.eq_ignore_ascii_case("INR") {
            DigitGrouping::Indian
        } else {
            DigitGrouping::Thousands
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "thousands" | "western" => Some(DigitGrouping::Thousands),
            "indian" | "lakh" => Some(DigitGrouping::Indian),
            _ => None,
        }
    }
}

/// Display and limit settings for a billing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingConfig {
    /// Symbol prefixed to rendered amounts (e.g. "₹")
    pub currency_symbol: String,
    /// ISO 4217 code shown on statements (e.g. "INR")
    pub currency_code: String,
    /// Digit grouping for rendered amounts
    pub grouping: DigitGrouping,
    /// Largest accepted logo upload in bytes
    pub max_logo_bytes: usize,
    /// File name suggested for backups
    pub export_file_name: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            currency_code: "INR".to_string(),
            grouping: DigitGrouping::Indian,
            max_logo_bytes: DEFAULT_MAX_LOGO_BYTES,
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
        }
    }
}

impl BillingConfig {
    /// Build a config from `DENTAL_BILLING_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_logo_bytes = match lookup("DENTAL_BILLING_MAX_LOGO_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) => limit,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring unparsable DENTAL_BILLING_MAX_LOGO_BYTES");
                    defaults.max_logo_bytes
                }
            },
            None => defaults.max_logo_bytes,
        };

        let currency_code =
            lookup("DENTAL_BILLING_CURRENCY_CODE").unwrap_or(defaults.currency_code);
        let grouping = match lookup("DENTAL_BILLING_DIGIT_GROUPING") {
            Some(raw) => DigitGrouping::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "ignoring unknown DENTAL_BILLING_DIGIT_GROUPING");
                DigitGrouping::for_currency(&currency_code)
            }),
            None => DigitGrouping::for_currency(&currency_code),
        };

        Self {
            currency_symbol: lookup("DENTAL_BILLING_CURRENCY_SYMBOL")
                .unwrap_or(defaults.currency_symbol),
            currency_code,
            grouping,
            max_logo_bytes,
            export_file_name: lookup("DENTAL_BILLING_EXPORT_FILE")
                .unwrap_or(defaults.export_file_name),
        }
    }

    /// Render an amount with the currency symbol, digit grouping and
    /// exactly two decimals.
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{}", self.currency_symbol, self.format_number(amount))
    }

    /// Grouped two-decimal amount without the currency symbol.
    pub fn format_number(&self, amount: f64) -> String {
        format_grouped(amount, self.grouping)
    }
}

/// Two-decimal rendering with comma separators
/// (`123456.5` → `123,456.50` or `1,23,456.50`).
pub fn format_grouped(amount: f64, grouping: DigitGrouping) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        let remaining = whole.len() - i;
        let boundary = match grouping {
            DigitGrouping::Thousands => remaining % 3 == 0,
            DigitGrouping::Indian => remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0),
        };
        if i > 0 && boundary {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Negative zero after rounding still prints as 0.00
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
