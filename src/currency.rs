use serde::{Deserialize, Serialize};

/// Currency amount as the marketplace API expects it: minor units plus an
/// ISO 4217 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn from_major(value: f64, currency: impl Into<String>) -> Self {
        Self::new(to_subunits(value), currency)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_major(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

/// Converts a major-unit amount to rounded minor units.
#[allow(clippy::cast_possible_truncation)]
pub fn to_subunits(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub const PAYMENT_CURRENCIES: [&str; 26] = [
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "INR",
    "JPY", "MXN", "MYR", "NOK", "NZD", "PLN", "RON", "SEK", "SGD", "THB", "USD", "ZAR", "AED",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionProcess {
    Booking,
    Purchase,
    Negotiation,
    Inquiry,
}

impl TransactionProcess {
    /// Parses the process name out of an alias such as `default-booking/release-1`.
    pub fn from_alias(alias: &str) -> Option<Self> {
        let name = alias.split('/').next().unwrap_or_default();
        match name {
            "default-booking" => Some(Self::Booking),
            "default-purchase" => Some(Self::Purchase),
            "default-negotiation" => Some(Self::Negotiation),
            "default-inquiry" => Some(Self::Inquiry),
            _ => None,
        }
    }

    pub const fn requires_payment(self) -> bool {
        !matches!(self, Self::Inquiry)
    }
}

pub fn is_payment_currency(currency: &str) -> bool {
    PAYMENT_CURRENCIES
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(currency))
}

/// Whether listings using `alias` can be priced in `currency`. Unknown
/// processes are rejected.
pub fn is_valid_currency_for_transaction_process(alias: &str, currency: &str) -> bool {
    match TransactionProcess::from_alias(alias) {
        Some(process) if process.requires_payment() => is_payment_currency(currency),
        Some(_) => true,
        None => false,
    }
}
