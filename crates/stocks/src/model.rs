use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

/// One quote record. The provider sends `null` for fields it has no data for; those
/// deserialize as `None` and render as zero.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub company_name: Option<String>,
    pub latest_price: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub latest_volume: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub low: Option<Decimal>,
    pub high: Option<Decimal>,
    /// Epoch milliseconds.
    pub latest_update: Option<Decimal>,
    pub latest_time: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Slack attachment color for the trend.
    pub fn color(self) -> &'static str {
        match self {
            Self::Up => "good",
            Self::Down => "danger",
            Self::Flat => "gray",
        }
    }
}

impl Quote {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), ..Self::default() }
    }

    pub fn trend(&self) -> Trend {
        let change = self.change.unwrap_or_default();
        if change > Decimal::ZERO {
            Trend::Up
        } else if change < Decimal::ZERO {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    /// `changePercent` arrives as a ratio; chat output shows it in percent.
    pub fn change_percent_points(&self) -> Decimal {
        self.change_percent.unwrap_or_default() * Decimal::ONE_HUNDRED
    }

    /// Attachment timestamp in epoch seconds.
    pub fn updated_epoch_secs(&self) -> f64 {
        let millis = self.latest_update.unwrap_or_default();
        (millis / Decimal::ONE_THOUSAND).to_f64().unwrap_or_default()
    }

    pub fn company(&self) -> &str {
        self.company_name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookResponse {
    pub quote: Quote,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogoResponse {
    pub url: String,
}
