//! Daily OHLCV bar representation.
//!
//! A price that is absent or not finite is stored as `None`, so indicator
//! windows treat it like any other missing cell.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl OhlcvBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self::with_prices(date, Some(open), Some(high), Some(low), Some(close))
    }

    pub fn with_prices(
        date: NaiveDate,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
    ) -> Self {
        Self {
            date,
            open: finite(open),
            high: finite(high),
            low: finite(low),
            close: finite(close),
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }
}
