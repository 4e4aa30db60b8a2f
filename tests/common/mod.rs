#![allow(dead_code)]

use chrono::NaiveDate;
use kumoscreen::domain::error::KumoError;
pub use kumoscreen::domain::ohlcv::OhlcvBar;
use kumoscreen::domain::series::PriceSeries;
use kumoscreen::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: RefCell<HashMap<String, PriceSeries>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: RefCell::new(HashMap::new()),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data
            .borrow_mut()
            .insert(ticker.to_string(), PriceSeries::new(ticker, bars));
        self
    }

    pub fn with_series(self, series: PriceSeries) -> Self {
        self.data
            .borrow_mut()
            .insert(series.ticker().to_string(), series);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn stored(&self, ticker: &str) -> Option<PriceSeries> {
        self.data.borrow().get(ticker).cloned()
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self, ticker: &str) -> Result<PriceSeries, KumoError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(KumoError::Store {
                reason: reason.clone(),
            });
        }
        self.data
            .borrow()
            .get(ticker)
            .cloned()
            .ok_or_else(|| KumoError::NoData {
                ticker: ticker.to_string(),
            })
    }

    fn save_series(&self, series: &PriceSeries) -> Result<(), KumoError> {
        if let Some(reason) = self.errors.get(series.ticker()) {
            return Err(KumoError::Store {
                reason: reason.clone(),
            });
        }
        self.data
            .borrow_mut()
            .insert(series.ticker().to_string(), series.clone());
        Ok(())
    }

    fn list_tickers(&self) -> Result<Vec<String>, KumoError> {
        let mut tickers: Vec<String> = self
            .data
            .borrow()
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar::new(date(date_str), close, close + 1.0, close - 1.0, close).with_volume(1000)
}

/// Consecutive daily bars starting 2024-01-01, one per close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date("2024-01-01");
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let d = start + chrono::Duration::days(i as i64);
            OhlcvBar::new(d, close, close + 1.0, close - 1.0, close).with_volume(1000)
        })
        .collect()
}

/// A gently oscillating uptrend, long enough for every default indicator.
pub fn generate_bars(count: usize, base_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base_price + (i as f64) * 0.5 + ((i as f64) * 0.3).sin() * 3.0)
        .collect();
    bars_from_closes(&closes)
}

pub fn series_from_closes(ticker: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(ticker, bars_from_closes(closes))
}
