//! Bollinger Bands.
//!
//! - Middle: simple moving average of close over `window` rows
//! - Upper: middle + k × stdev
//! - Lower: middle - k × stdev
//!
//! stdev is the sample standard deviation (divides by N-1).
//! Defaults: window=20, k=1.96 (about a 95% interval under normality).
//! Warmup: first (window-1) rows are missing.

use crate::domain::error::KumoError;
use crate::domain::indicator::{rolling_mean, rolling_std, zip_with};
use crate::domain::series::{LOWER_BAND, MIDDLE_BAND, PriceSeries, UPPER_BAND};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_K: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub window: usize,
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            k: DEFAULT_K,
        }
    }
}

impl BollingerParams {
    pub fn validate(&self) -> Result<(), KumoError> {
        if self.window == 0 {
            return Err(KumoError::invalid_parameter(
                "bollinger.window",
                "window must be positive",
            ));
        }
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(KumoError::invalid_parameter(
                "bollinger.k",
                "k must be a non-negative number",
            ));
        }
        Ok(())
    }
}

pub fn add_bollinger_bands(
    mut series: PriceSeries,
    params: &BollingerParams,
) -> Result<PriceSeries, KumoError> {
    params.validate()?;

    let closes = series.closes();
    let middle = rolling_mean(&closes, params.window)?;
    let stdev = rolling_std(&closes, params.window)?;
    let k = params.k;

    let upper = zip_with(&middle, &stdev, |m, s| m + k * s);
    let lower = zip_with(&middle, &stdev, |m, s| m - k * s);

    series.set_column(MIDDLE_BAND, middle)?;
    series.set_column(UPPER_BAND, upper)?;
    series.set_column(LOWER_BAND, lower)?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                OhlcvBar::new(
                    NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                    close,
                    close,
                    close,
                    close,
                )
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    fn params(window: usize, k: f64) -> BollingerParams {
        BollingerParams { window, k }
    }

    #[test]
    fn bollinger_warmup() {
        let series =
            add_bollinger_bands(make_series(&[10.0, 20.0, 30.0, 40.0, 50.0]), &params(3, 2.0)).unwrap();
        let middle = series.column(MIDDLE_BAND).unwrap();

        assert!(middle[0].is_none());
        assert!(middle[1].is_none());
        assert!(middle[2].is_some());
        assert!(middle[3].is_some());
        assert!(middle[4].is_some());
    }

    #[test]
    fn bollinger_constant_values() {
        let series =
            add_bollinger_bands(make_series(&[100.0; 5]), &params(3, 1.96)).unwrap();

        assert_abs_diff_eq!(series.column(MIDDLE_BAND).unwrap()[2].unwrap(), 100.0);
        assert_abs_diff_eq!(series.column(UPPER_BAND).unwrap()[2].unwrap(), 100.0);
        assert_abs_diff_eq!(series.column(LOWER_BAND).unwrap()[2].unwrap(), 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = add_bollinger_bands(make_series(&[10.0, 20.0, 30.0]), &params(3, 1.96)).unwrap();

        // sample stdev of [10, 20, 30] = 10
        assert_abs_diff_eq!(series.column(MIDDLE_BAND).unwrap()[2].unwrap(), 20.0, epsilon = 1e-10);
        assert_abs_diff_eq!(series.column(UPPER_BAND).unwrap()[2].unwrap(), 39.6, epsilon = 1e-10);
        assert_abs_diff_eq!(series.column(LOWER_BAND).unwrap()[2].unwrap(), 0.4, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let series = add_bollinger_bands(make_series(&[10.0, 13.0, 11.0, 17.0]), &params(3, 1.96)).unwrap();
        let m = series.column(MIDDLE_BAND).unwrap()[3].unwrap();
        let u = series.column(UPPER_BAND).unwrap()[3].unwrap();
        let l = series.column(LOWER_BAND).unwrap()[3].unwrap();
        assert_abs_diff_eq!(u - m, m - l, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_window_one_has_no_envelope() {
        let series = add_bollinger_bands(make_series(&[10.0, 11.0]), &params(1, 1.96)).unwrap();
        assert_eq!(series.column(MIDDLE_BAND).unwrap(), &[Some(10.0), Some(11.0)]);
        assert_eq!(series.column(UPPER_BAND).unwrap(), &[None, None]);
    }

    #[test]
    fn bollinger_rejects_zero_window() {
        let err = add_bollinger_bands(make_series(&[10.0]), &params(0, 1.96)).unwrap_err();
        assert!(matches!(err, KumoError::InvalidParameter { .. }));
    }

    #[test]
    fn bollinger_rejects_negative_k() {
        let err = add_bollinger_bands(make_series(&[10.0]), &params(20, -1.0)).unwrap_err();
        assert!(matches!(err, KumoError::InvalidParameter { .. }));
    }

    #[test]
    fn bollinger_defaults() {
        assert_eq!(BollingerParams::default(), params(20, 1.96));
    }
}
