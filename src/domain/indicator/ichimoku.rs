//! Ichimoku Cloud.
//!
//! - Conversion line (tenkan-sen): (max high + min low) / 2 over 9 rows
//! - Base line (kijun-sen): (max high + min low) / 2 over 26 rows
//! - Span A (senkou A): (conversion + base) / 2, displayed 26 rows ahead
//! - Span B (senkou B): (max high + min low) / 2 over 52 rows, displayed 26 rows ahead
//! - Lagging span (chikou): close displayed 26 rows behind
//!
//! The table is never extended: the leading spans lose their last
//! `displacement` values and the lagging span is missing for the last
//! `displacement` rows.

use crate::domain::error::KumoError;
use crate::domain::indicator::{rolling_max, rolling_min, shift, zip_with};
use crate::domain::series::{
    BASE_LINE, CONVERSION_LINE, LAG_SPAN, PriceSeries, SPAN_A, SPAN_B,
};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IchimokuParams {
    pub conversion: usize,
    pub base: usize,
    pub span_b: usize,
    pub displacement: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            conversion: 9,
            base: 26,
            span_b: 52,
            displacement: 26,
        }
    }
}

impl IchimokuParams {
    pub fn validate(&self) -> Result<(), KumoError> {
        for (name, period) in [
            ("ichimoku.conversion_period", self.conversion),
            ("ichimoku.base_period", self.base),
            ("ichimoku.span_b_period", self.span_b),
        ] {
            if period == 0 {
                return Err(KumoError::invalid_parameter(name, "period must be positive"));
            }
        }
        if isize::try_from(self.displacement).is_err() {
            return Err(KumoError::invalid_parameter(
                "ichimoku.displacement",
                "displacement is too large",
            ));
        }
        Ok(())
    }
}

/// Mid-range of the trailing `period` rows: (max high + min low) / 2.
fn midrange(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    period: usize,
) -> Result<Vec<Option<f64>>, KumoError> {
    let hi = rolling_max(highs, period)?;
    let lo = rolling_min(lows, period)?;
    Ok(zip_with(&hi, &lo, |h, l| 0.5 * (h + l)))
}

pub fn add_ichimoku(
    mut series: PriceSeries,
    params: &IchimokuParams,
) -> Result<PriceSeries, KumoError> {
    params.validate()?;

    let highs = series.highs();
    let lows = series.lows();
    let disp = params.displacement as isize;

    let conversion = midrange(&highs, &lows, params.conversion)?;
    let base = midrange(&highs, &lows, params.base)?;
    let span_a = shift(&zip_with(&conversion, &base, |c, b| 0.5 * (c + b)), disp);
    let span_b = shift(&midrange(&highs, &lows, params.span_b)?, disp);
    let lag = shift(&series.closes(), -disp);

    series.set_column(CONVERSION_LINE, conversion)?;
    series.set_column(BASE_LINE, base)?;
    series.set_column(SPAN_A, span_a)?;
    series.set_column(SPAN_B, span_b)?;
    series.set_column(LAG_SPAN, lag)?;
    Ok(series)
}

/// A maximal run of rows where the cloud keeps the same colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRegion {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
    /// Span A above span B.
    pub bullish: bool,
}

/// Splits the cloud into same-colour regions. Rows where either span is
/// missing end the current region and belong to none.
pub fn cloud_regions(series: &PriceSeries) -> Result<Vec<CloudRegion>, KumoError> {
    let span_a = series.require_column(SPAN_A)?;
    let span_b = series.require_column(SPAN_B)?;

    let mut regions: Vec<CloudRegion> = Vec::new();
    let mut open = false;

    for (bar, (a, b)) in series.bars().iter().zip(span_a.iter().zip(span_b)) {
        let (Some(a), Some(b)) = (a, b) else {
            open = false;
            continue;
        };
        let bullish = a > b;

        match regions.last_mut() {
            Some(region) if open && region.bullish == bullish => {
                region.end = bar.date;
                region.rows += 1;
                continue;
            }
            _ => {}
        }

        regions.push(CloudRegion {
            start: bar.date,
            end: bar.date,
            rows: 1,
            bullish,
        });
        open = true;
    }

    Ok(regions)
}
