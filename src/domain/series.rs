//! Price series: a date-ordered OHLCV table with named derived columns.
//!
//! A `PriceSeries` is the unit every indicator stage consumes and returns.
//! Duplicate dates are resolved once, at construction, by keeping the first
//! occurrence. Derived cells are `Option<f64>`; `None` marks a value that
//! cannot be computed (insufficient history, shift off either end).

use crate::domain::error::KumoError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const DAILY_RETURN: &str = "daily_return";
pub const CUM_RETURN: &str = "cum_return";
pub const MIDDLE_BAND: &str = "middle_band";
pub const UPPER_BAND: &str = "upper_band";
pub const LOWER_BAND: &str = "lower_band";
pub const CONVERSION_LINE: &str = "conversion_line";
pub const BASE_LINE: &str = "base_line";
pub const SPAN_A: &str = "span_A";
pub const SPAN_B: &str = "span_B";
pub const LAG_SPAN: &str = "lag_span";

/// Inclusive date bounds; an absent bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<OhlcvBar>,
    columns: Vec<Column>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        Self::with_dedup_count(ticker, bars).0
    }

    /// Builds a series and reports how many duplicate-date rows were dropped.
    pub fn with_dedup_count(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> (Self, usize) {
        let ticker = ticker.into();
        let total = bars.len();
        let mut seen = HashSet::with_capacity(total);
        let mut unique: Vec<OhlcvBar> = bars.into_iter().filter(|b| seen.insert(b.date)).collect();
        unique.sort_by_key(|b| b.date);

        let dropped = total - unique.len();
        if dropped > 0 {
            tracing::debug!(ticker = %ticker, dropped, "dropped duplicate dates");
        }

        (
            Self {
                ticker,
                bars: unique,
                columns: Vec::new(),
            },
            dropped,
        )
    }

    /// Builds a series with pre-existing derived columns (e.g. loaded from
    /// disk). Rows with duplicate dates are dropped from the columns too.
    pub fn with_columns(
        ticker: impl Into<String>,
        bars: Vec<OhlcvBar>,
        columns: Vec<Column>,
    ) -> Result<Self, KumoError> {
        for col in &columns {
            if col.values.len() != bars.len() {
                return Err(KumoError::InvalidParameter {
                    name: col.name.clone(),
                    reason: format!(
                        "column has {} cells, series has {} rows",
                        col.values.len(),
                        bars.len()
                    ),
                });
            }
        }

        let mut seen = HashSet::with_capacity(bars.len());
        let keep: Vec<bool> = bars.iter().map(|b| seen.insert(b.date)).collect();

        let mut rows: Vec<(usize, OhlcvBar)> = bars
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .collect();
        rows.sort_by_key(|(_, b)| b.date);

        let ticker = ticker.into();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            tracing::debug!(ticker = %ticker, dropped, "dropped duplicate dates");
        }

        let columns = columns
            .into_iter()
            .map(|col| Column {
                values: rows.iter().map(|(i, _)| col.values[*i]).collect(),
                name: col.name,
            })
            .collect();

        Ok(Self {
            ticker,
            bars: rows.into_iter().map(|(_, b)| b).collect(),
            columns,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<&[Option<f64>], KumoError> {
        self.column(name)
            .ok_or_else(|| KumoError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Appends a column, or overwrites the values of an existing column of
    /// the same name without moving it. `values` needs one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), KumoError> {
        if values.len() != self.bars.len() {
            return Err(KumoError::InvalidParameter {
                name: name.to_string(),
                reason: format!(
                    "column has {} cells, series has {} rows",
                    values.len(),
                    self.bars.len()
                ),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Most recent non-missing value of a column.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().rev().find_map(|v| *v)
    }

    /// Rows dated within `[start, end]`, with derived columns sliced alongside.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let from = self.bars.partition_point(|b| b.date < start);
        let to = self.bars.partition_point(|b| b.date <= end).max(from);
        self.slice_rows(from, to)
    }

    pub fn within(&self, range: &DateRange) -> PriceSeries {
        self.between(
            range.start.unwrap_or(NaiveDate::MIN),
            range.end.unwrap_or(NaiveDate::MAX),
        )
    }

    fn slice_rows(&self, from: usize, to: usize) -> PriceSeries {
        PriceSeries {
            ticker: self.ticker.clone(),
            bars: self.bars[from..to].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[from..to].to_vec(),
                })
                .collect(),
        }
    }

    /// Last `n` rows (or all rows if fewer).
    pub fn tail(&self, n: usize) -> PriceSeries {
        let from = self.bars.len().saturating_sub(n);
        self.slice_rows(from, self.bars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close - 1.0,
            close + 1.0,
            close - 2.0,
            close,
        )
    }

    #[test]
    fn duplicate_dates_keep_first() {
        let bars = vec![
            bar("2020-01-01", 10.0),
            bar("2020-01-02", 11.0),
            bar("2020-01-02", 99.0),
            bar("2020-01-03", 12.0),
        ];
        let (series, dropped) = PriceSeries::with_dedup_count("ABB", bars);

        assert_eq!(dropped, 1);
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes()[1], Some(11.0));
    }

    #[test]
    fn rows_sorted_by_date() {
        let bars = vec![
            bar("2020-01-03", 12.0),
            bar("2020-01-01", 10.0),
            bar("2020-01-02", 11.0),
        ];
        let series = PriceSeries::new("ABB", bars);
        assert_eq!(series.closes(), vec![Some(10.0), Some(11.0), Some(12.0)]);
    }

    #[test]
    fn set_column_replaces_in_place() {
        let mut series = PriceSeries::new("ABB", vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0)]);
        series.set_column("a", vec![Some(1.0), None]).unwrap();
        series.set_column("b", vec![None, None]).unwrap();
        series.set_column("a", vec![Some(2.0), Some(3.0)]).unwrap();

        let names: Vec<&str> = series.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(series.column("a").unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn set_column_rejects_wrong_length() {
        let mut series = PriceSeries::new("ABB", vec![bar("2020-01-01", 10.0)]);
        let err = series.set_column("a", vec![]).unwrap_err();
        assert!(matches!(err, KumoError::InvalidParameter { name, .. } if name == "a"));
        assert!(!series.has_column("a"));
    }

    #[test]
    fn last_value_skips_missing() {
        let mut series = PriceSeries::new(
            "ABB",
            vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0), bar("2020-01-03", 12.0)],
        );
        series.set_column(CUM_RETURN, vec![None, Some(1.1), None]).unwrap();
        assert_eq!(series.last_value(CUM_RETURN), Some(1.1));
        assert_eq!(series.last_value("absent"), None);
    }

    #[test]
    fn with_columns_drops_duplicate_rows_from_columns() {
        let bars = vec![
            bar("2020-01-02", 11.0),
            bar("2020-01-01", 10.0),
            bar("2020-01-02", 50.0),
        ];
        let columns = vec![Column {
            name: CUM_RETURN.into(),
            values: vec![Some(1.1), None, Some(5.0)],
        }];
        let series = PriceSeries::with_columns("ABB", bars, columns).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.column(CUM_RETURN).unwrap(), &[None, Some(1.1)]);
    }

    #[test]
    fn with_columns_rejects_misaligned_column() {
        let columns = vec![Column {
            name: "x".into(),
            values: vec![Some(1.0)],
        }];
        let result = PriceSeries::with_columns("ABB", vec![], columns);
        assert!(result.is_err());
    }

    #[test]
    fn between_slices_columns() {
        let mut series = PriceSeries::new(
            "ABB",
            vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0), bar("2020-01-03", 12.0)],
        );
        series.set_column("x", vec![Some(1.0), Some(2.0), Some(3.0)]).unwrap();

        let sliced = series.between(
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 5).unwrap(),
        );
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.column("x").unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn between_inverted_range_is_empty() {
        let series = PriceSeries::new("ABB", vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0)]);
        let sliced = series.between(
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        );
        assert!(sliced.is_empty());
    }

    #[test]
    fn within_open_bounds() {
        let series = PriceSeries::new(
            "ABB",
            vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0), bar("2020-01-03", 12.0)],
        );
        let range = DateRange {
            start: None,
            end: NaiveDate::from_ymd_opt(2020, 1, 2),
        };
        assert_eq!(series.within(&range).len(), 2);
        assert_eq!(series.within(&DateRange::default()), series);
        assert!(DateRange::default().is_unbounded());
    }

    #[test]
    fn tail_returns_last_rows() {
        let series = PriceSeries::new(
            "ABB",
            vec![bar("2020-01-01", 10.0), bar("2020-01-02", 11.0), bar("2020-01-03", 12.0)],
        );
        assert_eq!(series.tail(2).len(), 2);
        assert_eq!(series.tail(10).len(), 3);
        assert_eq!(series.tail(0).len(), 0);
    }
}
