//! CSV directory store: one `<TICKER>.csv` file per ticker.
//!
//! Layout: `Date,Open,High,Low,Close,Volume[,derived...]`. The date is the
//! first column; only its leading `YYYY-MM-DD` is read, so timestamps with
//! a time and offset suffix are accepted. Any column beyond OHLCV is loaded
//! as a derived column. Empty, `NaN` or infinite cells load as missing
//! values, in price columns as well as derived ones.

use crate::domain::error::KumoError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::{Column, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

const OHLCV_HEADERS: [&str; 5] = ["open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Header positions of the OHLCV fields plus the remaining derived columns.
struct Layout {
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    derived: Vec<(usize, String)>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, KumoError> {
        let find = |name: &str| {
            headers
                .iter()
                .skip(1)
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .map(|p| p + 1)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| KumoError::Store {
                reason: format!("missing {} column", name),
            })
        };

        let derived = headers
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, h)| !OHLCV_HEADERS.iter().any(|o| h.trim().eq_ignore_ascii_case(o)))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
            derived,
        })
    }
}

fn store_err(reason: String) -> KumoError {
    KumoError::Store { reason }
}

fn parse_date(raw: &str) -> Result<NaiveDate, KumoError> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| store_err(format!("invalid date format {:?}: {}", raw, e)))
}

fn parse_optional(raw: Option<&str>, name: &str) -> Result<Option<f64>, KumoError> {
    let raw = raw.unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(|v| Some(v).filter(|v| v.is_finite()))
        .map_err(|e| store_err(format!("invalid {} value: {}", name, e)))
}

fn parse_volume(raw: Option<&str>) -> Result<Option<i64>, KumoError> {
    let raw = raw.unwrap_or("").trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Some(v));
    }
    Ok(parse_optional(Some(raw), "volume")?.map(|v| v as i64))
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `series` as CSV: OHLCV columns first, then derived columns in
/// order, missing cells left empty.
pub fn write_series<W: Write>(series: &PriceSeries, writer: W) -> Result<(), KumoError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![
        "Date".to_string(),
        "Open".into(),
        "High".into(),
        "Low".into(),
        "Close".into(),
        "Volume".into(),
    ];
    header.extend(series.columns().iter().map(|c| c.name.clone()));
    wtr.write_record(&header)
        .map_err(|e| store_err(format!("CSV write error: {}", e)))?;

    for (i, bar) in series.bars().iter().enumerate() {
        let mut row = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            format_cell(bar.open),
            format_cell(bar.high),
            format_cell(bar.low),
            format_cell(bar.close),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ];
        row.extend(series.columns().iter().map(|c| format_cell(c.values[i])));
        wtr.write_record(&row)
            .map_err(|e| store_err(format!("CSV write error: {}", e)))?;
    }

    wtr.flush()?;
    Ok(())
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Periods in tickers (e.g. `BRK.B`) become underscores in file names.
    pub fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", ticker.replace('.', "_")))
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self, ticker: &str) -> Result<PriceSeries, KumoError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => KumoError::NoData {
                ticker: ticker.to_string(),
            },
            _ => store_err(format!("failed to read {}: {}", path.display(), e)),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| store_err(format!("CSV header error: {}", e)))?
            .clone();
        let layout = Layout::from_headers(&headers)?;

        let mut bars = Vec::new();
        let mut derived: Vec<Vec<Option<f64>>> = vec![Vec::new(); layout.derived.len()];

        for result in rdr.records() {
            let record = result.map_err(|e| store_err(format!("CSV parse error: {}", e)))?;

            let date = parse_date(
                record
                    .get(0)
                    .ok_or_else(|| store_err("missing date column".into()))?,
            )?;

            let mut bar = OhlcvBar::with_prices(
                date,
                parse_optional(record.get(layout.open), "open")?,
                parse_optional(record.get(layout.high), "high")?,
                parse_optional(record.get(layout.low), "low")?,
                parse_optional(record.get(layout.close), "close")?,
            );
            bar.volume = match layout.volume {
                Some(idx) => parse_volume(record.get(idx))?,
                None => None,
            };
            bars.push(bar);

            for ((idx, name), cells) in layout.derived.iter().zip(derived.iter_mut()) {
                cells.push(parse_optional(record.get(*idx), name)?);
            }
        }

        if bars.is_empty() {
            return Err(KumoError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let columns = layout
            .derived
            .into_iter()
            .zip(derived)
            .map(|((_, name), values)| Column { name, values })
            .collect();

        PriceSeries::with_columns(ticker, bars, columns)
    }

    fn save_series(&self, series: &PriceSeries) -> Result<(), KumoError> {
        let path = self.csv_path(series.ticker());
        let file = fs::File::create(&path)
            .map_err(|e| store_err(format!("failed to open {}: {}", path.display(), e)))?;
        write_series(series, file)
    }

    fn list_tickers(&self) -> Result<Vec<String>, KumoError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            store_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| store_err(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
