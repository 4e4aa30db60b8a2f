//! Ticker universe: sector classification and ticker-list parsing.
//!
//! The sector table is a CSV with at least `Ticker` and `Sector` columns;
//! other columns are ignored. It only decides which tickers a screen runs
//! over; no price data is read here. Tickers from either source go through
//! [`normalize_ticker`], so they name the same store files.

use crate::domain::error::KumoError;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorEntry {
    pub ticker: String,
    pub sector: String,
}

#[derive(Debug, Clone, Default)]
pub struct SectorTable {
    entries: Vec<SectorEntry>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Canonical ticker spelling: trimmed and uppercased.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl SectorTable {
    pub fn new(entries: Vec<SectorEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| SectorEntry {
                ticker: normalize_ticker(&e.ticker),
                sector: e.sector,
            })
            .collect();
        Self { entries }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, KumoError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| KumoError::Store {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_csv(&content)
    }

    pub fn from_csv(content: &str) -> Result<Self, KumoError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| KumoError::Store {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| KumoError::Store {
                    reason: format!("sector table has no {} column", name),
                })
        };
        let ticker_idx = find("ticker")?;
        let sector_idx = find("sector")?;

        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| KumoError::Store {
                reason: format!("CSV parse error: {}", e),
            })?;
            let ticker = record.get(ticker_idx).unwrap_or("").trim();
            let sector = record.get(sector_idx).unwrap_or("").trim();
            if ticker.is_empty() {
                continue;
            }
            entries.push(SectorEntry {
                ticker: ticker.to_string(),
                sector: sector.to_string(),
            });
        }

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tickers labelled `sector` (case-insensitive), in file order.
    pub fn tickers_in(&self, sector: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.sector.eq_ignore_ascii_case(sector.trim()))
            .map(|e| e.ticker.clone())
            .collect()
    }

    /// Distinct sector labels in first-seen order.
    pub fn sectors(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.sector.as_str()))
            .map(|e| e.sector.clone())
            .collect()
    }
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let ticker = normalize_ticker(token);
        if ticker.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTORS: &str = "Ticker,Name,Sector\n\
        XOM,Exxon Mobil,Energy\n\
        MSFT,Microsoft,Information Technology\n\
        CVX,Chevron,Energy\n\
        ,Blank,Energy\n\
        ADM,Archer-Daniels-Midland,Staples\n";

    #[test]
    fn tickers_in_sector_keep_file_order() {
        let table = SectorTable::from_csv(SECTORS).unwrap();
        assert_eq!(table.tickers_in("Energy"), vec!["XOM", "CVX"]);
        assert_eq!(table.tickers_in(" energy "), vec!["XOM", "CVX"]);
        assert!(table.tickers_in("Utilities").is_empty());
    }

    #[test]
    fn sector_file_tickers_match_parsed_tickers() {
        let table = SectorTable::from_csv("Ticker,Sector\n xom ,Energy\nbrk.b,Financials\n").unwrap();
        assert_eq!(table.tickers_in("Energy"), parse_tickers("XOM").unwrap());
        assert_eq!(table.tickers_in("financials"), parse_tickers("brk.b").unwrap());
    }

    #[test]
    fn new_normalizes_tickers() {
        let table = SectorTable::new(vec![SectorEntry {
            ticker: "cvx".into(),
            sector: "Energy".into(),
        }]);
        assert_eq!(table.tickers_in("Energy"), vec!["CVX"]);
    }

    #[test]
    fn blank_tickers_are_skipped() {
        let table = SectorTable::from_csv(SECTORS).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn sectors_first_seen_order() {
        let table = SectorTable::from_csv(SECTORS).unwrap();
        assert_eq!(
            table.sectors(),
            vec!["Energy", "Information Technology", "Staples"]
        );
    }

    #[test]
    fn missing_sector_column() {
        let result = SectorTable::from_csv("Ticker,Name\nXOM,Exxon\n");
        assert!(matches!(result, Err(KumoError::Store { .. })));
    }

    #[test]
    fn parse_tickers_basic() {
        let result = parse_tickers("  xom , CVX ,brk.b").unwrap();
        assert_eq!(result, vec!["XOM", "CVX", "BRK.B"]);
    }

    #[test]
    fn parse_tickers_empty_token() {
        assert!(matches!(parse_tickers("XOM,,CVX"), Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn parse_tickers_duplicate() {
        let result = parse_tickers("XOM,CVX,xom");
        assert!(matches!(result, Err(UniverseError::DuplicateTicker(s)) if s == "XOM"));
    }
}
