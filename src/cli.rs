//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{write_series, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_optional_date, validate_config};
use crate::domain::error::KumoError;
use crate::domain::indicator::bollinger::{BollingerParams, DEFAULT_K, DEFAULT_WINDOW};
use crate::domain::indicator::ichimoku::{cloud_regions, IchimokuParams};
use crate::domain::indicator::{compute_indicators, Indicator};
use crate::domain::sector::{screen_sector, Order, SkipReason};
use crate::domain::series::DateRange;
use crate::domain::universe::{parse_tickers, SectorTable};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "kumoscreen", about = "Technical indicators and sector screening")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add returns, Bollinger and Ichimoku columns and save each series
    Enrich {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers (default: every stored ticker)
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Print the last rows of a ticker with every indicator column
    Show {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
    /// Print the Ichimoku cloud regions of a ticker
    Cloud {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
    },
    /// Rank a sector by final cumulative return
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        sector: Option<String>,
        /// Comma-separated tickers instead of a sector
        #[arg(long, conflicts_with = "sector")]
        tickers: Option<String>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// List stored tickers
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Resolved configuration for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub stocks_path: PathBuf,
    pub sectors_file: Option<PathBuf>,
    pub sector: Option<String>,
    pub top: usize,
    pub order: Order,
    pub range: DateRange,
    pub bollinger: BollingerParams,
    pub ichimoku: IchimokuParams,
}

impl Settings {
    pub fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::Returns,
            Indicator::Bollinger(self.bollinger),
            Indicator::Ichimoku(self.ichimoku),
        ]
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Enrich { config, tickers } => run_enrich(&config, tickers.as_deref()),
        Command::Show {
            config,
            ticker,
            tail,
        } => run_show(&config, &ticker, tail),
        Command::Cloud { config, ticker } => run_cloud(&config, &ticker),
        Command::Screen {
            config,
            sector,
            tickers,
            top,
        } => run_screen(&config, sector.as_deref(), tickers.as_deref(), top),
        Command::ListTickers { config } => run_list_tickers(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &KumoError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn non_negative(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, KumoError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| KumoError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{} must be non-negative", key),
    })
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<Settings, KumoError> {
    let stocks_path = adapter
        .get_string("data", "stocks_path")
        .ok_or_else(|| KumoError::ConfigMissing {
            section: "data".into(),
            key: "stocks_path".into(),
        })?;

    let defaults = IchimokuParams::default();
    let settings = Settings {
        stocks_path: PathBuf::from(stocks_path),
        sectors_file: adapter.get_string("data", "sectors_file").map(PathBuf::from),
        sector: adapter.get_string("screen", "sector"),
        top: non_negative(adapter, "screen", "top", 10)?,
        order: if adapter.get_bool("screen", "ascending", false) {
            Order::Ascending
        } else {
            Order::Descending
        },
        range: DateRange {
            start: parse_optional_date(adapter, "start_date")?,
            end: parse_optional_date(adapter, "end_date")?,
        },
        bollinger: BollingerParams {
            window: non_negative(adapter, "bollinger", "window", DEFAULT_WINDOW)?,
            k: adapter.get_double("bollinger", "k", DEFAULT_K),
        },
        ichimoku: IchimokuParams {
            conversion: non_negative(adapter, "ichimoku", "conversion_period", defaults.conversion)?,
            base: non_negative(adapter, "ichimoku", "base_period", defaults.base)?,
            span_b: non_negative(adapter, "ichimoku", "span_b_period", defaults.span_b)?,
            displacement: non_negative(adapter, "ichimoku", "displacement", defaults.displacement)?,
        },
    };

    settings.bollinger.validate()?;
    settings.ichimoku.validate()?;
    Ok(settings)
}

pub fn load_settings(path: &Path) -> Result<Settings, KumoError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    build_settings(&adapter)
}

/// Tickers from an explicit list, else every stored ticker.
pub fn resolve_tickers(list: Option<&str>, port: &dyn DataPort) -> Result<Vec<String>, KumoError> {
    match list {
        Some(list) => parse_tickers(list).map_err(|e| {
            KumoError::invalid_parameter("tickers", e.to_string())
        }),
        None => port.list_tickers(),
    }
}

fn run_enrich(config_path: &Path, tickers: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let port = CsvAdapter::new(settings.stocks_path.clone());
    run_enrich_pipeline(&port, &settings, tickers)
}

pub fn run_enrich_pipeline(port: &dyn DataPort, settings: &Settings, tickers: Option<&str>) -> ExitCode {
    let tickers = match resolve_tickers(tickers, port) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    eprintln!("There are {} tickers", tickers.len());

    let indicators = settings.indicators();
    let mut failed = Vec::new();

    for ticker in &tickers {
        eprintln!("Working on: {}", ticker);
        let outcome = port
            .load_series(ticker)
            .and_then(|series| compute_indicators(series, &indicators))
            .and_then(|series| port.save_series(&series));

        if let Err(e) = outcome {
            eprintln!("warning: skipping {} ({})", ticker, e);
            failed.push(ticker.as_str());
        }
    }

    eprintln!(
        "Enriched {} of {} tickers",
        tickers.len() - failed.len(),
        tickers.len()
    );
    if !failed.is_empty() {
        eprintln!("Failed: {}", failed.join(", "));
    }

    if failed.len() == tickers.len() && !tickers.is_empty() {
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn run_show(config_path: &Path, ticker: &str, tail: usize) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let port = CsvAdapter::new(settings.stocks_path.clone());

    let series = match port
        .load_series(ticker)
        .and_then(|s| compute_indicators(s.within(&settings.range), &settings.indicators()))
    {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match write_series(&series.tail(tail), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_cloud(config_path: &Path, ticker: &str) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let port = CsvAdapter::new(settings.stocks_path.clone());

    let regions = match port
        .load_series(ticker)
        .and_then(|s| compute_indicators(s.within(&settings.range), &[Indicator::Ichimoku(settings.ichimoku)]))
        .and_then(|s| cloud_regions(&s))
    {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    if regions.is_empty() {
        eprintln!("{}: not enough history for a cloud", ticker);
        return ExitCode::SUCCESS;
    }

    println!("start,end,rows,cloud");
    for region in &regions {
        println!(
            "{},{},{},{}",
            region.start,
            region.end,
            region.rows,
            if region.bullish { "bullish" } else { "bearish" }
        );
    }
    ExitCode::SUCCESS
}

fn run_screen(
    config_path: &Path,
    sector: Option<&str>,
    tickers: Option<&str>,
    top: Option<usize>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let port = CsvAdapter::new(settings.stocks_path.clone());

    let sector = sector.map(str::to_string).or_else(|| settings.sector.clone());
    let tickers = match (tickers, sector.as_deref()) {
        (Some(list), _) => resolve_tickers(Some(list), &port),
        (None, Some(sector)) => sector_tickers(&settings, sector),
        (None, None) => port.list_tickers(),
    };
    let tickers = match tickers {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    run_screen_pipeline(
        &port,
        &tickers,
        sector.as_deref().unwrap_or("all"),
        top.unwrap_or(settings.top),
        &settings.range,
        settings.order,
    )
}

fn sector_tickers(settings: &Settings, sector: &str) -> Result<Vec<String>, KumoError> {
    let path = settings
        .sectors_file
        .as_ref()
        .ok_or_else(|| KumoError::ConfigMissing {
            section: "data".into(),
            key: "sectors_file".into(),
        })?;
    let table = SectorTable::from_path(path)?;
    let tickers = table.tickers_in(sector);
    if tickers.is_empty() {
        eprintln!(
            "No tickers for sector {:?}; known sectors: {}",
            sector,
            table.sectors().join(", ")
        );
    }
    Ok(tickers)
}

pub fn run_screen_pipeline(
    port: &dyn DataPort,
    tickers: &[String],
    label: &str,
    top: usize,
    range: &DateRange,
    order: Order,
) -> ExitCode {
    eprintln!("Screening {} tickers ({})", tickers.len(), label);

    let screen = match screen_sector(port, tickers, top, range, order) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    for (ticker, reason) in screen.aggregation.skipped() {
        match reason {
            SkipReason::Unloadable(why) => eprintln!("  {}: skipped ({})", ticker, why),
            SkipReason::NoCumulativeReturn => eprintln!("  {}: skipped (no cumulative return)", ticker),
        }
    }

    if screen.top.is_empty() {
        eprintln!("error: no tickers with data in {}", label);
        return ExitCode::from(5);
    }

    let heading = match order {
        Order::Descending => "Top",
        Order::Ascending => "Bottom",
    };
    eprintln!("\n=== {} {} {} ===", heading, top, label.to_uppercase());
    println!("rank,ticker,cum_return");
    for (rank, entry) in screen.top.iter().enumerate() {
        println!("{},{},{:.6}", rank + 1, entry.ticker, entry.cum_return);
    }
    ExitCode::SUCCESS
}

fn run_list_tickers(config_path: &Path) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match CsvAdapter::new(settings.stocks_path).list_tickers() {
        Ok(tickers) => {
            for ticker in &tickers {
                println!("{}", ticker);
            }
            eprintln!("There are {} tickers", tickers.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("  stocks_path: {}", settings.stocks_path.display());
    if let Some(path) = &settings.sectors_file {
        eprintln!("  sectors_file: {}", path.display());
    }
    eprintln!("  top: {}", settings.top);
    eprintln!("\nIndicators to compute:");
    for indicator in settings.indicators() {
        eprintln!("  {}", indicator);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
