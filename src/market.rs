// src/market.rs

//! Market indices board: metal prices from local CSV exports, crypto and
//! forex from the market-data provider.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::clients::{MarketDataClient, PricePoint};

/// Rows kept per metal series.
const METAL_HISTORY_LEN: usize = 50;

/// Accepted price headers, in order of preference.
const PRICE_COLUMNS: [&str; 4] = ["Close/Last", "Price", "Close", "USD (PM)"];

const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Crypto,
    Forex,
}

/// A provider symbol shown on the board.
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    pub class: AssetClass,
    pub symbol: &'static str,
    pub name: &'static str,
    pub code: &'static str,
    /// Multiplier applied to every price (yen is quoted per 100).
    pub scale: f64,
}

pub const ASSETS: [Asset; 4] = [
    Asset { class: AssetClass::Crypto, symbol: "BTC-KRW", name: "비트코인", code: "BTC", scale: 1.0 },
    Asset { class: AssetClass::Crypto, symbol: "ETH-KRW", name: "이더리움", code: "ETH", scale: 1.0 },
    Asset { class: AssetClass::Forex, symbol: "KRW=X", name: "미국 달러", code: "USD/KRW", scale: 1.0 },
    Asset { class: AssetClass::Forex, symbol: "JPYKRW=X", name: "일본 엔 (100)", code: "JPY/KRW", scale: 100.0 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Close/Last")]
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSnapshot {
    pub code: &'static str,
    pub name: &'static str,
    pub price: f64,
    /// Percent change against the previous close.
    pub change: f64,
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Default, Serialize)]
pub struct MarketBoard {
    pub gold: Vec<HistoryPoint>,
    pub silver: Vec<HistoryPoint>,
    pub crypto: Vec<AssetSnapshot>,
    pub forex: Vec<AssetSnapshot>,
}

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("cannot read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{0} has no Date column")]
    NoDateColumn(PathBuf),

    #[error("{0} has no price column")]
    NoPriceColumn(PathBuf),
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned.trim().parse::<f64>().ok()
}

/// Reads a metal price export and returns the latest rows, oldest first.
/// Rows with an unreadable date or price are skipped.
pub fn read_metal_history(path: &Path) -> Result<Vec<HistoryPoint>, MarketError> {
    let csv_error = |source: csv::Error| MarketError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == "Date")
        .ok_or_else(|| MarketError::NoDateColumn(path.to_path_buf()))?;
    let price_idx = PRICE_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .ok_or_else(|| MarketError::NoPriceColumn(path.to_path_buf()))?;

    let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let date = record.get(date_idx).and_then(parse_date);
        let price = record.get(price_idx).and_then(parse_price);
        if let (Some(date), Some(price)) = (date, price) {
            rows.push((date, price));
        }
    }

    rows.sort_by_key(|(date, _)| *date);
    let skip = rows.len().saturating_sub(METAL_HISTORY_LEN);

    Ok(rows
        .into_iter()
        .skip(skip)
        .map(|(date, close)| HistoryPoint {
            date: date.format("%Y-%m-%d").to_string(),
            close,
        })
        .collect())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds the board entry for one asset from its daily closes.
pub fn snapshot(asset: &Asset, closes: &[PricePoint]) -> Option<AssetSnapshot> {
    let last = closes.last()?;
    let previous = if closes.len() > 1 { &closes[closes.len() - 2] } else { last };

    let change = if previous.close != 0.0 {
        round2((last.close - previous.close) / previous.close * 100.0)
    } else {
        0.0
    };

    Some(AssetSnapshot {
        code: asset.code,
        name: asset.name,
        price: last.close * asset.scale,
        change,
        history: closes
            .iter()
            .map(|point| HistoryPoint {
                date: point.date.format("%Y-%m-%d").to_string(),
                close: point.close * asset.scale,
            })
            .collect(),
    })
}

fn load_metal(path: PathBuf) -> Vec<HistoryPoint> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "metal price file not found");
        return Vec::new();
    }
    read_metal_history(&path).unwrap_or_else(|e| {
        tracing::warn!("skipping metal prices: {}", e);
        Vec::new()
    })
}

/// Assembles the whole board. Failing symbols and files are left out.
pub async fn market_board(client: &MarketDataClient, data_dir: &Path) -> MarketBoard {
    let mut board = MarketBoard::default();

    for asset in ASSETS.iter() {
        let closes = match client.month_history(asset.symbol).await {
            Ok(closes) => closes,
            Err(e) => {
                tracing::warn!(symbol = asset.symbol, "market data unavailable: {}", e);
                continue;
            }
        };
        let Some(entry) = snapshot(asset, &closes) else {
            continue;
        };
        match asset.class {
            AssetClass::Crypto => board.crypto.push(entry),
            AssetClass::Forex => board.forex.push(entry),
        }
    }

    board.gold = load_metal(data_dir.join("Gold_prices.csv"));
    board.silver = load_metal(data_dir.join("Silver_prices.csv"));
    board
}
