// src/clients/market.rs

//! Market-data client built on the public chart endpoint.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use reqwest::{Client, header};
use serde::Deserialize;

use super::{UpstreamError, check_status};
use crate::catalog::normalize::EquityQuote;
use crate::config::ProviderConfig;

/// One daily close.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
    #[serde(default)]
    events: Option<ChartEvents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    regular_market_price: Option<f64>,
    instrument_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, Dividend>,
}

#[derive(Debug, Deserialize)]
struct Dividend {
    amount: f64,
}

impl ChartResult {
    fn closes(&self) -> Vec<PricePoint> {
        let Some(series) = self.indicators.quote.first() else {
            return Vec::new();
        };
        self.timestamp
            .iter()
            .zip(series.close.iter())
            .filter_map(|(ts, close)| {
                let close = (*close)?;
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                Some(PricePoint { date, close })
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct MarketDataClient {
    http: Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.market_data_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn chart(&self, symbol: &str, range: &str, dividends: bool) -> Result<ChartResult, UpstreamError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        tracing::debug!("GET {}", url);

        let mut request = self
            .http
            .get(&url)
            .header(header::USER_AGENT, "Mozilla/5.0 (compatible; walletgg/0.1)")
            .query(&[("range", range), ("interval", "1d")]);
        if dividends {
            request = request.query(&[("events", "div")]);
        }

        let envelope: ChartEnvelope = check_status(request.send().await?).await?.json().await?;
        if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
            return Err(UpstreamError::Decode(error.to_string()));
        }
        envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| UpstreamError::Decode(format!("no chart data for {}", symbol)))
    }

    /// Daily closes over the last month, oldest first.
    pub async fn month_history(&self, symbol: &str) -> Result<Vec<PricePoint>, UpstreamError> {
        Ok(self.chart(symbol, "1mo", false).await?.closes())
    }

    /// Price, trailing one-year change and trailing dividend yield.
    pub async fn equity_quote(&self, symbol: &str) -> Result<EquityQuote, UpstreamError> {
        let chart = self.chart(symbol, "1y", true).await?;
        let closes = chart.closes();

        let current_price = chart
            .meta
            .regular_market_price
            .or_else(|| closes.last().map(|p| p.close));

        let year_change = match (closes.first(), current_price) {
            (Some(first), Some(price)) if first.close > 0.0 => Some(price / first.close - 1.0),
            _ => None,
        };

        let paid: f64 = chart
            .events
            .as_ref()
            .map(|events| events.dividends.values().map(|d| d.amount).sum())
            .unwrap_or(0.0);
        let dividend_yield = match current_price {
            Some(price) if price > 0.0 && paid > 0.0 => Some(paid / price),
            _ => None,
        };

        Ok(EquityQuote {
            current_price,
            year_change,
            dividend_yield,
            sector: chart.meta.instrument_type.clone(),
            currency: chart.meta.currency.clone(),
        })
    }
}
