// src/clients/mod.rs

//! Thin adapters for the external HTTP providers.
//!
//! No retries and no timeouts beyond the reqwest defaults: a failing
//! provider surfaces as an [`UpstreamError`] on every call.

pub mod finlife;
pub mod kakao;
pub mod llm;
pub mod market;
pub mod youtube;

use async_trait::async_trait;
use reqwest::Response;

use crate::catalog::normalize::EquityQuote;
use crate::models::product::ProductKind;

pub use finlife::{FeedPage, FinlifeClient};
pub use kakao::KakaoClient;
pub use llm::{ChatClient, ChatRequest, LanguageModel};
pub use market::{MarketDataClient, PricePoint};
pub use youtube::YoutubeClient;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The provider key or endpoint has not been configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status; the provider's body is kept verbatim.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered, but not with the expected shape.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

/// Turns a non-success response into [`UpstreamError::Status`].
pub(crate) async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Where the ingestion pipeline gets its raw data from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetches one page of a product feed.
    async fn fetch_feed(&self, kind: ProductKind) -> Result<FeedPage, UpstreamError>;

    /// Fetches the market snapshot of one ticker.
    async fn fetch_equity(&self, symbol: &str) -> Result<EquityQuote, UpstreamError>;
}

/// The production source: product feeds plus the market-data provider.
#[derive(Clone)]
pub struct ProviderSource {
    pub finlife: FinlifeClient,
    pub market: MarketDataClient,
}

#[async_trait]
impl ProductSource for ProviderSource {
    async fn fetch_feed(&self, kind: ProductKind) -> Result<FeedPage, UpstreamError> {
        self.finlife.fetch(kind).await
    }

    async fn fetch_equity(&self, symbol: &str) -> Result<EquityQuote, UpstreamError> {
        self.market.equity_quote(symbol).await
    }
}
