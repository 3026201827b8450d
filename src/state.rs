// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::clients::{
    ChatClient, FinlifeClient, KakaoClient, LanguageModel, MarketDataClient, ProductSource,
    ProviderSource, YoutubeClient,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    /// Raw product data for catalog ingestion.
    pub source: Arc<dyn ProductSource>,
    pub llm: Arc<dyn LanguageModel>,
    pub kakao: KakaoClient,
    pub youtube: YoutubeClient,
    pub market: MarketDataClient,
}

impl AppState {
    /// State wired to the real providers described by `config`.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let providers = &config.providers;
        let market = MarketDataClient::new(providers);
        let source = ProviderSource {
            finlife: FinlifeClient::new(providers),
            market: market.clone(),
        };

        Self {
            source: Arc::new(source),
            llm: Arc::new(ChatClient::new(providers)),
            kakao: KakaoClient::new(providers),
            youtube: YoutubeClient::new(providers),
            market,
            pool,
            config,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for KakaoClient {
    fn from_ref(state: &AppState) -> Self {
        state.kakao.clone()
    }
}

impl FromRef<AppState> for YoutubeClient {
    fn from_ref(state: &AppState) -> Self {
        state.youtube.clone()
    }
}

impl FromRef<AppState> for MarketDataClient {
    fn from_ref(state: &AppState) -> Self {
        state.market.clone()
    }
}
