// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;
use walletgg::{
    catalog::normalize::EquityQuote,
    clients::{
        ChatRequest, FeedPage, KakaoClient, LanguageModel, MarketDataClient, ProductSource,
        UpstreamError, YoutubeClient,
    },
    config::{Config, ProviderConfig},
    db,
    models::product::ProductKind,
    routes,
    state::AppState,
};

/// Feeds with one deposit, one saving and one rent product.
pub struct FakeSource;

#[async_trait]
impl ProductSource for FakeSource {
    async fn fetch_feed(&self, kind: ProductKind) -> Result<FeedPage, UpstreamError> {
        let page = match kind {
            ProductKind::Deposit => FeedPage {
                base_list: vec![json!({
                    "fin_prdt_cd": "D1", "kor_co_nm": "우리은행", "fin_prdt_nm": "WON플러스예금",
                    "etc_note": "비대면 전용", "join_deny": "1", "mtrt_int": "만기 후 1개월 이내 기본금리"
                })],
                option_list: vec![
                    json!({ "fin_prdt_cd": "D1", "intr_rate_type_nm": "단리", "intr_rate": 3.0, "intr_rate2": 3.5, "save_trm": "12" }),
                    json!({ "fin_prdt_cd": "D1", "intr_rate_type_nm": "단리", "intr_rate": 3.1, "intr_rate2": 3.6, "save_trm": "24" }),
                ],
            },
            ProductKind::Saving => FeedPage {
                base_list: vec![json!({
                    "fin_prdt_cd": "S1", "kor_co_nm": "국민은행", "fin_prdt_nm": "KB 자유적금"
                })],
                option_list: vec![json!({
                    "fin_prdt_cd": "S1", "intr_rate_type_nm": "복리", "intr_rate": "3.8", "intr_rate2": "4.2", "save_trm": 12
                })],
            },
            ProductKind::Rent => FeedPage {
                base_list: vec![json!({
                    "fin_prdt_cd": "R1", "kor_co_nm": "국민은행", "fin_prdt_nm": "KB 전세대출"
                })],
                option_list: vec![json!({
                    "fin_prdt_cd": "R1", "lend_rate_type_nm": "고정금리", "lend_rate_min": "3.5", "lend_rate_max": "4.2"
                })],
            },
            _ => FeedPage::default(),
        };
        Ok(page)
    }

    async fn fetch_equity(&self, symbol: &str) -> Result<EquityQuote, UpstreamError> {
        Err(UpstreamError::Decode(format!("no quote for {}", symbol)))
    }
}

/// Canned model answers, picked by what the prompt asks for.
pub struct FakeModel {
    pub fail: bool,
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError> {
        if self.fail {
            return Err(UpstreamError::Status {
                status: 503,
                body: "overloaded".into(),
            });
        }

        let answer = if !request.json_output {
            "분산 투자를 추천해.".to_string()
        } else if request.user.contains("추천 후보") {
            json!({
                "recommendations": [
                    { "name": "자유적금", "reason": "금리 4.2%로 평균보다 높아요." },
                    { "name": "존재하지 않는 상품", "reason": "버려져야 함" },
                    { "name": "WON플러스", "reason": "예금 3.6%" }
                ]
            })
            .to_string()
        } else {
            json!({ "type": "안정형", "score": 72, "advice": "비상금부터 모으세요." }).to_string()
        };
        Ok(answer)
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    pub media: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeModel { fail: false }).await
}

pub async fn spawn_app_with(model: FakeModel) -> TestApp {
    spawn(model, false).await
}

/// Same as `spawn_app`, with `DEBUG` switched on.
pub async fn spawn_debug_app() -> TestApp {
    spawn(FakeModel { fail: false }, true).await
}

/// Spawns the app on a random port against a fresh in-memory database.
async fn spawn(model: FakeModel, debug: bool) -> TestApp {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to migrate database");

    let media = tempfile::tempdir().expect("Failed to create media dir");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        debug,
        cors_origins: vec!["http://localhost:5173".to_string()],
        bind_addr: "127.0.0.1:0".to_string(),
        media_root: media.path().to_path_buf(),
        market_data_dir: media.path().join("no-market-data"),
        lazy_bootstrap: true,
        ingest_on_startup: false,
        providers: ProviderConfig::default(),
    };

    let providers = config.providers.clone();
    let state = AppState {
        pool: pool.clone(),
        config,
        source: Arc::new(FakeSource),
        llm: Arc::new(model),
        kakao: KakaoClient::new(&providers),
        youtube: YoutubeClient::new(&providers),
        market: MarketDataClient::new(&providers),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
        media,
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Signs up a user with the given extras and returns a bearer token.
    pub async fn signup_and_login(&self, username: &str, extras: Value) -> String {
        let mut body = json!({ "username": username, "password": "password123" });
        if let (Some(body), Some(extras)) = (body.as_object_mut(), extras.as_object()) {
            body.extend(extras.clone());
        }

        let response = self
            .client
            .post(self.url("/accounts/signup"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let login = self
            .client
            .post(self.url("/accounts/login"))
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .expect("Failed to execute request")
            .json::<Value>()
            .await
            .unwrap();

        login["token"].as_str().expect("token missing").to_string()
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
