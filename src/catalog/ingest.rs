// src/catalog/ingest.rs

//! Writes provider data into the catalog.
//!
//! Feed ingestion never overwrites: a product whose code already exists is
//! left alone and duplicate options are dropped by the unique index.
//! Equity ingestion upserts instead, since quotes move every day.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sqlx::{SqlitePool, types::Json};

use super::normalize::{CURATED_EQUITIES, NewOption, NewProduct, RawBase, RawOption, normalize_equity};
use crate::clients::{FeedPage, ProductSource};
use crate::models::product::ProductKind;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// False when at least one feed failed.
    pub status: bool,
    pub message: String,
    /// Per-type status keyed by product type.
    pub details: BTreeMap<String, String>,
    /// Products created by the feed pass.
    pub total_saved: usize,
    /// Equities created or updated.
    pub etf_saved: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FeedCounts {
    products: usize,
    options: usize,
}

/// Ingests every product feed. A failing feed is logged and reported;
/// the remaining feeds still run.
pub async fn ingest_feeds(pool: &SqlitePool, source: &dyn ProductSource) -> IngestReport {
    let mut report = IngestReport {
        status: true,
        ..IngestReport::default()
    };

    for kind in ProductKind::FEEDS {
        let outcome = match source.fetch_feed(kind).await {
            Ok(page) => store_feed(pool, kind, page).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let detail = match outcome {
            Ok(counts) => {
                tracing::info!(
                    product_type = kind.as_str(),
                    products = counts.products,
                    options = counts.options,
                    "feed ingested"
                );
                report.total_saved += counts.products;
                format!("{}개 저장 성공", counts.products)
            }
            Err(e) => {
                tracing::warn!(product_type = kind.as_str(), "feed ingestion failed: {}", e);
                report.status = false;
                format!("Error: {}", e)
            }
        };
        report.details.insert(kind.as_str().to_string(), detail);
    }

    report.message = format!("총 {}개 상품 저장 완료", report.total_saved);
    report
}

async fn store_feed(pool: &SqlitePool, kind: ProductKind, page: FeedPage) -> Result<FeedCounts, sqlx::Error> {
    let mut counts = FeedCounts::default();

    for raw in page.base_list {
        let base = match serde_json::from_value::<RawBase>(raw) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!(product_type = kind.as_str(), "skipping malformed product: {}", e);
                continue;
            }
        };
        let Some(product) = base.normalize(kind) else {
            continue;
        };
        if insert_product(pool, &product).await? {
            counts.products += 1;
        }
    }

    for raw in page.option_list {
        let option = match RawOption::parse(kind, raw) {
            Ok(option) => option,
            Err(e) => {
                tracing::warn!(product_type = kind.as_str(), "skipping malformed option: {}", e);
                continue;
            }
        };
        let Some(code) = option.product_code() else {
            continue;
        };
        let Some(product_id) = product_id_by_code(pool, &code).await? else {
            tracing::debug!(code, "option refers to an unknown product");
            continue;
        };
        if insert_option(pool, product_id, &code, &option.normalize()).await? {
            counts.options += 1;
        }
    }

    Ok(counts)
}

/// Inserts a product unless its code is taken. Returns whether a row was created.
async fn insert_product(pool: &SqlitePool, product: &NewProduct) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT OR IGNORE INTO products (
            code, company, name, etc_note, join_deny, join_member, join_way,
            special_condition, product_type, maturity_interest, max_limit
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&product.code)
    .bind(&product.company)
    .bind(&product.name)
    .bind(&product.etc_note)
    .bind(product.join_deny)
    .bind(&product.join_member)
    .bind(&product.join_way)
    .bind(&product.special_condition)
    .bind(product.product_type)
    .bind(&product.maturity_interest)
    .bind(product.max_limit)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn insert_option(
    pool: &SqlitePool,
    product_id: i64,
    code: &str,
    option: &NewOption,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT OR IGNORE INTO product_options (product_id, code, rate_type, rate1, rate2, term, extras)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(product_id)
    .bind(code)
    .bind(&option.rate_type)
    .bind(option.rate1)
    .bind(option.rate2)
    .bind(option.term)
    .bind(Json(Value::Object(option.extras.clone())))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn product_id_by_code(pool: &SqlitePool, code: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM products WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await
}

/// Upserts every curated equity. Returns how many were written.
pub async fn ingest_equities(pool: &SqlitePool, source: &dyn ProductSource) -> usize {
    let mut saved = 0;

    for equity in CURATED_EQUITIES.iter() {
        let quote = match source.fetch_equity(equity.symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(symbol = equity.symbol, "equity quote failed: {}", e);
                continue;
            }
        };

        let (product, option) = normalize_equity(equity, &quote);
        match upsert_equity(pool, &product, &option).await {
            Ok(()) => saved += 1,
            Err(e) => tracing::error!(symbol = equity.symbol, "failed to store equity: {}", e),
        }
    }

    tracing::info!(saved, "equities ingested");
    saved
}

async fn upsert_equity(pool: &SqlitePool, product: &NewProduct, option: &NewOption) -> Result<(), sqlx::Error> {
    let product_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO products (code, company, name, etc_note, join_deny, product_type)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(code) DO UPDATE SET
            company = excluded.company,
            name = excluded.name,
            etc_note = excluded.etc_note,
            join_deny = excluded.join_deny
        RETURNING id
        ",
    )
    .bind(&product.code)
    .bind(&product.company)
    .bind(&product.name)
    .bind(&product.etc_note)
    .bind(product.join_deny)
    .bind(product.product_type)
    .fetch_one(pool)
    .await?;

    let extras = Json(Value::Object(option.extras.clone()));

    let updated = sqlx::query(
        r"
        UPDATE product_options
        SET code = ?, rate1 = ?, rate2 = ?, extras = ?
        WHERE product_id = ? AND IFNULL(term, -1) = IFNULL(?, -1) AND rate_type = ?
        ",
    )
    .bind(&product.code)
    .bind(option.rate1)
    .bind(option.rate2)
    .bind(&extras)
    .bind(product_id)
    .bind(option.term)
    .bind(&option.rate_type)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        insert_option(pool, product_id, &product.code, option).await?;
    }
    Ok(())
}

/// Drops the whole catalog and rebuilds it from the providers.
/// Likes, joins and options go with their products.
pub async fn refresh_catalog(pool: &SqlitePool, source: &dyn ProductSource) -> Result<IngestReport, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM products").execute(pool).await?;
    tracing::info!(removed = removed.rows_affected(), "catalog cleared");

    let mut report = ingest_feeds(pool, source).await;
    report.etf_saved = ingest_equities(pool, source).await;
    report.message = format!("{} + ETF {}개 저장", report.message, report.etf_saved);
    Ok(report)
}

/// Runs the feed ingestion when the catalog has no products yet.
/// Returns `None` when there was nothing to do.
pub async fn bootstrap_if_empty(
    pool: &SqlitePool,
    source: &dyn ProductSource,
) -> Result<Option<IngestReport>, sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(None);
    }

    tracing::info!("catalog is empty, ingesting product feeds");
    Ok(Some(ingest_feeds(pool, source).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::normalize::EquityQuote;
    use crate::clients::UpstreamError;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeSource;

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn fetch_feed(&self, kind: ProductKind) -> Result<FeedPage, UpstreamError> {
            match kind {
                ProductKind::Deposit => Ok(FeedPage {
                    base_list: vec![
                        json!({ "fin_prdt_cd": "D1", "kor_co_nm": "우리은행", "fin_prdt_nm": "우리 예금" }),
                        json!({ "kor_co_nm": "코드 없는 은행" }),
                    ],
                    option_list: vec![
                        json!({ "fin_prdt_cd": "D1", "intr_rate_type_nm": "단리", "intr_rate": 3.0, "intr_rate2": 3.5, "save_trm": "12" }),
                        json!({ "fin_prdt_cd": "D1", "intr_rate_type_nm": "단리", "intr_rate": 3.2, "intr_rate2": 3.8, "save_trm": "24" }),
                        json!({ "fin_prdt_cd": "GHOST", "intr_rate_type_nm": "단리", "save_trm": "12" }),
                    ],
                }),
                ProductKind::Rent => Ok(FeedPage {
                    base_list: vec![json!({ "fin_prdt_cd": "R1", "kor_co_nm": "국민은행", "fin_prdt_nm": "전세대출" })],
                    option_list: vec![
                        json!({ "fin_prdt_cd": "R1", "lend_rate_type_nm": "고정금리", "lend_rate_min": "3.5", "lend_rate_max": "4.2" }),
                    ],
                }),
                ProductKind::Credit => Err(UpstreamError::Status {
                    status: 500,
                    body: "feed down".into(),
                }),
                _ => Ok(FeedPage::default()),
            }
        }

        async fn fetch_equity(&self, symbol: &str) -> Result<EquityQuote, UpstreamError> {
            match symbol {
                "SPY" => Ok(EquityQuote {
                    current_price: Some(500.0),
                    year_change: Some(0.25),
                    dividend_yield: Some(0.013),
                    sector: None,
                    currency: Some("USD".into()),
                }),
                _ => Err(UpstreamError::Decode("no data".into())),
            }
        }
    }

    async fn pool() -> SqlitePool {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::migrate(&pool).await.unwrap();
        pool
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_feed_ingestion_is_idempotent() {
        let pool = pool().await;

        let first = ingest_feeds(&pool, &FakeSource).await;
        assert_eq!(first.total_saved, 2);
        assert_eq!(count(&pool, "products").await, 2);
        assert_eq!(count(&pool, "product_options").await, 3);

        let second = ingest_feeds(&pool, &FakeSource).await;
        assert_eq!(second.total_saved, 0);
        assert_eq!(count(&pool, "products").await, 2);
        assert_eq!(count(&pool, "product_options").await, 3);
    }

    #[tokio::test]
    async fn test_failing_feed_is_reported_not_fatal() {
        let pool = pool().await;

        let report = ingest_feeds(&pool, &FakeSource).await;
        assert!(!report.status);
        assert!(report.details["credit"].starts_with("Error:"));
        assert_eq!(report.details["deposit"], "1개 저장 성공");
        assert_eq!(report.details["rent"], "1개 저장 성공");
        assert_eq!(report.details.len(), ProductKind::FEEDS.len());
    }

    #[tokio::test]
    async fn test_null_term_options_are_not_duplicated() {
        let pool = pool().await;
        ingest_feeds(&pool, &FakeSource).await;
        ingest_feeds(&pool, &FakeSource).await;

        let rent_options: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM product_options WHERE code = 'R1' AND term IS NULL",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rent_options, 1);
    }

    #[tokio::test]
    async fn test_equities_upsert_single_option() {
        let pool = pool().await;

        assert_eq!(ingest_equities(&pool, &FakeSource).await, 1);
        assert_eq!(ingest_equities(&pool, &FakeSource).await, 1);

        let (rate1, rate2): (f64, f64) = sqlx::query_as(
            "SELECT rate1, rate2 FROM product_options WHERE code = 'SPY'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rate1, 25.0);
        assert_eq!(rate2, 1.3);
        assert_eq!(count(&pool, "product_options").await, 1);
    }

    #[tokio::test]
    async fn test_bootstrap_only_runs_on_empty_catalog() {
        let pool = pool().await;

        let report = bootstrap_if_empty(&pool, &FakeSource).await.unwrap();
        assert!(report.is_some());
        assert!(bootstrap_if_empty(&pool, &FakeSource).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rebuilds_catalog() {
        let pool = pool().await;
        ingest_feeds(&pool, &FakeSource).await;

        let report = refresh_catalog(&pool, &FakeSource).await.unwrap();
        assert_eq!(report.total_saved, 2);
        assert_eq!(report.etf_saved, 1);
        assert_eq!(count(&pool, "products").await, 3);
    }
}
