// src/handlers/products.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    catalog::{
        self, CatalogQuery,
        query::{find_product, joined_by, liked_by},
    },
    error::AppError,
    models::product::{ProductDetailResponse, ProductListParams},
    state::AppState,
    utils::jwt::{Claims, OptionalClaims},
};

/// Relation tables a user can toggle on a product.
#[derive(Debug, Clone, Copy)]
enum Relation {
    Like,
    Join,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Like => "product_likes",
            Relation::Join => "product_joins",
        }
    }
}

async fn has_relation<'e, E>(executor: E, relation: Relation, user_id: i64, product_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = ? AND product_id = ?)",
        relation.table()
    ))
    .bind(user_id)
    .bind(product_id)
    .fetch_one(executor)
    .await
}

/// Flips the relation inside one transaction and returns the new state.
async fn toggle(pool: &SqlitePool, relation: Relation, user_id: i64, product_id: i64) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = ?)")
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let active = has_relation(&mut *tx, relation, user_id, product_id).await?;

    let statement = if active {
        format!("DELETE FROM {} WHERE user_id = ? AND product_id = ?", relation.table())
    } else {
        format!("INSERT INTO {} (user_id, product_id) VALUES (?, ?)", relation.table())
    };
    sqlx::query(&statement)
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(!active)
}

/// List products with optional type/bank/term filters and a sort order.
///
/// An empty catalog is filled from the product feeds first, unless lazy
/// bootstrap is disabled.
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    if state.config.lazy_bootstrap {
        if let Some(report) = catalog::bootstrap_if_empty(&state.pool, state.source.as_ref()).await? {
            tracing::info!(saved = report.total_saved, "catalog bootstrapped: {}", report.message);
        }
    }

    let plan = CatalogQuery::from_params(&params);
    let products = plan.fetch(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to list products: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(products))
}

/// Clears the catalog and ingests every feed and equity again.
pub async fn refresh_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = catalog::refresh_catalog(&state.pool, state.source.as_ref()).await?;
    tracing::info!("catalog refreshed: {}", report.message);
    Ok(Json(report))
}

pub async fn catalog_status(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let status = catalog::query::status(&pool).await?;
    Ok(Json(status))
}

/// Product detail. Signed-in viewers also learn whether they liked or
/// joined it; anonymous viewers get `false` for both.
pub async fn get_product(
    State(pool): State<SqlitePool>,
    OptionalClaims(claims): OptionalClaims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let product = find_product(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    let (is_liked, is_joined) = match claims.as_ref().map(Claims::user_id).transpose()? {
        Some(user_id) => (
            has_relation(&pool, Relation::Like, user_id, id).await?,
            has_relation(&pool, Relation::Join, user_id, id).await?,
        ),
        None => (false, false),
    };

    Ok(Json(ProductDetailResponse {
        product,
        is_liked,
        is_joined,
    }))
}

pub async fn toggle_like(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let liked = toggle(&pool, Relation::Like, claims.user_id()?, id).await?;
    let message = if liked {
        "관심 상품에 등록되었습니다."
    } else {
        "관심 상품에서 해제되었습니다."
    };
    Ok(Json(json!({ "is_liked": liked, "message": message })))
}

pub async fn toggle_join(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let joined = toggle(&pool, Relation::Join, claims.user_id()?, id).await?;
    let message = if joined {
        "가입 상품으로 등록되었습니다."
    } else {
        "가입 내역이 삭제되었습니다."
    };
    Ok(Json(json!({ "is_joined": joined, "message": message })))
}

pub async fn liked_products(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let products = liked_by(&pool, claims.user_id()?).await?;
    Ok(Json(products))
}

pub async fn joined_products(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let products = joined_by(&pool, claims.user_id()?).await?;
    Ok(Json(products))
}
