// src/handlers/services.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    clients::{KakaoClient, MarketDataClient},
    config::Config,
    error::AppError,
    market::market_board,
    models::services::{BankSearchParams, DEFAULT_X, DEFAULT_Y, RouteParams},
};

/// Gold and silver from the local price files, crypto and forex from the
/// market-data provider. Sources that fail are left out.
pub async fn market_indices(
    State(client): State<MarketDataClient>,
    State(config): State<Config>,
) -> impl IntoResponse {
    Json(market_board(&client, &config.market_data_dir).await)
}

/// Banks near a point, nearest first.
pub async fn bank_search(
    State(kakao): State<KakaoClient>,
    Query(params): Query<BankSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let keyword = params.keyword.as_deref().unwrap_or("은행");
    let x = params.x.as_deref().unwrap_or(DEFAULT_X);
    let y = params.y.as_deref().unwrap_or(DEFAULT_Y);

    let places = kakao.search_keyword(keyword, x, y).await?;
    Ok(Json(places))
}

/// Driving directions between two "x,y" points.
pub async fn route(
    State(kakao): State<KakaoClient>,
    Query(params): Query<RouteParams>,
) -> Result<impl IntoResponse, AppError> {
    let destination = params
        .ep
        .filter(|ep| !ep.trim().is_empty())
        .ok_or(AppError::BadRequest("목적지 좌표가 필요해!".to_string()))?;
    let origin = params
        .sp
        .unwrap_or_else(|| format!("{},{}", DEFAULT_X, DEFAULT_Y));

    let directions = kakao.directions(&origin, &destination).await?;
    Ok(Json(directions))
}
