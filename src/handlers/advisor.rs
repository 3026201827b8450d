// src/handlers/advisor.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    catalog::query::top_by_rate2,
    clients::{LanguageModel, UpstreamError, llm::complete_json},
    error::AppError,
    models::portfolio::{AiRecommendRequest, AnalyzeRequest, ConsultRequest, UserPortfolio},
    recommend::{
        self, CANDIDATE_LIMIT, analysis_request, consult_request, parse_suggestions,
        recommend_request, resolve_suggestions,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Every model failure is a single 500; the detail only goes to the log.
fn model_failure(context: &'static str) -> impl FnOnce(UpstreamError) -> AppError {
    move |e| {
        tracing::error!("{}: {}", context, e);
        AppError::Service(context.to_string())
    }
}

/// Asks the model for an investor-type analysis and records it.
pub async fn analyze(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user_info = payload
        .user_info
        .ok_or(AppError::BadRequest("user_info is required".to_string()))?;

    let request = analysis_request(&state.config.providers.llm_analysis_model, &user_info);
    let analysis = complete_json(state.llm.as_ref(), request)
        .await
        .map_err(model_failure("AI 분석 실패"))?;

    recommend::append_portfolio(&state.pool, user_id, &user_info, &analysis).await?;

    Ok(Json(analysis))
}

/// The most recent analysis snapshot of the caller.
pub async fn latest_portfolio(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let latest = sqlx::query_as::<_, UserPortfolio>(
        r#"
        SELECT id, user_id, user_info, analysis_result, created_at
        FROM user_portfolios
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let body = match latest {
        Some(portfolio) => json!({
            "exists": true,
            "user_info": portfolio.user_info.0,
            "analysis_result": portfolio.analysis_result.0,
            "date": portfolio.created_at,
        }),
        None => json!({ "exists": false }),
    };

    Ok(Json(body))
}

/// Lets the model pick products for an analysis from the best-rated
/// candidates, then maps its picks back onto the catalog.
pub async fn ai_recommend(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AiRecommendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let analysis = payload.analysis_result.unwrap_or(Value::Null);

    let candidates = top_by_rate2(&state.pool, CANDIDATE_LIMIT).await?;
    let request = recommend_request(&state.config.providers.llm_recommend_model, &analysis, &candidates);

    let answer = complete_json(state.llm.as_ref(), request)
        .await
        .map_err(model_failure("AI 추천 실패"))?;
    let suggestions = parse_suggestions(answer).map_err(model_failure("AI 추천 실패"))?;

    let recommendations = resolve_suggestions(&state.pool, user_id, suggestions).await?;
    tracing::debug!(count = recommendations.len(), "model recommendations resolved");

    Ok(Json(recommendations))
}

/// Products popular among users of similar age and assets.
pub async fn cohort_recommend(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let (age, money): (i64, i64) = sqlx::query_as("SELECT age, money FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let products = recommend::cohort_picks(&pool, user_id, age, money).await?;
    Ok(Json(products))
}

/// Free-form financial question answered by the model.
pub async fn consult(
    State(state): State<AppState>,
    Json(payload): Json<ConsultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let query = payload
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or(AppError::BadRequest("질문 내용을 입력해줘!".to_string()))?;

    let request = consult_request(&state.config.providers.llm_analysis_model, &query);
    let answer = state
        .llm
        .complete(request)
        .await
        .map_err(model_failure("AI 상담 실패"))?;

    Ok(Json(json!({ "answer": answer })))
}
