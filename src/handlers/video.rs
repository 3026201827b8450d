// src/handlers/video.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    clients::YoutubeClient,
    error::AppError,
    models::video::{BookmarkRequest, SavedVideo, SearchParams, VideoParams},
    utils::jwt::Claims,
};

pub async fn search(
    State(youtube): State<YoutubeClient>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or(AppError::BadRequest("검색어를 입력해주세요.".to_string()))?;

    let results = youtube.search(&query).await?;
    Ok(Json(results))
}

/// Video detail including statistics.
pub async fn video(
    State(youtube): State<YoutubeClient>,
    Query(params): Query<VideoParams>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::BadRequest("ID required".to_string()))?;

    let detail = youtube.video(&id).await?;
    Ok(Json(detail))
}

/// Saves the video, or removes it when it is already saved.
pub async fn toggle_bookmark(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BookmarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let video_id = payload
        .video_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::BadRequest("영상 ID가 필요합니다.".to_string()))?;

    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM saved_videos WHERE user_id = ? AND video_id = ?")
        .bind(user_id)
        .bind(&video_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        sqlx::query(
            r#"
            INSERT INTO saved_videos (user_id, video_id, title, thumbnail, channel_title, published_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&video_id)
        .bind(payload.title.unwrap_or_default())
        .bind(payload.thumbnail.unwrap_or_default())
        .bind(payload.channel_title.unwrap_or_default())
        .bind(payload.publish_time)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let body = if removed == 0 {
        json!({ "bookmarked": true, "message": "북마크에 저장되었습니다." })
    } else {
        json!({ "bookmarked": false, "message": "북마크가 해제되었습니다." })
    };
    Ok(Json(body))
}

/// Saved videos, newest first, shaped like provider search items.
pub async fn list_bookmarks(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let saved = sqlx::query_as::<_, SavedVideo>(
        "SELECT * FROM saved_videos WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let items: Vec<Value> = saved.iter().map(SavedVideo::as_search_item).collect();
    Ok(Json(items))
}
