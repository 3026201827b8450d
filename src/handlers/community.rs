// src/handlers/community.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        article::{ArticleDetailResponse, ArticleForm, ArticleResponse, ArticleRow},
        comment::{CommentRequest, CommentResponse},
    },
    utils::{
        html::{clean_html, strip_tags},
        jwt::Claims,
        upload::{UploadForm, read_multipart},
    },
};

const ARTICLE_SELECT: &str = r#"
    SELECT
        a.id, a.user_id, u.username AS user, u.nickname,
        a.title, a.content, a.image,
        (SELECT COUNT(*) FROM comments c WHERE c.article_id = a.id) AS comment_count,
        a.created_at, a.updated_at
    FROM articles a
    JOIN users u ON u.id = a.user_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.article_id, c.user_id, u.username AS user, u.nickname,
        c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

async fn fetch_article(pool: &SqlitePool, id: i64) -> Result<ArticleRow, AppError> {
    sqlx::query_as::<_, ArticleRow>(&format!("{} WHERE a.id = ?", ARTICLE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Article not found".to_string()))
}

async fn fetch_comment(pool: &SqlitePool, id: i64) -> Result<CommentResponse, AppError> {
    sqlx::query_as::<_, CommentResponse>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))
}

fn article_form(form: &UploadForm) -> Result<ArticleForm, AppError> {
    let article = ArticleForm {
        title: form.text("title").map(|t| strip_tags(&t)),
        content: form.text("content").map(|c| clean_html(&c)),
    };

    if let Err(validation_errors) = article.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    Ok(article)
}

/// List all articles, newest first. Comments are only counted here.
pub async fn list_articles(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let articles = sqlx::query_as::<_, ArticleRow>(&format!("{} ORDER BY a.id DESC", ARTICLE_SELECT))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list articles: {:?}", e);
            AppError::from(e)
        })?;

    let articles: Vec<ArticleResponse> = articles.into_iter().map(ArticleResponse::from).collect();
    Ok(Json(articles))
}

/// Create an article from a multipart form with an optional `image`.
pub async fn create_article(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let form = read_multipart(multipart, "image").await?;
    let article = article_form(&form)?;

    let (Some(title), Some(content)) = (article.title, article.content) else {
        return Err(AppError::BadRequest("title and content are required".to_string()));
    };
    let image = form.store_file(&config.media_root, "articles").await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO articles (user_id, title, content, image) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(image)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create article: {:?}", e);
        AppError::from(e)
    })?;

    let created = fetch_article(&pool, id).await?;
    Ok((StatusCode::CREATED, Json(ArticleResponse::from(created))))
}

/// Get a single article with its comments.
pub async fn get_article(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let article = fetch_article(&pool, id).await?;

    let comments = sqlx::query_as::<_, CommentResponse>(&format!(
        "{} WHERE c.article_id = ? ORDER BY c.id",
        COMMENT_SELECT
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ArticleDetailResponse {
        article: ArticleResponse::from(article),
        comments,
    }))
}

/// Partial update by the author. A new `image` replaces the old one.
pub async fn update_article(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let existing = fetch_article(&pool, id).await?;
    if existing.user_id != user_id {
        return Err(AppError::Forbidden("본인 글만 수정할 수 있어!".to_string()));
    }

    let form = read_multipart(multipart, "image").await?;
    let article = article_form(&form)?;
    let image = form.store_file(&config.media_root, "articles").await?;

    sqlx::query(
        r#"
        UPDATE articles SET
            title = COALESCE(?, title),
            content = COALESCE(?, content),
            image = COALESCE(?, image),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(article.title)
    .bind(article.content)
    .bind(image)
    .bind(id)
    .execute(&pool)
    .await?;

    let updated = fetch_article(&pool, id).await?;
    Ok(Json(ArticleResponse::from(updated)))
}

/// Delete an article and its comments. Author only.
pub async fn delete_article(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let existing = fetch_article(&pool, id).await?;
    if existing.user_id != user_id {
        return Err(AppError::Forbidden("본인 글만 삭제할 수 있어!".to_string()));
    }

    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete article: {:?}", e);
            AppError::from(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Create a new comment.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(article_id): Path<i64>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;

    fetch_article(&pool, article_id).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO comments (article_id, user_id, content) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(article_id)
    .bind(user_id)
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await?;

    let comment = fetch_comment(&pool, id).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit a comment. Author only.
pub async fn update_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let existing = fetch_comment(&pool, id).await?;
    if existing.user_id != user_id {
        return Err(AppError::Forbidden("권한이 없습니다.".to_string()));
    }

    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    sqlx::query("UPDATE comments SET content = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(clean_html(&payload.content))
        .bind(id)
        .execute(&pool)
        .await?;

    let comment = fetch_comment(&pool, id).await?;
    Ok(Json(comment))
}

/// Delete a comment. Author only.
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let existing = fetch_comment(&pool, id).await?;
    if existing.user_id != user_id {
        return Err(AppError::Forbidden("권한이 없습니다.".to_string()));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
