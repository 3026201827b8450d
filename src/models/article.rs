// src/models/article.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

use super::comment::CommentResponse;
use crate::utils::upload::media_url;

/// An article joined with its author, as read for display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleRow {
    pub id: i64,
    pub user_id: i64,
    /// Author's username.
    pub user: String,
    pub nickname: String,
    pub title: String,
    pub content: String,
    /// Media path of the attached image.
    #[serde(skip)]
    pub image: Option<String>,
    pub comment_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    #[serde(flatten)]
    pub article: ArticleRow,
    /// Public URL of the image.
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub comments: Vec<CommentResponse>,
}

/// Article fields read from a multipart form.
#[derive(Debug, Default, Validate)]
pub struct ArticleForm {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,
}

impl From<ArticleRow> for ArticleResponse {
    fn from(article: ArticleRow) -> Self {
        let image = article.image.as_deref().map(media_url);
        Self { article, image }
    }
}
