// src/models/video.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::FromRow;

/// Represents the 'saved_videos' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SavedVideo {
    pub id: i64,
    pub user_id: i64,
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    pub created_at: NaiveDateTime,
}

impl SavedVideo {
    /// Shapes the bookmark like an item of the provider's search response.
    pub fn as_search_item(&self) -> Value {
        json!({
            "id": { "videoId": self.video_id },
            "snippet": {
                "title": self.title,
                "thumbnails": { "high": { "url": self.thumbnail } },
                "channelTitle": self.channel_title,
                "publishTime": self.published_at,
                "description": "",
            }
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub channel_title: Option<String>,
    pub publish_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoParams {
    pub id: Option<String>,
}
