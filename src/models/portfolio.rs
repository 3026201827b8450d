// src/models/portfolio.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};

/// Represents the 'user_portfolios' table: one analysis snapshot.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserPortfolio {
    pub id: i64,
    pub user_id: i64,
    pub user_info: Json<Value>,
    pub analysis_result: Json<Value>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_info: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AiRecommendRequest {
    pub analysis_result: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ConsultRequest {
    pub query: Option<String>,
}

/// Questionnaire submission.
#[derive(Debug, Deserialize)]
pub struct PersonaSubmission {
    #[serde(default)]
    pub answers: Vec<Value>,
    /// Self-reported situation: age, assets, salary, goal, tendency.
    pub user_info: Option<Value>,
}
