// src/handlers/persona.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::portfolio::PersonaSubmission,
    persona::{classify, question_views},
    recommend::append_portfolio,
    utils::jwt::Claims,
};

/// Questionnaire without the scoring table.
pub async fn list_questions() -> impl IntoResponse {
    Json(question_views())
}

/// The self-reported situation, when there is one. An empty object counts as none.
fn reported_situation(user_info: Option<&Value>) -> Option<&Value> {
    user_info.filter(|info| info.as_object().is_some_and(|fields| !fields.is_empty()))
}

/// Reads an integer from the self-reported situation.
///
/// A missing key keeps `current`; null, blank or zero-like values reset to 0.
fn reported_int(info: &Value, key: &str, current: i64) -> Result<i64, AppError> {
    let invalid = || AppError::BadRequest(format!("user_info.{} must be a number", key));

    match info.get(key) {
        None => Ok(current),
        Some(Value::Null) => Ok(0),
        Some(Value::Bool(flag)) => Ok(i64::from(*flag)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Scores ten answers, stores the persona and, when the situation is
/// reported too, syncs it onto the user and appends a portfolio entry.
pub async fn submit(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PersonaSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = classify(&payload.answers)
        .map_err(|_| AppError::BadRequest("모든 문항에 답해주세요.".to_string()))?;

    let (age, money, salary): (i64, i64, i64) =
        sqlx::query_as("SELECT age, money, salary FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

    let reported = reported_situation(payload.user_info.as_ref());

    let (age, money, salary) = match reported {
        Some(info) => (
            reported_int(info, "age", age)?,
            reported_int(info, "assets", money)?,
            reported_int(info, "salary", salary)?,
        ),
        None => (age, money, salary),
    };

    let analysis = serde_json::to_value(&result)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE users SET investment_persona = ?, age = ?, money = ?, salary = ? WHERE id = ?",
    )
    .bind(result.animal)
    .bind(age)
    .bind(money)
    .bind(salary)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if let Some(info) = reported {
        append_portfolio(&mut *tx, user_id, info, &analysis).await?;
    }

    tx.commit().await?;

    tracing::info!(user_id, persona = result.animal, "persona stored");

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reported_int_coercion() {
        let info = json!({
            "age": "31",
            "assets": 25000000,
            "salary": null,
            "goal": "내 집 마련",
            "ratio": 1.9,
            "blank": " ",
        });

        assert_eq!(reported_int(&info, "age", 0).unwrap(), 31);
        assert_eq!(reported_int(&info, "assets", 0).unwrap(), 25_000_000);
        assert_eq!(reported_int(&info, "salary", 4_000).unwrap(), 0);
        assert_eq!(reported_int(&info, "ratio", 0).unwrap(), 1);
        assert_eq!(reported_int(&info, "blank", 9).unwrap(), 0);
        assert_eq!(reported_int(&info, "missing", 42).unwrap(), 42);
        assert!(reported_int(&info, "goal", 0).is_err());
    }

    #[test]
    fn test_reported_situation_skips_empty_and_non_objects() {
        let empty = json!({});
        let text = json!("30살");
        let filled = json!({ "age": 30 });

        assert!(reported_situation(None).is_none());
        assert!(reported_situation(Some(&empty)).is_none());
        assert!(reported_situation(Some(&text)).is_none());
        assert_eq!(reported_situation(Some(&filled)), Some(&filled));
    }
}
