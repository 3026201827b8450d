// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, SignupRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        html::strip_tags,
        jwt::sign_jwt,
        nickname::make_nickname,
    },
};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it. Users who leave the
/// nickname blank get a random one.
pub async fn signup(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let nickname = payload
        .nickname
        .as_deref()
        .map(strip_tags)
        .filter(|nick| !nick.trim().is_empty())
        .unwrap_or_else(make_nickname);

    sqlx::query(
        r#"
        INSERT INTO users (
            username, password, email, nickname, phone_number, birth_date,
            age, money, salary, description
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(payload.email.as_deref().unwrap_or_default())
    .bind(&nickname)
    .bind(payload.phone_number.as_deref().unwrap_or_default())
    .bind(payload.birth_date)
    .bind(payload.age.unwrap_or(0))
    .bind(payload.money.unwrap_or(0))
    .bind(payload.salary.unwrap_or(0))
    .bind(payload.description.as_deref().map(strip_tags).unwrap_or_default())
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Username '{}' already exists", payload.username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(username = %payload.username, "user signed up");

    Ok((StatusCode::CREATED, Json(json!({ "message": "가입 성공!" }))))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    let user = user.ok_or(AppError::AuthError("User not found".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": user.username,
    })))
}
