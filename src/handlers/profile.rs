// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{ProfileResponse, ProfileUpdate, User},
    utils::{
        hash::hash_password,
        html::strip_tags,
        jwt::Claims,
        upload::{UploadForm, read_multipart},
    },
};

async fn find_user(pool: &SqlitePool, username: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Owner is decided by id; a username can be re-registered after deletion.
fn ensure_owner(claims: &Claims, user_id: i64, action: &str) -> Result<(), AppError> {
    if claims.user_id()? != user_id {
        return Err(AppError::Forbidden(format!("본인만 {} 수 있어!", action)));
    }
    Ok(())
}

fn profile_update(form: &UploadForm) -> Result<ProfileUpdate, AppError> {
    let birth_date = form
        .text("birth_date")
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest("birth_date must be YYYY-MM-DD".to_string()))
        })
        .transpose()?;

    Ok(ProfileUpdate {
        email: form.text("email"),
        nickname: form.text("nickname").map(|n| strip_tags(&n)),
        phone_number: form.text("phone_number"),
        birth_date,
        age: form.number("age")?,
        money: form.number("money")?,
        salary: form.number("salary")?,
        description: form.fields.get("description").map(|d| strip_tags(d)),
        password: form.text("password"),
    })
}

/// Public profile of any user.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, &username).await?;
    Ok(Json(ProfileResponse::from(user)))
}

/// Partial update from a multipart form. Absent fields are kept;
/// an uploaded `profile_img` replaces the picture.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, &username).await?;
    ensure_owner(&claims, user.id, "수정할")?;

    let form = read_multipart(multipart, "profile_img").await?;
    let update = profile_update(&form)?;

    if let Err(validation_errors) = update.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let password = update.password.as_deref().map(hash_password).transpose()?;
    let profile_img = form.store_file(&config.media_root, "profile").await?;

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            email = COALESCE(?, email),
            nickname = COALESCE(?, nickname),
            phone_number = COALESCE(?, phone_number),
            birth_date = COALESCE(?, birth_date),
            age = COALESCE(?, age),
            money = COALESCE(?, money),
            salary = COALESCE(?, salary),
            description = COALESCE(?, description),
            password = COALESCE(?, password),
            profile_img = COALESCE(?, profile_img)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(update.email)
    .bind(update.nickname)
    .bind(update.phone_number)
    .bind(update.birth_date)
    .bind(update.age)
    .bind(update.money)
    .bind(update.salary)
    .bind(update.description)
    .bind(password)
    .bind(profile_img)
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(ProfileResponse::from(updated)))
}

/// Deletes the account and, through the foreign keys, everything it owns.
pub async fn delete_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, &username).await?;
    ensure_owner(&claims, user.id, "탈퇴할")?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(username = %user.username, "account deleted");

    Ok(StatusCode::NO_CONTENT)
}
