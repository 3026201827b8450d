// src/models/user.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::upload::media_url;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub email: String,
    pub nickname: String,
    pub phone_number: String,
    pub birth_date: Option<NaiveDate>,

    /// Path of the uploaded picture, relative to the media root.
    pub profile_img: Option<String>,
    pub description: String,

    pub age: i64,
    /// Liquid assets in KRW.
    pub money: i64,
    pub salary: i64,

    /// Archetype key from the persona questionnaire.
    pub investment_persona: Option<String>,

    pub created_at: NaiveDateTime,
}

/// Public profile, as returned by the profile endpoints.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub phone_number: String,
    pub birth_date: Option<NaiveDate>,
    pub age: i64,
    pub money: i64,
    pub salary: i64,
    pub profile_img: Option<String>,
    pub description: String,
    pub investment_persona: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            phone_number: user.phone_number,
            birth_date: user.birth_date,
            age: user.age,
            money: user.money,
            salary: user.salary,
            profile_img: user.profile_img.as_deref().map(media_url),
            description: user.description,
            investment_persona: user.investment_persona,
        }
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(
        min = 3,
        max = 150,
        message = "Username length must be between 3 and 150 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub nickname: Option<String>,
    #[validate(length(max = 15))]
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub age: Option<i64>,
    pub money: Option<i64>,
    pub salary: Option<i64>,
    pub description: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Partial profile update read from a multipart form.
/// Absent fields keep their stored value.
#[derive(Debug, Default, Validate)]
pub struct ProfileUpdate {
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub nickname: Option<String>,
    #[validate(length(max = 15))]
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub age: Option<i64>,
    pub money: Option<i64>,
    pub salary: Option<i64>,
    pub description: Option<String>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}
