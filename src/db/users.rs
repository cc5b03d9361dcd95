//! User database queries.
//!
//! Users own every project and time entry. Password hashes are stored but
//! never serialized.

use crate::models::{Theme, TimeFormat, TimeUnit, UserSettings};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// User record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub theme: String,
    pub time_format: String,
    pub time_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Typed settings. Unknown stored values fall back to defaults.
    pub fn settings(&self) -> UserSettings {
        let defaults = UserSettings::default();
        UserSettings {
            theme: Theme::from_str(&self.theme).unwrap_or(defaults.theme),
            time_format: TimeFormat::from_str(&self.time_format).unwrap_or(defaults.time_format),
            time_unit: TimeUnit::from_str(&self.time_unit).unwrap_or(defaults.time_unit),
        }
    }

    /// Public view of the user, without the password hash.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            settings: self.settings(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub settings: Option<UserSettings>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new user.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    let now = Utc::now();
    let settings = UserSettings::default();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash, theme, time_format, time_unit, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.username)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(settings.theme.as_str())
    .bind(settings.time_format.as_str())
    .bind(settings.time_unit.as_str())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists("A user with this email or username already exists".into())
        }
        _ => Error::Database(e),
    })
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: &str) -> Result<User> {
    find_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()))
}

/// Look up a user by ID without treating absence as an error.
pub async fn find_user(pool: &DbPool, id: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Get a user whose email or username matches either value.
pub async fn get_user_by_email_or_username(
    pool: &DbPool,
    email: &str,
    username: &str,
) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? OR username = ? LIMIT 1")
        .bind(email)
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Update a user.
pub async fn update_user(pool: &DbPool, id: &str, input: UpdateUser) -> Result<User> {
    // Build dynamic update query
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(username) = input.username {
        updates.push("username = ?");
        bindings.push(username);
    }
    if let Some(email) = input.email {
        updates.push("email = ?");
        bindings.push(email);
    }
    if let Some(settings) = input.settings {
        updates.push("theme = ?");
        bindings.push(settings.theme.as_str().to_string());
        updates.push("time_format = ?");
        bindings.push(settings.time_format.as_str().to_string());
        updates.push("time_unit = ?");
        bindings.push(settings.time_unit.as_str().to_string());
    }

    if updates.is_empty() {
        return get_user(pool, id).await;
    }

    updates.push("updated_at = ?");

    let query = format!(
        "UPDATE users SET {} WHERE id = ? RETURNING *",
        updates.join(", ")
    );

    let mut q = sqlx::query_as::<_, User>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(Utc::now()).bind(id);

    q.fetch_optional(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::AlreadyExists("A user with this email or username already exists".into())
            }
            _ => Error::Database(e),
        })?
        .ok_or_else(|| Error::NotFound("User not found".into()))
}
