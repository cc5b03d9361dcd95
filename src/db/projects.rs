//! Project database queries.
//!
//! Every query takes the owner's user id; a project that exists but belongs
//! to someone else is indistinguishable from one that does not exist.

use crate::models::{ProjectStatus, DEFAULT_PROJECT_COLOR};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Project record from the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn status_enum(&self) -> ProjectStatus {
        ProjectStatus::from_str(&self.status).unwrap_or_default()
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// Input for updating a project.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub status: Option<ProjectStatus>,
}

fn not_found() -> Error {
    Error::NotFound("Project not found".into())
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new project.
pub async fn create_project(pool: &DbPool, input: CreateProject) -> Result<Project> {
    let now = Utc::now();

    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (id, user_id, name, description, color, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.color.as_deref().unwrap_or(DEFAULT_PROJECT_COLOR))
    .bind(input.status.unwrap_or_default().as_str())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a project by ID, scoped to its owner.
pub async fn get_project(pool: &DbPool, user_id: &str, id: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)
}

/// List a user's projects, newest first.
pub async fn list_projects(pool: &DbPool, user_id: &str) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT * FROM projects
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update a project owned by `user_id`.
pub async fn update_project(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: UpdateProject,
) -> Result<Project> {
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(name) = input.name {
        updates.push("name = ?");
        bindings.push(name);
    }
    if let Some(description) = input.description {
        updates.push("description = ?");
        bindings.push(description);
    }
    if let Some(color) = input.color {
        updates.push("color = ?");
        bindings.push(color);
    }
    if let Some(status) = input.status {
        updates.push("status = ?");
        bindings.push(status.as_str().to_string());
    }

    if updates.is_empty() {
        return get_project(pool, user_id, id).await;
    }

    updates.push("updated_at = ?");

    let query = format!(
        "UPDATE projects SET {} WHERE id = ? AND user_id = ? RETURNING *",
        updates.join(", ")
    );

    let mut q = sqlx::query_as::<_, Project>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(Utc::now()).bind(id).bind(user_id);

    q.fetch_optional(pool).await?.ok_or_else(not_found)
}

/// Delete a project owned by `user_id`.
///
/// Time entries that reference the project are left in place.
pub async fn delete_project(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    Ok(())
}
