//! Projects Routes
//!
//! CRUD operations for the caller's projects.
//!
//! Routes:
//! - GET /projects - List projects, newest first
//! - POST /projects - Create a project
//! - GET /projects/:id - Get a project
//! - PUT /projects/:id - Update a project
//! - DELETE /projects/:id - Delete a project (time entries are kept)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ApiJson;
use crate::db::{self, CreateProject, Project, UpdateProject};
use crate::middleware::AuthUser;
use crate::models::{is_valid_color, new_id, ProjectStatus};
use crate::{AppState, Error, Result};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Build project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new project.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    /// `#rrggbb`; defaults to blue
    pub color: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// Request to update a project. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub id: String,
}

// ============================================================================
// Validation
// ============================================================================

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Project name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "Project name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> Result<String> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "Project description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

fn validate_color(color: &str) -> Result<String> {
    let color = color.trim().to_lowercase();
    if !is_valid_color(&color) {
        return Err(Error::Validation(
            "Color must be a hex value like #3b82f6".into(),
        ));
    }
    Ok(color)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /projects
async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Project>>> {
    let projects = db::list_projects(&state.db, &auth.user_id).await?;
    debug!(user_id = %auth.user_id, count = projects.len(), "Listed projects");
    Ok(Json(projects))
}

/// POST /projects
async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>)> {
    let input = CreateProject {
        id: new_id(),
        user_id: auth.user_id.clone(),
        name: validate_name(&request.name)?,
        description: request
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
        color: request.color.as_deref().map(validate_color).transpose()?,
        status: request.status,
    };

    let project = db::create_project(&state.db, input).await?;
    info!(user_id = %auth.user_id, project_id = %project.id, name = %project.name, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects/:id
async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Project>> {
    let project = db::get_project(&state.db, &auth.user_id, &id).await?;
    Ok(Json(project))
}

/// PUT /projects/:id
async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateProjectRequest>,
) -> Result<Json<Project>> {
    let input = UpdateProject {
        name: request.name.as_deref().map(validate_name).transpose()?,
        description: request
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
        color: request.color.as_deref().map(validate_color).transpose()?,
        status: request.status,
    };

    let project = db::update_project(&state.db, &auth.user_id, &id, input).await?;
    info!(user_id = %auth.user_id, project_id = %project.id, "Project updated");

    Ok(Json(project))
}

/// DELETE /projects/:id
async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    db::delete_project(&state.db, &auth.user_id, &id).await?;
    info!(user_id = %auth.user_id, project_id = %id, "Project deleted");

    Ok(Json(DeletedResponse {
        message: "Project deleted",
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims_and_bounds() {
        assert_eq!(validate_name("  Alpha  ").unwrap(), "Alpha");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert_eq!(validate_color("#EF4444").unwrap(), "#ef4444");
        assert!(validate_color("red").is_err());
        assert!(validate_color("#12345").is_err());
    }

    #[test]
    fn test_update_request_rejects_unknown_fields() {
        let result = serde_json::from_str::<UpdateProjectRequest>(r#"{"owner":"someone"}"#);
        assert!(result.is_err());
    }
}
