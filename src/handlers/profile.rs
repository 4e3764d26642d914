use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::errors::AppError;
use crate::models::UserContext;
use crate::services::profile_views::{self, ProfileSnapshot, ProfileView, Tab, ViewPayload};
use crate::state::AppState;

// GET /api/profile/tabs
pub async fn get_tabs() -> Json<Vec<Tab>> {
    Json(profile_views::tabs())
}

// GET /api/profile/views/:view
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(view): Path<String>,
) -> Result<Json<ViewPayload>, AppError> {
    let view: ProfileView = view.parse().map_err(AppError::NotFound)?;
    let user = UserContext::from_headers(&headers);
    tracing::debug!(view = view.as_str(), user_id = ?user.user_id, authenticated = user.is_authenticated(), "rendering profile view");

    let (data, memories) = tokio::join!(
        state.profiles.fetch_profile(&user),
        state.profiles.fetch_memories(&user),
    );
    let snapshot = ProfileSnapshot {
        data: data.map_err(|e| profile_error(&user, e))?,
        memories: memories.map_err(|e| profile_error(&user, e))?,
    };

    Ok(Json(profile_views::render(view, &snapshot, chrono::Utc::now())))
}

fn profile_error(user: &UserContext, e: anyhow::Error) -> AppError {
    tracing::error!(user_id = ?user.user_id, error = %e, "profile fetch failed");
    AppError::Profile(format!("{e:#}"))
}
