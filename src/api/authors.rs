//! Author endpoints

use axum::{extract::State, Json};

use super::AuthenticatedUser;

/// List distinct authors in the order they were first added
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Distinct author names", body = Vec<String>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Json<Vec<String>> {
    Json(state.services.catalog.list_authors().await)
}
