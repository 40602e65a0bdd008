//! Loan listing endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::models::Book;

use super::AuthenticatedUser;

/// Books currently held by a user
#[utoipa::path(
    get,
    path = "/loans/{username}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("username" = String, Path, description = "Borrower")
    ),
    responses(
        (status = 200, description = "Books held by the user", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(username): Path<String>,
) -> Json<Vec<Book>> {
    Json(state.services.catalog.loans_of(&username).await)
}
