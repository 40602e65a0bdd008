//! Book and lending endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
};

use super::AuthenticatedUser;

/// Take / return request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LendingRequest {
    /// Borrower; defaults to the authenticated user
    pub username: Option<String>,
    /// Author of the book; required when several authors share the index
    pub author: Option<String>,
}

/// Take / return response
#[derive(Serialize, ToSchema)]
pub struct LendingResponse {
    /// Status message
    pub message: String,
    /// Book after the operation
    pub book: Book,
}

/// Borrower and optional author named by the request body
fn lending_target(request: Option<Json<LendingRequest>>, subject: String) -> (String, Option<String>) {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let username = request
        .username
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(subject);
    let author = request.author.filter(|a| !a.trim().is_empty());
    (username, author)
}

/// List every book in the store
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// List books that can be taken right now
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available books", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_available(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Json<Vec<Book>> {
    Json(state.services.catalog.available_books().await)
}

/// Add a book to the library
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = Book),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Book already exists")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state
        .services
        .catalog
        .add_book(&request.title, &request.author)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Change the title of a book
#[utoipa::path(
    put,
    path = "/books/{index}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("index" = i32, Path, description = "Book index within its author")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Title already used by this author")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(index): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .rename_book(&request.author, index, &request.title)
        .await?;
    Ok(Json(book))
}

/// Take a book
#[utoipa::path(
    post,
    path = "/books/take/{index}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("index" = i32, Path, description = "Book index")
    ),
    request_body = LendingRequest,
    responses(
        (status = 200, description = "Book taken", body = LendingResponse),
        (status = 400, description = "Index shared by several authors and no author given"),
        (status = 409, description = "Book not found or already taken"),
        (status = 500, description = "Store and catalog disagree"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn take_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(index): Path<i32>,
    request: Option<Json<LendingRequest>>,
) -> AppResult<Json<LendingResponse>> {
    let (username, author) = lending_target(request, claims.sub);
    let book = state
        .services
        .lending
        .checkout(index, author.as_deref(), &username)
        .await?;

    Ok(Json(LendingResponse {
        message: "Book taken successfully".to_string(),
        book,
    }))
}

/// Return a book
#[utoipa::path(
    delete,
    path = "/books/return/{index}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("index" = i32, Path, description = "Book index")
    ),
    request_body = LendingRequest,
    responses(
        (status = 200, description = "Book returned", body = LendingResponse),
        (status = 400, description = "User holds several books with this index and no author given"),
        (status = 404, description = "User does not hold this book"),
        (status = 409, description = "Book already returned"),
        (status = 500, description = "Store and catalog disagree")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(index): Path<i32>,
    request: Option<Json<LendingRequest>>,
) -> AppResult<Json<LendingResponse>> {
    let (username, author) = lending_target(request, claims.sub);
    let book = state
        .services
        .lending
        .return_book(index, author.as_deref(), &username)
        .await?;

    Ok(Json(LendingResponse {
        message: "Book returned successfully".to_string(),
        book,
    }))
}
