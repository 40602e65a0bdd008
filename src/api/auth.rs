//! Registration and login endpoints

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::Credentials,
};

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT access token
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    request.validate()?;

    state
        .services
        .auth
        .register(&request.username, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let token = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    headers.insert(AUTHORIZATION, value);

    Ok((
        headers,
        Json(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
        }),
    ))
}
