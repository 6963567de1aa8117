//! Login and registration routes.
//!
//! POST /api/login    - Exchange credentials for a bearer token
//! POST /api/register - Create a user account

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::error::{ApiError, BAD_CREDENTIALS, USERNAME_EXISTS};
use crate::models::{
    ApiResponse, LoginRequestDto, LoginResponseDto, RegistrationRequestDto, UserDto,
};
use crate::AppState;

/// Build the auth router.
pub fn router() -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
}

/// An unknown username and a wrong password produce the same response.
async fn login(
    Extension(state): Extension<AppState>,
    payload: Result<Json<LoginRequestDto>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponseDto>>, ApiError> {
    let Json(request) = payload?;

    let response = state
        .auth
        .login(&request)
        .await?
        .ok_or(ApiError::BadRequest(BAD_CREDENTIALS))?;

    Ok(Json(ApiResponse::success(StatusCode::OK, Some(response))))
}

async fn register(
    Extension(state): Extension<AppState>,
    payload: Result<Json<RegistrationRequestDto>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Json(request) = payload?;

    if !state.auth.is_unique_user(&request.user_name).await? {
        return Err(ApiError::BadRequest(USERNAME_EXISTS));
    }

    let user = state
        .auth
        .register(&request)
        .await?
        .filter(|user| !user.user_name.trim().is_empty())
        .ok_or(ApiError::Rejected)?;

    Ok(Json(ApiResponse::success(StatusCode::OK, Some(user))))
}
