//! Coupon routes.
//!
//! GET    /api/coupon      - List every coupon (admin only)
//! GET    /api/coupon/{id} - Retrieve a coupon by ID; `result` is null when absent
//! POST   /api/coupon      - Create a coupon
//! PUT    /api/coupon      - Replace a coupon's mutable fields
//! DELETE /api/coupon/{id} - Delete a coupon

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::info;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::error::{ApiError, COUPON_NAME_EXISTS, INVALID_ID, ZERO_ID};
use crate::models::{ApiResponse, Coupon, CouponCreateDto, CouponDto, CouponUpdateDto};
use crate::validation::Violations;
use crate::AppState;

/// Build the coupons router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/coupon",
            get(get_all_coupons).post(create_coupon).put(update_coupon),
        )
        .route(
            "/api/coupon/{id}",
            get(get_coupon)
                .route_layer(middleware::from_fn(reject_zero_id))
                .delete(delete_coupon),
        )
}

/// Route guard for single-coupon retrieval: an id of exactly 0 never
/// reaches the handler. Authentication is checked first.
async fn reject_zero_id(
    _user: AuthenticatedUser,
    path: Result<Path<i32>, PathRejection>,
    request: Request,
    next: Next,
) -> Response {
    match path {
        Ok(Path(0)) => ApiError::BadRequest(ZERO_ID).into_response(),
        Ok(_) => next.run(request).await,
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

async fn get_all_coupons(
    _admin: AdminUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<Vec<CouponDto>>>, ApiError> {
    info!("Getting all coupons");

    let coupons = state
        .coupon_repository()
        .get_all()
        .await?
        .into_iter()
        .map(CouponDto::from)
        .collect();

    Ok(Json(ApiResponse::success(StatusCode::OK, Some(coupons))))
}

/// Absence is not an error here: the envelope reports success with a null
/// result.
async fn get_coupon(
    _user: AuthenticatedUser,
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<CouponDto>>, ApiError> {
    let Path(id) = path?;
    let coupon = state.coupon_repository().get(id).await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        coupon.map(CouponDto::from),
    )))
}

/// Create a coupon.
///
/// 1. Validate the request body
/// 2. Reject a name that already exists (case-insensitive)
/// 3. Stage and commit the new row
/// 4. Return the stored coupon with status 201 in the envelope
async fn create_coupon(
    _user: AuthenticatedUser,
    Extension(state): Extension<AppState>,
    payload: Result<Json<CouponCreateDto>, JsonRejection>,
) -> Result<Json<ApiResponse<CouponDto>>, ApiError> {
    let Json(dto) = payload?;

    let errors = dto.violations();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut repo = state.coupon_repository();
    if repo.get_by_name(&dto.name).await?.is_some() {
        return Err(ApiError::Conflict(COUPON_NAME_EXISTS));
    }

    repo.create(Coupon::from(dto));
    let created = repo
        .save()
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::Internal("coupon insert returned no row"))?;

    info!("Coupon {} created as {}", created.id, created.name);

    Ok(Json(ApiResponse::success(
        StatusCode::CREATED,
        Some(CouponDto::from(created)),
    )))
}

/// Replace name, percent and active flag of an existing coupon, then return
/// the re-fetched row.
async fn update_coupon(
    _user: AuthenticatedUser,
    Extension(state): Extension<AppState>,
    payload: Result<Json<CouponUpdateDto>, JsonRejection>,
) -> Result<Json<ApiResponse<CouponDto>>, ApiError> {
    let Json(dto) = payload?;

    let errors = dto.violations();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let id = dto.id;
    let mut repo = state.coupon_repository();
    repo.update(Coupon::from(dto));
    repo.save().await?;

    let updated = repo.get(id).await?.ok_or(ApiError::BadRequest(INVALID_ID))?;
    info!("Coupon {} updated", id);

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        Some(CouponDto::from(updated)),
    )))
}

async fn delete_coupon(
    _user: AuthenticatedUser,
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Path(id) = path?;
    let mut repo = state.coupon_repository();
    let Some(coupon) = repo.get(id).await? else {
        return Err(ApiError::BadRequest(INVALID_ID));
    };

    repo.remove(coupon);
    repo.save().await?;
    info!("Coupon {} deleted", id);

    Ok(Json(ApiResponse::success(StatusCode::NO_CONTENT, None)))
}
