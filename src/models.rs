//! Domain models for the coupon API.
//!
//! Entities map to the `coupons` and `local_users` tables. DTOs are the JSON
//! shapes exchanged with clients and are never persisted directly; the
//! `From` impls at the bottom of this file are the only place the two meet.

use axum::http::StatusCode;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::not_blank;

// ============================================================================
// Database Models (sqlx::FromRow)
// ============================================================================

/// A discount coupon tracked in the application database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: i32,
    pub name: String,
    pub percent: i32,
    pub is_active: bool,
    pub created: NaiveDateTime,
    pub last_updated: Option<NaiveDateTime>,
}

/// A user able to log in against the API.
///
/// `password` always holds an Argon2 PHC string, never the plain text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocalUser {
    pub id: i32,
    pub user_name: String,
    pub name: String,
    pub password: String,
    pub role: String,
}

/// A user row that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
}

// ============================================================================
// Request Models (Deserialize from JSON input)
// ============================================================================

/// Request body for creating a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CouponCreateDto {
    #[serde(default)]
    #[validate(length(min = 1, code = "not_empty"), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub percent: i32,
    #[serde(default)]
    pub is_active: bool,
}

/// Request body for replacing a coupon's mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CouponUpdateDto {
    #[serde(default)]
    #[validate(range(min = 1))]
    pub id: i32,
    #[serde(default)]
    #[validate(length(min = 1, code = "not_empty"), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub percent: i32,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestDto {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequestDto {
    pub user_name: String,
    pub name: String,
    pub password: String,
}

// ============================================================================
// Response Models
// ============================================================================

/// Uniform envelope wrapped around every API result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub is_success: bool,
    pub error_messages: Vec<String>,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope. `status` is reported in the body only; the HTTP
    /// status line of a success is always 200.
    pub fn success(status: StatusCode, result: Option<T>) -> Self {
        Self {
            status_code: status.as_u16(),
            is_success: true,
            error_messages: Vec::new(),
            result,
        }
    }

    pub fn failure(status: StatusCode, error_messages: Vec<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            is_success: false,
            error_messages,
            result: None,
        }
    }
}

/// Coupon as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDto {
    pub id: i32,
    pub name: String,
    pub percent: i32,
    pub is_active: bool,
    pub created: NaiveDateTime,
    pub last_updated: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub user_name: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: UserDto,
    pub token: String,
}

// ============================================================================
// Mapping
// ============================================================================

impl From<CouponCreateDto> for Coupon {
    /// The id is assigned by the store on commit.
    fn from(dto: CouponCreateDto) -> Self {
        Coupon {
            id: 0,
            name: dto.name,
            percent: dto.percent,
            is_active: dto.is_active,
            created: Utc::now().naive_utc(),
            last_updated: None,
        }
    }
}

impl From<CouponUpdateDto> for Coupon {
    /// Stores ignore `created` when applying an update, so only the mutable
    /// fields and the refreshed `last_updated` stamp carry meaning here.
    fn from(dto: CouponUpdateDto) -> Self {
        let now = Utc::now().naive_utc();
        Coupon {
            id: dto.id,
            name: dto.name,
            percent: dto.percent,
            is_active: dto.is_active,
            created: now,
            last_updated: Some(now),
        }
    }
}

impl From<Coupon> for CouponDto {
    fn from(coupon: Coupon) -> Self {
        CouponDto {
            id: coupon.id,
            name: coupon.name,
            percent: coupon.percent,
            is_active: coupon.is_active,
            created: coupon.created,
            last_updated: coupon.last_updated,
        }
    }
}

impl From<LocalUser> for UserDto {
    fn from(user: LocalUser) -> Self {
        UserDto {
            id: user.id,
            user_name: user.user_name,
            name: user.name,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_dto_maps_to_unsaved_coupon() {
        let coupon = Coupon::from(CouponCreateDto {
            name: "SUMMER10".into(),
            percent: 10,
            is_active: true,
        });

        assert_eq!(coupon.id, 0);
        assert_eq!(coupon.name, "SUMMER10");
        assert_eq!(coupon.percent, 10);
        assert!(coupon.is_active);
        assert!(coupon.last_updated.is_none());
    }

    #[test]
    fn update_dto_stamps_last_updated() {
        let coupon = Coupon::from(CouponUpdateDto {
            id: 4,
            name: "WINTER".into(),
            percent: 35,
            is_active: false,
        });

        assert_eq!(coupon.id, 4);
        assert!(coupon.last_updated.is_some());
    }

    #[test]
    fn envelope_uses_camel_case_and_null_result() {
        let envelope: ApiResponse<CouponDto> =
            ApiResponse::failure(StatusCode::BAD_REQUEST, vec!["Invalid Id".into()]);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["isSuccess"], false);
        assert_eq!(json["errorMessages"][0], "Invalid Id");
        assert!(json["result"].is_null());
    }

    #[test]
    fn create_dto_defaults_missing_active_flag() {
        let dto: CouponCreateDto =
            serde_json::from_str(r#"{"name":"SUMMER10","percent":10}"#).unwrap();
        assert!(!dto.is_active);
    }
}
