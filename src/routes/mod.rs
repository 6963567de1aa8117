//! HTTP route modules for the coupon API.
//!
//! - `coupons`: coupon CRUD under `/api/coupon`
//! - `auth`: `/api/login` and `/api/register`

pub mod auth;
pub mod coupons;
