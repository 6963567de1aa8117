//! # Coupon API Library
//!
//! Exposes the Axum router and modules so integration tests can create
//! an in-process server without requiring `cargo run` in another terminal.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::repository::{AuthRepository, CouponRepository, CouponStore, MemoryStore, UserStore};

/// Collaborators shared by every request, resolved once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub coupons: Arc<dyn CouponStore>,
    pub auth: AuthRepository,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        coupons: Arc<dyn CouponStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let config = Arc::new(config);
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_minutes);
        let auth = AuthRepository::new(users, tokens.clone(), config.clone());
        AppState {
            config,
            coupons,
            auth,
            tokens,
        }
    }

    /// State backed by a fresh [`MemoryStore`] for both coupons and users.
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        AppState::new(config, store.clone(), store)
    }

    /// A new unit of work for the current request.
    pub fn coupon_repository(&self) -> CouponRepository {
        CouponRepository::new(self.coupons.clone())
    }
}

/// Build the Axum router with all route modules and middleware.
///
/// This function does NOT start a server or run migrations.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::coupons::router())
        .merge(routes::auth::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
