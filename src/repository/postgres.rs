//! PostgreSQL storage backend.
//!
//! Tables are created by the embedded migrations in `migrations/`. A coupon
//! commit runs inside a single transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use super::{Change, CouponStore, Result, UserStore};
use crate::models::{Coupon, LocalUser, NewUser};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl CouponStore for PgStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as("SELECT * FROM coupons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as("SELECT * FROM coupons WHERE LOWER(name) = LOWER($1) LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    async fn list(&self) -> Result<Vec<Coupon>> {
        let coupons = sqlx::query_as("SELECT * FROM coupons ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(coupons)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<Coupon>> {
        let mut tx = self.pool.begin().await?;
        let mut written = Vec::new();

        for change in changes {
            match change {
                Change::Create(coupon) => {
                    let row: Coupon = sqlx::query_as(
                        r#"
                        INSERT INTO coupons (name, percent, is_active, created, last_updated)
                        VALUES ($1, $2, $3, $4, $5)
                        RETURNING *
                        "#,
                    )
                    .bind(&coupon.name)
                    .bind(coupon.percent)
                    .bind(coupon.is_active)
                    .bind(coupon.created)
                    .bind(coupon.last_updated)
                    .fetch_one(&mut *tx)
                    .await?;
                    written.push(row);
                }
                Change::Update(coupon) => {
                    let row: Option<Coupon> = sqlx::query_as(
                        r#"
                        UPDATE coupons
                        SET name = $1, percent = $2, is_active = $3, last_updated = $4
                        WHERE id = $5
                        RETURNING *
                        "#,
                    )
                    .bind(&coupon.name)
                    .bind(coupon.percent)
                    .bind(coupon.is_active)
                    .bind(coupon.last_updated)
                    .bind(coupon.id)
                    .fetch_optional(&mut *tx)
                    .await?;
                    written.extend(row);
                }
                Change::Remove(coupon) => {
                    sqlx::query("DELETE FROM coupons WHERE id = $1")
                        .bind(coupon.id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        // An early return above drops `tx`, which rolls back.
        tx.commit().await?;
        Ok(written)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, user_name: &str) -> Result<Option<LocalUser>> {
        let user = sqlx::query_as("SELECT * FROM local_users WHERE LOWER(user_name) = LOWER($1)")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<Option<LocalUser>> {
        let inserted: std::result::Result<LocalUser, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO local_users (user_name, name, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.user_name)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(Some(row)),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                warn!("Username {} was taken concurrently", user.user_name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
