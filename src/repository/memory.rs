//! In-process storage backend.
//!
//! Holds coupons and users in ordered maps behind async read/write locks.
//! Ids are assigned sequentially from 1, like a SERIAL column. Nothing
//! survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Change, CouponStore, Result, UserStore};
use crate::models::{Coupon, LocalUser, NewUser};

struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    coupons: RwLock<Table<Coupon>>,
    users: RwLock<Table<LocalUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().await.rows.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Coupon>> {
        let name = name.to_lowercase();
        Ok(self
            .coupons
            .read()
            .await
            .rows
            .values()
            .find(|c| c.name.to_lowercase() == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Coupon>> {
        Ok(self.coupons.read().await.rows.values().cloned().collect())
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<Coupon>> {
        // Single write guard for the whole batch.
        let mut table = self.coupons.write().await;
        let mut written = Vec::new();

        for change in changes {
            match change {
                Change::Create(mut coupon) => {
                    coupon.id = table.allocate_id();
                    table.rows.insert(coupon.id, coupon.clone());
                    written.push(coupon);
                }
                Change::Update(coupon) => {
                    if let Some(stored) = table.rows.get_mut(&coupon.id) {
                        stored.name = coupon.name;
                        stored.percent = coupon.percent;
                        stored.is_active = coupon.is_active;
                        stored.last_updated = coupon.last_updated;
                        written.push(stored.clone());
                    }
                }
                Change::Remove(coupon) => {
                    table.rows.remove(&coupon.id);
                }
            }
        }

        Ok(written)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, user_name: &str) -> Result<Option<LocalUser>> {
        let user_name = user_name.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .rows
            .values()
            .find(|u| u.user_name.to_lowercase() == user_name)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<Option<LocalUser>> {
        let mut table = self.users.write().await;
        let lowered = user.user_name.to_lowercase();
        if table
            .rows
            .values()
            .any(|u| u.user_name.to_lowercase() == lowered)
        {
            return Ok(None);
        }

        let stored = LocalUser {
            id: table.allocate_id(),
            user_name: user.user_name,
            name: user.name,
            password: user.password_hash,
            role: user.role,
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }
}
