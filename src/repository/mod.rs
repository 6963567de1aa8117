//! Repositories over pluggable storage.
//!
//! Storage backends implement [`CouponStore`] and [`UserStore`]. Handlers
//! never touch a store directly: coupon access goes through a per-request
//! [`CouponRepository`] unit of work, user access through [`AuthRepository`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::auth::{self, TokenIssuer, ADMIN_ROLE, CUSTOMER_ROLE};
use crate::config::AppConfig;
use crate::error::RepositoryError;
use crate::models::{
    Coupon, LocalUser, LoginRequestDto, LoginResponseDto, NewUser, RegistrationRequestDto,
    UserDto,
};

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// A staged write, applied on [`CouponRepository::save`].
#[derive(Debug, Clone)]
pub enum Change {
    Create(Coupon),
    Update(Coupon),
    Remove(Coupon),
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Coupon>>;

    /// Name matching is case-insensitive.
    async fn find_by_name(&self, name: &str) -> Result<Option<Coupon>>;

    async fn list(&self) -> Result<Vec<Coupon>>;

    /// Apply `changes` in order, all or nothing. Returns the rows written by
    /// creates and updates, as stored. Updates and removals that match no row
    /// are skipped.
    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<Coupon>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Username matching is case-insensitive.
    async fn find_by_username(&self, user_name: &str) -> Result<Option<LocalUser>>;

    /// Returns `None` if the username was taken by the time of the write.
    async fn insert(&self, user: NewUser) -> Result<Option<LocalUser>>;
}

/// Per-request unit of work over the coupon collection.
///
/// Reads go straight to the store. `create`, `update` and `remove` only
/// stage; nothing is persisted until `save`. Dropping the repository
/// discards whatever is still staged.
pub struct CouponRepository {
    store: Arc<dyn CouponStore>,
    pending: Vec<Change>,
}

impl CouponRepository {
    pub fn new(store: Arc<dyn CouponStore>) -> Self {
        CouponRepository {
            store,
            pending: Vec::new(),
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Coupon>> {
        self.store.find_by_id(id).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Coupon>> {
        self.store.find_by_name(name).await
    }

    pub async fn get_all(&self) -> Result<Vec<Coupon>> {
        self.store.list().await
    }

    pub fn create(&mut self, coupon: Coupon) {
        self.pending.push(Change::Create(coupon));
    }

    pub fn update(&mut self, coupon: Coupon) {
        self.pending.push(Change::Update(coupon));
    }

    pub fn remove(&mut self, coupon: Coupon) {
        self.pending.push(Change::Remove(coupon));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Commit everything staged so far. The staged list is cleared even when
    /// the commit fails; the store guarantees nothing was applied in that case.
    pub async fn save(&mut self) -> Result<Vec<Coupon>> {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Committing {} staged coupon changes", changes.len());
        self.store.commit(changes).await
    }
}

/// Username checks, credential verification and registration.
#[derive(Clone)]
pub struct AuthRepository {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    config: Arc<AppConfig>,
}

impl AuthRepository {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer, config: Arc<AppConfig>) -> Self {
        AuthRepository {
            users,
            tokens,
            config,
        }
    }

    pub async fn is_unique_user(&self, user_name: &str) -> Result<bool> {
        Ok(self.users.find_by_username(user_name).await?.is_none())
    }

    /// `None` covers both an unknown username and a wrong password.
    pub async fn login(&self, request: &LoginRequestDto) -> Result<Option<LoginResponseDto>> {
        let Some(user) = self.users.find_by_username(&request.user_name).await? else {
            return Ok(None);
        };
        let verified =
            auth::verify_password_blocking(request.password.clone(), user.password.clone()).await?;
        if !verified {
            return Ok(None);
        }

        let token = self.tokens.issue(&user)?;
        info!("User {} logged in", user.user_name);
        Ok(Some(LoginResponseDto {
            user: user.into(),
            token,
        }))
    }

    /// `None` when the username is blank or was taken at write time.
    pub async fn register(&self, request: &RegistrationRequestDto) -> Result<Option<UserDto>> {
        if request.user_name.trim().is_empty() {
            return Ok(None);
        }
        let role = if self.config.is_admin_username(&request.user_name) {
            ADMIN_ROLE
        } else {
            CUSTOMER_ROLE
        };
        let new_user = NewUser {
            user_name: request.user_name.clone(),
            name: request.name.clone(),
            password_hash: auth::hash_password_blocking(request.password.clone()).await?,
            role: role.to_string(),
        };

        let created = self.users.insert(new_user).await?;
        if let Some(ref user) = created {
            info!("Registered user {} with role {}", user.user_name, user.role);
        }
        Ok(created.map(UserDto::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CouponCreateDto;

    fn coupon(name: &str, percent: i32) -> Coupon {
        Coupon::from(CouponCreateDto {
            name: name.to_string(),
            percent,
            is_active: true,
        })
    }

    fn auth_repo(store: Arc<MemoryStore>) -> AuthRepository {
        let config = AppConfig {
            admin_usernames: crate::config::parse_admin_usernames("root"),
            ..AppConfig::default()
        };
        AuthRepository::new(store, TokenIssuer::new("test", 5), Arc::new(config))
    }

    #[tokio::test]
    async fn staged_create_is_invisible_until_save() {
        let store = Arc::new(MemoryStore::new());
        let mut repo = CouponRepository::new(store.clone());

        repo.create(coupon("SUMMER10", 10));
        assert!(repo.has_pending());
        assert!(repo.get_all().await.unwrap().is_empty());

        let written = repo.save().await.unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, 1);
        assert!(!repo.has_pending());
        assert_eq!(repo.get(1).await.unwrap().unwrap().name, "SUMMER10");
    }

    #[tokio::test]
    async fn dropped_repository_discards_staged_changes() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut repo = CouponRepository::new(store.clone());
            repo.create(coupon("LOST", 5));
        }
        let repo = CouponRepository::new(store);
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn name_lookup_ignores_case() {
        let store = Arc::new(MemoryStore::new());
        let mut repo = CouponRepository::new(store);
        repo.create(coupon("Summer10", 10));
        repo.save().await.unwrap();

        assert!(repo.get_by_name("SUMMER10").await.unwrap().is_some());
        assert!(repo.get_by_name("WINTER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_remove_apply_on_save() {
        let store = Arc::new(MemoryStore::new());
        let mut repo = CouponRepository::new(store);
        repo.create(coupon("A", 10));
        let created = repo.save().await.unwrap().remove(0);

        let mut changed = created.clone();
        changed.percent = 50;
        changed.last_updated = Some(chrono::Utc::now().naive_utc());
        repo.update(changed);
        repo.save().await.unwrap();

        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.percent, 50);
        assert_eq!(stored.created, created.created);

        repo.remove(stored);
        repo.save().await.unwrap();
        assert!(repo.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_does_not_distinguish_failure_causes() {
        let repo = auth_repo(Arc::new(MemoryStore::new()));
        let registered = repo
            .register(&RegistrationRequestDto {
                user_name: "alice".into(),
                name: "Alice".into(),
                password: "pa55word".into(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registered.role, CUSTOMER_ROLE);

        let wrong_password = LoginRequestDto {
            user_name: "alice".into(),
            password: "nope".into(),
        };
        let unknown_user = LoginRequestDto {
            user_name: "bob".into(),
            password: "pa55word".into(),
        };
        assert!(repo.login(&wrong_password).await.unwrap().is_none());
        assert!(repo.login(&unknown_user).await.unwrap().is_none());

        let ok = LoginRequestDto {
            user_name: "ALICE".into(),
            password: "pa55word".into(),
        };
        let response = repo.login(&ok).await.unwrap().unwrap();
        assert_eq!(response.user.user_name, "alice");
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn configured_admin_gets_admin_role() {
        let repo = auth_repo(Arc::new(MemoryStore::new()));
        let user = repo
            .register(&RegistrationRequestDto {
                user_name: "Root".into(),
                name: "Root".into(),
                password: "x".into(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, ADMIN_ROLE);
        assert!(!repo.is_unique_user("root").await.unwrap());
        assert!(repo.is_unique_user("someone").await.unwrap());
    }
}
