use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::config::SecurityConfig;
use crate::domain::{Page, PageRequest, UserId};
use crate::entities::users;
use crate::models::{User, UserSearchForm};

/// Persistence collaborator for user records.
///
/// Implementations must make [`UserStore::mark_activated`] atomic: of two
/// concurrent calls with the same id and key, at most one may report success
/// when the key is consumed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_hash_key(&self, hash_key: &str) -> Result<Option<User>>;

    /// Inserts the user when it has no id (or the id is unknown), updates it otherwise.
    async fn save(&self, user: &User) -> Result<User>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> Result<bool>;

    async fn find_all(&self, page: PageRequest, filter: &UserSearchForm) -> Result<Page<User>>;

    /// Sets `active` on the user whose id and activation key both match,
    /// clearing the key in the same statement when `consume_key` is set.
    ///
    /// Returns `false` when no row matched.
    async fn mark_activated(&self, id: UserId, hash_key: &str, consume_key: bool)
    -> Result<bool>;
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn insert(&self, user: &User, now: String) -> Result<User> {
        let mut active = users::ActiveModel {
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            hash_key: Set(user.hash_key.clone()),
            active: Set(user.active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(id) = user.id {
            active.id = Set(id.value());
        }

        let model = active
            .insert(&self.conn)
            .await
            .with_context(|| format!("Failed to insert user {}", user.username))?;

        Ok(User::from(model))
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    async fn find_by_hash_key(&self, hash_key: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::HashKey.eq(hash_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by activation key")?;

        Ok(user.map(User::from))
    }

    async fn save(&self, user: &User) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let Some(id) = user.id else {
            return self.insert(user, now).await;
        };

        let existing = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?;

        let Some(existing) = existing else {
            return self.insert(user, now).await;
        };

        let mut active: users::ActiveModel = existing.into();
        active.username = Set(user.username.clone());
        active.email = Set(user.email.clone());
        active.first_name = Set(user.first_name.clone());
        active.last_name = Set(user.last_name.clone());
        active.password_hash = Set(user.password_hash.clone());
        active.hash_key = Set(user.hash_key.clone());
        active.active = Set(user.active);
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .with_context(|| format!("Failed to update user {id}"))?;

        Ok(User::from(model))
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let result = users::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    async fn find_all(&self, page: PageRequest, filter: &UserSearchForm) -> Result<Page<User>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);

        if let Some(username) = &filter.username {
            query = query.filter(users::Column::Username.contains(username));
        }

        if let Some(email) = &filter.email {
            query = query.filter(users::Column::Email.contains(email));
        }

        if let Some(active) = filter.active {
            query = query.filter(users::Column::Active.eq(active));
        }

        let paginator = query.paginate(&self.conn, page.size);
        let total_items = paginator
            .num_items()
            .await
            .context("Failed to count users")?;
        let items = paginator
            .fetch_page(page.index())
            .await
            .context("Failed to fetch user page")?;

        Ok(Page::new(
            items.into_iter().map(User::from).collect(),
            page,
            total_items,
        ))
    }

    async fn mark_activated(
        &self,
        id: UserId,
        hash_key: &str,
        consume_key: bool,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut update = users::Entity::update_many()
            .col_expr(users::Column::Active, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(now));

        if consume_key {
            update = update.col_expr(users::Column::HashKey, Expr::value(Option::<String>::None));
        }

        let result = update
            .filter(users::Column::Id.eq(id.value()))
            .filter(users::Column::HashKey.eq(hash_key))
            .exec(&self.conn)
            .await
            .context("Failed to activate user")?;

        Ok(result.rows_affected == 1)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hash_password_verifies_with_configured_params() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };

        let hash = hash_password("Secur3P@ssw0rd!", &config).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"Secur3P@ssw0rd!", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong-password", &parsed)
                .is_err()
        );
    }

    #[test]
    fn hash_password_rejects_invalid_params() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1,
            ..SecurityConfig::default()
        };

        let err = hash_password("anything", &config).unwrap_err();
        assert!(err.to_string().contains("Invalid Argon2 params"));
    }
}
