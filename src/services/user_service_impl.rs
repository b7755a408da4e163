//! Default implementation of the `UserService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::{ActivationPolicy, PasswordPolicy, SecurityConfig};
use crate::db::UserStore;
use crate::domain::{Page, PageRequest, UserId};
use crate::models::{User, UserSearchForm};
use crate::services::password_generator::PasswordGenerator;
use crate::services::user_service::{UserError, UserService};

pub struct DefaultUserService {
    store: Arc<dyn UserStore>,
    generator: Arc<dyn PasswordGenerator>,
    password_policy: PasswordPolicy,
    activation: ActivationPolicy,
}

impl DefaultUserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, generator: Arc<dyn PasswordGenerator>) -> Self {
        Self {
            store,
            generator,
            password_policy: PasswordPolicy::default(),
            activation: ActivationPolicy::default(),
        }
    }

    #[must_use]
    pub fn from_config(
        store: Arc<dyn UserStore>,
        generator: Arc<dyn PasswordGenerator>,
        security: &SecurityConfig,
    ) -> Self {
        Self::new(store, generator)
            .with_password_policy(security.password_policy)
            .with_activation_policy(security.activation)
    }

    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    #[must_use]
    pub fn with_activation_policy(mut self, policy: ActivationPolicy) -> Self {
        self.activation = policy;
        self
    }
}

/// Enough of an activation key to correlate log lines without leaking it.
fn key_prefix(hash_key: &str) -> String {
    hash_key.chars().take(8).collect()
}

#[async_trait]
impl UserService for DefaultUserService {
    async fn find(&self, id: UserId) -> Result<User, UserError> {
        debug!(user_id = %id, "find()");

        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("id {id}")))
    }

    async fn find_by_username(&self, username: &str) -> Result<User, UserError> {
        debug!(username, "find_by_username()");

        self.store
            .find_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("username '{username}'")))
    }

    async fn find_all(
        &self,
        page: PageRequest,
        search: &UserSearchForm,
    ) -> Result<Page<User>, UserError> {
        debug!(page = page.page, size = page.size, ?search, "find_all()");

        if page.size == 0 {
            return Err(UserError::Validation(
                "Page size must be greater than zero".to_string(),
            ));
        }

        Ok(self.store.find_all(page, search).await?)
    }

    async fn create(&self, user: User) -> Result<User, UserError> {
        debug!(username = %user.username, "create()");

        let created = self.store.save(&user).await?;
        if let Some(id) = created.id {
            info!(user_id = %id, username = %created.username, "User created");
        }
        Ok(created)
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        debug!(user_id = ?user.id, username = %user.username, "update()");

        Ok(self.store.save(&user).await?)
    }

    async fn delete(&self, id: UserId) -> Result<(), UserError> {
        debug!(user_id = %id, "delete()");

        if self.store.delete(id).await? {
            info!(user_id = %id, "User deleted");
        } else {
            debug!(user_id = %id, "delete() on unknown user ignored");
        }
        Ok(())
    }

    async fn activate(&self, hash_key: &str) -> Result<(), UserError> {
        if hash_key.trim().is_empty() {
            warn!("Rejected activation with a blank key");
            metrics::counter!("user_activations_total", "outcome" => "blank_key").increment(1);
            return Err(UserError::Activation(
                "activation key must not be blank".to_string(),
            ));
        }

        let key = key_prefix(hash_key);
        info!(key_prefix = %key, "Activating user");

        let Some(user) = self.store.find_by_hash_key(hash_key).await? else {
            error!(key_prefix = %key, "Cannot activate user: unknown activation key");
            metrics::counter!("user_activations_total", "outcome" => "unknown_key").increment(1);
            return Err(UserError::Activation(
                "no account holds this activation key".to_string(),
            ));
        };

        let id = user
            .id
            .ok_or_else(|| UserError::Internal("Stored user has no id".to_string()))?;

        if user.active && !self.activation.consumes_key() {
            debug!(user_id = %id, "User already active, activation replay ignored");
            metrics::counter!("user_activations_total", "outcome" => "already_active")
                .increment(1);
            return Ok(());
        }

        let activated = self
            .store
            .mark_activated(id, hash_key, self.activation.consumes_key())
            .await?;

        if !activated {
            warn!(user_id = %id, key_prefix = %key, "Activation key consumed concurrently");
            metrics::counter!("user_activations_total", "outcome" => "key_consumed").increment(1);
            return Err(UserError::Activation(
                "activation key has already been used".to_string(),
            ));
        }

        info!(user_id = %id, username = %user.username, "User activated");
        metrics::counter!("user_activations_total", "outcome" => "activated").increment(1);
        Ok(())
    }

    fn generate_password(&self) -> Result<String, UserError> {
        let policy = &self.password_policy;

        let password = self
            .generator
            .generate(
                policy.length,
                policy.min_uppercase,
                policy.min_digits,
                policy.min_special,
            )
            .map_err(|e| {
                error!(error = %e, ?policy, "Password policy cannot be satisfied");
                UserError::from(e)
            })?;

        metrics::counter!("passwords_generated_total").increment(1);
        Ok(password)
    }
}
