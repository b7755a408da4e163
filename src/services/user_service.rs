//! Domain service for the user lifecycle.
//!
//! Covers lookup, paged search, create/update/delete, account activation and
//! password generation.

use thiserror::Error;

use crate::domain::{Page, PageRequest, UserId};
use crate::models::{User, UserSearchForm};
use crate::services::password_generator::PasswordError;

/// Errors specific to user lifecycle operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid or unknown activation token: {0}")]
    Activation(String),

    #[error("Password generator misconfigured: {0}")]
    Configuration(#[from] PasswordError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            Self::Database(format!("{err:#}"))
        } else {
            Self::Internal(format!("{err:#}"))
        }
    }
}

/// Domain service trait for user lifecycle management.
///
/// # Examples
///
/// ```rust,ignore
/// use platform_core::services::{UserError, UserService};
/// use std::sync::Arc;
///
/// async fn example(service: Arc<dyn UserService>) -> Result<(), UserError> {
///     service.activate("3f2a...").await?;
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no user has this id.
    async fn find(&self, id: UserId) -> Result<User, UserError>;

    /// Looks a user up by username.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no user has this username.
    async fn find_by_username(&self, username: &str) -> Result<User, UserError>;

    /// Returns one page of users matching `search`.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for a zero page size.
    async fn find_all(
        &self,
        page: PageRequest,
        search: &UserSearchForm,
    ) -> Result<Page<User>, UserError>;

    /// Persists a new user and returns it with its assigned id.
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Persists the mutated fields of an existing user.
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Removes a user. Deleting an unknown id is not an error.
    async fn delete(&self, id: UserId) -> Result<(), UserError>;

    /// Activates the account holding `hash_key`.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Activation`] if no account holds the key, or if a
    /// single-use key was consumed by a concurrent activation.
    async fn activate(&self, hash_key: &str) -> Result<(), UserError>;

    /// Generates a password following the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Configuration`] if the policy is infeasible.
    fn generate_password(&self) -> Result<String, UserError>;
}
