use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;
use crate::entities::users;

/// A platform user account.
///
/// `id` is `None` until the record has been saved once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub hash_key: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    #[must_use]
    pub fn builder(username: impl Into<String>) -> UserBuilder {
        UserBuilder::new(username)
    }

    /// Marks the account active and, if `consume_key` is set, drops the
    /// activation token so it cannot be replayed.
    pub fn activate(&mut self, consume_key: bool) {
        self.active = true;
        if consume_key {
            self.hash_key = None;
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: Some(UserId::new(model.id)),
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            password_hash: model.password_hash,
            hash_key: model.hash_key,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserBuildError {
    #[error("Username must not be empty")]
    EmptyUsername,
}

/// Fluent builder for new, not yet persisted users.
///
/// Built users are always inactive. A fresh activation key is issued unless
/// a non-blank one was supplied explicitly.
#[derive(Debug, Clone, Default)]
pub struct UserBuilder {
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password_hash: Option<String>,
    hash_key: Option<String>,
}

impl UserBuilder {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    #[must_use]
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    #[must_use]
    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    #[must_use]
    pub fn hash_key(mut self, hash_key: impl Into<String>) -> Self {
        self.hash_key = Some(hash_key.into());
        self
    }

    pub fn build(self) -> Result<User, UserBuildError> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(UserBuildError::EmptyUsername);
        }

        let now = chrono::Utc::now().to_rfc3339();

        Ok(User {
            id: None,
            username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            hash_key: Some(
                self.hash_key
                    .filter(|key| !key.trim().is_empty())
                    .unwrap_or_else(generate_hash_key),
            ),
            active: false,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Filters applied to paged user listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSearchForm {
    /// Substring match on the username
    pub username: Option<String>,
    /// Substring match on the email address
    pub email: Option<String>,
    pub active: Option<bool>,
}

/// Generate a random activation key (64 character hex string)
#[must_use]
pub fn generate_hash_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_inactive_user_with_key() {
        let user = User::builder("  jdoe ")
            .email("jdoe@example.com")
            .first_name("John")
            .build()
            .unwrap();

        assert_eq!(user.username, "jdoe");
        assert!(!user.active);
        assert!(user.id.is_none());
        assert_eq!(user.hash_key.as_deref().map(str::len), Some(64));
        assert_eq!(user.display_name(), "John");
    }

    #[test]
    fn builder_keeps_explicit_hash_key() {
        let user = UserBuilder::new("jdoe").hash_key("abc").build().unwrap();
        assert_eq!(user.hash_key.as_deref(), Some("abc"));
    }

    #[test]
    fn builder_replaces_blank_hash_key() {
        for blank in ["", "   ", "\t\n"] {
            let user = UserBuilder::new("jdoe").hash_key(blank).build().unwrap();
            let key = user.hash_key.unwrap();
            assert_eq!(key.len(), 64);
            assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn builder_rejects_blank_username() {
        assert_eq!(
            UserBuilder::new("   ").build().unwrap_err(),
            UserBuildError::EmptyUsername
        );
    }

    #[test]
    fn hash_keys_are_hex_and_distinct() {
        let a = generate_hash_key();
        let b = generate_hash_key();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn activate_consumes_key_only_when_asked() {
        let mut user = UserBuilder::new("jdoe").build().unwrap();
        user.activate(false);
        assert!(user.active);
        assert!(user.hash_key.is_some());

        user.activate(true);
        assert!(user.hash_key.is_none());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = UserBuilder::new("jdoe")
            .password_hash("$argon2id$secret")
            .build()
            .unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
