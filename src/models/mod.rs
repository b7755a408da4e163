pub mod user;

pub use user::{User, UserBuildError, UserBuilder, UserSearchForm};
