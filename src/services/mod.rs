pub mod password_generator;
pub use password_generator::{PasswordError, PasswordGenerator, RandomPasswordGenerator};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::DefaultUserService;
