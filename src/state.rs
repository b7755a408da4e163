use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::db::{Store, UserStore};
use crate::services::{DefaultUserService, PasswordGenerator, RandomPasswordGenerator, UserService};

/// Long-lived handles shared by every command.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub password_generator: Arc<dyn PasswordGenerator>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;
        store
            .ping()
            .await
            .context("Database did not answer after connecting")?;

        let password_generator =
            Arc::new(RandomPasswordGenerator::new()) as Arc<dyn PasswordGenerator>;
        let user_store = Arc::new(store.user_repo()) as Arc<dyn UserStore>;

        let user_service = Arc::new(DefaultUserService::from_config(
            user_store,
            password_generator.clone(),
            &config.security,
        )) as Arc<dyn UserService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            password_generator,
            user_service,
        })
    }
}
