pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod observability;
pub mod services;
pub mod state;

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, UserCommands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let prometheus_handle = observability::init_metrics(&config.observability)?;
    let metrics_path = PathBuf::from(&config.observability.metrics_path);

    let result = run_command(config, command).await;

    if let Some(handle) = &prometheus_handle {
        if let Err(e) = observability::write_snapshot(handle, &metrics_path).await {
            warn!(error = %e, "Failed to write metrics snapshot");
        }
    }

    result
}

async fn run_command(config: Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml with default settings.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Commands::Password {
            length,
            min_upper,
            min_digits,
            min_special,
        } => {
            let state = SharedState::new(config).await?;
            cli::cmd_password(&state, length, min_upper, min_digits, min_special)
        }

        Commands::User { command } => {
            let state = SharedState::new(config).await?;
            run_user_command(&state, command).await
        }
    }
}

async fn run_user_command(state: &SharedState, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::List {
            page,
            size,
            username,
            email,
            active,
            json,
        } => cli::cmd_user_list(state, page, size, username, email, active, json).await,

        UserCommands::Show { user, json } => cli::cmd_user_show(state, &user, json).await,

        UserCommands::Add {
            username,
            email,
            first_name,
            last_name,
        } => cli::cmd_user_add(state, &username, email, first_name, last_name).await,

        UserCommands::Activate { hash_key } => cli::cmd_user_activate(state, &hash_key).await,

        UserCommands::ResetPassword { id } => cli::cmd_user_reset_password(state, id).await,

        UserCommands::Delete { id } => cli::cmd_user_delete(state, id).await,
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `general.log_level`.
/// Logs go to stderr so command output on stdout stays scriptable.
fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.observability.log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
