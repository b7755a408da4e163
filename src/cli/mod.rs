//! CLI module - Command-line interface for the platform core
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Platform core - user accounts and credentials
#[derive(Parser)]
#[command(name = "platform")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage user accounts
    #[command(alias = "u")]
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Generate a password (defaults from security.password_policy)
    #[command(alias = "pw")]
    Password {
        #[arg(long)]
        length: Option<usize>,
        #[arg(long)]
        min_upper: Option<usize>,
        #[arg(long)]
        min_digits: Option<usize>,
        #[arg(long)]
        min_special: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users page by page
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "20")]
        size: u64,
        /// Only usernames containing this text
        #[arg(long)]
        username: Option<String>,
        /// Only emails containing this text
        #[arg(long)]
        email: Option<String>,
        /// Only active (true) or inactive (false) accounts
        #[arg(long)]
        active: Option<bool>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single user by id or username
    Show {
        user: String,
        #[arg(long)]
        json: bool,
    },

    /// Register an inactive user with a generated password
    Add {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Activate an account with its activation key
    Activate { hash_key: String },

    /// Replace a user's password with a generated one
    ResetPassword { id: u32 },

    /// Delete a user
    #[command(alias = "rm")]
    Delete { id: u32 },
}

pub use commands::*;
