//! User account command handlers

use anyhow::Context;

use crate::config::SecurityConfig;
use crate::db::hash_password;
use crate::domain::{PageRequest, UserId};
use crate::models::{User, UserSearchForm};
use crate::state::SharedState;

/// Argon2 is CPU-bound, so hashing runs off the async workers.
async fn hash_off_thread(password: &str, security: &SecurityConfig) -> anyhow::Result<String> {
    let password = password.to_string();
    let security = security.clone();
    tokio::task::spawn_blocking(move || hash_password(&password, &security))
        .await
        .context("Password hashing task panicked")?
}

fn user_id(id: u32) -> anyhow::Result<UserId> {
    Ok(UserId::new(i32::try_from(id).context("User id out of range")?))
}

fn print_user(user: &User) {
    let id = user.id.map_or_else(|| "-".to_string(), |id| id.to_string());
    let status = if user.active { "active" } else { "pending" };

    println!("{} {} [{}]", id, user.username, status);
    println!("  Name: {}", user.display_name());
    if let Some(email) = &user.email {
        println!("  Email: {email}");
    }
    println!("  Created: {} | Updated: {}", user.created_at, user.updated_at);
}

pub async fn cmd_user_list(
    state: &SharedState,
    page: u64,
    size: u64,
    username: Option<String>,
    email: Option<String>,
    active: Option<bool>,
    json: bool,
) -> anyhow::Result<()> {
    let search = UserSearchForm {
        username,
        email,
        active,
    };
    let result = state
        .user_service
        .find_all(PageRequest::new(page, size), &search)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!(
        "Users (page {}/{}, {} total)",
        result.page, result.total_pages, result.total_items
    );
    println!("{:-<70}", "");
    for user in &result.items {
        print_user(user);
    }

    Ok(())
}

pub async fn cmd_user_show(state: &SharedState, user: &str, json: bool) -> anyhow::Result<()> {
    let found = match user.parse::<u32>() {
        Ok(id) => state.user_service.find(user_id(id)?).await?,
        Err(_) => state.user_service.find_by_username(user).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        print_user(&found);
    }
    Ok(())
}

pub async fn cmd_user_add(
    state: &SharedState,
    username: &str,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> anyhow::Result<()> {
    let password = state.user_service.generate_password()?;
    let password_hash = hash_off_thread(&password, &state.config.security).await?;

    let mut builder = User::builder(username).password_hash(password_hash);
    if let Some(email) = email {
        builder = builder.email(email);
    }
    if let Some(first_name) = first_name {
        builder = builder.first_name(first_name);
    }
    if let Some(last_name) = last_name {
        builder = builder.last_name(last_name);
    }

    let created = state.user_service.create(builder.build()?).await?;

    print_user(&created);
    println!();
    println!("Initial password: {password}");
    if let Some(key) = &created.hash_key {
        println!("Activation key:   {key}");
        println!();
        println!("Activate with: platform user activate {key}");
    }
    Ok(())
}

pub async fn cmd_user_activate(state: &SharedState, hash_key: &str) -> anyhow::Result<()> {
    state.user_service.activate(hash_key).await?;
    println!("Account activated.");
    Ok(())
}

pub async fn cmd_user_reset_password(state: &SharedState, id: u32) -> anyhow::Result<()> {
    let mut user = state.user_service.find(user_id(id)?).await?;

    let password = state.user_service.generate_password()?;
    user.password_hash = Some(hash_off_thread(&password, &state.config.security).await?);
    let user = state.user_service.update(user).await?;

    println!("New password for {}: {password}", user.username);
    Ok(())
}

pub async fn cmd_user_delete(state: &SharedState, id: u32) -> anyhow::Result<()> {
    state.user_service.delete(user_id(id)?).await?;
    println!("User {id} deleted.");
    Ok(())
}
