//! Sign-in, user administration, configuration and health subcommands.

use console::{style, Term};
use serde_json::Value;

use compscope_client::{CreateUserRequest, UpdateUserRequest};

use super::output::{error, success, Output};
use crate::commands;
use crate::state::AppState;

pub async fn cmd_login(
    state: &AppState,
    out: &mut Output,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let term = Term::stderr();
            term.write_str("Password: ")?;
            term.read_secure_line()?
        }
    };
    if let Some(user) = out.finish(commands::login(state, email, &password).await)? {
        if let Some(name) = user.get("name").and_then(Value::as_str) {
            println!("Signed in as {}", style(name).bold());
        }
    }
    Ok(())
}

pub async fn cmd_logout(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    match out.finish(commands::logout(state).await)? {
        Some(true) => println!("{} Signed out", success()),
        Some(false) => println!("Not signed in"),
        None => {}
    }
    Ok(())
}

pub async fn cmd_whoami(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if let Some(profile) = out.finish(commands::my_profile(state).await)? {
        let user = profile.get("user").unwrap_or(&profile);
        let field = |key: &str| user.get(key).and_then(Value::as_str).unwrap_or("—").to_string();
        println!("{} <{}>", style(field("name")).bold(), field("email"));
        println!("  role: {}", field("role"));
    }
    Ok(())
}

pub async fn cmd_users_list(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if let Some(body) = out.finish(commands::list_users(state).await)? {
        let users = body
            .get("data")
            .or_else(|| body.get("users"))
            .unwrap_or(&body)
            .as_array()
            .cloned()
            .unwrap_or_default();
        for user in &users {
            let field = |key: &str| user.get(key).and_then(Value::as_str).unwrap_or("").to_string();
            println!(
                "{}  {} <{}>  {}",
                style(field("_id")).dim(),
                field("name"),
                field("email"),
                style(field("role")).cyan()
            );
        }
        println!("\n{} user(s)", users.len());
    }
    Ok(())
}

pub async fn cmd_users_create(
    state: &AppState,
    out: &mut Output,
    request: CreateUserRequest,
) -> anyhow::Result<()> {
    out.finish(commands::create_user(state, request).await)?;
    Ok(())
}

pub async fn cmd_users_update(
    state: &AppState,
    out: &mut Output,
    user_id: &str,
    request: UpdateUserRequest,
) -> anyhow::Result<()> {
    out.finish(commands::update_user(state, user_id, request).await)?;
    Ok(())
}

pub async fn cmd_users_delete(state: &AppState, out: &mut Output, user_id: &str) -> anyhow::Result<()> {
    out.finish(commands::delete_user(state, user_id).await)?;
    Ok(())
}

pub async fn cmd_config_show(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if let Some(config) = out.finish(commands::get_settings(state).await)? {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(())
}

pub async fn cmd_config_set(state: &AppState, out: &mut Output, key: &str, value: &str) -> anyhow::Result<()> {
    if out.finish(commands::set_setting(state, key, value).await)?.is_some() {
        println!("{} {} updated", success(), key);
    }
    Ok(())
}

pub async fn cmd_health(state: &AppState, out: &mut Output, probe_api: bool) -> anyhow::Result<()> {
    if let Some(health) = out.finish(commands::get_health(state, probe_api).await)? {
        let mark = |ok: bool| if ok { success() } else { error() };
        println!("{} v{} {}", health.service, health.version, style(&health.status).bold());
        println!("  {} database", mark(health.database));
        println!("  {} config", mark(health.config));
        println!("  {} signed in", mark(health.signed_in));
        if let Some(api) = health.api {
            println!("  {} api", mark(api));
        }
    }
    Ok(())
}
