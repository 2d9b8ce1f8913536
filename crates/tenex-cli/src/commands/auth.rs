use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use tenex_chat::{AuthClient, ChatError, ClientConfig};
use tenex_shared::AuthState;

use crate::output::{OutputFormat, json::print_json};

pub async fn whoami(client: ClientConfig, format: OutputFormat) -> Result<()> {
    let auth = AuthClient::new(client)?;

    match auth.current_user().await {
        Ok(user) => {
            if format.is_json() {
                return print_json(&AuthState::signed_in(user));
            }
            println!("{} <{}>", user.name.bold(), user.email);
            Ok(())
        }
        Err(ChatError::Unauthorized) => {
            if format.is_json() {
                return print_json(&AuthState::signed_out());
            }
            println!("Not authenticated");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn status(client: ClientConfig, format: OutputFormat) -> Result<()> {
    let base_url = client.base_url.clone();
    let has_session = client.session_cookie.is_some();
    let auth = AuthClient::new(client)?;
    let status = auth.status().await?;

    if format.is_json() {
        return print_json(&json!({
            "server": base_url,
            "session_configured": has_session,
            "authenticated": status.authenticated,
            "user": status.user,
        }));
    }

    println!("Tenex Status");
    println!("Server: {base_url}");
    println!(
        "Session cookie: {}",
        if has_session { "configured" } else { "not set" }
    );
    match (status.authenticated, &status.user) {
        (true, Some(user)) => println!("Auth: {} as {}", "authenticated".green(), user.email),
        (true, None) => println!("Auth: {}", "authenticated".green()),
        (false, _) => println!("Auth: {}", "not authenticated".yellow()),
    }
    Ok(())
}

pub async fn logout(client: ClientConfig, format: OutputFormat) -> Result<()> {
    let auth = AuthClient::new(client)?;
    auth.logout().await?;
    tracing::info!("Session ended");

    if format.is_json() {
        return print_json(&json!({ "logged_out": true }));
    }
    println!("Signed out");
    Ok(())
}
