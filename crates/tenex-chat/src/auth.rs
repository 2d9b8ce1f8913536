//! Client for the auth collaborator endpoints.
//!
//! Credentials are obtained elsewhere (browser OAuth flow); this client only
//! asks the server who the configured session belongs to.

use reqwest::{Client, StatusCode};
use tenex_shared::{AuthState, AuthStatus, User};

use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::http_client::build_http_client;
use crate::transport::http::response_to_error;

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    config: ClientConfig,
}

impl AuthClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(config.session_cookie.as_deref())?;
        Ok(Self { client, config })
    }

    /// Fetch the signed-in user. A 401 maps to [`ChatError::Unauthorized`].
    pub async fn current_user(&self) -> Result<User> {
        let response = self.client.get(self.config.auth_url("me")?).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED => Err(ChatError::Unauthorized),
            _ => Err(response_to_error(response).await),
        }
    }

    /// Ask the server whether the session is valid.
    pub async fn status(&self) -> Result<AuthStatus> {
        let response = self
            .client
            .get(self.config.auth_url("status")?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// True when the session belongs to a user. Any failure counts as signed out.
    pub async fn check_auth_status(&self) -> bool {
        match self.current_user().await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(%error, "Auth check failed");
                false
            }
        }
    }

    /// Resolve the client-side auth state.
    pub async fn auth_state(&self) -> AuthState {
        match self.current_user().await {
            Ok(user) => AuthState::signed_in(user),
            Err(_) => AuthState::signed_out(),
        }
    }

    /// End the server-side session.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .post(self.config.auth_url("logout")?)
            .send()
            .await?;

        // The server answers with a redirect to the landing page.
        if response.status().is_success() || response.status().is_redirection() {
            Ok(())
        } else {
            Err(response_to_error(response).await)
        }
    }
}
