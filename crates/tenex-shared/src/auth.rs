//! Authenticated user types shared with the auth collaborator.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Signed-in user as reported by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub picture: Option<String>,
}

/// Client-side view of the login state
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl AuthState {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
            is_authenticated: true,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

/// Body of `GET /auth/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}
