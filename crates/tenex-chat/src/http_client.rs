use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::error::{ChatError, Result};

const DISABLE_SYSTEM_PROXY_ENV: &str = "TENEX_DISABLE_SYSTEM_PROXY";

/// Build the shared HTTP client. Every request carries the session cookie when
/// one is configured, mirroring a browser fetch with credentials included.
pub(crate) fn build_http_client(session_cookie: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(session) = session_cookie {
        let mut value = HeaderValue::from_str(&format!("session_id={session}"))
            .map_err(|e| ChatError::InvalidSession(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(header::COOKIE, value);
    }

    let mut builder = Client::builder().default_headers(headers);
    if should_disable_system_proxy() {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_session() {
        assert!(build_http_client(None).is_ok());
    }

    #[test]
    fn rejects_cookie_with_control_characters() {
        assert!(build_http_client(Some("abc\ndef")).is_err());
    }
}
