//! Resolve the caller behind a bearer token using the backend's auth
//! service.

use std::sync::LazyLock;

use anyhow::{Error, Result};
use http::HeaderMap;
use regex::Regex;
use serde::Deserialize;

use crate::core::AuthBackendConfig;

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Bearer\s+(.+)$").expect("valid bearer regex"));

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let captures = BEARER.captures(value.trim())?;
    Some(captures.get(1)?.as_str().trim().to_string())
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Clone)]
pub struct IdentityResolver {
    client: reqwest::Client,
    config: AuthBackendConfig,
}

impl IdentityResolver {
    pub fn new(config: AuthBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Look up the user owning `token`. Returns `Ok(None)` when the
    /// auth service rejects the token; transport failures are errors.
    pub async fn user_id(&self, token: &str) -> Result<Option<String>, Error> {
        let url = format!("{}/auth/v1/user", self.config.url);
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::debug!("Auth service rejected token with status {}", resp.status());
            return Ok(None);
        }

        let user: AuthUser = resp.json().await?;
        if user.id.is_empty() {
            return Ok(None);
        }
        Ok(Some(user.id))
    }
}
