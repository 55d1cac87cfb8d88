use std::env;

use thiserror::Error;

/// Errors for settings that a request needs but the server was started
/// without. These are fatal to the request that hits them, never to
/// the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing VAPID configuration (VAPID_PUBLIC_KEY, VAPID_PRIVATE_KEY, VAPID_SUBJECT)")]
    MissingVapid,
    #[error("Webhook secret not configured on server")]
    MissingWebhookSecret,
    #[error("Missing auth backend configuration (SUPABASE_URL, SUPABASE_ANON_KEY)")]
    MissingAuthBackend,
}

/// Key pair and contact identity used to sign Web Push requests.
///
/// Both keys are base64url encoded: the public key is the 65 byte
/// uncompressed P-256 point handed to browsers as the
/// `applicationServerKey`, the private key is the raw 32 byte scalar.
#[derive(Clone, Debug)]
pub struct VapidConfig {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

/// Connection to the backend auth service used to turn bearer tokens
/// into user ids.
#[derive(Clone, Debug)]
pub struct AuthBackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub vapid: Option<VapidConfig>,
    pub webhook_secret: Option<String>,
    pub auth_backend: Option<AuthBackendConfig>,
    pub claims_table: String,
}

impl AppConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any key lookup. Every setting is also
    /// accepted with a `VITE_` prefix since the frontend build shares
    /// the same environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&format!("VITE_{}", name)))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_path = get("COSPEC_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db/cospec.sqlite", storage_path.trim_end_matches('/'));

        let vapid = match (
            get("VAPID_PUBLIC_KEY"),
            get("VAPID_PRIVATE_KEY"),
            get("VAPID_SUBJECT"),
        ) {
            (Some(public_key), Some(private_key), Some(subject)) => Some(VapidConfig {
                public_key,
                private_key,
                subject,
            }),
            (None, None, None) => None,
            _ => {
                tracing::warn!("Incomplete VAPID configuration, push delivery is disabled");
                None
            }
        };

        let auth_backend = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(AuthBackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            _ => None,
        };

        Self {
            storage_path,
            db_path,
            vapid,
            webhook_secret: get("WEBHOOK_SECRET"),
            auth_backend,
            claims_table: get("CLAIMS_TABLE").unwrap_or("reclamos".to_string()),
        }
    }

    pub fn require_vapid(&self) -> Result<&VapidConfig, ConfigError> {
        self.vapid.as_ref().ok_or(ConfigError::MissingVapid)
    }

    pub fn require_webhook_secret(&self) -> Result<&str, ConfigError> {
        self.webhook_secret
            .as_deref()
            .ok_or(ConfigError::MissingWebhookSecret)
    }

    pub fn require_auth_backend(&self) -> Result<&AuthBackendConfig, ConfigError> {
        self.auth_backend
            .as_ref()
            .ok_or(ConfigError::MissingAuthBackend)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
