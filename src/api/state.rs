use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::auth::IdentityResolver;
use crate::core::{AppConfig, ConfigError};
use crate::notify::{Dispatcher, PushSender, WebPushSender};

/// Read-only state shared by every request. Nothing in here is
/// mutated after startup.
pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    push_sender: Option<Arc<dyn PushSender>>,
    identity: Option<IdentityResolver>,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        let push_sender = config
            .vapid
            .clone()
            .map(|vapid| Arc::new(WebPushSender::new(vapid)) as Arc<dyn PushSender>);
        let identity = config.auth_backend.clone().map(IdentityResolver::new);
        Self {
            db,
            config,
            push_sender,
            identity,
        }
    }

    /// Replace the push transport, e.g. with a fake in tests.
    pub fn with_push_sender(mut self, sender: Arc<dyn PushSender>) -> Self {
        self.push_sender = Some(sender);
        self
    }

    /// The dispatcher, if the server can sign push messages.
    pub fn dispatcher(&self) -> Result<Dispatcher, ConfigError> {
        let sender = self.push_sender.clone().ok_or(ConfigError::MissingVapid)?;
        Ok(Dispatcher::new(self.db.clone(), sender))
    }

    pub fn identity(&self) -> Result<&IdentityResolver, ConfigError> {
        self.identity.as_ref().ok_or(ConfigError::MissingAuthBackend)
    }
}
