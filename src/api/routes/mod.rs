//! API routes module

pub mod push;
pub mod webhook;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Push notification routes, including the change webhook
        .nest("/push", push::router().merge(webhook::router()))
}
