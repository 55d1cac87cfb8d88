use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::core::{
    AppConfig,
    db::{async_db, initialize_db},
};
use crate::notify::VapidKeys;

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: Arc<AppState>) -> Router {
    // The database webhook and browsers on other origins both call in
    let cors = CorsLayer::permissive();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        // Static assets in ./web-ui, including the service worker
        .fallback_service(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(
                    ServeDir::new("./web-ui/src")
                        .precompressed_br()
                        .precompressed_gzip(),
                ),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Log what the server can and cannot do with the given config.
fn check_config(config: &AppConfig) {
    match &config.vapid {
        Some(vapid) => match VapidKeys::from_private_key(&vapid.private_key) {
            Ok(keys) if keys.public_key_base64url() != vapid.public_key.trim_end_matches('=') => {
                tracing::warn!("VAPID_PUBLIC_KEY does not match VAPID_PRIVATE_KEY");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("VAPID_PRIVATE_KEY is unusable: {}", e),
        },
        None => tracing::warn!("VAPID keys not configured, notifications will be rejected"),
    }
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not configured, webhook calls will be rejected");
    }
    if config.auth_backend.is_none() {
        tracing::warn!("Auth backend not configured, authenticated calls will be rejected");
    }
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    check_config(&config);

    let db = async_db(&config.db_path)
        .await
        .context("Failed to connect to async db")?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;

    let shared_state = Arc::new(AppState::new(db, config));
    let app = app(shared_state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
