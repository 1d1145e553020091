//! HTTP application assembly: webhook, REST API and shared layers.

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::bot::webhook::{self, WebhookState};

pub const HEALTH_TEXT: &str = "Server running";

/// Webhook routes with the shared layers, without the database-backed API
pub fn build_webhook_app(webhook_state: WebhookState) -> Router {
    with_layers(
        Router::new()
            .route("/", get(health))
            .merge(webhook::router(webhook_state)),
    )
}

/// Full application: health check, webhook and REST API
pub fn build_app(pool: PgPool, webhook_state: WebhookState) -> Router {
    with_layers(
        Router::new()
            .route("/", get(health))
            .merge(webhook::router(webhook_state))
            .merge(api::router(pool)),
    )
}

fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    HEALTH_TEXT
}
