use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::auth::roles;
use crate::config::AppConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_roles, RoleGate};
use crate::state::AppState;

/// Routes and gates, without transport-level layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::login_post))
        .merge(protected_routes(&state))
        .merge(staff_routes(&state))
        .merge(admin_routes(&state))
        .with_state(state)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::whoami_get))
        .route_layer(from_fn_with_state(
            state.token_gate.clone(),
            jwt_auth_middleware,
        ))
}

fn staff_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users", get(elevated::list_get))
        .route("/api/users/:id", get(elevated::show_get))
        .route_layer(from_fn_with_state(
            Arc::new(RoleGate::new(roles::STAFF)),
            require_roles,
        ))
        .route_layer(from_fn_with_state(
            state.token_gate.clone(),
            jwt_auth_middleware,
        ))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users/:id/status", put(elevated::status_put))
        .route_layer(from_fn_with_state(
            Arc::new(RoleGate::new([roles::ADMIN])),
            require_roles,
        ))
        .route_layer(from_fn_with_state(
            state.token_gate.clone(),
            jwt_auth_middleware,
        ))
}

/// Full application: routes plus tracing, timeouts, body limits and CORS
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.api.request_timeout_secs,
        )));

    let router = router(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(middleware);

    match cors_layer(&config.security.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// No configured origins means no CORS headers at all (same-origin only).
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_is_off_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["https://vote.example.org".to_string()]).is_some());
    }
}
