//! HTTP route modules and the assembled router.

pub mod auth;
pub mod consultation;
pub mod contact;
pub mod popup;
pub mod ui;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware as axum_mw;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::maintenance_middleware;
use crate::state::AppState;

/// Most form requests processed at once. Each one may hold two outbound
/// calls open.
const FORM_CONCURRENCY_LIMIT: usize = 64;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Form routes fan out to upstream services; bound how many run at once.
    let form_routes = Router::new()
        .nest("/v1/popup", popup::router())
        .nest("/v1/contact", contact::router())
        .nest("/v1/consultation", consultation::router())
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            FORM_CONCURRENCY_LIMIT,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(form_routes)
        .nest("/v1/auth", auth::router())
        .merge(ui::router())
        .layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            maintenance_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
