use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::AppState;

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Logs
        .route(
            "/api/logs",
            get(handlers::logs::list_logs).post(handlers::logs::upsert_log),
        )
        .route(
            "/api/logs/:date",
            get(handlers::logs::get_log).delete(handlers::logs::delete_log),
        )
        .route("/api/day", get(handlers::logs::step))
        // Calendar
        .route("/api/calendar/month", get(handlers::calendar::month))
        .route("/api/calendar/year", get(handlers::calendar::year))
        .route("/api/calendar/activity", get(handlers::calendar::activity))
        .route("/api/calendar/timeline", get(handlers::calendar::timeline))
        // Insights
        .route("/api/insights", get(handlers::insights::get_insights))
        .route(
            "/api/insights/custom",
            get(handlers::insights::get_custom_insights),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors(&state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
