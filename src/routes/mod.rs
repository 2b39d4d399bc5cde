use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::{controllers::home_controller, AppState};

pub mod home_routes;
pub mod watchlist_routes;
pub mod alerts_routes;
pub mod market_routes;
pub mod realtime_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = watchlist_routes::add_routes(router);
    let router = alerts_routes::add_routes(router);
    let router = market_routes::add_routes(router);
    let router = realtime_routes::add_routes(router);

    let origin = state
        .settings
        .client_url
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    router
        .fallback(home_controller::not_found)
        .layer(from_fn_with_state(state.clone(), crate::auth::require_auth))
        .layer(from_fn_with_state(
            state.clone(),
            crate::auth::inject_current_user,
        ))
        .layer(cors)
        .with_state(state)
}
