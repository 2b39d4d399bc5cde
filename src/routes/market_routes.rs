use axum::{routing::get, routing::post, Router};

use crate::{controllers::market_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/market/search", get(market_controller::get_search))
        .route("/api/market/bulk", post(market_controller::post_bulk))
        .route("/api/market/refresh", post(market_controller::post_refresh))
        .route("/api/market/:symbol", get(market_controller::get_market_data))
        .route(
            "/api/market/:symbol/history",
            get(market_controller::get_history),
        )
}
