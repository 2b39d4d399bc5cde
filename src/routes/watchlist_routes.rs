use axum::{routing::get, routing::put, Router};

use crate::{controllers::watchlist_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/watchlist",
            get(watchlist_controller::get_watchlist).post(watchlist_controller::post_add_entry),
        )
        .route(
            "/api/watchlist/:id",
            put(watchlist_controller::put_update_entry).delete(watchlist_controller::delete_entry),
        )
}
