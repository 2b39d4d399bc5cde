use axum::{routing::get, Router};

use crate::{controllers::realtime_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(realtime_controller::ws_market))
}
