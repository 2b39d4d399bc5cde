//! Library entrypoint for PulseTrack.
//!
//! This file exists mainly to make controller tests easy (integration tests
//! under `tests/` can import the app state, routers, controllers, services).

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

// Keep this module at crate root because the codebase references it as
// `crate::auth`.
#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

pub mod controllers;
pub mod routes;

use services::quote_source::QuoteSource;
use services::realtime_hub::RealtimeHub;
use services::scheduler::MarketDataScheduler;

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub settings: config::Settings,
    pub quotes: Arc<dyn QuoteSource>,
    pub hub: Arc<RealtimeHub>,
    pub scheduler: Arc<MarketDataScheduler>,
}
