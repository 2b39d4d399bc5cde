use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::Client;

use pulsetrack::services::alert_evaluator::AlertEvaluator;
use pulsetrack::services::quote_source::{MockQuoteSource, QuoteSource};
use pulsetrack::services::realtime_hub::RealtimeHub;
use pulsetrack::services::scheduler::MarketDataScheduler;
use pulsetrack::services::store::{MongoAlertStore, MongoQuoteStore, MongoWatchlistStore};
use pulsetrack::{config, routes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let db = client.database(&settings.mongodb_db);

    let hub = Arc::new(RealtimeHub::new());
    let quotes: Arc<dyn QuoteSource> = Arc::new(MockQuoteSource::new());

    let evaluator = AlertEvaluator::new(
        Arc::new(MongoAlertStore::new(db.clone())),
        Arc::clone(&hub),
    );

    let scheduler = Arc::new(MarketDataScheduler::new(
        Arc::new(MongoWatchlistStore::new(db.clone())),
        Arc::new(MongoQuoteStore::new(db.clone())),
        Arc::clone(&quotes),
        evaluator,
        Arc::clone(&hub),
        Duration::from_secs(settings.fetch_interval_secs),
    ));
    scheduler.start();

    let state = AppState {
        db,
        settings: settings.clone(),
        quotes,
        hub,
        scheduler: Arc::clone(&scheduler),
    };

    let app = routes::app(state);

    let addr = SocketAddr::from((
        settings.host.parse::<std::net::IpAddr>().unwrap(),
        settings.port,
    ));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await
        .unwrap();
}

async fn shutdown_signal(scheduler: Arc<MarketDataScheduler>) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");

    tracing::info!("shutdown signal received, stopping scheduler");
    scheduler.stop();
}
