use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Request, StatusCode},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use mongodb::{bson::oid::ObjectId, Client};
use serde_json::Value;
use tower::ServiceExt;

use pulsetrack::controllers::market_controller;
use pulsetrack::models::CurrentUser;
use pulsetrack::services::alert_evaluator::AlertEvaluator;
use pulsetrack::services::quote_source::{MockQuoteSource, QuoteSource};
use pulsetrack::services::realtime_hub::RealtimeHub;
use pulsetrack::services::scheduler::MarketDataScheduler;
use pulsetrack::services::store::{MongoAlertStore, MongoQuoteStore, MongoWatchlistStore};
use pulsetrack::{config, AppState};

async fn test_state() -> AppState {
    let mut settings = config::load();
    settings.jwt_secret = "test-secret".to_string();

    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("mongodb client");
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
        Duration::from_secs(300),
    ));

    AppState {
        db,
        settings,
        quotes,
        hub,
        scheduler,
    }
}

async fn response_body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[tokio::test]
async fn get_market_data_unauthorized_returns_401() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/:symbol", get(market_controller::get_market_data))
        .with_state(state);

    let req = Request::builder()
        .method("GET")
        .uri("/api/market/AAPL")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_market_data_returns_normalized_quote() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/:symbol", get(market_controller::get_market_data))
        .with_state(state);

    let mut req = Request::builder()
        .method("GET")
        .uri("/api/market/aapl")
        .body(axum::body::Body::empty())
        .unwrap();

    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_json(res).await;
    assert_eq!(body["symbol"], "AAPL");
    assert!(body["price"].as_f64().unwrap() > 0.0);
    assert!(body["changePercent"].is_number());
}

#[tokio::test]
async fn get_search_without_query_returns_400() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/search", get(market_controller::get_search))
        .with_state(state);

    let mut req = Request::builder()
        .method("GET")
        .uri("/api/market/search")
        .body(axum::body::Body::empty())
        .unwrap();

    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_search_matches_by_name() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/search", get(market_controller::get_search))
        .with_state(state);

    let mut req = Request::builder()
        .method("GET")
        .uri("/api/market/search?q=apple")
        .body(axum::body::Body::empty())
        .unwrap();

    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_json(res).await;
    let results = body.as_array().expect("array of matches");
    assert!(results.iter().any(|m| m["symbol"] == "AAPL"));
}

#[tokio::test]
async fn post_bulk_with_empty_symbols_returns_400() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/bulk", post(market_controller::post_bulk))
        .with_state(state);

    let mut req = Request::builder()
        .method("POST")
        .uri("/api/market/bulk")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(r#"{"symbols":[]}"#))
        .unwrap();

    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_bulk_returns_one_quote_per_symbol() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/market/bulk", post(market_controller::post_bulk))
        .with_state(state);

    let mut req = Request::builder()
        .method("POST")
        .uri("/api/market/bulk")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(r#"{"symbols":["AAPL","msft"]}"#))
        .unwrap();

    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_json(res).await;
    let quotes = body.as_array().expect("array of quotes");
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0]["symbol"], "AAPL");
    assert_eq!(quotes[1]["symbol"], "MSFT");
}
