use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,

    // Allowed origin for the browser client (CORS).
    pub client_url: String,

    // Cadence of the market-data fetch loop, in seconds.
    pub fetch_interval_secs: u64,
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "pulsetrack".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());

    let client_url = env::var("CLIENT_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let fetch_interval_secs = env::var("FETCH_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(300);

    Settings {
        mongodb_uri,
        mongodb_db,
        host,
        port,
        jwt_secret,
        client_url,
        fetch_interval_secs,
    }
}
