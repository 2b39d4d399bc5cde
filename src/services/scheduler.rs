use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::services::alert_evaluator::AlertEvaluator;
use crate::services::quote_source::QuoteSource;
use crate::services::realtime_hub::RealtimeHub;
use crate::services::store::{QuoteStore, WatchlistStore};

const QUOTE_RETENTION_DAYS: i64 = 90;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic market-data pipeline: pull quotes for every watched symbol, fan
/// the results through persistence, the realtime hub and the alert
/// evaluator, and purge stale quote rows once a day.
pub struct MarketDataScheduler {
    watchlists: Arc<dyn WatchlistStore>,
    quotes: Arc<dyn QuoteStore>,
    source: Arc<dyn QuoteSource>,
    evaluator: AlertEvaluator,
    hub: Arc<RealtimeHub>,
    fetch_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl MarketDataScheduler {
    pub fn new(
        watchlists: Arc<dyn WatchlistStore>,
        quotes: Arc<dyn QuoteStore>,
        source: Arc<dyn QuoteSource>,
        evaluator: AlertEvaluator,
        hub: Arc<RealtimeHub>,
        fetch_interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            watchlists,
            quotes,
            source,
            evaluator,
            hub,
            fetch_interval,
            shutdown,
        }
    }

    /// Spawn the fetch and cleanup loops. Each loop runs until `stop`; a
    /// cycle that is already underway finishes before the loop exits.
    pub fn start(self: &Arc<Self>) {
        let fetch = Arc::clone(self);
        let mut rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut interval = time::interval(fetch.fetch_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = rx.changed() => break,
                }
                if *rx.borrow() {
                    break;
                }
                fetch.run_fetch_cycle().await;
            }

            tracing::info!("market data fetch task stopped");
        });

        let cleanup = Arc::clone(self);
        let mut rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut interval = time::interval(CLEANUP_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = rx.changed() => break,
                }
                if *rx.borrow() {
                    break;
                }
                cleanup.run_cleanup_cycle().await;
            }

            tracing::info!("quote cleanup task stopped");
        });

        tracing::info!(
            "scheduler started (fetch every {:?}, cleanup daily)",
            self.fetch_interval
        );
    }

    /// Prevent any further cycles from starting. In-flight cycles are not
    /// interrupted.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// One full fetch cycle. Also the operator-facing manual trigger, so it
    /// is public and runs to completion before returning.
    pub async fn run_fetch_cycle(&self) {
        let symbols = match self.watchlists.distinct_symbols().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to load watched symbols: {e}");
                return;
            }
        };

        if symbols.is_empty() {
            tracing::debug!("no watched symbols, skipping fetch cycle");
            return;
        }

        tracing::info!("fetching quotes for {} symbols", symbols.len());

        // Fan out one request per symbol; a failed fetch only costs that
        // symbol its quote for this cycle.
        let fetches = symbols.into_iter().map(|sym| {
            let source = Arc::clone(&self.source);
            async move {
                match source.get_quote(&sym).await {
                    Ok(q) => Some(q),
                    Err(e) => {
                        tracing::warn!("error fetching {sym}: {e}");
                        None
                    }
                }
            }
        });

        let results = join_all(fetches).await;

        let mut updated = 0usize;

        for quote in results.into_iter().flatten() {
            // Persist first, then broadcast, then evaluate: the trigger
            // messages reference the price the subscribers just saw.
            if let Err(e) = self.quotes.insert(&quote).await {
                tracing::error!("error processing {}: {e}", quote.symbol);
                continue;
            }

            self.hub.push_price_update(&quote.symbol, &quote);

            let fired = self.evaluator.evaluate(&quote.symbol, quote.price).await;
            if !fired.is_empty() {
                tracing::info!("{} alert(s) fired for {}", fired.len(), quote.symbol);
            }

            updated += 1;
        }

        tracing::info!("market data updated for {updated} symbols");
    }

    /// Purge quote rows older than the retention window.
    pub async fn run_cleanup_cycle(&self) {
        let cutoff = (Utc::now() - chrono::Duration::days(QUOTE_RETENTION_DAYS)).timestamp();

        match self.quotes.purge_older_than(cutoff).await {
            Ok(n) => tracing::info!("cleaned up {n} old quote records"),
            Err(e) => tracing::error!("quote cleanup failed: {e}"),
        }
    }
}
