use std::sync::Arc;

use chrono::Utc;

use crate::models::{Alert, AlertCondition, AlertNotification};
use crate::services::realtime_hub::RealtimeHub;
use crate::services::store::AlertStore;

/// An alert that fired during an evaluation pass, with the notification that
/// was handed to the hub for it.
#[derive(Debug, Clone)]
pub struct FiredAlert {
    pub alert: Alert,
    pub notification: AlertNotification,
}

pub struct AlertEvaluator {
    alerts: Arc<dyn AlertStore>,
    hub: Arc<RealtimeHub>,
}

impl AlertEvaluator {
    pub fn new(alerts: Arc<dyn AlertStore>, hub: Arc<RealtimeHub>) -> Self {
        Self { alerts, hub }
    }

    /// Check every armed alert for `symbol` against `current_price`, flip
    /// the latch on the ones that fire, and notify their owners.
    ///
    /// Comparison is inclusive in both directions: a price exactly at the
    /// target fires either condition. A store failure on one alert is logged
    /// and the rest of the batch still runs.
    pub async fn evaluate(&self, symbol: &str, current_price: f64) -> Vec<FiredAlert> {
        let sym = symbol.trim().to_uppercase();

        let candidates = match self.alerts.armed_for_symbol(&sym).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("failed to load alerts for {sym}: {e}");
                return Vec::new();
            }
        };

        if candidates.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            "checking {} alerts for {sym} at price {current_price}",
            candidates.len()
        );

        let mut fired = Vec::new();

        for mut alert in candidates {
            let hit = match alert.condition {
                AlertCondition::Above => current_price >= alert.target_price,
                AlertCondition::Below => current_price <= alert.target_price,
            };

            if !hit {
                continue;
            }

            let now = Utc::now().timestamp();

            match self.alerts.mark_triggered(alert.id, now).await {
                Ok(true) => {}
                // Another pass got here first; the latch already fired.
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(
                        "failed to mark alert {} triggered: {e}",
                        alert.id.to_hex()
                    );
                    continue;
                }
            }

            alert.triggered = true;
            alert.triggered_at = Some(now);
            alert.active = false;

            let notification = AlertNotification {
                alert_id: alert.id.to_hex(),
                symbol: alert.symbol.clone(),
                target_price: alert.target_price,
                current_price,
                condition: alert.condition,
                message: format!(
                    "{} has {} ${}. Current price: ${}",
                    alert.symbol,
                    alert.condition.direction(),
                    alert.target_price,
                    current_price
                ),
            };

            self.hub
                .push_alert_notification(alert.user_id, notification.clone());

            tracing::info!(
                "alert triggered for user {}: {}",
                alert.user_id.to_hex(),
                notification.message
            );

            fired.push(FiredAlert {
                alert,
                notification,
            });
        }

        fired
    }
}
