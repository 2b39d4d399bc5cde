use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use pulsetrack::error::ApiError;
use pulsetrack::models::{Alert, AlertCondition};
use pulsetrack::services::alert_evaluator::AlertEvaluator;
use pulsetrack::services::realtime_hub::{RealtimeHub, ServerMessage};
use pulsetrack::services::store::AlertStore;

/// In-memory stand-in for the alert collection.
struct MemoryAlertStore {
    alerts: Mutex<Vec<Alert>>,
    fail_on: Mutex<Vec<ObjectId>>,
}

impl MemoryAlertStore {
    fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
            fail_on: Mutex::new(Vec::new()),
        }
    }

    fn fail_on(self, id: ObjectId) -> Self {
        self.fail_on.lock().unwrap().push(id);
        self
    }

    fn get(&self, id: ObjectId) -> Alert {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("alert exists")
    }

    fn reset(&self, id: ObjectId) {
        let mut alerts = self.alerts.lock().unwrap();
        let alert = alerts.iter_mut().find(|a| a.id == id).expect("alert exists");
        alert.triggered = false;
        alert.triggered_at = None;
        alert.active = true;
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn armed_for_symbol(&self, symbol: &str) -> Result<Vec<Alert>, ApiError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.symbol == symbol && a.active && !a.triggered)
            .cloned()
            .collect())
    }

    async fn mark_triggered(&self, id: ObjectId, at: i64) -> Result<bool, ApiError> {
        if self.fail_on.lock().unwrap().contains(&id) {
            return Err(ApiError::Persistence("simulated store failure".to_string()));
        }

        let mut alerts = self.alerts.lock().unwrap();
        let Some(alert) = alerts.iter_mut().find(|a| a.id == id && !a.triggered) else {
            return Ok(false);
        };

        alert.triggered = true;
        alert.triggered_at = Some(at);
        alert.active = false;
        Ok(true)
    }
}

fn alert(owner: ObjectId, symbol: &str, condition: AlertCondition, target: f64) -> Alert {
    Alert {
        id: ObjectId::new(),
        user_id: owner,
        symbol: symbol.to_string(),
        condition,
        target_price: target,
        triggered: false,
        triggered_at: None,
        active: true,
        created_at: Utc::now().timestamp(),
    }
}

fn evaluator(store: Arc<MemoryAlertStore>) -> (AlertEvaluator, Arc<RealtimeHub>) {
    let hub = Arc::new(RealtimeHub::new());
    (AlertEvaluator::new(store, Arc::clone(&hub)), hub)
}

#[tokio::test]
async fn above_alert_fires_at_exact_target_price() {
    let owner = ObjectId::new();
    let a = alert(owner, "AAPL", AlertCondition::Above, 150.0);
    let id = a.id;

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, _hub) = evaluator(Arc::clone(&store));

    let fired = evaluator.evaluate("AAPL", 150.0).await;

    assert_eq!(fired.len(), 1);
    assert!(fired[0].notification.message.contains("AAPL"));
    assert!(fired[0].notification.message.contains("risen above"));
    assert!(fired[0].notification.message.contains("$150"));

    let stored = store.get(id);
    assert!(stored.triggered);
    assert!(!stored.active);
    assert!(stored.triggered_at.is_some());
}

#[tokio::test]
async fn below_alert_fires_at_exact_target_price() {
    let owner = ObjectId::new();
    let a = alert(owner, "MSFT", AlertCondition::Below, 400.0);

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, _hub) = evaluator(store);

    let fired = evaluator.evaluate("MSFT", 400.0).await;

    assert_eq!(fired.len(), 1);
    assert!(fired[0].notification.message.contains("fallen below"));
}

#[tokio::test]
async fn alert_does_not_fire_before_threshold() {
    let owner = ObjectId::new();
    let above = alert(owner, "AAPL", AlertCondition::Above, 150.0);
    let below = alert(owner, "AAPL", AlertCondition::Below, 100.0);

    let store = Arc::new(MemoryAlertStore::new(vec![above, below]));
    let (evaluator, _hub) = evaluator(store);

    // Between both thresholds: nothing fires.
    let fired = evaluator.evaluate("AAPL", 125.0).await;

    assert!(fired.is_empty());
}

#[tokio::test]
async fn triggered_alert_does_not_refire() {
    let owner = ObjectId::new();
    let a = alert(owner, "AAPL", AlertCondition::Above, 150.0);
    let id = a.id;

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, _hub) = evaluator(Arc::clone(&store));

    assert_eq!(evaluator.evaluate("AAPL", 155.0).await.len(), 1);

    // Same and higher prices afterwards: the latch holds.
    assert!(evaluator.evaluate("AAPL", 155.0).await.is_empty());
    assert!(evaluator.evaluate("AAPL", 200.0).await.is_empty());

    let stored = store.get(id);
    assert!(stored.triggered);
    assert!(!stored.active);
}

#[tokio::test]
async fn reset_alert_fires_again() {
    let owner = ObjectId::new();
    let a = alert(owner, "AAPL", AlertCondition::Above, 150.0);
    let id = a.id;

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, _hub) = evaluator(Arc::clone(&store));

    assert_eq!(evaluator.evaluate("AAPL", 151.0).await.len(), 1);
    assert!(evaluator.evaluate("AAPL", 151.0).await.is_empty());

    store.reset(id);

    let stored = store.get(id);
    assert!(!stored.triggered);
    assert!(stored.triggered_at.is_none());
    assert!(stored.active);

    assert_eq!(evaluator.evaluate("AAPL", 151.0).await.len(), 1);
}

#[tokio::test]
async fn store_failure_on_one_alert_does_not_abort_the_batch() {
    let owner = ObjectId::new();
    let failing = alert(owner, "AAPL", AlertCondition::Above, 150.0);
    let failing_id = failing.id;
    let healthy = alert(owner, "AAPL", AlertCondition::Above, 140.0);
    let healthy_id = healthy.id;

    let store = Arc::new(MemoryAlertStore::new(vec![failing, healthy]).fail_on(failing_id));
    let (evaluator, _hub) = evaluator(Arc::clone(&store));

    let fired = evaluator.evaluate("AAPL", 160.0).await;

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].alert.id, healthy_id);
    assert!(store.get(healthy_id).triggered);
    assert!(!store.get(failing_id).triggered);
}

#[tokio::test]
async fn evaluation_symbol_is_case_normalized() {
    let owner = ObjectId::new();
    let a = alert(owner, "AAPL", AlertCondition::Above, 150.0);

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, _hub) = evaluator(store);

    let fired = evaluator.evaluate("aapl", 150.0).await;

    assert_eq!(fired.len(), 1);
}

#[tokio::test]
async fn fired_alert_notifies_owner_sessions() {
    let owner = ObjectId::new();
    let a = alert(owner, "AAPL", AlertCondition::Above, 150.0);

    let store = Arc::new(MemoryAlertStore::new(vec![a]));
    let (evaluator, hub) = evaluator(store);

    let (_session, mut rx) = hub.register(owner);
    let (_other, mut other_rx) = hub.register(ObjectId::new());

    evaluator.evaluate("AAPL", 152.5).await;

    match rx.try_recv().expect("owner should be notified") {
        ServerMessage::PriceAlert { notification, .. } => {
            assert_eq!(notification.symbol, "AAPL");
            assert_eq!(notification.current_price, 152.5);
            assert_eq!(notification.target_price, 150.0);
        }
        other => panic!("unexpected message: {other:?}"),
    }

    assert!(other_rx.try_recv().is_err());
}
