use std::collections::HashMap;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use craft_state::StateAccess;
use craft_types::{EventKey, EventType, SubEventType};

use crate::context::{EventContext, Transaction};
use crate::error::EngineError;
use crate::listener::Listener;

/// The dispatcher: holds, per event key, a priority-ordered list of
/// listeners and drives one transaction through them.
///
/// Registration happens once during process initialization; dispatch takes
/// `&self` and never mutates the registry. There is no ambient global —
/// construct a manager (usually via [`default_manager`]) and pass it into
/// the transaction-handling entry point.
///
/// [`default_manager`]: crate::registry::default_manager
#[derive(Default)]
pub struct EventsManager {
    listeners: Vec<Box<dyn Listener>>,
    bindings: HashMap<EventKey, Vec<(i32, usize)>>,
}

impl EventsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under every event key it declares. Lists are kept
    /// sorted descending by priority; the sort is stable, so ties preserve
    /// registration order.
    pub fn register(&mut self, listener: Box<dyn Listener>) {
        let index = self.listeners.len();
        let bindings = listener.bindings();
        self.listeners.push(listener);
        for (key, priority) in bindings {
            let list = self.bindings.entry(key).or_default();
            list.push((priority, index));
            list.sort_by(|a, b| b.0.cmp(&a.0));
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Engine entry point: parse the payload, resolve the declared event
    /// type, and dispatch.
    pub fn apply(
        &self,
        transaction: &Transaction,
        state: &mut dyn StateAccess,
    ) -> Result<EventContext, EngineError> {
        let payload: Value = serde_json::from_slice(&transaction.payload)
            .map_err(|e| EngineError::Decode(format!("malformed transaction payload: {e}")))?;
        let event = payload
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::validation("transaction must specify an event"))?;
        let event = EventType::from_str(event)
            .map_err(|e| EngineError::validation(e.to_string()))?;
        self.dispatch(event, transaction, state)
    }

    /// Run every listener registered for `event` — and for each derivative
    /// sub-event the payload triggers — strictly in priority order against
    /// one shared context.
    ///
    /// Fail-fast: the first listener error aborts the dispatch. Writes
    /// already staged by earlier listeners are not rolled back here; the
    /// state provider discards all writes of a failed transaction as a unit.
    pub fn dispatch(
        &self,
        event: EventType,
        transaction: &Transaction,
        state: &mut dyn StateAccess,
    ) -> Result<EventContext, EngineError> {
        let mut ctx = EventContext::from_transaction(event.into(), transaction)?;

        let mut events: Vec<EventKey> = vec![event.into()];
        for sub_event in SubEventType::all() {
            if derives(&ctx, event, sub_event) {
                events.push(sub_event.into());
            }
        }

        for key in events {
            ctx.event_type = key;
            let Some(list) = self.bindings.get(&key) else {
                continue;
            };
            debug!(event = %key, listeners = list.len(), "propagating event");
            for (priority, index) in list {
                let listener = &self.listeners[*index];
                debug!(listener = listener.name(), priority, "executing listener");
                listener.on_event(&mut ctx, state)?;
            }
        }

        Ok(ctx)
    }
}

/// Whether `sub_event` is implied by this transaction's primary event.
fn derives(ctx: &EventContext, primary: EventType, sub_event: SubEventType) -> bool {
    let declared_kind = ctx
        .fields()
        .and_then(|f| f.get("asset_type"))
        .and_then(Value::as_str);
    match sub_event {
        SubEventType::BatchCreated => primary == EventType::WorkOrderAccepted,
        SubEventType::LogisticsCreated => primary == EventType::AssetsTransferred,
        SubEventType::WorkOrderCreated => {
            primary == EventType::AssetCreated && declared_kind == Some("work_order")
        }
        SubEventType::PackagingCreated => {
            primary == EventType::AssetCreated && declared_kind == Some("packaging")
        }
        SubEventType::SubAssignmentCreated => {
            primary == EventType::AssetCreated && declared_kind == Some("sub_assignment")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records its label into a shared log when invoked.
    struct Probe {
        label: &'static str,
        priority: i32,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl Listener for Probe {
        fn name(&self) -> &'static str {
            self.label
        }

        fn bindings(&self) -> Vec<(EventKey, i32)> {
            vec![(EventType::AccountCreated.into(), self.priority)]
        }

        fn on_event(
            &self,
            _ctx: &mut EventContext,
            _state: &mut dyn StateAccess,
        ) -> Result<(), EngineError> {
            self.log.lock().unwrap().push(self.label);
            if self.fail {
                return Err(EngineError::validation("probe failure"));
            }
            Ok(())
        }
    }

    fn transaction() -> Transaction {
        Transaction {
            payload: br#"{"event": "create/account", "timestamp": "t0", "fields": {}}"#.to_vec(),
            signer_public_key: "02aa".into(),
            signature: "sig-1".into(),
        }
    }

    fn probe_manager(
        specs: &[(&'static str, i32, bool)],
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> EventsManager {
        let mut manager = EventsManager::new();
        for (label, priority, fail) in specs {
            manager.register(Box::new(Probe {
                label,
                priority: *priority,
                log: Arc::clone(log),
                fail: *fail,
            }));
        }
        manager
    }

    #[test]
    fn listeners_run_in_priority_order_with_stable_ties() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = probe_manager(
            &[("L1", 10, false), ("L2", 10, false), ("L3", -5, false)],
            &log,
        );

        let mut store = craft_state::MemoryStateStore::new();
        let mut txn_state = store.transaction();
        manager
            .dispatch(EventType::AccountCreated, &transaction(), &mut txn_state)
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["L1", "L2", "L3"]);
    }

    #[test]
    fn dispatch_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = probe_manager(
            &[("first", 10, false), ("boom", 5, true), ("after", 0, false)],
            &log,
        );

        let mut store = craft_state::MemoryStateStore::new();
        let mut txn_state = store.transaction();
        let err = manager
            .dispatch(EventType::AccountCreated, &transaction(), &mut txn_state)
            .unwrap_err();

        assert_eq!(err, EngineError::validation("probe failure"));
        assert_eq!(*log.lock().unwrap(), vec!["first", "boom"]);
    }

    #[test]
    fn apply_rejects_unknown_event_strings() {
        let manager = EventsManager::new();
        let txn = Transaction {
            payload: br#"{"event": "mint/gold", "fields": {}}"#.to_vec(),
            signer_public_key: "02aa".into(),
            signature: "sig".into(),
        };
        let mut store = craft_state::MemoryStateStore::new();
        let mut txn_state = store.transaction();
        let err = manager.apply(&txn, &mut txn_state).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn apply_rejects_missing_event_key() {
        let manager = EventsManager::new();
        let txn = Transaction {
            payload: br#"{"fields": {}}"#.to_vec(),
            signer_public_key: "02aa".into(),
            signature: "sig".into(),
        };
        let mut store = craft_state::MemoryStateStore::new();
        let mut txn_state = store.transaction();
        let err = manager.apply(&txn, &mut txn_state).unwrap_err();
        assert_eq!(
            err,
            EngineError::validation("transaction must specify an event")
        );
    }
}
