use std::collections::BTreeMap;

use serde_json::{Map, Value};

use craft_state::Address;
use craft_types::{Account, Asset, Entity, EventKey, HistoryEntry};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One signed, atomic state-change request, as delivered by the transport.
///
/// The signature is assumed already verified by the runtime before the
/// payload reaches the engine. Payload JSON shape:
/// `{"event": "<wire string>", "timestamp": "...", "fields": {...}}`.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub payload: Vec<u8>,
    pub signer_public_key: String,
    pub signature: String,
}

// ---------------------------------------------------------------------------
// ContextSlots
// ---------------------------------------------------------------------------

/// Typed scratch slots earlier listeners fill for later listeners of the
/// same dispatch.
///
/// Named fields instead of a stringly-keyed map: a slot typo or a type
/// mismatch is a compile error, not a runtime surprise. Slots are shared
/// across the primary event and its derivative sub-events within one
/// dispatch (acceptance hands the resolved work order to batch creation).
#[derive(Debug, Default)]
pub struct ContextSlots {
    /// The record the event is primarily about.
    pub entity: Option<Entity>,
    pub entity_address: Option<Address>,
    /// The account owning the entity (asset creation, raw-material usage).
    pub owner: Option<Account>,
    pub owner_address: Option<Address>,
    /// The account work is assigned to (work orders, sub-assignments,
    /// batch completion's producer).
    pub assignee: Option<Account>,
    pub assignee_address: Option<Address>,
    /// The acting admin account, for admin-gated events.
    pub admin: Option<Account>,
    pub admin_address: Option<Address>,
    /// Certificate holder (account or asset).
    pub holder: Option<Entity>,
    pub holder_address: Option<Address>,
    /// Batch touched alongside the primary entity.
    pub batch: Option<Asset>,
    pub batch_address: Option<Address>,
    /// Raw material consumed by a batch.
    pub raw_material: Option<Asset>,
    pub raw_material_address: Option<Address>,
    /// Transfer participants.
    pub recipient: Option<Account>,
    pub old_owner: Option<Account>,
    pub transferred_assets: Vec<Asset>,
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

/// Per-transaction scratch space shared by every listener of one dispatch.
///
/// Created when dispatch starts, dropped when it ends; never persisted and
/// never shared across transactions. `event_type` is rewritten as the
/// dispatcher walks from the primary event into its derivative sub-events.
#[derive(Debug)]
pub struct EventContext {
    pub event_type: EventKey,
    pub payload: Value,
    pub signer_public_key: String,
    pub signature: String,
    /// Commit timestamp, taken from the payload — the engine never reads a
    /// wall clock, so replay yields identical records.
    pub timestamp: String,
    pub slots: ContextSlots,
    /// Escape hatch for genuinely cross-cutting values with no typed slot.
    pub extra: BTreeMap<String, Value>,
}

impl EventContext {
    pub fn from_transaction(
        event_type: EventKey,
        transaction: &Transaction,
    ) -> Result<Self, EngineError> {
        let payload: Value = serde_json::from_slice(&transaction.payload)
            .map_err(|e| EngineError::Decode(format!("malformed transaction payload: {e}")))?;
        let timestamp = payload
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            event_type,
            payload,
            signer_public_key: transaction.signer_public_key.clone(),
            signature: transaction.signature.clone(),
            timestamp,
            slots: ContextSlots::default(),
            extra: BTreeMap::new(),
        })
    }

    /// The payload's `fields` object, if present.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.payload.get("fields").and_then(Value::as_object)
    }

    /// Mutable access to `fields`, for the permission guard's overrides.
    pub fn fields_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.payload.get_mut("fields").and_then(Value::as_object_mut)
    }

    /// `fields`, or a validation failure when the payload lacks it.
    pub fn require_fields(&self) -> Result<&Map<String, Value>, EngineError> {
        self.fields()
            .ok_or_else(|| EngineError::validation("missing 'fields' key in payload"))
    }

    /// A string field out of `fields`, or a validation failure naming it.
    pub fn require_str_field(&self, key: &str) -> Result<&str, EngineError> {
        self.require_fields()?
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::validation(format!("missing '{key}' in payload fields")))
    }

    /// Build a history entry for this event with the standard envelope.
    pub fn history_entry(&self, source: &str, targets: Vec<String>) -> HistoryEntry {
        HistoryEntry {
            source: source.to_string(),
            event: self.event_type.as_str().to_string(),
            actor: self.signer_public_key.clone(),
            targets,
            transaction: self.signature.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}
