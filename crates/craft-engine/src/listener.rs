use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use craft_state::{address, codec, Address, StateAccess, StateReader, StateWriter};
use craft_types::{Account, Asset, Entity, EventKey};

use crate::context::EventContext;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Listener trait
// ---------------------------------------------------------------------------

/// One unit of business logic — a validator or an updater.
///
/// A listener declares the event keys it handles and a priority per key
/// (higher runs earlier). `on_event` may resolve records through the state
/// handle, mutate them in memory, stage writes, pass results to later
/// listeners through the context slots, or abort the whole transaction by
/// returning an error.
///
/// Object-safe and `Send + Sync` so listeners can live in a
/// `Vec<Box<dyn Listener>>` built once at startup.
pub trait Listener: Send + Sync {
    /// Name recorded as the `source` of history entries this listener writes.
    fn name(&self) -> &'static str;

    /// The `(event key, priority)` pairs this listener binds to.
    fn bindings(&self) -> Vec<(EventKey, i32)>;

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Resolve an account by public key. Fails `NotFound` when the address holds
/// no state.
pub fn get_account(
    state: &dyn StateAccess,
    public_key: &str,
) -> Result<(Account, Address), EngineError> {
    let addr = address::account_address(public_key);
    let mut found = state.read(std::slice::from_ref(&addr))?;
    let bytes = found
        .remove(&addr)
        .ok_or_else(|| EngineError::not_found(format!("account {public_key} does not exist")))?;
    Ok((codec::decode(&bytes)?, addr))
}

/// Resolve an asset by uid. Fails `NotFound` when the address holds no state.
pub fn get_asset(state: &dyn StateAccess, uid: &str) -> Result<(Asset, Address), EngineError> {
    let addr = address::asset_address(uid);
    let mut found = state.read(std::slice::from_ref(&addr))?;
    let bytes = found
        .remove(&addr)
        .ok_or_else(|| EngineError::not_found(format!("asset {uid} does not exist")))?;
    Ok((codec::decode(&bytes)?, addr))
}

/// Resolve an identifier that may name either side of the entity model:
/// asset uids are hyphenated, public keys never are.
pub fn get_entity_by_identifier(
    state: &dyn StateAccess,
    identifier: &str,
) -> Result<(Entity, Address), EngineError> {
    if identifier.contains('-') {
        let (asset, addr) = get_asset(state, identifier)?;
        Ok((Entity::Asset(asset), addr))
    } else {
        let (account, addr) = get_account(state, identifier)?;
        Ok((Entity::Account(account), addr))
    }
}

/// Whether an address already holds state (staged or committed).
pub fn address_occupied(state: &dyn StateAccess, addr: &Address) -> Result<bool, EngineError> {
    Ok(!state.read(std::slice::from_ref(addr))?.is_empty())
}

/// Encode a record and stage its write at `addr`.
pub fn put_record<T: Serialize>(
    state: &mut dyn StateAccess,
    addr: &Address,
    record: &T,
) -> Result<(), EngineError> {
    let mut entries = BTreeMap::new();
    entries.insert(addr.clone(), codec::encode(record)?);
    state.write(entries)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Target resolution (delete / edit / authenticate)
// ---------------------------------------------------------------------------

/// The target named by a payload that identifies an entity by `uid` or
/// `public_key` — mutually exclusive by contract.
pub enum Target {
    Asset(String),
    Account(String),
}

impl Target {
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, EngineError> {
        let uid = fields.get("uid").and_then(Value::as_str);
        let public_key = fields.get("public_key").and_then(Value::as_str);
        match (uid, public_key) {
            (Some(uid), None) => Ok(Self::Asset(uid.to_string())),
            (None, Some(pk)) => Ok(Self::Account(pk.to_string())),
            (Some(_), Some(_)) => Err(EngineError::validation(
                "'uid' and 'public_key' are mutually exclusive target identifiers",
            )),
            (None, None) => Err(EngineError::validation(
                "either 'uid' or 'public_key' must be provided to identify the entity",
            )),
        }
    }

    pub fn resolve(&self, state: &dyn StateAccess) -> Result<(Entity, Address), EngineError> {
        match self {
            Self::Asset(uid) => {
                let (asset, addr) = get_asset(state, uid)?;
                Ok((Entity::Asset(asset), addr))
            }
            Self::Account(pk) => {
                let (account, addr) = get_account(state, pk)?;
                Ok((Entity::Account(account), addr))
            }
        }
    }
}
