//! Event propagation and validation engine for the CraftLore provenance
//! ledger.
//!
//! One incoming transaction becomes an ordered sequence of independent
//! listener units that inspect and mutate a shared per-transaction context,
//! enforce field-level permissions, and stage atomic state writes through
//! the external ledger runtime's read/write interface. Outcomes are
//! deterministic and replayable: every node computes the same result for the
//! same transaction.
//!
//! # Quick Start
//!
//! ```rust
//! use craft_engine::{default_manager, Transaction};
//! use craft_state::MemoryStateStore;
//!
//! let manager = default_manager();
//! let mut store = MemoryStateStore::new();
//!
//! let payload = serde_json::json!({
//!     "event": "create/account",
//!     "timestamp": "2024-06-01T10:00:00Z",
//!     "fields": {"account_type": "supplier", "email": "wool@example.com"},
//! });
//! let txn = Transaction {
//!     payload: serde_json::to_vec(&payload).unwrap(),
//!     signer_public_key: "02abc".into(),
//!     signature: "sig-1".into(),
//! };
//!
//! let mut scope = store.transaction();
//! manager.apply(&txn, &mut scope).unwrap();
//! scope.commit();
//! ```

pub mod context;
pub mod error;
pub mod listener;
pub mod listeners;
pub mod manager;
pub mod registry;

// Re-exports for convenience.
pub use context::{ContextSlots, EventContext, Transaction};
pub use error::EngineError;
pub use listener::{get_account, get_asset, Listener};
pub use manager::EventsManager;
pub use registry::{default_listeners, default_manager};
