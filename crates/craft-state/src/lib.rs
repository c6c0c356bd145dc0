//! State access for the CraftLore provenance ledger.
//!
//! Three concerns live here, all on the boundary between the engine and the
//! external ledger runtime:
//!
//! - [`address`] — deterministic mapping from (entity kind, identifier) to a
//!   fixed-length storage address; a wire-format contract that must match
//!   byte-for-byte across reimplementations
//! - [`codec`] — canonical JSON encoding of stored records (keys sorted)
//! - [`provider`] / [`memory`] — the read/write interface the runtime
//!   exposes per transaction, plus an in-memory implementation with
//!   atomic-commit semantics for tests and embedding

pub mod address;
pub mod codec;
pub mod error;
pub mod memory;
pub mod provider;

pub use address::Address;
pub use error::StateError;
pub use memory::{MemoryStateStore, StateTransaction};
pub use provider::{StateAccess, StateReader, StateWriter};
