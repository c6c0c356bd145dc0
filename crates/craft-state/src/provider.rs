use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::StateError;

/// Read boundary of the external ledger runtime's state interface.
///
/// Absent addresses are simply missing from the returned map; existence is
/// the caller's question to ask.
pub trait StateReader {
    fn read(&self, addresses: &[Address]) -> Result<BTreeMap<Address, Vec<u8>>, StateError>;
}

/// Write boundary. Writes are staged within the scope of one transaction and
/// become visible atomically at commit, or not at all on abort — that
/// contract belongs to the runtime, not to callers.
pub trait StateWriter {
    fn write(&mut self, entries: BTreeMap<Address, Vec<u8>>) -> Result<(), StateError>;
}

/// The per-transaction handle listeners receive.
pub trait StateAccess: StateReader + StateWriter {}

impl<T: StateReader + StateWriter> StateAccess for T {}
