use serde::{Deserialize, Serialize};

/// One immutable provenance record. Exactly one listener appends at most one
/// entry per entity per event; entries are never mutated or removed, and
/// their order matches transaction apply order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Name of the listener that wrote the entry.
    pub source: String,
    /// Wire string of the event that caused it.
    pub event: String,
    /// Public key of the signer who triggered the event.
    pub actor: String,
    /// Identifiers of the records the event touched.
    pub targets: Vec<String>,
    /// Signature of the transaction that carried the event.
    pub transaction: String,
    /// Commit timestamp, taken from the transaction payload.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip() {
        let entry = HistoryEntry {
            source: "AssigneeUpdater".into(),
            event: "accept/work_order".into(),
            actor: "02abc".into(),
            targets: vec!["wo-1".into(), "02abc".into()],
            transaction: "sig-1".into(),
            timestamp: "2024-01-15T10:00:00Z".into(),
        };
        let bytes = serde_json::to_vec(&entry).unwrap();
        let parsed: HistoryEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, entry);
    }
}
