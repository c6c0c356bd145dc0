//! Client-side identifier and timestamp helpers.
//!
//! The engine itself never generates uids or reads a clock — both arrive in
//! the transaction payload so every node computes the same result. These
//! helpers exist for clients and test fixtures.

use uuid::Uuid;

/// Generate a fresh asset uid (hyphenated UUID v4).
///
/// The hyphens matter: identifiers containing `-` are resolved as assets
/// where a field may name either an account or an asset (certificate
/// holders), while public keys never contain one.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time as an RFC 3339 string, for stamping payloads.
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_uids_are_unique_and_hyphenated() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert!(a.contains('-'));
    }
}
