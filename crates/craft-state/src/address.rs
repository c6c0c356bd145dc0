use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// Transaction family name. Part of the wire format: the six-character
/// namespace every address starts with is derived from it.
pub const FAMILY_NAME: &str = "craftlore";

/// Two-character kind prefixes within the family namespace. Remaining
/// prefixes are reserved for secondary indexes.
pub const ACCOUNT_PREFIX: &str = "00";
pub const EMAIL_INDEX_PREFIX: &str = "01";
pub const BOOTSTRAP_PREFIX: &str = "03";
pub const ASSET_PREFIX: &str = "10";

/// Identifier hashed under [`BOOTSTRAP_PREFIX`] for the one bootstrap flag.
pub const BOOTSTRAP_IDENTIFIER: &str = "bootstrap_complete";

/// A fixed-length (70 hex chars) storage address:
/// `namespace(6) || kind_prefix(2) || sha512(identifier)[0..62]`.
///
/// Addresses are pure functions of their inputs — no randomness, no state —
/// so every node derives the same address for the same identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

/// The six-character family namespace, computed once.
pub fn namespace() -> &'static str {
    static NAMESPACE: OnceLock<String> = OnceLock::new();
    NAMESPACE.get_or_init(|| sha512_hex(FAMILY_NAME.as_bytes())[..6].to_string())
}

/// Derive the address for `identifier` under a kind prefix.
pub fn derive(prefix: &str, identifier: &str) -> Address {
    let hash = sha512_hex(identifier.as_bytes());
    Address(format!("{}{}{}", namespace(), prefix, &hash[..62]))
}

/// Address of an account record.
pub fn account_address(public_key: &str) -> Address {
    derive(ACCOUNT_PREFIX, public_key)
}

/// Address of the email-uniqueness index entry for `email`.
pub fn email_index_address(email: &str) -> Address {
    derive(EMAIL_INDEX_PREFIX, email)
}

/// Address of the one-shot bootstrap flag.
pub fn bootstrap_address() -> Address {
    derive(BOOTSTRAP_PREFIX, BOOTSTRAP_IDENTIFIER)
}

/// Address of an asset record. Assets are addressed by uid alone, so lookup
/// never needs a kind hint.
pub fn asset_address(uid: &str) -> Address {
    derive(ASSET_PREFIX, uid)
}

fn sha512_hex(bytes: &[u8]) -> String {
    hex::encode(Sha512::digest(bytes))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn namespace_is_six_hex_chars() {
        assert_eq!(namespace().len(), 6);
        assert!(namespace().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn addresses_are_seventy_hex_chars() {
        let addr = account_address("02abc");
        assert_eq!(addr.as_str().len(), 70);
        assert!(addr.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(account_address("02abc"), account_address("02abc"));
        assert_eq!(asset_address("uid-1"), asset_address("uid-1"));
    }

    #[test]
    fn kind_prefix_separates_namespaces() {
        // Same identifier, different kind: only the prefix differs.
        let account = derive(ACCOUNT_PREFIX, "x");
        let asset = derive(ASSET_PREFIX, "x");
        assert_ne!(account, asset);
        assert_eq!(account.as_str()[..6], asset.as_str()[..6]);
        assert_eq!(account.as_str()[8..], asset.as_str()[8..]);
    }

    #[test]
    fn bootstrap_address_is_constant() {
        assert_eq!(bootstrap_address(), bootstrap_address());
        assert_eq!(&bootstrap_address().as_str()[6..8], BOOTSTRAP_PREFIX);
    }

    proptest! {
        #[test]
        fn distinct_identifiers_never_collide(a in "[a-f0-9]{8,64}", b in "[a-f0-9]{8,64}") {
            prop_assume!(a != b);
            prop_assert_ne!(asset_address(&a), asset_address(&b));
        }

        #[test]
        fn derive_called_twice_is_identical(id in ".{1,64}") {
            prop_assert_eq!(derive(ASSET_PREFIX, &id), derive(ASSET_PREFIX, &id));
        }
    }
}
