use serde::Serialize;

use crate::account::Account;
use crate::asset::Asset;
use crate::history::HistoryEntry;

/// Either side of the entity model, for listeners that operate uniformly on
/// accounts and assets (deletion, edits, authentication, certification).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Account(Account),
    Asset(Asset),
}

impl Entity {
    /// The record's primary identifier: public key or uid.
    pub fn id(&self) -> &str {
        match self {
            Self::Account(a) => &a.public_key,
            Self::Asset(a) => &a.uid,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::Account(a) => a.is_deleted,
            Self::Asset(a) => a.is_deleted,
        }
    }

    pub fn mark_deleted(&mut self, reason: String) {
        match self {
            Self::Account(a) => {
                a.is_deleted = true;
                a.deletion_reason = Some(reason);
            }
            Self::Asset(a) => {
                a.is_deleted = true;
                a.deletion_reason = Some(reason);
            }
        }
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        match self {
            Self::Account(a) => a.push_history(entry),
            Self::Asset(a) => a.push_history(entry),
        }
    }

    pub fn set_authentication_status(&mut self, status: crate::AuthenticationStatus) {
        match self {
            Self::Account(a) => a.authentication_status = status,
            Self::Asset(a) => a.authentication_status = status,
        }
    }

    pub fn certifications_mut(&mut self) -> &mut Vec<String> {
        match self {
            Self::Account(a) => &mut a.certifications,
            Self::Asset(a) => &mut a.certifications,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Self::Account(a) => Some(a),
            Self::Asset(_) => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Account(_) => None,
            Self::Asset(a) => Some(a),
        }
    }
}

impl From<Account> for Entity {
    fn from(account: Account) -> Self {
        Self::Account(account)
    }
}

impl From<Asset> for Entity {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}
