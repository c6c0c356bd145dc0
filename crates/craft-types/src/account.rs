use serde::{Deserialize, Serialize};

use crate::enums::{
    AccountType, AdminAccountStatus, AdminPermissionLevel, ArtisanSkillLevel,
    AuthenticationStatus, BuyerType, VerificationStatus,
};
use crate::history::HistoryEntry;

/// Account record, keyed by the owner's public key.
///
/// The envelope carries the fields every account shares; the tagged
/// [`AccountKind`] payload carries the per-type fields and doubles as the
/// `account_type` discriminator in the stored JSON (records serialize flat).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub public_key: String,
    pub email: String,
    #[serde(flatten)]
    pub kind: AccountKind,
    /// Uids of assets currently owned by this account. Engine-maintained.
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub authentication_status: AuthenticationStatus,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub work_orders_issued: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Uids of certifications issued to this account. Engine-maintained.
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub created_timestamp: String,
    #[serde(default)]
    pub updated_timestamp: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deletion_reason: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Account {
    /// A fresh account with envelope defaults.
    pub fn new(
        public_key: impl Into<String>,
        email: impl Into<String>,
        kind: AccountKind,
        created_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            email: email.into(),
            kind,
            assets: Vec::new(),
            authentication_status: AuthenticationStatus::default(),
            verification_status: VerificationStatus::default(),
            work_orders_issued: Vec::new(),
            region: String::new(),
            specializations: Vec::new(),
            certifications: Vec::new(),
            created_timestamp: created_timestamp.into(),
            updated_timestamp: String::new(),
            is_deleted: false,
            deletion_reason: None,
            history: Vec::new(),
        }
    }

    pub fn account_type(&self) -> AccountType {
        match &self.kind {
            AccountKind::Buyer(_) => AccountType::Buyer,
            AccountKind::Supplier(_) => AccountType::Supplier,
            AccountKind::Artisan(_) => AccountType::Artisan,
            AccountKind::Workshop {} => AccountType::Workshop,
            AccountKind::Distributor {} => AccountType::Distributor,
            AccountKind::Wholesaler {} => AccountType::Wholesaler,
            AccountKind::Retailer {} => AccountType::Retailer,
            AccountKind::Verifier {} => AccountType::Verifier,
            AccountKind::Admin(_) => AccountType::Admin,
        }
    }

    pub fn supplier(&self) -> Option<&SupplierFields> {
        match &self.kind {
            AccountKind::Supplier(f) => Some(f),
            _ => None,
        }
    }

    pub fn supplier_mut(&mut self) -> Option<&mut SupplierFields> {
        match &mut self.kind {
            AccountKind::Supplier(f) => Some(f),
            _ => None,
        }
    }

    pub fn artisan(&self) -> Option<&ArtisanFields> {
        match &self.kind {
            AccountKind::Artisan(f) => Some(f),
            _ => None,
        }
    }

    pub fn artisan_mut(&mut self) -> Option<&mut ArtisanFields> {
        match &mut self.kind {
            AccountKind::Artisan(f) => Some(f),
            _ => None,
        }
    }

    pub fn admin(&self) -> Option<&AdminFields> {
        match &self.kind {
            AccountKind::Admin(f) => Some(f),
            _ => None,
        }
    }

    pub fn admin_mut(&mut self) -> Option<&mut AdminFields> {
        match &mut self.kind {
            AccountKind::Admin(f) => Some(f),
            _ => None,
        }
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}

/// Per-type account payload, internally tagged as `account_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "account_type", rename_all = "snake_case")]
pub enum AccountKind {
    Buyer(BuyerFields),
    Supplier(SupplierFields),
    Artisan(ArtisanFields),
    Workshop {},
    Distributor {},
    Wholesaler {},
    Retailer {},
    Verifier {},
    Admin(AdminFields),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerFields {
    #[serde(default)]
    pub buyer_type: BuyerType,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierFields {
    /// Raw materials this supplier has transferred onward. Engine-maintained.
    #[serde(default)]
    pub raw_materials_supplied: Vec<String>,
    /// Raw materials this supplier has created. Engine-maintained.
    #[serde(default)]
    pub raw_materials_created: Vec<String>,
    #[serde(default)]
    pub supplier_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtisanFields {
    pub skill_level: ArtisanSkillLevel,
    #[serde(default)]
    pub craft_categories: Vec<String>,
    pub years_of_experience: u32,
    #[serde(default)]
    pub traditional_techniques: Vec<String>,
    #[serde(default)]
    pub work_orders_assigned: Vec<String>,
    #[serde(default)]
    pub work_orders_accepted: Vec<String>,
    #[serde(default)]
    pub work_orders_rejected: Vec<String>,
    #[serde(default)]
    pub work_orders_completed: Vec<String>,
    #[serde(default)]
    pub sub_assignments: Vec<String>,
    #[serde(default)]
    pub sub_assignments_accepted: Vec<String>,
    #[serde(default)]
    pub sub_assignments_rejected: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminFields {
    #[serde(default)]
    pub permission_level: AdminPermissionLevel,
    /// Trail of admin actions taken through this account. Engine-maintained.
    #[serde(default)]
    pub actions: Vec<AdminAction>,
    #[serde(default)]
    pub status: AdminAccountStatus,
}

/// One entry in an admin account's action trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminAction {
    pub details: String,
    pub transaction: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier() -> Account {
        Account {
            public_key: "02aa".into(),
            email: "supplier@example.com".into(),
            kind: AccountKind::Supplier(SupplierFields {
                supplier_type: "wool".into(),
                ..Default::default()
            }),
            assets: Vec::new(),
            authentication_status: AuthenticationStatus::Pending,
            verification_status: VerificationStatus::Unverified,
            work_orders_issued: Vec::new(),
            region: "Kashmir".into(),
            specializations: Vec::new(),
            certifications: Vec::new(),
            created_timestamp: "2024-01-01T00:00:00Z".into(),
            updated_timestamp: String::new(),
            is_deleted: false,
            deletion_reason: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn serializes_flat_with_account_type_tag() {
        let value = serde_json::to_value(supplier()).unwrap();
        assert_eq!(value["account_type"], "supplier");
        assert_eq!(value["supplier_type"], "wool");
        assert_eq!(value["public_key"], "02aa");
    }

    #[test]
    fn round_trips_through_json() {
        let account = supplier();
        let bytes = serde_json::to_vec(&account).unwrap();
        let parsed: Account = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, account);
    }

    #[test]
    fn kind_fields_default_when_absent() {
        let parsed: Account = serde_json::from_value(serde_json::json!({
            "public_key": "02bb",
            "email": "a@b.c",
            "account_type": "supplier",
        }))
        .unwrap();
        assert_eq!(parsed.account_type(), AccountType::Supplier);
        assert!(parsed.supplier().unwrap().raw_materials_supplied.is_empty());
        assert!(!parsed.is_deleted);
    }

    #[test]
    fn unit_kind_round_trips() {
        let parsed: Account = serde_json::from_value(serde_json::json!({
            "public_key": "02cc",
            "email": "w@b.c",
            "account_type": "workshop",
        }))
        .unwrap();
        assert_eq!(parsed.account_type(), AccountType::Workshop);
    }
}
