use std::collections::{HashMap, HashSet};

use crate::enums::{AccountType, AssetType};

type FieldSet = HashSet<&'static str>;

/// Per-type field permission tables.
///
/// Two frozen sets per entity-type tag: `forbidden` fields are silently
/// overwritten with engine-computed defaults at creation, `editable` fields
/// are the only fields a later edit transaction may change. Subtype tables
/// are derived by set union with the base set at construction time; nothing
/// is computed after `new()` returns.
pub struct FieldPolicy {
    account_forbidden: HashMap<AccountType, FieldSet>,
    account_editable: HashMap<AccountType, FieldSet>,
    asset_forbidden: HashMap<AssetType, FieldSet>,
    asset_editable: HashMap<AssetType, FieldSet>,
}

const ACCOUNT_BASE_FORBIDDEN: &[&str] = &[
    "assets",
    "authentication_status",
    "verification_status",
    "certifications",
    "work_orders_issued",
    "created_timestamp",
    "updated_timestamp",
    "is_deleted",
    "deletion_reason",
    "history",
];

const ACCOUNT_BASE_EDITABLE: &[&str] = &["email", "region", "specializations"];

const ASSET_BASE_FORBIDDEN: &[&str] = &[
    "asset_owner",
    "transfer_logistics",
    "previous_owners",
    "authentication_status",
    "certifications",
    "created_timestamp",
    "updated_timestamp",
    "is_deleted",
    "deletion_reason",
    "history",
];

fn union(base: &[&'static str], extra: &[&'static str]) -> FieldSet {
    base.iter().chain(extra).copied().collect()
}

impl FieldPolicy {
    pub fn new() -> Self {
        let mut account_forbidden = HashMap::new();
        let mut account_editable = HashMap::new();

        for account_type in [
            AccountType::Buyer,
            AccountType::Workshop,
            AccountType::Distributor,
            AccountType::Wholesaler,
            AccountType::Retailer,
            AccountType::Verifier,
        ] {
            account_forbidden.insert(account_type, union(ACCOUNT_BASE_FORBIDDEN, &[]));
        }
        account_forbidden.insert(
            AccountType::Supplier,
            union(
                ACCOUNT_BASE_FORBIDDEN,
                &["raw_materials_supplied", "raw_materials_created"],
            ),
        );
        account_forbidden.insert(
            AccountType::Artisan,
            union(
                ACCOUNT_BASE_FORBIDDEN,
                &[
                    "work_orders_assigned",
                    "work_orders_accepted",
                    "work_orders_rejected",
                    "work_orders_completed",
                    "sub_assignments",
                    "sub_assignments_accepted",
                    "sub_assignments_rejected",
                ],
            ),
        );
        account_forbidden.insert(
            AccountType::Admin,
            union(ACCOUNT_BASE_FORBIDDEN, &["actions", "status"]),
        );

        for account_type in [
            AccountType::Workshop,
            AccountType::Distributor,
            AccountType::Wholesaler,
            AccountType::Retailer,
            AccountType::Verifier,
            AccountType::Admin,
        ] {
            account_editable.insert(account_type, union(ACCOUNT_BASE_EDITABLE, &[]));
        }
        account_editable.insert(
            AccountType::Buyer,
            union(ACCOUNT_BASE_EDITABLE, &["buyer_type"]),
        );
        account_editable.insert(
            AccountType::Supplier,
            union(ACCOUNT_BASE_EDITABLE, &["supplier_type"]),
        );
        account_editable.insert(
            AccountType::Artisan,
            union(
                ACCOUNT_BASE_EDITABLE,
                &[
                    "skill_level",
                    "craft_categories",
                    "years_of_experience",
                    "traditional_techniques",
                ],
            ),
        );

        let mut asset_forbidden = HashMap::new();
        let mut asset_editable = HashMap::new();

        asset_forbidden.insert(
            AssetType::RawMaterial,
            union(
                ASSET_BASE_FORBIDDEN,
                &["supplier", "processor_public_key", "batches_used_in"],
            ),
        );
        asset_forbidden.insert(
            AssetType::Product,
            union(ASSET_BASE_FORBIDDEN, &["batch", "serial_no", "packaging"]),
        );
        asset_forbidden.insert(
            AssetType::ProductBatch,
            union(
                ASSET_BASE_FORBIDDEN,
                &[
                    "status",
                    "production_date",
                    "units_produced",
                    "sub_assignments",
                    "raw_materials",
                    "work_order",
                    "producer",
                ],
            ),
        );
        asset_forbidden.insert(
            AssetType::WorkOrder,
            union(
                ASSET_BASE_FORBIDDEN,
                &[
                    "status",
                    "rejection_reason",
                    "batch",
                    "completion_date",
                    "sub_assignees",
                    "assigner",
                ],
            ),
        );
        asset_forbidden.insert(
            AssetType::SubAssignment,
            union(
                ASSET_BASE_FORBIDDEN,
                &["status", "rejection_reason", "is_paid", "assigner"],
            ),
        );
        asset_forbidden.insert(
            AssetType::Certification,
            union(ASSET_BASE_FORBIDDEN, &["issuer"]),
        );
        asset_forbidden.insert(AssetType::Packaging, union(ASSET_BASE_FORBIDDEN, &[]));
        asset_forbidden.insert(
            AssetType::Logistics,
            union(ASSET_BASE_FORBIDDEN, &["transaction"]),
        );

        asset_editable.insert(
            AssetType::RawMaterial,
            union(&[], &["source_location", "unit_price_usd"]),
        );
        asset_editable.insert(AssetType::Product, union(&[], &["price_usd"]));
        asset_editable.insert(
            AssetType::ProductBatch,
            union(&[], &["special_instructions"]),
        );
        asset_editable.insert(
            AssetType::WorkOrder,
            union(&[], &["estimated_completion_date", "special_instructions"]),
        );
        asset_editable.insert(
            AssetType::SubAssignment,
            union(&[], &["task_description"]),
        );
        asset_editable.insert(AssetType::Certification, union(&[], &["description"]));
        asset_editable.insert(AssetType::Packaging, union(&[], &["labelling"]));
        asset_editable.insert(
            AssetType::Logistics,
            union(
                &[],
                &["tracking_id", "transit_points", "estimated_delivery_date"],
            ),
        );

        Self {
            account_forbidden,
            account_editable,
            asset_forbidden,
            asset_editable,
        }
    }

    pub fn forbidden_account_fields(&self, account_type: AccountType) -> &FieldSet {
        &self.account_forbidden[&account_type]
    }

    pub fn editable_account_fields(&self, account_type: AccountType) -> &FieldSet {
        &self.account_editable[&account_type]
    }

    pub fn forbidden_asset_fields(&self, asset_type: AssetType) -> &FieldSet {
        &self.asset_forbidden[&asset_type]
    }

    pub fn editable_asset_fields(&self, asset_type: AssetType) -> &FieldSet {
        &self.asset_editable[&asset_type]
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_tables_include_base_sets() {
        let policy = FieldPolicy::new();
        let supplier = policy.forbidden_account_fields(AccountType::Supplier);
        assert!(supplier.contains("history"));
        assert!(supplier.contains("raw_materials_supplied"));
        let buyer = policy.forbidden_account_fields(AccountType::Buyer);
        assert!(buyer.contains("history"));
        assert!(!buyer.contains("raw_materials_supplied"));
    }

    #[test]
    fn account_type_is_never_editable() {
        let policy = FieldPolicy::new();
        for account_type in [
            AccountType::Buyer,
            AccountType::Supplier,
            AccountType::Artisan,
            AccountType::Admin,
        ] {
            assert!(!policy
                .editable_account_fields(account_type)
                .contains("account_type"));
        }
    }

    #[test]
    fn workflow_statuses_are_forbidden_at_creation() {
        let policy = FieldPolicy::new();
        assert!(policy
            .forbidden_asset_fields(AssetType::WorkOrder)
            .contains("status"));
        assert!(policy
            .forbidden_asset_fields(AssetType::SubAssignment)
            .contains("rejection_reason"));
    }

    #[test]
    fn supplier_type_is_editable_for_suppliers_only() {
        let policy = FieldPolicy::new();
        assert!(policy
            .editable_account_fields(AccountType::Supplier)
            .contains("supplier_type"));
        assert!(!policy
            .editable_account_fields(AccountType::Artisan)
            .contains("supplier_type"));
    }
}
