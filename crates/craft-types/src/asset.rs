use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{
    AssetType, AuthenticationStatus, BatchStatus, SubAssignmentStatus,
    WorkOrderStatus, WorkOrderType,
};
use crate::history::HistoryEntry;

/// Asset record, keyed by a client-generated uid.
///
/// Same envelope-plus-tagged-kind layout as [`Account`]: shared fields live
/// on the envelope, the [`AssetKind`] payload carries the per-kind fields and
/// serializes flat under the `asset_type` discriminator.
///
/// [`Account`]: crate::Account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub uid: String,
    pub asset_owner: String,
    #[serde(flatten)]
    pub kind: AssetKind,
    /// Logistics uids recording each transfer of this asset. Engine-maintained.
    #[serde(default)]
    pub transfer_logistics: Vec<String>,
    #[serde(default)]
    pub previous_owners: Vec<String>,
    #[serde(default)]
    pub authentication_status: AuthenticationStatus,
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

impl Asset {
    /// A fresh asset with envelope defaults.
    pub fn new(
        uid: impl Into<String>,
        asset_owner: impl Into<String>,
        kind: AssetKind,
        created_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            asset_owner: asset_owner.into(),
            kind,
            transfer_logistics: Vec::new(),
            previous_owners: Vec::new(),
            authentication_status: AuthenticationStatus::default(),
            certifications: Vec::new(),
            created_timestamp: created_timestamp.into(),
            updated_timestamp: String::new(),
            is_deleted: false,
            deletion_reason: None,
            history: Vec::new(),
        }
    }

    pub fn asset_type(&self) -> AssetType {
        match &self.kind {
            AssetKind::RawMaterial(_) => AssetType::RawMaterial,
            AssetKind::Product(_) => AssetType::Product,
            AssetKind::ProductBatch(_) => AssetType::ProductBatch,
            AssetKind::WorkOrder(_) => AssetType::WorkOrder,
            AssetKind::SubAssignment(_) => AssetType::SubAssignment,
            AssetKind::Certification(_) => AssetType::Certification,
            AssetKind::Packaging(_) => AssetType::Packaging,
            AssetKind::Logistics(_) => AssetType::Logistics,
        }
    }

    pub fn raw_material(&self) -> Option<&RawMaterialFields> {
        match &self.kind {
            AssetKind::RawMaterial(f) => Some(f),
            _ => None,
        }
    }

    pub fn raw_material_mut(&mut self) -> Option<&mut RawMaterialFields> {
        match &mut self.kind {
            AssetKind::RawMaterial(f) => Some(f),
            _ => None,
        }
    }

    pub fn product(&self) -> Option<&ProductFields> {
        match &self.kind {
            AssetKind::Product(f) => Some(f),
            _ => None,
        }
    }

    pub fn product_mut(&mut self) -> Option<&mut ProductFields> {
        match &mut self.kind {
            AssetKind::Product(f) => Some(f),
            _ => None,
        }
    }

    pub fn batch(&self) -> Option<&ProductBatchFields> {
        match &self.kind {
            AssetKind::ProductBatch(f) => Some(f),
            _ => None,
        }
    }

    pub fn batch_mut(&mut self) -> Option<&mut ProductBatchFields> {
        match &mut self.kind {
            AssetKind::ProductBatch(f) => Some(f),
            _ => None,
        }
    }

    pub fn work_order(&self) -> Option<&WorkOrderFields> {
        match &self.kind {
            AssetKind::WorkOrder(f) => Some(f),
            _ => None,
        }
    }

    pub fn work_order_mut(&mut self) -> Option<&mut WorkOrderFields> {
        match &mut self.kind {
            AssetKind::WorkOrder(f) => Some(f),
            _ => None,
        }
    }

    pub fn sub_assignment(&self) -> Option<&SubAssignmentFields> {
        match &self.kind {
            AssetKind::SubAssignment(f) => Some(f),
            _ => None,
        }
    }

    pub fn sub_assignment_mut(&mut self) -> Option<&mut SubAssignmentFields> {
        match &mut self.kind {
            AssetKind::SubAssignment(f) => Some(f),
            _ => None,
        }
    }

    pub fn certification(&self) -> Option<&CertificationFields> {
        match &self.kind {
            AssetKind::Certification(f) => Some(f),
            _ => None,
        }
    }

    pub fn packaging(&self) -> Option<&PackagingFields> {
        match &self.kind {
            AssetKind::Packaging(f) => Some(f),
            _ => None,
        }
    }

    pub fn packaging_mut(&mut self) -> Option<&mut PackagingFields> {
        match &mut self.kind {
            AssetKind::Packaging(f) => Some(f),
            _ => None,
        }
    }

    pub fn logistics(&self) -> Option<&LogisticsFields> {
        match &self.kind {
            AssetKind::Logistics(f) => Some(f),
            _ => None,
        }
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}

/// Per-kind asset payload, internally tagged as `asset_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "asset_type", rename_all = "snake_case")]
pub enum AssetKind {
    RawMaterial(RawMaterialFields),
    Product(ProductFields),
    ProductBatch(ProductBatchFields),
    WorkOrder(WorkOrderFields),
    SubAssignment(SubAssignmentFields),
    Certification(CertificationFields),
    Packaging(PackagingFields),
    Logistics(LogisticsFields),
}

/// Links a raw material to a batch that consumed part of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub batch: String,
    pub raw_material: String,
    pub usage_quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialFields {
    pub material_type: String,
    /// Public key of the supplying account. Engine-set at creation.
    #[serde(default)]
    pub supplier: String,
    pub quantity: f64,
    pub quantity_unit: String,
    pub unit_price_usd: f64,
    /// Set once the material is consumed by a batch; freezes further edits.
    #[serde(default)]
    pub processor_public_key: String,
    pub harvested_date: String,
    #[serde(default)]
    pub source_location: String,
    #[serde(default)]
    pub batches_used_in: Vec<UsageRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub batch: String,
    /// Unique within the batch.
    pub serial_no: u32,
    pub price_usd: f64,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub packaging: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductBatchFields {
    pub producer: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub units_produced: Option<u32>,
    pub product_description: String,
    #[serde(default)]
    pub specifications: Vec<String>,
    #[serde(default)]
    pub design_reference: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default)]
    pub status: BatchStatus,
    /// Present when the batch was spawned by accepting a work order.
    #[serde(default)]
    pub work_order: Option<String>,
    #[serde(default)]
    pub production_date: String,
    #[serde(default)]
    pub sub_assignments: Vec<String>,
    #[serde(default)]
    pub raw_materials: Vec<UsageRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderFields {
    /// Public key of the issuing account. Engine-set at creation.
    #[serde(default)]
    pub assigner: String,
    pub assignee: String,
    /// Uid of the batch spawned on acceptance. Engine-set.
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub status: WorkOrderStatus,
    #[serde(default)]
    pub rejection_reason: String,
    #[serde(default)]
    pub work_type: WorkOrderType,
    #[serde(default)]
    pub estimated_completion_date: String,
    #[serde(default)]
    pub completion_date: String,
    pub requested_quantity: f64,
    pub requested_quantity_unit: String,
    pub product_description: String,
    #[serde(default)]
    pub specifications: Vec<String>,
    #[serde(default)]
    pub design_reference: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default)]
    pub sub_assignees: Vec<String>,
    pub total_price_usd: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAssignmentFields {
    /// The batch this assignment carves work out of.
    pub batch: String,
    pub pay_usd: f64,
    pub task_description: String,
    #[serde(default)]
    pub status: SubAssignmentStatus,
    pub assignee: String,
    /// Public key of the producer who assigned the work. Engine-set.
    #[serde(default)]
    pub assigner: String,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificationFields {
    /// Title or type of certificate (e.g. GI Certificate, ISO 9001).
    pub title: String,
    pub issue_timestamp: String,
    #[serde(default)]
    pub expiry_timestamp: Option<String>,
    /// Public key of the issuing authority. Engine-set at creation.
    #[serde(default)]
    pub issuer: String,
    /// Public key or asset uid of the holder the certificate is issued to.
    pub holder: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Flexible key-value fields for specialized certificate details.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackagingFields {
    pub products: Vec<String>,
    pub package_type: String,
    pub price_usd: f64,
    #[serde(default)]
    pub materials_used: Vec<String>,
    #[serde(default)]
    pub labelling: BTreeMap<String, Value>,
    pub seal_id: String,
    pub net_weight: f64,
    pub gross_weight: f64,
    pub package_width: f64,
    pub package_height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticsFields {
    /// Signature of the transfer transaction that spawned this record.
    #[serde(default)]
    pub transaction: String,
    pub assets: Vec<String>,
    pub carrier: String,
    #[serde(default)]
    pub tracking_id: Option<String>,
    pub origin: String,
    pub destination: String,
    pub recipient: String,
    #[serde(default)]
    pub transit_points: Vec<String>,
    pub dispatch_date: String,
    #[serde(default)]
    pub estimated_delivery_date: String,
    #[serde(default)]
    pub freight_cost_usd: Option<f64>,
    #[serde(default)]
    pub insurance_details: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_order() -> Asset {
        Asset {
            uid: "wo-0001".into(),
            asset_owner: "02aa".into(),
            kind: AssetKind::WorkOrder(WorkOrderFields {
                assigner: "02aa".into(),
                assignee: "02bb".into(),
                batch: String::new(),
                status: WorkOrderStatus::Pending,
                rejection_reason: String::new(),
                work_type: WorkOrderType::Production,
                estimated_completion_date: String::new(),
                completion_date: String::new(),
                requested_quantity: 10.0,
                requested_quantity_unit: "pieces".into(),
                product_description: "ten wool shawls".into(),
                specifications: Vec::new(),
                design_reference: String::new(),
                special_instructions: String::new(),
                sub_assignees: Vec::new(),
                total_price_usd: 1500.0,
            }),
            transfer_logistics: Vec::new(),
            previous_owners: Vec::new(),
            authentication_status: AuthenticationStatus::Pending,
            certifications: Vec::new(),
            created_timestamp: "2024-01-01T00:00:00Z".into(),
            updated_timestamp: String::new(),
            is_deleted: false,
            deletion_reason: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn serializes_flat_with_asset_type_tag() {
        let value = serde_json::to_value(work_order()).unwrap();
        assert_eq!(value["asset_type"], "work_order");
        assert_eq!(value["assignee"], "02bb");
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn round_trips_through_json() {
        let asset = work_order();
        let bytes = serde_json::to_vec(&asset).unwrap();
        let parsed: Asset = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, asset);
    }

    #[test]
    fn kind_defaults_apply_on_deserialize() {
        let parsed: Asset = serde_json::from_value(serde_json::json!({
            "uid": "sa-1",
            "asset_owner": "02aa",
            "asset_type": "sub_assignment",
            "batch": "batch-1",
            "pay_usd": 50.0,
            "task_description": "knit 50 wool shawls",
            "assignee": "02bb",
        }))
        .unwrap();
        let fields = parsed.sub_assignment().unwrap();
        assert_eq!(fields.status, SubAssignmentStatus::Pending);
        assert!(!fields.is_paid);
        assert_eq!(fields.rejection_reason, None);
    }
}
