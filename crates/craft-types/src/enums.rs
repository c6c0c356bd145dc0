use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

// ---------------------------------------------------------------------------
// Account / asset type tags
// ---------------------------------------------------------------------------

/// Account type tag. Matches the `account_type` discriminator stored with
/// every account record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Buyer,
    Supplier,
    Artisan,
    Workshop,
    Distributor,
    Wholesaler,
    Retailer,
    Verifier,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Supplier => "supplier",
            Self::Artisan => "artisan",
            Self::Workshop => "workshop",
            Self::Distributor => "distributor",
            Self::Wholesaler => "wholesaler",
            Self::Retailer => "retailer",
            Self::Verifier => "verifier",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for AccountType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "supplier" => Ok(Self::Supplier),
            "artisan" => Ok(Self::Artisan),
            "workshop" => Ok(Self::Workshop),
            "distributor" => Ok(Self::Distributor),
            "wholesaler" => Ok(Self::Wholesaler),
            "retailer" => Ok(Self::Retailer),
            "verifier" => Ok(Self::Verifier),
            "admin" => Ok(Self::Admin),
            other => Err(TypeError::UnknownAccountType(other.into())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset kind tag. Matches the `asset_type` discriminator stored with every
/// asset record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    RawMaterial,
    Product,
    ProductBatch,
    WorkOrder,
    SubAssignment,
    Certification,
    Packaging,
    Logistics,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawMaterial => "raw_material",
            Self::Product => "product",
            Self::ProductBatch => "product_batch",
            Self::WorkOrder => "work_order",
            Self::SubAssignment => "sub_assignment",
            Self::Certification => "certification",
            Self::Packaging => "packaging",
            Self::Logistics => "logistics",
        }
    }
}

impl FromStr for AssetType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw_material" => Ok(Self::RawMaterial),
            "product" => Ok(Self::Product),
            "product_batch" => Ok(Self::ProductBatch),
            "work_order" => Ok(Self::WorkOrder),
            "sub_assignment" => Ok(Self::SubAssignment),
            "certification" => Ok(Self::Certification),
            "packaging" => Ok(Self::Packaging),
            "logistics" => Ok(Self::Logistics),
            other => Err(TypeError::UnknownAssetType(other.into())),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl FromStr for AuthenticationStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(TypeError::UnknownStatus(other.into())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Verified,
    Suspended,
}

/// Work order lifecycle. Pending orders may be accepted or rejected; only
/// accepted orders may be completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubAssignmentStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermissionLevel {
    #[default]
    Moderator,
    Authenticator,
    Certifier,
    SuperAdmin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAccountStatus {
    #[default]
    Active,
    Suspended,
    Deactivated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtisanSkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderType {
    #[default]
    Production,
    Repair,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyerType {
    #[default]
    EndCustomer,
    Wholesaler,
    Retailer,
    Distributor,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// The top-level business action a transaction requests, resolved from the
/// payload's `event` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    AccountCreated,
    AssetCreated,
    AssetsTransferred,
    WorkOrderAccepted,
    WorkOrderRejected,
    WorkOrderCompleted,
    AddRawMaterial,
    SubAssignmentAccepted,
    SubAssignmentRejected,
    SubAssignmentCompleted,
    SubAssignmentMarkedPaid,
    BatchCompleted,
    EntityEdited,
    EntityDeleted,
    ProductUnpacked,
    Bootstrap,
    AdminCreated,
    CertificationIssued,
    ModeratorEdit,
    EntityAuthenticated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCreated => "create/account",
            Self::AssetCreated => "create/asset",
            Self::AssetsTransferred => "transfer/asset",
            Self::WorkOrderAccepted => "accept/work_order",
            Self::WorkOrderRejected => "reject/work_order",
            Self::WorkOrderCompleted => "complete/work_order",
            Self::AddRawMaterial => "add/raw_material",
            Self::SubAssignmentAccepted => "accept/sub_assignment",
            Self::SubAssignmentRejected => "reject/sub_assignment",
            Self::SubAssignmentCompleted => "complete/sub_assignment",
            Self::SubAssignmentMarkedPaid => "paid/sub_assignment",
            Self::BatchCompleted => "complete/batch",
            Self::EntityEdited => "edit/entity",
            Self::EntityDeleted => "delete/entity",
            Self::ProductUnpacked => "unpackage/product",
            Self::Bootstrap => "bootstrap",
            Self::AdminCreated => "create/admin",
            Self::CertificationIssued => "issue/certification",
            Self::ModeratorEdit => "moderate/edit",
            Self::EntityAuthenticated => "authenticate/entity",
        }
    }
}

impl FromStr for EventType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create/account" => Ok(Self::AccountCreated),
            "create/asset" => Ok(Self::AssetCreated),
            "transfer/asset" => Ok(Self::AssetsTransferred),
            "accept/work_order" => Ok(Self::WorkOrderAccepted),
            "reject/work_order" => Ok(Self::WorkOrderRejected),
            "complete/work_order" => Ok(Self::WorkOrderCompleted),
            "add/raw_material" => Ok(Self::AddRawMaterial),
            "accept/sub_assignment" => Ok(Self::SubAssignmentAccepted),
            "reject/sub_assignment" => Ok(Self::SubAssignmentRejected),
            "complete/sub_assignment" => Ok(Self::SubAssignmentCompleted),
            "paid/sub_assignment" => Ok(Self::SubAssignmentMarkedPaid),
            "complete/batch" => Ok(Self::BatchCompleted),
            "edit/entity" => Ok(Self::EntityEdited),
            "delete/entity" => Ok(Self::EntityDeleted),
            "unpackage/product" => Ok(Self::ProductUnpacked),
            "bootstrap" => Ok(Self::Bootstrap),
            "create/admin" => Ok(Self::AdminCreated),
            "issue/certification" => Ok(Self::CertificationIssued),
            "moderate/edit" => Ok(Self::ModeratorEdit),
            "authenticate/entity" => Ok(Self::EntityAuthenticated),
            other => Err(TypeError::UnknownEventType(other.into())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derivative events fanned out by the dispatcher when the primary event
/// implies them (e.g. accepting a work order also creates its batch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubEventType {
    WorkOrderCreated,
    PackagingCreated,
    BatchCreated,
    LogisticsCreated,
    SubAssignmentCreated,
}

impl SubEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkOrderCreated => "create/asset/work_order",
            Self::PackagingCreated => "create/asset/packaging",
            Self::BatchCreated => "accept/work_order/batch_created",
            Self::LogisticsCreated => "create/asset/logistics",
            Self::SubAssignmentCreated => "create/asset/sub_assignment",
        }
    }

    /// All derivative events, in the order the dispatcher evaluates them.
    pub fn all() -> [SubEventType; 5] {
        [
            Self::WorkOrderCreated,
            Self::PackagingCreated,
            Self::BatchCreated,
            Self::LogisticsCreated,
            Self::SubAssignmentCreated,
        ]
    }
}

impl fmt::Display for SubEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch key: either a primary event or a derivative sub-event. Listeners
/// bind to keys; one dispatch may walk several keys in sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    Primary(EventType),
    Derived(SubEventType),
}

impl EventKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary(e) => e.as_str(),
            Self::Derived(e) => e.as_str(),
        }
    }
}

impl From<EventType> for EventKey {
    fn from(e: EventType) -> Self {
        Self::Primary(e)
    }
}

impl From<SubEventType> for EventKey {
    fn from(e: SubEventType) -> Self {
        Self::Derived(e)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_strings_round_trip() {
        for event in [
            EventType::AccountCreated,
            EventType::AssetsTransferred,
            EventType::SubAssignmentMarkedPaid,
            EventType::EntityAuthenticated,
        ] {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let err = "mint/gold".parse::<EventType>().unwrap_err();
        assert_eq!(err, TypeError::UnknownEventType("mint/gold".into()));
    }

    #[test]
    fn account_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&AccountType::Supplier).unwrap();
        assert_eq!(json, "\"supplier\"");
    }

    #[test]
    fn statuses_default_to_initial_state() {
        assert_eq!(WorkOrderStatus::default(), WorkOrderStatus::Pending);
        assert_eq!(BatchStatus::default(), BatchStatus::InProgress);
        assert_eq!(SubAssignmentStatus::default(), SubAssignmentStatus::Pending);
    }
}
