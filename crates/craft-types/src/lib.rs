//! Foundation types for the CraftLore provenance ledger.
//!
//! This crate provides the entity records, enumerations, and permission
//! tables used throughout the engine. Every other craft crate depends on
//! `craft-types`.
//!
//! # Key Types
//!
//! - [`Account`] — account record keyed by public key, with a tagged
//!   [`AccountKind`] payload per account type
//! - [`Asset`] — asset record keyed by uid, with a tagged [`AssetKind`]
//!   payload per asset kind
//! - [`HistoryEntry`] — immutable, append-only provenance record
//! - [`EventType`] / [`SubEventType`] / [`EventKey`] — the business actions a
//!   transaction can request, with their fixed wire strings
//! - [`FieldPolicy`] — per-type forbidden/editable field tables, built once
//!   at construction

pub mod account;
pub mod asset;
pub mod entity;
pub mod enums;
pub mod error;
pub mod fields;
pub mod history;
pub mod uid;

pub use account::{
    Account, AccountKind, AdminAction, AdminFields, ArtisanFields, BuyerFields,
    SupplierFields,
};
pub use asset::{
    Asset, AssetKind, CertificationFields, LogisticsFields, PackagingFields,
    ProductBatchFields, ProductFields, RawMaterialFields, SubAssignmentFields,
    UsageRecord, WorkOrderFields,
};
pub use entity::Entity;
pub use enums::{
    AccountType, AdminAccountStatus, AdminPermissionLevel, ArtisanSkillLevel,
    AssetType, AuthenticationStatus, BatchStatus, BuyerType, EventKey, EventType,
    SubAssignmentStatus, SubEventType, VerificationStatus, WorkOrderStatus,
    WorkOrderType,
};
pub use error::TypeError;
pub use fields::FieldPolicy;
pub use history::HistoryEntry;
