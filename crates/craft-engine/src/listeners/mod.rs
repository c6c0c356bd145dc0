//! The production listener set.
//!
//! Updaters run at high priority and mutate state; validators run at low
//! priority so they judge the post-update context. Priorities live in each
//! listener's `bindings()`.

pub mod certification;
pub mod creators;
pub mod history;
pub mod lifecycle;
pub mod permissions;
pub mod transfer;
pub mod validators;
pub mod workflow;

pub use certification::{CertificateHolderUpdater, CertificationCreator};
pub use creators::{AccountCreator, AdminCreator, AssetCreator, Bootstrap};
pub use history::{EmailIndexUpdater, EntityHistoryUpdater, OwnerHistoryUpdater};
pub use lifecycle::{
    AdminActionsUpdater, AuthenticateEntity, DeleteEntity, EditEntity, ModeratorEdit,
};
pub use permissions::FieldPermissionGuard;
pub use transfer::{AssetsTransferrer, PackageProducts, UnpackProduct};
pub use validators::{
    ValidateAcceptContext, ValidateAdminAccount, ValidateAssigneeAccount,
    ValidateBatchCompletion, ValidateCreatorAccount, ValidateRawMaterialAddition,
    ValidateSubAssignment, ValidateTransfer,
};
pub use workflow::{
    AddToBatch, AssigneeUpdater, BatchUpdater, ProducerUpdater, ProductsCreator,
    SubAssigneeUpdater,
};
