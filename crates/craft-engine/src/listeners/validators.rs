use std::collections::HashMap;

use serde_json::Value;

use craft_state::StateAccess;
use craft_types::{
    AccountType, AdminAccountStatus, AdminPermissionLevel, AssetKind, AssetType,
    BatchStatus, Entity, EventKey, EventType, SubEventType,
};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::Listener;

// ---------------------------------------------------------------------------
// ValidateAcceptContext
// ---------------------------------------------------------------------------

/// Post-update check for every work-order and sub-assignment transition: the
/// acting account must be the stored assignee, and neither side may be
/// deleted.
///
/// Runs at low priority on purpose — the updaters have already mutated the
/// context, so this validates the post-update state rather than a stale
/// snapshot. That ordering is a correctness requirement, not a convenience.
pub struct ValidateAcceptContext;

impl Listener for ValidateAcceptContext {
    fn name(&self) -> &'static str {
        "ValidateAcceptContext"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::WorkOrderAccepted.into(), -100),
            (EventType::WorkOrderRejected.into(), -100),
            (EventType::WorkOrderCompleted.into(), -100),
            (EventType::SubAssignmentAccepted.into(), -100),
            (EventType::SubAssignmentRejected.into(), -100),
            (EventType::SubAssignmentCompleted.into(), -100),
            (EventType::SubAssignmentMarkedPaid.into(), -100),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let assignee = ctx.slots.assignee.as_ref().ok_or_else(|| {
            EngineError::validation(
                "assignee data not found in context for ValidateAcceptContext",
            )
        })?;
        let entity = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .ok_or_else(|| {
                EngineError::validation(
                    "entity not found in context for ValidateAcceptContext",
                )
            })?;

        let (stored_assignee, noun) = match &entity.kind {
            AssetKind::WorkOrder(fields) => (fields.assignee.as_str(), "work order"),
            AssetKind::SubAssignment(fields) => (fields.assignee.as_str(), "sub-assignment"),
            _ => {
                return Err(EngineError::validation(
                    "context entity has no assignee to validate",
                ))
            }
        };

        if assignee.public_key != stored_assignee {
            return Err(EngineError::validation(format!(
                "acceptor must be the assignee of the {noun}"
            )));
        }
        if assignee.is_deleted {
            return Err(EngineError::validation("assignee account is deleted"));
        }
        if entity.is_deleted {
            return Err(EngineError::validation(format!("{noun} is deleted")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateAssigneeAccount
// ---------------------------------------------------------------------------

/// Creation-time policy for work orders: only permitted account types can be
/// assigned work, and nobody assigns work to themselves.
pub struct ValidateAssigneeAccount {
    valid_assignees: Vec<AccountType>,
}

impl ValidateAssigneeAccount {
    pub fn new() -> Self {
        Self {
            valid_assignees: vec![AccountType::Artisan],
        }
    }
}

impl Default for ValidateAssigneeAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for ValidateAssigneeAccount {
    fn name(&self) -> &'static str {
        "ValidateAssigneeAccount"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(SubEventType::WorkOrderCreated.into(), -100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let assignee = ctx.slots.assignee.as_ref().ok_or_else(|| {
            EngineError::validation(
                "assignee data not found in context for ValidateAssigneeAccount",
            )
        })?;
        let order_fields = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .and_then(|asset| asset.work_order())
            .ok_or_else(|| {
                EngineError::validation(
                    "work order not found in context for ValidateAssigneeAccount",
                )
            })?;

        if !self.valid_assignees.contains(&assignee.account_type()) {
            return Err(EngineError::validation(format!(
                "account type {} cannot be assigned work orders",
                assignee.account_type()
            )));
        }
        if order_fields.assigner == order_fields.assignee {
            return Err(EngineError::validation(
                "assigner and assignee cannot be the same account",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateSubAssignment
// ---------------------------------------------------------------------------

/// Creation-time policy for sub-assignments: the assigner must own the batch
/// the assignment carves work out of.
pub struct ValidateSubAssignment;

impl Listener for ValidateSubAssignment {
    fn name(&self) -> &'static str {
        "ValidateSubAssignment"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(SubEventType::SubAssignmentCreated.into(), -100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let assigner = ctx.slots.owner.as_ref().ok_or_else(|| {
            EngineError::validation(
                "assigner account not found in context for ValidateSubAssignment",
            )
        })?;
        let assignment_fields = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .and_then(|asset| asset.sub_assignment())
            .ok_or_else(|| {
                EngineError::validation(
                    "sub-assignment not found in context for ValidateSubAssignment",
                )
            })?;

        if !assigner
            .assets
            .iter()
            .any(|uid| uid == &assignment_fields.batch)
        {
            return Err(EngineError::validation(
                "artisan cannot assign sub-assignment for a batch they do not own",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateBatchCompletion
// ---------------------------------------------------------------------------

/// Direct batch completion: completer must own the batch, nothing deleted,
/// and a batch linked to a work order cannot be completed directly — only
/// through the work-order completion path.
pub struct ValidateBatchCompletion;

impl Listener for ValidateBatchCompletion {
    fn name(&self) -> &'static str {
        "ValidateBatchCompletion"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::BatchCompleted.into(), -100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let producer = ctx.slots.assignee.as_ref().ok_or_else(|| {
            EngineError::validation(
                "producer account not found in context for ValidateBatchCompletion",
            )
        })?;
        let batch = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .ok_or_else(|| {
                EngineError::validation(
                    "batch not found in context for ValidateBatchCompletion",
                )
            })?;
        let batch_fields = batch.batch().ok_or_else(|| {
            EngineError::validation("context entity is not a product batch")
        })?;

        if producer.public_key != batch.asset_owner {
            return Err(EngineError::validation(
                "producer must be the owner of the batch",
            ));
        }
        if producer.is_deleted {
            return Err(EngineError::validation("producer account is deleted"));
        }
        if batch.is_deleted {
            return Err(EngineError::validation("batch is deleted"));
        }
        if batch_fields.work_order.is_some() {
            return Err(EngineError::validation(
                "batch linked to a work order cannot be completed directly",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateCreatorAccount
// ---------------------------------------------------------------------------

/// Which account types may create which asset kinds.
pub struct ValidateCreatorAccount {
    valid_creators: HashMap<AccountType, Vec<AssetType>>,
}

impl ValidateCreatorAccount {
    pub fn new() -> Self {
        let mut valid_creators = HashMap::new();
        valid_creators.insert(
            AccountType::Supplier,
            vec![AssetType::RawMaterial, AssetType::WorkOrder],
        );
        valid_creators.insert(
            AccountType::Artisan,
            vec![
                AssetType::WorkOrder,
                AssetType::ProductBatch,
                AssetType::SubAssignment,
                AssetType::Packaging,
            ],
        );
        valid_creators.insert(AccountType::Buyer, vec![AssetType::WorkOrder]);
        Self { valid_creators }
    }
}

impl Default for ValidateCreatorAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for ValidateCreatorAccount {
    fn name(&self) -> &'static str {
        "ValidateCreatorAccount"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AssetCreated.into(), -100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let creator = ctx.slots.owner.as_ref().ok_or_else(|| {
            EngineError::validation(
                "account data not found in context for ValidateCreatorAccount",
            )
        })?;
        let asset = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .ok_or_else(|| {
                EngineError::validation(
                    "asset not found in context for ValidateCreatorAccount",
                )
            })?;

        let Some(creatable) = self.valid_creators.get(&creator.account_type()) else {
            return Err(EngineError::validation(format!(
                "account type {} cannot create any assets",
                creator.account_type()
            )));
        };
        if creator.is_deleted {
            return Err(EngineError::validation(
                "deleted accounts cannot create assets",
            ));
        }
        if !creatable.contains(&asset.asset_type()) {
            return Err(EngineError::validation(format!(
                "account type {} cannot create asset type {}",
                creator.account_type(),
                asset.asset_type()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateTransfer
// ---------------------------------------------------------------------------

/// Post-update transfer policy: nothing deleted on either side, and work
/// orders, batches, logistics records, and processed raw materials never
/// change hands.
pub struct ValidateTransfer;

impl Listener for ValidateTransfer {
    fn name(&self) -> &'static str {
        "ValidateTransfer"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AssetsTransferred.into(), -200)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        if ctx.slots.transferred_assets.is_empty() {
            return Err(EngineError::validation(
                "no assets found for validation in ValidateTransfer",
            ));
        }
        let recipient = ctx.slots.recipient.as_ref().ok_or_else(|| {
            EngineError::validation(
                "recipient account not found for validation in ValidateTransfer",
            )
        })?;
        let old_owner = ctx.slots.old_owner.as_ref().ok_or_else(|| {
            EngineError::validation(
                "previous owner account not found for validation in ValidateTransfer",
            )
        })?;

        for asset in &ctx.slots.transferred_assets {
            if asset.is_deleted {
                return Err(EngineError::validation(format!(
                    "asset {} is deleted",
                    asset.uid
                )));
            }
            match &asset.kind {
                AssetKind::RawMaterial(fields) => {
                    if !fields.processor_public_key.is_empty() {
                        return Err(EngineError::validation(
                            "processed raw materials cannot be transferred",
                        ));
                    }
                }
                AssetKind::WorkOrder(_) => {
                    return Err(EngineError::validation(
                        "work orders cannot be transferred",
                    ));
                }
                AssetKind::ProductBatch(_) => {
                    return Err(EngineError::validation("batches cannot be transferred"));
                }
                AssetKind::Logistics(_) => {
                    return Err(EngineError::validation(
                        "logistics assets cannot be transferred",
                    ));
                }
                _ => {}
            }
        }

        if recipient.is_deleted {
            return Err(EngineError::validation("recipient account is deleted"));
        }
        if old_owner.is_deleted {
            return Err(EngineError::validation("previous owner account is deleted"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateRawMaterialAddition
// ---------------------------------------------------------------------------

/// Adding raw material to a batch: the signer must own both records, the
/// batch must still be in progress, and the usage must fit the stock.
pub struct ValidateRawMaterialAddition;

impl Listener for ValidateRawMaterialAddition {
    fn name(&self) -> &'static str {
        "ValidateRawMaterialAddition"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AddRawMaterial.into(), -100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let raw_material = ctx.slots.raw_material.as_ref().ok_or_else(|| {
            EngineError::validation(
                "raw material not found in context for ValidateRawMaterialAddition",
            )
        })?;
        let batch = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .ok_or_else(|| {
                EngineError::validation(
                    "batch not found in context for ValidateRawMaterialAddition",
                )
            })?;
        let owner = ctx.slots.owner.as_ref().ok_or_else(|| {
            EngineError::validation(
                "owner account not found in context for ValidateRawMaterialAddition",
            )
        })?;
        let usage_quantity = ctx
            .require_fields()?
            .get("usage_quantity")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                EngineError::validation("missing 'usage_quantity' in payload fields")
            })?;

        if raw_material.is_deleted {
            return Err(EngineError::validation("raw material is deleted"));
        }
        if batch.is_deleted {
            return Err(EngineError::validation("batch is deleted"));
        }
        if owner.is_deleted {
            return Err(EngineError::validation("owner account is deleted"));
        }
        if raw_material.asset_owner != owner.public_key {
            return Err(EngineError::validation(
                "owner account does not own the raw material",
            ));
        }
        if batch.asset_owner != owner.public_key {
            return Err(EngineError::validation("owner account does not own the batch"));
        }
        let batch_fields = batch.batch().ok_or_else(|| {
            EngineError::validation("context entity is not a product batch")
        })?;
        if batch_fields.status != BatchStatus::InProgress {
            return Err(EngineError::validation(
                "can only add raw materials to batches that are in progress",
            ));
        }
        if usage_quantity <= 0.0 {
            return Err(EngineError::validation(
                "usage quantity must be a positive number",
            ));
        }
        let stock = raw_material
            .raw_material()
            .map(|fields| fields.quantity)
            .unwrap_or_default();
        if usage_quantity > stock {
            return Err(EngineError::validation(
                "usage quantity cannot exceed available raw material quantity",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidateAdminAccount
// ---------------------------------------------------------------------------

/// Which admin permission level may drive which admin-gated event. Runs last
/// so it judges whatever admin account the updaters surfaced.
pub struct ValidateAdminAccount {
    permitted: HashMap<AdminPermissionLevel, Vec<EventType>>,
}

impl ValidateAdminAccount {
    pub fn new() -> Self {
        let mut permitted = HashMap::new();
        permitted.insert(
            AdminPermissionLevel::SuperAdmin,
            vec![EventType::AdminCreated],
        );
        permitted.insert(
            AdminPermissionLevel::Certifier,
            vec![EventType::CertificationIssued],
        );
        permitted.insert(
            AdminPermissionLevel::Moderator,
            vec![EventType::ModeratorEdit],
        );
        permitted.insert(
            AdminPermissionLevel::Authenticator,
            vec![EventType::EntityAuthenticated],
        );
        Self { permitted }
    }
}

impl Default for ValidateAdminAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for ValidateAdminAccount {
    fn name(&self) -> &'static str {
        "ValidateAdminAccount"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AdminCreated.into(), -1000),
            (EventType::CertificationIssued.into(), -1000),
            (EventType::ModeratorEdit.into(), -1000),
            (EventType::EntityAuthenticated.into(), -1000),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        _state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let admin = ctx.slots.admin.as_ref().ok_or_else(|| {
            EngineError::validation(
                "admin account not found in context for ValidateAdminAccount",
            )
        })?;
        let admin_fields = admin.admin().ok_or_else(|| {
            EngineError::permission("acting account cannot perform any admin actions")
        })?;

        if admin.is_deleted {
            return Err(EngineError::validation(
                "deleted accounts cannot perform admin actions",
            ));
        }
        if admin_fields.status != AdminAccountStatus::Active {
            return Err(EngineError::validation(
                "only active admin accounts can perform admin actions",
            ));
        }

        let EventKey::Primary(event) = ctx.event_type else {
            return Ok(());
        };
        let allowed = self
            .permitted
            .get(&admin_fields.permission_level)
            .map(|events| events.contains(&event))
            .unwrap_or(false);
        if !allowed {
            return Err(EngineError::permission(format!(
                "permission level {:?} cannot perform {}",
                admin_fields.permission_level, event
            )));
        }
        Ok(())
    }
}
