use serde_json::json;

use craft_state::{address, StateAccess};
use craft_types::{AssetKind, Entity, EventKey, EventType, SubEventType};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{address_occupied, get_account, put_record, Listener};

// ---------------------------------------------------------------------------
// EntityHistoryUpdater
// ---------------------------------------------------------------------------

/// Appends the creation history entry to the freshly created record and
/// re-stages it. Exactly one entry per entity per event.
pub struct EntityHistoryUpdater;

impl Listener for EntityHistoryUpdater {
    fn name(&self) -> &'static str {
        "EntityHistoryUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AccountCreated.into(), 0),
            (EventType::AssetCreated.into(), 0),
            (SubEventType::BatchCreated.into(), 0),
            (EventType::AdminCreated.into(), 0),
            (EventType::CertificationIssued.into(), -100),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let id = ctx
            .slots
            .entity
            .as_ref()
            .map(|e| e.id().to_string())
            .ok_or_else(|| {
                EngineError::validation(
                    "entity not found in context for EntityHistoryUpdater",
                )
            })?;
        let addr = ctx.slots.entity_address.clone().ok_or_else(|| {
            EngineError::validation(
                "entity address not found in context for EntityHistoryUpdater",
            )
        })?;

        let entry = ctx.history_entry(self.name(), vec![id]);
        if let Some(entity) = ctx.slots.entity.as_mut() {
            entity.push_history(entry);
            put_record(state, &addr, entity)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OwnerHistoryUpdater
// ---------------------------------------------------------------------------

/// Keeps the owning account's bookkeeping in step with its assets: the owned
/// asset list on creation, the supplier/issuer side lists, and a history
/// entry for every touch.
pub struct OwnerHistoryUpdater;

impl Listener for OwnerHistoryUpdater {
    fn name(&self) -> &'static str {
        "OwnerHistoryUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AssetCreated.into(), 0),
            (SubEventType::BatchCreated.into(), 0),
            (EventType::AddRawMaterial.into(), 0),
            (SubEventType::LogisticsCreated.into(), -100),
            (EventType::CertificationIssued.into(), 0),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let asset = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation("entity not found in context for OwnerHistoryUpdater")
            })?;

        let (mut owner, owner_addr) = get_account(&*state, &asset.asset_owner)?;

        let is_creation = !matches!(
            ctx.event_type,
            EventKey::Primary(EventType::AddRawMaterial)
        );
        if is_creation {
            owner.assets.push(asset.uid.clone());
        }

        let mut targets = vec![asset.uid.clone()];
        match &asset.kind {
            AssetKind::RawMaterial(_) => {
                let supplier = owner.supplier_mut().ok_or_else(|| {
                    EngineError::validation(
                        "owner must be a supplier account for raw materials",
                    )
                })?;
                supplier.raw_materials_created.push(asset.uid.clone());
            }
            AssetKind::WorkOrder(fields) => {
                targets.push(fields.assignee.clone());
                owner.work_orders_issued.push(asset.uid.clone());
            }
            _ => {}
        }
        if ctx.event_type == EventKey::Primary(EventType::AddRawMaterial) {
            targets.push(ctx.require_str_field("raw_material")?.to_string());
        }

        owner.push_history(ctx.history_entry(self.name(), targets));
        put_record(state, &owner_addr, &owner)?;

        ctx.slots.owner = Some(owner);
        ctx.slots.owner_address = Some(owner_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailIndexUpdater
// ---------------------------------------------------------------------------

/// Writes the email-uniqueness index entry for a new account. Runs last so
/// it indexes whatever record the earlier listeners settled on.
pub struct EmailIndexUpdater;

impl Listener for EmailIndexUpdater {
    fn name(&self) -> &'static str {
        "EmailIndexUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AccountCreated.into(), -1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let account = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_account)
            .ok_or_else(|| {
                EngineError::validation("account not found in context for EmailIndexUpdater")
            })?;

        let index_addr = address::email_index_address(&account.email);
        if address_occupied(&*state, &index_addr)? {
            return Err(EngineError::validation(format!(
                "{} is already taken",
                account.email
            )));
        }
        put_record(
            state,
            &index_addr,
            &json!({
                "public_key": account.public_key,
                "email": account.email,
            }),
        )?;
        Ok(())
    }
}
