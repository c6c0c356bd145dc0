use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use craft_state::StateAccess;
use craft_types::{
    AdminAction, AdminPermissionLevel, AuthenticationStatus, Entity, EventKey, EventType,
};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{
    get_account, get_entity_by_identifier, put_record, Listener, Target,
};

/// Overlay `updates` onto a record's JSON form and decode it back. A value
/// that does not fit the field's type fails the transaction.
fn apply_updates<T: Serialize + DeserializeOwned>(
    record: T,
    updates: &Map<String, Value>,
) -> Result<T, EngineError> {
    let mut value =
        serde_json::to_value(&record).map_err(|e| EngineError::Decode(e.to_string()))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| EngineError::Decode("record is not a JSON object".into()))?;
    for (key, update) in updates {
        object.insert(key.clone(), update.clone());
    }
    serde_json::from_value(value)
        .map_err(|e| EngineError::validation(format!("invalid value for edited field: {e}")))
}

fn apply_entity_updates(
    entity: Entity,
    updates: &Map<String, Value>,
) -> Result<Entity, EngineError> {
    match entity {
        Entity::Account(account) => Ok(Entity::Account(apply_updates(account, updates)?)),
        Entity::Asset(asset) => Ok(Entity::Asset(apply_updates(asset, updates)?)),
    }
}

// ---------------------------------------------------------------------------
// DeleteEntity
// ---------------------------------------------------------------------------

/// Soft deletion. Accounts may only delete themselves; assets only by their
/// owner, whose asset list loses the uid with its own history entry.
/// `is_deleted` is monotonic: deleting twice fails.
pub struct DeleteEntity;

impl Listener for DeleteEntity {
    fn name(&self) -> &'static str {
        "DeleteEntity"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::EntityDeleted.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let fields = ctx.require_fields()?.clone();
        let target = Target::from_fields(&fields)?;
        let reason = fields
            .get("deletion_reason")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::validation("a reason for deletion must be provided")
            })?
            .to_string();

        if let Target::Account(public_key) = &target {
            if public_key != &ctx.signer_public_key {
                return Err(EngineError::permission(
                    "cannot delete another user's account",
                ));
            }
        }

        let (mut entity, entity_addr) = target.resolve(&*state)?;

        if let Entity::Asset(asset) = &entity {
            if asset.asset_owner != ctx.signer_public_key {
                return Err(EngineError::permission(
                    "cannot delete an asset you do not own",
                ));
            }
            // Remove the asset from the owner's list, with its own entry.
            let (mut signer, signer_addr) = get_account(&*state, &ctx.signer_public_key)?;
            if signer.assets.iter().any(|uid| uid == &asset.uid) {
                signer.assets.retain(|uid| uid != &asset.uid);
                signer.push_history(ctx.history_entry(self.name(), vec![asset.uid.clone()]));
                put_record(state, &signer_addr, &signer)?;
                ctx.slots.owner = Some(signer);
                ctx.slots.owner_address = Some(signer_addr);
            }
        }

        if entity.is_deleted() {
            return Err(EngineError::validation("entity is already deleted"));
        }
        entity.mark_deleted(reason);
        entity.push_history(ctx.history_entry(self.name(), vec![entity.id().to_string()]));
        put_record(state, &entity_addr, &entity)?;

        ctx.slots.entity = Some(entity);
        ctx.slots.entity_address = Some(entity_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EditEntity
// ---------------------------------------------------------------------------

/// Applies `fields.updates` onto the target record. The permission guard has
/// already vetted every key against the editable set; this listener enforces
/// ownership and the frozen states (deleted entities, processed raw
/// materials).
pub struct EditEntity;

impl Listener for EditEntity {
    fn name(&self) -> &'static str {
        "EditEntity"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::EntityEdited.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let fields = ctx.require_fields()?.clone();
        let target = Target::from_fields(&fields)?;
        let updates = fields
            .get("updates")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation("missing 'updates' object in payload fields")
            })?;

        if let Target::Account(public_key) = &target {
            if public_key != &ctx.signer_public_key {
                return Err(EngineError::permission(
                    "cannot edit another user's account",
                ));
            }
        }

        let (entity, entity_addr) = target.resolve(&*state)?;

        if let Entity::Asset(asset) = &entity {
            if asset.asset_owner != ctx.signer_public_key {
                return Err(EngineError::permission(
                    "cannot edit an asset you do not own",
                ));
            }
            let (mut signer, signer_addr) = get_account(&*state, &ctx.signer_public_key)?;
            if signer.assets.iter().any(|uid| uid == &asset.uid) {
                signer.push_history(ctx.history_entry(self.name(), vec![asset.uid.clone()]));
                put_record(state, &signer_addr, &signer)?;
                ctx.slots.owner = Some(signer);
                ctx.slots.owner_address = Some(signer_addr);
            }
            if let Some(material) = asset.raw_material() {
                if !material.processor_public_key.is_empty() {
                    return Err(EngineError::validation(
                        "cannot edit a raw material after it has been processed",
                    ));
                }
            }
        }

        if entity.is_deleted() {
            return Err(EngineError::validation("entity is deleted"));
        }

        let mut entity = apply_entity_updates(entity, &updates)?;
        entity.push_history(ctx.history_entry(self.name(), vec![entity.id().to_string()]));
        put_record(state, &entity_addr, &entity)?;

        ctx.slots.entity = Some(entity);
        ctx.slots.entity_address = Some(entity_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AuthenticateEntity
// ---------------------------------------------------------------------------

/// Admin-driven authentication status change. Super admin accounts are
/// immune, and admins cannot authenticate themselves.
pub struct AuthenticateEntity;

impl Listener for AuthenticateEntity {
    fn name(&self) -> &'static str {
        "AuthenticateEntity"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::EntityAuthenticated.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let fields = ctx.require_fields()?.clone();
        let target = Target::from_fields(&fields)?;
        let status: AuthenticationStatus = ctx
            .require_str_field("authentication_status")?
            .parse()
            .map_err(|e: craft_types::TypeError| EngineError::validation(e.to_string()))?;

        let (mut entity, entity_addr) = target.resolve(&*state)?;

        if let Some(account) = entity.as_account() {
            if let Some(admin) = account.admin() {
                if admin.permission_level == AdminPermissionLevel::SuperAdmin {
                    return Err(EngineError::validation(
                        "cannot change authentication status of the super admin account",
                    ));
                }
                if account.public_key == ctx.signer_public_key {
                    return Err(EngineError::validation(
                        "cannot authenticate your own admin account",
                    ));
                }
            }
        }
        if entity.is_deleted() {
            return Err(EngineError::validation("entity is deleted"));
        }

        entity.set_authentication_status(status);

        let (mut authenticator, authenticator_addr) =
            get_account(&*state, &ctx.signer_public_key)?;
        if authenticator.admin().is_none() {
            return Err(EngineError::permission(
                "authenticator must be an admin account",
            ));
        }

        let entry = ctx.history_entry(self.name(), vec![entity.id().to_string()]);
        entity.push_history(entry.clone());
        authenticator.push_history(entry);
        put_record(state, &entity_addr, &entity)?;

        ctx.slots.entity = Some(entity);
        ctx.slots.entity_address = Some(entity_addr);
        // Written by AdminActionsUpdater, together with the action trail.
        ctx.slots.admin = Some(authenticator);
        ctx.slots.admin_address = Some(authenticator_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ModeratorEdit
// ---------------------------------------------------------------------------

/// Free-form edits by a moderator over non-admin entities. `fields.updates`
/// maps target identifiers to edit objects; `history` is untouchable.
pub struct ModeratorEdit;

impl Listener for ModeratorEdit {
    fn name(&self) -> &'static str {
        "ModeratorEdit"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::ModeratorEdit.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let updates = ctx
            .require_fields()?
            .get("updates")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation(
                    "'updates' must be a mapping of identifier to edit objects",
                )
            })?;

        let (mut moderator, moderator_addr) = get_account(&*state, &ctx.signer_public_key)?;
        if moderator.admin().is_none() {
            return Err(EngineError::permission("moderator must be an admin account"));
        }

        for (identifier, edit) in &updates {
            let edit = edit.as_object().ok_or_else(|| {
                EngineError::validation("'updates' entries must be objects")
            })?;
            if edit.contains_key("history") {
                return Err(EngineError::validation("cannot edit 'history' field"));
            }

            let (entity, entity_addr) = get_entity_by_identifier(&*state, identifier)?;
            if entity
                .as_account()
                .map(|a| a.admin().is_some())
                .unwrap_or(false)
            {
                return Err(EngineError::permission("cannot edit admin accounts"));
            }

            let mut entity = apply_entity_updates(entity, edit)?;
            entity.push_history(
                ctx.history_entry(self.name(), vec![entity.id().to_string()]),
            );
            put_record(state, &entity_addr, &entity)?;
        }

        moderator.push_history(
            ctx.history_entry(self.name(), updates.keys().cloned().collect()),
        );

        // Written by AdminActionsUpdater, together with the action trail.
        ctx.slots.admin = Some(moderator);
        ctx.slots.admin_address = Some(moderator_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AdminActionsUpdater
// ---------------------------------------------------------------------------

/// Appends the action trail entry to the acting admin account and writes it.
/// Every admin-gated event must carry `fields.action_details`.
pub struct AdminActionsUpdater;

impl Listener for AdminActionsUpdater {
    fn name(&self) -> &'static str {
        "AdminActionsUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AdminCreated.into(), 0),
            (EventType::CertificationIssued.into(), -300),
            (EventType::ModeratorEdit.into(), -300),
            (EventType::EntityAuthenticated.into(), -300),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let details = ctx
            .require_fields()?
            .get("action_details")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::validation("no action details provided in event payload")
            })?
            .to_string();

        let action = AdminAction {
            details,
            transaction: ctx.signature.clone(),
            timestamp: ctx.timestamp.clone(),
        };
        let addr = ctx.slots.admin_address.clone().ok_or_else(|| {
            EngineError::validation("admin address not found in context for AdminActionsUpdater")
        })?;
        let admin = ctx.slots.admin.as_mut().ok_or_else(|| {
            EngineError::validation("admin account not found in context for AdminActionsUpdater")
        })?;
        admin
            .admin_mut()
            .ok_or_else(|| EngineError::validation("acting account is not an admin"))?
            .actions
            .push(action);
        put_record(state, &addr, admin)?;
        Ok(())
    }
}
