use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use craft_state::StateAccess;
use craft_types::{AccountType, AssetType, Entity, EventKey, EventType, FieldPolicy};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{Listener, Target};

/// Field-permission enforcement, running at the highest priority for every
/// creation and edit event.
///
/// On creation it silently removes every forbidden field from the payload so
/// the record builder falls back to engine-computed defaults — it never
/// aborts. On edit it aborts the transaction when any target field lies
/// outside the entity's editable set.
pub struct FieldPermissionGuard {
    policy: FieldPolicy,
}

impl FieldPermissionGuard {
    pub fn new() -> Self {
        Self {
            policy: FieldPolicy::new(),
        }
    }

    fn strip_account_fields(&self, ctx: &mut EventContext) -> Result<(), EngineError> {
        let tag = if ctx.event_type == EventKey::Primary(EventType::AdminCreated) {
            AccountType::Admin
        } else {
            let declared = ctx
                .require_fields()?
                .get("account_type")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    EngineError::validation("missing 'account_type' in payload fields")
                })?;
            AccountType::from_str(declared)
                .map_err(|e| EngineError::validation(e.to_string()))?
        };
        let forbidden = self.policy.forbidden_account_fields(tag).clone();
        let fields = ctx
            .fields_mut()
            .ok_or_else(|| EngineError::validation("missing 'fields' key in payload"))?;
        for field in forbidden {
            if fields.remove(field).is_some() {
                debug!(field, "overriding forbidden creation field");
            }
        }
        Ok(())
    }

    fn strip_asset_fields(&self, ctx: &mut EventContext) -> Result<(), EngineError> {
        let tag = if ctx.event_type == EventKey::Primary(EventType::CertificationIssued) {
            AssetType::Certification
        } else {
            let declared = ctx
                .require_fields()?
                .get("asset_type")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    EngineError::validation("missing 'asset_type' in payload fields")
                })?;
            AssetType::from_str(declared)
                .map_err(|e| EngineError::validation(e.to_string()))?
        };
        let forbidden = self.policy.forbidden_asset_fields(tag).clone();
        let fields = ctx
            .fields_mut()
            .ok_or_else(|| EngineError::validation("missing 'fields' key in payload"))?;
        for field in forbidden {
            if fields.remove(field).is_some() {
                debug!(field, "overriding forbidden creation field");
            }
        }
        Ok(())
    }

    fn check_edit(
        &self,
        ctx: &EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let fields = ctx.require_fields()?;
        let updates = fields
            .get("updates")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                EngineError::validation("missing 'updates' object in payload fields")
            })?;
        let target = Target::from_fields(fields)?;
        let (entity, _) = target.resolve(&*state)?;
        let editable = match &entity {
            Entity::Account(account) => {
                self.policy.editable_account_fields(account.account_type())
            }
            Entity::Asset(asset) => self.policy.editable_asset_fields(asset.asset_type()),
        };
        for key in updates.keys() {
            if !editable.contains(key.as_str()) {
                return Err(EngineError::validation(format!(
                    "field '{key}' cannot be edited"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FieldPermissionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for FieldPermissionGuard {
    fn name(&self) -> &'static str {
        "FieldPermissionGuard"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AccountCreated.into(), 2000),
            (EventType::AssetCreated.into(), 2000),
            (EventType::AdminCreated.into(), 2000),
            (EventType::CertificationIssued.into(), 2000),
            (EventType::EntityEdited.into(), 2000),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        match ctx.event_type {
            EventKey::Primary(EventType::AccountCreated)
            | EventKey::Primary(EventType::AdminCreated) => self.strip_account_fields(ctx),
            EventKey::Primary(EventType::AssetCreated)
            | EventKey::Primary(EventType::CertificationIssued) => {
                self.strip_asset_fields(ctx)
            }
            EventKey::Primary(EventType::EntityEdited) => self.check_edit(ctx, state),
            _ => Ok(()),
        }
    }
}
