use std::str::FromStr;

use serde_json::{json, Map, Value};

use craft_state::{address, StateAccess};
use craft_types::{
    Account, AccountKind, AdminFields, AdminPermissionLevel, Asset, AssetKind,
    AssetType, AuthenticationStatus, BatchStatus, Entity, EventKey, EventType,
    ProductBatchFields, SubEventType,
};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{address_occupied, get_account, put_record, Listener};

// ---------------------------------------------------------------------------
// AccountCreator
// ---------------------------------------------------------------------------

/// Builds a typed account record from the creation payload.
///
/// `public_key` and `created_timestamp` are always engine-set; the permission
/// guard has already stripped the forbidden fields, so whatever remains in
/// the payload is fair input for the record builder.
pub struct AccountCreator;

impl Listener for AccountCreator {
    fn name(&self) -> &'static str {
        "AccountCreator"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AccountCreated.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let mut fields = ctx.require_fields()?.clone();
        fields.insert(
            "public_key".into(),
            Value::String(ctx.signer_public_key.clone()),
        );
        fields.insert(
            "created_timestamp".into(),
            Value::String(ctx.timestamp.clone()),
        );

        let account: Account = serde_json::from_value(Value::Object(fields))
            .map_err(|e| EngineError::validation(format!("invalid account payload: {e}")))?;
        if account.admin().is_some() {
            return Err(EngineError::validation(
                "admin accounts are minted through the admin creation event",
            ));
        }

        let addr = address::account_address(&account.public_key);
        if address_occupied(&*state, &addr)? {
            return Err(EngineError::validation("account already exists"));
        }
        put_record(state, &addr, &account)?;

        ctx.slots.entity = Some(account.into());
        ctx.slots.entity_address = Some(addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AssetCreator
// ---------------------------------------------------------------------------

/// Builds typed asset records: directly from the payload for `create/asset`,
/// from the accepted work order for derived batch creation, and from the
/// transfer fields for derived logistics creation.
pub struct AssetCreator;

impl AssetCreator {
    fn create_from_payload(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let mut fields = ctx.require_fields()?.clone();
        let declared = fields
            .get("asset_type")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::validation("missing 'asset_type' in payload fields"))?;
        let kind = AssetType::from_str(declared)
            .map_err(|e| EngineError::validation(e.to_string()))?;

        match kind {
            AssetType::Product => {
                return Err(EngineError::validation(
                    "direct creation of product assets is not supported; \
                     complete a batch or work order instead",
                ));
            }
            AssetType::Logistics => {
                return Err(EngineError::validation(
                    "logistics assets can only be created when transferring assets",
                ));
            }
            AssetType::Certification => {
                return Err(EngineError::validation(
                    "certifications are issued through the certification event",
                ));
            }
            AssetType::RawMaterial => {
                fields.insert(
                    "supplier".into(),
                    Value::String(ctx.signer_public_key.clone()),
                );
            }
            AssetType::WorkOrder => {
                fields.insert(
                    "assigner".into(),
                    Value::String(ctx.signer_public_key.clone()),
                );
            }
            AssetType::SubAssignment => {
                fields.insert(
                    "assigner".into(),
                    Value::String(ctx.signer_public_key.clone()),
                );
            }
            AssetType::ProductBatch => {
                fields.insert(
                    "producer".into(),
                    Value::String(ctx.signer_public_key.clone()),
                );
            }
            AssetType::Packaging => {}
        }

        fields.insert(
            "asset_owner".into(),
            Value::String(ctx.signer_public_key.clone()),
        );
        fields.insert(
            "created_timestamp".into(),
            Value::String(ctx.timestamp.clone()),
        );

        self.store_new_asset(ctx, state, fields)
    }

    fn create_batch(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let work_order = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation("work order not found in context for batch creation")
            })?;
        let order_fields = work_order
            .work_order()
            .ok_or_else(|| EngineError::validation("context entity is not a work order"))?;
        let uid = ctx.require_str_field("uid")?.to_string();

        let batch = Asset::new(
            uid.clone(),
            ctx.signer_public_key.clone(),
            AssetKind::ProductBatch(ProductBatchFields {
                producer: ctx.signer_public_key.clone(),
                quantity: order_fields.requested_quantity,
                unit: order_fields.requested_quantity_unit.clone(),
                units_produced: None,
                product_description: order_fields.product_description.clone(),
                specifications: order_fields.specifications.clone(),
                design_reference: order_fields.design_reference.clone(),
                special_instructions: order_fields.special_instructions.clone(),
                status: BatchStatus::InProgress,
                work_order: Some(work_order.uid.clone()),
                production_date: String::new(),
                sub_assignments: Vec::new(),
                raw_materials: Vec::new(),
            }),
            ctx.timestamp.clone(),
        );

        let addr = address::asset_address(&uid);
        if address_occupied(&*state, &addr)? {
            return Err(EngineError::validation("asset already exists"));
        }
        put_record(state, &addr, &batch)?;

        ctx.slots.entity = Some(batch.into());
        ctx.slots.entity_address = Some(addr);
        Ok(())
    }

    fn create_logistics(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let outer = ctx.require_fields()?.clone();
        let mut fields = outer
            .get("logistics")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation("missing 'logistics' object in payload fields")
            })?;

        let assets = outer
            .get("assets")
            .cloned()
            .ok_or_else(|| EngineError::validation("missing 'assets' in payload fields"))?;
        let recipient = outer
            .get("recipient")
            .cloned()
            .ok_or_else(|| EngineError::validation("missing 'recipient' in payload fields"))?;

        fields.insert("asset_type".into(), Value::String("logistics".into()));
        fields.insert("assets".into(), assets);
        fields.insert("recipient".into(), recipient);
        fields.insert("transaction".into(), Value::String(ctx.signature.clone()));
        fields.insert(
            "asset_owner".into(),
            Value::String(ctx.signer_public_key.clone()),
        );
        fields.insert(
            "created_timestamp".into(),
            Value::String(ctx.timestamp.clone()),
        );

        self.store_new_asset(ctx, state, fields)
    }

    fn store_new_asset(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
        fields: Map<String, Value>,
    ) -> Result<(), EngineError> {
        let asset: Asset = serde_json::from_value(Value::Object(fields))
            .map_err(|e| EngineError::validation(format!("invalid asset payload: {e}")))?;
        let addr = address::asset_address(&asset.uid);
        if address_occupied(&*state, &addr)? {
            return Err(EngineError::validation("asset already exists"));
        }
        put_record(state, &addr, &asset)?;

        ctx.slots.entity = Some(asset.into());
        ctx.slots.entity_address = Some(addr);
        Ok(())
    }
}

impl Listener for AssetCreator {
    fn name(&self) -> &'static str {
        "AssetCreator"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::AssetCreated.into(), 1000),
            (SubEventType::BatchCreated.into(), 1000),
            (SubEventType::LogisticsCreated.into(), 0),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        match ctx.event_type {
            EventKey::Primary(EventType::AssetCreated) => self.create_from_payload(ctx, state),
            EventKey::Derived(SubEventType::BatchCreated) => self.create_batch(ctx, state),
            EventKey::Derived(SubEventType::LogisticsCreated) => {
                self.create_logistics(ctx, state)
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// AdminCreator
// ---------------------------------------------------------------------------

/// Mints admin accounts. Only the super admin may do this, and no second
/// super admin can ever be minted.
pub struct AdminCreator;

impl Listener for AdminCreator {
    fn name(&self) -> &'static str {
        "AdminCreator"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AdminCreated.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let mut fields = ctx.require_fields()?.clone();

        let (mut superadmin, superadmin_addr) = get_account(&*state, &ctx.signer_public_key)?;
        let is_super = superadmin
            .admin()
            .map(|a| a.permission_level == AdminPermissionLevel::SuperAdmin)
            .unwrap_or(false);
        if !is_super {
            return Err(EngineError::permission(
                "only the super admin can mint admin accounts",
            ));
        }

        if fields.get("permission_level").and_then(Value::as_str) == Some("super_admin") {
            return Err(EngineError::validation(
                "cannot create another super admin account",
            ));
        }

        fields.insert("account_type".into(), Value::String("admin".into()));
        fields.insert(
            "created_timestamp".into(),
            Value::String(ctx.timestamp.clone()),
        );

        let new_admin: Account = serde_json::from_value(Value::Object(fields))
            .map_err(|e| EngineError::validation(format!("invalid admin payload: {e}")))?;

        let addr = address::account_address(&new_admin.public_key);
        if address_occupied(&*state, &addr)? {
            return Err(EngineError::validation("account already exists"));
        }

        superadmin.push_history(
            ctx.history_entry(self.name(), vec![new_admin.public_key.clone()]),
        );
        put_record(state, &addr, &new_admin)?;
        put_record(state, &superadmin_addr, &superadmin)?;

        ctx.slots.entity = Some(new_admin.into());
        ctx.slots.entity_address = Some(addr);
        ctx.slots.admin = Some(superadmin);
        ctx.slots.admin_address = Some(superadmin_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// One-shot system bootstrap: mints the super admin account and marks the
/// bootstrap flag so it can never run again.
pub struct Bootstrap;

impl Listener for Bootstrap {
    fn name(&self) -> &'static str {
        "Bootstrap"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::Bootstrap.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let flag_addr = address::bootstrap_address();
        if address_occupied(&*state, &flag_addr)? {
            return Err(EngineError::validation(
                "bootstrap can only be performed once",
            ));
        }

        let email = ctx.require_str_field("email")?.to_string();

        let mut account = Account::new(
            ctx.signer_public_key.clone(),
            email,
            AccountKind::Admin(AdminFields {
                permission_level: AdminPermissionLevel::SuperAdmin,
                ..Default::default()
            }),
            ctx.timestamp.clone(),
        );
        account.authentication_status = AuthenticationStatus::Approved;
        account.push_history(ctx.history_entry(
            self.name(),
            vec!["bootstrap".into(), account.public_key.clone()],
        ));

        let account_addr = address::account_address(&account.public_key);
        put_record(state, &account_addr, &account)?;
        put_record(
            state,
            &flag_addr,
            &json!({
                "completed": true,
                "superadmin": ctx.signer_public_key,
                "timestamp": ctx.timestamp,
            }),
        )?;

        ctx.slots.entity = Some(account.into());
        ctx.slots.entity_address = Some(account_addr);
        Ok(())
    }
}
