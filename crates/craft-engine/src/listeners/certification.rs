use serde_json::Value;

use craft_state::{address, StateAccess};
use craft_types::{Asset, Entity, EventKey, EventType};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{
    address_occupied, get_entity_by_identifier, put_record, Listener,
};

// ---------------------------------------------------------------------------
// CertificationCreator
// ---------------------------------------------------------------------------

/// Builds the certification asset from the issuance payload. The issuer and
/// owner are always the signing authority.
pub struct CertificationCreator;

impl Listener for CertificationCreator {
    fn name(&self) -> &'static str {
        "CertificationCreator"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::CertificationIssued.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let mut fields = ctx.require_fields()?.clone();
        fields.insert("asset_type".into(), Value::String("certification".into()));
        fields.insert(
            "asset_owner".into(),
            Value::String(ctx.signer_public_key.clone()),
        );
        fields.insert("issuer".into(), Value::String(ctx.signer_public_key.clone()));
        fields.insert(
            "created_timestamp".into(),
            Value::String(ctx.timestamp.clone()),
        );
        if !fields.contains_key("issue_timestamp") {
            fields.insert(
                "issue_timestamp".into(),
                Value::String(ctx.timestamp.clone()),
            );
        }

        let certificate: Asset = serde_json::from_value(Value::Object(fields))
            .map_err(|e| {
                EngineError::validation(format!("invalid certification payload: {e}"))
            })?;

        let addr = address::asset_address(&certificate.uid);
        if address_occupied(&*state, &addr)? {
            return Err(EngineError::validation("certification already exists"));
        }
        put_record(state, &addr, &certificate)?;

        ctx.slots.entity = Some(certificate.into());
        ctx.slots.entity_address = Some(addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CertificateHolderUpdater
// ---------------------------------------------------------------------------

/// Appends the new certification to its holder's list. Holders containing a
/// hyphen are assets; anything else is an account public key. Must run after
/// the creator has put the certificate into the context.
pub struct CertificateHolderUpdater;

impl Listener for CertificateHolderUpdater {
    fn name(&self) -> &'static str {
        "CertificateHolderUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::CertificationIssued.into(), -200)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let certificate = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .cloned()
            .filter(|_| ctx.slots.entity_address.is_some())
            .ok_or_else(|| {
                EngineError::validation(
                    "certificate or address not found in context for CertificateHolderUpdater",
                )
            })?;
        let holder_id = certificate
            .certification()
            .ok_or_else(|| EngineError::validation("context entity is not a certification"))?
            .holder
            .clone();

        let (mut holder, holder_addr) = get_entity_by_identifier(&*state, &holder_id)?;
        let targets = vec![certificate.uid.clone(), holder.id().to_string()];

        holder.certifications_mut().push(certificate.uid.clone());
        holder.push_history(ctx.history_entry(self.name(), targets));
        put_record(state, &holder_addr, &holder)?;

        ctx.slots.holder = Some(holder);
        ctx.slots.holder_address = Some(holder_addr);
        // The issuing admin rides the owner slot from OwnerHistoryUpdater;
        // surface it for AdminActionsUpdater and the admin validator.
        ctx.slots.admin = ctx.slots.owner.clone();
        ctx.slots.admin_address = ctx.slots.owner_address.clone();
        Ok(())
    }
}
