use serde_json::Value;

use craft_state::StateAccess;
use craft_types::{Entity, EventKey, EventType, SubEventType};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{get_account, get_asset, put_record, Listener};

// ---------------------------------------------------------------------------
// AssetsTransferrer
// ---------------------------------------------------------------------------

/// Moves ownership of a set of assets — and of every product packed inside a
/// transferred packaging — to the recipient, leaving previous-owner and
/// logistics trails on each record. The derived logistics-creation event
/// snapshots the shipment itself.
pub struct AssetsTransferrer;

impl Listener for AssetsTransferrer {
    fn name(&self) -> &'static str {
        "AssetsTransferrer"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AssetsTransferred.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let fields = ctx.require_fields()?;
        let asset_ids: Vec<String> = fields
            .get("assets")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .filter(|ids: &Vec<String>| !ids.is_empty())
            .ok_or_else(|| EngineError::validation("missing 'assets' in payload fields"))?;
        let recipient_key = ctx.require_str_field("recipient")?.to_string();
        let logistics_uid = ctx
            .require_fields()?
            .get("logistics")
            .and_then(Value::as_object)
            .and_then(|l| l.get("uid"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::validation("missing 'logistics' uid in payload fields")
            })?
            .to_string();

        let mut assets = Vec::new();
        for id in &asset_ids {
            assets.push(get_asset(&*state, id)?);
        }
        // Products travel with their packaging.
        let packaged: Vec<String> = assets
            .iter()
            .filter_map(|(asset, _)| asset.packaging())
            .flat_map(|p| p.products.iter().cloned())
            .collect();
        for id in &packaged {
            assets.push(get_asset(&*state, id)?);
        }

        let (mut recipient, recipient_addr) = get_account(&*state, &recipient_key)?;
        let (mut old_owner, old_owner_addr) =
            get_account(&*state, &ctx.signer_public_key)?;

        let mut targets: Vec<String> =
            assets.iter().map(|(asset, _)| asset.uid.clone()).collect();
        targets.push(recipient_key.clone());
        targets.push(logistics_uid.clone());
        let entry = ctx.history_entry(self.name(), targets);

        let mut moved = Vec::with_capacity(assets.len());
        for (mut asset, addr) in assets {
            if asset.asset_owner != ctx.signer_public_key {
                return Err(EngineError::permission(
                    "only the current owner can transfer the asset",
                ));
            }
            asset.asset_owner = recipient_key.clone();
            asset.previous_owners.push(ctx.signer_public_key.clone());
            asset.transfer_logistics.push(logistics_uid.clone());
            recipient.assets.push(asset.uid.clone());
            old_owner.assets.retain(|uid| uid != &asset.uid);

            if asset.raw_material().is_some() {
                if let Some(supplier) = old_owner.supplier_mut() {
                    supplier.raw_materials_supplied.push(asset.uid.clone());
                }
            }

            asset.push_history(entry.clone());
            put_record(state, &addr, &asset)?;
            moved.push(asset);
        }

        recipient.push_history(entry.clone());
        old_owner.push_history(entry);
        put_record(state, &recipient_addr, &recipient)?;
        put_record(state, &old_owner_addr, &old_owner)?;

        ctx.slots.recipient = Some(recipient);
        ctx.slots.old_owner = Some(old_owner);
        ctx.slots.transferred_assets = moved;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PackageProducts
// ---------------------------------------------------------------------------

/// Links every product named by a new packaging asset back to it. Deleted,
/// already-packaged, or foreign products abort the transaction.
pub struct PackageProducts;

impl Listener for PackageProducts {
    fn name(&self) -> &'static str {
        "PackageProducts"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(SubEventType::PackagingCreated.into(), 0)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let packaging = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation("packaging not found in context for PackageProducts")
            })?;
        let packaging_fields = packaging.packaging().ok_or_else(|| {
            EngineError::validation("context entity is not a packaging asset")
        })?;

        for product_uid in &packaging_fields.products {
            let (mut product, product_addr) = get_asset(&*state, product_uid)?;
            let product_fields = product.product_mut().ok_or_else(|| {
                EngineError::validation(format!("asset {product_uid} is not a product"))
            })?;

            if let Some(existing) = &product_fields.packaging {
                return Err(EngineError::validation(format!(
                    "product {product_uid} is already included in packaging {existing}"
                )));
            }
            product_fields.packaging = Some(packaging.uid.clone());

            if product.is_deleted {
                return Err(EngineError::validation(format!(
                    "cannot include deleted product {product_uid} in packaging"
                )));
            }
            if product.asset_owner != ctx.signer_public_key {
                return Err(EngineError::permission(format!(
                    "product {product_uid} is owned by {}, cannot be packaged by {}",
                    product.asset_owner, ctx.signer_public_key
                )));
            }

            product.push_history(ctx.history_entry(
                self.name(),
                vec![product_uid.clone(), packaging.uid.clone()],
            ));
            put_record(state, &product_addr, &product)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UnpackProduct
// ---------------------------------------------------------------------------

/// Inverse of packaging for a single product: unlinks it from its packaging
/// and removes it from the packaging's product list. Owner-only on both
/// sides.
pub struct UnpackProduct;

impl Listener for UnpackProduct {
    fn name(&self) -> &'static str {
        "UnpackProduct"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::ProductUnpacked.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let uid = ctx.require_str_field("uid")?.to_string();
        let (mut product, product_addr) = get_asset(&*state, &uid)?;

        if product.asset_owner != ctx.signer_public_key {
            return Err(EngineError::permission(
                "cannot unpack a product you do not own",
            ));
        }
        if product.is_deleted {
            return Err(EngineError::validation("cannot unpack a deleted product"));
        }
        let product_fields = product
            .product_mut()
            .ok_or_else(|| EngineError::validation("asset is not a product"))?;
        let packaging_uid = product_fields.packaging.take().ok_or_else(|| {
            EngineError::validation("product has no associated packaging to unpack")
        })?;

        let (mut packaging, packaging_addr) = get_asset(&*state, &packaging_uid)?;
        if packaging.is_deleted {
            return Err(EngineError::validation(
                "cannot unpack from a deleted packaging",
            ));
        }
        if packaging.asset_owner != ctx.signer_public_key {
            return Err(EngineError::permission(
                "cannot unpack from a packaging you do not own",
            ));
        }
        packaging
            .packaging_mut()
            .ok_or_else(|| EngineError::validation("associated asset is not a packaging"))?
            .products
            .retain(|p| p != &uid);

        let (mut owner, owner_addr) = get_account(&*state, &ctx.signer_public_key)?;
        if owner.is_deleted {
            return Err(EngineError::validation("owner account is deleted"));
        }

        let entry = ctx.history_entry(
            self.name(),
            vec![product.uid.clone(), packaging.uid.clone()],
        );
        product.push_history(entry.clone());
        packaging.push_history(entry.clone());
        owner.push_history(entry);

        put_record(state, &product_addr, &product)?;
        put_record(state, &packaging_addr, &packaging)?;
        put_record(state, &owner_addr, &owner)?;

        ctx.slots.entity = Some(product.into());
        ctx.slots.entity_address = Some(product_addr);
        ctx.slots.owner = Some(owner);
        ctx.slots.owner_address = Some(owner_addr);
        Ok(())
    }
}
