use serde_json::Value;

use craft_state::{address, Address, StateAccess};
use craft_types::{
    Asset, AssetKind, BatchStatus, Entity, EventKey, EventType, ProductFields,
    SubAssignmentStatus, SubEventType, UsageRecord, WorkOrderStatus,
};

use crate::context::EventContext;
use crate::error::EngineError;
use crate::listener::{address_occupied, get_account, get_asset, put_record, Listener};

// ---------------------------------------------------------------------------
// AssigneeUpdater — work order state machine
// ---------------------------------------------------------------------------

enum OrderTransition {
    Accept,
    Reject,
    Complete,
}

/// Drives the work order lifecycle and the assignee account's bookkeeping.
///
/// Status transitions are enforced here, at high priority; the low-priority
/// [`ValidateAcceptContext`] re-checks actor identity against the
/// post-update context.
///
/// [`ValidateAcceptContext`]: crate::listeners::validators::ValidateAcceptContext
pub struct AssigneeUpdater;

impl AssigneeUpdater {
    fn on_created(
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
                EngineError::validation("work order not found in context for AssigneeUpdater")
            })?;
        let order_fields = work_order
            .work_order()
            .ok_or_else(|| EngineError::validation("context entity is not a work order"))?;

        let (mut assignee, assignee_addr) = get_account(&*state, &order_fields.assignee)?;
        let artisan = assignee.artisan_mut().ok_or_else(|| {
            EngineError::validation("assignee must be an artisan account")
        })?;
        artisan.work_orders_assigned.push(work_order.uid.clone());

        let targets = vec![work_order.uid.clone(), assignee.public_key.clone()];
        assignee.push_history(ctx.history_entry(self.name(), targets));
        put_record(state, &assignee_addr, &assignee)?;

        ctx.slots.assignee = Some(assignee);
        ctx.slots.assignee_address = Some(assignee_addr);
        Ok(())
    }

    fn on_transition(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
        transition: OrderTransition,
    ) -> Result<(), EngineError> {
        let uid = ctx.require_str_field("work_order")?.to_string();
        let (mut work_order, order_addr) = get_asset(&*state, &uid)?;
        let (mut assignee, assignee_addr) = get_account(&*state, &ctx.signer_public_key)?;

        let timestamp = ctx.timestamp.clone();
        let batch_uid = match transition {
            // The derived batch-creation event needs the new batch uid; it
            // rides in the acceptance payload.
            OrderTransition::Accept => Some(ctx.require_str_field("uid")?.to_string()),
            _ => None,
        };
        let rejection_reason = match transition {
            OrderTransition::Reject => {
                Some(ctx.require_str_field("rejection_reason")?.to_string())
            }
            _ => None,
        };

        let order_fields = work_order
            .work_order_mut()
            .ok_or_else(|| EngineError::validation("asset is not a work order"))?;
        let artisan = assignee.artisan_mut().ok_or_else(|| {
            EngineError::validation("assignee must be an artisan account")
        })?;

        match transition {
            OrderTransition::Accept => {
                if order_fields.status != WorkOrderStatus::Pending {
                    return Err(EngineError::validation(format!(
                        "work order status must be 'pending' to accept, current status: {:?}",
                        order_fields.status
                    )));
                }
                order_fields.status = WorkOrderStatus::Accepted;
                if let Some(batch_uid) = batch_uid {
                    order_fields.batch = batch_uid;
                }
                artisan.work_orders_accepted.push(uid.clone());
            }
            OrderTransition::Reject => {
                if order_fields.status != WorkOrderStatus::Pending {
                    return Err(EngineError::validation(format!(
                        "work order status must be 'pending' to reject, current status: {:?}",
                        order_fields.status
                    )));
                }
                order_fields.status = WorkOrderStatus::Rejected;
                if let Some(reason) = rejection_reason {
                    order_fields.rejection_reason = reason;
                }
                artisan.work_orders_rejected.push(uid.clone());
            }
            OrderTransition::Complete => {
                if order_fields.status != WorkOrderStatus::Accepted {
                    return Err(EngineError::validation(format!(
                        "work order status must be 'accepted' to complete, current status: {:?}",
                        order_fields.status
                    )));
                }
                order_fields.status = WorkOrderStatus::Completed;
                order_fields.completion_date = timestamp;
                artisan.work_orders_completed.push(uid.clone());
            }
        }

        let targets = vec![uid, assignee.public_key.clone()];
        let entry = ctx.history_entry(self.name(), targets);
        work_order.push_history(entry.clone());
        assignee.push_history(entry);

        put_record(state, &order_addr, &work_order)?;
        put_record(state, &assignee_addr, &assignee)?;

        ctx.slots.entity = Some(work_order.into());
        ctx.slots.entity_address = Some(order_addr);
        ctx.slots.assignee = Some(assignee);
        ctx.slots.assignee_address = Some(assignee_addr);
        Ok(())
    }
}

impl Listener for AssigneeUpdater {
    fn name(&self) -> &'static str {
        "AssigneeUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (SubEventType::WorkOrderCreated.into(), 0),
            (EventType::WorkOrderAccepted.into(), 1000),
            (EventType::WorkOrderRejected.into(), 1000),
            (EventType::WorkOrderCompleted.into(), 1000),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        match ctx.event_type {
            EventKey::Derived(SubEventType::WorkOrderCreated) => self.on_created(ctx, state),
            EventKey::Primary(EventType::WorkOrderAccepted) => {
                self.on_transition(ctx, state, OrderTransition::Accept)
            }
            EventKey::Primary(EventType::WorkOrderRejected) => {
                self.on_transition(ctx, state, OrderTransition::Reject)
            }
            EventKey::Primary(EventType::WorkOrderCompleted) => {
                self.on_transition(ctx, state, OrderTransition::Complete)
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// SubAssigneeUpdater — sub-assignment state machine
// ---------------------------------------------------------------------------

enum AssignmentTransition {
    Accept,
    Reject,
    Complete,
    MarkPaid,
}

/// Mirror of the work order machine for sub-assignments carved out of a
/// batch, plus the payment flag (`is_paid` moves false→true exactly once,
/// driven by the assigner).
pub struct SubAssigneeUpdater;

impl SubAssigneeUpdater {
    fn on_created(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let assignment = ctx
            .slots
            .entity
            .as_ref()
            .and_then(Entity::as_asset)
            .cloned()
            .ok_or_else(|| {
                EngineError::validation(
                    "sub-assignment not found in context for SubAssigneeUpdater",
                )
            })?;
        let assignment_fields = assignment.sub_assignment().ok_or_else(|| {
            EngineError::validation("context entity is not a sub-assignment")
        })?;

        let (mut assignee, assignee_addr) =
            get_account(&*state, &assignment_fields.assignee)?;
        let artisan = assignee.artisan_mut().ok_or_else(|| {
            EngineError::validation("assignee must be an artisan account")
        })?;
        artisan.sub_assignments.push(assignment.uid.clone());

        let targets = vec![assignment.uid.clone(), assignee.public_key.clone()];
        assignee.push_history(ctx.history_entry(self.name(), targets));
        put_record(state, &assignee_addr, &assignee)?;

        ctx.slots.assignee = Some(assignee);
        ctx.slots.assignee_address = Some(assignee_addr);
        Ok(())
    }

    fn on_transition(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
        transition: AssignmentTransition,
    ) -> Result<(), EngineError> {
        let uid = ctx.require_str_field("subassignment")?.to_string();
        let (mut assignment, assignment_addr) = get_asset(&*state, &uid)?;

        let assignment_fields = assignment
            .sub_assignment_mut()
            .ok_or_else(|| EngineError::validation("asset is not a sub-assignment"))?;
        let stored_assignee = assignment_fields.assignee.clone();
        let stored_assigner = assignment_fields.assigner.clone();
        let batch_uid = assignment_fields.batch.clone();

        let mut targets = vec![uid.clone()];

        match transition {
            AssignmentTransition::Accept => {
                if assignment_fields.status != SubAssignmentStatus::Pending {
                    return Err(EngineError::validation(format!(
                        "sub-assignment status must be 'pending' to accept, current status: {:?}",
                        assignment_fields.status
                    )));
                }
                assignment_fields.status = SubAssignmentStatus::Accepted;
            }
            AssignmentTransition::Reject => {
                if assignment_fields.status != SubAssignmentStatus::Pending {
                    return Err(EngineError::validation(format!(
                        "sub-assignment status must be 'pending' to reject, current status: {:?}",
                        assignment_fields.status
                    )));
                }
                assignment_fields.status = SubAssignmentStatus::Rejected;
                assignment_fields.rejection_reason =
                    Some(ctx.require_str_field("rejection_reason")?.to_string());
            }
            AssignmentTransition::Complete => {
                if assignment_fields.status != SubAssignmentStatus::Accepted {
                    return Err(EngineError::validation(format!(
                        "sub-assignment status must be 'accepted' to complete, current status: {:?}",
                        assignment_fields.status
                    )));
                }
                assignment_fields.status = SubAssignmentStatus::Completed;
            }
            AssignmentTransition::MarkPaid => {
                if assignment_fields.status != SubAssignmentStatus::Completed {
                    return Err(EngineError::validation(
                        "sub-assignment must be completed before it can be marked as paid",
                    ));
                }
                if assignment_fields.is_paid {
                    return Err(EngineError::validation(
                        "sub-assignment is already marked as paid",
                    ));
                }
                if stored_assigner != ctx.signer_public_key {
                    return Err(EngineError::permission(
                        "only the assigner can mark a sub-assignment as paid",
                    ));
                }
                assignment_fields.is_paid = true;
            }
        }

        // The acting account: the assignee for accept/reject/complete, the
        // paying assigner for mark-paid.
        let (mut actor, actor_addr) = get_account(&*state, &ctx.signer_public_key)?;
        match transition {
            AssignmentTransition::Accept => {
                let artisan = actor.artisan_mut().ok_or_else(|| {
                    EngineError::validation("assignee must be an artisan account")
                })?;
                artisan.sub_assignments_accepted.push(uid.clone());

                // Acceptance also links the assignment into its batch.
                let (mut batch, batch_addr) = get_asset(&*state, &batch_uid)?;
                let batch_fields = batch.batch_mut().ok_or_else(|| {
                    EngineError::validation("sub-assigned batch must be a product batch")
                })?;
                batch_fields.sub_assignments.push(uid.clone());
                targets.push(batch.uid.clone());
                batch.push_history(ctx.history_entry(self.name(), targets.clone()));
                put_record(state, &batch_addr, &batch)?;
                ctx.slots.batch = Some(batch);
                ctx.slots.batch_address = Some(batch_addr);
            }
            AssignmentTransition::Reject => {
                let artisan = actor.artisan_mut().ok_or_else(|| {
                    EngineError::validation("assignee must be an artisan account")
                })?;
                artisan.sub_assignments_rejected.push(uid.clone());
            }
            AssignmentTransition::Complete | AssignmentTransition::MarkPaid => {}
        }

        let entry = ctx.history_entry(self.name(), targets);
        assignment.push_history(entry.clone());
        actor.push_history(entry);

        put_record(state, &assignment_addr, &assignment)?;
        put_record(state, &actor_addr, &actor)?;

        // The validator checks the post-update context against the stored
        // assignee; for mark-paid the actor is the assigner, so resolve the
        // assignee separately.
        if matches!(transition, AssignmentTransition::MarkPaid) {
            let (assignee, assignee_addr) = get_account(&*state, &stored_assignee)?;
            ctx.slots.assignee = Some(assignee);
            ctx.slots.assignee_address = Some(assignee_addr);
        } else {
            ctx.slots.assignee = Some(actor);
            ctx.slots.assignee_address = Some(actor_addr);
        }

        ctx.slots.entity = Some(assignment.into());
        ctx.slots.entity_address = Some(assignment_addr);
        Ok(())
    }
}

impl Listener for SubAssigneeUpdater {
    fn name(&self) -> &'static str {
        "SubAssigneeUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (SubEventType::SubAssignmentCreated.into(), 0),
            (EventType::SubAssignmentAccepted.into(), 1000),
            (EventType::SubAssignmentRejected.into(), 1000),
            (EventType::SubAssignmentCompleted.into(), 1000),
            (EventType::SubAssignmentMarkedPaid.into(), 1000),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        match ctx.event_type {
            EventKey::Derived(SubEventType::SubAssignmentCreated) => {
                self.on_created(ctx, state)
            }
            EventKey::Primary(EventType::SubAssignmentAccepted) => {
                self.on_transition(ctx, state, AssignmentTransition::Accept)
            }
            EventKey::Primary(EventType::SubAssignmentRejected) => {
                self.on_transition(ctx, state, AssignmentTransition::Reject)
            }
            EventKey::Primary(EventType::SubAssignmentCompleted) => {
                self.on_transition(ctx, state, AssignmentTransition::Complete)
            }
            EventKey::Primary(EventType::SubAssignmentMarkedPaid) => {
                self.on_transition(ctx, state, AssignmentTransition::MarkPaid)
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// BatchUpdater
// ---------------------------------------------------------------------------

/// Completes a batch: directly for `complete/batch`, or through its linked
/// work order for `complete/work_order`. Requires `units_produced`.
pub struct BatchUpdater;

impl Listener for BatchUpdater {
    fn name(&self) -> &'static str {
        "BatchUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::WorkOrderCompleted.into(), 0),
            (EventType::BatchCompleted.into(), 0),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let (mut batch, batch_addr, targets): (Asset, Address, Vec<String>) =
            match ctx.event_type {
                EventKey::Primary(EventType::WorkOrderCompleted) => {
                    let work_order = ctx
                        .slots
                        .entity
                        .as_ref()
                        .and_then(Entity::as_asset)
                        .ok_or_else(|| {
                            EngineError::validation(
                                "work order not found in context for BatchUpdater",
                            )
                        })?;
                    let order_fields = work_order.work_order().ok_or_else(|| {
                        EngineError::validation("context entity is not a work order")
                    })?;
                    if order_fields.batch.is_empty() {
                        return Err(EngineError::validation(
                            "work order has no linked batch",
                        ));
                    }
                    let (batch, addr) = get_asset(&*state, &order_fields.batch)?;
                    let targets = vec![work_order.uid.clone(), batch.uid.clone()];
                    (batch, addr, targets)
                }
                _ => {
                    let batch = ctx
                        .slots
                        .entity
                        .as_ref()
                        .and_then(Entity::as_asset)
                        .cloned()
                        .ok_or_else(|| {
                            EngineError::validation(
                                "batch not found in context for BatchUpdater",
                            )
                        })?;
                    let addr = address::asset_address(&batch.uid);
                    let targets = vec![batch.uid.clone()];
                    (batch, addr, targets)
                }
            };

        let fields = ctx.require_fields()?;
        let quantity = fields.get("quantity").and_then(Value::as_f64);
        let units_produced = fields
            .get("units_produced")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                EngineError::validation("missing 'units_produced' in payload fields")
            })? as u32;

        let batch_fields = batch
            .batch_mut()
            .ok_or_else(|| EngineError::validation("asset is not a product batch"))?;
        batch_fields.production_date = ctx.timestamp.clone();
        batch_fields.status = BatchStatus::Completed;
        if let Some(quantity) = quantity {
            batch_fields.quantity = quantity;
        }
        batch_fields.units_produced = Some(units_produced);

        batch.push_history(ctx.history_entry(self.name(), targets));
        put_record(state, &batch_addr, &batch)?;

        ctx.slots.batch = Some(batch);
        ctx.slots.batch_address = Some(batch_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProducerUpdater
// ---------------------------------------------------------------------------

/// Resolves the batch and its producer for direct batch completion, guards
/// the in-progress status, and seeds the context for the downstream batch
/// and product listeners.
pub struct ProducerUpdater;

impl Listener for ProducerUpdater {
    fn name(&self) -> &'static str {
        "ProducerUpdater"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::BatchCompleted.into(), 1000)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let batch_uid = ctx.require_str_field("batch")?.to_string();
        let (mut batch, batch_addr) = get_asset(&*state, &batch_uid)?;
        let (mut producer, producer_addr) = get_account(&*state, &ctx.signer_public_key)?;

        let batch_fields = batch
            .batch()
            .ok_or_else(|| EngineError::validation("asset is not a product batch"))?;
        if batch_fields.status != BatchStatus::InProgress {
            return Err(EngineError::validation(format!(
                "batch status must be 'in_progress' to complete, current status: {:?}",
                batch_fields.status
            )));
        }

        let entry = ctx.history_entry(self.name(), vec![batch.uid.clone()]);
        batch.push_history(entry.clone());
        producer.push_history(entry);

        put_record(state, &batch_addr, &batch)?;
        put_record(state, &producer_addr, &producer)?;

        ctx.slots.entity = Some(batch.into());
        ctx.slots.entity_address = Some(batch_addr);
        // The producer plays the assignee slot so the shared accept-context
        // validator applies unchanged.
        ctx.slots.assignee = Some(producer);
        ctx.slots.assignee_address = Some(producer_addr);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProductsCreator
// ---------------------------------------------------------------------------

/// Mints one product per produced unit when a batch completes, serials
/// `{batch_uid}-1 ..= {batch_uid}-{units_produced}`, and credits them to the
/// producer.
pub struct ProductsCreator;

impl Listener for ProductsCreator {
    fn name(&self) -> &'static str {
        "ProductsCreator"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![
            (EventType::WorkOrderCompleted.into(), -200),
            (EventType::BatchCompleted.into(), -200),
        ]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let batch = ctx.slots.batch.clone().ok_or_else(|| {
            EngineError::validation("batch not found in context for ProductsCreator")
        })?;
        let mut producer = ctx.slots.assignee.clone().ok_or_else(|| {
            EngineError::validation("producer account not found in context for ProductsCreator")
        })?;
        let producer_addr = ctx.slots.assignee_address.clone().ok_or_else(|| {
            EngineError::validation("producer address not found in context for ProductsCreator")
        })?;

        let batch_fields = batch
            .batch()
            .ok_or_else(|| EngineError::validation("context batch is not a product batch"))?;
        let units = batch_fields.units_produced.ok_or_else(|| {
            EngineError::validation("batch has no units_produced recorded")
        })?;
        if units == 0 {
            return Err(EngineError::validation(
                "units_produced must be a positive number",
            ));
        }

        let fields = ctx.require_fields()?;
        let declared_price = fields.get("products_price").and_then(Value::as_f64);
        let (price, targets) = match ctx.event_type {
            EventKey::Primary(EventType::WorkOrderCompleted) => {
                let work_order = ctx
                    .slots
                    .entity
                    .as_ref()
                    .and_then(Entity::as_asset)
                    .ok_or_else(|| {
                        EngineError::validation(
                            "work order not found in context for ProductsCreator",
                        )
                    })?;
                let order_fields = work_order.work_order().ok_or_else(|| {
                    EngineError::validation("context entity is not a work order")
                })?;
                let price = declared_price
                    .unwrap_or(order_fields.total_price_usd / units as f64);
                (price, vec![work_order.uid.clone(), batch.uid.clone()])
            }
            _ => {
                let price = declared_price.ok_or_else(|| {
                    EngineError::validation(
                        "missing 'products_price' in payload fields for batch completion",
                    )
                })?;
                (price, vec![batch.uid.clone()])
            }
        };

        let mut product_uids = Vec::with_capacity(units as usize);
        for serial in 1..=units {
            let uid = format!("{}-{}", batch.uid, serial);
            let mut product = Asset::new(
                uid.clone(),
                batch_fields.producer.clone(),
                AssetKind::Product(ProductFields {
                    batch: batch.uid.clone(),
                    serial_no: serial,
                    price_usd: price,
                    quantity: batch_fields.quantity / units as f64,
                    unit: batch_fields.unit.clone(),
                    packaging: None,
                }),
                ctx.timestamp.clone(),
            );
            let mut product_targets = targets.clone();
            product_targets.push(uid.clone());
            product.push_history(ctx.history_entry(self.name(), product_targets));

            let addr = address::asset_address(&uid);
            if address_occupied(&*state, &addr)? {
                return Err(EngineError::validation(format!(
                    "product with uid {uid} already exists"
                )));
            }
            put_record(state, &addr, &product)?;
            product_uids.push(uid);
        }

        producer.assets.extend(product_uids.iter().cloned());
        producer.push_history(ctx.history_entry(self.name(), product_uids));
        put_record(state, &producer_addr, &producer)?;

        ctx.slots.assignee = Some(producer);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AddToBatch
// ---------------------------------------------------------------------------

/// Links a raw material into a batch through mirrored [`UsageRecord`]s and
/// stamps the material as processed by the signer.
pub struct AddToBatch;

impl Listener for AddToBatch {
    fn name(&self) -> &'static str {
        "AddToBatch"
    }

    fn bindings(&self) -> Vec<(EventKey, i32)> {
        vec![(EventType::AddRawMaterial.into(), 100)]
    }

    fn on_event(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn StateAccess,
    ) -> Result<(), EngineError> {
        let batch_uid = ctx.require_str_field("batch")?.to_string();
        let raw_material_uid = ctx.require_str_field("raw_material")?.to_string();
        let usage_quantity = ctx
            .require_fields()?
            .get("usage_quantity")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                EngineError::validation("missing 'usage_quantity' in payload fields")
            })?;

        let (mut batch, batch_addr) = get_asset(&*state, &batch_uid)?;
        let (mut raw_material, raw_material_addr) = get_asset(&*state, &raw_material_uid)?;

        let usage = UsageRecord {
            batch: batch.uid.clone(),
            raw_material: raw_material.uid.clone(),
            usage_quantity,
        };

        batch
            .batch_mut()
            .ok_or_else(|| EngineError::validation("asset is not a product batch"))?
            .raw_materials
            .push(usage.clone());
        let material_fields = raw_material
            .raw_material_mut()
            .ok_or_else(|| EngineError::validation("asset is not a raw material"))?;
        material_fields.batches_used_in.push(usage);
        material_fields.processor_public_key = ctx.signer_public_key.clone();

        let entry = ctx.history_entry(
            self.name(),
            vec![batch.uid.clone(), raw_material.uid.clone()],
        );
        batch.push_history(entry.clone());
        raw_material.push_history(entry);

        put_record(state, &batch_addr, &batch)?;
        put_record(state, &raw_material_addr, &raw_material)?;

        ctx.slots.entity = Some(batch.into());
        ctx.slots.entity_address = Some(batch_addr);
        ctx.slots.raw_material = Some(raw_material);
        ctx.slots.raw_material_address = Some(raw_material_addr);
        Ok(())
    }
}
