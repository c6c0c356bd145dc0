use crate::listener::Listener;
use crate::listeners::*;
use crate::manager::EventsManager;

/// The full production listener set, in registration order. Priority ties
/// within one event key resolve in this order.
pub fn default_listeners() -> Vec<Box<dyn Listener>> {
    vec![
        Box::new(FieldPermissionGuard::new()),
        Box::new(AccountCreator),
        Box::new(AssetCreator),
        Box::new(AdminCreator),
        Box::new(Bootstrap),
        Box::new(CertificationCreator),
        Box::new(EntityHistoryUpdater),
        Box::new(OwnerHistoryUpdater),
        Box::new(EmailIndexUpdater),
        Box::new(AssigneeUpdater),
        Box::new(SubAssigneeUpdater),
        Box::new(ProducerUpdater),
        Box::new(BatchUpdater),
        Box::new(ProductsCreator),
        Box::new(AddToBatch),
        Box::new(AssetsTransferrer),
        Box::new(PackageProducts),
        Box::new(UnpackProduct),
        Box::new(DeleteEntity),
        Box::new(EditEntity),
        Box::new(AuthenticateEntity),
        Box::new(ModeratorEdit),
        Box::new(AdminActionsUpdater),
        Box::new(CertificateHolderUpdater),
        Box::new(ValidateAcceptContext),
        Box::new(ValidateAssigneeAccount::new()),
        Box::new(ValidateSubAssignment),
        Box::new(ValidateBatchCompletion),
        Box::new(ValidateCreatorAccount::new()),
        Box::new(ValidateTransfer),
        Box::new(ValidateRawMaterialAddition),
        Box::new(ValidateAdminAccount::new()),
    ]
}

/// An [`EventsManager`] wired with the full production listener set.
pub fn default_manager() -> EventsManager {
    let mut manager = EventsManager::new();
    for listener in default_listeners() {
        manager.register(listener);
    }
    manager
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manager_registers_every_listener() {
        let manager = default_manager();
        assert_eq!(manager.listener_count(), default_listeners().len());
    }
}
