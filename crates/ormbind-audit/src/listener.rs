//! Post-event audit listeners.

use std::sync::Arc;

use ormbind_core::{EntityId, Value};
use tracing::{debug, instrument};

use crate::config::{AuditConfig, RelationDescription};
use crate::error::{AuditError, Result};
use crate::event::{PostDeleteEvent, PostInsertEvent, PostUpdateEvent};
use crate::manager::AuditProcessManager;
use crate::process::AuditProcess;
use crate::session::{EntityPersister, Session, SessionId};
use crate::work_unit::AuditWorkUnit;

/// Turns post-insert, post-update and post-delete events into queued work units.
#[derive(Debug, Clone)]
pub struct AuditEventListener {
    manager: Arc<AuditProcessManager>,
}

impl AuditEventListener {
    /// Create a listener feeding `manager`.
    pub fn new(manager: Arc<AuditProcessManager>) -> Self {
        Self { manager }
    }

    /// The process manager this listener feeds.
    pub fn manager(&self) -> &AuditProcessManager {
        &self.manager
    }

    fn config(&self) -> &AuditConfig {
        self.manager.config()
    }

    /// Handle an insert.
    #[instrument(skip_all, fields(entity = event.persister.entity_name(), id = %event.id))]
    pub fn on_post_insert(&self, session: &dyn Session, event: &PostInsertEvent) -> Result<()> {
        check_transaction_in_progress(session)?;
        let entity_name = event.persister.entity_name();
        if !self.config().is_audited(entity_name) {
            return Ok(());
        }

        let unit = AuditWorkUnit::add(
            session.id(),
            self.config(),
            event.persister.as_ref(),
            event.id.clone(),
            &event.state,
        )?;
        let mut process = self.manager.get(session.id());
        process.add_work_unit(unit);
        self.generate_bidirectional_collection_changes(
            &mut process,
            session.id(),
            event.persister.as_ref(),
            Some(event.state.as_slice()),
            None,
        );
        Ok(())
    }

    /// Handle an update.
    #[instrument(skip_all, fields(entity = event.persister.entity_name(), id = %event.id))]
    pub fn on_post_update(&self, session: &dyn Session, event: &PostUpdateEvent) -> Result<()> {
        check_transaction_in_progress(session)?;
        let entity_name = event.persister.entity_name();
        if !self.config().is_audited(entity_name) {
            return Ok(());
        }

        let mut process = self.manager.get(session.id());
        let new_db_state = event.db_state();
        let unit = AuditWorkUnit::modification(
            session.id(),
            self.config(),
            event.persister.as_ref(),
            event.id.clone(),
            &new_db_state,
            event.old_state.as_deref(),
        )?;
        let contains_work = unit.contains_work();
        process.add_work_unit(unit);

        if contains_work {
            self.generate_bidirectional_collection_changes(
                &mut process,
                session.id(),
                event.persister.as_ref(),
                Some(new_db_state.as_slice()),
                event.old_state.as_deref(),
            );
        } else {
            debug!("update without audited changes");
        }
        Ok(())
    }

    /// Handle a delete.
    #[instrument(skip_all, fields(entity = event.persister.entity_name(), id = %event.id))]
    pub fn on_post_delete(&self, session: &dyn Session, event: &PostDeleteEvent) -> Result<()> {
        check_transaction_in_progress(session)?;
        let entity_name = event.persister.entity_name();
        if !self.config().is_audited(entity_name) {
            return Ok(());
        }

        let unit = AuditWorkUnit::deletion(
            session.id(),
            self.config(),
            event.persister.as_ref(),
            event.id.clone(),
            &event.deleted_state,
        )?;
        let mut process = self.manager.get(session.id());
        process.add_work_unit(unit);
        self.generate_bidirectional_collection_changes(
            &mut process,
            session.id(),
            event.persister.as_ref(),
            None,
            Some(event.deleted_state.as_slice()),
        );
        Ok(())
    }

    /// Queue collection changes on the inverse side of every bidirectional to-one
    /// property whose referenced instance changed.
    fn generate_bidirectional_collection_changes(
        &self,
        process: &mut AuditProcess,
        session: SessionId,
        persister: &dyn EntityPersister,
        new_state: Option<&[Value]>,
        old_state: Option<&[Value]>,
    ) {
        let config = self.config();
        if !config.generate_revisions_for_collections {
            return;
        }

        let entity_name = persister.entity_name();
        for (index, property) in persister.property_names().iter().enumerate() {
            let Some(relation) = config.relation(entity_name, property) else {
                continue;
            };
            if !relation.is_bidirectional_to_one() {
                continue;
            }

            let new_id = new_state.and_then(|s| s.get(index)).and_then(referenced_id);
            let old_id = old_state.and_then(|s| s.get(index)).and_then(referenced_id);
            if new_id == old_id {
                continue;
            }

            for id in [new_id, old_id].into_iter().flatten() {
                process.add_work_unit(collection_change(session, relation, id));
            }
        }
    }
}

fn collection_change(session: SessionId, relation: &RelationDescription, id: EntityId) -> AuditWorkUnit {
    let collection = relation.mapped_by.clone().unwrap_or_default();
    AuditWorkUnit::collection_change(session, relation.to_entity.clone(), id, collection)
}

/// Identifier carried by a to-one property value.
fn referenced_id(value: &Value) -> Option<EntityId> {
    match value {
        Value::Entity(id) => Some(id.clone()),
        Value::Int64(id) => Some(EntityId::Int(*id)),
        Value::Int32(id) => Some(EntityId::Int(i64::from(*id))),
        Value::String(id) => Some(EntityId::String(id.clone())),
        Value::Uuid(id) => Some(EntityId::Uuid(*id)),
        _ => None,
    }
}

fn check_transaction_in_progress(session: &dyn Session) -> Result<()> {
    if session.is_transaction_in_progress() {
        Ok(())
    } else {
        Err(AuditError::TransactionNotInProgress { session: session.id() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditedEntity;
    use crate::session::{EntityPersisterDef, ManualSession};
    use crate::work_unit::WorkUnitKind;

    fn listener(config: AuditConfig) -> AuditEventListener {
        AuditEventListener::new(Arc::new(AuditProcessManager::new(Arc::new(config))))
    }

    fn order_config() -> AuditConfig {
        AuditConfig::new()
            .with_entity(
                "Order",
                AuditedEntity::new()
                    .with_relation("customer", RelationDescription::to_one("Customer").mapped_by("orders")),
            )
            .with_entity("Customer", AuditedEntity::new())
    }

    fn order_persister() -> Arc<dyn EntityPersister> {
        Arc::new(
            EntityPersisterDef::new("Order")
                .with_property("status")
                .with_property("customer"),
        )
    }

    fn active_session() -> ManualSession {
        let mut session = ManualSession::new(1);
        session.begin();
        session
    }

    fn customer(id: i64) -> Value {
        Value::Entity(EntityId::Int(id))
    }

    #[test]
    fn test_update_without_transaction_fails() {
        let session = ManualSession::new(1);
        let event = PostUpdateEvent::new(order_persister(), EntityId::Int(1), vec![Value::Null, Value::Null], None);

        let audited = listener(order_config());
        assert!(matches!(
            audited.on_post_update(&session, &event),
            Err(AuditError::TransactionNotInProgress { .. })
        ));

        let unaudited = listener(AuditConfig::new());
        assert!(matches!(
            unaudited.on_post_update(&session, &event),
            Err(AuditError::TransactionNotInProgress { .. })
        ));
    }

    #[test]
    fn test_unaudited_entity_is_ignored() {
        let listener = listener(AuditConfig::new());
        let event = PostInsertEvent::new(order_persister(), EntityId::Int(1), vec![Value::Null, Value::Null]);
        listener.on_post_insert(&active_session(), &event).unwrap();
        assert_eq!(listener.manager().process_count(), 0);
    }

    #[test]
    fn test_customer_change_touches_both_collections() {
        let listener = listener(order_config());
        let session = active_session();
        let event = PostUpdateEvent::new(
            order_persister(),
            EntityId::Int(1),
            vec![Value::from("NEW"), customer(20)],
            Some(vec![Value::from("NEW"), customer(10)]),
        );
        listener.on_post_update(&session, &event).unwrap();

        let process = listener.manager().get(session.id());
        assert_eq!(process.pending(), 3);
        for id in [20, 10] {
            let unit = process.unit("Customer", &EntityId::Int(id)).unwrap();
            assert_eq!(unit.kind(), WorkUnitKind::CollectionChange);
            assert!(unit.changed_collections().contains("orders"));
        }
    }

    #[test]
    fn test_no_collection_changes_when_disabled() {
        let listener = listener(order_config().with_generate_revisions_for_collections(false));
        let session = active_session();
        let event = PostInsertEvent::new(order_persister(), EntityId::Int(1), vec![Value::from("NEW"), customer(20)]);
        listener.on_post_insert(&session, &event).unwrap();
        assert_eq!(listener.manager().get(session.id()).pending(), 1);
    }

    #[test]
    fn test_unchanged_update_generates_nothing() {
        let listener = listener(order_config());
        let session = active_session();
        let state = vec![Value::from("NEW"), customer(20)];
        let event = PostUpdateEvent::new(order_persister(), EntityId::Int(1), state.clone(), Some(state));
        listener.on_post_update(&session, &event).unwrap();
        assert!(listener.manager().get(session.id()).is_empty());
    }

    #[test]
    fn test_change_to_non_updatable_properties_only_queues_nothing() {
        let listener = listener(order_config());
        let session = active_session();
        let persister: Arc<dyn EntityPersister> = Arc::new(
            EntityPersisterDef::new("Order")
                .with_property("status")
                .with_property_updatable("code", false)
                .with_property_updatable("customer", false),
        );
        let event = PostUpdateEvent::new(
            persister,
            EntityId::Int(1),
            vec![Value::from("NEW"), Value::from("B2"), customer(20)],
            Some(vec![Value::from("NEW"), Value::from("B"), customer(10)]),
        );

        let unit = AuditWorkUnit::modification(
            session.id(),
            listener.manager().config(),
            event.persister.as_ref(),
            event.id.clone(),
            &event.db_state(),
            event.old_state.as_deref(),
        )
        .unwrap();
        assert!(!unit.contains_work());

        listener.on_post_update(&session, &event).unwrap();
        let process = listener.manager().get(session.id());
        assert!(process.is_empty());
        assert!(process.unit("Customer", &EntityId::Int(10)).is_none());
        assert!(process.unit("Customer", &EntityId::Int(20)).is_none());
    }

    #[test]
    fn test_delete_touches_old_collection() {
        let listener = listener(order_config());
        let session = active_session();
        let event = PostDeleteEvent::new(order_persister(), EntityId::Int(1), vec![Value::from("NEW"), customer(10)]);
        listener.on_post_delete(&session, &event).unwrap();

        let process = listener.manager().get(session.id());
        assert_eq!(process.unit("Order", &EntityId::Int(1)).unwrap().kind(), WorkUnitKind::Del);
        assert!(process.unit("Customer", &EntityId::Int(10)).is_some());
    }

    #[test]
    fn test_non_insertable_relation_is_skipped() {
        let config = AuditConfig::new().with_entity(
            "Order",
            AuditedEntity::new().with_relation(
                "customer",
                RelationDescription::to_one("Customer")
                    .mapped_by("orders")
                    .with_insertable(false),
            ),
        );
        let listener = listener(config);
        let session = active_session();
        let event = PostInsertEvent::new(order_persister(), EntityId::Int(1), vec![Value::from("NEW"), customer(20)]);
        listener.on_post_insert(&session, &event).unwrap();
        assert_eq!(listener.manager().get(session.id()).pending(), 1);
    }
}
