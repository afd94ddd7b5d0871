//! Post-event payloads handed to the audit listeners.

use std::sync::Arc;

use ormbind_core::{EntityId, Value};

use crate::session::EntityPersister;

/// An entity was inserted.
#[derive(Clone)]
pub struct PostInsertEvent {
    /// Persister of the inserted entity.
    pub persister: Arc<dyn EntityPersister>,
    /// Identifier of the inserted instance.
    pub id: EntityId,
    /// Inserted state, in persister property order.
    pub state: Vec<Value>,
}

/// An entity was updated.
#[derive(Clone)]
pub struct PostUpdateEvent {
    /// Persister of the updated entity.
    pub persister: Arc<dyn EntityPersister>,
    /// Identifier of the updated instance.
    pub id: EntityId,
    /// In-memory state after the update.
    pub state: Vec<Value>,
    /// Database state before the update, when the engine loaded it.
    pub old_state: Option<Vec<Value>>,
}

/// An entity was deleted.
#[derive(Clone)]
pub struct PostDeleteEvent {
    /// Persister of the deleted entity.
    pub persister: Arc<dyn EntityPersister>,
    /// Identifier of the deleted instance.
    pub id: EntityId,
    /// State at deletion time.
    pub deleted_state: Vec<Value>,
}

impl PostInsertEvent {
    /// Create an insert event.
    pub fn new(persister: Arc<dyn EntityPersister>, id: impl Into<EntityId>, state: Vec<Value>) -> Self {
        Self {
            persister,
            id: id.into(),
            state,
        }
    }
}

impl PostUpdateEvent {
    /// Create an update event.
    pub fn new(
        persister: Arc<dyn EntityPersister>,
        id: impl Into<EntityId>,
        state: Vec<Value>,
        old_state: Option<Vec<Value>>,
    ) -> Self {
        Self {
            persister,
            id: id.into(),
            state,
            old_state,
        }
    }

    /// Post-update state with non-updatable properties reset to their database value.
    ///
    /// The in-memory value of a non-updatable property never reaches its column, so the
    /// old state is what the database holds. Without an old state the state is returned
    /// unchanged.
    pub fn db_state(&self) -> Vec<Value> {
        let mut state = self.state.clone();
        if let Some(old_state) = &self.old_state {
            let updateability = self.persister.property_updateability();
            for (index, updatable) in updateability.iter().enumerate() {
                if !updatable {
                    if let (Some(slot), Some(old)) = (state.get_mut(index), old_state.get(index)) {
                        *slot = old.clone();
                    }
                }
            }
        }
        state
    }
}

impl PostDeleteEvent {
    /// Create a delete event.
    pub fn new(persister: Arc<dyn EntityPersister>, id: impl Into<EntityId>, deleted_state: Vec<Value>) -> Self {
        Self {
            persister,
            id: id.into(),
            deleted_state,
        }
    }
}

macro_rules! impl_event_debug {
    ($($event:ident),*) => {
        $(
            impl std::fmt::Debug for $event {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_struct(stringify!($event))
                        .field("entity", &self.persister.entity_name())
                        .field("id", &self.id)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

impl_event_debug!(PostInsertEvent, PostUpdateEvent, PostDeleteEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EntityPersisterDef;

    #[test]
    fn test_db_state_restores_non_updatable() {
        let persister = Arc::new(
            EntityPersisterDef::new("Order")
                .with_property("a")
                .with_property_updatable("b", false)
                .with_property("c"),
        );
        let event = PostUpdateEvent::new(
            persister,
            EntityId::Int(1),
            vec![Value::from("A2"), Value::from("B2"), Value::from("C2")],
            Some(vec![Value::from("A"), Value::from("B"), Value::from("C")]),
        );

        assert_eq!(
            event.db_state(),
            vec![Value::from("A2"), Value::from("B"), Value::from("C2")]
        );
    }

    #[test]
    fn test_db_state_without_old_state() {
        let persister = Arc::new(EntityPersisterDef::new("Order").with_property_updatable("b", false));
        let event = PostUpdateEvent::new(persister, EntityId::Int(1), vec![Value::from("B2")], None);
        assert_eq!(event.db_state(), vec![Value::from("B2")]);
    }
}
