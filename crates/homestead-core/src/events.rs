//! Event bus - typed publish/subscribe between systems and UI.
//!
//! Delivery is synchronous: `emit` runs every handler registered for the
//! event's kind, in registration order, before it returns. The handler list
//! is captured when emission starts, so handlers added during a pass are not
//! called by it and handlers removed during a pass still finish it.
//!
//! Subscriptions are handles. Dropping a [`Subscription`] unregisters its
//! handler, so a panel that owns its subscriptions cannot leak listeners.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hecs::Entity;
use serde::Serialize;

use crate::components::{BuildingType, JobType, ResourceType};

/// Notifications published by the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    EntitySelected {
        #[serde(skip)]
        entity: Entity,
    },
    EntityDeselected {
        #[serde(skip)]
        entity: Entity,
    },
    /// Effective scale (0 while paused) before and after the change
    TimeScaleChanged { old: f32, new: f32 },
    ResourceProduced { resource: ResourceType, amount: u32 },
    ResourceConsumed { resource: ResourceType, amount: u32 },
    JobAssigned {
        #[serde(skip)]
        entity: Entity,
        job: JobType,
    },
    BuildingPlaced {
        #[serde(skip)]
        entity: Entity,
        kind: BuildingType,
    },
    ConstructionCompleted {
        #[serde(skip)]
        entity: Entity,
        kind: BuildingType,
    },
    CitizenDied {
        #[serde(skip)]
        entity: Entity,
        name: String,
    },
    PopulationCapacityChanged { old: u32, new: u32 },
}

/// Event name used for subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EntitySelected,
    EntityDeselected,
    TimeScaleChanged,
    ResourceProduced,
    ResourceConsumed,
    JobAssigned,
    BuildingPlaced,
    ConstructionCompleted,
    CitizenDied,
    PopulationCapacityChanged,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::EntitySelected { .. } => EventKind::EntitySelected,
            GameEvent::EntityDeselected { .. } => EventKind::EntityDeselected,
            GameEvent::TimeScaleChanged { .. } => EventKind::TimeScaleChanged,
            GameEvent::ResourceProduced { .. } => EventKind::ResourceProduced,
            GameEvent::ResourceConsumed { .. } => EventKind::ResourceConsumed,
            GameEvent::JobAssigned { .. } => EventKind::JobAssigned,
            GameEvent::BuildingPlaced { .. } => EventKind::BuildingPlaced,
            GameEvent::ConstructionCompleted { .. } => EventKind::ConstructionCompleted,
            GameEvent::CitizenDied { .. } => EventKind::CitizenDied,
            GameEvent::PopulationCapacityChanged { .. } => EventKind::PopulationCapacityChanged,
        }
    }
}

/// Handler callback. Receives the bus so it can emit follow-up events.
pub type Handler = dyn FnMut(&GameEvent, &EventBus);

struct Listener {
    id: u64,
    kind: EventKind,
    callback: Rc<RefCell<Handler>>,
}

#[derive(Default)]
struct Registry {
    listeners: Vec<Listener>,
    next_id: u64,
}

/// Synchronous, single-threaded event bus. Cloning yields another handle
/// to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent, &EventBus) + 'static,
    ) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Listener {
            id,
            kind,
            callback: Rc::new(RefCell::new(handler)),
        });
        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Unregister a handler. Equivalent to dropping the subscription.
    pub fn off(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Deliver an event to every handler registered for its kind
    pub fn emit(&self, event: GameEvent) {
        let kind = event.kind();
        let callbacks: Vec<Rc<RefCell<Handler>>> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Rc::clone(&l.callback))
            .collect();

        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut handler) => (*handler)(&event, self),
                // A handler whose own emission loops back to it
                Err(_) => tracing::warn!(?kind, "skipping re-entrant call into a running handler"),
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }
}

/// Registration handle; the handler stays registered while this lives
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // Dropping inside a handler is fine: `emit` holds no registry borrow
            // while handlers run.
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.listeners.retain(|l| l.id != self.id);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}
