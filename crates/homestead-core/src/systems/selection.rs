//! Selection intents on the `Selectable` flag

use hecs::Entity;

use crate::components::Selectable;
use crate::events::{EventBus, GameEvent};
use crate::world::World;

/// Mark an entity selected. Returns false if it is not selectable or was
/// already selected; no event is emitted in that case.
pub fn select(world: &mut World, events: &EventBus, entity: Entity) -> bool {
    let changed = match world.get_mut::<Selectable>(entity) {
        Some(mut s) if !s.selected => {
            s.selected = true;
            true
        }
        _ => false,
    };
    if changed {
        events.emit(GameEvent::EntitySelected { entity });
    }
    changed
}

/// Clear an entity's selection flag
pub fn deselect(world: &mut World, events: &EventBus, entity: Entity) -> bool {
    let changed = match world.get_mut::<Selectable>(entity) {
        Some(mut s) if s.selected => {
            s.selected = false;
            true
        }
        _ => false,
    };
    if changed {
        events.emit(GameEvent::EntityDeselected { entity });
    }
    changed
}

/// Flip the selection flag. Returns the new state, or None if the entity
/// is not selectable.
pub fn toggle_selection(world: &mut World, events: &EventBus, entity: Entity) -> Option<bool> {
    let selected = world.get::<Selectable>(entity)?.selected;
    if selected {
        deselect(world, events, entity);
    } else {
        select(world, events, entity);
    }
    Some(!selected)
}

/// Deselect everything currently selected
pub fn clear_selection(world: &mut World, events: &EventBus) {
    for entity in selected_entities(world) {
        deselect(world, events, entity);
    }
}

pub fn selected_entities(world: &World) -> Vec<Entity> {
    world
        .query::<&Selectable>()
        .into_iter()
        .filter(|e| world.get::<Selectable>(*e).map(|s| s.selected).unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_select_emits_once() {
        let mut world = World::new();
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _sub = bus.on(EventKind::EntitySelected, move |_, _| *c.borrow_mut() += 1);

        let entity = world.spawn((Selectable::default(),));
        assert!(select(&mut world, &bus, entity));
        assert!(!select(&mut world, &bus, entity));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(selected_entities(&world), vec![entity]);
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut world = World::new();
        let bus = EventBus::new();
        let a = world.spawn((Selectable::default(),));
        let b = world.spawn((Selectable::default(),));
        let plain = world.create();

        assert_eq!(toggle_selection(&mut world, &bus, a), Some(true));
        assert_eq!(toggle_selection(&mut world, &bus, b), Some(true));
        assert_eq!(toggle_selection(&mut world, &bus, a), Some(false));
        assert_eq!(toggle_selection(&mut world, &bus, plain), None);
        assert_eq!(selected_entities(&world), vec![b]);

        clear_selection(&mut world, &bus);
        assert!(selected_entities(&world).is_empty());
        assert!(!deselect(&mut world, &bus, b));
    }
}
