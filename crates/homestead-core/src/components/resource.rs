//! Resource-related components: ResourceType, ResourceNode, Inventory.

use serde::{Deserialize, Serialize};

/// Extractable resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Wood,
    Stone,
    Food,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [ResourceType::Wood, ResourceType::Stone, ResourceType::Food];

    /// Icon identifier used by inventory slots and UI panels
    pub fn icon(&self) -> &'static str {
        match self {
            ResourceType::Wood => "icon_wood",
            ResourceType::Stone => "icon_stone",
            ResourceType::Food => "icon_food",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Wood => "Wood",
            ResourceType::Stone => "Stone",
            ResourceType::Food => "Food",
        }
    }
}

/// A harvestable deposit in the world (tree, rock, berry bush)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceNode {
    pub resource: ResourceType,
    pub amount: u32,
    pub max_amount: u32,
    pub regenerates: bool,
    /// Seconds accumulated toward the next regenerated unit
    #[serde(default)]
    pub regen_progress: f32,
}

impl ResourceNode {
    pub fn new(resource: ResourceType, max_amount: u32, regenerates: bool) -> Self {
        Self {
            resource,
            amount: max_amount,
            max_amount,
            regenerates,
            regen_progress: 0.0,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.amount == 0
    }

    /// Remove up to `amount` units, returning how many were taken
    pub fn harvest(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.amount);
        self.amount -= taken;
        taken
    }

    /// Advance regeneration, returning true if a unit was restored
    pub fn regenerate(&mut self, delta_seconds: f32, interval: f32) -> bool {
        if !self.regenerates || self.amount >= self.max_amount || interval <= 0.0 {
            self.regen_progress = 0.0;
            return false;
        }
        self.regen_progress += delta_seconds;
        let mut restored = false;
        while self.regen_progress >= interval && self.amount < self.max_amount {
            self.regen_progress -= interval;
            self.amount += 1;
            restored = true;
        }
        restored
    }
}

/// One display slot in an inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub resource: ResourceType,
    pub icon: String,
    pub count: u32,
}

/// Ordered item slots. Order is insertion order and only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, resource: ResourceType) -> u32 {
        self.slots
            .iter()
            .find(|s| s.resource == resource)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Add to an existing slot, or append a new one at the end
    pub fn add(&mut self, resource: ResourceType, count: u32) {
        if count == 0 {
            return;
        }
        match self.slots.iter_mut().find(|s| s.resource == resource) {
            Some(slot) => slot.count += count,
            None => self.slots.push(InventorySlot {
                resource,
                icon: resource.icon().to_string(),
                count,
            }),
        }
    }

    /// Remove up to `count`, dropping the slot when it empties. Returns amount removed.
    pub fn remove(&mut self, resource: ResourceType, count: u32) -> u32 {
        let Some(idx) = self.slots.iter().position(|s| s.resource == resource) else {
            return 0;
        };
        let removed = count.min(self.slots[idx].count);
        self.slots[idx].count -= removed;
        if self.slots[idx].count == 0 {
            self.slots.remove(idx);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
