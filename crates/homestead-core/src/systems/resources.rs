//! Resource store - the settlement-wide ledger of extracted resources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::ResourceType;
use crate::error::SpendError;
use crate::events::{EventBus, GameEvent};

/// Settlement resource ledger (singleton, stored in the engine)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceStore {
    amounts: BTreeMap<ResourceType, u32>,
    /// Per-resource cap. A resource without an entry is unbounded.
    capacity: BTreeMap<ResourceType, u32>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given amounts and no capacity limits
    pub fn with_amounts(amounts: impl IntoIterator<Item = (ResourceType, u32)>) -> Self {
        Self {
            amounts: amounts.into_iter().collect(),
            capacity: BTreeMap::new(),
        }
    }

    pub fn get(&self, resource: ResourceType) -> u32 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    pub fn capacity(&self, resource: ResourceType) -> Option<u32> {
        self.capacity.get(&resource).copied()
    }

    /// Set the cap for one resource. Existing stock above the cap is kept;
    /// only new production is limited.
    pub fn set_capacity(&mut self, resource: ResourceType, capacity: u32) {
        self.capacity.insert(resource, capacity);
    }

    /// Units of each resource missing to pay `cost`
    pub fn shortfall(&self, cost: &[(ResourceType, u32)]) -> Vec<(ResourceType, u32)> {
        cost_totals(cost)
            .into_iter()
            .filter_map(|(resource, needed)| {
                let have = u64::from(self.get(resource));
                (have < needed)
                    .then(|| (resource, u32::try_from(needed - have).unwrap_or(u32::MAX)))
            })
            .collect()
    }

    /// Pure predicate: every positive cost is covered by current stock
    pub fn can_afford(&self, cost: &[(ResourceType, u32)]) -> bool {
        self.shortfall(cost).is_empty()
    }

    /// Pay `cost`. Re-checks affordability against the current stock and
    /// changes nothing unless the whole cost can be paid.
    pub fn deduct(&mut self, cost: &[(ResourceType, u32)]) -> Result<(), SpendError> {
        let missing = self.shortfall(cost);
        if !missing.is_empty() {
            return Err(SpendError::Shortfall { missing });
        }
        for (resource, total) in cost_totals(cost) {
            if let Some(stock) = self.amounts.get_mut(&resource) {
                // Covered by the shortfall check, so the total fits below the stock
                *stock -= u32::try_from(total).unwrap_or(*stock);
            }
        }
        Ok(())
    }

    /// Add to the store, discarding anything above capacity. Returns the
    /// amount actually stored.
    pub fn produce(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let stock = self.amounts.entry(resource).or_insert(0);
        let space = match self.capacity.get(&resource) {
            Some(cap) => cap.saturating_sub(*stock),
            None => u32::MAX - *stock,
        };
        let added = amount.min(space);
        *stock += added;
        added
    }

    /// Take up to `amount`, returning what was removed
    pub fn consume(&mut self, resource: ResourceType, amount: u32) -> u32 {
        match self.amounts.get_mut(&resource) {
            Some(stock) => {
                let removed = amount.min(*stock);
                *stock -= removed;
                removed
            }
            None => 0,
        }
    }

    /// `produce` plus a `ResourceProduced` notification for the stored amount
    pub fn produce_and_notify(
        &mut self,
        resource: ResourceType,
        amount: u32,
        events: &EventBus,
    ) -> u32 {
        let added = self.produce(resource, amount);
        if added < amount {
            tracing::debug!(?resource, discarded = amount - added, "storage full");
        }
        if added > 0 {
            events.emit(GameEvent::ResourceProduced {
                resource,
                amount: added,
            });
        }
        added
    }

    /// `consume` plus a `ResourceConsumed` notification for the removed amount
    pub fn consume_and_notify(
        &mut self,
        resource: ResourceType,
        amount: u32,
        events: &EventBus,
    ) -> u32 {
        let removed = self.consume(resource, amount);
        if removed > 0 {
            events.emit(GameEvent::ResourceConsumed {
                resource,
                amount: removed,
            });
        }
        removed
    }

    /// Snapshot of all non-zero amounts, in resource order
    pub fn amounts(&self) -> impl Iterator<Item = (ResourceType, u32)> + '_ {
        self.amounts
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|(k, v)| (*k, *v))
    }
}

/// Cost per resource with repeated entries summed. Widened so that no
/// combination of entries can overflow.
fn cost_totals(cost: &[(ResourceType, u32)]) -> BTreeMap<ResourceType, u64> {
    let mut totals: BTreeMap<ResourceType, u64> = BTreeMap::new();
    for (resource, amount) in cost {
        let total = totals.entry(*resource).or_default();
        *total = total.saturating_add(u64::from(*amount));
    }
    totals
}
