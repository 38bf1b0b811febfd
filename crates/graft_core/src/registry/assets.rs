use crate::entity::Entity;
use std::collections::BTreeSet;

/// The host's item catalogue: type ids shipped with the host plus items
/// registered at run time.
#[derive(Clone, Debug, Default)]
pub struct ItemAssetsCollection {
    builtin: BTreeSet<i32>,
    dynamic: Vec<Entity>,
}

impl ItemAssetsCollection {
    pub fn with_builtin(type_ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            builtin: type_ids.into_iter().collect(),
            dynamic: Vec::new(),
        }
    }

    /// First type id not used by any builtin or dynamic item.
    pub fn next_type_id(&self) -> i32 {
        let builtin = self.builtin.iter().next_back().copied().unwrap_or(0);
        let dynamic = self.dynamic.iter().map(Entity::type_id).max().unwrap_or(0);
        builtin.max(dynamic) + 1
    }

    pub fn contains(&self, type_id: i32) -> bool {
        self.builtin.contains(&type_id) || self.dynamic.iter().any(|i| i.type_id() == type_id)
    }

    /// Register a run-time item. Rejected when its type id is taken.
    pub fn add_dynamic_entry(&mut self, item: Entity) -> bool {
        if self.contains(item.type_id()) {
            tracing::warn!(type_id = item.type_id(), item = %item.name(), "type id already registered");
            return false;
        }
        tracing::debug!(type_id = item.type_id(), item = %item.name(), "dynamic item registered");
        self.dynamic.push(item);
        true
    }

    pub fn remove_dynamic_entry(&mut self, type_id: i32) -> Option<Entity> {
        let index = self.dynamic.iter().position(|i| i.type_id() == type_id)?;
        Some(self.dynamic.remove(index))
    }

    pub fn get(&self, type_id: i32) -> Option<&Entity> {
        self.dynamic.iter().find(|i| i.type_id() == type_id)
    }

    /// Fresh instance of a registered dynamic item.
    pub fn instantiate(&self, type_id: i32) -> Option<Entity> {
        self.get(type_id).map(Entity::instantiate)
    }

    pub fn dynamic_len(&self) -> usize {
        self.dynamic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityBuilder;

    fn item(type_id: i32) -> Entity {
        EntityBuilder::new().with_type_id(type_id).build().unwrap()
    }

    #[test]
    fn next_type_id_skips_everything_known() {
        let mut assets = ItemAssetsCollection::with_builtin([1, 361, 1200]);
        assert_eq!(assets.next_type_id(), 1201);

        assert!(assets.add_dynamic_entry(item(1201)));
        assert_eq!(assets.next_type_id(), 1202);
    }

    #[test]
    fn taken_type_ids_are_rejected() {
        let mut assets = ItemAssetsCollection::with_builtin([361]);
        assert!(!assets.add_dynamic_entry(item(361)));
        assert!(assets.add_dynamic_entry(item(400)));
        assert!(!assets.add_dynamic_entry(item(400)));
        assert_eq!(assets.dynamic_len(), 1);
    }

    #[test]
    fn removal_returns_the_item() {
        let mut assets = ItemAssetsCollection::default();
        assets.add_dynamic_entry(item(5));

        let spawned = assets.instantiate(5).unwrap();
        assert_ne!(Some(spawned.instance_id()), assets.get(5).map(Entity::instance_id));

        assert_eq!(assets.remove_dynamic_entry(5).map(|i| i.type_id()), Some(5));
        assert!(assets.remove_dynamic_entry(5).is_none());
        assert_eq!(assets.next_type_id(), 1);
    }
}
