// patcher.rs - Tracked, reversible registry mutation
//
// A patcher inserts keyed entries into a host registry's private backing
// list and remembers which keys it inserted. Undo removes exactly those
// entries. Every change to the list clears the registry's derived cache, and
// the cache is cleared once up front so an unreachable cache fails the call
// before the list is touched.

use crate::access::{HostObject, MemberAccessor, Target, TargetMut, Value};
use crate::registry::{Cost, FormulaOptions, PatchError, ResultEntry};
use std::collections::BTreeSet;

/// Member names describing where a registry keeps its entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryLayout {
    /// Private list holding the entries.
    pub backing_field: &'static str,
    /// Derived read cache, cleared after every change.
    pub cache_field: &'static str,
    /// Member of each entry holding its unique key.
    pub key_member: &'static str,
}

impl RegistryLayout {
    /// Layout of the host's crafting formula collection.
    pub const CRAFTING_FORMULAS: RegistryLayout = RegistryLayout {
        backing_field: "list",
        cache_field: "_entries_ReadOnly",
        key_member: "id",
    };
}

/// Keys inserted by one patcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchTracker {
    keys: BTreeSet<String>,
}

impl PatchTracker {
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub struct RegistryPatcher {
    accessor: MemberAccessor,
    layout: RegistryLayout,
    tracker: PatchTracker,
}

impl RegistryPatcher {
    pub fn new(layout: RegistryLayout) -> Self {
        Self::with_accessor(MemberAccessor::new(), layout)
    }

    pub fn with_accessor(accessor: MemberAccessor, layout: RegistryLayout) -> Self {
        Self {
            accessor,
            layout,
            tracker: PatchTracker::default(),
        }
    }

    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    pub fn tracker(&self) -> &PatchTracker {
        &self.tracker
    }

    /// Append `entry` under `key`, stamping the key onto the entry.
    ///
    /// Fails with `DuplicateKey` when any entry already carries `key`. On any
    /// error the registry and the tracker are left untouched.
    pub fn add_entry<R, E>(&mut self, registry: &mut R, key: &str, mut entry: E) -> Result<(), PatchError>
    where
        R: Target + TargetMut + ?Sized,
        E: HostObject + TargetMut,
    {
        let mut entries = self.read_entries(registry)?;
        if entries.iter().any(|e| self.key_of(e).as_deref() == Some(key)) {
            let err = PatchError::DuplicateKey {
                key: key.to_string(),
            };
            tracing::warn!(key, "{err}");
            return Err(err);
        }
        self.invalidate(registry)?;

        self.accessor
            .set_field(&mut entry, self.layout.key_member, key)
            .into_result()?;
        entries.push(Value::object(entry));
        self.accessor
            .set_field(registry, self.layout.backing_field, Value::List(entries))
            .into_result()?;

        self.tracker.keys.insert(key.to_string());
        self.invalidate(registry)?;
        tracing::debug!(key, tracked = self.tracker.len(), "registry entry added");
        Ok(())
    }

    /// Remove every entry this patcher added, keeping the order of the rest.
    ///
    /// Entries whose key cannot be read are kept. Returns how many entries
    /// were removed. On error neither the registry nor the tracker changes.
    pub fn remove_all_added_entries<R>(&mut self, registry: &mut R) -> Result<usize, PatchError>
    where
        R: Target + TargetMut + ?Sized,
    {
        let entries = self.read_entries(registry)?;
        self.invalidate(registry)?;
        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|e| {
                self.key_of(e)
                    .map_or(true, |key| !self.tracker.contains(&key))
            })
            .collect();
        let removed = before - kept.len();

        self.accessor
            .set_field(registry, self.layout.backing_field, Value::List(kept))
            .into_result()?;
        self.tracker.keys.clear();
        self.invalidate(registry)?;
        tracing::info!(removed, "registry entries removed");
        Ok(removed)
    }

    /// Add a crafting formula with the host's usual defaults.
    pub fn add_crafting_formula<R>(
        &mut self,
        registry: &mut R,
        id: &str,
        cost: Cost,
        result: ResultEntry,
        options: FormulaOptions,
    ) -> Result<(), PatchError>
    where
        R: Target + TargetMut + ?Sized,
    {
        let formula = options.into_formula(id, cost, result);
        self.add_entry(registry, id, formula)
    }

    fn read_entries<R: Target + ?Sized>(&self, registry: &R) -> Result<Vec<Value>, PatchError> {
        self.accessor
            .get_field::<Vec<Value>, _>(registry, self.layout.backing_field)
            .into_result()
            .map_err(PatchError::from)
    }

    fn key_of(&self, entry: &Value) -> Option<String> {
        let object = entry.as_object()?;
        self.accessor
            .get_field::<Option<String>, _>(object, self.layout.key_member)
            .into_result()
            .ok()
            .flatten()
    }

    fn invalidate<R: TargetMut + ?Sized>(&self, registry: &mut R) -> Result<(), PatchError> {
        self.accessor
            .set_field(registry, self.layout.cache_field, Value::Null)
            .into_result()?;
        Ok(())
    }
}
