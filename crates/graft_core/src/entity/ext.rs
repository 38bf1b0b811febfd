// ext.rs - Convenience operations on finished items

use crate::access::ObjectRef;
use crate::entity::Entity;
use std::fmt::Write;

impl Entity {
    /// Restore full durability and clear accumulated loss.
    pub fn fully_repair(&mut self) -> &mut Self {
        if self.use_durability() {
            self.set_durability(self.max_durability());
            self.set_durability_loss(0.0);
        }
        self
    }

    /// Repair by a fraction of max durability, clamped to `[0, 1]`.
    pub fn repair(&mut self, fraction: f32) -> &mut Self {
        if self.use_durability() {
            let amount = self.max_durability() * fraction.clamp(0.0, 1.0);
            let repaired = (self.durability() + amount).min(self.max_durability());
            self.set_durability(repaired);
        }
        self
    }

    pub fn damage(&mut self, amount: f32) -> &mut Self {
        if self.use_durability() {
            self.set_durability((self.durability() - amount).max(0.0));
        }
        self
    }

    /// Copy every variable onto `target`, overwriting by key.
    pub fn copy_variables_to(&self, target: &mut Entity) {
        for (key, value) in self.variables().iter() {
            // Values in the store are primitive, so the write cannot fail.
            let _ = target.variables_mut().set(key, value.clone());
        }
    }

    pub fn copy_constants_to(&self, target: &mut Entity) {
        for (key, value) in self.constants().iter() {
            let _ = target.constants_mut().set(key, value.clone());
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags().contains_name(name)
    }

    pub fn has_any_tag(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_tag(name))
    }

    pub fn has_all_tags(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_tag(name))
    }

    /// Value of a stat, or `default` when the item has no such stat.
    pub fn stat_value_or(&self, key: &str, default: f32) -> f32 {
        self.stats()
            .and_then(|stats| stats.get(key))
            .map_or(default, |stat| stat.value())
    }

    pub fn slot_keys(&self) -> Vec<String> {
        self.slots()
            .map(|slots| slots.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Unplug whatever sits in each slot.
    pub fn clear_all_slots(&mut self) -> &mut Self {
        if let Some(slots) = self.slots_mut() {
            for slot in slots.iter_mut() {
                slot.unplug();
            }
        }
        self
    }

    /// Content of the slot under `key`; `None` when the item has no such
    /// slot or the slot is empty.
    pub fn slot_content(&self, key: &str) -> Option<ObjectRef> {
        self.slots()?.get(key)?.content()
    }

    /// Multi-line summary for diagnostics.
    pub fn debug_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Item: {} ({}) ===", self.display_name(), self.name());
        let _ = writeln!(out, "TypeID: {}", self.type_id());
        let _ = writeln!(out, "Value: {}", self.value());
        let _ = writeln!(out, "Quality: {} ({})", self.quality(), self.display_quality());
        let _ = writeln!(
            out,
            "Weight: {} (Total: {})",
            self.unit_self_weight(),
            self.total_weight()
        );
        let _ = writeln!(
            out,
            "Stackable: {} (Max: {}, Current: {})",
            self.stackable(),
            self.max_stack_count(),
            self.stack_count()
        );
        if self.use_durability() {
            let _ = writeln!(
                out,
                "Durability: {}/{} (Loss: {:.0}%)",
                self.durability(),
                self.max_durability(),
                self.durability_loss() * 100.0
            );
        }
        let _ = writeln!(out, "Tags: {}", self.tags().names().join(", "));
        let _ = writeln!(out, "Inspected: {}", self.inspected());
        if let Some(stats) = self.stats().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "Stats Count: {}", stats.len());
        }
        if let Some(slots) = self.slots().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "Slots Count: {}", slots.len());
        }
        if let Some(inventory) = self.inventory() {
            let _ = writeln!(out, "Has Inventory: Yes (Capacity: {})", inventory.capacity());
        }
        out
    }
}
