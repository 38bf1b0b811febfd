// builder.rs - Deferred item construction
//
// Configuration calls only record what should happen. `build` replays the
// record against the root item in a fixed order, injects sub-components into
// their private slots through the member accessor, and finalizes the item.

use crate::access::{AccessError, HostObject, MemberAccessor, TargetMut, Value};
use crate::entity::{
    find_tag, Attached, ConfigError, DisplayQuality, Effect, Entity, FinalizeError, Inventory,
    ModifierDescription, ModifierDescriptionCollection, Slot, SlotCollection, Stat,
    StatCollection, Tag, UsageUtilities,
};

/// Object name given to items built from scratch.
pub const DEFAULT_OBJECT_NAME: &str = "NewItem";

type Configure = Box<dyn FnOnce(&mut UsageUtilities)>;

enum StackPlan {
    Stackable { max: i32, initial: i32 },
    NonStackable,
}

enum TagOp {
    Add(Tag),
    Remove(Tag),
    Clear,
}

#[derive(Default)]
struct BuildPlan {
    type_id: Option<i32>,
    order: Option<i32>,
    display_name_raw: Option<String>,
    icon: Option<String>,
    value: Option<i32>,
    quality: Option<(i32, DisplayQuality)>,
    weight: Option<f32>,
    sound_key: Option<String>,
    inspected: Option<bool>,
    stack: Option<StackPlan>,
    durability: Option<(f32, f32)>,
    durability_loss: Option<f32>,
    tag_ops: Vec<TagOp>,
    stats: Option<Vec<Stat>>,
    slots: Option<Vec<Slot>>,
    modifiers: Option<Vec<ModifierDescription>>,
    inventory: Option<u32>,
    usage: Option<Vec<Configure>>,
    effects: Vec<Effect>,
    variables: Vec<(String, Value)>,
    constants: Vec<(String, Value)>,
}

/// Fluent construction of an `Entity`.
///
/// Every call consumes and returns the builder. Rejected configuration is
/// logged, collected in `issues` and otherwise ignored; only finalization
/// can fail the chain.
pub struct EntityBuilder {
    root: Entity,
    plan: BuildPlan,
    issues: Vec<ConfigError>,
    accessor: MemberAccessor,
}

impl Default for EntityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityBuilder {
    /// Start from a fresh item with no sub-components.
    pub fn new() -> Self {
        Self::from_root(Entity::new(DEFAULT_OBJECT_NAME))
    }

    /// Start from a deep copy of `template` under a new identity.
    pub fn from_template(template: &Entity) -> Self {
        Self::from_root(template.instantiate())
    }

    fn from_root(root: Entity) -> Self {
        Self {
            root,
            plan: BuildPlan::default(),
            issues: Vec::new(),
            accessor: MemberAccessor::new(),
        }
    }

    /// Use `accessor` for private member writes during `build`.
    pub fn with_accessor(mut self, accessor: MemberAccessor) -> Self {
        self.accessor = accessor;
        self
    }

    /// Configuration rejected so far.
    pub fn issues(&self) -> &[ConfigError] {
        &self.issues
    }

    fn reject(mut self, issue: ConfigError) -> Self {
        tracing::warn!(item = %self.root.name(), kind = %issue.kind(), "{issue}");
        self.issues.push(issue);
        self
    }

    pub fn with_type_id(mut self, type_id: i32) -> Self {
        self.plan.type_id = Some(type_id);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.plan.order = Some(order);
        self
    }

    pub fn with_display_name_raw(mut self, key: impl Into<String>) -> Self {
        self.plan.display_name_raw = Some(key.into());
        self
    }

    /// Display name key of the form `Item_<key>`.
    pub fn with_item_name_key(self, key: &str) -> Self {
        self.with_display_name_raw(format!("Item_{key}"))
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.plan.icon = Some(icon.into());
        self
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.plan.value = Some(value);
        self
    }

    pub fn with_quality(mut self, quality: i32, display: DisplayQuality) -> Self {
        self.plan.quality = Some((quality, display));
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.plan.weight = Some(weight);
        self
    }

    pub fn with_sound_key(mut self, sound_key: impl Into<String>) -> Self {
        self.plan.sound_key = Some(sound_key.into());
        self
    }

    pub fn as_inspected(mut self, inspected: bool) -> Self {
        self.plan.inspected = Some(inspected);
        self
    }

    pub fn as_stackable(mut self, max: i32, initial: i32) -> Self {
        if max <= 1 {
            return self.reject(ConfigError::Validation {
                operation: "as_stackable",
                reason: format!("max stack count {max} must be greater than 1"),
            });
        }
        if initial < 1 || initial > max {
            return self.reject(ConfigError::Validation {
                operation: "as_stackable",
                reason: format!("initial count {initial} outside 1..={max}"),
            });
        }
        self.plan.stack = Some(StackPlan::Stackable { max, initial });
        self
    }

    pub fn as_non_stackable(mut self) -> Self {
        self.plan.stack = Some(StackPlan::NonStackable);
        self
    }

    /// A missing or negative `current` means full durability.
    pub fn with_durability(mut self, max: f32, current: Option<f32>) -> Self {
        if !max.is_finite() || max < 0.0 {
            return self.reject(ConfigError::Validation {
                operation: "with_durability",
                reason: format!("max durability {max} must be finite and not negative"),
            });
        }
        let current = current.filter(|c| *c >= 0.0).unwrap_or(max);
        if current > max {
            return self.reject(ConfigError::Validation {
                operation: "with_durability",
                reason: format!("durability {current} outside 0..={max}"),
            });
        }
        self.plan.durability = Some((max, current));
        self
    }

    pub fn with_durability_loss(mut self, loss: f32) -> Self {
        self.plan.durability_loss = Some(loss);
        self
    }

    pub fn add_tag(mut self, tag: Tag) -> Self {
        self.plan.tag_ops.push(TagOp::Add(tag));
        self
    }

    pub fn add_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.plan.tag_ops.extend(tags.into_iter().map(TagOp::Add));
        self
    }

    pub fn add_tag_named(self, name: &str) -> Self {
        match self.resolve_tag(name) {
            Ok(tag) => self.add_tag(tag),
            Err(issue) => self.reject(issue),
        }
    }

    pub fn add_tags_named(self, names: &[&str]) -> Self {
        names.iter().fold(self, |builder, name| builder.add_tag_named(name))
    }

    pub fn remove_tag(mut self, tag: Tag) -> Self {
        self.plan.tag_ops.push(TagOp::Remove(tag));
        self
    }

    pub fn remove_tag_named(self, name: &str) -> Self {
        match self.resolve_tag(name) {
            Ok(tag) => self.remove_tag(tag),
            Err(issue) => self.reject(issue),
        }
    }

    pub fn clear_tags(mut self) -> Self {
        self.plan.tag_ops.push(TagOp::Clear);
        self
    }

    fn resolve_tag(&self, name: &str) -> Result<Tag, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyTagName);
        }
        find_tag(name).ok_or_else(|| ConfigError::UnknownTag {
            name: name.to_string(),
        })
    }

    pub fn with_stats(mut self) -> Self {
        self.plan.stats.get_or_insert_with(Vec::new);
        self
    }

    pub fn add_stat(mut self, stat: Stat) -> Self {
        self.plan.stats.get_or_insert_with(Vec::new).push(stat);
        self
    }

    pub fn with_slots(mut self) -> Self {
        self.plan.slots.get_or_insert_with(Vec::new);
        self
    }

    pub fn add_slot(mut self, slot: Slot) -> Self {
        self.plan.slots.get_or_insert_with(Vec::new).push(slot);
        self
    }

    pub fn with_modifiers(mut self) -> Self {
        self.plan.modifiers.get_or_insert_with(Vec::new);
        self
    }

    pub fn add_modifier(mut self, modifier: ModifierDescription) -> Self {
        self.plan.modifiers.get_or_insert_with(Vec::new).push(modifier);
        self
    }

    /// Attach an inventory; an existing inventory keeps its capacity.
    pub fn with_inventory(mut self, capacity: u32) -> Self {
        self.plan.inventory.get_or_insert(capacity);
        self
    }

    /// Attach usage utilities if absent, then run `configure` on them.
    pub fn with_usage_utilities(
        mut self,
        configure: impl FnOnce(&mut UsageUtilities) + 'static,
    ) -> Self {
        self.plan
            .usage
            .get_or_insert_with(Vec::new)
            .push(Box::new(configure));
        self
    }

    pub fn add_effect(mut self, effect: Effect) -> Self {
        self.plan.effects.push(effect);
        self
    }

    pub fn with_variable(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_primitive() {
            return self.reject(ConfigError::Validation {
                operation: "with_variable",
                reason: format!("'{key}' must be a bool, int, float or string, got {}", value.kind()),
            });
        }
        self.plan.variables.push((key.to_string(), value));
        self
    }

    pub fn with_constant(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_primitive() {
            return self.reject(ConfigError::Validation {
                operation: "with_constant",
                reason: format!("'{key}' must be a bool, int, float or string, got {}", value.kind()),
            });
        }
        self.plan.constants.push((key.to_string(), value));
        self
    }

    /// Materialize the configuration and finalize the item.
    pub fn build(self) -> Result<Entity, FinalizeError> {
        let EntityBuilder {
            mut root,
            plan,
            accessor,
            ..
        } = self;

        let failures = materialize(&mut root, plan, &accessor);
        if failures > 0 {
            tracing::warn!(item = %root.name(), failures, "item materialized with access failures");
        }

        root.initialize()?;
        tracing::debug!(item = %root.name(), type_id = root.type_id(), "item built");
        Ok(root)
    }

    /// `build` after renaming the root object.
    pub fn build_named(mut self, name: &str) -> Result<Entity, FinalizeError> {
        self.root.set_name(name);
        self.build()
    }
}

/// Replay `plan` onto `root`, returning how many member writes failed.
fn materialize(root: &mut Entity, plan: BuildPlan, accessor: &MemberAccessor) -> usize {
    let mut failures = 0;
    let mut check = |result: Result<bool, AccessError>| {
        if result.is_err() {
            failures += 1;
        }
    };

    if let Some(type_id) = plan.type_id {
        check(accessor.set_field(root, "typeID", type_id).into_result());
    }
    if let Some(order) = plan.order {
        root.set_order(order);
    }
    if let Some(key) = plan.display_name_raw {
        root.set_display_name_raw(key);
    }
    if let Some(icon) = plan.icon {
        root.set_icon(Some(icon));
    }
    if let Some(value) = plan.value {
        root.set_value(value);
    }
    if let Some((quality, display)) = plan.quality {
        root.set_quality(quality);
        root.set_display_quality(display);
    }
    if let Some(weight) = plan.weight {
        check(accessor.set_field(root, "weight", weight).into_result());
    }
    if let Some(sound_key) = plan.sound_key {
        root.set_sound_key(Some(sound_key));
    }

    match plan.stack {
        Some(StackPlan::Stackable { max, initial }) => {
            root.set_max_stack_count(max);
            root.set_stack_count(i64::from(initial));
        }
        Some(StackPlan::NonStackable) => {
            root.set_max_stack_count(1);
            root.set_stack_count(1);
        }
        None => {}
    }

    if let Some((max, current)) = plan.durability {
        root.set_max_durability(max);
        root.set_durability(current);
    }
    if let Some(loss) = plan.durability_loss {
        root.set_durability_loss(loss);
    }

    for op in plan.tag_ops {
        match op {
            TagOp::Add(tag) => {
                root.tags_mut().add(tag);
            }
            TagOp::Remove(tag) => {
                root.tags_mut().remove(&tag);
            }
            TagOp::Clear => root.tags_mut().clear(),
        }
    }

    if let Some(stats) = plan.stats {
        if root.stats().is_none() {
            check(attach(root, accessor, StatCollection::default()));
        }
        if let Some(collection) = root.stats_mut() {
            stats.into_iter().for_each(|stat| collection.add(stat));
        }
    }

    if let Some(slots) = plan.slots {
        if root.slots().is_none() {
            check(attach(root, accessor, SlotCollection::default()));
        }
        if let Some(collection) = root.slots_mut() {
            for slot in slots {
                if !collection.add(slot) {
                    tracing::debug!("duplicate slot key ignored");
                }
            }
        }
    }

    if let Some(modifiers) = plan.modifiers {
        if root.modifiers().is_none() {
            check(attach(root, accessor, ModifierDescriptionCollection::default()));
        }
        if let Some(collection) = root.modifiers_mut() {
            modifiers.into_iter().for_each(|m| collection.add(m));
        }
    }

    if let Some(capacity) = plan.inventory {
        if root.inventory().is_none() {
            check(attach(root, accessor, Inventory::with_capacity(capacity)));
        }
    }

    if let Some(configures) = plan.usage {
        match root.usage_utilities_mut() {
            Some(usage) => configures.into_iter().for_each(|configure| configure(usage)),
            None => {
                let mut usage = UsageUtilities::default();
                configures.into_iter().for_each(|configure| configure(&mut usage));
                check(attach(root, accessor, usage));
            }
        }
    }

    for effect in plan.effects {
        root.add_effect(effect);
    }

    for (key, value) in plan.variables {
        // Validated when recorded.
        let _ = root.variables_mut().set(&key, value);
    }
    for (key, value) in plan.constants {
        let _ = root.constants_mut().set(&key, value);
    }

    if let Some(inspected) = plan.inspected {
        root.set_inspected(inspected);
    }

    failures
}

/// Point `component` at `root` and inject it into its private slot.
fn attach<C>(root: &mut Entity, accessor: &MemberAccessor, mut component: C) -> Result<bool, AccessError>
where
    C: Attached + HostObject + TargetMut,
{
    accessor
        .set_field(&mut component, C::BACK_REFERENCE, root.instance_id())
        .into_result()?;
    accessor
        .set_field(root, C::SLOT, Value::object(component))
        .into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemberScope;
    use crate::entity::{register_tag, ModifierKind};
    use crate::ErrorKind;

    #[test]
    fn scalars_reach_private_fields() {
        let item = EntityBuilder::new()
            .with_type_id(1201)
            .with_weight(0.5)
            .with_value(400)
            .with_quality(9, DisplayQuality::None)
            .with_order(0)
            .with_item_name_key("crafting_table")
            .with_icon("ItemIcon/crafting_table.png")
            .with_sound_key("wood")
            .as_inspected(true)
            .build()
            .unwrap();

        assert_eq!(item.name(), DEFAULT_OBJECT_NAME);
        assert_eq!(item.type_id(), 1201);
        assert_eq!(item.unit_self_weight(), 0.5);
        assert_eq!(item.value(), 400);
        assert_eq!(item.quality(), 9);
        assert_eq!(item.display_name_raw(), "Item_crafting_table");
        assert_eq!(item.icon(), Some("ItemIcon/crafting_table.png"));
        assert_eq!(item.sound_key(), Some("wood"));
        assert!(item.inspected());
        assert!(item.is_initialized());
    }

    #[test]
    fn build_named_renames_root() {
        let item = EntityBuilder::new().build_named("crafting_table").unwrap();
        assert_eq!(item.name(), "crafting_table");
    }

    #[test]
    fn invalid_stack_settings_are_ignored() {
        let builder = EntityBuilder::new().as_stackable(1, 1).as_stackable(5, 0);
        assert_eq!(builder.issues().len(), 2);
        assert!(builder
            .issues()
            .iter()
            .all(|issue| issue.kind() == ErrorKind::Validation));

        let item = builder.build().unwrap();
        assert_eq!(item.max_stack_count(), 1);
        assert_eq!(item.stack_count(), 1);
    }

    #[test]
    fn rejected_stack_settings_keep_earlier_ones() {
        let builder = EntityBuilder::new()
            .as_stackable(5, 3)
            .as_stackable(1, 1)
            .as_stackable(5, 0);
        assert_eq!(builder.issues().len(), 2);
        let item = builder.build().unwrap();
        assert_eq!(item.max_stack_count(), 5);
        assert_eq!(item.stack_count(), 3);

        let template = EntityBuilder::new().as_stackable(8, 6).build().unwrap();
        let item = EntityBuilder::from_template(&template)
            .as_stackable(0, 1)
            .as_stackable(8, 9)
            .build()
            .unwrap();
        assert_eq!(item.max_stack_count(), 8);
        assert_eq!(item.stack_count(), 6);
    }

    #[test]
    fn non_stackable_resets_template_count() {
        let template = EntityBuilder::new().as_stackable(5, 3).build().unwrap();

        let item = EntityBuilder::from_template(&template)
            .as_non_stackable()
            .build()
            .unwrap();
        assert!(!item.stackable());
        assert_eq!(item.stack_count(), 1);
        assert_eq!(template.stack_count(), 3);
    }

    #[test]
    fn stackable_sets_max_and_count() {
        let item = EntityBuilder::new().as_stackable(5, 3).build().unwrap();
        assert!(item.stackable());
        assert_eq!(item.max_stack_count(), 5);
        assert_eq!(item.stack_count(), 3);

        let item = EntityBuilder::new()
            .as_stackable(5, 3)
            .as_non_stackable()
            .with_variable("Count", 1)
            .build()
            .unwrap();
        assert_eq!(item.max_stack_count(), 1);
    }

    #[test]
    fn durability_defaults_to_max() {
        let full = EntityBuilder::new().with_durability(100.0, None).build().unwrap();
        assert_eq!(full.durability(), 100.0);

        let negative = EntityBuilder::new()
            .with_durability(100.0, Some(-1.0))
            .build()
            .unwrap();
        assert_eq!(negative.durability(), 100.0);

        let partial = EntityBuilder::new()
            .with_durability(100.0, Some(30.0))
            .with_durability_loss(0.1)
            .build()
            .unwrap();
        assert_eq!(partial.durability(), 30.0);
        assert_eq!(partial.durability_loss(), 0.1);
    }

    #[test]
    fn invalid_durability_is_rejected_before_build() {
        let builder = EntityBuilder::new()
            .with_durability(50.0, Some(20.0))
            .with_durability(100.0, Some(150.0))
            .with_durability(-1.0, None)
            .with_durability(f32::NAN, None);
        assert_eq!(builder.issues().len(), 3);
        assert!(builder
            .issues()
            .iter()
            .all(|issue| issue.kind() == ErrorKind::Validation));

        let item = builder.build().unwrap();
        assert_eq!(item.max_durability(), 50.0);
        assert_eq!(item.durability(), 20.0);
    }

    #[test]
    fn tags_resolve_through_library() {
        let tool = register_tag("builder_test_Tool");
        register_tag("builder_test_Light");

        let builder = EntityBuilder::new()
            .add_tag_named("builder_test_Tool")
            .add_tag(tool.clone())
            .add_tags_named(&["builder_test_Light", "builder_test_Missing", ""])
            .remove_tag_named("builder_test_Light");

        let kinds: Vec<_> = builder.issues().to_vec();
        assert_eq!(
            kinds,
            vec![
                ConfigError::UnknownTag {
                    name: "builder_test_Missing".to_string()
                },
                ConfigError::EmptyTagName,
            ]
        );

        let item = builder.build().unwrap();
        assert_eq!(item.tags().names(), vec!["builder_test_Tool"]);

        let cleared = EntityBuilder::from_template(&item).clear_tags().build().unwrap();
        assert!(cleared.tags().is_empty());
    }

    #[test]
    fn sub_components_attach_once() {
        let item = EntityBuilder::new()
            .with_stats()
            .with_stats()
            .add_stat(Stat::new("Damage", 4.0))
            .add_stat(Stat::new("Range", 2.0))
            .with_slots()
            .add_slot(Slot::new("Scope"))
            .with_inventory(8)
            .with_inventory(16)
            .build()
            .unwrap();

        let stats = item.stats().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(item.slot_keys(), vec!["Scope".to_string()]);
        assert_eq!(item.inventory().map(Inventory::capacity), Some(8));

        let owner = Some(item.instance_id());
        assert_eq!(item.back_references().len(), 3);
        assert!(item.back_references().iter().all(|(_, r)| *r == owner));
    }

    #[test]
    fn effects_are_owned_by_the_built_item() {
        let template = EntityBuilder::new()
            .add_effect(Effect::new("Effect_Warmth"))
            .build()
            .unwrap();
        assert_eq!(template.effects()[0].back_reference(), Some(template.instance_id()));

        let item = EntityBuilder::from_template(&template)
            .add_effect(Effect::new("Effect_Light"))
            .build()
            .unwrap();
        let keys: Vec<_> = item.effects().iter().map(Effect::key).collect();
        assert_eq!(keys, vec!["Effect_Warmth", "Effect_Light"]);
        assert!(item
            .effects()
            .iter()
            .all(|e| e.back_reference() == Some(item.instance_id())));
    }

    #[test]
    fn template_components_are_reused() {
        let template = EntityBuilder::new()
            .add_stat(Stat::new("Damage", 4.0))
            .build()
            .unwrap();

        let item = EntityBuilder::from_template(&template)
            .with_stats()
            .add_stat(Stat::new("Range", 2.0))
            .build()
            .unwrap();

        assert_eq!(item.stats().map(StatCollection::len), Some(2));
        assert_eq!(template.stats().map(StatCollection::len), Some(1));
    }

    #[test]
    fn template_round_trip_is_deep_equal() {
        let template = EntityBuilder::new()
            .with_type_id(7)
            .with_durability(50.0, Some(20.0))
            .add_stat(Stat::new("Armor", 3.0))
            .add_modifier(ModifierDescription::new("Armor", ModifierKind::Add, 1.0))
            .with_usage_utilities(|usage| usage.has_sound = false)
            .with_constant("Ratio", 0.25)
            .build()
            .unwrap();

        let copy = EntityBuilder::from_template(&template).build().unwrap();
        assert_eq!(copy, template);
        assert_ne!(copy.instance_id(), template.instance_id());
        assert!(copy
            .back_references()
            .iter()
            .all(|(_, r)| *r == Some(copy.instance_id())));
    }

    #[test]
    fn usage_utilities_configure_existing_or_new() {
        let item = EntityBuilder::new()
            .with_usage_utilities(|usage| {
                let accessor = MemberAccessor::new();
                let _ = accessor.set_field(usage, "useTime", 0.2);
                usage.use_durability = false;
            })
            .with_usage_utilities(|usage| usage.behaviors.push("OpenCraftView".to_string()))
            .build()
            .unwrap();

        let usage = item.usage_utilities().unwrap();
        assert!((usage.use_time() - 0.2).abs() < f32::EPSILON);
        assert!(!usage.use_durability);
        assert_eq!(usage.behaviors, vec!["OpenCraftView".to_string()]);
    }

    #[test]
    fn key_values_overwrite_and_reject_structures() {
        let builder = EntityBuilder::new()
            .with_variable("Mode", "a")
            .with_variable("Mode", "b")
            .with_variable("Bad", Value::List(Vec::new()))
            .with_constant("Bad", Value::Null);
        assert_eq!(builder.issues().len(), 2);

        let item = builder.build().unwrap();
        assert_eq!(item.variables().get_str("Mode"), Some("b"));
        assert_eq!(item.variables().get("Bad"), None);
        assert!(item.constants().is_empty());
    }

    #[test]
    fn finalize_errors_end_the_chain() {
        let err = EntityBuilder::new()
            .add_modifier(ModifierDescription::new("Missing", ModifierKind::Add, 1.0))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Finalize);
    }

    #[test]
    fn narrow_scope_reports_private_writes() {
        let item = EntityBuilder::new()
            .with_accessor(MemberAccessor::with_scope(
                MemberScope::PUBLIC | MemberScope::INSTANCE,
            ))
            .with_type_id(9)
            .build()
            .unwrap();
        assert_eq!(item.type_id(), 0);
    }
}
