// item.rs - The item host object
//
// An item is a root object (name + instance identity) carrying scalar data,
// tags, two key-value stores and up to five optional sub-components. Several
// members have no public setter and are only reachable through the member
// access layer, the way a host engine keeps them private.

use crate::access::{HostType, HostValue, ObjectRef, Value, ValueKind, Visibility};
use crate::entity::{
    Attached, CustomDataStore, Effect, FinalizeError, Inventory, ModifierDescriptionCollection,
    SlotCollection, StatCollection, TagCollection, UsageUtilities,
};
use crate::host_object;
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// Variable key holding the current stack count.
pub const STACK_COUNT_KEY: &str = "Count";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayQuality {
    #[default]
    None,
    White,
    Green,
    Blue,
    Purple,
    Orange,
    Red,
}

impl fmt::Display for DisplayQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayQuality::None => "None",
            DisplayQuality::White => "White",
            DisplayQuality::Green => "Green",
            DisplayQuality::Blue => "Blue",
            DisplayQuality::Purple => "Purple",
            DisplayQuality::Orange => "Orange",
            DisplayQuality::Red => "Red",
        };
        f.write_str(name)
    }
}

impl FromStr for DisplayQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(DisplayQuality::None),
            "White" => Ok(DisplayQuality::White),
            "Green" => Ok(DisplayQuality::Green),
            "Blue" => Ok(DisplayQuality::Blue),
            "Purple" => Ok(DisplayQuality::Purple),
            "Orange" => Ok(DisplayQuality::Orange),
            "Red" => Ok(DisplayQuality::Red),
            other => Err(format!("unknown display quality '{other}'")),
        }
    }
}

impl HostValue for DisplayQuality {
    fn kind() -> ValueKind {
        ValueKind::Str
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => s.parse().map_err(|_| Value::Str(s)),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

/// Identity every host object carries.
#[derive(Clone, Debug)]
struct ObjectBase {
    name: String,
    instance: ObjectRef,
}

/// Objects compare by content; identity is excluded.
impl PartialEq for ObjectBase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

static OBJECT_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<ObjectBase>("Object")
        .property(
            "name",
            Visibility::Public,
            |o: &ObjectBase| o.name.clone(),
            |o, name| o.name = name,
        )
        .readonly_property("InstanceID", Visibility::Public, |o: &ObjectBase| o.instance)
        .build()
});

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    base: ObjectBase,
    type_id: i32,
    order: i32,
    display_name_raw: String,
    icon: Option<String>,
    value: i32,
    quality: i32,
    display_quality: DisplayQuality,
    weight: f32,
    sound_key: Option<String>,
    max_stack_count: i32,
    durability: f32,
    max_durability: f32,
    durability_loss: f32,
    inspected: bool,
    tags: TagCollection,
    variables: CustomDataStore,
    constants: CustomDataStore,
    stats: Option<StatCollection>,
    slots: Option<SlotCollection>,
    modifiers: Option<ModifierDescriptionCollection>,
    inventory: Option<Inventory>,
    usage_utilities: Option<UsageUtilities>,
    effects: Vec<Effect>,
    initialized: bool,
}

fn key_and<'a>(args: &'a [Value], method: &str) -> Result<(&'a str, &'a Value), String> {
    match args {
        [Value::Str(key), value] => Ok((key, value)),
        _ => Err(format!("{method} expects a key and a value")),
    }
}

static ITEM_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<Entity>("Item")
        .extends(&OBJECT_TYPE, |i: &Entity| &i.base, |i: &mut Entity| &mut i.base)
        .field("typeID", Visibility::Private, |i: &Entity| i.type_id, |i, v| i.type_id = v)
        .field("weight", Visibility::Private, |i: &Entity| i.weight, |i, v| i.weight = v)
        .field(
            "maxStackCount",
            Visibility::Private,
            |i: &Entity| i.max_stack_count,
            |i, v| i.max_stack_count = v,
        )
        .field("soundKey", Visibility::Public, |i: &Entity| i.sound_key.clone(), |i, v| {
            i.sound_key = v
        })
        .field("stats", Visibility::Private, |i: &Entity| i.stats.clone(), |i, v| i.stats = v)
        .field("slots", Visibility::Private, |i: &Entity| i.slots.clone(), |i, v| i.slots = v)
        .field(
            "modifiers",
            Visibility::Private,
            |i: &Entity| i.modifiers.clone(),
            |i, v| i.modifiers = v,
        )
        .field(
            "inventory",
            Visibility::Private,
            |i: &Entity| i.inventory.clone(),
            |i, v| i.inventory = v,
        )
        .field(
            "usageUtilities",
            Visibility::Private,
            |i: &Entity| i.usage_utilities.clone(),
            |i, v| i.usage_utilities = v,
        )
        .readonly_property("TypeID", Visibility::Public, |i: &Entity| i.type_id)
        .property("Order", Visibility::Public, |i: &Entity| i.order, |i, v| i.order = v)
        .property(
            "DisplayNameRaw",
            Visibility::Public,
            |i: &Entity| i.display_name_raw.clone(),
            |i, v| i.display_name_raw = v,
        )
        .readonly_property("DisplayName", Visibility::Public, |i: &Entity| {
            i.display_name().to_string()
        })
        .property("Icon", Visibility::Public, |i: &Entity| i.icon.clone(), |i, v| i.icon = v)
        .property("Value", Visibility::Public, |i: &Entity| i.value, |i, v| i.value = v)
        .property("Quality", Visibility::Public, |i: &Entity| i.quality, |i, v| i.quality = v)
        .property(
            "DisplayQuality",
            Visibility::Public,
            |i: &Entity| i.display_quality,
            |i, v| i.display_quality = v,
        )
        .readonly_property("UnitSelfWeight", Visibility::Public, |i: &Entity| i.weight)
        .property(
            "MaxStackCount",
            Visibility::Public,
            |i: &Entity| i.max_stack_count,
            |i, v| i.max_stack_count = v,
        )
        .readonly_property("Stackable", Visibility::Public, |i: &Entity| i.stackable())
        .property(
            "StackCount",
            Visibility::Public,
            |i: &Entity| i.stack_count(),
            |i, v| i.set_stack_count(v),
        )
        .property(
            "Durability",
            Visibility::Public,
            |i: &Entity| i.durability,
            |i, v| i.durability = v,
        )
        .property(
            "MaxDurability",
            Visibility::Public,
            |i: &Entity| i.max_durability,
            |i, v| i.max_durability = v,
        )
        .property(
            "DurabilityLoss",
            Visibility::Public,
            |i: &Entity| i.durability_loss,
            |i, v| i.durability_loss = v,
        )
        .readonly_property("UseDurability", Visibility::Public, |i: &Entity| i.use_durability())
        .property(
            "Inspected",
            Visibility::Public,
            |i: &Entity| i.inspected,
            |i, v| i.inspected = v,
        )
        .method(
            "SetInt",
            Visibility::Public,
            &[ValueKind::Str, ValueKind::Int],
            ValueKind::Any,
            |i: &mut Entity, args| {
                let (key, value) = key_and(&args, "SetInt")?;
                i.variables.set(key, value.clone()).map_err(|v| format!("rejected {v}"))?;
                Ok(Value::Null)
            },
        )
        .method(
            "SetFloat",
            Visibility::Public,
            &[ValueKind::Str, ValueKind::Float],
            ValueKind::Any,
            |i: &mut Entity, args| {
                let (key, value) = key_and(&args, "SetFloat")?;
                i.variables.set(key, value.clone()).map_err(|v| format!("rejected {v}"))?;
                Ok(Value::Null)
            },
        )
        .method(
            "SetBool",
            Visibility::Public,
            &[ValueKind::Str, ValueKind::Bool],
            ValueKind::Any,
            |i: &mut Entity, args| {
                let (key, value) = key_and(&args, "SetBool")?;
                i.variables.set(key, value.clone()).map_err(|v| format!("rejected {v}"))?;
                Ok(Value::Null)
            },
        )
        .method(
            "SetString",
            Visibility::Public,
            &[ValueKind::Str, ValueKind::Str],
            ValueKind::Any,
            |i: &mut Entity, args| {
                let (key, value) = key_and(&args, "SetString")?;
                i.variables.set(key, value.clone()).map_err(|v| format!("rejected {v}"))?;
                Ok(Value::Null)
            },
        )
        .method(
            "GetInt",
            Visibility::Public,
            &[ValueKind::Str],
            ValueKind::Int,
            |i: &mut Entity, args| match args.as_slice() {
                [Value::Str(key)] => Ok(i.variables.get_int(key).map_or(Value::Null, Value::Int)),
                _ => Err("GetInt expects a key".to_string()),
            },
        )
        .method(
            "HasTag",
            Visibility::Public,
            &[ValueKind::Str],
            ValueKind::Bool,
            |i: &mut Entity, args| match args.as_slice() {
                [Value::Str(name)] => Ok(Value::Bool(i.tags.contains_name(name))),
                _ => Err("HasTag expects a tag name".to_string()),
            },
        )
        .method(
            "Initialize",
            Visibility::Public,
            &[],
            ValueKind::Any,
            |i: &mut Entity, _| i.initialize().map(|()| Value::Null).map_err(|e| e.to_string()),
        )
        .build()
});

host_object!(Entity => ITEM_TYPE);

impl Entity {
    /// Fresh, uninitialized item with a new identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase {
                name: name.into(),
                instance: ObjectRef::next(),
            },
            type_id: 0,
            order: 0,
            display_name_raw: String::new(),
            icon: None,
            value: 0,
            quality: 0,
            display_quality: DisplayQuality::None,
            weight: 0.0,
            sound_key: None,
            max_stack_count: 1,
            durability: 0.0,
            max_durability: 0.0,
            durability_loss: 0.0,
            inspected: false,
            tags: TagCollection::default(),
            variables: CustomDataStore::default(),
            constants: CustomDataStore::default(),
            stats: None,
            slots: None,
            modifiers: None,
            inventory: None,
            usage_utilities: None,
            effects: Vec::new(),
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base.name = name.into();
    }

    pub fn instance_id(&self) -> ObjectRef {
        self.base.instance
    }

    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub fn display_name_raw(&self) -> &str {
        &self.display_name_raw
    }

    pub fn set_display_name_raw(&mut self, key: impl Into<String>) {
        self.display_name_raw = key.into();
    }

    /// Localized names are resolved by the host; the raw key is returned.
    pub fn display_name(&self) -> &str {
        &self.display_name_raw
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn sound_key(&self) -> Option<&str> {
        self.sound_key.as_deref()
    }

    pub fn set_sound_key(&mut self, sound_key: Option<String>) {
        self.sound_key = sound_key;
    }

    pub fn set_icon(&mut self, icon: Option<String>) {
        self.icon = icon;
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn set_quality(&mut self, quality: i32) {
        self.quality = quality;
    }

    pub fn display_quality(&self) -> DisplayQuality {
        self.display_quality
    }

    pub fn set_display_quality(&mut self, quality: DisplayQuality) {
        self.display_quality = quality;
    }

    pub fn unit_self_weight(&self) -> f32 {
        self.weight
    }

    pub fn total_weight(&self) -> f32 {
        self.weight * self.stack_count() as f32
    }

    pub fn max_stack_count(&self) -> i32 {
        self.max_stack_count
    }

    pub fn set_max_stack_count(&mut self, max: i32) {
        self.max_stack_count = max;
    }

    pub fn stackable(&self) -> bool {
        self.max_stack_count > 1
    }

    pub fn stack_count(&self) -> i64 {
        self.variables.get_int(STACK_COUNT_KEY).unwrap_or(1)
    }

    pub fn set_stack_count(&mut self, count: i64) {
        self.variables.set_int(STACK_COUNT_KEY, count);
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn set_durability(&mut self, durability: f32) {
        self.durability = durability;
    }

    pub fn max_durability(&self) -> f32 {
        self.max_durability
    }

    pub fn set_max_durability(&mut self, max: f32) {
        self.max_durability = max;
    }

    pub fn durability_loss(&self) -> f32 {
        self.durability_loss
    }

    pub fn set_durability_loss(&mut self, loss: f32) {
        self.durability_loss = loss;
    }

    pub fn use_durability(&self) -> bool {
        self.max_durability > 0.0
    }

    pub fn inspected(&self) -> bool {
        self.inspected
    }

    pub fn set_inspected(&mut self, inspected: bool) {
        self.inspected = inspected;
    }

    pub fn tags(&self) -> &TagCollection {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagCollection {
        &mut self.tags
    }

    pub fn variables(&self) -> &CustomDataStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut CustomDataStore {
        &mut self.variables
    }

    pub fn constants(&self) -> &CustomDataStore {
        &self.constants
    }

    pub fn constants_mut(&mut self) -> &mut CustomDataStore {
        &mut self.constants
    }

    pub fn stats(&self) -> Option<&StatCollection> {
        self.stats.as_ref()
    }

    pub fn stats_mut(&mut self) -> Option<&mut StatCollection> {
        self.stats.as_mut()
    }

    pub fn slots(&self) -> Option<&SlotCollection> {
        self.slots.as_ref()
    }

    pub fn slots_mut(&mut self) -> Option<&mut SlotCollection> {
        self.slots.as_mut()
    }

    pub fn modifiers(&self) -> Option<&ModifierDescriptionCollection> {
        self.modifiers.as_ref()
    }

    pub fn modifiers_mut(&mut self) -> Option<&mut ModifierDescriptionCollection> {
        self.modifiers.as_mut()
    }

    pub fn inventory(&self) -> Option<&Inventory> {
        self.inventory.as_ref()
    }

    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        self.inventory.as_mut()
    }

    pub fn usage_utilities(&self) -> Option<&UsageUtilities> {
        self.usage_utilities.as_ref()
    }

    pub fn usage_utilities_mut(&mut self) -> Option<&mut UsageUtilities> {
        self.usage_utilities.as_mut()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Take ownership of `effect`, pointing it at this item.
    pub fn add_effect(&mut self, mut effect: Effect) {
        effect.set_back_reference(Some(self.base.instance));
        self.effects.push(effect);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Wire unset back-references to this item and validate its state.
    ///
    /// The item is only usable by the host once this has succeeded.
    pub fn initialize(&mut self) -> Result<(), FinalizeError> {
        let owner = self.base.instance;
        wire(self.stats.as_mut(), owner)?;
        wire(self.slots.as_mut(), owner)?;
        wire(self.modifiers.as_mut(), owner)?;
        wire(self.inventory.as_mut(), owner)?;
        wire(self.usage_utilities.as_mut(), owner)?;
        for effect in &mut self.effects {
            wire(Some(effect), owner)?;
        }

        let count = self.stack_count();
        if count < 1 || count > i64::from(self.max_stack_count) {
            return Err(FinalizeError::StackCountOutOfRange {
                count,
                max: self.max_stack_count,
            });
        }

        if !(0.0..=self.max_durability.max(0.0)).contains(&self.durability) {
            return Err(FinalizeError::DurabilityOutOfRange {
                durability: self.durability,
                max: self.max_durability,
            });
        }

        if let Some(modifiers) = &self.modifiers {
            for modifier in modifiers.iter() {
                let known = self
                    .stats
                    .as_ref()
                    .is_some_and(|stats| stats.contains(modifier.key()));
                if !known {
                    return Err(FinalizeError::UnknownStat {
                        stat: modifier.key().to_string(),
                    });
                }
            }
        }

        self.initialized = true;
        tracing::debug!(item = %self.base.instance, name = %self.base.name, "item initialized");
        Ok(())
    }

    /// Deep copy under a new identity.
    ///
    /// Sub-components that pointed at this item point at the copy instead.
    pub fn instantiate(&self) -> Entity {
        let mut copy = self.clone();
        let from = self.base.instance;
        let to = ObjectRef::next();
        copy.base.instance = to;
        rewire(copy.stats.as_mut(), from, to);
        rewire(copy.slots.as_mut(), from, to);
        rewire(copy.modifiers.as_mut(), from, to);
        rewire(copy.inventory.as_mut(), from, to);
        rewire(copy.usage_utilities.as_mut(), from, to);
        for effect in &mut copy.effects {
            rewire(Some(effect), from, to);
        }
        copy
    }

    /// Back-references of every attached sub-component, keyed by slot.
    pub fn back_references(&self) -> Vec<(&'static str, Option<ObjectRef>)> {
        let mut refs = Vec::new();
        collect(&mut refs, self.stats.as_ref());
        collect(&mut refs, self.slots.as_ref());
        collect(&mut refs, self.modifiers.as_ref());
        collect(&mut refs, self.inventory.as_ref());
        collect(&mut refs, self.usage_utilities.as_ref());
        for effect in &self.effects {
            collect(&mut refs, Some(effect));
        }
        refs
    }
}

fn wire<C: Attached>(component: Option<&mut C>, owner: ObjectRef) -> Result<(), FinalizeError> {
    let Some(component) = component else {
        return Ok(());
    };
    match component.back_reference() {
        None => {
            component.set_back_reference(Some(owner));
            Ok(())
        }
        Some(found) if found != owner => Err(FinalizeError::ForeignBackReference {
            component: C::SLOT,
            expected: owner,
            found,
        }),
        Some(_) => Ok(()),
    }
}

fn rewire<C: Attached>(component: Option<&mut C>, from: ObjectRef, to: ObjectRef) {
    if let Some(component) = component {
        if component.back_reference() == Some(from) {
            component.set_back_reference(Some(to));
        }
    }
}

fn collect<C: Attached>(refs: &mut Vec<(&'static str, Option<ObjectRef>)>, component: Option<&C>) {
    if let Some(component) = component {
        refs.push((C::SLOT, component.back_reference()));
    }
}
