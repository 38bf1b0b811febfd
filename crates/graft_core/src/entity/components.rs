// components.rs - Sub-components an item can carry
//
// Each sub-component is owned by exactly one item and names that item through
// a back-reference. Back-references are identities, not ownership, and never
// take part in structural equality: two items built the same way compare
// equal even though their components point at different roots.

use crate::access::{HostType, ObjectRef, Value, ValueKind, Visibility};
use crate::host_object;
use once_cell::sync::Lazy;
use std::fmt;

/// Identity of the item a sub-component belongs to.
#[derive(Clone, Copy, Debug, Default, Eq)]
pub struct BackRef(Option<ObjectRef>);

impl BackRef {
    pub fn get(&self) -> Option<ObjectRef> {
        self.0
    }

    pub fn set(&mut self, owner: Option<ObjectRef>) {
        self.0 = owner;
    }

    pub fn points_at(&self, owner: ObjectRef) -> bool {
        self.0 == Some(owner)
    }
}

impl PartialEq for BackRef {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// A sub-component slot on an item.
///
/// `SLOT` is the item's private field holding the component and
/// `BACK_REFERENCE` the component's private field naming its item.
pub trait Attached {
    const SLOT: &'static str;
    const BACK_REFERENCE: &'static str;

    fn back_reference(&self) -> Option<ObjectRef>;
    fn set_back_reference(&mut self, owner: Option<ObjectRef>);
}

/// State shared by every component hanging off an item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemComponent {
    master: BackRef,
}

pub(crate) static ITEM_COMPONENT_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<ItemComponent>("ItemComponent")
        .field(
            "master",
            Visibility::Private,
            |c: &ItemComponent| c.master.get(),
            |c, owner| c.master.set(owner),
        )
        .build()
});

macro_rules! item_component {
    ($ty:ty, $slot:literal) => {
        impl Attached for $ty {
            const SLOT: &'static str = $slot;
            const BACK_REFERENCE: &'static str = "master";

            fn back_reference(&self) -> Option<ObjectRef> {
                self.component.master.get()
            }

            fn set_back_reference(&mut self, owner: Option<ObjectRef>) {
                self.component.master.set(owner);
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Stat {
    key: String,
    base_value: f32,
}

impl Stat {
    pub fn new(key: impl Into<String>, base_value: f32) -> Self {
        Self {
            key: key.into(),
            base_value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> f32 {
        self.base_value
    }

    pub fn set_base_value(&mut self, value: f32) {
        self.base_value = value;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatCollection {
    component: ItemComponent,
    stats: Vec<Stat>,
}

impl StatCollection {
    /// Add a stat, replacing any stat with the same key.
    pub fn add(&mut self, stat: Stat) {
        match self.stats.iter_mut().find(|s| s.key == stat.key) {
            Some(existing) => *existing = stat,
            None => self.stats.push(stat),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Stat> {
        self.stats.iter().find(|s| s.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

item_component!(StatCollection, "stats");

static STAT_COLLECTION_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<StatCollection>("StatCollection")
        .extends(
            &ITEM_COMPONENT_TYPE,
            |s: &StatCollection| &s.component,
            |s: &mut StatCollection| &mut s.component,
        )
        .readonly_property("Count", Visibility::Public, |s: &StatCollection| s.len() as i64)
        .method(
            "GetStatValue",
            Visibility::Public,
            &[ValueKind::Str],
            ValueKind::Float,
            |s: &mut StatCollection, args| match args.as_slice() {
                [Value::Str(key)] => s
                    .get(key)
                    .map(|stat| Value::Float(f64::from(stat.value())))
                    .ok_or_else(|| format!("no stat '{key}'")),
                _ => Err("expected a stat key".to_string()),
            },
        )
        .build()
});

host_object!(StatCollection => STAT_COLLECTION_TYPE);

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    key: String,
    required_tags: Vec<String>,
    content: Option<ObjectRef>,
}

impl Slot {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            required_tags: Vec::new(),
            content: None,
        }
    }

    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.push(tag.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn required_tags(&self) -> &[String] {
        &self.required_tags
    }

    pub fn content(&self) -> Option<ObjectRef> {
        self.content
    }

    pub fn plug(&mut self, item: ObjectRef) -> Option<ObjectRef> {
        self.content.replace(item)
    }

    pub fn unplug(&mut self) -> Option<ObjectRef> {
        self.content.take()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotCollection {
    component: ItemComponent,
    slots: Vec<Slot>,
}

impl SlotCollection {
    /// Add a slot; a slot with an existing key is ignored.
    pub fn add(&mut self, slot: Slot) -> bool {
        if self.get(&slot.key).is_some() {
            return false;
        }
        self.slots.push(slot);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

item_component!(SlotCollection, "slots");

static SLOT_COLLECTION_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<SlotCollection>("SlotCollection")
        .extends(
            &ITEM_COMPONENT_TYPE,
            |s: &SlotCollection| &s.component,
            |s: &mut SlotCollection| &mut s.component,
        )
        .readonly_property("Count", Visibility::Public, |s: &SlotCollection| s.len() as i64)
        .build()
});

host_object!(SlotCollection => SLOT_COLLECTION_TYPE);

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Add,
    PercentageAdd,
    PercentageMultiply,
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierKind::Add => f.write_str("add"),
            ModifierKind::PercentageAdd => f.write_str("percentage add"),
            ModifierKind::PercentageMultiply => f.write_str("percentage multiply"),
        }
    }
}

/// Modifier applied to the stat named by `key`.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifierDescription {
    key: String,
    kind: ModifierKind,
    value: f32,
}

impl ModifierDescription {
    pub fn new(key: impl Into<String>, kind: ModifierKind, value: f32) -> Self {
        Self {
            key: key.into(),
            kind,
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModifierDescriptionCollection {
    component: ItemComponent,
    modifiers: Vec<ModifierDescription>,
}

impl ModifierDescriptionCollection {
    pub fn add(&mut self, modifier: ModifierDescription) {
        self.modifiers.push(modifier);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModifierDescription> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

item_component!(ModifierDescriptionCollection, "modifiers");

static MODIFIER_COLLECTION_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<ModifierDescriptionCollection>("ModifierDescriptionCollection")
        .extends(
            &ITEM_COMPONENT_TYPE,
            |m: &ModifierDescriptionCollection| &m.component,
            |m: &mut ModifierDescriptionCollection| &mut m.component,
        )
        .readonly_property("Count", Visibility::Public, |m: &ModifierDescriptionCollection| {
            m.len() as i64
        })
        .build()
});

host_object!(ModifierDescriptionCollection => MODIFIER_COLLECTION_TYPE);

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    attached_to_item: BackRef,
    capacity: u32,
    content: Vec<ObjectRef>,
}

impl Inventory {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn content(&self) -> &[ObjectRef] {
        &self.content
    }

    /// Store an item; fails once the inventory is full.
    pub fn add(&mut self, item: ObjectRef) -> bool {
        if self.content.len() >= self.capacity as usize {
            return false;
        }
        self.content.push(item);
        true
    }
}

impl Attached for Inventory {
    const SLOT: &'static str = "inventory";
    const BACK_REFERENCE: &'static str = "attachedToItem";

    fn back_reference(&self) -> Option<ObjectRef> {
        self.attached_to_item.get()
    }

    fn set_back_reference(&mut self, owner: Option<ObjectRef>) {
        self.attached_to_item.set(owner);
    }
}

static INVENTORY_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<Inventory>("Inventory")
        .field(
            "attachedToItem",
            Visibility::Private,
            |i: &Inventory| i.attached_to_item.get(),
            |i, owner| i.attached_to_item.set(owner),
        )
        .property(
            "Capacity",
            Visibility::Public,
            |i: &Inventory| i.capacity,
            |i, capacity| i.capacity = capacity,
        )
        .build()
});

host_object!(Inventory => INVENTORY_TYPE);

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// How an item behaves when used.
///
/// `behaviors` holds opaque behaviour keys the host dispatches on.
#[derive(Clone, Debug, PartialEq)]
pub struct UsageUtilities {
    component: ItemComponent,
    use_time: f32,
    pub use_durability: bool,
    pub has_sound: bool,
    pub behaviors: Vec<String>,
}

impl Default for UsageUtilities {
    fn default() -> Self {
        Self {
            component: ItemComponent::default(),
            use_time: 1.0,
            use_durability: true,
            has_sound: true,
            behaviors: Vec::new(),
        }
    }
}

impl UsageUtilities {
    pub fn use_time(&self) -> f32 {
        self.use_time
    }
}

item_component!(UsageUtilities, "usageUtilities");

static USAGE_UTILITIES_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<UsageUtilities>("UsageUtilities")
        .extends(
            &ITEM_COMPONENT_TYPE,
            |u: &UsageUtilities| &u.component,
            |u: &mut UsageUtilities| &mut u.component,
        )
        .field("useTime", Visibility::Private, |u: &UsageUtilities| u.use_time, |u, t| {
            u.use_time = t
        })
        .field(
            "useDurability",
            Visibility::Public,
            |u: &UsageUtilities| u.use_durability,
            |u, v| u.use_durability = v,
        )
        .field("hasSound", Visibility::Public, |u: &UsageUtilities| u.has_sound, |u, v| {
            u.has_sound = v
        })
        .readonly_property("UseTime", Visibility::Public, |u: &UsageUtilities| u.use_time)
        .build()
});

host_object!(UsageUtilities => USAGE_UTILITIES_TYPE);

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// An effect an item applies to whoever holds it, named by an opaque key.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    component: ItemComponent,
    key: String,
    pub display: bool,
}

impl Effect {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            component: ItemComponent::default(),
            key: key.into(),
            display: true,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

item_component!(Effect, "effects");

static EFFECT_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<Effect>("Effect")
        .extends(
            &ITEM_COMPONENT_TYPE,
            |e: &Effect| &e.component,
            |e: &mut Effect| &mut e.component,
        )
        .readonly_property("Key", Visibility::Public, |e: &Effect| e.key.clone())
        .field("display", Visibility::Public, |e: &Effect| e.display, |e, v| e.display = v)
        .build()
});

host_object!(Effect => EFFECT_TYPE);
