//! Items and their deferred construction.
//!
//! `Entity` is the host's item object: a root identity with scalar data,
//! tags, key-value stores and optional sub-components that point back at it.
//! `EntityBuilder` records configuration and materializes it in one pass,
//! reaching the item's private slots through the member accessor.

mod build_error;
mod builder;
mod components;
mod custom_data;
mod ext;
mod item;
mod tags;

pub use build_error::{ConfigError, FinalizeError};
pub use builder::{EntityBuilder, DEFAULT_OBJECT_NAME};
pub use components::{
    Attached, BackRef, Effect, Inventory, ItemComponent, ModifierDescription,
    ModifierDescriptionCollection, ModifierKind, Slot, SlotCollection, Stat, StatCollection,
    UsageUtilities,
};
pub use custom_data::CustomDataStore;
pub use item::{DisplayQuality, Entity, STACK_COUNT_KEY};
pub use tags::{find_tag, register_tag, Tag, TagCollection};
