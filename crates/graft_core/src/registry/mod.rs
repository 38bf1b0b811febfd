//! Host registries and tracked, reversible patching of them.

mod assets;
mod collection;
mod formula;
mod patch_error;
mod patcher;

pub use assets::ItemAssetsCollection;
pub use collection::FormulaCollection;
pub use formula::{
    Cost, CostEntry, CraftingFormula, FormulaOptions, ResultEntry, DEFAULT_FORMULA_TAG,
};
pub use patch_error::PatchError;
pub use patcher::{PatchTracker, RegistryLayout, RegistryPatcher};
