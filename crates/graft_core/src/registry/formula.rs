use crate::access::{HostType, Visibility};
use crate::host_object;
use once_cell::sync::Lazy;

/// Formula tag used when none is given.
pub const DEFAULT_FORMULA_TAG: &str = "WorkBenchAdvanced";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostEntry {
    pub id: i32,
    pub amount: i64,
}

/// Money plus item inputs consumed by a formula.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cost {
    pub money: i64,
    pub items: Vec<CostEntry>,
}

impl Cost {
    pub fn items(items: impl IntoIterator<Item = (i32, i64)>) -> Self {
        Self {
            money: 0,
            items: items
                .into_iter()
                .map(|(id, amount)| CostEntry { id, amount })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultEntry {
    pub id: i32,
    pub amount: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CraftingFormula {
    pub id: String,
    pub unlock_by_default: bool,
    pub cost: Cost,
    pub result: ResultEntry,
    pub require_perk: String,
    pub tags: Vec<String>,
    pub hide_in_index: bool,
    pub lock_in_demo: bool,
}

impl CraftingFormula {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

static CRAFTING_FORMULA_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<CraftingFormula>("CraftingFormula")
        .field("id", Visibility::Public, |f: &CraftingFormula| f.id.clone(), |f, id| f.id = id)
        .field(
            "unlockByDefault",
            Visibility::Public,
            |f: &CraftingFormula| f.unlock_by_default,
            |f, v| f.unlock_by_default = v,
        )
        .field(
            "requirePerk",
            Visibility::Public,
            |f: &CraftingFormula| f.require_perk.clone(),
            |f, v| f.require_perk = v,
        )
        .field(
            "tags",
            Visibility::Public,
            |f: &CraftingFormula| f.tags.clone(),
            |f, v| f.tags = v,
        )
        .field(
            "hideInIndex",
            Visibility::Public,
            |f: &CraftingFormula| f.hide_in_index,
            |f, v| f.hide_in_index = v,
        )
        .field(
            "lockInDemo",
            Visibility::Public,
            |f: &CraftingFormula| f.lock_in_demo,
            |f, v| f.lock_in_demo = v,
        )
        .build()
});

host_object!(CraftingFormula => CRAFTING_FORMULA_TYPE);

/// Optional settings for a formula added through the patcher.
///
/// The default unlocks the formula, shows it in the index and leaves the
/// tags to the patcher's default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaOptions {
    pub tags: Option<Vec<String>>,
    pub require_perk: String,
    pub unlock_by_default: bool,
    pub hide_in_index: bool,
    pub lock_in_demo: bool,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        Self {
            tags: None,
            require_perk: String::new(),
            unlock_by_default: true,
            hide_in_index: false,
            lock_in_demo: false,
        }
    }
}

impl FormulaOptions {
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn into_formula(self, id: &str, cost: Cost, result: ResultEntry) -> CraftingFormula {
        CraftingFormula {
            id: id.to_string(),
            unlock_by_default: self.unlock_by_default,
            cost,
            result,
            require_perk: self.require_perk,
            tags: self
                .tags
                .unwrap_or_else(|| vec![DEFAULT_FORMULA_TAG.to_string()]),
            hide_in_index: self.hide_in_index,
            lock_in_demo: self.lock_in_demo,
        }
    }
}
