//! Crafting table patch
//!
//! Registers a portable crafting table item and the formula that crafts it
//! from planks. Deactivation removes both again.

use graft_core::access::MemberAccessor;
use graft_core::entity::{register_tag, DisplayQuality, Entity, EntityBuilder};
use graft_core::patch::{HostWorld, Patch};
use graft_core::registry::{
    Cost, FormulaOptions, PatchError, RegistryLayout, RegistryPatcher, ResultEntry,
};
use graft_services::Settings;

pub const ITEM_NAME_KEY: &str = "crafting_table";
pub const FORMULA_ID: &str = "crafting_table_formula";
pub const PLANK_TYPE_ID: i32 = 361;
pub const PLANK_COST: i64 = 4;
pub const TOOL_TAG: &str = "Tool";
pub const OPEN_CRAFT_VIEW: &str = "OpenCraftView";

const ICON_KEY: &str = "crafting_table_icon";
const USE_TIME: f32 = 0.2;

pub struct CraftingTablePatch {
    accessor: MemberAccessor,
    formula_tags: Vec<String>,
    patcher: RegistryPatcher,
    item_type_id: Option<i32>,
}

impl CraftingTablePatch {
    pub fn new(settings: &Settings) -> Self {
        let accessor = settings.accessor();
        register_tag(TOOL_TAG);
        Self {
            accessor,
            formula_tags: settings.patch.formula_tags.clone(),
            patcher: RegistryPatcher::with_accessor(accessor, RegistryLayout::CRAFTING_FORMULAS),
            item_type_id: None,
        }
    }

    /// Type id of the registered item while active.
    pub fn item_type_id(&self) -> Option<i32> {
        self.item_type_id
    }

    fn build_item(&self, type_id: i32) -> Result<Entity, PatchError> {
        let accessor = self.accessor;
        let builder = EntityBuilder::new()
            .with_accessor(accessor)
            .with_type_id(type_id)
            .with_order(0)
            .with_item_name_key(ITEM_NAME_KEY)
            .with_icon(ICON_KEY)
            .with_weight(0.5)
            .with_value(400)
            .with_quality(9, DisplayQuality::None)
            .add_tag_named(TOOL_TAG)
            .as_non_stackable()
            .with_durability(1.0, None)
            .with_usage_utilities(move |usage| {
                if !accessor.set_field(usage, "useTime", USE_TIME).is_ok() {
                    tracing::warn!("use time left at its default");
                }
                usage.use_durability = false;
                usage.has_sound = false;
                usage.behaviors = vec![OPEN_CRAFT_VIEW.to_string()];
            });

        for issue in builder.issues() {
            tracing::warn!(kind = %issue.kind(), "crafting table: {issue}");
        }
        Ok(builder.build_named("CraftingTable")?)
    }
}

impl Patch for CraftingTablePatch {
    fn name(&self) -> &str {
        "crafting_table"
    }

    fn on_after_setup(&mut self, world: &mut HostWorld) -> Result<(), PatchError> {
        let item = self.build_item(world.item_assets.next_type_id())?;
        let type_id = item.type_id();
        if !world.item_assets.add_dynamic_entry(item) {
            return Err(PatchError::DuplicateTypeId { type_id });
        }
        self.item_type_id = Some(type_id);

        // An empty tag list keeps the patcher's default tag.
        let mut options = FormulaOptions::default();
        if !self.formula_tags.is_empty() {
            options = options.with_tags(self.formula_tags.iter().cloned());
        }
        self.patcher.add_crafting_formula(
            &mut world.formulas,
            FORMULA_ID,
            Cost::items([(PLANK_TYPE_ID, PLANK_COST)]),
            ResultEntry { id: type_id, amount: 1 },
            options,
        )?;
        tracing::info!(type_id, formula = FORMULA_ID, "crafting table registered");
        Ok(())
    }

    fn on_before_deactivate(&mut self, world: &mut HostWorld) {
        if let Some(type_id) = self.item_type_id.take() {
            world.item_assets.remove_dynamic_entry(type_id);
        }
        if let Err(err) = self.patcher.remove_all_added_entries(&mut world.formulas) {
            tracing::error!(kind = %err.kind(), "crafting formulas not removed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::access::MemberScope;
    use graft_core::patch::Activation;
    use graft_core::registry::{ItemAssetsCollection, DEFAULT_FORMULA_TAG};

    fn world() -> HostWorld {
        HostWorld {
            item_assets: ItemAssetsCollection::with_builtin([1, PLANK_TYPE_ID, 1200]),
            ..HostWorld::default()
        }
    }

    #[test]
    fn activation_registers_item_and_formula() {
        let mut world = world();
        let activation =
            Activation::activate(CraftingTablePatch::new(&Settings::default()), &mut world)
                .ok()
                .unwrap();

        assert_eq!(activation.patch().and_then(|p| p.item_type_id()), Some(1201));
        let item = activation.world().item_assets.get(1201).unwrap();
        assert_eq!(item.display_name_raw(), "Item_crafting_table");
        assert_eq!(item.value(), 400);
        assert_eq!(item.quality(), 9);
        assert!(!item.stackable());
        assert!(item.has_tag(TOOL_TAG));

        let usage = item.usage_utilities().unwrap();
        assert!((usage.use_time() - USE_TIME).abs() < f32::EPSILON);
        assert!(!usage.use_durability);
        assert!(item.use_durability());
        assert_eq!(item.max_durability(), 1.0);
        assert_eq!(item.durability(), 1.0);
        assert_eq!(usage.behaviors, vec![OPEN_CRAFT_VIEW.to_string()]);

        let formula = activation.world().formulas.get(FORMULA_ID).unwrap();
        assert_eq!(formula.result.id, 1201);
        assert_eq!(formula.cost.items[0].id, PLANK_TYPE_ID);
        assert_eq!(formula.cost.items[0].amount, PLANK_COST);
        assert!(formula.has_tag("WorkBenchAdvanced"));
    }

    #[test]
    fn deactivation_removes_everything() {
        let mut world = world();
        let patch = CraftingTablePatch::new(&Settings::default());
        let patch = Activation::activate(patch, &mut world)
            .ok()
            .unwrap()
            .deactivate()
            .unwrap();

        assert_eq!(patch.item_type_id(), None);
        assert_eq!(world.item_assets.dynamic_len(), 0);
        assert!(world.formulas.is_empty());
    }

    #[test]
    fn configured_tags_are_used() {
        let mut settings = Settings::default();
        settings.patch.formula_tags = vec!["WorkBench".to_string()];
        let mut world = world();
        let activation = Activation::activate(CraftingTablePatch::new(&settings), &mut world)
            .ok()
            .unwrap();

        let formula = activation.world().formulas.get(FORMULA_ID).unwrap();
        assert_eq!(formula.tags, vec!["WorkBench".to_string()]);
    }

    #[test]
    fn empty_tag_list_falls_back_to_default_tag() {
        let mut settings = Settings::default();
        settings.patch.formula_tags.clear();
        let mut world = world();
        let activation = Activation::activate(CraftingTablePatch::new(&settings), &mut world)
            .ok()
            .unwrap();

        let formula = activation.world().formulas.get(FORMULA_ID).unwrap();
        assert_eq!(formula.tags, vec![DEFAULT_FORMULA_TAG.to_string()]);
    }

    #[test]
    fn public_scope_cannot_reach_private_members() {
        let mut settings = Settings::default();
        settings.access.scope = MemberScope::PUBLIC | MemberScope::INSTANCE;
        let mut world = world();

        match Activation::activate(CraftingTablePatch::new(&settings), &mut world) {
            Ok(_) => panic!("private registry list should be out of scope"),
            Err((_, err)) => assert_eq!(err.kind(), graft_core::ErrorKind::MemberNotFound),
        }
        assert_eq!(world.item_assets.dynamic_len(), 0);
        assert!(world.formulas.is_empty());
    }
}
