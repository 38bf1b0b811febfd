//! Graft Runtime
//!
//! Boots a host world, then activates and deactivates the crafting table
//! patch for the configured number of cycles.

mod crafting_table;

use anyhow::{ensure, Context, Result};
use crafting_table::{CraftingTablePatch, PLANK_TYPE_ID};
use graft_core::patch::{Activation, HostWorld};
use graft_core::registry::{CraftingFormula, FormulaCollection, ItemAssetsCollection, ResultEntry};
use graft_services::Settings;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load_or_default(path.as_deref()).context("loading settings")?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Graft v{}", graft_core::VERSION);

    let mut world = host_world();
    run_cycles(&settings, &mut world)?;

    tracing::info!(cycles = settings.patch.cycles, "host world restored after every cycle");
    Ok(())
}

/// Stand-in for the host's own setup.
fn host_world() -> HostWorld {
    let plank_formula = CraftingFormula {
        id: "plank_formula".to_string(),
        unlock_by_default: true,
        result: ResultEntry {
            id: PLANK_TYPE_ID,
            amount: 2,
        },
        ..Default::default()
    };
    HostWorld {
        formulas: FormulaCollection::with_formulas(vec![plank_formula]),
        item_assets: ItemAssetsCollection::with_builtin([1, PLANK_TYPE_ID, 1200]),
    }
}

/// Activate and deactivate the patch `settings.patch.cycles` times, checking
/// the world matches its starting state after each deactivation.
fn run_cycles(settings: &Settings, world: &mut HostWorld) -> Result<()> {
    let formulas_before = world.formulas.entries().to_vec();
    let items_before = world.item_assets.dynamic_len();
    let mut patch = CraftingTablePatch::new(settings);

    for cycle in 1..=settings.patch.cycles {
        let activation = Activation::activate(patch, world)
            .map_err(|(_, err)| err)
            .with_context(|| format!("activating cycle {cycle}"))?;
        tracing::info!(
            cycle,
            formulas = activation.world().formulas.len(),
            "crafting table active"
        );
        patch = activation
            .deactivate()
            .context("activation released its patch early")?;

        ensure!(
            world.formulas.entries() == formulas_before.as_slice(),
            "cycle {cycle} left the formula registry changed"
        );
        ensure!(
            world.item_assets.dynamic_len() == items_before,
            "cycle {cycle} left dynamic items behind"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_restore_the_host_world() {
        let mut settings = Settings::default();
        settings.patch.cycles = 3;
        let mut world = host_world();

        run_cycles(&settings, &mut world).unwrap();
        assert_eq!(world.formulas.ids(), vec!["plank_formula"]);
        assert_eq!(world.item_assets.dynamic_len(), 0);
    }

    #[test]
    fn taken_formula_id_fails_the_first_cycle() {
        let mut world = host_world();
        world.formulas = FormulaCollection::with_formulas(vec![CraftingFormula {
            id: crafting_table::FORMULA_ID.to_string(),
            ..Default::default()
        }]);

        let err = run_cycles(&Settings::default(), &mut world).unwrap_err();
        assert!(err.to_string().contains("cycle 1"));
        assert_eq!(world.formulas.len(), 1);
        assert_eq!(world.item_assets.dynamic_len(), 0);
    }
}
