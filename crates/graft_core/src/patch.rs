// patch.rs - Patch lifecycle
//
// A patch sets itself up against the host world when activated and must undo
// everything when deactivated. `Activation` is the handle tying the two
// together: deactivating consumes it, and dropping it while still active
// runs the deactivation anyway.

use crate::registry::{FormulaCollection, ItemAssetsCollection, PatchError};

/// Host state a patch may touch.
#[derive(Clone, Debug, Default)]
pub struct HostWorld {
    pub formulas: FormulaCollection,
    pub item_assets: ItemAssetsCollection,
}

/// Code injected into the host for the lifetime of an activation.
pub trait Patch {
    fn name(&self) -> &str;

    /// Called once the host has finished its own setup.
    fn on_after_setup(&mut self, world: &mut HostWorld) -> Result<(), PatchError>;

    /// Called before the patch is unloaded; must remove everything the patch
    /// added.
    fn on_before_deactivate(&mut self, world: &mut HostWorld);
}

/// Handle to an active patch.
#[must_use = "dropping an activation deactivates the patch"]
pub struct Activation<'w, P: Patch> {
    patch: Option<P>,
    world: &'w mut HostWorld,
}

impl<'w, P: Patch> Activation<'w, P> {
    /// Run `on_after_setup`. On failure the patch is deactivated again so
    /// partial work is undone.
    pub fn activate(mut patch: P, world: &'w mut HostWorld) -> Result<Self, (P, PatchError)> {
        tracing::info!(patch = patch.name(), "activating patch");
        if let Err(err) = patch.on_after_setup(world) {
            tracing::error!(patch = patch.name(), kind = %err.kind(), "setup failed: {err}");
            patch.on_before_deactivate(world);
            return Err((patch, err));
        }
        Ok(Self {
            patch: Some(patch),
            world,
        })
    }

    pub fn patch(&self) -> Option<&P> {
        self.patch.as_ref()
    }

    pub fn world(&self) -> &HostWorld {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut HostWorld {
        &mut *self.world
    }

    /// Undo the patch and hand it back for a later activation.
    pub fn deactivate(mut self) -> Option<P> {
        self.release()
    }

    fn release(&mut self) -> Option<P> {
        let mut patch = self.patch.take()?;
        patch.on_before_deactivate(&mut *self.world);
        tracing::info!(patch = patch.name(), "patch deactivated");
        Some(patch)
    }
}

impl<P: Patch> Drop for Activation<'_, P> {
    fn drop(&mut self) {
        if let Some(patch) = &self.patch {
            tracing::warn!(patch = patch.name(), "activation dropped while active");
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CraftingFormula, RegistryLayout, RegistryPatcher};

    struct FormulaPatch {
        patcher: RegistryPatcher,
        fail_after_first: bool,
        deactivations: usize,
    }

    impl FormulaPatch {
        fn new(fail_after_first: bool) -> Self {
            Self {
                patcher: RegistryPatcher::new(RegistryLayout::CRAFTING_FORMULAS),
                fail_after_first,
                deactivations: 0,
            }
        }
    }

    impl Patch for FormulaPatch {
        fn name(&self) -> &str {
            "formula_patch"
        }

        fn on_after_setup(&mut self, world: &mut HostWorld) -> Result<(), PatchError> {
            self.patcher
                .add_entry(&mut world.formulas, "patched", CraftingFormula::default())?;
            if self.fail_after_first {
                self.patcher
                    .add_entry(&mut world.formulas, "patched", CraftingFormula::default())?;
            }
            Ok(())
        }

        fn on_before_deactivate(&mut self, world: &mut HostWorld) {
            self.deactivations += 1;
            let _ = self.patcher.remove_all_added_entries(&mut world.formulas);
        }
    }

    #[test]
    fn activation_cycles_restore_the_world() {
        let mut world = HostWorld::default();
        let mut patch = FormulaPatch::new(false);

        for _ in 0..3 {
            let activation = Activation::activate(patch, &mut world).ok().unwrap();
            assert_eq!(activation.world().formulas.ids(), vec!["patched"]);
            patch = activation.deactivate().unwrap();
            assert!(world.formulas.is_empty());
        }
        assert_eq!(patch.deactivations, 3);
    }

    #[test]
    fn dropping_an_active_handle_deactivates() {
        let mut world = HostWorld::default();
        {
            let _activation = Activation::activate(FormulaPatch::new(false), &mut world)
                .ok()
                .unwrap();
        }
        assert!(world.formulas.is_empty());
    }

    #[test]
    fn failed_setup_is_rolled_back() {
        let mut world = HostWorld::default();
        let (patch, err) = match Activation::activate(FormulaPatch::new(true), &mut world) {
            Ok(_) => panic!("setup should fail"),
            Err(failure) => failure,
        };
        assert_eq!(err.kind(), crate::ErrorKind::DuplicateKey);
        assert_eq!(patch.deactivations, 1);
        assert!(world.formulas.is_empty());
    }
}
