// collection.rs - The host's crafting formula registry
//
// The backing list and the read-only cache derived from it are private. The
// cache is rebuilt lazily on the next read after it has been cleared, so
// anyone mutating the list must clear the cache as well.

use crate::access::{HostType, Visibility};
use crate::host_object;
use crate::registry::{CraftingFormula, DEFAULT_FORMULA_TAG};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;

#[derive(Clone, Debug, Default)]
pub struct FormulaCollection {
    list: Vec<CraftingFormula>,
    entries_read_only: OnceCell<Vec<CraftingFormula>>,
}

impl PartialEq for FormulaCollection {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

static FORMULA_COLLECTION_TYPE: Lazy<HostType> = Lazy::new(|| {
    HostType::builder::<FormulaCollection>("CraftingFormulaCollection")
        .field(
            "list",
            Visibility::Private,
            |c: &FormulaCollection| c.list.clone(),
            |c, list| c.list = list,
        )
        .field(
            "_entries_ReadOnly",
            Visibility::Private,
            |c: &FormulaCollection| c.entries_read_only.get().cloned(),
            |c, cache: Option<Vec<CraftingFormula>>| {
                c.entries_read_only = cache.map(OnceCell::from).unwrap_or_default()
            },
        )
        .readonly_property("Count", Visibility::Public, |c: &FormulaCollection| {
            c.list.len() as i64
        })
        .static_property("DefaultTag", Visibility::Public, || DEFAULT_FORMULA_TAG.to_string())
        .build()
});

host_object!(FormulaCollection => FORMULA_COLLECTION_TYPE);

impl FormulaCollection {
    pub fn with_formulas(list: Vec<CraftingFormula>) -> Self {
        Self {
            list,
            entries_read_only: OnceCell::new(),
        }
    }

    /// Read view of every formula, rebuilt from the list if it was cleared.
    pub fn entries(&self) -> &[CraftingFormula] {
        self.entries_read_only.get_or_init(|| {
            tracing::debug!(count = self.list.len(), "rebuilding formula cache");
            self.list.clone()
        })
    }

    pub fn is_cached(&self) -> bool {
        self.entries_read_only.get().is_some()
    }

    pub fn get(&self, id: &str) -> Option<&CraftingFormula> {
        self.entries().iter().find(|f| f.id == id)
    }

    /// Formulas offered by a crafting view filtering on `tag`.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a CraftingFormula> + 'a {
        self.entries().iter().filter(move |f| f.has_tag(tag))
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries().iter().map(|f| f.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{HostValue, MemberAccessor, Value};

    fn formula(id: &str) -> CraftingFormula {
        CraftingFormula {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn cache_rebuilds_after_clear() {
        let accessor = MemberAccessor::new();
        let mut collection = FormulaCollection::with_formulas(vec![formula("a")]);
        assert_eq!(collection.ids(), vec!["a"]);
        assert!(collection.is_cached());

        let mut list = accessor
            .get_field::<Vec<CraftingFormula>, _>(&collection, "list")
            .into_value();
        list.push(formula("b"));
        assert!(accessor
            .set_field(&mut collection, "list", list.into_value())
            .into_value());
        assert_eq!(collection.ids(), vec!["a"]);

        assert!(accessor
            .set_field(&mut collection, "_entries_ReadOnly", Value::Null)
            .into_value());
        assert!(!collection.is_cached());
        assert_eq!(collection.ids(), vec!["a", "b"]);
    }

    #[test]
    fn tag_filter_matches_view() {
        let mut tagged = formula("tagged");
        tagged.tags = vec![DEFAULT_FORMULA_TAG.to_string()];
        let collection = FormulaCollection::with_formulas(vec![formula("plain"), tagged]);

        let ids: Vec<_> = collection
            .with_tag(DEFAULT_FORMULA_TAG)
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tagged"]);
    }

    #[test]
    fn default_tag_is_static() {
        let accessor = MemberAccessor::new();
        let collection = FormulaCollection::default();
        assert_eq!(
            accessor.get_property::<String, _>(&collection, "DefaultTag").into_value(),
            DEFAULT_FORMULA_TAG
        );
    }
}
