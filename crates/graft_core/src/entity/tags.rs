// tags.rs - Named tags and the global tag library
//
// Tags are registered once at startup and looked up by name afterwards.
// Items hold an ordered, duplicate-free set of them.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    name: String,
}

impl Tag {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Global library of every known tag.
static LIBRARY: Lazy<RwLock<HashMap<String, Tag>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a tag by name, returning the existing one if already known.
pub fn register_tag(name: &str) -> Tag {
    let mut library = LIBRARY.write().unwrap_or_else(PoisonError::into_inner);
    library
        .entry(name.to_string())
        .or_insert_with(|| Tag {
            name: name.to_string(),
        })
        .clone()
}

/// Look up a registered tag by name.
pub fn find_tag(name: &str) -> Option<Tag> {
    LIBRARY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// Ordered set of tags; insertion order is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCollection {
    tags: Vec<Tag>,
}

impl TagCollection {
    /// Add a tag unless already present.
    pub fn add(&mut self, tag: Tag) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_twice_returns_same_tag() {
        let a = register_tag("tags_test_Repeat");
        let b = register_tag("tags_test_Repeat");
        assert_eq!(a, b);
        assert_eq!(find_tag("tags_test_Repeat"), Some(a));
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert_eq!(find_tag("tags_test_NeverRegistered"), None);
    }

    #[test]
    fn collection_ignores_duplicates_and_keeps_order() {
        let first = register_tag("tags_test_First");
        let second = register_tag("tags_test_Second");

        let mut tags = TagCollection::default();
        assert!(tags.add(first.clone()));
        assert!(tags.add(second.clone()));
        assert!(!tags.add(first.clone()));

        assert_eq!(tags.names(), vec!["tags_test_First", "tags_test_Second"]);
        assert!(tags.remove(&first));
        assert!(!tags.remove(&first));
        assert!(tags.contains_name("tags_test_Second"));
    }
}
