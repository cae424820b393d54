//! Insertion-ordered name set.

use std::collections::HashSet;

/// A set of names that remembers first-insertion order.
///
/// Analyzers report names in the order they were first seen so that output
/// is stable across runs on identical input.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name; returns false if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.order.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_dedup() {
        let mut names = NameSet::new();
        assert!(names.insert("b"));
        assert!(names.insert("a"));
        assert!(!names.insert("b"));
        assert!(names.contains("a"));
        assert_eq!(names.into_vec(), vec!["b", "a"]);
    }
}
