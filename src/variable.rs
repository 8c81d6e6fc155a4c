//! The global variable store: named, float-valued bindings shared by the
//! serializer (registration pass), the lowering pass (snapshot) and the
//! execution engine (runtime reads).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Named float-valued global bindings.
///
/// Keys are the display names the editor shows next to variable blocks.
/// Insertion order is irrelevant: the document-order/overwrite rule is the
/// caller's concern (the lowering pass walks blocks in document order and
/// later `insert`s overwrite earlier ones).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VariableStore {
    content: HashMap<String, f64>,
}

impl VariableStore {
    pub fn new() -> VariableStore {
        VariableStore {
            content: HashMap::new(),
        }
    }

    /// Inserts or overwrites a binding, returning the previous value if any.
    pub fn insert(&mut self, key: String, value: f64) -> Option<f64> {
        self.content.insert(key, value)
    }

    /// Registers a name with a zero value unless it is already bound.
    ///
    /// Used by the serializer's variable-registration pass, which must skip
    /// already-registered names.
    pub fn register(&mut self, key: &str) {
        if !self.content.contains_key(key) {
            self.content.insert(key.to_owned(), 0.0);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.content.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.content.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.content.iter().map(|(k, v)| (k, *v))
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }
}
