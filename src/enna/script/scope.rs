//! Variable environments
//!
//! A scope is an owned map from names to values. Cloning it is how FOR iterations get
//! their own copy of the enclosing variables.

use super::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Copy every binding of `other` into this scope, overwriting
    pub fn extend_from(&mut self, other: &Scope) {
        for (name, value) in &other.vars {
            self.vars.insert(name.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_independent() {
        let mut outer: Scope = [("x", 1i64)].into_iter().collect();
        let mut inner = outer.clone();
        inner.set("x", 2i64);
        outer.set("y", "a");
        assert_eq!(outer.get("x"), Some(&Value::Int(1)));
        assert!(!inner.contains("y"));
    }

    #[test]
    fn test_extend_overwrites() {
        let mut scope: Scope = [("a", 1i64), ("b", 2i64)].into_iter().collect();
        let other: Scope = [("b", 3i64)].into_iter().collect();
        scope.extend_from(&other);
        assert_eq!(scope.get("b"), Some(&Value::Int(3)));
        assert_eq!(scope.len(), 2);
    }
}
