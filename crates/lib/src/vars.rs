//! Build variables visible while a recipe is walked.

use std::collections::BTreeMap;

use crate::expand::Variables;

/// Name to value table seeded from explicit build arguments and updated in
/// document order.
///
/// Explicit arguments win over recipe `ARG` defaults, and `ENV` declarations
/// win over everything seen before them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
  values: BTreeMap<String, String>,
}

impl VariableTable {
  /// Create a table holding the caller's explicit build arguments.
  pub fn with_build_args(build_args: &BTreeMap<String, String>) -> Self {
    Self {
      values: build_args.clone(),
    }
  }

  /// Record an `ARG` default. Returns `false` when the name was already set.
  pub fn declare_default(&mut self, name: &str, default: String) -> bool {
    if self.values.contains_key(name) {
      return false;
    }
    self.values.insert(name.to_string(), default);
    true
  }

  /// Record an `ENV` value, replacing any previous entry.
  pub fn set_env(&mut self, name: &str, value: String) {
    self.values.insert(name.to_string(), value);
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Entries in lexicographic key order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn into_map(self) -> BTreeMap<String, String> {
    self.values
  }
}

impl Variables for VariableTable {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> VariableTable {
    VariableTable::with_build_args(&BTreeMap::from([("ARG1".to_string(), "explicit".to_string())]))
  }

  #[test]
  fn default_does_not_override_explicit_arg() {
    let mut vars = table();
    assert!(!vars.declare_default("ARG1", "recipe".to_string()));
    assert_eq!(vars.get("ARG1"), Some("explicit"));
  }

  #[test]
  fn default_fills_missing_name() {
    let mut vars = table();
    assert!(vars.declare_default("ARG2", "recipe".to_string()));
    assert_eq!(vars.get("ARG2"), Some("recipe"));
  }

  #[test]
  fn first_default_wins() {
    let mut vars = VariableTable::default();
    vars.declare_default("V", "one".to_string());
    vars.declare_default("V", "two".to_string());
    assert_eq!(vars.get("V"), Some("one"));
  }

  #[test]
  fn env_overrides_explicit_arg() {
    let mut vars = table();
    vars.set_env("ARG1", "from-env".to_string());
    assert_eq!(vars.get("ARG1"), Some("from-env"));
  }

  #[test]
  fn iteration_is_sorted() {
    let mut vars = VariableTable::default();
    vars.set_env("b", "2".to_string());
    vars.set_env("a", "1".to_string());
    let keys: Vec<_> = vars.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "b"]);
  }
}
