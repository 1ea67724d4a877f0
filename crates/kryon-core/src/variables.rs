// crates/kryon-core/src/variables.rs
//
// The reactive variable registry (§3, §4.3): a flat name->string map.
// Setting a variable flips a crate-wide `needs_update` flag rather than
// tracking per-variable subscribers — the mandated invalidation floor is
// "something changed, redo everything downstream", not fine-grained
// dependency tracking (see design notes on why that's out of scope).

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct VariableRegistry {
    values: HashMap<String, String>,
    needs_update: bool,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set a variable's value. A no-op write (value unchanged) still
    /// flips `needs_update`, matching the coarse "any set dirties
    /// everything" floor rather than diffing old vs new.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
        self.needs_update = true;
    }

    pub fn take_needs_update(&mut self) -> bool {
        std::mem::replace(&mut self.needs_update, false)
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
