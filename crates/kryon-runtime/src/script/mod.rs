// crates/kryon-runtime/src/script/mod.rs
//
// Script integration (§4.8): a name -> (language, source) registry
// populated at load time, and an opaque interpreter collaborator with
// exactly the three operations the spec names. Deliberately minimal —
// no bridge/change-set/bytecode machinery, since the contract this
// workspace needs to honor stops at `load`/`call`/`notify_element_destroyed`.

#[cfg(feature = "lua-vm")]
pub mod lua;

use kryon_core::ElementId;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    String(String),
    Number(f64),
    Bool(bool),
}

impl ScriptValue {
    pub fn as_string(&self) -> String {
        match self {
            ScriptValue::Nil => String::new(),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Number(n) => n.to_string(),
            ScriptValue::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script load failed: {0}")]
    Load(String),
    #[error("script call failed: {0}")]
    Call(String),
}

/// The opaque interpreter collaborator (§4.8). Implementations own
/// whatever VM state they need; the runtime never reaches past this
/// trait into interpreter internals.
pub trait ScriptEngine {
    fn load(&mut self, language: &str, source: &str, source_name: &str) -> Result<(), ScriptError>;
    fn call(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError>;
    fn notify_element_destroyed(&mut self, element: ElementId);
}

/// A function name's source registered at load time, before any engine
/// has compiled it. `Runtime::load` walks `KrbDocument::scripts` into
/// this, then hands each record to the chosen `ScriptEngine::load`.
#[derive(Debug, Clone)]
pub struct ScriptRecord {
    pub name: String,
    pub language: String,
    pub source: String,
}

#[derive(Debug, Default)]
pub struct ScriptRegistry {
    records: HashMap<String, ScriptRecord>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, record: ScriptRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&ScriptRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptRecord> {
        self.records.values()
    }
}

/// A no-op engine used when no `lua-vm` feature (or other interpreter)
/// is compiled in: `load`/`call` report a `Script` error rather than
/// silently doing nothing, so a missing handler is visible in the error
/// log instead of vanishing.
#[derive(Debug, Default)]
pub struct NullEngine;

impl ScriptEngine for NullEngine {
    fn load(&mut self, _language: &str, _source: &str, _source_name: &str) -> Result<(), ScriptError> {
        Err(ScriptError::Load("no script engine compiled in".to_string()))
    }

    fn call(&mut self, name: &str, _args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
        Err(ScriptError::Call(format!("no script engine compiled in, cannot call '{name}'")))
    }

    fn notify_element_destroyed(&mut self, _element: ElementId) {}
}
