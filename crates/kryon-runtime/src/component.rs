// crates/kryon-runtime/src/component.rs
//
// Component instance bookkeeping (§3, §4.6): unique ids, a per-instance
// state table, and the scope walk used by bindings and scripts. The
// static, definition-side data (params + state-var defaults + template)
// lives in `kryon_core::ComponentDefinition`; this module owns the live,
// per-use allocation.

use crate::error::{Result, RuntimeError};
use kryon_core::{ComponentDefinition, Element, ElementId, ElementTree, VariableRegistry};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl StateValue {
    pub fn from_default(type_name: &str, default: &str) -> Self {
        match type_name {
            "int" | "integer" => StateValue::Int(default.parse().unwrap_or(0)),
            "float" | "number" => StateValue::Float(default.parse().unwrap_or(0.0)),
            "bool" | "boolean" => StateValue::Bool(matches!(default, "true" | "1" | "yes")),
            _ => StateValue::String(default.to_string()),
        }
    }

    /// The canonical text form `get_as_string` hands back: integers in
    /// decimal, floats with fixed precision, booleans as `true`/`false`.
    pub fn to_canonical_string(&self) -> String {
        match self {
            StateValue::String(s) => s.clone(),
            StateValue::Int(i) => i.to_string(),
            StateValue::Float(f) => format!("{f:.6}"),
            StateValue::Bool(b) => b.to_string(),
        }
    }
}

/// An open-addressed, linear-probed `name -> StateValue` table that
/// grows (doubling, rehashing) once it crosses a 0.75 load factor, per
/// §4.6. Small enough per-instance that a hand-rolled table is cheap and
/// keeps the growth behavior explicit rather than relying on
/// `std::collections::HashMap`'s own (unspecified) policy.
#[derive(Debug, Clone)]
pub struct StateTable {
    slots: Vec<Option<(String, StateValue)>>,
    len: usize,
}

const INITIAL_CAPACITY: usize = 8;
const LOAD_FACTOR: f32 = 0.75;

impl Default for StateTable {
    fn default() -> Self {
        Self { slots: vec![None; INITIAL_CAPACITY], len: 0 }
    }
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_index(name: &str, capacity: usize) -> usize {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        (hasher.finish() as usize) % capacity
    }

    pub fn get(&self, name: &str) -> Option<&StateValue> {
        let capacity = self.slots.len();
        let mut idx = Self::slot_index(name, capacity);
        for _ in 0..capacity {
            match &self.slots[idx] {
                Some((k, v)) if k == name => return Some(v),
                Some(_) => idx = (idx + 1) % capacity,
                None => return None,
            }
        }
        None
    }

    pub fn get_as_string(&self, name: &str) -> Option<String> {
        self.get(name).map(StateValue::to_canonical_string)
    }

    pub fn set(&mut self, name: impl Into<String>, value: StateValue) {
        if (self.len + 1) as f32 / self.slots.len() as f32 > LOAD_FACTOR {
            self.grow();
        }
        let name = name.into();
        let capacity = self.slots.len();
        let mut idx = Self::slot_index(&name, capacity);
        loop {
            match &mut self.slots[idx] {
                Some((k, v)) if *k == name => {
                    *v = value;
                    return;
                }
                Some(_) => idx = (idx + 1) % capacity,
                None => {
                    self.slots[idx] = Some((name, value));
                    self.len += 1;
                    return;
                }
            }
        }
    }

    fn grow(&mut self) {
        let old = std::mem::replace(&mut self.slots, vec![None; self.slots.len() * 2]);
        self.len = 0;
        for (name, value) in old.into_iter().flatten() {
            self.set(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub id: String,
    pub definition_name: String,
    pub owning_element: ElementId,
    pub params: HashMap<String, String>,
    pub state: StateTable,
}

#[derive(Debug, Default)]
pub struct ComponentInstanceManager {
    instances: HashMap<String, ComponentInstance>,
    live_user_ids: std::collections::HashSet<String>,
    counters: HashMap<String, u64>,
}

impl ComponentInstanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh instance for `definition`, owned by
    /// `owning_element`. `param_overrides` wins over the definition's
    /// declared defaults (the element's own attribute values).
    pub fn instantiate(
        &mut self,
        definition: &ComponentDefinition,
        user_id: Option<&str>,
        owning_element: ElementId,
        param_overrides: &HashMap<String, String>,
    ) -> Result<String> {
        if let Some(uid) = user_id {
            if self.live_user_ids.contains(uid) {
                return Err(RuntimeError::InvalidReference(format!(
                    "component id '{uid}' already exists in the live tree"
                )));
            }
        }

        let base = user_id.unwrap_or(&definition.name).to_string();
        let counter = self.counters.entry(base.clone()).or_insert(0);
        *counter += 1;
        let id = format!("{base}_{}", *counter);

        if let Some(uid) = user_id {
            self.live_user_ids.insert(uid.to_string());
        }

        let mut params = HashMap::new();
        for p in &definition.params {
            let value = param_overrides
                .get(&p.name)
                .cloned()
                .or_else(|| p.default.clone())
                .unwrap_or_default();
            params.insert(p.name.clone(), value);
        }

        let mut state = StateTable::new();
        for sv in &definition.state_vars {
            state.set(sv.name.clone(), StateValue::from_default(&sv.type_name, &sv.default));
        }

        let instance = ComponentInstance {
            id: id.clone(),
            definition_name: definition.name.clone(),
            owning_element,
            params,
            state,
        };
        self.instances.insert(id.clone(), instance);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&ComponentInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ComponentInstance> {
        self.instances.get_mut(id)
    }

    pub fn destroy(&mut self, id: &str) {
        if let Some(instance) = self.instances.remove(id) {
            self.live_user_ids.remove(&instance.id);
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// The §3/§4.6 scope walk used by bindings and scripts: walk up from
/// `from` through parents, checking each component-owning element's
/// params then state table; on miss keep climbing; final fallback is the
/// global variable registry. A dotted `<component-id>.<name>` path
/// short-circuits straight to that instance by id.
pub fn resolve_scoped(
    tree: &ElementTree,
    components: &ComponentInstanceManager,
    vars: &VariableRegistry,
    from: ElementId,
    name: &str,
) -> Option<String> {
    if let Some((comp_id, field)) = name.split_once('.') {
        let instance = components.get(comp_id)?;
        return instance
            .params
            .get(field)
            .cloned()
            .or_else(|| instance.state.get_as_string(field));
    }

    let mut current = Some(from);
    while let Some(id) = current {
        let element: &Element = match tree.get(id) {
            Some(e) => e,
            None => break,
        };
        if let Some(comp_id) = &element.component_instance {
            if let Some(instance) = components.get(comp_id) {
                if let Some(v) = instance.params.get(name) {
                    return Some(v.clone());
                }
                if let Some(v) = instance.state.get_as_string(name) {
                    return Some(v);
                }
            }
        }
        current = element.parent;
    }

    vars.get(name).map(|s| s.to_string())
}
