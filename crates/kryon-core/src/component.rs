// crates/kryon-core/src/component.rs
//
// Component definitions as parsed from a KRB's "COMP" section (§4.6).
// Instance bookkeeping (id generation, the per-instance state table,
// scope-walk resolution) lives in `kryon-runtime::component` since it
// needs the live element tree; this module only holds the static,
// definition-side data the loader produces.

#[derive(Debug, Clone)]
pub struct ComponentParam {
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ComponentStateVar {
    pub name: String,
    pub type_name: String,
    pub default: String,
}

#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub name: String,
    pub params: Vec<ComponentParam>,
    pub state_vars: Vec<ComponentStateVar>,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            state_vars: Vec::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ComponentParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn state_var(&self, name: &str) -> Option<&ComponentStateVar> {
        self.state_vars.iter().find(|s| s.name == name)
    }
}
