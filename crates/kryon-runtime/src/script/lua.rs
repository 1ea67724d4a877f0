// crates/kryon-runtime/src/script/lua.rs
//
// The `lua-vm` feature's `ScriptEngine`: one shared `mlua::Lua` state,
// loaded functions become globals, `call` looks the name up as a global
// and invokes it. `notify_element_destroyed` is a hook point for a
// future DOM-handle bridge; today there's no live bridge to tear down,
// so it's a no-op.

use super::{ScriptEngine, ScriptError, ScriptValue};
use kryon_core::ElementId;
use mlua::{Lua, Value as LuaValue};

pub struct LuaScriptEngine {
    lua: Lua,
}

impl Default for LuaScriptEngine {
    fn default() -> Self {
        Self { lua: Lua::new() }
    }
}

impl LuaScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_lua<'lua>(lua: &'lua Lua, value: &ScriptValue) -> mlua::Result<LuaValue<'lua>> {
    Ok(match value {
        ScriptValue::Nil => LuaValue::Nil,
        ScriptValue::String(s) => LuaValue::String(lua.create_string(s)?),
        ScriptValue::Number(n) => LuaValue::Number(*n),
        ScriptValue::Bool(b) => LuaValue::Boolean(*b),
    })
}

fn from_lua(value: LuaValue) -> ScriptValue {
    match value {
        LuaValue::Nil => ScriptValue::Nil,
        LuaValue::Boolean(b) => ScriptValue::Bool(b),
        LuaValue::Integer(i) => ScriptValue::Number(i as f64),
        LuaValue::Number(n) => ScriptValue::Number(n),
        LuaValue::String(s) => ScriptValue::String(s.to_str().unwrap_or_default().to_string()),
        _ => ScriptValue::Nil,
    }
}

impl ScriptEngine for LuaScriptEngine {
    fn load(&mut self, language: &str, source: &str, source_name: &str) -> Result<(), ScriptError> {
        if language != "lua" {
            return Err(ScriptError::Load(format!("unsupported script language '{language}'")));
        }
        self.lua
            .load(source)
            .set_name(source_name)
            .exec()
            .map_err(|e| ScriptError::Load(e.to_string()))
    }

    fn call(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
        let globals = self.lua.globals();
        let func: mlua::Function = globals
            .get(name)
            .map_err(|_| ScriptError::Call(format!("no function named '{name}' is registered")))?;

        let lua_args: Vec<LuaValue> = args
            .iter()
            .map(|a| to_lua(&self.lua, a))
            .collect::<mlua::Result<_>>()
            .map_err(|e| ScriptError::Call(e.to_string()))?;

        func.call(mlua::MultiValue::from_vec(lua_args))
            .map(from_lua)
            .map_err(|e| ScriptError::Call(e.to_string()))
    }

    fn notify_element_destroyed(&mut self, _element: ElementId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_call_round_trips_a_number() {
        let mut engine = LuaScriptEngine::new();
        engine.load("lua", "function double(n) return n * 2 end", "test").unwrap();
        let result = engine.call("double", &[ScriptValue::Number(21.0)]).unwrap();
        assert_eq!(result, ScriptValue::Number(42.0));
    }

    #[test]
    fn calling_an_unregistered_function_is_reported_not_panicked() {
        let mut engine = LuaScriptEngine::new();
        assert!(engine.call("missing", &[]).is_err());
    }

    #[test]
    fn unsupported_language_is_rejected_at_load() {
        let mut engine = LuaScriptEngine::new();
        assert!(engine.load("wren", "", "x").is_err());
    }
}
