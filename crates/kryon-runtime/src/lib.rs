// crates/kryon-runtime/src/lib.rs
//
// The orchestrator (§2 control flow, §5): owns the live element tree,
// the reactive registries, the event/hit-test pipeline, and the script
// and layout collaborators, and drives the load -> update -> render
// loop a host (the `kryon` CLI, or any embedder) calls into. Nothing in
// this crate talks to a GPU, a window system, or a concrete interpreter
// beyond the `RenderBackend`/`ScriptEngine` contracts.

pub mod binding;
pub mod component;
pub mod directives;
pub mod error;
pub mod event_system;
pub mod script;

pub use binding::Binder;
pub use component::{ComponentInstance, ComponentInstanceManager, StateTable, StateValue};
pub use error::{ErrorLog, LoggedError, Result, RuntimeError};
pub use event_system::{classify, hit_test, EventQueue, Listener, ListenerRegistry};
pub use script::{ScriptEngine, ScriptError, ScriptRecord, ScriptRegistry, ScriptValue};

use glam::{Vec2, Vec4};
use kryon_core::{
    krb, ComponentDefinition, Element, ElementId, ElementTree, EventType, PropertyValue,
    VariableRegistry,
};
use kryon_layout::{LayoutEngine, LayoutResult, TaffyLayoutEngine};
use kryon_render::{EmitContext, InputEvent, MouseButton, RenderBackend};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

#[cfg(feature = "lua-vm")]
use script::lua::LuaScriptEngine;

/// A cloneable handle a host's input driver can hold on another thread
/// and enqueue through (§5: "thread-safe enqueue"). The runtime thread
/// alone drains it, in `Runtime::update`.
#[derive(Clone)]
pub struct EventSender(mpsc::Sender<InputEvent>);

impl EventSender {
    pub fn send(&self, event: InputEvent) {
        // A closed receiver only happens after the `Runtime` is dropped;
        // nothing to report back to for a detached input thread.
        let _ = self.0.send(event);
    }
}

/// Static, definition-side component data plus the template subtree
/// cloned into every instance's usage site (§4.6).
type ComponentCatalog = HashMap<String, (ComponentDefinition, krb::KrbElement)>;

pub struct Runtime {
    tree: ElementTree,
    vars: VariableRegistry,
    components: ComponentInstanceManager,
    component_defs: ComponentCatalog,
    scripts: ScriptRegistry,
    script_engine: Box<dyn ScriptEngine>,
    events: EventQueue,
    event_tx: mpsc::Sender<InputEvent>,
    event_rx: mpsc::Receiver<InputEvent>,
    listeners: ListenerRegistry,
    errors: ErrorLog,
    layout_engine: TaffyLayoutEngine,
    layout_result: LayoutResult,
    viewport_size: Vec2,
    hovered: Option<ElementId>,
    pressed: Option<ElementId>,
    needs_layout: bool,
    debug_inspector: bool,
}

impl Runtime {
    /// Read and parse a `.krb` file from disk, then build the live
    /// runtime from it (§4.1 load contract).
    pub fn load(path: &str) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(kryon_core::KryonError::Io)?;
        let document = krb::parse(&bytes)?;
        Self::from_document(document)
    }

    /// Build the live runtime from an already-parsed `KrbDocument`,
    /// skipping the file read. Exposed as its own entry point the way a
    /// loader typically offers both a path-based and an in-memory
    /// constructor; this is what the test suite drives directly.
    pub fn from_document(document: krb::KrbDocument) -> Result<Self> {
        let mut vars = VariableRegistry::new();
        for variable in &document.variables {
            vars.set(variable.name.clone(), variable.value.clone());
        }

        let mut component_defs = ComponentCatalog::new();
        for component in &document.components {
            component_defs.insert(
                component.definition.name.clone(),
                (component.definition.clone(), component.template.clone()),
            );
        }

        let mut tree = ElementTree::new();
        let mut components = ComponentInstanceManager::new();
        let mut errors = ErrorLog::new();
        build_element(&mut tree, &document.root, None, &component_defs, &mut components, &mut errors);

        let mut scripts = ScriptRegistry::new();
        let mut script_engine = default_script_engine();
        for script in &document.scripts {
            scripts.register(ScriptRecord {
                name: script.name.clone(),
                language: script.language.clone(),
                source: script.code.clone(),
            });
            if let Err(e) = script_engine.load(&script.language, &script.code, &script.name) {
                errors.push(format!("failed to load script '{}': {e}", script.name));
            }
        }

        let destroyed = directives::expand_all(&mut tree, &vars, &mut errors);
        for element in destroyed {
            script_engine.notify_element_destroyed(element.id);
        }

        let mut viewport_size = Vec2::new(800.0, 600.0);
        if let Some(root_id) = tree.root() {
            if let Some(root) = tree.get(root_id) {
                if let Some(w) = root.properties.get("width").and_then(|v| v.as_float()) {
                    viewport_size.x = w as f32;
                }
                if let Some(h) = root.properties.get("height").and_then(|v| v.as_float()) {
                    viewport_size.y = h as f32;
                }
            }
        }

        let (event_tx, event_rx) = mpsc::channel();

        let mut runtime = Self {
            tree,
            vars,
            components,
            component_defs,
            scripts,
            script_engine,
            events: EventQueue::new(),
            event_tx,
            event_rx,
            listeners: ListenerRegistry::new(),
            errors,
            layout_engine: TaffyLayoutEngine::new(),
            layout_result: LayoutResult::default(),
            viewport_size,
            hovered: None,
            pressed: None,
            needs_layout: true,
            debug_inspector: false,
        };
        runtime.recompute_layout();
        Ok(runtime)
    }

    /// A cloneable sender a host's input thread can hold onto.
    pub fn event_sender(&self) -> EventSender {
        EventSender(self.event_tx.clone())
    }

    /// Enqueue an event from the same thread the runtime runs on; a
    /// convenience over `event_sender` for single-threaded hosts (the
    /// `kryon` CLI's headless `run` loop).
    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn register_listener(&mut self, event_type: EventType, callback: Box<dyn FnMut(&Element) -> bool>) {
        self.listeners.register(event_type, callback);
    }

    /// One frame's worth of logic (§2, §5): drain queued input,
    /// advance lifecycle, re-expand directives if reactive state
    /// changed, and recompute layout if anything asked for it.
    pub fn update(&mut self, _delta: Duration) -> Result<()> {
        while let Ok(event) = self.event_rx.try_recv() {
            self.events.push(event);
        }
        for event in self.events.drain() {
            self.process_event(event);
        }

        self.tree.advance_lifecycle();

        if self.vars.take_needs_update() {
            self.tree.mark_all_render_dirty();
            let destroyed = directives::expand_all(&mut self.tree, &self.vars, &mut self.errors);
            for element in destroyed {
                self.script_engine.notify_element_destroyed(element.id);
                if let Some(instance_id) = &element.component_instance {
                    self.components.destroy(instance_id);
                }
            }
            self.needs_layout = true;
        }

        if self.needs_layout {
            self.recompute_layout();
            self.needs_layout = false;
        }

        Ok(())
    }

    /// Traverse, emit, and hand the frame's command buffer to `backend`
    /// (§4.9, §6). A no-op if the tree has no root yet.
    pub fn render<B: RenderBackend>(&mut self, backend: &mut B) -> Result<()> {
        let Some(root) = self.tree.root() else { return Ok(()) };

        let binder = Binder::new(&self.tree, &self.vars, &self.components);
        let measure = |text: &str, font_size: f32| backend.measure_text_width(text, font_size);
        let ctx = EmitContext {
            tree: &self.tree,
            layout: &self.layout_result,
            accessor: &binder,
            hovered: self.hovered,
            measure_text: &measure,
        };
        let output = kryon_render::emit_frame(&ctx, root);

        let clear_color = Vec4::new(0.1, 0.1, 0.1, 1.0);
        let mut frame_ctx = backend.begin_frame(clear_color)?;
        backend.execute_commands(&mut frame_ctx, &output.commands)?;
        backend.end_frame(frame_ctx)?;
        backend.set_cursor(output.cursor);
        Ok(())
    }

    fn recompute_layout(&mut self) {
        if let Some(root) = self.tree.root() {
            let elements = self.tree.to_element_map();
            self.layout_result = self.layout_engine.compute_layout(&elements, root, self.viewport_size);
        }
    }

    fn hit_test_point(&self, point: Vec2) -> Option<ElementId> {
        let root = self.tree.root()?;
        hit_test(&self.tree, &self.layout_result, root, point)
    }

    /// §4.7 per-event algorithm: classify, hit-test, dispatch, plus the
    /// window-resize and debug-inspector side effects that aren't part
    /// of the shared classify/hit-test path.
    fn process_event(&mut self, event: InputEvent) {
        let (position, event_type) = classify(&event);

        if let InputEvent::Resize { size } = &event {
            self.viewport_size = *size;
            self.vars.set("root.width", size.x.to_string());
            self.vars.set("root.height", size.y.to_string());
            self.needs_layout = true;
        }

        if let InputEvent::KeyPress { key, modifiers } = &event {
            if modifiers.ctrl && matches!(key, kryon_render::KeyCode::Character('i') | kryon_render::KeyCode::Character('I')) {
                self.debug_inspector = !self.debug_inspector;
                tracing::info!(enabled = self.debug_inspector, "debug inspector toggled (inspector UI itself is out of scope)");
            }
        }

        let hit = position.and_then(|p| self.hit_test_point(p));

        if event_type == EventType::MouseMove {
            self.hovered = hit;
        }

        if let Some(target) = hit {
            self.dispatch(target, event_type);
        }

        match event_type {
            EventType::MouseDown => self.pressed = hit,
            EventType::MouseUp => {
                if hit.is_some() && hit == self.pressed {
                    if let Some(target) = hit {
                        self.dispatch(target, EventType::Click);
                    }
                }
                self.pressed = None;
            }
            _ => {}
        }
    }

    /// Listener registry first (registration order, first handler to
    /// return `true` wins), then the element's own `on-*` property or
    /// declared handler, dispatched by name through the script engine.
    /// Script errors are logged, never fatal to the frame (§4.8).
    fn dispatch(&mut self, target: ElementId, event_type: EventType) {
        let Some(element) = self.tree.get(target) else { return };
        if self.listeners.dispatch(event_type, element) {
            return;
        }

        let handler = element
            .properties
            .get(event_type.handler_property_name())
            .and_then(|v| match v {
                PropertyValue::Function(name) => Some(name.clone()),
                _ => None,
            })
            .or_else(|| element.handler_for(event_type).map(str::to_string));

        if let Some(name) = handler {
            if let Err(e) = self.script_engine.call(&name, &[]) {
                self.errors.push(format!("script call '{name}' failed: {e}"));
            }
        }
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn vars_mut(&mut self) -> &mut VariableRegistry {
        &mut self.vars
    }

    pub fn component_instances(&self) -> &ComponentInstanceManager {
        &self.components
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    pub fn drain_errors(&mut self) -> Vec<LoggedError> {
        self.errors.drain()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn get_element_by_user_id(&self, id: &str) -> Option<&Element> {
        self.tree.iter().find(|(_, e)| e.user_id.as_deref() == Some(id)).map(|(_, e)| e)
    }
}

fn default_script_engine() -> Box<dyn ScriptEngine> {
    #[cfg(feature = "lua-vm")]
    {
        Box::new(LuaScriptEngine::new())
    }
    #[cfg(not(feature = "lua-vm"))]
    {
        Box::new(script::NullEngine)
    }
}

/// The text a component-instantiation param override takes: only the
/// variants a KRB attribute can plausibly carry as a scalar.
fn stringify(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Function(s) => s.clone(),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Float(f) => f.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Array(items) => items.join(","),
        _ => String::new(),
    }
}

/// Recursively materialize a `KrbElement` subtree into the live arena.
/// A usage site is recognized by a `component` STRING property naming a
/// definition (the wire format has no other way to connect an
/// `ElementType::Custom` usage hex to a `"COMP"`-section definition by
/// name) — see the design note this resolves in `DESIGN.md`.
fn build_element(
    tree: &mut ElementTree,
    node: &krb::KrbElement,
    parent: Option<ElementId>,
    defs: &ComponentCatalog,
    components: &mut ComponentInstanceManager,
    errors: &mut ErrorLog,
) -> ElementId {
    let id = tree.alloc_id();
    let mut element = Element::new(id, node.element_type);
    element.user_id = node.user_id.clone();
    element.classes = node.classes.clone();
    element.event_handlers = node.event_handlers.clone();
    for (name, value) in &node.properties {
        element.properties.set(name.clone(), value.clone());
    }
    tree.insert(element, parent);

    for child in &node.children {
        build_element(tree, child, Some(id), defs, components, errors);
    }

    let component_name = tree
        .get(id)
        .and_then(|e| e.properties.get("component"))
        .and_then(|v| v.as_string())
        .map(str::to_string);
    if let Some(component_name) = component_name {
        instantiate_component(tree, id, &component_name, defs, components, errors);
    }

    id
}

/// Allocate a component instance for `usage_id` and graft the
/// definition's template onto it: declared params become overrides,
/// template properties fill in anything the usage site didn't already
/// set, and the template's children become the usage element's
/// rendered content (§3, §4.6).
fn instantiate_component(
    tree: &mut ElementTree,
    usage_id: ElementId,
    component_name: &str,
    defs: &ComponentCatalog,
    components: &mut ComponentInstanceManager,
    errors: &mut ErrorLog,
) {
    let Some((definition, template)) = defs.get(component_name) else {
        errors.push(format!("component '{component_name}' is not defined"));
        return;
    };

    let mut overrides = HashMap::new();
    if let Some(usage) = tree.get(usage_id) {
        for param in &definition.params {
            if let Some(value) = usage.properties.get(&param.name) {
                overrides.insert(param.name.clone(), stringify(value));
            }
        }
    }
    let user_id = tree.get(usage_id).and_then(|e| e.user_id.clone());

    match components.instantiate(definition, user_id.as_deref(), usage_id, &overrides) {
        Ok(instance_id) => {
            if let Some(element) = tree.get_mut(usage_id) {
                element.component_instance = Some(instance_id);
            }
            for (name, value) in &template.properties {
                if let Some(element) = tree.get_mut(usage_id) {
                    if element.properties.get(name).is_none() {
                        element.properties.set(name.clone(), value.clone());
                    }
                }
            }
            for child in &template.children {
                build_element(tree, child, Some(usage_id), defs, components, errors);
            }
        }
        Err(e) => errors.push(e.to_string()),
    }
}
