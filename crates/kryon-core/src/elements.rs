// crates/kryon-core/src/elements.rs
//
// A node in the live UI tree (§3). Properties are a name-unique ordered
// list rather than fixed struct fields: the surface markup can attach any
// property the mapping table knows about (or a custom one), and the
// directive expander needs to clone/rewrite arbitrary property lists.

use crate::{ElementType, EventType, PropertyValue};

pub type ElementId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
    Destroyed,
}

/// An element's ordered, name-unique property list.
#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Insert or replace a property by name, preserving uniqueness.
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub element_type: ElementType,
    /// User-provided `id="..."` attribute, distinct from the numeric `id`.
    pub user_id: Option<String>,
    pub classes: Vec<String>,

    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,

    pub properties: PropertyList,
    pub event_handlers: Vec<(EventType, String)>,

    pub lifecycle: LifecycleState,
    pub visible: bool,
    pub enabled: bool,
    pub layout_dirty: bool,
    pub render_dirty: bool,

    /// Set when this element owns a component instance (§3, §4.6).
    pub component_instance: Option<String>,

    /// Populated only on elements generated by the directive expander,
    /// so re-expansion can tell generated siblings from author-written
    /// ones without relying on position alone.
    pub generated_by_directive: Option<ElementId>,
}

impl Element {
    pub fn new(id: ElementId, element_type: ElementType) -> Self {
        Self {
            id,
            element_type,
            user_id: None,
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            properties: PropertyList::new(),
            event_handlers: Vec::new(),
            lifecycle: LifecycleState::Created,
            visible: true,
            enabled: true,
            layout_dirty: true,
            render_dirty: true,
            component_instance: None,
            generated_by_directive: None,
        }
    }

    pub fn handler_for(&self, event_type: EventType) -> Option<&str> {
        self.event_handlers
            .iter()
            .find(|(ty, _)| *ty == event_type)
            .map(|(_, name)| name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    MouseDown,
    MouseUp,
    MouseMove,
    TextInput,
    KeyDown,
    KeyUp,
    WindowFocus,
    WindowResize,
    Click,
    Hover,
    Focus,
    Blur,
    Change,
    Submit,
}

impl EventType {
    /// Handler property naming convention: `onClick`, `onChange`, ...
    pub fn handler_property_name(self) -> &'static str {
        match self {
            EventType::Click => "on-click",
            EventType::Change => "on-change",
            EventType::Submit => "on-submit",
            EventType::Focus => "on-focus",
            EventType::Blur => "on-blur",
            EventType::MouseDown => "on-mouse-down",
            EventType::MouseUp => "on-mouse-up",
            EventType::MouseMove => "on-mouse-move",
            EventType::TextInput => "on-text-input",
            EventType::KeyDown => "on-key-down",
            EventType::KeyUp => "on-key-up",
            EventType::WindowFocus => "on-window-focus",
            EventType::WindowResize => "on-window-resize",
            EventType::Hover => "on-hover",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_list_preserves_uniqueness() {
        let mut props = PropertyList::new();
        props.set("width", PropertyValue::Float(10.0));
        props.set("width", PropertyValue::Float(20.0));
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("width").unwrap().as_float(), Some(20.0));
    }
}
