// crates/kryon-runtime/src/event_system.rs
//
// The event queue and hit-test/dispatch pipeline (§4.7). The queue is a
// single-producer single-consumer ring that doubles on overflow rather
// than a plain `Vec` push, so a host input driver filling it faster than
// a stalled update loop drains doesn't pay an O(n) shift per push.

use glam::Vec2;
use kryon_core::{Element, ElementId, ElementTree, EventType};
use kryon_layout::LayoutResult;
use kryon_render::InputEvent;

const INITIAL_CAPACITY: usize = 16;

/// An amortized-O(1) ring buffer. `push` never blocks or drops; it grows.
#[derive(Debug)]
pub struct EventQueue {
    slots: Vec<Option<InputEvent>>,
    head: usize,
    len: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self { slots: (0..INITIAL_CAPACITY).map(|_| None).collect(), head: 0, len: 0 }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(event);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<InputEvent> {
        if self.len == 0 {
            return None;
        }
        let event = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        event
    }

    /// Drain everything currently queued, in FIFO arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::with_capacity(self.len);
        while let Some(event) = self.pop() {
            out.push(event);
        }
        out
    }

    fn grow(&mut self) {
        let new_capacity = (self.slots.len() * 2).max(1);
        let mut new_slots: Vec<Option<InputEvent>> = (0..new_capacity).map(|_| None).collect();
        for i in 0..self.len {
            new_slots[i] = self.slots[(self.head + i) % self.slots.len()].take();
        }
        self.slots = new_slots;
        self.head = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Walk the tree in render order (parents before children); the deepest
/// visible element whose computed bounds contain `point` wins.
pub fn hit_test(tree: &ElementTree, layout: &LayoutResult, root: ElementId, point: Vec2) -> Option<ElementId> {
    let element = tree.get(root)?;
    if !element.visible || element.element_type.is_directive() {
        return None;
    }

    let mut deepest = None;
    if element_contains(layout, root, point) {
        deepest = Some(root);
    }
    for &child in &element.children {
        if let Some(hit) = hit_test(tree, layout, child, point) {
            deepest = Some(hit);
        }
    }
    deepest
}

fn element_contains(layout: &LayoutResult, id: ElementId, point: Vec2) -> bool {
    let Some(pos) = layout.computed_positions.get(&id) else { return false };
    let Some(size) = layout.computed_sizes.get(&id) else { return false };
    point.x >= pos.x && point.x <= pos.x + size.x && point.y >= pos.y && point.y <= pos.y + size.y
}

/// A single registered listener: a stable registration order is the
/// dispatch order (§4.7 determinism), and the first one to return
/// `true` ("handled") stops the chain.
pub struct Listener {
    pub event_type: EventType,
    pub callback: Box<dyn FnMut(&Element) -> bool>,
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event_type: EventType, callback: Box<dyn FnMut(&Element) -> bool>) {
        self.listeners.push(Listener { event_type, callback });
    }

    /// Invoke every registered listener of `event_type`, in registration
    /// order, against `target`; stop at the first one that handles it.
    pub fn dispatch(&mut self, event_type: EventType, target: &Element) -> bool {
        for listener in self.listeners.iter_mut().filter(|l| l.event_type == event_type) {
            if (listener.callback)(target) {
                return true;
            }
        }
        false
    }
}

/// §4.7 step 1-2: which element an `InputEvent` targets (if it carries a
/// screen position) and the `EventType` it maps to for handler lookup.
pub fn classify(event: &InputEvent) -> (Option<Vec2>, EventType) {
    match event {
        InputEvent::MouseMove { position } => (Some(*position), EventType::MouseMove),
        InputEvent::MousePress { position, .. } => (Some(*position), EventType::MouseDown),
        InputEvent::MouseRelease { position, .. } => (Some(*position), EventType::MouseUp),
        InputEvent::TextInput { .. } => (None, EventType::TextInput),
        InputEvent::KeyPress { .. } => (None, EventType::KeyDown),
        InputEvent::KeyRelease { .. } => (None, EventType::KeyUp),
        InputEvent::WindowFocus { .. } => (None, EventType::WindowFocus),
        InputEvent::Resize { .. } => (None, EventType::WindowResize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo_across_growth() {
        let mut queue = EventQueue::new();
        for i in 0..40 {
            queue.push(InputEvent::TextInput { text: i.to_string() });
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), 40);
        if let InputEvent::TextInput { text } = &drained[0] {
            assert_eq!(text, "0");
        } else {
            panic!("wrong variant");
        }
        if let InputEvent::TextInput { text } = &drained[39] {
            assert_eq!(text, "39");
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn queue_survives_interleaved_push_pop_around_wraparound() {
        let mut queue = EventQueue::new();
        for i in 0..INITIAL_CAPACITY - 1 {
            queue.push(InputEvent::TextInput { text: i.to_string() });
        }
        for _ in 0..INITIAL_CAPACITY - 2 {
            queue.pop();
        }
        queue.push(InputEvent::TextInput { text: "wrapped".to_string() });
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
    }

    #[test]
    fn listener_dispatch_stops_at_first_handler() {
        let mut registry = ListenerRegistry::new();
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let c1 = calls.clone();
        registry.register(
            EventType::Click,
            Box::new(move |_| {
                c1.borrow_mut().push(1);
                true
            }),
        );
        let c2 = calls.clone();
        registry.register(
            EventType::Click,
            Box::new(move |_| {
                c2.borrow_mut().push(2);
                true
            }),
        );

        let element = Element::new(1, kryon_core::ElementType::Button);
        let handled = registry.dispatch(EventType::Click, &element);
        assert!(handled);
        assert_eq!(*calls.borrow(), vec![1]);
    }
}
