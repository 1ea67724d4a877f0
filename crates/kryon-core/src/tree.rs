// crates/kryon-core/src/tree.rs
//
// The element tree (§3, §4.4): a flat arena keyed by `ElementId`. The
// arena *is* the runtime's registry — parent/children links are plain
// ids (borrows), not `Rc`/`RefCell` cycles, so destruction is just a map
// removal once descendants are gone. This sidesteps the cyclic
// parent-pointer problem called out in §9's design notes without
// introducing unsafe code or a GC.

use crate::{Element, ElementId, LifecycleState};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ElementTree {
    elements: HashMap<ElementId, Element>,
    root: Option<ElementId>,
    next_id: ElementId,
}

impl ElementTree {
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            root: None,
            next_id: 1,
        }
    }

    pub fn alloc_id(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn set_root(&mut self, id: ElementId) {
        self.root = Some(id);
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &Element)> {
        self.elements.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    /// Insert a freshly-allocated element as a child of `parent` (or as
    /// the root if `parent` is `None`). The parent->child edge is
    /// appended once; uniqueness (no element appears twice in one
    /// parent's children) is the caller's responsibility via `alloc_id`
    /// giving out ids only once.
    pub fn insert(&mut self, mut element: Element, parent: Option<ElementId>) -> ElementId {
        let id = element.id;
        element.parent = parent;
        if let Some(parent_id) = parent {
            if let Some(p) = self.elements.get_mut(&parent_id) {
                if !p.children.contains(&id) {
                    p.children.push(id);
                }
            }
        } else {
            self.root = Some(id);
        }
        self.elements.insert(id, element);
        id
    }

    /// Insert `child` into `parent`'s children at `index`, used by the
    /// directive expander to keep generated siblings ordered right after
    /// the directive node.
    pub fn insert_at(&mut self, mut element: Element, parent: ElementId, index: usize) {
        let id = element.id;
        element.parent = Some(parent);
        if let Some(p) = self.elements.get_mut(&parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        self.elements.insert(id, element);
    }

    pub fn index_in_parent(&self, id: ElementId) -> Option<usize> {
        let parent = self.elements.get(&id)?.parent?;
        self.elements.get(&parent)?.children.iter().position(|c| *c == id)
    }

    /// Cascade-destroy: children first (reverse order), then unlink from
    /// the parent's children list and drop from the registry. Returns the
    /// removed elements, deepest-first, so callers (script integration)
    /// can run cleanup hooks in the same order and inspect what left the
    /// tree (component back-pointers, ids) before the slots are gone.
    pub fn destroy_subtree(&mut self, id: ElementId) -> Vec<Element> {
        let mut removed = Vec::new();
        self.destroy_recursive(id, &mut removed);
        if let Some(element) = self.elements.get(&id) {
            if let Some(parent_id) = element.parent {
                if let Some(parent) = self.elements.get_mut(&parent_id) {
                    parent.children.retain(|c| *c != id);
                }
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        removed
    }

    fn destroy_recursive(&mut self, id: ElementId, removed: &mut Vec<Element>) {
        let children = self.elements.get(&id).map(|e| e.children.clone()).unwrap_or_default();
        for child in children.into_iter().rev() {
            self.destroy_recursive(child, removed);
        }
        if let Some(mut element) = self.elements.remove(&id) {
            element.lifecycle = LifecycleState::Destroyed;
            removed.push(element);
        }
    }

    /// Remove every sibling after `after_id` in `parent`'s children list;
    /// used by the `@for`/`@if` expander to clear previously-generated
    /// output before regenerating it. Returns the destroyed elements.
    pub fn destroy_generated_after(&mut self, parent: ElementId, after_id: ElementId) -> Vec<Element> {
        let tail: Vec<ElementId> = match self.elements.get(&parent) {
            Some(p) => match p.children.iter().position(|c| *c == after_id) {
                Some(idx) => p.children[idx + 1..].to_vec(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        let mut removed = Vec::new();
        for child in tail {
            removed.extend(self.destroy_subtree(child));
        }
        removed
    }

    /// Snapshot the arena into a plain map, for collaborators (the layout
    /// engine) whose contract predates the arena and still expects
    /// `&HashMap<ElementId, Element>`.
    pub fn to_element_map(&self) -> HashMap<ElementId, Element> {
        self.elements.clone()
    }

    pub fn mark_all_render_dirty(&mut self) {
        for element in self.elements.values_mut() {
            element.render_dirty = true;
        }
    }

    pub fn mark_render_dirty(&mut self, id: ElementId) {
        if let Some(e) = self.elements.get_mut(&id) {
            e.render_dirty = true;
        }
    }

    /// Advance the lifecycle state machine one step for every live
    /// element: `Created -> Mounting -> Mounted`, `Updating -> Mounted`.
    /// `Unmounting`/`Destroyed` elements are handled by
    /// [`destroy_subtree`] directly since they leave the arena.
    pub fn advance_lifecycle(&mut self) {
        for element in self.elements.values_mut() {
            element.lifecycle = match element.lifecycle {
                LifecycleState::Created => LifecycleState::Mounting,
                LifecycleState::Mounting => LifecycleState::Mounted,
                LifecycleState::Updating => LifecycleState::Mounted,
                other => other,
            };
        }
    }

    /// §8 invariant 1: every element except root has exactly one parent,
    /// and appears in that parent's children exactly once.
    #[cfg(any(test, feature = "invariant-checks"))]
    pub fn check_tree_integrity(&self) -> std::result::Result<(), String> {
        for (id, element) in &self.elements {
            if let Some(parent_id) = element.parent {
                let parent = self
                    .elements
                    .get(&parent_id)
                    .ok_or_else(|| format!("element {id} has missing parent {parent_id}"))?;
                let occurrences = parent.children.iter().filter(|c| *c == id).count();
                if occurrences != 1 {
                    return Err(format!(
                        "element {id} appears {occurrences} times in parent {parent_id}'s children"
                    ));
                }
            } else if Some(*id) != self.root {
                return Err(format!("element {id} has no parent and is not root"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    fn mk(tree: &mut ElementTree, parent: Option<ElementId>) -> ElementId {
        let id = tree.alloc_id();
        tree.insert(Element::new(id, ElementType::Container), parent)
    }

    #[test]
    fn destroy_subtree_removes_all_descendants() {
        let mut tree = ElementTree::new();
        let root = mk(&mut tree, None);
        let child = mk(&mut tree, Some(root));
        let grandchild = mk(&mut tree, Some(child));

        let removed = tree.destroy_subtree(child);
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.get(root).unwrap().children.is_empty());
    }

    #[test]
    fn tree_integrity_holds_after_mutation() {
        let mut tree = ElementTree::new();
        let root = mk(&mut tree, None);
        let a = mk(&mut tree, Some(root));
        let _b = mk(&mut tree, Some(root));
        tree.destroy_subtree(a);
        assert!(tree.check_tree_integrity().is_ok());
    }

    #[test]
    fn destroy_generated_after_clears_only_tail() {
        let mut tree = ElementTree::new();
        let root = mk(&mut tree, None);
        let for_node = mk(&mut tree, Some(root));
        let gen_a = mk(&mut tree, Some(root));
        let gen_b = mk(&mut tree, Some(root));

        let removed = tree.destroy_generated_after(root, for_node);
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(gen_a));
        assert!(!tree.contains(gen_b));
        assert_eq!(tree.get(root).unwrap().children, vec![for_node]);
    }
}
