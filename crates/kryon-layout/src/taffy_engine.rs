// crates/kryon-layout/src/taffy_engine.rs
//
// Taffy-backed flexbox layout (§4.8). Generalized from a fixed-field
// Element to the name-keyed `PropertyList`: every style lookup goes
// through `element.properties.get(name)` instead of a struct field.
// CSS Grid support is out of scope (the property table kryon-core ships
// has no grid-* entries) so only the flex subset survives here.

use glam::Vec2;
use kryon_core::{Element, ElementId, ElementType, PropertyValue};
use std::collections::HashMap;
use taffy::prelude::*;
use tracing::{debug, warn};

pub struct TaffyLayoutEngine {
    taffy: TaffyTree<ElementId>,
    element_to_node: HashMap<ElementId, taffy::NodeId>,
    layout_cache: HashMap<ElementId, Layout>,
}

/// Elements shorter than this get a floor applied to their measured
/// height/width so empty text/buttons/inputs don't collapse to zero.
const AUTO_SIZE_WIDTH_MIN: f32 = 20.0;
const AUTO_SIZE_HEIGHT_MIN: f32 = 16.0;

impl TaffyLayoutEngine {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            element_to_node: HashMap::new(),
            layout_cache: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.taffy = TaffyTree::new();
        self.element_to_node.clear();
        self.layout_cache.clear();
    }

    pub fn compute_taffy_layout(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        root_element_id: ElementId,
        available_space: Size<f32>,
    ) -> Result<(), taffy::TaffyError> {
        self.clear();

        let root_node = self.build_tree(elements, root_element_id)?;
        let available_space = Size {
            width: AvailableSpace::Definite(available_space.width),
            height: AvailableSpace::Definite(available_space.height),
        };
        self.taffy.compute_layout(root_node, available_space)?;
        self.cache_layouts(elements)?;

        debug!(element_count = elements.len(), "taffy layout computed");
        Ok(())
    }

    pub fn get_layout(&self, element_id: ElementId) -> Option<&Layout> {
        self.layout_cache.get(&element_id)
    }

    /// Directive-shaped elements (`@for`/`@if` templates, per §4.5) never
    /// reach the live tree as renderable nodes, but a defensive skip here
    /// keeps the layout pass correct even if one slips through.
    fn build_tree(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        root_id: ElementId,
    ) -> Result<taffy::NodeId, taffy::TaffyError> {
        let mut sorted: Vec<_> = elements.iter().filter(|(_, e)| !e.element_type.is_directive()).collect();
        sorted.sort_by_key(|(id, _)| **id);

        for (&id, element) in &sorted {
            let style = self.element_style(element);
            let node = self.taffy.new_leaf(style)?;
            self.element_to_node.insert(id, node);
        }

        for (&id, element) in &sorted {
            if let Some(&node) = self.element_to_node.get(&id) {
                let child_nodes: Vec<_> = element
                    .children
                    .iter()
                    .filter_map(|c| self.element_to_node.get(c).copied())
                    .collect();
                if !child_nodes.is_empty() {
                    self.taffy.set_children(node, &child_nodes)?;
                }
            }
        }

        self.element_to_node
            .get(&root_id)
            .copied()
            .ok_or_else(|| taffy::TaffyError::InvalidChildNode(taffy::NodeId::new(0)))
    }

    fn element_style(&self, element: &Element) -> Style {
        let mut style = Style::default();
        self.apply_defaults(&mut style, element);
        self.apply_properties(&mut style, element);
        self.apply_auto_sizing(&mut style, element);
        style
    }

    fn apply_defaults(&self, style: &mut Style, element: &Element) {
        match element.element_type {
            ElementType::App | ElementType::Container => {
                style.display = Display::Flex;
                style.flex_direction = FlexDirection::Row;
            }
            ElementType::Button => {
                style.display = Display::Block;
                style.min_size.width = Dimension::Length(80.0);
                style.min_size.height = Dimension::Length(40.0);
            }
            _ => style.display = Display::Block,
        }
    }

    fn apply_properties(&self, style: &mut Style, element: &Element) {
        let props = &element.properties;

        if let Some(v) = props.get("display").and_then(PropertyValue::as_string) {
            style.display = match v {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "none" => Display::None,
                _ => style.display,
            };
        }
        if let Some(v) = props.get("flex-direction").and_then(PropertyValue::as_string) {
            style.flex_direction = match v {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                "row-reverse" => FlexDirection::RowReverse,
                "column-reverse" => FlexDirection::ColumnReverse,
                other => {
                    warn!(value = other, "unrecognized flex-direction, defaulting to row");
                    FlexDirection::Row
                }
            };
        }
        if let Some(v) = props.get("align-items").and_then(PropertyValue::as_string) {
            style.align_items = Some(match v {
                "center" => AlignItems::Center,
                "end" | "flex-end" => AlignItems::End,
                "stretch" => AlignItems::Stretch,
                "baseline" => AlignItems::Baseline,
                _ => AlignItems::Start,
            });
        }
        if let Some(v) = props.get("justify-content").and_then(PropertyValue::as_string) {
            style.justify_content = Some(match v {
                "center" => JustifyContent::Center,
                "end" | "flex-end" => JustifyContent::End,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => JustifyContent::Start,
            });
        }
        if let Some(gap) = props.get("gap").and_then(PropertyValue::as_float) {
            style.gap = Size {
                width: LengthPercentage::Length(gap as f32),
                height: LengthPercentage::Length(gap as f32),
            };
        }
        if let Some(padding) = props.get("padding").and_then(PropertyValue::as_float) {
            let p = LengthPercentage::Length(padding as f32);
            style.padding = Rect { left: p, right: p, top: p, bottom: p };
        }
        if let Some(margin) = props.get("margin").and_then(PropertyValue::as_float) {
            let m: LengthPercentageAuto = LengthPercentage::Length(margin as f32).into();
            style.margin = Rect { left: m, right: m, top: m, bottom: m };
        }
        let fills_viewport = matches!(element.element_type, ElementType::App | ElementType::Container);
        if let Some(width) = props.get("width").and_then(PropertyValue::as_float) {
            style.size.width = Dimension::Length(width as f32);
        } else if fills_viewport {
            style.size.width = Dimension::Percent(1.0);
        }
        if let Some(height) = props.get("height").and_then(PropertyValue::as_float) {
            style.size.height = Dimension::Length(height as f32);
        } else if element.element_type == ElementType::App {
            style.size.height = Dimension::Percent(1.0);
        }
        if let Some(v) = props.get("min-width").and_then(PropertyValue::as_float) {
            style.min_size.width = Dimension::Length(v as f32);
        }
        if let Some(v) = props.get("min-height").and_then(PropertyValue::as_float) {
            style.min_size.height = Dimension::Length(v as f32);
        }
        if let Some(v) = props.get("max-width").and_then(PropertyValue::as_float) {
            style.max_size.width = Dimension::Length(v as f32);
        }
        if let Some(v) = props.get("max-height").and_then(PropertyValue::as_float) {
            style.max_size.height = Dimension::Length(v as f32);
        }
    }

    /// §4.8 auto-sizing floor: Text/Button/Input elements with no
    /// explicit size fall back to a minimum footprint instead of
    /// collapsing to a zero-size box.
    fn apply_auto_sizing(&self, style: &mut Style, element: &Element) {
        if !matches!(element.element_type, ElementType::Text | ElementType::Button | ElementType::Input) {
            return;
        }
        if style.size.width == Dimension::Auto && style.min_size.width == Dimension::Auto {
            style.min_size.width = Dimension::Length(AUTO_SIZE_WIDTH_MIN);
        }
        if style.size.height == Dimension::Auto && style.min_size.height == Dimension::Auto {
            style.min_size.height = Dimension::Length(AUTO_SIZE_HEIGHT_MIN);
        }
    }

    fn cache_layouts(&mut self, elements: &HashMap<ElementId, Element>) -> Result<(), taffy::TaffyError> {
        for &id in elements.keys() {
            if let Some(&node) = self.element_to_node.get(&id) {
                let layout = *self.taffy.layout(node)?;
                self.layout_cache.insert(id, layout);
            }
        }
        Ok(())
    }

    fn compute_absolute_positions(
        &self,
        elements: &HashMap<ElementId, Element>,
        element_id: ElementId,
        parent_offset: Vec2,
        computed_positions: &mut HashMap<ElementId, Vec2>,
        computed_sizes: &mut HashMap<ElementId, Vec2>,
    ) {
        let Some(element) = elements.get(&element_id) else { return };
        let Some(layout) = self.get_layout(element_id) else { return };

        computed_sizes.insert(element_id, Vec2::new(layout.size.width, layout.size.height));
        let position = parent_offset + Vec2::new(layout.location.x, layout.location.y);
        computed_positions.insert(element_id, position);

        for &child_id in &element.children {
            self.compute_absolute_positions(elements, child_id, position, computed_positions, computed_sizes);
        }
    }
}

impl Default for TaffyLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::LayoutEngine for TaffyLayoutEngine {
    fn compute_layout(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        root_id: ElementId,
        viewport_size: Vec2,
    ) -> crate::LayoutResult {
        let size = Size { width: viewport_size.x, height: viewport_size.y };

        if let Err(e) = self.compute_taffy_layout(elements, root_id, size) {
            tracing::error!(error = %e, "taffy layout computation failed");
            return crate::LayoutResult::default();
        }

        let mut result = crate::LayoutResult::default();
        self.compute_absolute_positions(elements, root_id, Vec2::ZERO, &mut result.computed_positions, &mut result.computed_sizes);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::PropertyValue;

    fn elem(id: ElementId, ty: ElementType) -> Element {
        Element::new(id, ty)
    }

    #[test]
    fn root_container_fills_viewport() {
        let mut elements = HashMap::new();
        elements.insert(1, elem(1, ElementType::App));

        let mut engine = TaffyLayoutEngine::new();
        let result = crate::LayoutEngine::compute_layout(&mut engine, &elements, 1, Vec2::new(800.0, 600.0));

        let size = result.computed_sizes.get(&1).expect("root should have a computed size");
        assert_eq!(*size, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn child_positions_accumulate_parent_offset() {
        let mut root = elem(1, ElementType::Container);
        root.properties.set("padding", PropertyValue::Float(10.0));
        root.children.push(2);
        let mut child = elem(2, ElementType::Container);
        child.parent = Some(1);
        child.properties.set("width", PropertyValue::Float(50.0));
        child.properties.set("height", PropertyValue::Float(50.0));

        let mut elements = HashMap::new();
        elements.insert(1, root);
        elements.insert(2, child);

        let mut engine = TaffyLayoutEngine::new();
        let result = crate::LayoutEngine::compute_layout(&mut engine, &elements, 1, Vec2::new(800.0, 600.0));

        let child_pos = result.computed_positions.get(&2).unwrap();
        assert!(child_pos.x >= 10.0);
        assert!(child_pos.y >= 10.0);
    }

    #[test]
    fn empty_text_element_gets_minimum_footprint() {
        let mut elements = HashMap::new();
        elements.insert(1, elem(1, ElementType::Container));
        elements.get_mut(&1).unwrap().children.push(2);
        let mut text = elem(2, ElementType::Text);
        text.parent = Some(1);
        elements.insert(2, text);

        let mut engine = TaffyLayoutEngine::new();
        let result = crate::LayoutEngine::compute_layout(&mut engine, &elements, 1, Vec2::new(800.0, 600.0));

        let size = result.computed_sizes.get(&2).unwrap();
        assert!(size.x >= AUTO_SIZE_WIDTH_MIN);
        assert!(size.y >= AUTO_SIZE_HEIGHT_MIN);
    }
}
