// crates/kryon-layout/src/lib.rs

use glam::Vec2;
use kryon_core::{Element, ElementId};
use std::collections::HashMap;

pub mod taffy_engine;

pub use taffy_engine::TaffyLayoutEngine;

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub computed_positions: HashMap<ElementId, Vec2>,
    pub computed_sizes: HashMap<ElementId, Vec2>,
}

pub trait LayoutEngine {
    fn compute_layout(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        root_id: ElementId,
        viewport_size: Vec2,
    ) -> LayoutResult;
}
