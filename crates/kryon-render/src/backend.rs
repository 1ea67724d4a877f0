// crates/kryon-render/src/backend.rs
//
// The small V-table a concrete rendering back-end implements (§6). The
// runtime core never talks to a GPU, a terminal, or a native widget
// toolkit directly; it only ever holds a `&mut dyn RenderBackend`.

use crate::command::{CursorType, RenderCommand};
use glam::Vec4;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface lost")]
    SurfaceLost,
    #[error("fatal backend error: {0}")]
    Fatal(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Opaque per-frame handle a back-end hands back from `begin_frame` and
/// receives again in `execute_commands`/`end_frame`. Back-ends that need
/// no per-frame state can use `()`.
pub trait RenderBackend {
    type Context;

    fn begin_frame(&mut self, clear_color: Vec4) -> RenderResult<Self::Context>;
    fn execute_commands(&mut self, ctx: &mut Self::Context, commands: &[RenderCommand]) -> RenderResult<()>;
    fn end_frame(&mut self, ctx: Self::Context) -> RenderResult<()>;

    /// Optional: most terminal/headless back-ends have no real cursor.
    fn set_cursor(&mut self, _cursor: CursorType) {}

    /// Optional: used by the auto-sizing pass (§4.9) for `Text`/`Button`
    /// width when no explicit `width` property is set. Back-ends without
    /// real text shaping may return a crude estimate.
    fn measure_text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }
}
