// crates/kryon-render/src/test.rs
//
// The one `RenderBackend` implementation this workspace ships. Concrete
// GPU/terminal/native-widget back-ends are out of scope (§1); this one
// records the commands it was handed so the CLI's `run` subcommand and
// the runtime/render test suites can drive a full frame headlessly.

use crate::backend::{RenderBackend, RenderError, RenderResult};
use crate::command::{CursorType, RenderCommand};
use glam::Vec4;

#[derive(Debug, Default)]
pub struct NullBackend {
    pub frames_begun: u32,
    pub frames_ended: u32,
    pub last_commands: Vec<RenderCommand>,
    pub last_cursor: Option<CursorType>,
    pub fail_next_begin: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for NullBackend {
    type Context = ();

    fn begin_frame(&mut self, _clear_color: Vec4) -> RenderResult<Self::Context> {
        if self.fail_next_begin {
            self.fail_next_begin = false;
            return Err(RenderError::SurfaceLost);
        }
        self.frames_begun += 1;
        self.last_commands.clear();
        Ok(())
    }

    fn execute_commands(&mut self, _ctx: &mut Self::Context, commands: &[RenderCommand]) -> RenderResult<()> {
        self.last_commands.extend(commands.iter().cloned());
        Ok(())
    }

    fn end_frame(&mut self, _ctx: Self::Context) -> RenderResult<()> {
        self.frames_ended += 1;
        Ok(())
    }

    fn set_cursor(&mut self, cursor: CursorType) {
        self.last_cursor = Some(cursor);
    }

    fn measure_text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_lost_aborts_frame_once() {
        let mut backend = NullBackend::new();
        backend.fail_next_begin = true;
        assert!(backend.begin_frame(Vec4::ZERO).is_err());
        assert!(backend.begin_frame(Vec4::ZERO).is_ok());
        assert_eq!(backend.frames_begun, 1);
    }
}
