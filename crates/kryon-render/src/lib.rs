// crates/kryon-render/src/lib.rs
//
// The render-command emitter and the back-end contract (§4.9, §6).
// Concrete GPU/terminal/native-widget back-ends are out of scope for
// this workspace; the only collaborator they need to honor is
// `RenderBackend`, and the only one this workspace ships is
// `test::NullBackend`, used by the CLI's `run` subcommand and by the
// runtime/render test suites.

pub mod backend;
pub mod command;
pub mod emit;
pub mod events;
pub mod test;

pub use backend::{RenderBackend, RenderError, RenderResult};
pub use command::{CursorType, RenderCommand, TextAlign, POPUP_Z_INDEX};
pub use emit::{emit_frame, EmitContext, FrameOutput};
pub use events::*;
