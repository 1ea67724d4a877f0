// crates/kryon-render/src/emit.rs
//
// The render-command emitter (§4.9): a pre-order traversal over the
// element tree that issues layout-positioning plus each element's own
// draw commands, skipping directive-shaped elements (`@for`/`@if`, which
// are templates, never renderable nodes). Property resolution goes
// through the `PropertyAccessor` contract so this crate never needs to
// know about the variable registry or component scopes that live in
// `kryon-runtime`.

use crate::command::{CursorType, RenderCommand, TextAlign, POPUP_Z_INDEX};
use glam::{Vec2, Vec4};
use kryon_core::{Element, ElementId, ElementTree, ElementType, PropertyAccessor};
use kryon_layout::LayoutResult;

/// §4.9 auto-sizing minimums for elements with no explicit width/height.
const AUTO_SIZE_WIDTH_MIN: f32 = 20.0;
const AUTO_SIZE_HEIGHT_MIN: f32 = 16.0;

#[derive(Debug, Default)]
pub struct FrameOutput {
    pub commands: Vec<RenderCommand>,
    pub cursor: CursorType,
}

pub struct EmitContext<'a> {
    pub tree: &'a ElementTree,
    pub layout: &'a LayoutResult,
    pub accessor: &'a dyn PropertyAccessor,
    /// The element the event pipeline currently considers hovered; used
    /// for the per-frame cursor vote (§4.7).
    pub hovered: Option<ElementId>,
    pub measure_text: &'a dyn Fn(&str, f32) -> f32,
}

/// Traverse from `root`, emitting one command list for the whole frame.
/// Cursor policy: starts at `Default`; the first visited element voting
/// for a non-default cursor wins (deepest hovered element is visited
/// last among its ancestors, so its vote naturally overrides theirs).
pub fn emit_frame(ctx: &EmitContext, root: ElementId) -> FrameOutput {
    let mut out = FrameOutput::default();
    let mut next_emission_index = 0i32;
    visit(ctx, root, &mut out, &mut next_emission_index);
    out
}

fn visit(ctx: &EmitContext, id: ElementId, out: &mut FrameOutput, next_z: &mut i32) {
    let Some(element) = ctx.tree.get(id) else { return };
    if element.element_type.is_directive() {
        return;
    }
    if !element.visible {
        return;
    }

    let position = ctx
        .layout
        .computed_positions
        .get(&id)
        .copied()
        .unwrap_or(Vec2::ZERO);
    let mut size = ctx.layout.computed_sizes.get(&id).copied().unwrap_or(Vec2::ZERO);
    apply_auto_sizing(ctx, element, &mut size);

    let base_commands = draw_element(ctx, element, position, size);
    for mut cmd in base_commands {
        if cmd.z_index() < POPUP_Z_INDEX {
            cmd.set_z_index(*next_z);
            *next_z += 1;
        }
        out.commands.push(cmd);
    }

    if Some(id) == ctx.hovered {
        let cursor_name = ctx.accessor.get_string(element, "cursor", "default");
        if let Some(cursor) = parse_cursor(&cursor_name) {
            if cursor != CursorType::Default {
                out.cursor = cursor;
            }
        }
    }

    for &child in &element.children {
        visit(ctx, child, out, next_z);
    }
}

fn parse_cursor(name: &str) -> Option<CursorType> {
    Some(match name {
        "default" => CursorType::Default,
        "pointer" => CursorType::Pointer,
        "text" => CursorType::Text,
        "move" => CursorType::Move,
        "not-allowed" | "not_allowed" => CursorType::NotAllowed,
        _ => return None,
    })
}

fn apply_auto_sizing(ctx: &EmitContext, element: &Element, size: &mut Vec2) {
    if !matches!(element.element_type, ElementType::Text | ElementType::Button | ElementType::Input) {
        return;
    }
    let has_width = element.properties.get("width").is_some();
    let has_height = element.properties.get("height").is_some();

    if !has_width {
        size.x = match element.element_type {
            ElementType::Text => {
                let text = ctx.accessor.get_string(element, "text", "");
                let font_size = ctx.accessor.get_float(element, "font-size", 16.0) as f32;
                (ctx.measure_text)(&text, font_size).max(AUTO_SIZE_WIDTH_MIN)
            }
            ElementType::Button => {
                let text = ctx.accessor.get_string(element, "text", "");
                let font_size = ctx.accessor.get_float(element, "font-size", 16.0) as f32;
                ((ctx.measure_text)(&text, font_size) + 24.0).max(AUTO_SIZE_WIDTH_MIN)
            }
            ElementType::Input => 160.0_f32.max(AUTO_SIZE_WIDTH_MIN),
            _ => size.x,
        };
    }
    if !has_height {
        size.y = size.y.max(AUTO_SIZE_HEIGHT_MIN);
    }
}

fn draw_element(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    match element.element_type.name() {
        "Text" => draw_text(ctx, element, pos, size),
        "Button" => draw_button(ctx, element, pos, size),
        "Input" => draw_input(ctx, element, pos, size),
        "Image" => draw_rect_only(ctx, element, pos, size),
        _ => draw_container(ctx, element, pos, size),
    }
}

fn draw_container(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    let color = ctx.accessor.get_color(element, "background-color", Vec4::new(0.0, 0.0, 0.0, 0.0));
    if color.w <= 0.0 {
        return Vec::new();
    }
    vec![rect_command(ctx, element, pos, size, color)]
}

fn draw_rect_only(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    let color = ctx.accessor.get_color(element, "background-color", Vec4::new(0.8, 0.8, 0.8, 1.0));
    vec![rect_command(ctx, element, pos, size, color)]
}

fn draw_button(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    let color = ctx.accessor.get_color(element, "background-color", Vec4::new(0.3, 0.3, 0.3, 1.0));
    let mut commands = vec![rect_command(ctx, element, pos, size, color)];
    commands.extend(draw_text(ctx, element, pos, size));
    commands
}

fn draw_input(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    let color = ctx.accessor.get_color(element, "background-color", Vec4::new(1.0, 1.0, 1.0, 1.0));
    let mut commands = vec![rect_command(ctx, element, pos, size, color)];
    commands.extend(draw_text(ctx, element, pos, size));
    commands
}

fn rect_command(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2, color: Vec4) -> RenderCommand {
    RenderCommand::DrawRect {
        pos,
        size,
        color,
        radius: ctx.accessor.get_float(element, "border-radius", 0.0) as f32,
        border_width: ctx.accessor.get_float(element, "border-width", 0.0) as f32,
        border_color: ctx.accessor.get_color(element, "border-color", Vec4::new(0.0, 0.0, 0.0, 0.0)),
        z_index: 0,
    }
}

fn draw_text(ctx: &EmitContext, element: &Element, pos: Vec2, size: Vec2) -> Vec<RenderCommand> {
    let text = ctx.accessor.get_string(element, "text", "");
    if text.is_empty() {
        return Vec::new();
    }
    let alignment = match ctx.accessor.get_string(element, "text-align", "start").as_str() {
        "center" => TextAlign::Center,
        "end" => TextAlign::End,
        "justify" => TextAlign::Justify,
        _ => TextAlign::Start,
    };
    vec![RenderCommand::DrawText {
        pos,
        text,
        font_size: ctx.accessor.get_float(element, "font-size", 16.0) as f32,
        color: ctx.accessor.get_color(element, "color", Vec4::new(0.0, 0.0, 0.0, 1.0)),
        font_family: ctx.accessor.get_string(element, "font-family", "sans-serif"),
        bold: ctx.accessor.get_int(element, "font-weight", 400) >= 600,
        italic: false,
        max_width: Some(size.x),
        alignment,
        z_index: 0,
    }]
}
