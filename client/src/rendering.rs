use crate::assets::{AssetLoader, Drawable, FrameDecoder};
use crate::game::WorldState;
use crate::viewport::Viewport;
use macroquad::prelude::*;
use shared::CULL_MARGIN;

const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_GAP: f32 = 4.0;
const LABEL_OUTLINE: f32 = 1.5;

/// One drawing step, in screen space
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp<H> {
    Background { texture: H, source: Rect },
    Sprite { texture: H, position: Vec2 },
    Label { text: String, center_x: f32, baseline_y: f32 },
}

/// Draw list produced at the last state change
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<H> {
    pub ops: Vec<DrawOp<H>>,
}

impl<H> Default for Frame<H> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<H> Frame<H> {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn sprite_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Sprite { .. }))
            .count()
    }
}

pub fn is_visible(screen: Vec2, canvas: Vec2) -> bool {
    screen.x >= -CULL_MARGIN
        && screen.y >= -CULL_MARGIN
        && screen.x <= canvas.x + CULL_MARGIN
        && screen.y <= canvas.y + CULL_MARGIN
}

/// Top-left corner for a sprite whose bottom-centre sits on `anchor`
pub fn sprite_origin(anchor: Vec2, size: Vec2) -> Vec2 {
    vec2(anchor.x - size.x / 2.0, anchor.y - size.y)
}

/// Builds the draw list for the current world. Nothing is drawn until the
/// background exists; players without a decoded frame are skipped.
pub fn compose_frame<H: Drawable, D: FrameDecoder>(
    world: &WorldState,
    viewport: &Viewport,
    canvas: Vec2,
    world_size: f32,
    assets: &AssetLoader<H, D>,
) -> Frame<H> {
    let Some(background) = assets.background() else {
        return Frame::default();
    };

    let mut ops = Vec::with_capacity(world.players.len() * 2 + 1);

    // The background image may not be world_size pixels across.
    let scale = background.size() / world_size;
    let view = viewport.rect(canvas);
    ops.push(DrawOp::Background {
        texture: background.clone(),
        source: Rect::new(
            view.x * scale.x,
            view.y * scale.y,
            view.w * scale.x,
            view.h * scale.y,
        ),
    });

    for player in world.players.values() {
        let screen = viewport.world_to_screen(vec2(player.x, player.y));
        if !is_visible(screen, canvas) {
            continue;
        }

        let Some(texture) = assets.frame(&player.avatar, player.facing, player.frame_index())
        else {
            continue;
        };

        let origin = sprite_origin(screen, texture.size());
        ops.push(DrawOp::Sprite {
            texture: texture.clone(),
            position: origin,
        });
        ops.push(DrawOp::Label {
            text: player.username.clone(),
            center_x: screen.x,
            baseline_y: origin.y - LABEL_GAP,
        });
    }

    Frame { ops }
}

pub struct Renderer {
    frame: Frame<Texture2D>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            frame: Frame::default(),
        }
    }

    pub fn set_frame(&mut self, frame: Frame<Texture2D>) {
        self.frame = frame;
    }

    /// Replays the current draw list onto the window
    pub fn present(&self) {
        clear_background(BLACK);

        for op in &self.frame.ops {
            match op {
                DrawOp::Background { texture, source } => {
                    draw_texture_ex(
                        texture,
                        0.0,
                        0.0,
                        WHITE,
                        DrawTextureParams {
                            dest_size: Some(vec2(screen_width(), screen_height())),
                            source: Some(*source),
                            ..Default::default()
                        },
                    );
                }
                DrawOp::Sprite { texture, position } => {
                    draw_texture(texture, position.x, position.y, WHITE);
                }
                DrawOp::Label {
                    text,
                    center_x,
                    baseline_y,
                } => self.draw_label(text, *center_x, *baseline_y),
            }
        }
    }

    fn draw_label(&self, text: &str, center_x: f32, baseline_y: f32) {
        if text.is_empty() {
            return;
        }

        let dims = measure_text(text, None, LABEL_FONT_SIZE as u16, 1.0);
        let x = center_x - dims.width / 2.0;

        // Stroke first, fill on top.
        for (dx, dy) in [
            (-LABEL_OUTLINE, 0.0),
            (LABEL_OUTLINE, 0.0),
            (0.0, -LABEL_OUTLINE),
            (0.0, LABEL_OUTLINE),
        ] {
            draw_text(text, x + dx, baseline_y + dy, LABEL_FONT_SIZE, BLACK);
        }
        draw_text(text, x, baseline_y, LABEL_FONT_SIZE, WHITE);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
