use std::f64::consts::TAU;

use crate::{
    config::AnimParams,
    core::SpriteMetrics,
    error::ParadeResult,
    slicer::SlicedSprite,
    surface::DrawSurface,
};

/// Pixels of slack cleared around the sprite band so that per-tick motion
/// leaves no trail behind.
const BAND_PAD: u32 = 4;

/// Per-tick placement of one sprite, computed fresh by the controller and
/// never persisted.
#[derive(Clone, Copy, Debug)]
pub struct FrameTransform {
    /// Horizontal offset of the sprite's left edge on the visible surface.
    pub x_offset: f64,
    /// Whole-sprite rotation about its center, radians.
    pub rotation: f64,
    /// Extra head rotation from the nod gesture, radians.
    pub nod_rotation: f64,
    /// Global alpha for the whole sprite.
    pub opacity: f32,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            x_offset: 0.0,
            rotation: 0.0,
            nod_rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// The press-down-and-insert gesture, driven by the positive half of the
/// sway cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressGesture {
    /// `max(0, sin(progress))`; zero for half the cycle.
    pub phase: f64,
    /// Vertical head travel in target pixels.
    pub press_down_offset: f64,
    /// Insertion travel in target pixels. Derived for completeness; its
    /// visual effect is folded into the compositing order rather than applied
    /// as a separate translation.
    pub insertion_offset: f64,
    /// Extra head rotation about the pivot at this phase, radians.
    pub insertion_rotation: f64,
    /// Body compression fraction; the body squashes vertically and widens
    /// horizontally around its bottom-center.
    pub compression: f64,
}

/// Position in the sway cycle, radians over `[0, 2pi)`.
pub fn cycle_progress(frame: u32, frame_count: u32) -> f64 {
    f64::from(frame % frame_count.max(1)) / f64::from(frame_count.max(1)) * TAU
}

/// Subtle head sway applied every frame regardless of state.
pub fn sway_rotation(frame: u32, params: &AnimParams) -> f64 {
    cycle_progress(frame, params.frame_count).sin() * params.rotation_range
}

pub fn press_gesture(frame: u32, scale: u32, params: &AnimParams) -> PressGesture {
    let phase = cycle_progress(frame, params.frame_count).sin().max(0.0);
    let scale = f64::from(scale);
    PressGesture {
        phase,
        press_down_offset: (phase * params.press_down_strength * scale).round(),
        insertion_offset: (phase * params.insertion_strength * scale).round(),
        insertion_rotation: phase * params.insertion_angle,
        compression: phase * params.squash_strength,
    }
}

/// Composite one animation frame of `sprite` onto `visible`.
///
/// The sprite is staged on `scratch` (resized to the current target square as
/// needed) and then blitted at `(x_offset, vertically centered)`. Unless
/// `full_clear` is set, only the horizontal band the sprite occupies is
/// cleared first, so an adjacent sprite mid-transition survives.
#[allow(clippy::too_many_arguments)]
pub fn draw_frame(
    visible: &mut DrawSurface,
    scratch: &mut DrawSurface,
    sprite: &SlicedSprite,
    frame: u32,
    metrics: SpriteMetrics,
    transform: &FrameTransform,
    params: &AnimParams,
    full_clear: bool,
) -> ParadeResult<()> {
    let size = metrics.target_size;
    if scratch.width() != size || scratch.height() != size {
        scratch.resize(size, size)?;
    }
    scratch.clear();
    scratch.set_alpha(transform.opacity);

    // Sprites may have been sliced at an older scale; they are redrawn at the
    // current target size without reslicing.
    let ratio = f64::from(size) / f64::from(sprite.size.max(1));
    let split_px = (f64::from(sprite.split_line) * ratio).round();
    let lower_h = f64::from(size) - split_px;
    let w = f64::from(size);

    scratch.save();
    if transform.rotation != 0.0 {
        scratch.translate(w / 2.0, w / 2.0);
        scratch.rotate(transform.rotation);
        scratch.translate(-w / 2.0, -w / 2.0);
    }

    // Body, squashed about its bottom-center.
    let press = press_gesture(frame, metrics.scale, params);
    scratch.save();
    if press.compression > 0.0 {
        let sy = 1.0 - press.compression;
        let sx = 1.0 + press.compression * 0.2;
        scratch.translate(w / 2.0, w);
        scratch.scale(sx, sy);
        scratch.translate(-w / 2.0, -w);
    }
    scratch.translate(0.0, split_px);
    scratch.draw_image(&sprite.lower, w, lower_h);
    scratch.restore();

    // Head, swaying about its pivot; pressed down and tilted further while the
    // gesture is active.
    let sway = sway_rotation(frame, params);
    let pivot_x = (w * 3.0 / 7.0).round();
    let pivot_y = split_px;
    scratch.save();
    scratch.translate(pivot_x, pivot_y);
    scratch.rotate(sway + transform.nod_rotation);
    scratch.translate(-pivot_x, -pivot_y);
    if press.phase > 0.0 {
        scratch.translate(0.0, press.press_down_offset);
        scratch.translate(pivot_x, pivot_y);
        scratch.rotate(press.insertion_rotation);
        scratch.translate(-pivot_x, -pivot_y);
    }
    scratch.draw_image(&sprite.upper, w, split_px);
    scratch.restore();

    scratch.restore();

    let x = transform.x_offset.round() as i64;
    let y = (i64::from(visible.height()) - i64::from(size)) / 2;
    if full_clear {
        visible.clear();
    } else {
        visible.clear_band(x - i64::from(BAND_PAD), size + 2 * BAND_PAD);
    }
    visible.blit_from(scratch, x, y);
    Ok(())
}
