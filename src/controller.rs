use std::f64::consts::TAU;
use std::sync::Arc;

use tracing::debug;

use crate::{
    compositor::{self, FrameTransform},
    config::AnimParams,
    core::SpriteMetrics,
    error::ParadeResult,
    loader::{IndexSource, SpriteFetcher},
    queue::PrefetchQueue,
    slicer::SlicedSprite,
    surface::DrawSurface,
};

/// Phase of the banner automaton. Exactly one is active at any time; every
/// transition except the first is time-driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    /// Waiting for the first sprite to finish loading and slicing.
    Loading,
    /// Sprite slides in from the left edge.
    Entrance,
    /// Sprite rests at the left origin with sway only.
    Display,
    /// Head oscillates once before departure.
    Nod,
    /// Sprite slides out to the right while its replacement enters.
    Exit,
}

/// Entrance position: from one sprite-width off-canvas to the origin.
pub fn entrance_x(progress: f64, target_size: f64) -> f64 {
    -target_size * (1.0 - progress.clamp(0.0, 1.0))
}

/// Exit position. The 2x factor is intentional: departure traverses at twice
/// the per-progress speed of the other phases.
pub fn exit_x(progress: f64, container_width: f64, movement_width: f64) -> f64 {
    (progress.max(0.0) * movement_width * 2.0).min(container_width)
}

/// Head rotation over one nod: a full sine cycle scaled by `strength`.
pub fn nod_rotation(progress: f64, strength: f64) -> f64 {
    (progress.clamp(0.0, 1.0) * TAU).sin() * strength
}

/// Position of the staged replacement during an exit, or `None` while the
/// outgoing sprite still occupies the first three quarters of the container.
///
/// The replacement starts once the outgoing sprite has passed 75 % of the
/// container width and is interpolated to reach the origin exactly as the
/// exit completes.
pub fn incoming_x(
    progress: f64,
    target_size: f64,
    container_width: f64,
    movement_width: f64,
) -> Option<f64> {
    if movement_width <= 0.0 {
        return None;
    }
    let start = 0.75 * container_width / (2.0 * movement_width);
    if start >= 1.0 || progress < start {
        return None;
    }
    let t = ((progress - start) / (1.0 - start)).clamp(0.0, 1.0);
    Some(-target_size * (1.0 - t))
}

/// Owns the banner's mutable state (current/next sprite, frame counter,
/// state clock, drawing surfaces) and advances it one tick at a time.
///
/// The clock is injected: callers pass `now_ms` to `tick`, so the automaton
/// is testable without a display loop. Tick order is fixed: check the state
/// timer, transition if due, compute the transform, draw, advance the frame
/// counter.
pub struct BannerController {
    params: AnimParams,
    queue: PrefetchQueue,
    visible: DrawSurface,
    scratch: DrawSurface,
    container_width: u32,
    container_height: u32,
    state: AnimationState,
    state_started_ms: f64,
    frame: u32,
    current: Option<SlicedSprite>,
    next: Option<SlicedSprite>,
}

impl BannerController {
    pub fn new(
        params: AnimParams,
        fetcher: Arc<dyn SpriteFetcher>,
        indices: Box<dyn IndexSource>,
        container_width: u32,
        container_height: u32,
    ) -> ParadeResult<Self> {
        params.validate()?;
        let metrics = SpriteMetrics::from_container(
            container_height,
            params.base_size,
            params.head_split_row,
        )?;
        let visible = DrawSurface::new(container_width, container_height)?;
        let scratch = DrawSurface::new(metrics.target_size, metrics.target_size)?;
        let queue = PrefetchQueue::new(fetcher, indices, metrics, params.queue_capacity);
        queue.start();
        Ok(Self {
            params,
            queue,
            visible,
            scratch,
            container_width,
            container_height,
            state: AnimationState::Loading,
            state_started_ms: 0.0,
            frame: 0,
            current: None,
            next: None,
        })
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn frame_index(&self) -> u32 {
        self.frame
    }

    /// The visible drawing surface (premultiplied RGBA8).
    pub fn surface(&self) -> &DrawSurface {
        &self.visible
    }

    pub fn params(&self) -> &AnimParams {
        &self.params
    }

    /// Sprites currently buffered and ready for display.
    pub fn ready_sprites(&self) -> usize {
        self.queue.len()
    }

    /// Resynchronize the drawing surface with new container dimensions.
    ///
    /// Only the surface is touched: metrics are recomputed from the current
    /// container height on every tick, so sprites already sliced rescale live
    /// at draw time without reslicing.
    pub fn set_container(&mut self, width: u32, height: u32) -> ParadeResult<()> {
        self.container_width = width;
        self.container_height = height;
        self.visible.resize(width, height)
    }

    /// Stop background loading and join the queue's workers.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    /// Advance the animation to `now_ms` and redraw.
    pub fn tick(&mut self, now_ms: f64) -> ParadeResult<()> {
        let metrics = SpriteMetrics::from_container(
            self.container_height,
            self.params.base_size,
            self.params.head_split_row,
        )?;
        self.advance_state(now_ms);
        self.draw(now_ms, metrics)?;
        self.frame = (self.frame + 1) % self.params.frame_count;
        Ok(())
    }

    fn enter(&mut self, state: AnimationState, now_ms: f64) {
        debug!(from = ?self.state, to = ?state, "banner state transition");
        self.state = state;
        self.state_started_ms = now_ms;
    }

    fn advance_state(&mut self, now: f64) {
        let elapsed = now - self.state_started_ms;
        match self.state {
            AnimationState::Loading => {
                if let Some(sprite) = self.queue.dequeue() {
                    self.current = Some(sprite);
                    self.enter(AnimationState::Entrance, now);
                }
            }
            AnimationState::Entrance => {
                if elapsed >= self.params.entrance_ms {
                    self.enter(AnimationState::Display, now);
                }
            }
            AnimationState::Display => {
                if elapsed >= self.params.display_ms {
                    self.enter(AnimationState::Nod, now);
                }
            }
            AnimationState::Nod => {
                if elapsed >= self.params.nod_ms {
                    if self.next.is_none() {
                        self.next = self.queue.dequeue();
                    }
                    self.enter(AnimationState::Exit, now);
                }
            }
            AnimationState::Exit => {
                if elapsed >= self.params.exit_ms {
                    if self.next.is_none() {
                        // Linger: keep polling for a replacement each tick
                        // while visually idle past the container edge.
                        self.next = self.queue.dequeue();
                    }
                    if self.next.is_some() {
                        self.current = self.next.take();
                        self.enter(AnimationState::Display, now);
                    }
                }
            }
        }
    }

    fn draw(&mut self, now: f64, metrics: SpriteMetrics) -> ParadeResult<()> {
        let Some(current) = &self.current else {
            return Ok(());
        };

        let elapsed = now - self.state_started_ms;
        let cw = f64::from(self.container_width);
        let target = f64::from(metrics.target_size);

        let mut tx = FrameTransform::default();
        let mut staged: Option<FrameTransform> = None;
        match self.state {
            AnimationState::Loading => return Ok(()),
            AnimationState::Entrance => {
                tx.x_offset = entrance_x(elapsed / self.params.entrance_ms, target);
            }
            AnimationState::Display => {}
            AnimationState::Nod => {
                tx.nod_rotation =
                    nod_rotation(elapsed / self.params.nod_ms, self.params.nod_strength);
            }
            AnimationState::Exit => {
                let progress = (elapsed / self.params.exit_ms).min(1.0);
                tx.x_offset = exit_x(progress, cw, cw);
                if self.next.is_some()
                    && let Some(x) = incoming_x(progress, target, cw, cw)
                {
                    staged = Some(FrameTransform {
                        x_offset: x,
                        ..FrameTransform::default()
                    });
                }
            }
        }

        compositor::draw_frame(
            &mut self.visible,
            &mut self.scratch,
            current,
            self.frame,
            metrics,
            &tx,
            &self.params,
            false,
        )?;

        if let (Some(next), Some(tx_in)) = (&self.next, staged) {
            compositor::draw_frame(
                &mut self.visible,
                &mut self.scratch,
                next,
                self.frame,
                metrics,
                &tx_in,
                &self.params,
                false,
            )?;
        }
        Ok(())
    }
}
