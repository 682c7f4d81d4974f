#![forbid(unsafe_code)]

pub mod compositor;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod histogram;
pub mod loader;
pub mod queue;
pub mod slicer;
pub mod surface;

pub use crate::compositor::{FrameTransform, PressGesture, draw_frame, press_gesture, sway_rotation};
pub use crate::config::AnimParams;
pub use crate::controller::{AnimationState, BannerController};
pub use crate::core::{RasterImage, SpriteMetrics};
pub use crate::error::{ParadeError, ParadeResult};
pub use crate::histogram::{ColorBucket, dominant_colors};
pub use crate::loader::{
    HttpSpriteFetcher, IndexSource, RandomIndexSource, SequentialIndexSource, SpriteFetcher,
    decode_image,
};
pub use crate::queue::PrefetchQueue;
pub use crate::slicer::{SlicedSprite, slice, upscale_nearest};
pub use crate::surface::DrawSurface;
