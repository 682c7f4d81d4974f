use crate::{
    core::{RasterImage, SpriteMetrics},
    error::{ParadeError, ParadeResult},
};

/// A sprite split into independently animated head and body images.
///
/// Split once at load time; the compositor pivots the head every frame and
/// re-slicing per frame would be wasted work.
#[derive(Clone, Debug)]
pub struct SlicedSprite {
    /// Rows `[0, split_line)` of the upscaled sprite.
    pub upper: RasterImage,
    /// Rows `[split_line, size)` of the upscaled sprite.
    pub lower: RasterImage,
    /// Head/body boundary row in upscaled pixels.
    pub split_line: u32,
    /// Edge length of the upscaled sprite.
    pub size: u32,
}

/// Nearest-neighbor resample to `target x target`, hard pixel edges.
pub fn upscale_nearest(src: &RasterImage, target: u32) -> ParadeResult<RasterImage> {
    if src.width == 0 || src.height == 0 {
        return Err(ParadeError::validation("cannot upscale an empty image"));
    }
    if target == 0 {
        return Err(ParadeError::validation("upscale target must be > 0"));
    }

    let mut out = vec![0u8; target as usize * target as usize * 4];
    let dst_stride = target as usize * 4;
    for y in 0..target {
        let sy = (y as u64 * src.height as u64 / target as u64) as u32;
        let row = &mut out[y as usize * dst_stride..(y as usize + 1) * dst_stride];
        for x in 0..target {
            let sx = (x as u64 * src.width as u64 / target as u64) as u32;
            let px = src.pixel(sx, sy);
            row[x as usize * 4..x as usize * 4 + 4].copy_from_slice(&px);
        }
    }
    RasterImage::from_rgba8(target, target, out)
}

/// Upscale then split a source sprite into head and body images.
///
/// Upscaling happens first: the source is pixel art, and slicing the 28px
/// original would land the cut on a sub-pixel boundary after scaling.
pub fn slice(image: &RasterImage, metrics: SpriteMetrics) -> ParadeResult<SlicedSprite> {
    let size = metrics.target_size;
    let split = metrics.split_line;
    if split > size {
        return Err(ParadeError::validation(
            "split_line must not exceed target_size",
        ));
    }

    let scaled = upscale_nearest(image, size)?;
    let stride = size as usize * 4;
    let cut = split as usize * stride;

    let upper = RasterImage::from_rgba8(size, split, scaled.data[..cut].to_vec())?;
    let lower = RasterImage::from_rgba8(size, size - split, scaled.data[cut..].to_vec())?;

    Ok(SlicedSprite {
        upper,
        lower,
        split_line: split,
        size,
    })
}
