use crate::error::{ParadeError, ParadeResult};

/// Decoded straight-alpha bitmap in row-major RGBA8 (4 bytes per pixel).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Wrap a raw RGBA8 buffer, validating its length against the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ParadeResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| ParadeError::validation("image dimensions overflow"))?;
        if data.len() != expected {
            return Err(ParadeError::validation(format!(
                "rgba8 buffer has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a fully transparent image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// One full pixel row as a byte slice.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// RGBA of the pixel at `(x, y)`. Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Display geometry derived from the container height.
///
/// The source sprite is `base_size` pixels square; it is shown at
/// `target_size = base_size * scale` where `scale` is the largest integer
/// multiple that fits the container height (never below 1, so a short
/// container still shows a full sprite).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteMetrics {
    /// Integer upscale factor.
    pub scale: u32,
    /// Edge length of the displayed sprite in pixels.
    pub target_size: u32,
    /// Row at which the head ends and the body begins, in target pixels.
    pub split_line: u32,
}

impl SpriteMetrics {
    pub fn from_container(
        container_height: u32,
        base_size: u32,
        head_split_row: u32,
    ) -> ParadeResult<Self> {
        if base_size == 0 {
            return Err(ParadeError::validation("base_size must be > 0"));
        }
        if head_split_row > base_size {
            return Err(ParadeError::validation(
                "head_split_row must be <= base_size",
            ));
        }
        let scale = (container_height / base_size).max(1);
        Ok(Self {
            scale,
            target_size: base_size * scale,
            split_line: head_split_row * scale,
        })
    }
}
