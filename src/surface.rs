use kurbo::{Affine, Point};

use crate::{
    core::RasterImage,
    error::{ParadeError, ParadeResult},
};

#[derive(Clone, Copy, Debug)]
struct GfxState {
    transform: Affine,
    alpha: f32,
}

impl Default for GfxState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Minimal immediate-mode 2D raster canvas.
///
/// Premultiplied RGBA8 backing store with a canvas-style save/restore stack of
/// (affine transform, global alpha). Image sampling is always
/// nearest-neighbor; there is no smoothing to disable.
pub struct DrawSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
    state: GfxState,
    stack: Vec<GfxState>,
}

impl DrawSurface {
    pub fn new(width: u32, height: u32) -> ParadeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ParadeError::surface(format!(
                "cannot create a {width}x{height} surface"
            )));
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            state: GfxState::default(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 pixel bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate to new pixel dimensions, clearing all content and state.
    pub fn resize(&mut self, width: u32, height: u32) -> ParadeResult<()> {
        if width == 0 || height == 0 {
            return Err(ParadeError::surface(format!(
                "cannot resize surface to {width}x{height}"
            )));
        }
        self.width = width;
        self.height = height;
        self.data = vec![0; width as usize * height as usize * 4];
        self.state = GfxState::default();
        self.stack.clear();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Clear a full-height vertical band starting at `x` (may be negative),
    /// `w` pixels wide, clipped to the surface.
    pub fn clear_band(&mut self, x: i64, w: u32) {
        let x0 = x.max(0).min(self.width as i64) as usize;
        let x1 = (x + w as i64).max(0).min(self.width as i64) as usize;
        if x0 >= x1 {
            return;
        }
        let stride = self.width as usize * 4;
        for row in 0..self.height as usize {
            let start = row * stride + x0 * 4;
            let end = row * stride + x1 * 4;
            self.data[start..end].fill(0);
        }
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    pub fn restore(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.state = prev;
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform * Affine::translate((dx, dy));
    }

    pub fn rotate(&mut self, radians: f64) {
        self.state.transform = self.state.transform * Affine::rotate(radians);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(sx, sy);
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Draw `img` into the local rect `[0, dw) x [0, dh)` under the current
    /// transform and global alpha, sampling nearest-neighbor.
    pub fn draw_image(&mut self, img: &RasterImage, dw: f64, dh: f64) {
        if img.width == 0 || img.height == 0 || dw <= 0.0 || dh <= 0.0 {
            return;
        }
        if self.state.alpha <= 0.0 {
            return;
        }
        let t = self.state.transform;
        if t.determinant().abs() < 1e-12 {
            return;
        }
        let inv = t.inverse();

        // Destination bounding box of the transformed local rect.
        let corners = [
            t * Point::new(0.0, 0.0),
            t * Point::new(dw, 0.0),
            t * Point::new(0.0, dh),
            t * Point::new(dw, dh),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in corners {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().min(self.width as f64) as u32).max(x0);
        let y1 = (max_y.ceil().min(self.height as f64) as u32).max(y0);

        let stride = self.width as usize * 4;
        for py in y0..y1 {
            for px in x0..x1 {
                let local = inv * Point::new(px as f64 + 0.5, py as f64 + 0.5);
                if local.x < 0.0 || local.x >= dw || local.y < 0.0 || local.y >= dh {
                    continue;
                }
                let sx = ((local.x / dw) * img.width as f64) as u32;
                let sy = ((local.y / dh) * img.height as f64) as u32;
                let sx = sx.min(img.width - 1);
                let sy = sy.min(img.height - 1);

                let src = premultiply(img.pixel(sx, sy));
                if src[3] == 0 {
                    continue;
                }
                let idx = py as usize * stride + px as usize * 4;
                let dst = [
                    self.data[idx],
                    self.data[idx + 1],
                    self.data[idx + 2],
                    self.data[idx + 3],
                ];
                let out = over(dst, src, self.state.alpha);
                self.data[idx..idx + 4].copy_from_slice(&out);
            }
        }
    }

    /// Composite another surface onto this one at an integer offset,
    /// ignoring the transform stack.
    pub fn blit_from(&mut self, src: &DrawSurface, dx: i64, dy: i64) {
        let stride = self.width as usize * 4;
        let src_stride = src.width as usize * 4;
        for sy in 0..src.height as i64 {
            let py = sy + dy;
            if py < 0 || py >= self.height as i64 {
                continue;
            }
            for sx in 0..src.width as i64 {
                let px = sx + dx;
                if px < 0 || px >= self.width as i64 {
                    continue;
                }
                let sidx = sy as usize * src_stride + sx as usize * 4;
                let spx = [
                    src.data[sidx],
                    src.data[sidx + 1],
                    src.data[sidx + 2],
                    src.data[sidx + 3],
                ];
                if spx[3] == 0 {
                    continue;
                }
                let didx = py as usize * stride + px as usize * 4;
                let dpx = [
                    self.data[didx],
                    self.data[didx + 1],
                    self.data[didx + 2],
                    self.data[didx + 3],
                ];
                let out = over(dpx, spx, 1.0);
                self.data[didx..didx + 4].copy_from_slice(&out);
            }
        }
    }

    /// Copy out as straight-alpha RGBA8, e.g. for PNG export.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u32;
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

fn premultiply(px: [u8; 4]) -> [u8; 4] {
    let a = px[3] as u16;
    if a == 255 {
        return px;
    }
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        mul_div255(px[0] as u16, a),
        mul_div255(px[1] as u16, a),
        mul_div255(px[2] as u16, a),
        px[3],
    ]
}

fn over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = mul_div255(u16::from(dst[3]), inv).saturating_add(sa);
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
