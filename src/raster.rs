//! RGBA raster surfaces and the value geometry used to address them.
//!
//! [`Raster`] is the only pixel container in the crate: decoded frames, cached composites
//! and playback output surfaces are all plain `width * height` RGBA8 buffers. Every region
//! operation clips against both surfaces involved, so callers never have to pre-validate
//! geometry. Releasing a surface is `Drop`.

use crate::error::{GifError, GifResult, ResourceErrorKind};

/// Largest pixel buffer the crate will allocate (2 GiB).
const MAX_ALLOC_BYTES: u64 = 1 << 31;

/// An RGB color table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

/// An RGBA pixel, 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Fully transparent black, the clear value for fresh canvases.
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);
}

impl From<Rgb> for Rgba {
    fn from(rgb: Rgb) -> Rgba {
        let Rgb([r, g, b]) = rgb;
        Rgba([r, g, b, 0xFF])
    }
}

/// An axis-aligned rectangle in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Creates a rectangle from its left/top corner and size.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The intersection of two rectangles; empty if they do not overlap.
    pub fn intersect(self, other: Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x as u64 + self.width as u64).min(other.x as u64 + other.width as u64);
        let bottom = (self.y as u64 + self.height as u64).min(other.y as u64 + other.height as u64);
        Rect {
            x,
            y,
            width: right.saturating_sub(x as u64) as u32,
            height: bottom.saturating_sub(y as u64) as u32,
        }
    }
}

/// An owned RGBA8 surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Allocates a fully transparent surface.
    ///
    /// Fails with a [`ResourceErrorKind::AllocationTooLarge`] error instead of attempting an
    /// allocation that cannot plausibly succeed.
    pub fn new(width: u32, height: u32) -> GifResult<Raster> {
        let bytes = width as u64 * height as u64 * 4;
        if bytes > MAX_ALLOC_BYTES {
            return Err(GifError::resource(ResourceErrorKind::AllocationTooLarge(
                bytes,
            )));
        }
        Ok(Raster {
            width,
            height,
            data: vec![0; bytes as usize],
        })
    }

    /// Creates a surface by evaluating `f` at every coordinate.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> GifResult<Raster>
    where
        F: FnMut(u32, u32) -> Rgba,
    {
        let mut raster = Raster::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                raster.put_pixel(x, y, f(x, y));
            }
        }
        Ok(raster)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The full extent of the surface as a rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// The raw RGBA bytes in row-major order.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the surface.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba {
        let i = self.index(x, y);
        Rgba([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Replaces the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the surface.
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&pixel.0);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "raster access out of bounds: ({}, {}) not below ({}, {})",
            x,
            y,
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Fills the clipped rectangle with a single value.
    pub fn fill_rect(&mut self, rect: Rect, pixel: Rgba) {
        let rect = rect.intersect(self.bounds());
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.put_pixel(x, y, pixel);
            }
        }
    }

    /// Copies the clipped rectangle out into a new surface.
    pub fn crop(&self, rect: Rect) -> GifResult<Raster> {
        let rect = rect.intersect(self.bounds());
        Raster::from_fn(rect.width, rect.height, |x, y| {
            self.get_pixel(rect.x + x, rect.y + y)
        })
    }

    /// Draws `src_rect` of `src` onto this surface with its top-left corner at
    /// `(dest_x, dest_y)`.
    ///
    /// The region is clipped against both surfaces. With `alpha_blend` the source is
    /// composited over the existing content; without it the destination pixels are replaced.
    pub fn blit(&mut self, src: &Raster, src_rect: Rect, dest_x: u32, dest_y: u32, alpha_blend: bool) {
        let src_rect = src_rect.intersect(src.bounds());
        let width = src_rect.width.min(self.width.saturating_sub(dest_x));
        let height = src_rect.height.min(self.height.saturating_sub(dest_y));
        for y in 0..height {
            for x in 0..width {
                let pixel = src.get_pixel(src_rect.x + x, src_rect.y + y);
                let (dx, dy) = (dest_x + x, dest_y + y);
                if alpha_blend {
                    let below = self.get_pixel(dx, dy);
                    self.put_pixel(dx, dy, over(pixel, below));
                } else {
                    self.put_pixel(dx, dy, pixel);
                }
            }
        }
    }
}

/// Source-over composite of two pixels.
fn over(src: Rgba, dst: Rgba) -> Rgba {
    let sa = src.0[3] as u32;
    if sa == 0xFF {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst.0[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba::TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        ((s as u32 * sa + d as u32 * da * (255 - sa) / 255) / out_a) as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        out_a as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba([0xFF, 0, 0, 0xFF]);
    const BLUE: Rgba = Rgba([0, 0, 0xFF, 0xFF]);

    #[test]
    fn intersect_clips_and_empties() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(Rect::new(2, 2, 3, 3)), Rect::new(2, 2, 3, 3));
        assert_eq!(a.intersect(Rect::new(8, 8, 5, 5)), Rect::new(8, 8, 2, 2));
        assert!(a.intersect(Rect::new(10, 10, 1, 1)).is_empty());
        assert!(a.intersect(Rect::new(20, 0, 5, 5)).is_empty());
    }

    #[test]
    fn fill_rect_clips() {
        let mut r = Raster::new(4, 4).unwrap();
        r.fill_rect(Rect::new(2, 2, 10, 10), RED);
        assert_eq!(r.get_pixel(3, 3), RED);
        assert_eq!(r.get_pixel(1, 1), Rgba::TRANSPARENT);
    }

    #[test]
    fn blit_clips_against_destination() {
        let src = Raster::from_fn(4, 4, |_, _| BLUE).unwrap();
        let mut dst = Raster::new(4, 4).unwrap();
        dst.blit(&src, src.bounds(), 2, 3, false);
        assert_eq!(dst.get_pixel(3, 3), BLUE);
        assert_eq!(dst.get_pixel(1, 1), Rgba::TRANSPARENT);
    }

    #[test]
    fn blend_keeps_destination_under_transparent_source() {
        let mut dst = Raster::from_fn(1, 1, |_, _| RED).unwrap();
        let src = Raster::new(1, 1).unwrap();
        dst.blit(&src, src.bounds(), 0, 0, true);
        assert_eq!(dst.get_pixel(0, 0), RED);

        dst.blit(&src, src.bounds(), 0, 0, false);
        assert_eq!(dst.get_pixel(0, 0), Rgba::TRANSPARENT);
    }

    #[test]
    fn oversized_allocation_is_rejected() {
        let err = Raster::new(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            GifError::Resource {
                kind: ResourceErrorKind::AllocationTooLarge(_)
            }
        ));
    }

    #[test]
    fn crop_snapshots_region() {
        let r = Raster::from_fn(4, 4, |x, _| if x < 2 { RED } else { BLUE }).unwrap();
        let patch = r.crop(Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(patch.width(), 2);
        assert_eq!(patch.get_pixel(0, 0), RED);
        assert_eq!(patch.get_pixel(1, 0), BLUE);
    }
}
