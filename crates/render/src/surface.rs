use glam::{IVec2, UVec2};
use image::{RgbaImage, imageops};

/// Straight (non-premultiplied) RGBA pixel.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Anything tiles can be blitted onto: an in-memory [`Image`], or a host
/// surface wrapped by the caller.
pub trait Surface {
    fn size(&self) -> UVec2;

    /// Composite `image` with its top-left corner at `dest`, clipped to the
    /// surface.
    fn blit(&mut self, image: &Image, dest: IVec2);
}

/// In-memory RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    buffer: RgbaImage,
}

impl Image {
    /// Fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(width, height, image::Rgba(color)),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        self.buffer.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgba) -> bool {
        match self.buffer.get_pixel_mut_checked(x, y) {
            Some(p) => {
                *p = image::Rgba(color);
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, color: Rgba) {
        for p in self.buffer.pixels_mut() {
            *p = image::Rgba(color);
        }
    }
}

impl From<RgbaImage> for Image {
    fn from(buffer: RgbaImage) -> Self {
        Self { buffer }
    }
}

impl Surface for Image {
    fn size(&self) -> UVec2 {
        UVec2::new(self.buffer.width(), self.buffer.height())
    }

    /// Source-over compositing that honours the destination's alpha, so a
    /// translucent pixel baked onto a transparent tile keeps its colour.
    fn blit(&mut self, image: &Image, dest: IVec2) {
        imageops::overlay(&mut self.buffer, &image.buffer, i64::from(dest.x), i64::from(dest.y));
    }
}
