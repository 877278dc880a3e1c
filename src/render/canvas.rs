// SPDX-License-Identifier: GPL-3.0-only

//! Software framebuffer with a depth buffer

use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// RGBA pixels plus per-pixel view depth
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    depth: Vec<f32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            depth: vec![f32::INFINITY; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resize if needed, then clear
    pub fn resize(&mut self, width: u32, height: u32, background: Rgba<u8>) {
        if self.pixels.dimensions() != (width, height) {
            *self = Self::new(width, height);
        }
        self.clear(background);
    }

    /// Fill with `background` and reset the depth buffer
    pub fn clear(&mut self, background: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Write a pixel if it is nearer than what is already there
    pub fn plot(&mut self, x: i64, y: i64, depth: f32, color: Rgba<u8>) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        let (x, y) = (x as u32, y as u32);
        let idx = (y * self.width() + x) as usize;
        if depth >= self.depth[idx] {
            return false;
        }
        self.depth[idx] = depth;
        self.pixels.put_pixel(x, y, color);
        true
    }

    /// Draw an image in the top-right corner, shrunk to fit if needed
    ///
    /// Returns the covered rectangle as (x, y, width, height).
    pub fn blit_image(&mut self, image: &RgbImage) -> (u32, u32, u32, u32) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 || self.width() == 0 || self.height() == 0 {
            return (self.width(), 0, 0, 0);
        }

        let scale = (self.width() as f32 / iw as f32)
            .min(self.height() as f32 / ih as f32)
            .min(1.0);
        let w = ((iw as f32 * scale) as u32).clamp(1, self.width());
        let h = ((ih as f32 * scale) as u32).clamp(1, self.height());
        let x0 = self.width() - w;

        for y in 0..h {
            let sy = (y as u64 * ih as u64 / h as u64) as u32;
            for x in 0..w {
                let sx = (x as u64 * iw as u64 / w as u64) as u32;
                let Rgb([r, g, b]) = *image.get_pixel(sx, sy);
                self.pixels.put_pixel(x0 + x, y, Rgba([r, g, b, 255]));
            }
        }

        (x0, 0, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_plot_keeps_nearest() {
        let mut canvas = Canvas::new(4, 4);
        canvas.clear(BLACK);
        assert!(canvas.plot(1, 1, 5.0, Rgba([1, 1, 1, 255])));
        assert!(!canvas.plot(1, 1, 7.0, Rgba([2, 2, 2, 255])));
        assert!(canvas.plot(1, 1, 3.0, Rgba([3, 3, 3, 255])));
        assert_eq!(canvas.pixels().get_pixel(1, 1), &Rgba([3, 3, 3, 255]));
    }

    #[test]
    fn test_plot_outside_is_ignored() {
        let mut canvas = Canvas::new(4, 4);
        assert!(!canvas.plot(-1, 0, 1.0, BLACK));
        assert!(!canvas.plot(0, 4, 1.0, BLACK));
    }

    #[test]
    fn test_blit_anchors_top_right() {
        let mut canvas = Canvas::new(10, 8);
        canvas.clear(BLACK);
        let image = RgbImage::from_pixel(4, 2, Rgb([9, 8, 7]));
        assert_eq!(canvas.blit_image(&image), (6, 0, 4, 2));
        assert_eq!(canvas.pixels().get_pixel(9, 0), &Rgba([9, 8, 7, 255]));
        assert_eq!(canvas.pixels().get_pixel(6, 1), &Rgba([9, 8, 7, 255]));
        assert_eq!(canvas.pixels().get_pixel(5, 0), &BLACK);
        assert_eq!(canvas.pixels().get_pixel(9, 2), &BLACK);
    }

    #[test]
    fn test_blit_shrinks_large_images() {
        let mut canvas = Canvas::new(10, 8);
        let image = RgbImage::new(40, 16);
        assert_eq!(canvas.blit_image(&image), (0, 0, 10, 4));
    }
}
