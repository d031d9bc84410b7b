//! Local pixel store for buffered windows
//!
//! One 4-byte ARGB record per pixel. The struct doubles as the wire image
//! payload: it serializes to the `{layout, id, width, height, data}` shape
//! the server expects inside a DrawImageCommand, so flushing a buffered
//! window is just "serialize the buffer".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::{Color, WireRect, MAGENTA};

/// Pixel layout marker carried in the wire payload. The server only speaks
/// ARGB; the empty list is part of the wire shape, not actual data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    ARGB(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub layout: PixelLayout,
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Fresh buffer filled with the placeholder color so stale reads are
    /// visible on screen instead of silently black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut buf = Self {
            layout: PixelLayout::ARGB(Vec::new()),
            id: Uuid::new_v4().to_string(),
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        };
        buf.fill(MAGENTA);
        buf
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.argb_bytes();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Out-of-bounds writes are ignored, not errors: callers paint rects
    /// that may hang off the edge and expect the visible part to land.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        if x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let n = (y as usize * self.width as usize + x as usize) * 4;
        self.data[n..n + 4].copy_from_slice(&color.argb_bytes());
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let n = (y as usize * self.width as usize + x as usize) * 4;
        Some(Color::rgba(
            self.data[n + 1],
            self.data[n + 2],
            self.data[n + 3],
            self.data[n],
        ))
    }

    /// Fill every in-bounds pixel of `[x, x+w) x [y, y+h)`.
    pub fn draw_rect(&mut self, rect: WireRect, color: Color) {
        for i in rect.x..rect.right() {
            for j in rect.y..rect.bottom() {
                self.set_pixel(i, j, color);
            }
        }
    }

    /// Image compositing happens at the wire level via DrawImageCommand, not
    /// in the local buffer. This paints the destination rect with a
    /// diagnostic fill so a caller that relies on it sees the gap on screen.
    pub fn draw_image(&mut self, rect: WireRect, _image: &PixelBuffer) {
        self.draw_rect(rect, MAGENTA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Color, WireRect, BLACK, MAGENTA};

    #[test]
    fn test_new_buffer_is_placeholder_filled() {
        let buf = PixelBuffer::new(2, 2);
        assert_eq!(buf.data.len(), 16);
        for n in 0..4 {
            assert_eq!(buf.get_pixel(n % 2, n / 2), Some(MAGENTA));
        }
    }

    #[test]
    fn test_set_pixel_out_of_bounds_is_a_noop() {
        let mut buf = PixelBuffer::new(4, 4);
        let before = buf.data.clone();
        buf.set_pixel(-1, 0, BLACK);
        buf.set_pixel(0, -1, BLACK);
        buf.set_pixel(4, 0, BLACK);
        buf.set_pixel(0, 4, BLACK);
        assert_eq!(buf.data, before);
    }

    #[test]
    fn test_draw_rect_sets_exactly_the_half_open_rect() {
        let mut buf = PixelBuffer::new(8, 8);
        let c = Color::rgb(10, 20, 30);
        buf.draw_rect(WireRect::new(2, 3, 3, 2), c);
        for x in 0..8 {
            for y in 0..8 {
                let inside = (2..5).contains(&x) && (3..5).contains(&y);
                let expected = if inside { c } else { MAGENTA };
                assert_eq!(buf.get_pixel(x, y), Some(expected), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_draw_rect_clips_to_bounds() {
        let mut buf = PixelBuffer::new(4, 4);
        let c = Color::rgb(1, 1, 1);
        // hangs off every edge; only the visible part lands, no panic
        buf.draw_rect(WireRect::new(-2, -2, 8, 8), c);
        for x in 0..4 {
            for y in 0..4 {
                assert_eq!(buf.get_pixel(x, y), Some(c));
            }
        }
    }

    #[test]
    fn test_draw_image_is_a_diagnostic_fill() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.fill(BLACK);
        let img = PixelBuffer::new(2, 2);
        buf.draw_image(WireRect::new(1, 1, 2, 2), &img);
        assert_eq!(buf.get_pixel(0, 0), Some(BLACK));
        assert_eq!(buf.get_pixel(1, 1), Some(MAGENTA));
        assert_eq!(buf.get_pixel(2, 2), Some(MAGENTA));
        assert_eq!(buf.get_pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn test_wire_shape() {
        let mut buf = PixelBuffer::new(1, 1);
        buf.id = "fixed".to_string();
        buf.set_pixel(0, 0, Color::rgba(1, 2, 3, 4));
        let json = serde_json::to_value(&buf).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "layout": {"ARGB": []},
                "id": "fixed",
                "width": 1,
                "height": 1,
                "data": [4, 1, 2, 3],
            })
        );
    }
}
