//! Geometry and color primitives shared by the wire format and the pixel buffer

use serde::{Deserialize, Serialize};

/// Caller-facing rectangle. Fractional coordinates are allowed here and
/// floored at the wire boundary - the server only understands whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_ints(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x: x as f64,
            y: y as f64,
            w: w as f64,
            h: h as f64,
        }
    }

    /// A rect with a NaN component cannot be floored or transmitted.
    pub fn is_valid(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan() || self.w.is_nan() || self.h.is_nan())
    }

    pub fn floored(&self) -> WireRect {
        WireRect {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            w: self.w.floor() as i32,
            h: self.h.floor() as i32,
        }
    }
}

/// Integer rectangle as it travels on the wire and as the pixel buffer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WireRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// One past the right-most column.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }
}

/// 8-bit rgba color. The buffer and the wire both store ARGB byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn argb_bytes(&self) -> [u8; 4] {
        [self.a, self.r, self.g, self.b]
    }
}

pub const BLACK: Color = Color::rgb(0, 0, 0);
pub const WHITE: Color = Color::rgb(255, 255, 255);
/// Also the placeholder fill for fresh pixel buffers.
pub const MAGENTA: Color = Color::rgb(255, 0, 255);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floored_rounds_toward_negative_infinity() {
        let r = Rect::new(-1.5, 2.9, 10.7, 0.2);
        assert_eq!(r.floored(), WireRect::new(-2, 2, 10, 0));
    }

    #[test]
    fn test_nan_component_invalidates_rect() {
        assert!(Rect::new(1.0, 2.0, 3.0, 4.0).is_valid());
        assert!(!Rect::new(f64::NAN, 2.0, 3.0, 4.0).is_valid());
        assert!(!Rect::new(1.0, 2.0, 3.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_argb_byte_order() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.argb_bytes(), [4, 1, 2, 3]);
    }
}
