/// 2D point in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Snapped to whole pixels so targets on the same row compare equal.
    #[inline]
    pub fn rounded(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Size of the area the targets live in.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
