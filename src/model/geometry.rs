/// A point in canvas pixels, relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PxPoint {
    pub x: f32,
    pub y: f32,
}

impl PxPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: PxPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PxRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PxRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> PxPoint {
        PxPoint::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, p: PxPoint) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.top && p.y < self.bottom()
    }
}
