use serde::{Deserialize, Serialize};

/// Plain 2D vector value type. Operations return new values; there is no
/// in-place mutation API.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// A zero vector normalizes to itself rather than dividing by zero.
    /// The comparison is exact, not epsilon-based.
    pub fn normalize(&self) -> Vec2 {
        let m = self.magnitude();
        if m == 0.0 {
            *self
        } else {
            Vec2::new(self.x / m, self.y / m)
        }
    }

    pub fn scale(&self, k: f64) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}
