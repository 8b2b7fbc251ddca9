//! 2D court coordinates.

use serde::{Deserialize, Serialize};

/// A point on the court in logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linearly interpolates towards `other`.
    /// `t` is clamped to [0, 1], so the result never leaves the segment.
    #[inline]
    pub fn lerp(&self, other: Position, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    #[inline]
    pub fn distance(&self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[inline]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Heading from `self` to `other` in degrees, 0 pointing along +x.
    #[inline]
    pub fn heading_to(&self, other: Position) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Displacement per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0 };

    /// Velocity covering `from -> to` in `duration_ms`.
    pub fn between(from: Position, to: Position, duration_ms: f64) -> Self {
        if duration_ms <= 0.0 {
            return Self::ZERO;
        }
        let secs = duration_ms / 1000.0;
        Self {
            x: (to.x - from.x) / secs,
            y: (to.y - from.y) / secs,
        }
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}
