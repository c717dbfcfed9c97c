use serde::{Deserialize, Serialize};

/// Width/height pair in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Padding around a box
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Axis-aligned rectangle in viewport coordinates (like `getBoundingClientRect`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Start edge along the given axis
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left(),
            Axis::Vertical => self.top(),
        }
    }

    /// End edge along the given axis
    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right(),
            Axis::Vertical => self.bottom(),
        }
    }

    /// Extent along the given axis
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Distance from `pos` to this rect along `axis`; zero when inside
    pub fn distance_along(&self, axis: Axis, pos: f64) -> f64 {
        let start = self.start(axis);
        let end = self.end(axis);
        if pos < start {
            start - pos
        } else if pos > end {
            pos - end
        } else {
            0.0
        }
    }
}

/// Scroll axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_inside_and_gap_outside() {
        let rect = Rect::new(0.0, 100.0, 50.0, 200.0);
        assert_eq!(rect.distance_along(Axis::Vertical, 150.0), 0.0);
        assert_eq!(rect.distance_along(Axis::Vertical, 100.0), 0.0);
        assert_eq!(rect.distance_along(Axis::Vertical, 40.0), 60.0);
        assert_eq!(rect.distance_along(Axis::Vertical, 330.0), 30.0);
        assert_eq!(rect.distance_along(Axis::Horizontal, 70.0), 20.0);
    }
}
