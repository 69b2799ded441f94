use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in global screen coordinates.
///
/// Persisted as `{"x", "y", "w", "h"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "w")]
    pub width: f64,
    #[serde(rename = "h")]
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

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Overlapping region, if the two rectangles share a positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.min_x().max(other.min_x());
        let y0 = self.min_y().max(other.min_y());
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());
        if x1 > x0 && y1 > y0 {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        self.intersection(other).map(|r| r.area()).unwrap_or(0.0)
    }

    /// True when `other` lies entirely inside `self`, allowing `tolerance` per edge.
    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        other.min_x() >= self.min_x() - tolerance
            && other.min_y() >= self.min_y() - tolerance
            && other.max_x() <= self.max_x() + tolerance
            && other.max_y() <= self.max_y() + tolerance
    }

    /// Edge-wise comparison: each of the four edges may differ by at most `tolerance`.
    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.min_x() - other.min_x()).abs() <= tolerance
            && (self.min_y() - other.min_y()).abs() <= tolerance
            && (self.max_x() - other.max_x()).abs() <= tolerance
            && (self.max_y() - other.max_y()).abs() <= tolerance
    }

    /// Squared distance between the centers of two rectangles.
    pub fn center_distance_sq(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).powi(2) + (ay - by).powi(2)
    }

    /// A rectangle of the given size centered within `self`.
    pub fn centered(&self, width: f64, height: f64) -> Rect {
        let (cx, cy) = self.center();
        Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }
}

/// A physical display as seen at a point in time.
///
/// `display_id` is a hardware identifier that is not guaranteed to survive
/// a reboot or display reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayDescriptor {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub display_id: Option<u32>,
    pub frame: Rect,
    #[serde(default, rename = "visibleFrame", skip_serializing_if = "Option::is_none")]
    pub visible_frame: Option<Rect>,
}

impl DisplayDescriptor {
    pub fn new(display_id: Option<u32>, frame: Rect, visible_frame: Rect) -> Self {
        Self {
            display_id,
            frame,
            visible_frame: Some(visible_frame),
        }
    }

    /// The work area: visible frame when known, otherwise the full frame.
    pub fn work_area(&self) -> Rect {
        self.visible_frame.unwrap_or(self.frame)
    }
}
