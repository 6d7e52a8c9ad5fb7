//! Coordinate transformation between layout space and PDF user space
//!
//! Layout space is what text extraction reports: origin at the top-left of
//! the visible page box, y growing downward. PDF user space has its origin at
//! the bottom-left, y growing upward. Both are in unscaled points; a box
//! measured on a zoomed rendering must be divided by the zoom before it gets
//! here.

use serde::Serialize;

use crate::directive::LayoutRect;

/// Visible page box in user space.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PageBounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBounds {
    /// US Letter, used when a page has no usable box
    pub const LETTER: PageBounds = PageBounds {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    /// Build from a PDF rectangle `[llx lly urx ury]`, normalizing corner order.
    pub fn from_corners(a: [f64; 4]) -> Self {
        Self {
            x0: a[0].min(a[2]),
            y0: a[1].min(a[3]),
            x1: a[0].max(a[2]),
            y1: a[1].max(a[3]),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn top(&self) -> f64 {
        self.y1
    }
}

/// Point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserPoint {
    pub x: f64,
    pub y: f64,
}

/// Bottom-left corner of `rect` in user space.
///
/// For a page box starting at the origin this is `x' = x`, `y' = H - y - h`.
pub fn layout_to_user(bounds: &PageBounds, rect: &LayoutRect) -> UserPoint {
    UserPoint {
        x: bounds.x0 + rect.x,
        y: bounds.top() - rect.y - rect.height,
    }
}

/// Inverse of [`layout_to_user`] for a box of the given height.
pub fn user_to_layout(bounds: &PageBounds, origin: &UserPoint, height: f64) -> (f64, f64) {
    (origin.x - bounds.x0, bounds.top() - origin.y - height)
}
