//! Overlay fragment synthesis
//!
//! An overlay is one content-stream fragment: a filled rectangle in the
//! background color that hides the old glyphs, then the replacement text
//! shown in black on top of it.

use crate::coords::UserPoint;
use crate::directive::{LayoutRect, RgbColor};
use crate::encoding::escape_literal;

/// Fraction of the box height trimmed from the erase rectangle's bottom edge
const ERASE_SHRINK_HEIGHT: f64 = 0.15;
/// Fraction of the box width trimmed from the erase rectangle, split evenly left/right
const ERASE_SHRINK_WIDTH: f64 = 0.05;
/// Baseline offset above the box bottom, as a fraction of the box height
const BASELINE_RATIO: f64 = 0.15;
/// Font size as a fraction of the box height
const FONT_SIZE_RATIO: f64 = 0.82;

const TEXT_COLOR: RgbColor = RgbColor::BLACK;

/// Filled rectangle in user space, `re` operand order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraseRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    pub erase: EraseRect,
    pub text_origin: UserPoint,
    pub font_size: f64,
}

impl OverlayGeometry {
    /// Placement for a box whose bottom-left user-space corner is `origin`.
    ///
    /// The erase rectangle is slightly smaller than the box so table rules
    /// and underlines flush against the glyphs survive.
    pub fn compute(origin: UserPoint, rect: &LayoutRect) -> Self {
        let shrink_y = ERASE_SHRINK_HEIGHT * rect.height;
        let shrink_w = ERASE_SHRINK_WIDTH * rect.width;

        Self {
            erase: EraseRect {
                x: origin.x + shrink_w / 2.0,
                y: origin.y + shrink_y,
                width: rect.width - shrink_w,
                height: rect.height - shrink_y * 1.5,
            },
            text_origin: UserPoint {
                x: origin.x,
                y: origin.y + BASELINE_RATIO * rect.height,
            },
            font_size: FONT_SIZE_RATIO * rect.height,
        }
    }
}

/// Content-stream number: at most 4 decimals, no trailing zeros.
pub fn format_number(value: f64) -> String {
    let mut s = format!("{:.4}", value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn color_op(out: &mut String, color: &RgbColor) {
    out.push_str(&format!(
        "{} {} {} rg\n",
        format_number(color.r),
        format_number(color.g),
        format_number(color.b)
    ));
}

/// Erase-and-redraw fragment. `text` must already be in the font's encoding.
///
/// The fragment is wrapped in `q`/`Q`, paints exactly one rectangle and
/// shows exactly one string. Text is not measured or wrapped; a long string
/// runs past the erase rectangle.
pub fn compose_fragment(
    geometry: &OverlayGeometry,
    background: &RgbColor,
    font_name: &str,
    text: &[u8],
) -> Vec<u8> {
    let erase = &geometry.erase;
    let mut ops = String::with_capacity(160);

    ops.push_str("q\n");
    color_op(&mut ops, background);
    ops.push_str(&format!(
        "{} {} {} {} re\n",
        format_number(erase.x),
        format_number(erase.y),
        format_number(erase.width),
        format_number(erase.height)
    ));
    ops.push_str("f\n");

    color_op(&mut ops, &TEXT_COLOR);
    ops.push_str("BT\n");
    ops.push_str(&format!(
        "/{} {} Tf\n",
        font_name,
        format_number(geometry.font_size)
    ));
    ops.push_str(&format!(
        "{} {} Td\n",
        format_number(geometry.text_origin.x),
        format_number(geometry.text_origin.y)
    ));

    let mut bytes = ops.into_bytes();
    bytes.push(b'(');
    bytes.extend_from_slice(&escape_literal(text));
    bytes.extend_from_slice(b") Tj\nET\nQ\n");
    bytes
}
