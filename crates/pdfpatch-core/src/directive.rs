//! Text replacement directives
//!
//! A directive names a page, a layout-space box (origin top-left, as reported
//! by text extraction), the replacement text and the background color used to
//! erase whatever was drawn inside the box.

use serde::{Deserialize, Serialize};

use crate::error::{PdfPatchError, Result};

/// Rectangle in layout space: points, origin at the page's top-left corner,
/// y growing downward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

fn full_intensity() -> f64 {
    1.0
}

/// Fill color for the erasure box, each component in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RgbColor {
    #[serde(default = "full_intensity")]
    pub r: f64,
    #[serde(default = "full_intensity")]
    pub g: f64,
    #[serde(default = "full_intensity")]
    pub b: f64,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const BLACK: RgbColor = RgbColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One requested text replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directive {
    /// 0-based page index. Negative values are accepted on the wire and
    /// never match a page.
    #[serde(rename = "page")]
    pub page_index: i64,

    /// Text that was extracted from the box. Only used for logging; the
    /// overlay path never searches the content stream for it.
    #[serde(rename = "orig", default)]
    pub original_text: String,

    #[serde(rename = "text")]
    pub replacement_text: String,

    #[serde(flatten)]
    pub rect: LayoutRect,

    #[serde(flatten)]
    pub color: RgbColor,
}

impl Directive {
    pub fn new(page_index: i64, replacement_text: impl Into<String>, rect: LayoutRect) -> Self {
        Self {
            page_index,
            original_text: String::new(),
            replacement_text: replacement_text.into(),
            rect,
            color: RgbColor::default(),
        }
    }

    pub fn with_original(mut self, original_text: impl Into<String>) -> Self {
        self.original_text = original_text.into();
        self
    }

    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }

    /// Parse an ordered directive list from its JSON wire form.
    pub fn from_json_list(json: &str) -> Result<Vec<Directive>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Page index as a document position, `None` when negative.
    pub fn page_position(&self) -> Option<usize> {
        usize::try_from(self.page_index).ok()
    }

    /// Reject geometry and colors that would produce a malformed content stream.
    pub fn validate(&self) -> Result<()> {
        let LayoutRect {
            x,
            y,
            width,
            height,
        } = self.rect;

        for (name, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(PdfPatchError::InvalidDirective(format!(
                    "{} is not a finite number",
                    name
                )));
            }
        }
        if width < 0.0 || height < 0.0 {
            return Err(PdfPatchError::InvalidDirective(format!(
                "negative box size {}x{}",
                width, height
            )));
        }

        for (name, value) in [("r", self.color.r), ("g", self.color.g), ("b", self.color.b)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PdfPatchError::InvalidDirective(format!(
                    "color component {} = {} outside [0, 1]",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
