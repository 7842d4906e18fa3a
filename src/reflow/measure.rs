//! Text measurement surface.
//!
//! The reflow engine never talks to a font library directly. The rendering
//! backend supplies a [`TextMeasurer`]; tests and previews use the
//! deterministic [`ApproxMeasurer`].

use serde::{Deserialize, Serialize};

/// Rendered size of a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextExtent {
    /// Advance width in points
    pub width: f64,
    /// Line height in points
    pub height: f64,
}

/// Measures strings as the rendering backend would draw them.
pub trait TextMeasurer {
    /// Size of `text` set in `font` at `size` points, on a single line.
    fn measure(&self, font: &str, size: f64, text: &str) -> TextExtent;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, font: &str, size: f64, text: &str) -> TextExtent {
        (**self).measure(font, size, text)
    }
}

/// Font-agnostic estimate based on character counts.
///
/// Ordinary characters advance `char_width × size`; ideographs and kana,
/// which are set full-width, advance `size`. Lines are `line_height × size`
/// tall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproxMeasurer {
    /// Advance of a regular character as a fraction of the font size
    pub char_width: f64,
    /// Line height as a multiple of the font size
    pub line_height: f64,
}

impl ApproxMeasurer {
    /// Create a measurer with explicit factors.
    pub fn new(char_width: f64, line_height: f64) -> Self {
        Self {
            char_width,
            line_height,
        }
    }
}

impl Default for ApproxMeasurer {
    fn default() -> Self {
        Self::new(0.5, 1.2)
    }
}

impl TextMeasurer for ApproxMeasurer {
    fn measure(&self, _font: &str, size: f64, text: &str) -> TextExtent {
        let units: f64 = text
            .chars()
            .map(|c| {
                if super::split::is_spaceless_script_char(c) {
                    1.0
                } else {
                    self.char_width
                }
            })
            .sum();
        TextExtent {
            width: units * size,
            height: self.line_height * size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_measurer() {
        let m = ApproxMeasurer::default();
        let extent = m.measure("Helvetica", 10.0, "abcd");
        assert_eq!(extent.width, 20.0);
        assert_eq!(extent.height, 12.0);

        // Ideographs are full width.
        assert_eq!(m.measure("Mincho", 10.0, "日本").width, 20.0);
    }

    #[test]
    fn test_measurer_by_reference() {
        fn width_of(m: impl TextMeasurer) -> f64 {
            m.measure("any", 12.0, "ab").width
        }
        let m = ApproxMeasurer::default();
        assert_eq!(width_of(&m), 12.0);
    }
}
