//! Line colors

use plotters::style::RGBColor;

/// Default line colors, cycled in order.
pub const DEFAULT_COLORS: [RGBColor; 8] = [
    RGBColor(0x37, 0x7e, 0xb8),
    RGBColor(0xe4, 0x1a, 0x1c),
    RGBColor(0x4d, 0xaf, 0x4a),
    RGBColor(0x98, 0x4e, 0xa3),
    RGBColor(0xff, 0x7f, 0x00),
    RGBColor(0xff, 0xff, 0x33),
    RGBColor(0xa6, 0x56, 0x28),
    RGBColor(0xf7, 0x81, 0xbf),
];

/// Colors handed to the renderer, one per series.
///
/// A palette is a plain value: every plot starts from the first color
/// unless the caller keeps and advances its own palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<RGBColor>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl Palette {
    /// Palette cycling through `colors`; an empty list falls back to the
    /// default colors.
    #[must_use]
    pub fn new(colors: Vec<RGBColor>) -> Self {
        if colors.is_empty() {
            Self::default()
        } else {
            Self { colors }
        }
    }

    /// Color of series `index`, wrapping around.
    #[must_use]
    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }

    /// Number of distinct colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least one color.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Parse `#rrggbb` (leading `#` optional).
    #[must_use]
    pub fn parse_hex(value: &str) -> Option<RGBColor> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
    }
}
