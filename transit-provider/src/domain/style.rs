//! Line styles: label shape and colours for drawing line badges.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Product;
use super::error::StyleError;

/// An ARGB colour.
///
/// Serialized as `#rrggbb` when opaque and `#aarrggbb` otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    pub const BLACK: Color = Color(0xff00_0000);
    pub const DARK_GRAY: Color = Color(0xff44_4444);
    pub const GRAY: Color = Color(0xff88_8888);
    pub const LIGHT_GRAY: Color = Color(0xffcc_cccc);
    pub const WHITE: Color = Color(0xffff_ffff);
    pub const RED: Color = Color(0xffff_0000);
    pub const GREEN: Color = Color(0xff00_ff00);
    pub const BLUE: Color = Color(0xff00_00ff);
    pub const YELLOW: Color = Color(0xffff_ff00);
    pub const CYAN: Color = Color(0xff00_ffff);
    pub const MAGENTA: Color = Color(0xffff_00ff);
    pub const TRANSPARENT: Color = Color(0);

    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::argb(0xff, red, green, blue)
    }

    /// Parse `#rrggbb` (opaque) or `#aarrggbb`.
    pub fn parse(s: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Color(0xff00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(invalid()),
        }
    }

    pub fn to_argb(self) -> u32 {
        self.0
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Perceived brightness in `[0, 1)`, weighting the channels as the eye does.
    pub fn perceived_brightness(self) -> f32 {
        (0.299 * f32::from(self.red()) + 0.587 * f32::from(self.green())
            + 0.114 * f32::from(self.blue()))
            / 256.0
    }

    /// White on dark backgrounds, black on light ones.
    pub fn contrasting(self) -> Self {
        if self.perceived_brightness() < 0.5 {
            Color::WHITE
        } else {
            Color::BLACK
        }
    }
}

impl FromStr for Color {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = StyleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha() == 0xff {
            write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
        } else {
            write!(f, "#{:08x}", self.0)
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({self})")
    }
}

/// Outline of a line badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    Rect,
    #[default]
    Rounded,
    Circle,
}

/// How to draw a line's badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub shape: Shape,
    pub background: Color,
    /// Second background colour for split badges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background2: Option<Color>,
    pub foreground: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Color>,
}

impl Style {
    /// A rounded badge.
    pub const fn new(background: Color, foreground: Color) -> Self {
        Self {
            shape: Shape::Rounded,
            background,
            background2: None,
            foreground,
            border: None,
        }
    }

    /// A rounded badge with a readable foreground picked for `background`.
    pub fn from_background(background: Color) -> Self {
        Self::new(background, background.contrasting())
    }

    pub const fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub const fn with_border(mut self, border: Color) -> Self {
        self.border = Some(border);
        self
    }

    pub const fn with_background2(mut self, background2: Color) -> Self {
        self.background2 = Some(background2);
        self
    }

    pub fn has_border(&self) -> bool {
        self.border.is_some()
    }

    /// The generic style of a product, used when a network defines none.
    pub fn standard(product: Option<Product>) -> Self {
        match product {
            Some(Product::HighSpeedTrain) => Style::new(Color::WHITE, Color::RED)
                .with_shape(Shape::Rect)
                .with_border(Color::RED),
            Some(Product::RegionalTrain) => {
                Style::new(Color::GRAY, Color::WHITE).with_shape(Shape::Rect)
            }
            Some(Product::SuburbanTrain) => {
                Style::new(Color::rgb(0x00, 0x6e, 0x34), Color::WHITE).with_shape(Shape::Circle)
            }
            Some(Product::Subway) => {
                Style::new(Color::rgb(0x00, 0x30, 0x90), Color::WHITE).with_shape(Shape::Rect)
            }
            Some(Product::Tram) => {
                Style::new(Color::rgb(0xcc, 0x00, 0x00), Color::WHITE).with_shape(Shape::Rect)
            }
            Some(Product::Bus) => Style::new(Color::rgb(0x99, 0x33, 0x99), Color::WHITE),
            Some(Product::OnDemand) => Style::new(Color::rgb(0x00, 0x69, 0x5c), Color::WHITE),
            Some(Product::Ferry) => Style::new(Color::BLUE, Color::WHITE).with_shape(Shape::Circle),
            Some(Product::Cablecar) | None => Style::new(Color::DARK_GRAY, Color::WHITE),
        }
    }
}

/// Network-specific line styles.
///
/// Keys take the forms `network|P|label` (one line), `network|P` (one
/// product) and `network|BN` (night buses), or the same without the
/// `network|` prefix and with the label appended directly to the product
/// code (`Blabel`, `P`, `BN`). `P` is the [`Product`] code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(HashMap<String, Style>);

const SEP: char = '|';

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, style: Style) -> Option<Style> {
        self.0.insert(key.into(), style)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Style of a line, falling back from the line to its product, then to
    /// night buses, then to [`Style::standard`].
    pub fn lookup(
        &self,
        network: Option<&str>,
        product: Option<Product>,
        label: Option<&str>,
    ) -> Style {
        let Some(product) = product else {
            return Style::standard(None);
        };
        let code = product.code();
        let label = label.unwrap_or_default();
        let night_bus = product == Product::Bus && label.starts_with('N');

        let mut keys = Vec::with_capacity(6);
        if let Some(network) = network {
            keys.push(format!("{network}{SEP}{code}{SEP}{label}"));
            keys.push(format!("{network}{SEP}{code}"));
            if night_bus {
                keys.push(format!("{network}{SEP}BN"));
            }
        }
        keys.push(format!("{code}{label}"));
        keys.push(code.to_string());
        if night_bus {
            keys.push("BN".to_string());
        }

        keys.iter()
            .find_map(|key| self.0.get(key))
            .copied()
            .unwrap_or_else(|| Style::standard(Some(product)))
    }
}

impl FromIterator<(String, Style)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (String, Style)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
