//! To maintain a theme of colors, I will add colors here as constants so
//! the UI does not look bad at any point.
//!
//! - FERRITE_RUST: Main Color
//! - FERRITE_GREY: Secondary Color, for row separators and hints

use colored::Color;

pub(crate) const FERRITE_RUST: Color = Color::TrueColor {
    r: 183,
    g: 65,
    b: 14,
};

pub(crate) const FERRITE_GREY: Color = Color::TrueColor {
    r: 140,
    g: 140,
    b: 140,
};
