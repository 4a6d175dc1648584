use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

pub const CRITICAL_RED: Color32 = Color32::from_rgb(0xFF, 0x4B, 0x4B);
pub const MAJOR_ORANGE: Color32 = Color32::from_rgb(0xFF, 0xA5, 0x00);
pub const MINOR_GOLD: Color32 = Color32::from_rgb(0xFF, 0xD7, 0x00);
pub const LOW_GREEN: Color32 = Color32::from_rgb(0x90, 0xEE, 0x90);
pub const TIMELINE_BLUE: Color32 = Color32::from_rgb(0x1F, 0x77, 0xB4);

/// Fixed colours for the known severity levels; anything else is grey.
pub fn severity_color(severity: &str) -> Color32 {
    match severity {
        "Critical" => CRITICAL_RED,
        "Major" => MAJOR_ORANGE,
        "Minor" => MINOR_GOLD,
        "Low" => LOW_GREEN,
        _ => Color32::GRAY,
    }
}

/// Shade from light to dark red by `fraction` in `[0, 1]`, for count-scaled bars.
pub fn heat_color(fraction: f64) -> Color32 {
    let t = fraction.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(0.0, 0.75, 0.85 - 0.45 * t);
    to_color32(hsl.into_color())
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.7);
            to_color32(hsl.into_color())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical field to distinct colours.
/// Built from the whole dataset so colours stay put while filters change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(unique_values: &BTreeSet<String>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping = unique_values.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }

    #[test]
    fn unknown_values_fall_back_to_grey() {
        let values: BTreeSet<String> = ["Open", "Closed"].iter().map(|s| s.to_string()).collect();
        let map = ColorMap::new(&values);
        assert_ne!(map.color_for("Open"), map.color_for("Closed"));
        assert_eq!(map.color_for("Deferred"), Color32::GRAY);
        assert_eq!(severity_color("Trivial"), Color32::GRAY);
    }
}
