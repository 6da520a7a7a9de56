use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::config::ChartTheme;
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Start at a blue-ish hue so a two-label chart reads blue/orange.
            let hue = (210.0 + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: outcome label → Color32
// ---------------------------------------------------------------------------

/// Maps outcome labels to distinct colours, so the raw and filtered charts
/// paint the same label the same way.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map over the given labels.
    pub fn new<'a, I>(labels: I, theme: &ChartTheme) -> Self
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let labels: Vec<&CellValue> = labels.into_iter().collect();
        let palette = generate_palette(labels.len(), theme.saturation, theme.lightness);
        let mapping = labels
            .into_iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given label.
    pub fn color_for(&self, value: &CellValue) -> Color32 {
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
    fn palette_has_requested_size_and_distinct_colours() {
        let colours = generate_palette(4, 0.75, 0.55);
        assert_eq!(colours.len(), 4);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0, 0.75, 0.55).is_empty());
    }

    #[test]
    fn unknown_labels_fall_back_to_gray() {
        let labels = [CellValue::from("no"), CellValue::from("yes")];
        let map = ColorMap::new(&labels, &ChartTheme::default());
        assert_ne!(map.color_for(&labels[0]), map.color_for(&labels[1]));
        assert_eq!(map.color_for(&CellValue::from("maybe")), Color32::GRAY);
    }
}
