use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

pub const DEFAULT_COLOR: Rgb = [128, 128, 128];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Saturation and lightness shared by every generated colour.
const SATURATION: f32 = 0.75;
const LIGHTNESS: f32 = 0.55;

/// `n` colours with hues spread evenly around the wheel, starting at red.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    let step = 360.0 / n.max(1) as f32;
    (0..n).map(|i| hue_to_rgb(i as f32 * step)).collect()
}

fn hue_to_rgb(hue: f32) -> Rgb {
    let rgb: Srgb = Hsl::new(hue, SATURATION, LIGHTNESS).into_color();
    let rgb: Srgb<u8> = rgb.into_format();
    [rgb.red, rgb.green, rgb.blue]
}

// ---------------------------------------------------------------------------
// Label → colour mapping
// ---------------------------------------------------------------------------

/// Maps labels (surface codes, fault names) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Rgb>,
}

impl ColorMap {
    /// Colours are handed out in the order labels are given; duplicates keep
    /// their first colour.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        let palette = generate_palette(unique.len());
        ColorMap {
            mapping: unique.into_iter().zip(palette).collect(),
        }
    }

    pub fn color_for(&self, label: &str) -> Rgb {
        self.mapping.get(label).copied().unwrap_or(DEFAULT_COLOR)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
