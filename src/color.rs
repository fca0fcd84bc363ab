use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::Site;

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
            let hue = 20.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Site colours
// ---------------------------------------------------------------------------

/// One fixed colour per site so every chart agrees.
#[derive(Debug, Clone)]
pub struct SiteColors {
    colors: Vec<Color32>,
}

impl Default for SiteColors {
    fn default() -> Self {
        Self {
            colors: generate_palette(Site::ALL.len()),
        }
    }
}

impl SiteColors {
    pub fn color_for(&self, site: Site) -> Color32 {
        Site::ALL
            .iter()
            .position(|&s| s == site)
            .and_then(|i| self.colors.get(i).copied())
            .unwrap_or(Color32::GRAY)
    }

    /// Legend entries (site label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(&'static str, Color32)> {
        Site::ALL.iter().map(|&s| (s.label(), self.color_for(s))).collect()
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for correlation coefficients
// ---------------------------------------------------------------------------

/// Blue for −1, white for 0, red for +1. NaN maps to grey.
pub fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::GRAY;
    }
    let r = r.clamp(-1.0, 1.0) as f32;
    let white = LinSrgb::new(1.0, 1.0, 1.0);
    let end: LinSrgb = if r >= 0.0 {
        Srgb::new(0.70, 0.09, 0.17).into_linear()
    } else {
        Srgb::new(0.13, 0.40, 0.67).into_linear()
    };
    let mixed = white.mix(end, r.abs());
    to_color32(Srgb::from_linear(mixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert_ne!(p[0], p[1]);
        assert_ne!(p[1], p[2]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn every_site_has_its_own_colour() {
        let colors = SiteColors::default();
        let entries = colors.legend_entries();
        assert_eq!(entries.len(), 3);
        assert_ne!(colors.color_for(Site::Benin), colors.color_for(Site::Togo));
    }

    #[test]
    fn correlation_scale_is_white_at_zero() {
        assert_eq!(correlation_color(0.0), Color32::from_rgb(255, 255, 255));
        assert_eq!(correlation_color(f64::NAN), Color32::GRAY);
        let red = correlation_color(1.0);
        assert!(red.r() > red.b());
        let blue = correlation_color(-1.0);
        assert!(blue.b() > blue.r());
    }
}
