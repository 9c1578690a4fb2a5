use cube_scan_core::{CubeColor, Rgb, ALL_COLORS};
use log::info;
use palette::{IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

/// Convert a sampled RGB value (channels 0..=255) to CIE Lab (D65).
pub fn lab_from_rgb(rgb: Rgb) -> [f32; 3] {
    let srgb = Srgb::new(rgb[0] / 255.0, rgb[1] / 255.0, rgb[2] / 255.0);
    let lab: Lab = srgb.into_color();
    [lab.l, lab.a, lab.b]
}

/// Calibration profile: one Lab centroid per canonical color.
///
/// The profile is either the fixed default palette or the product of an
/// explicit calibration pass over a reference face. It is never updated
/// implicitly during a scan, so a drifting light source cannot silently
/// skew classification mid-scan. Serializable so a calibrated profile can
/// be stored and reloaded by the embedding application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    /// Lab centroids indexed by [`CubeColor::index`].
    centroids: [[f32; 3]; 6],
}

impl Default for ColorProfile {
    fn default() -> Self {
        let mut centroids = [[0.0f32; 3]; 6];
        for color in ALL_COLORS {
            let [r, g, b] = color.reference_srgb();
            centroids[color.index()] = lab_from_rgb([r as f32, g as f32, b as f32]);
        }
        Self { centroids }
    }
}

impl ColorProfile {
    #[inline]
    pub fn centroid(&self, color: CubeColor) -> [f32; 3] {
        self.centroids[color.index()]
    }

    /// Replace one centroid with the mean Lab of reference samples, e.g.
    /// the nine facelets of a uniform face held up for calibration.
    pub fn calibrate_color(&mut self, color: CubeColor, samples: &[Rgb]) {
        if samples.is_empty() {
            return;
        }
        let mut mean = [0.0f32; 3];
        for s in samples {
            let lab = lab_from_rgb(*s);
            for c in 0..3 {
                mean[c] += lab[c];
            }
        }
        for c in &mut mean {
            *c /= samples.len() as f32;
        }
        info!(
            "calibrated {:?}: Lab ({:.1}, {:.1}, {:.1}) from {} samples",
            color,
            mean[0],
            mean[1],
            mean[2],
            samples.len()
        );
        self.centroids[color.index()] = mean;
    }
}
