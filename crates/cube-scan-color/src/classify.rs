use cube_scan_core::{CubeColor, Rgb, ALL_COLORS};
use serde::{Deserialize, Serialize};

use crate::profile::{lab_from_rgb, ColorProfile};

/// Classifier tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierParams {
    /// Minimal Lab distance between the best and second-best centroid for a
    /// classification to count. Below this the facelet is ambiguous.
    pub min_separation: f32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_separation: 10.0,
        }
    }
}

/// Classification failures: one ambiguous facelet rejects only itself; the
/// face is retried until all nine resolve on some later frame.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ClassifyError {
    #[error("color too close to call: {best:?} vs {second:?} (margin dE {margin:.1})")]
    Ambiguous {
        best: CubeColor,
        second: CubeColor,
        margin: f32,
    },
}

/// Nearest-centroid classifier over a [`ColorProfile`].
#[derive(Clone, Debug)]
pub struct Classifier {
    profile: ColorProfile,
    params: ClassifierParams,
}

impl Classifier {
    pub fn new(profile: ColorProfile, params: ClassifierParams) -> Self {
        Self { profile, params }
    }

    #[inline]
    pub fn profile(&self) -> &ColorProfile {
        &self.profile
    }

    #[inline]
    pub fn profile_mut(&mut self) -> &mut ColorProfile {
        &mut self.profile
    }

    /// Classify a sampled RGB value.
    pub fn classify(&self, rgb: Rgb) -> Result<CubeColor, ClassifyError> {
        self.classify_lab(lab_from_rgb(rgb))
    }

    /// Classify a Lab value directly.
    pub fn classify_lab(&self, lab: [f32; 3]) -> Result<CubeColor, ClassifyError> {
        let mut best = CubeColor::White;
        let mut best_d = f32::INFINITY;
        let mut second = CubeColor::White;
        let mut second_d = f32::INFINITY;

        for color in ALL_COLORS {
            let c = self.profile.centroid(color);
            let d = ((lab[0] - c[0]).powi(2) + (lab[1] - c[1]).powi(2) + (lab[2] - c[2]).powi(2))
                .sqrt();
            if d < best_d {
                second = best;
                second_d = best_d;
                best = color;
                best_d = d;
            } else if d < second_d {
                second = color;
                second_d = d;
            }
        }

        let margin = second_d - best_d;
        if margin < self.params.min_separation {
            return Err(ClassifyError::Ambiguous {
                best,
                second,
                margin,
            });
        }
        Ok(best)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ColorProfile::default(), ClassifierParams::default())
    }
}
