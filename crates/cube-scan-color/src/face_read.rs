use cube_scan_core::{CubeColor, FaceScan, Rgb, RgbImageView};
use cube_scan_detect::FaceGrid;
use log::debug;

use crate::classify::{Classifier, ClassifyError};
use crate::sampler::{sample_face, SamplerParams, SamplingError};

/// Per-cell classification outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellReading {
    Resolved(CubeColor),
    /// Too close to call; the facelet stays unresolved on this frame.
    Ambiguous { best: CubeColor, second: CubeColor },
}

/// One face read off one frame: a reading per cell plus the raw samples
/// (kept so an explicit calibration pass can reuse them).
#[derive(Clone, Debug)]
pub struct FaceReading {
    pub cells: [CellReading; 9],
    pub samples: [Rgb; 9],
}

impl FaceReading {
    /// Number of facelets that did not resolve on this frame.
    pub fn unresolved_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, CellReading::Ambiguous { .. }))
            .count()
    }

    /// A complete scan, only if all nine cells resolved.
    pub fn to_scan(&self) -> Option<FaceScan> {
        let mut colors = [CubeColor::White; 9];
        for (i, cell) in self.cells.iter().enumerate() {
            match cell {
                CellReading::Resolved(c) => colors[i] = *c,
                CellReading::Ambiguous { .. } => return None,
            }
        }
        Some(FaceScan::new(colors))
    }
}

/// Sample and classify all nine cells of a detected face.
///
/// Sampling failures reject the whole face (`Err`); ambiguity is per cell
/// and leaves the rest of the reading intact for progress reporting.
pub fn read_face(
    pixels: &RgbImageView<'_>,
    grid: &FaceGrid,
    sampler: &SamplerParams,
    classifier: &Classifier,
) -> Result<FaceReading, SamplingError> {
    let samples = sample_face(pixels, grid, sampler)?;

    let mut cells = [CellReading::Resolved(CubeColor::White); 9];
    for (i, &rgb) in samples.iter().enumerate() {
        cells[i] = match classifier.classify(rgb) {
            Ok(color) => CellReading::Resolved(color),
            Err(ClassifyError::Ambiguous { best, second, margin }) => {
                debug!("cell {i} ambiguous: {best:?}/{second:?} margin {margin:.1}");
                CellReading::Ambiguous { best, second }
            }
        };
    }

    Ok(FaceReading { cells, samples })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_reading_produces_no_scan() {
        let reading = FaceReading {
            cells: [
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
                CellReading::Ambiguous {
                    best: CubeColor::Red,
                    second: CubeColor::Orange,
                },
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
                CellReading::Resolved(CubeColor::Red),
            ],
            samples: [[0.0; 3]; 9],
        };
        assert_eq!(reading.unresolved_count(), 1);
        assert!(reading.to_scan().is_none());
    }

    #[test]
    fn fully_resolved_reading_becomes_a_scan() {
        let reading = FaceReading {
            cells: [CellReading::Resolved(CubeColor::Green); 9],
            samples: [[0.0; 3]; 9],
        };
        assert_eq!(reading.unresolved_count(), 0);
        let scan = reading.to_scan().expect("scan");
        assert_eq!(scan, FaceScan::uniform(CubeColor::Green));
        assert_eq!(scan.center(), CubeColor::Green);
    }
}
