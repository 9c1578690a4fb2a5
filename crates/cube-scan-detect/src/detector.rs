use std::collections::VecDeque;

use cube_scan_core::{FrameView, Homography};
use log::{debug, trace};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::blobs::{label_flat_regions, sticker_candidates, BlobParams};
use crate::gradient::{box_downscale, sobel_magnitude};
use crate::grid::{fit_face_lattice, LatticeParams};

/// Configuration for the face detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaceDetectorParams {
    /// Frames larger than this on either side are box-downscaled before
    /// gradient analysis. Detection geometry is reported at full resolution.
    pub max_dim: usize,
    /// Sticker-candidate extraction.
    pub blob: BlobParams,
    /// 3x3 lattice grouping.
    pub lattice: LatticeParams,
    /// Sticker extent relative to the lattice pitch; cell quads cover this
    /// much of each cell so borders stay outside the sampled region.
    pub sticker_frac: f32,
    /// Maximal allowed max/min cell-area ratio across the nine cells.
    pub max_cell_area_ratio: f32,
}

impl Default for FaceDetectorParams {
    fn default() -> Self {
        Self {
            max_dim: 640,
            blob: BlobParams::default(),
            lattice: LatticeParams::default(),
            sticker_frac: 0.8,
            max_cell_area_ratio: 2.5,
        }
    }
}

/// A detected face: nine convex cell quads in full-resolution frame
/// coordinates, row-major with row 0 at the top, plus the grid homography
/// and a confidence score in [0, 1].
#[derive(Clone, Debug)]
pub struct FaceGrid {
    pub cells: [[Point2<f32>; 4]; 9],
    /// Lattice coords (i right, j down, -1..=1) to frame pixels.
    pub homography: Homography,
    pub confidence: f32,
}

impl FaceGrid {
    /// Cell quad for (row, col), both in 0..3.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &[Point2<f32>; 4] {
        &self.cells[row * 3 + col]
    }
}

/// Stateless per-frame face detector.
pub struct FaceDetector {
    params: FaceDetectorParams,
}

impl FaceDetector {
    pub fn new(params: FaceDetectorParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &FaceDetectorParams {
        &self.params
    }

    /// Locate one cube face in the frame.
    ///
    /// Returns `None` when no sufficiently square, evenly gridded 3x3
    /// pattern is present, including partial occlusion.
    pub fn detect(&self, frame: &FrameView<'_>) -> Option<FaceGrid> {
        let luma = frame.pixels.to_luma();

        // max_dim is config supplied; treat 0 as "downscale everything".
        let factor = (luma.width.max(luma.height))
            .div_ceil(self.params.max_dim.max(1))
            .max(1);
        let small = box_downscale(&luma, factor);
        let grad = sobel_magnitude(&small);

        let blobs = label_flat_regions(&grad, self.params.blob.flat_threshold);
        let candidates = sticker_candidates(&blobs, small.width * small.height, &self.params.blob);
        trace!(
            "face detect: {} flat regions, {} sticker candidates",
            blobs.len(),
            candidates.len()
        );

        let fit = fit_face_lattice(&candidates, &self.params.lattice)?;
        debug!(
            "lattice fit: pitch {:.1}px rms {:.2}px confidence {:.2}",
            fit.pitch * factor as f32,
            fit.rms * factor as f32,
            fit.confidence
        );

        let homography = fit.homography.scaled_output(factor as f64);
        let cells = self.build_cells(&homography)?;

        Some(FaceGrid {
            cells,
            homography,
            confidence: fit.confidence,
        })
    }

    /// Map the nine sticker quads through the homography, enforcing the
    /// FaceGrid invariants: convex cells of roughly equal area.
    fn build_cells(&self, h: &Homography) -> Option<[[Point2<f32>; 4]; 9]> {
        let half = 0.5 * self.params.sticker_frac;
        let mut cells = [[Point2::origin(); 4]; 9];
        let mut min_area = f32::INFINITY;
        let mut max_area = 0.0f32;

        for row in 0..3 {
            for col in 0..3 {
                let cx = col as f32 - 1.0;
                let cy = row as f32 - 1.0;
                let quad = [
                    h.apply(Point2::new(cx - half, cy - half)),
                    h.apply(Point2::new(cx + half, cy - half)),
                    h.apply(Point2::new(cx + half, cy + half)),
                    h.apply(Point2::new(cx - half, cy + half)),
                ];
                if !is_convex(&quad) {
                    return None;
                }
                let area = quad_area(&quad);
                min_area = min_area.min(area);
                max_area = max_area.max(area);
                cells[row * 3 + col] = quad;
            }
        }

        if max_area > self.params.max_cell_area_ratio * min_area {
            return None;
        }
        Some(cells)
    }
}

fn is_convex(quad: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f32;
    for k in 0..4 {
        let a = quad[k];
        let b = quad[(k + 1) % 4];
        let c = quad[(k + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = cross;
        } else if sign * cross < 0.0 {
            return false;
        }
    }
    true
}

fn quad_area(quad: &[Point2<f32>; 4]) -> f32 {
    let mut sum = 0.0f32;
    for k in 0..4 {
        let a = quad[k];
        let b = quad[(k + 1) % 4];
        sum += a.x * b.y - b.x * a.y;
    }
    0.5 * sum.abs()
}

/// Rolling-mean smoothing of detection confidence across the last N frames.
///
/// Reduces flicker: a single strong detection after a run of misses does
/// not pass the gate, and a single miss within a steady run does not drop
/// it. Frames without a detection push zero confidence.
#[derive(Clone, Debug)]
pub struct ConfidenceGate {
    window: VecDeque<f32>,
    capacity: usize,
    min_mean: f32,
}

impl ConfidenceGate {
    pub fn new(capacity: usize, min_mean: f32) -> Self {
        assert!(capacity >= 1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            min_mean,
        }
    }

    /// Record this frame's confidence (zero if nothing was detected) and
    /// report whether the smoothed confidence passes the gate.
    pub fn admit(&mut self, confidence: f32) -> bool {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(confidence);
        let mean: f32 = self.window.iter().sum::<f32>() / self.window.len() as f32;
        mean >= self.min_mean
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
