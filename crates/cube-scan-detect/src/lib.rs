//! Cube face grid detection.
//!
//! Finds the 3x3 sticker layout of one cube face in a camera frame:
//! - flat (low-gradient) regions are labeled as sticker candidates,
//! - nine candidates are grouped into a square lattice,
//! - a homography is fit over the nine centroids and gated on residuals.
//!
//! Detection is stateless per frame; temporal smoothing of the confidence
//! score lives in [`ConfidenceGate`] so callers opt into it explicitly.

mod blobs;
mod detector;
mod gradient;
mod grid;

pub use blobs::{label_flat_regions, sticker_candidates, Blob, BlobParams};
pub use detector::{ConfidenceGate, FaceDetector, FaceDetectorParams, FaceGrid};
pub use gradient::{box_downscale, sobel_magnitude, GradientPlane};
pub use grid::{fit_face_lattice, LatticeFit, LatticeParams};
