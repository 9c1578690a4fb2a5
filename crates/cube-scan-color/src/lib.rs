//! Facelet color sampling and classification.
//!
//! Two stages over a detected [`FaceGrid`](cube_scan_detect::FaceGrid):
//! - the sampler reduces each cell quad to one representative RGB value
//!   (trimmed mean over interior pixels),
//! - the classifier maps that value to one of the six canonical colors by
//!   nearest centroid in CIE Lab, with an explicit ambiguity margin.
//!
//! The classifier's calibration profile never adapts on its own; it changes
//! only through the explicit calibration entry points.

mod classify;
mod face_read;
mod profile;
mod sampler;

pub use classify::{Classifier, ClassifierParams, ClassifyError};
pub use face_read::{read_face, CellReading, FaceReading};
pub use profile::{lab_from_rgb, ColorProfile};
pub use sampler::{sample_cell, sample_face, SamplerParams, SamplingError};
