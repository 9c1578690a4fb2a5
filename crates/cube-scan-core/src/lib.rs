//! Core types and utilities for cube face scanning.
//!
//! This crate is intentionally small: frames, image views, homographies and
//! the symbolic cube-state types. It does *not* depend on any concrete
//! detector or classifier.

mod facelet;
mod frame;
mod homography;
mod image;
mod logger;

pub use facelet::{
    CubeColor, CubeState, FaceScan, FaceletAddress, Rgb, ALL_COLORS, FACELETS_PER_FACE,
    FACE_ORDER_URFDLB, TOTAL_FACELETS,
};
pub use frame::{Frame, FrameError, FrameView};
pub use homography::{estimate_grid_homography, homography_from_quad, Homography};
pub use image::{sample_bilinear_rgb, GrayImage, RgbImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
