//! High-level facade crate for the `cube-scan-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying pipeline crates
//! - the frame ingest mailbox (latest-frame-wins backpressure)
//! - the [`Scanner`] driving detect -> sample -> classify -> aggregate per
//!   frame
//! - (feature-gated) bridges from `image` buffers to core frame types.
//!
//! ## Quickstart
//!
//! ```no_run
//! use cube_scan::{interop, ScanEvent, Scanner};
//! use image::ImageReader;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("face.png")?.decode()?.to_rgb8();
//! let frame = interop::frame_from_image(&img, Duration::ZERO)?;
//!
//! let mut scanner = Scanner::default();
//! for event in scanner.process_frame(&frame.view()) {
//!     if let ScanEvent::Complete(state) = event {
//!         println!("{}", state.to_facelet_string());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `cube_scan::core`: frames, facelet types, homographies, the cube state.
//! - `cube_scan::detect`: the 3x3 face-grid detector.
//! - `cube_scan::color`: facelet sampling and Lab color classification.
//! - `cube_scan::state`: scan aggregation and combinatorial validation.
//! - `cube_scan::ingest`: the single-slot frame mailbox and operator commands.
//! - `cube_scan::pipeline`: the per-frame [`Scanner`].
//! - `cube_scan::interop` (feature `image`): `image::RgbImage` bridges.

pub use cube_scan_color as color;
pub use cube_scan_core as core;
pub use cube_scan_detect as detect;
pub use cube_scan_state as state;

pub mod ingest;
#[cfg(feature = "image")]
pub mod interop;
pub mod pipeline;

pub use cube_scan_core::{CubeColor, CubeState, FaceScan, Frame, FrameError};
pub use cube_scan_state::{ScanPhase, StateSnapshot, ValidationError};
pub use ingest::{FrameMailbox, ScanCommand};
pub use pipeline::{ScanEvent, Scanner, ScannerParams, ScannerSnapshot};
