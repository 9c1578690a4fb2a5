//! Bridges between `image` buffers and the core frame types.

use std::time::Duration;

use cube_scan_core::{Frame, FrameError, RgbImageView};

/// Borrow an `image::RgbImage` as the lightweight core view type, without
/// copying pixels.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Build an owned [`Frame`] from an `image::RgbImage`, e.g. for publishing
/// a decoded still into the ingest mailbox.
pub fn frame_from_image(img: &::image::RgbImage, timestamp: Duration) -> Result<Frame, FrameError> {
    Frame::new(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
        timestamp,
    )
}
