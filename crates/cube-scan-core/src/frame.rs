use std::time::Duration;

use crate::RgbImageView;

/// Errors raised when constructing a [`Frame`] from a raw camera buffer.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("invalid RGB buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },

    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// One camera frame: packed RGB8 pixels plus a monotonic timestamp.
///
/// Frames are transient. The pipeline consumes a frame in a single pass and
/// never retains it; the ingest mailbox holds at most one.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
    /// Monotonic time since the frame source started.
    pub timestamp: Duration,
}

impl Frame {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<u8>,
        timestamp: Duration,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidBufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            timestamp,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            pixels: RgbImageView {
                width: self.width,
                height: self.height,
                data: &self.data,
            },
            timestamp: self.timestamp,
        }
    }
}

/// Borrowed frame handed to the processing pipeline.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub pixels: RgbImageView<'a>,
    pub timestamp: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        let err = Frame::new(4, 4, vec![0u8; 10], Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidBufferLength {
                expected: 48,
                got: 10
            }
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = Frame::new(0, 4, Vec::new(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
    }

    #[test]
    fn view_round_trips_dimensions() {
        let frame = Frame::new(2, 3, vec![0u8; 18], Duration::from_millis(7)).unwrap();
        let view = frame.view();
        assert_eq!(view.pixels.width, 2);
        assert_eq!(view.pixels.height, 3);
        assert_eq!(view.timestamp, Duration::from_millis(7));
    }
}
