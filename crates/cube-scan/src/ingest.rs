//! Frame ingest with latest-frame-wins backpressure.
//!
//! The camera callback publishes frames at its own cadence; the pipeline
//! consumes them one at a time. The mailbox holds at most one frame, so a
//! slow consumer sheds load by overwriting, never by queueing.

use std::sync::atomic::{AtomicU64, Ordering};

use cube_scan_core::{CubeColor, Frame};
use log::debug;
use parking_lot::Mutex;

/// Operator commands, applied by the pipeline between frames so they never
/// interleave with a half-processed scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanCommand {
    /// Abandon the current scan session.
    Reset,
    /// Use the next confidently detected face as a calibration reference
    /// for the given color.
    Calibrate(CubeColor),
}

/// Single-slot frame mailbox shared between the camera thread and the
/// pipeline thread.
#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Mutex<Option<Frame>>,
    commands: Mutex<Vec<ScanCommand>>,
    dropped: AtomicU64,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, replacing any frame the pipeline has not yet taken.
    pub fn publish(&self, frame: Frame) {
        let previous = self.slot.lock().replace(frame);
        if previous.is_some() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("frame dropped under backpressure ({total} total)");
        }
    }

    /// Take the latest frame, leaving the slot empty.
    pub fn take(&self) -> Option<Frame> {
        self.slot.lock().take()
    }

    /// Frames overwritten before the pipeline consumed them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queue an operator command for the next pipeline iteration.
    pub fn push_command(&self, command: ScanCommand) {
        self.commands.lock().push(command);
    }

    /// Drain queued commands in submission order.
    pub fn drain_commands(&self) -> Vec<ScanCommand> {
        std::mem::take(&mut *self.commands.lock())
    }
}
