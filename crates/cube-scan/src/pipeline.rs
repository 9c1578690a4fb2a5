//! Per-frame processing pipeline: detect, sample, classify, aggregate.

use cube_scan_color::{read_face, Classifier, ClassifierParams, SamplerParams};
use cube_scan_core::{CubeColor, CubeState, FrameView};
use cube_scan_detect::{ConfidenceGate, FaceDetector, FaceDetectorParams};
use cube_scan_state::{
    AggregateError, AggregatorParams, RecordOutcome, ScanAggregator, StateSnapshot,
    ValidationError,
};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::ingest::{FrameMailbox, ScanCommand};

/// Configuration for the whole pipeline, one section per stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerParams {
    pub detector: FaceDetectorParams,
    pub sampler: SamplerParams,
    pub classifier: ClassifierParams,
    pub aggregator: AggregatorParams,
    /// Confidence smoothing window, in frames.
    pub gate_frames: usize,
    /// Minimal smoothed detection confidence to act on a frame.
    pub gate_min_mean: f32,
}

impl Default for ScannerParams {
    fn default() -> Self {
        Self {
            detector: FaceDetectorParams::default(),
            sampler: SamplerParams::default(),
            classifier: ClassifierParams::default(),
            aggregator: AggregatorParams::default(),
            gate_frames: 5,
            gate_min_mean: 0.5,
        }
    }
}

/// Operator-visible happenings on one processed frame.
///
/// Per-frame failures (no detection, sampling failure, unresolved facelets)
/// produce no event; the next frame retries them for free.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanEvent {
    FaceRecorded { face: CubeColor },
    FaceReplaced { face: CubeColor },
    Complete(CubeState),
    DuplicateCenter {
        center: CubeColor,
        seen: u32,
        needed: u32,
    },
    ValidationFailed(ValidationError),
    Calibrated { color: CubeColor },
}

/// Progress snapshot for UI overlay, decoupled from the live state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannerSnapshot {
    pub state: StateSnapshot,
    /// Unresolved facelets on the face currently in view, when one is.
    pub unresolved_in_view: Option<usize>,
    /// Frames dropped by the ingest mailbox under backpressure, filled in
    /// by [`Scanner::service`].
    pub frames_dropped: u64,
}

/// The consumer side of the recognizer: owns every pipeline stage and the
/// scan-session state machine. Single-threaded by design; observers get
/// [`Scanner::snapshot`] copies.
pub struct Scanner {
    detector: FaceDetector,
    sampler: SamplerParams,
    classifier: Classifier,
    aggregator: ScanAggregator,
    gate: ConfidenceGate,
    pending_calibration: Option<CubeColor>,
    unresolved_in_view: Option<usize>,
    frames_dropped: u64,
}

impl Scanner {
    pub fn new(params: ScannerParams) -> Self {
        Self {
            detector: FaceDetector::new(params.detector),
            sampler: params.sampler,
            classifier: Classifier::new(Default::default(), params.classifier),
            aggregator: ScanAggregator::new(params.aggregator),
            gate: ConfidenceGate::new(params.gate_frames, params.gate_min_mean),
            pending_calibration: None,
            unresolved_in_view: None,
            frames_dropped: 0,
        }
    }

    /// The color classifier, e.g. for loading a saved calibration profile.
    pub fn classifier_mut(&mut self) -> &mut Classifier {
        &mut self.classifier
    }

    /// The validated cube state, once the session completed.
    pub fn cube_state(&self) -> Option<&CubeState> {
        self.aggregator.cube_state()
    }

    pub fn snapshot(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            state: self.aggregator.snapshot(),
            unresolved_in_view: self.unresolved_in_view,
            frames_dropped: self.frames_dropped,
        }
    }

    /// Abandon the current session and all smoothing state.
    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.gate.reset();
        self.pending_calibration = None;
        self.unresolved_in_view = None;
    }

    /// Arm calibration: the next confidently detected face is treated as a
    /// uniform reference of `color` and updates the profile centroid.
    pub fn calibrate_next(&mut self, color: CubeColor) {
        self.pending_calibration = Some(color);
    }

    pub fn apply_command(&mut self, command: ScanCommand) {
        match command {
            ScanCommand::Reset => self.reset(),
            ScanCommand::Calibrate(color) => self.calibrate_next(color),
        }
    }

    /// One mailbox iteration: drain pending commands, then process the
    /// latest frame if one arrived. Returns `None` when the mailbox was
    /// empty.
    pub fn service(&mut self, mailbox: &FrameMailbox) -> Option<Vec<ScanEvent>> {
        for command in mailbox.drain_commands() {
            self.apply_command(command);
        }
        self.frames_dropped = mailbox.dropped();
        let frame = mailbox.take()?;
        Some(self.process_frame(&frame.view()))
    }

    /// Run the full pipeline over one frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(
            width = frame.pixels.width,
            height = frame.pixels.height,
            ts_ms = frame.timestamp.as_millis() as u64
        ))
    )]
    pub fn process_frame(&mut self, frame: &FrameView<'_>) -> Vec<ScanEvent> {
        self.unresolved_in_view = None;

        let grid = self.detector.detect(frame);
        let confidence = grid.as_ref().map_or(0.0, |g| g.confidence);
        let admitted = self.gate.admit(confidence);
        let Some(grid) = grid else {
            return Vec::new();
        };
        if !admitted {
            debug!("detection below smoothed confidence gate ({confidence:.2})");
            return Vec::new();
        }

        let reading = match read_face(&frame.pixels, &grid, &self.sampler, &self.classifier) {
            Ok(reading) => reading,
            Err(err) => {
                // Whole face rejected; resampled on the next frame.
                debug!("face sampling failed: {err}");
                return Vec::new();
            }
        };
        self.unresolved_in_view = Some(reading.unresolved_count());

        if let Some(color) = self.pending_calibration.take() {
            self.classifier
                .profile_mut()
                .calibrate_color(color, &reading.samples);
            return vec![ScanEvent::Calibrated { color }];
        }

        let Some(scan) = reading.to_scan() else {
            return Vec::new();
        };

        match self.aggregator.record(scan) {
            Ok(RecordOutcome::Recorded { face }) => vec![ScanEvent::FaceRecorded { face }],
            Ok(RecordOutcome::Unchanged { .. }) => Vec::new(),
            Ok(RecordOutcome::Replaced { face }) => vec![ScanEvent::FaceReplaced { face }],
            Ok(RecordOutcome::Complete(state)) => vec![ScanEvent::Complete(state)],
            Err(AggregateError::DuplicateCenter {
                center,
                seen,
                needed,
            }) => vec![ScanEvent::DuplicateCenter {
                center,
                seen,
                needed,
            }],
            Err(AggregateError::Invalid(err)) => vec![ScanEvent::ValidationFailed(err)],
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScannerParams::default())
    }
}
