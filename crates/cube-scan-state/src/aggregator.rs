use std::collections::BTreeMap;

use cube_scan_core::{CubeColor, CubeState, FaceScan};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::validator::{validate, ValidationError};

/// Aggregator tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatorParams {
    /// Consecutive identical conflicting scans required before a re-scan
    /// replaces a recorded face (debounce against transient
    /// misclassification).
    pub debounce_frames: u32,
}

impl Default for AggregatorParams {
    fn default() -> Self {
        Self { debounce_frames: 3 }
    }
}

/// Lifecycle of one scanning session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Empty,
    Scanning,
    Complete,
}

/// What happened to the state machine on one accepted scan.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordOutcome {
    /// First scan for this center.
    Recorded { face: CubeColor },
    /// Identical to the recorded scan; nothing changed.
    Unchanged { face: CubeColor },
    /// A debounced re-scan replaced the recorded face.
    Replaced { face: CubeColor },
    /// All six faces recorded and the assembled state validated.
    Complete(CubeState),
}

/// Operator-facing aggregation failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// A scan conflicts with the face already recorded for its center
    /// color: either a second physical face shares the center (sensor or
    /// lighting error) or the operator is deliberately re-scanning. The
    /// two are indistinguishable here, so the recorded face stays until
    /// the conflicting scan persists for the debounce window.
    #[error("duplicate center detected ({center:?}), rescan; a persistent re-scan replaces the recorded face after {needed} consistent frames (seen {seen})")]
    DuplicateCenter {
        center: CubeColor,
        seen: u32,
        needed: u32,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Read-only snapshot of aggregation progress, safe to hand to an observer
/// on another thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: ScanPhase,
    /// Center colors of the recorded faces.
    pub recorded: Vec<CubeColor>,
    /// Faces flagged by a failed validation, pending rescan.
    pub flagged: Vec<CubeColor>,
}

#[derive(Clone, Debug)]
struct PendingRescan {
    center: CubeColor,
    scan: FaceScan,
    seen: u32,
}

/// The scan-session state machine.
///
/// Single-writer by construction: it is owned by the pipeline and mutated
/// only between frames. Observers use [`ScanAggregator::snapshot`].
#[derive(Clone, Debug)]
pub struct ScanAggregator {
    params: AggregatorParams,
    recorded: BTreeMap<CubeColor, FaceScan>,
    pending: Option<PendingRescan>,
    flagged: Vec<CubeColor>,
    complete: Option<CubeState>,
}

impl ScanAggregator {
    pub fn new(params: AggregatorParams) -> Self {
        Self {
            params,
            recorded: BTreeMap::new(),
            pending: None,
            flagged: Vec::new(),
            complete: None,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        if self.complete.is_some() {
            ScanPhase::Complete
        } else if self.recorded.is_empty() {
            ScanPhase::Empty
        } else {
            ScanPhase::Scanning
        }
    }

    /// The validated state, once the session is complete.
    pub fn cube_state(&self) -> Option<&CubeState> {
        self.complete.as_ref()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase(),
            recorded: self.recorded.keys().copied().collect(),
            flagged: self.flagged.clone(),
        }
    }

    /// Discard the session and return to `Empty`.
    ///
    /// The pipeline applies this between frames only, so a reset never
    /// interleaves with a half-processed scan.
    pub fn reset(&mut self) {
        info!("scan session reset");
        self.recorded.clear();
        self.pending = None;
        self.flagged.clear();
        self.complete = None;
    }

    /// Feed one accepted face scan into the state machine.
    pub fn record(&mut self, scan: FaceScan) -> Result<RecordOutcome, AggregateError> {
        let center = scan.center();

        if self.complete.is_some() {
            // Session already finished; ignore until an explicit reset.
            return Ok(RecordOutcome::Unchanged { face: center });
        }

        match self.recorded.get(&center) {
            None => {
                self.recorded.insert(center, scan);
                self.flagged.retain(|&f| f != center);
                info!(
                    "face {:?} recorded ({}/6)",
                    center,
                    self.recorded.len()
                );
                self.try_complete(RecordOutcome::Recorded { face: center })
            }
            Some(existing) if *existing == scan => {
                // Consistent with what we already hold; any pending
                // conflicting re-scan was transient.
                if self
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.center == center)
                {
                    self.pending = None;
                }
                Ok(RecordOutcome::Unchanged { face: center })
            }
            Some(_) => self.record_conflict(center, scan),
        }
    }

    fn record_conflict(
        &mut self,
        center: CubeColor,
        scan: FaceScan,
    ) -> Result<RecordOutcome, AggregateError> {
        let needed = self.params.debounce_frames.max(1);

        let seen = match &mut self.pending {
            Some(p) if p.center == center && p.scan == scan => {
                p.seen += 1;
                p.seen
            }
            _ => {
                self.pending = Some(PendingRescan {
                    center,
                    scan,
                    seen: 1,
                });
                1
            }
        };

        if seen >= needed {
            warn!("face {center:?} replaced after {seen} consistent re-detections");
            self.pending = None;
            self.recorded.insert(center, scan);
            self.flagged.retain(|&f| f != center);
            return self.try_complete(RecordOutcome::Replaced { face: center });
        }

        Err(AggregateError::DuplicateCenter {
            center,
            seen,
            needed,
        })
    }

    /// If all six faces are in, assemble and validate. On validation
    /// failure the offending faces are dropped back to "unscanned" and
    /// flagged; the session stays in `Scanning`.
    fn try_complete(&mut self, otherwise: RecordOutcome) -> Result<RecordOutcome, AggregateError> {
        if self.recorded.len() < 6 {
            return Ok(otherwise);
        }

        let state = CubeState::from_scans(self.recorded.values().copied())
            .expect("recorded faces have distinct centers");

        match validate(&state) {
            Ok(()) => {
                info!("scan complete: {}", state.to_facelet_string());
                self.complete = Some(state.clone());
                Ok(RecordOutcome::Complete(state))
            }
            Err(err) => {
                let offending = err.offending_faces();
                warn!("validation failed ({err}); flagged {offending:?}");
                if offending.is_empty() {
                    // Global inconsistency: cannot localize, flag all six
                    // and let re-scans (debounced replacements) fix it.
                    self.flagged = self.recorded.keys().copied().collect();
                } else {
                    for face in &offending {
                        self.recorded.remove(face);
                    }
                    // A brewing re-scan of a removed face must not carry
                    // its consecutive count into the next session round.
                    if self
                        .pending
                        .as_ref()
                        .is_some_and(|p| offending.contains(&p.center))
                    {
                        self.pending = None;
                    }
                    self.flagged = offending;
                }
                Err(AggregateError::Invalid(err))
            }
        }
    }
}

impl Default for ScanAggregator {
    fn default() -> Self {
        Self::new(AggregatorParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_scan_core::ALL_COLORS;

    fn scan_with_corner(center: CubeColor, corner: CubeColor) -> FaceScan {
        let mut colors = [center; 9];
        colors[0] = corner;
        FaceScan::new(colors)
    }

    #[test]
    fn six_uniform_faces_complete_and_validate() {
        let mut agg = ScanAggregator::default();
        assert_eq!(agg.phase(), ScanPhase::Empty);

        for (n, color) in ALL_COLORS.into_iter().enumerate() {
            let outcome = agg.record(FaceScan::uniform(color)).expect("accepted");
            if n < 5 {
                assert_eq!(outcome, RecordOutcome::Recorded { face: color });
                assert_eq!(agg.phase(), ScanPhase::Scanning);
            } else {
                let RecordOutcome::Complete(state) = outcome else {
                    panic!("expected completion, got {outcome:?}");
                };
                assert_eq!(state.color_counts(), [9; 6]);
                for c in ALL_COLORS {
                    assert_eq!(state.face(c), &[c; 9]);
                }
            }
        }
        assert_eq!(agg.phase(), ScanPhase::Complete);
        assert!(agg.cube_state().is_some());
    }

    #[test]
    fn identical_rescan_is_a_no_op() {
        let mut agg = ScanAggregator::default();
        let scan = scan_with_corner(CubeColor::White, CubeColor::Red);
        agg.record(scan).unwrap();
        let before = agg.snapshot();

        assert_eq!(
            agg.record(scan).unwrap(),
            RecordOutcome::Unchanged {
                face: CubeColor::White
            }
        );
        assert_eq!(agg.snapshot(), before);
    }

    #[test]
    fn conflicting_scan_surfaces_duplicate_center_and_keeps_first() {
        let mut agg = ScanAggregator::default();
        let first = FaceScan::uniform(CubeColor::White);
        agg.record(first).unwrap();

        let conflicting = scan_with_corner(CubeColor::White, CubeColor::Blue);
        let err = agg.record(conflicting).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::DuplicateCenter {
                center: CubeColor::White,
                seen: 1,
                needed: 3,
            }
        ));

        // First scan intact.
        let snap = agg.snapshot();
        assert_eq!(snap.recorded, vec![CubeColor::White]);
    }

    #[test]
    fn transient_misclassification_does_not_overwrite() {
        let mut agg = ScanAggregator::default();
        let good = FaceScan::uniform(CubeColor::Green);
        agg.record(good).unwrap();

        let bad = scan_with_corner(CubeColor::Green, CubeColor::Blue);
        assert!(agg.record(bad).is_err()); // seen 1 of 3
        assert!(agg.record(bad).is_err()); // seen 2 of 3

        // The face re-reads correctly before the debounce fills: the
        // pending replacement is discarded.
        assert_eq!(
            agg.record(good).unwrap(),
            RecordOutcome::Unchanged {
                face: CubeColor::Green
            }
        );
        assert!(agg.record(bad).is_err()); // counter restarted at 1
    }

    #[test]
    fn persistent_rescan_replaces_after_debounce() {
        let mut agg = ScanAggregator::default();
        agg.record(FaceScan::uniform(CubeColor::Red)).unwrap();

        let rescan = scan_with_corner(CubeColor::Red, CubeColor::Orange);
        assert!(agg.record(rescan).is_err());
        assert!(agg.record(rescan).is_err());
        assert_eq!(
            agg.record(rescan).unwrap(),
            RecordOutcome::Replaced {
                face: CubeColor::Red
            }
        );
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut agg = ScanAggregator::default();
        agg.record(FaceScan::uniform(CubeColor::Yellow)).unwrap();
        assert_eq!(agg.phase(), ScanPhase::Scanning);

        agg.reset();
        assert_eq!(agg.phase(), ScanPhase::Empty);
        assert!(agg.snapshot().recorded.is_empty());
    }

    #[test]
    fn invalid_completion_flags_offending_faces_and_keeps_scanning() {
        let mut agg = ScanAggregator::default();
        // Five clean faces, then a white face with one sticker recolored
        // red: color counts break on completion.
        for color in &ALL_COLORS[1..] {
            agg.record(FaceScan::uniform(*color)).unwrap();
        }
        let bad_white = scan_with_corner(CubeColor::White, CubeColor::Red);
        let err = agg.record(bad_white).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::Invalid(ValidationError::ColorCount { .. })
        ));

        let snap = agg.snapshot();
        assert_eq!(snap.phase, ScanPhase::Scanning);
        assert!(snap.flagged.contains(&CubeColor::White));
        assert!(snap.flagged.contains(&CubeColor::Red));
        // Offending faces dropped for rescan.
        assert!(!snap.recorded.contains(&CubeColor::White));
        assert!(!snap.recorded.contains(&CubeColor::Red));

        // Rescanning the dropped faces cleanly completes the cube.
        agg.record(FaceScan::uniform(CubeColor::Red)).unwrap();
        let outcome = agg.record(FaceScan::uniform(CubeColor::White)).unwrap();
        assert!(matches!(outcome, RecordOutcome::Complete(_)));
    }

    #[test]
    fn dropped_face_forgets_its_pending_rescan() {
        let mut agg = ScanAggregator::default();
        agg.record(FaceScan::uniform(CubeColor::Red)).unwrap();

        // A conflicting re-scan of Red starts filling the debounce window.
        let rescan = scan_with_corner(CubeColor::Red, CubeColor::Orange);
        assert!(agg.record(rescan).is_err()); // seen 1 of 3
        assert!(agg.record(rescan).is_err()); // seen 2 of 3

        // Complete the six faces with a bad white; counts break and both
        // White and Red are dropped for rescan.
        for color in [
            CubeColor::Yellow,
            CubeColor::Orange,
            CubeColor::Green,
            CubeColor::Blue,
        ] {
            agg.record(FaceScan::uniform(color)).unwrap();
        }
        let bad_white = scan_with_corner(CubeColor::White, CubeColor::Red);
        assert!(agg.record(bad_white).is_err());
        assert!(!agg.snapshot().recorded.contains(&CubeColor::Red));

        // Red re-records fresh; the old conflicting scan must start a new
        // debounce window instead of inheriting the pre-failure count.
        agg.record(FaceScan::uniform(CubeColor::Red)).unwrap();
        let err = agg.record(rescan).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::DuplicateCenter { seen: 1, .. }
        ));
    }

    #[test]
    fn scans_after_completion_are_ignored() {
        let mut agg = ScanAggregator::default();
        for color in ALL_COLORS {
            agg.record(FaceScan::uniform(color)).unwrap();
        }
        assert_eq!(agg.phase(), ScanPhase::Complete);

        let outcome = agg
            .record(scan_with_corner(CubeColor::White, CubeColor::Blue))
            .unwrap();
        assert_eq!(
            outcome,
            RecordOutcome::Unchanged {
                face: CubeColor::White
            }
        );
        assert_eq!(agg.phase(), ScanPhase::Complete);
    }
}
