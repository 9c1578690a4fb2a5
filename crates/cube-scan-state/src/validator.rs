use cube_scan_core::{CubeColor, CubeState, ALL_COLORS, FACE_ORDER_URFDLB};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cubie::{
    face_labels, identify_corner, identify_edge, permutation_is_even, CORNER_FACELETS,
    EDGE_FACELETS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CubieKind {
    Corner,
    Edge,
}

impl std::fmt::Display for CubieKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CubieKind::Corner => write!(f, "corner"),
            CubieKind::Edge => write!(f, "edge"),
        }
    }
}

/// Reasons a candidate-complete state is rejected.
///
/// [`ValidationError::offending_faces`] localizes the failure for targeted
/// rescanning where possible; an empty list means the inconsistency is
/// global and any face may be at fault.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("facelet color counts are off (expected 9 each, got {counts:?} in WYROGB order)")]
    ColorCount { counts: [usize; 6] },

    #[error("{kind} slot {slot} shows a sticker combination no cubie has (faces {faces:?})")]
    UnknownCubie {
        kind: CubieKind,
        slot: usize,
        faces: Vec<CubeColor>,
    },

    #[error("{kind} appears in two slots (faces {faces:?})")]
    RepeatedCubie {
        kind: CubieKind,
        faces: Vec<CubeColor>,
    },

    #[error("corner twist is unreachable (total twist {sum} mod 3)")]
    TwistParity { sum: u8 },

    #[error("edge flip is unreachable (total flip {sum} mod 2)")]
    FlipParity { sum: u8 },

    #[error("corner and edge permutation parities disagree")]
    PermutationParity,
}

impl ValidationError {
    /// Faces that should be rescanned. Empty means "indeterminate".
    pub fn offending_faces(&self) -> Vec<CubeColor> {
        match self {
            ValidationError::ColorCount { counts } => ALL_COLORS
                .iter()
                .filter(|c| counts[c.index()] != 9)
                .copied()
                .collect(),
            ValidationError::UnknownCubie { faces, .. }
            | ValidationError::RepeatedCubie { faces, .. } => faces.clone(),
            ValidationError::TwistParity { .. }
            | ValidationError::FlipParity { .. }
            | ValidationError::PermutationParity => Vec::new(),
        }
    }
}

fn corner_slot_faces(slot: usize) -> Vec<CubeColor> {
    CORNER_FACELETS[slot]
        .iter()
        .map(|&idx| FACE_ORDER_URFDLB[idx / 9])
        .collect()
}

fn edge_slot_faces(slot: usize) -> Vec<CubeColor> {
    EDGE_FACELETS[slot]
        .iter()
        .map(|&idx| FACE_ORDER_URFDLB[idx / 9])
        .collect()
}

/// Check a candidate-complete state against cube combinatorics.
///
/// Runs the cheap global checks first (color counts), then identifies every
/// corner and edge cubie and verifies twist, flip and permutation parity,
/// catching states that are locally plausible but globally impossible.
pub fn validate(state: &CubeState) -> Result<(), ValidationError> {
    let counts = state.color_counts();
    if counts != [9; 6] {
        return Err(ValidationError::ColorCount { counts });
    }

    // Center distinctness is structural in CubeState (one face per center
    // color), so it needs no separate check here.

    let labels = face_labels(state);

    let mut cp = [0usize; 8];
    let mut twist_sum = 0u8;
    let mut corner_seen = [false; 8];
    for slot in 0..8 {
        let (cubie, ori) =
            identify_corner(&labels, slot).ok_or_else(|| ValidationError::UnknownCubie {
                kind: CubieKind::Corner,
                slot,
                faces: corner_slot_faces(slot),
            })?;
        if corner_seen[cubie] {
            let mut faces = corner_slot_faces(slot);
            if let Some(other) = cp[..slot].iter().position(|&c| c == cubie) {
                faces.extend(corner_slot_faces(other));
            }
            faces.sort();
            faces.dedup();
            return Err(ValidationError::RepeatedCubie {
                kind: CubieKind::Corner,
                faces,
            });
        }
        corner_seen[cubie] = true;
        cp[slot] = cubie;
        twist_sum = (twist_sum + ori) % 3;
    }

    let mut ep = [0usize; 12];
    let mut flip_sum = 0u8;
    let mut edge_seen = [false; 12];
    for slot in 0..12 {
        let (cubie, flip) =
            identify_edge(&labels, slot).ok_or_else(|| ValidationError::UnknownCubie {
                kind: CubieKind::Edge,
                slot,
                faces: edge_slot_faces(slot),
            })?;
        if edge_seen[cubie] {
            let mut faces = edge_slot_faces(slot);
            if let Some(other) = ep[..slot].iter().position(|&c| c == cubie) {
                faces.extend(edge_slot_faces(other));
            }
            faces.sort();
            faces.dedup();
            return Err(ValidationError::RepeatedCubie {
                kind: CubieKind::Edge,
                faces,
            });
        }
        edge_seen[cubie] = true;
        ep[slot] = cubie;
        flip_sum = (flip_sum + flip) % 2;
    }

    if twist_sum != 0 {
        return Err(ValidationError::TwistParity { sum: twist_sum });
    }
    if flip_sum != 0 {
        return Err(ValidationError::FlipParity { sum: flip_sum });
    }
    if permutation_is_even(&cp) != permutation_is_even(&ep) {
        return Err(ValidationError::PermutationParity);
    }

    debug!("cube state validated: {}", state.to_facelet_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_scan_core::{FaceScan, FACELETS_PER_FACE};

    /// Solved-cube faces in URFDLB order, editable before assembly.
    fn faces() -> [[CubeColor; FACELETS_PER_FACE]; 6] {
        FACE_ORDER_URFDLB.map(|c| [c; FACELETS_PER_FACE])
    }

    fn assemble(faces: [[CubeColor; FACELETS_PER_FACE]; 6]) -> CubeState {
        CubeState::from_scans(faces.map(FaceScan::new)).expect("distinct centers")
    }

    #[test]
    fn solved_cube_validates() {
        assert_eq!(validate(&assemble(faces())), Ok(()));
    }

    #[test]
    fn recolored_sticker_breaks_color_counts() {
        let mut f = faces();
        f[0][0] = CubeColor::Red; // one extra red, one missing white
        let err = validate(&assemble(f)).unwrap_err();
        match &err {
            ValidationError::ColorCount { counts } => {
                assert_eq!(counts[CubeColor::White.index()], 8);
                assert_eq!(counts[CubeColor::Red.index()], 10);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let offending = err.offending_faces();
        assert!(offending.contains(&CubeColor::White));
        assert!(offending.contains(&CubeColor::Red));
    }

    #[test]
    fn single_flipped_edge_is_caught() {
        let mut f = faces();
        // Swap the UF edge's two stickers: U8 <-> F2.
        f[0][7] = CubeColor::Green;
        f[2][1] = CubeColor::White;
        let err = validate(&assemble(f)).unwrap_err();
        assert_eq!(err, ValidationError::FlipParity { sum: 1 });
        assert!(err.offending_faces().is_empty());
    }

    #[test]
    fn single_twisted_corner_is_caught() {
        let mut f = faces();
        // Rotate the URF corner stickers cyclically: U9 -> R1 -> F3 -> U9.
        f[0][8] = CubeColor::Green; // U9 now shows F's color
        f[1][0] = CubeColor::White; // R1 now shows U's color
        f[2][2] = CubeColor::Red; // F3 now shows R's color
        let err = validate(&assemble(f)).unwrap_err();
        assert!(matches!(err, ValidationError::TwistParity { .. }));
    }

    #[test]
    fn mirrored_corner_is_unknown() {
        let mut f = faces();
        // Transpose two stickers of one corner only.
        f[0][8] = CubeColor::Red; // U9 shows R
        f[1][0] = CubeColor::White; // R1 shows U
        let err = validate(&assemble(f)).unwrap_err();
        match &err {
            ValidationError::UnknownCubie { kind, slot, faces } => {
                assert_eq!(*kind, CubieKind::Corner);
                assert_eq!(*slot, 0);
                assert_eq!(
                    faces.as_slice(),
                    &[CubeColor::White, CubeColor::Red, CubeColor::Green]
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn swapped_edge_pair_breaks_permutation_parity() {
        let mut f = faces();
        // Exchange the UR and UF edge cubies wholesale.
        f[1][1] = CubeColor::Green; // R2 shows F
        f[2][1] = CubeColor::Red; // F2 shows R
        let err = validate(&assemble(f)).unwrap_err();
        assert_eq!(err, ValidationError::PermutationParity);
    }
}
