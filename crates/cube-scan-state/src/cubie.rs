//! Facelet-level to cubie-level conversion.
//!
//! Faces are numbered 0..6 in Singmaster order U, R, F, D, L, B; facelet
//! `face * 9 + row * 3 + col` follows the usual facelet-string numbering.
//! Slot tables list, for each corner/edge position, its facelet indices and
//! the face labels a solved cube shows there.

use cube_scan_core::{CubeState, FACE_ORDER_URFDLB};

/// Corner slots in the order URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB.
pub(crate) const CORNER_FACELETS: [[usize; 3]; 8] = [
    [8, 9, 20],
    [6, 18, 38],
    [0, 36, 47],
    [2, 45, 11],
    [29, 26, 15],
    [27, 44, 24],
    [33, 53, 42],
    [35, 17, 51],
];

pub(crate) const CORNER_LABELS: [[u8; 3]; 8] = [
    [0, 1, 2], // URF
    [0, 2, 4], // UFL
    [0, 4, 5], // ULB
    [0, 5, 1], // UBR
    [3, 2, 1], // DFR
    [3, 4, 2], // DLF
    [3, 5, 4], // DBL
    [3, 1, 5], // DRB
];

/// Edge slots in the order UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR.
pub(crate) const EDGE_FACELETS: [[usize; 2]; 12] = [
    [5, 10],
    [7, 19],
    [3, 37],
    [1, 46],
    [32, 16],
    [28, 25],
    [30, 43],
    [34, 52],
    [23, 12],
    [21, 41],
    [50, 39],
    [48, 14],
];

pub(crate) const EDGE_LABELS: [[u8; 2]; 12] = [
    [0, 1], // UR
    [0, 2], // UF
    [0, 4], // UL
    [0, 5], // UB
    [3, 1], // DR
    [3, 2], // DF
    [3, 4], // DL
    [3, 5], // DB
    [2, 1], // FR
    [2, 4], // FL
    [5, 4], // BL
    [5, 1], // BR
];

/// Face label (0..6, URFDLB) of each of the 54 facelets of a state.
pub(crate) fn face_labels(state: &CubeState) -> [u8; 54] {
    let mut labels = [0u8; 54];
    for (f, center) in FACE_ORDER_URFDLB.iter().enumerate() {
        for (i, color) in state.face(*center).iter().enumerate() {
            let label = FACE_ORDER_URFDLB
                .iter()
                .position(|c| c == color)
                .expect("every CubeColor has a face slot") as u8;
            labels[f * 9 + i] = label;
        }
    }
    labels
}

/// Identify the cubie in a corner slot: `(cubie index, orientation)`.
///
/// Matches the full sticker triple under cyclic rotation; a mirrored
/// (transposed) triple matches nothing, which is exactly the impossible
/// corner case the validator wants to catch.
pub(crate) fn identify_corner(labels: &[u8; 54], slot: usize) -> Option<(usize, u8)> {
    let fac = CORNER_FACELETS[slot];
    for cubie in 0..8 {
        for ori in 0..3u8 {
            let matches = (0..3).all(|k| {
                labels[fac[(k + ori as usize) % 3]] == CORNER_LABELS[cubie][k]
            });
            if matches {
                return Some((cubie, ori));
            }
        }
    }
    None
}

/// Identify the cubie in an edge slot: `(cubie index, flip)`.
pub(crate) fn identify_edge(labels: &[u8; 54], slot: usize) -> Option<(usize, u8)> {
    let fac = EDGE_FACELETS[slot];
    for cubie in 0..12 {
        if labels[fac[0]] == EDGE_LABELS[cubie][0] && labels[fac[1]] == EDGE_LABELS[cubie][1] {
            return Some((cubie, 0));
        }
        if labels[fac[0]] == EDGE_LABELS[cubie][1] && labels[fac[1]] == EDGE_LABELS[cubie][0] {
            return Some((cubie, 1));
        }
    }
    None
}

/// Sign of a permutation given as an array of images; `true` = even.
pub(crate) fn permutation_is_even(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    let mut transpositions = 0;
    for start in 0..perm.len() {
        if seen[start] {
            continue;
        }
        let mut len = 0;
        let mut k = start;
        while !seen[k] {
            seen[k] = true;
            k = perm[k];
            len += 1;
        }
        transpositions += len - 1;
    }
    transpositions % 2 == 0
}
