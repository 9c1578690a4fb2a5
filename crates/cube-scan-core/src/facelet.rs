use serde::{Deserialize, Serialize};

/// Facelets on one cube face.
pub const FACELETS_PER_FACE: usize = 9;
/// Facelets on the whole cube.
pub const TOTAL_FACELETS: usize = 54;

/// A sampled color, channels in 0..=255.
pub type Rgb = [f32; 3];

/// The six canonical sticker colors.
///
/// Centers never move, so a face is identified by its center color; this
/// enum therefore doubles as the face identity throughout the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CubeColor {
    White,
    Yellow,
    Red,
    Orange,
    Green,
    Blue,
}

pub const ALL_COLORS: [CubeColor; 6] = [
    CubeColor::White,
    CubeColor::Yellow,
    CubeColor::Red,
    CubeColor::Orange,
    CubeColor::Green,
    CubeColor::Blue,
];

/// Standard Western color scheme in Singmaster face order U, R, F, D, L, B.
pub const FACE_ORDER_URFDLB: [CubeColor; 6] = [
    CubeColor::White,
    CubeColor::Red,
    CubeColor::Green,
    CubeColor::Yellow,
    CubeColor::Orange,
    CubeColor::Blue,
];

impl CubeColor {
    /// Dense index, stable across the crate (array keys, counts).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            CubeColor::White => 0,
            CubeColor::Yellow => 1,
            CubeColor::Red => 2,
            CubeColor::Orange => 3,
            CubeColor::Green => 4,
            CubeColor::Blue => 5,
        }
    }

    /// Single-letter color code (`W Y R O G B`).
    pub fn letter(self) -> char {
        match self {
            CubeColor::White => 'W',
            CubeColor::Yellow => 'Y',
            CubeColor::Red => 'R',
            CubeColor::Orange => 'O',
            CubeColor::Green => 'G',
            CubeColor::Blue => 'B',
        }
    }

    /// Singmaster face letter under the standard scheme (White up, Green front).
    pub fn face_letter(self) -> char {
        match self {
            CubeColor::White => 'U',
            CubeColor::Yellow => 'D',
            CubeColor::Red => 'R',
            CubeColor::Orange => 'L',
            CubeColor::Green => 'F',
            CubeColor::Blue => 'B',
        }
    }

    /// Inverse of [`CubeColor::face_letter`].
    pub fn from_face_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(CubeColor::White),
            'D' => Some(CubeColor::Yellow),
            'R' => Some(CubeColor::Red),
            'L' => Some(CubeColor::Orange),
            'F' => Some(CubeColor::Green),
            'B' => Some(CubeColor::Blue),
            _ => None,
        }
    }

    /// Classic sticker palette, used as the default calibration profile.
    pub fn reference_srgb(self) -> [u8; 3] {
        match self {
            CubeColor::White => [255, 255, 255],
            CubeColor::Yellow => [255, 213, 0],
            CubeColor::Red => [196, 30, 58],
            CubeColor::Orange => [255, 88, 0],
            CubeColor::Green => [0, 158, 96],
            CubeColor::Blue => [0, 81, 186],
        }
    }
}

/// Position of one facelet: face identity plus row/col in 0..3, row 0 on top
/// when the face is viewed head-on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceletAddress {
    pub face: CubeColor,
    pub row: u8,
    pub col: u8,
}

/// One fully classified face: 9 colors in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceScan {
    pub colors: [CubeColor; FACELETS_PER_FACE],
}

impl FaceScan {
    pub fn new(colors: [CubeColor; FACELETS_PER_FACE]) -> Self {
        Self { colors }
    }

    /// Uniform face, as on a solved cube.
    pub fn uniform(color: CubeColor) -> Self {
        Self {
            colors: [color; FACELETS_PER_FACE],
        }
    }

    /// The fixed center sticker; identifies the physical face.
    #[inline]
    pub fn center(&self) -> CubeColor {
        self.colors[4]
    }
}

/// The assembled 54-facelet cube state, keyed by (center color, row, col).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeState {
    faces: [[CubeColor; FACELETS_PER_FACE]; 6],
}

impl CubeState {
    /// Build from one scan per face. Callers guarantee one scan per center;
    /// the aggregator enforces that before constructing a state.
    pub fn from_scans(scans: impl IntoIterator<Item = FaceScan>) -> Option<Self> {
        let mut faces = [None::<[CubeColor; FACELETS_PER_FACE]>; 6];
        for scan in scans {
            let slot = &mut faces[scan.center().index()];
            if slot.is_some() {
                return None;
            }
            *slot = Some(scan.colors);
        }
        if faces.iter().any(|f| f.is_none()) {
            return None;
        }
        Some(Self {
            faces: faces.map(|f| f.unwrap()),
        })
    }

    /// Parse a 54-character Singmaster facelet string in U R F D L B face
    /// order, the inverse of [`CubeState::to_facelet_string`]. Returns
    /// `None` on malformed input or repeated center letters.
    pub fn from_facelet_string(s: &str) -> Option<Self> {
        if s.len() != TOTAL_FACELETS {
            return None;
        }
        let mut colors = [CubeColor::White; TOTAL_FACELETS];
        for (i, letter) in s.chars().enumerate() {
            colors[i] = CubeColor::from_face_letter(letter)?;
        }
        let scans = (0..6).map(|f| {
            let mut face = [CubeColor::White; FACELETS_PER_FACE];
            face.copy_from_slice(&colors[f * 9..f * 9 + 9]);
            FaceScan::new(face)
        });
        Self::from_scans(scans)
    }

    #[inline]
    pub fn facelet(&self, addr: FaceletAddress) -> CubeColor {
        self.faces[addr.face.index()][addr.row as usize * 3 + addr.col as usize]
    }

    /// Row-major facelets of one face.
    #[inline]
    pub fn face(&self, center: CubeColor) -> &[CubeColor; FACELETS_PER_FACE] {
        &self.faces[center.index()]
    }

    /// Count of facelets per color, indexed by [`CubeColor::index`].
    pub fn color_counts(&self) -> [usize; 6] {
        let mut counts = [0usize; 6];
        for face in &self.faces {
            for c in face {
                counts[c.index()] += 1;
            }
        }
        counts
    }

    /// 54-character Singmaster facelet string in U R F D L B face order,
    /// the handoff format expected by standard solvers.
    pub fn to_facelet_string(&self) -> String {
        let mut out = String::with_capacity(TOTAL_FACELETS);
        for center in FACE_ORDER_URFDLB {
            for c in self.face(center) {
                out.push(c.face_letter());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved() -> CubeState {
        CubeState::from_scans(ALL_COLORS.map(FaceScan::uniform)).expect("six distinct centers")
    }

    #[test]
    fn solved_state_has_nine_of_each_color() {
        assert_eq!(solved().color_counts(), [9; 6]);
    }

    #[test]
    fn duplicate_center_scans_cannot_assemble() {
        let scans = [
            FaceScan::uniform(CubeColor::White),
            FaceScan::uniform(CubeColor::White),
        ];
        assert!(CubeState::from_scans(scans).is_none());
    }

    #[test]
    fn facelet_string_of_solved_cube() {
        let s = solved().to_facelet_string();
        assert_eq!(s.len(), TOTAL_FACELETS);
        assert_eq!(
            s,
            "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"
        );
    }

    #[test]
    fn facelet_string_round_trips() {
        let s = solved().to_facelet_string();
        let parsed = CubeState::from_facelet_string(&s).expect("valid string");
        assert_eq!(parsed, solved());

        assert!(CubeState::from_facelet_string("UUU").is_none());
        assert!(CubeState::from_facelet_string(&"U".repeat(54)).is_none());
    }

    #[test]
    fn facelet_addressing_is_row_major() {
        let mut colors = [CubeColor::White; 9];
        colors[5] = CubeColor::Red; // row 1, col 2
        colors[4] = CubeColor::White;
        let scans = ALL_COLORS.map(|c| {
            if c == CubeColor::White {
                FaceScan::new(colors)
            } else {
                FaceScan::uniform(c)
            }
        });
        let state = CubeState::from_scans(scans).unwrap();
        assert_eq!(
            state.facelet(FaceletAddress {
                face: CubeColor::White,
                row: 1,
                col: 2
            }),
            CubeColor::Red
        );
    }
}
