use cube_scan_core::{estimate_grid_homography, Homography};
use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::blobs::Blob;

/// Parameters for grouping sticker candidates into a 3x3 lattice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatticeParams {
    /// Neighbor area must be within [min, max] times the center area.
    pub area_ratio_min: f32,
    pub area_ratio_max: f32,
    /// Farthest of the 8 neighbors may be at most this times the nearest.
    pub max_spread: f32,
    /// Maximal deviation of a snapped lattice coordinate from its integer.
    pub max_snap: f32,
    /// Maximal rms homography residual as a fraction of the grid pitch.
    pub max_residual_frac: f32,
}

impl Default for LatticeParams {
    fn default() -> Self {
        Self {
            area_ratio_min: 0.4,
            area_ratio_max: 2.5,
            max_spread: 2.0,
            max_snap: 0.3,
            max_residual_frac: 0.08,
        }
    }
}

/// A fitted 3x3 lattice over nine sticker candidates.
#[derive(Clone, Debug)]
pub struct LatticeFit {
    /// Maps lattice coordinates (i right, j down, both in -1..=1) to pixels.
    pub homography: Homography,
    /// Mean center-to-neighbor spacing in pixels.
    pub pitch: f32,
    /// Rms reprojection residual over the nine centroids, pixels.
    pub rms: f32,
    /// 1.0 at zero residual, 0.0 at the rejection bound.
    pub confidence: f32,
}

/// Try to group nine candidates into a square lattice.
///
/// Every candidate is hypothesised as the center sticker; the best fit by
/// confidence wins. Returns `None` when no hypothesis yields a full,
/// consistent 3x3 assignment, which covers partial occlusion: a face with a
/// covered sticker is rejected rather than guessed at.
pub fn fit_face_lattice(candidates: &[Blob], params: &LatticeParams) -> Option<LatticeFit> {
    if candidates.len() < 9 {
        return None;
    }

    let mut best: Option<LatticeFit> = None;

    for (ci, center) in candidates.iter().enumerate() {
        let Some(fit) = fit_with_center(candidates, ci, center, params) else {
            continue;
        };
        if best.as_ref().is_none_or(|b| fit.confidence > b.confidence) {
            best = Some(fit);
        }
    }

    best
}

fn fit_with_center(
    candidates: &[Blob],
    ci: usize,
    center: &Blob,
    params: &LatticeParams,
) -> Option<LatticeFit> {
    let c = center.centroid;

    // Peers of comparable area, nearest first.
    let mut peers: Vec<(f32, Point2<f32>)> = candidates
        .iter()
        .enumerate()
        .filter(|&(i, b)| {
            i != ci && {
                let ratio = b.area as f32 / center.area as f32;
                ratio >= params.area_ratio_min && ratio <= params.area_ratio_max
            }
        })
        .map(|(_, b)| ((b.centroid - c).norm_squared(), b.centroid))
        .collect();
    if peers.len() < 8 {
        return None;
    }
    peers.sort_by(|a, b| a.0.total_cmp(&b.0));
    peers.truncate(8);

    let d_near = peers[0].0.sqrt();
    let d_far = peers[7].0.sqrt();
    if d_far > params.max_spread * d_near {
        return None;
    }

    let (mut u, mut v) = lattice_axes(c, &peers)?;

    // Deterministic orientation: +u points image-right, +v image-down.
    if u.x.abs() < u.y.abs() && v.x.abs() > v.y.abs() {
        std::mem::swap(&mut u, &mut v);
    }
    if u.x < 0.0 {
        u = -u;
    }
    if v.y < 0.0 {
        v = -v;
    }

    let basis = Matrix2::new(u.x, v.x, u.y, v.y);
    if basis.determinant().abs() < 0.3 * u.norm() * v.norm() {
        return None;
    }
    let basis_inv = basis.try_inverse()?;

    // Snap all nine centroids (center included) to integer lattice coords.
    let mut occupied = [[false; 3]; 3];
    let mut grid_pts = Vec::with_capacity(9);
    let mut img_pts = Vec::with_capacity(9);

    let all = std::iter::once(c).chain(peers.iter().map(|&(_, p)| p));
    for p in all {
        let w = basis_inv * (p - c);
        let i = w.x.round();
        let j = w.y.round();
        if (w.x - i).abs() > params.max_snap || (w.y - j).abs() > params.max_snap {
            return None;
        }
        if !(-1.0..=1.0).contains(&i) || !(-1.0..=1.0).contains(&j) {
            return None;
        }
        let slot = &mut occupied[(j as i32 + 1) as usize][(i as i32 + 1) as usize];
        if *slot {
            return None;
        }
        *slot = true;

        grid_pts.push(Point2::new(i, j));
        img_pts.push(p);
    }

    let homography = estimate_grid_homography(&grid_pts, &img_pts)?;

    let mut sq_sum = 0.0f32;
    for (g, p) in grid_pts.iter().zip(&img_pts) {
        sq_sum += (homography.apply(*g) - p).norm_squared();
    }
    let rms = (sq_sum / 9.0).sqrt();

    let pitch = 0.5 * (u.norm() + v.norm());
    let bound = params.max_residual_frac * pitch;
    if rms > bound {
        return None;
    }

    Some(LatticeFit {
        homography,
        pitch,
        rms,
        confidence: 1.0 - rms / bound,
    })
}

/// Pick two roughly perpendicular axis vectors from the nearest neighbors.
fn lattice_axes(c: Point2<f32>, peers: &[(f32, Point2<f32>)]) -> Option<(Vector2<f32>, Vector2<f32>)> {
    let u = peers[0].1 - c;
    let un = u.norm();
    for &(_, p) in &peers[1..] {
        let v = p - c;
        let cross = (u.x * v.y - u.y * v.x).abs();
        if cross / (un * v.norm()) > 0.6 {
            return Some((u, v));
        }
    }
    None
}
