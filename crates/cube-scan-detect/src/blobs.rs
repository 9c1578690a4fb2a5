use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::gradient::GradientPlane;

/// Parameters for flat-region labeling and sticker-candidate filtering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlobParams {
    /// Pixels with L1 Sobel magnitude below this are "flat".
    pub flat_threshold: u16,
    /// Minimal component area as a fraction of the image area.
    pub min_area_frac: f32,
    /// Maximal component area as a fraction of the image area. Rules out
    /// the background, which is usually the largest flat region.
    pub max_area_frac: f32,
    /// Maximal bbox aspect ratio (long side / short side).
    pub max_aspect: f32,
    /// Minimal area / bbox-area ratio. Stickers are compact; elongated or
    /// ragged regions fall below this.
    pub min_fill_ratio: f32,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            flat_threshold: 60,
            min_area_frac: 0.001,
            max_area_frac: 0.15,
            max_aspect: 2.5,
            min_fill_ratio: 0.5,
        }
    }
}

/// One connected flat region.
#[derive(Clone, Copy, Debug)]
pub struct Blob {
    pub area: usize,
    pub centroid: Point2<f32>,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Blob {
    #[inline]
    pub fn bbox_width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn bbox_height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    pub fn aspect(&self) -> f32 {
        let w = self.bbox_width() as f32;
        let h = self.bbox_height() as f32;
        if w > h {
            w / h
        } else {
            h / w
        }
    }

    pub fn fill_ratio(&self) -> f32 {
        self.area as f32 / (self.bbox_width() * self.bbox_height()) as f32
    }
}

/// Label 4-connected components of flat pixels.
///
/// Single pass with an explicit stack; no recursion, bounded by the plane
/// size. Components of any size are returned, filtering happens later.
pub fn label_flat_regions(grad: &GradientPlane, flat_threshold: u16) -> Vec<Blob> {
    let w = grad.width;
    let h = grad.height;
    let mut visited = vec![false; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut blobs = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            let idx = sy * w + sx;
            if visited[idx] || grad.data[idx] >= flat_threshold {
                continue;
            }

            visited[idx] = true;
            stack.push((sx, sy));

            let mut area = 0usize;
            let mut sum_x = 0u64;
            let mut sum_y = 0u64;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);

            while let Some((x, y)) = stack.pop() {
                area += 1;
                sum_x += x as u64;
                sum_y += y as u64;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);

                let mut push = |nx: usize, ny: usize| {
                    let nidx = ny * w + nx;
                    if !visited[nidx] && grad.data[nidx] < flat_threshold {
                        visited[nidx] = true;
                        stack.push((nx, ny));
                    }
                };

                if x > 0 {
                    push(x - 1, y);
                }
                if x + 1 < w {
                    push(x + 1, y);
                }
                if y > 0 {
                    push(x, y - 1);
                }
                if y + 1 < h {
                    push(x, y + 1);
                }
            }

            blobs.push(Blob {
                area,
                centroid: Point2::new(sum_x as f32 / area as f32, sum_y as f32 / area as f32),
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
    }

    blobs
}

/// Filter labeled regions down to plausible sticker candidates.
pub fn sticker_candidates(blobs: &[Blob], image_area: usize, params: &BlobParams) -> Vec<Blob> {
    let min_area = (params.min_area_frac * image_area as f32) as usize;
    let max_area = (params.max_area_frac * image_area as f32) as usize;

    blobs
        .iter()
        .filter(|b| {
            b.area >= min_area.max(4)
                && b.area <= max_area
                && b.aspect() <= params.max_aspect
                && b.fill_ratio() >= params.min_fill_ratio
        })
        .copied()
        .collect()
}
