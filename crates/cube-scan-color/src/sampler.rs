use cube_scan_core::{homography_from_quad, sample_bilinear_rgb, Rgb, RgbImageView};
use cube_scan_detect::FaceGrid;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Parameters for per-cell color sampling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplerParams {
    /// Border fraction of the cell excluded on every side, so sticker edges
    /// and seam shadows never bleed into the sample.
    pub inset_frac: f32,
    /// Samples are taken on a `grid_side` x `grid_side` lattice.
    pub grid_side: usize,
    /// Fraction of samples trimmed at each end of the luma ordering before
    /// averaging (glare and specks land in the tails).
    pub trim_frac: f32,
    /// Minimal fraction of in-bounds samples for the cell to count.
    pub min_valid_frac: f32,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            inset_frac: 0.15,
            grid_side: 5,
            trim_frac: 0.2,
            min_valid_frac: 0.9,
        }
    }
}

/// Sampling failures: the whole face is rejected and retried next frame.
#[derive(thiserror::Error, Debug)]
pub enum SamplingError {
    #[error("cell {cell} extends outside the frame ({valid}/{total} samples in bounds)")]
    OutOfBounds {
        cell: usize,
        valid: usize,
        total: usize,
    },

    #[error("cell {cell} quad is degenerate")]
    DegenerateCell { cell: usize },
}

const UNIT_SQUARE: [Point2<f32>; 4] = [
    Point2::new(0.0, 0.0),
    Point2::new(1.0, 0.0),
    Point2::new(1.0, 1.0),
    Point2::new(0.0, 1.0),
];

/// Representative color of one cell quad.
///
/// Pure function of its inputs: bilinear samples on an interior lattice,
/// sorted by luma, trimmed at both ends, then averaged.
pub fn sample_cell(
    pixels: &RgbImageView<'_>,
    quad: &[Point2<f32>; 4],
    cell: usize,
    params: &SamplerParams,
) -> Result<Rgb, SamplingError> {
    let h = homography_from_quad(&UNIT_SQUARE, quad)
        .ok_or(SamplingError::DegenerateCell { cell })?;

    let k = params.grid_side.max(2);
    let total = k * k;
    let mut samples: Vec<Rgb> = Vec::with_capacity(total);

    for sy in 0..k {
        for sx in 0..k {
            let tx = params.inset_frac
                + (1.0 - 2.0 * params.inset_frac) * (sx as f32 / (k - 1) as f32);
            let ty = params.inset_frac
                + (1.0 - 2.0 * params.inset_frac) * (sy as f32 / (k - 1) as f32);
            let p = h.apply(Point2::new(tx, ty));
            if !pixels.contains(p.x, p.y) {
                continue;
            }
            samples.push(sample_bilinear_rgb(pixels, p.x, p.y));
        }
    }

    let required = ((params.min_valid_frac * total as f32).ceil() as usize).max(1);
    if samples.len() < required {
        return Err(SamplingError::OutOfBounds {
            cell,
            valid: samples.len(),
            total,
        });
    }

    Ok(trimmed_mean(&mut samples, params.trim_frac))
}

/// Sample all nine cells of a detected face grid, row-major.
pub fn sample_face(
    pixels: &RgbImageView<'_>,
    grid: &FaceGrid,
    params: &SamplerParams,
) -> Result<[Rgb; 9], SamplingError> {
    let mut out = [[0.0f32; 3]; 9];
    for (cell, quad) in grid.cells.iter().enumerate() {
        out[cell] = sample_cell(pixels, quad, cell, params)?;
    }
    Ok(out)
}

fn trimmed_mean(samples: &mut [Rgb], trim_frac: f32) -> Rgb {
    samples.sort_by(|a, b| luma(a).total_cmp(&luma(b)));

    // Trim fractions come from config files; at or above 0.5 the requested
    // trim would swallow the whole slice, so cap it to keep the median.
    let trim = ((trim_frac.max(0.0) * samples.len() as f32).floor() as usize)
        .min((samples.len() - 1) / 2);
    let kept = &samples[trim..samples.len() - trim];

    let mut mean = [0.0f32; 3];
    for s in kept {
        for c in 0..3 {
            mean[c] += s[c];
        }
    }
    for c in &mut mean {
        *c /= kept.len() as f32;
    }
    mean
}

#[inline]
fn luma(rgb: &Rgb) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(w: usize, h: usize, rgb: [u8; 3]) -> Vec<u8> {
        let mut data = Vec::with_capacity(w * h * 3);
        for _ in 0..w * h {
            data.extend_from_slice(&rgb);
        }
        data
    }

    fn square_quad(x0: f32, y0: f32, side: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ]
    }

    #[test]
    fn solid_cell_samples_exactly() {
        let data = solid_image(64, 64, [200, 30, 90]);
        let view = RgbImageView {
            width: 64,
            height: 64,
            data: &data,
        };
        let rgb = sample_cell(&view, &square_quad(10.0, 10.0, 30.0), 0, &SamplerParams::default())
            .expect("sample");
        assert!((rgb[0] - 200.0).abs() < 0.5);
        assert!((rgb[1] - 30.0).abs() < 0.5);
        assert!((rgb[2] - 90.0).abs() < 0.5);
    }

    #[test]
    fn trimming_discards_a_glare_speck() {
        let mut data = solid_image(64, 64, [200, 30, 90]);
        // Blow out a small bright patch inside the cell.
        for y in 20..24 {
            for x in 20..24 {
                let i = (y * 64 + x) * 3;
                data[i] = 255;
                data[i + 1] = 255;
                data[i + 2] = 255;
            }
        }
        let view = RgbImageView {
            width: 64,
            height: 64,
            data: &data,
        };
        let rgb = sample_cell(&view, &square_quad(10.0, 10.0, 30.0), 0, &SamplerParams::default())
            .expect("sample");
        assert!((rgb[0] - 200.0).abs() < 2.0);
        assert!((rgb[1] - 30.0).abs() < 2.0);
    }

    #[test]
    fn oversized_trim_fraction_still_yields_a_sample() {
        let data = solid_image(64, 64, [200, 30, 90]);
        let view = RgbImageView {
            width: 64,
            height: 64,
            data: &data,
        };
        let params = SamplerParams {
            trim_frac: 0.6,
            ..SamplerParams::default()
        };
        let rgb = sample_cell(&view, &square_quad(10.0, 10.0, 30.0), 0, &params)
            .expect("trimming caps at the median");
        assert!((rgb[0] - 200.0).abs() < 0.5);
    }

    #[test]
    fn out_of_frame_cell_fails() {
        let data = solid_image(32, 32, [10, 10, 10]);
        let view = RgbImageView {
            width: 32,
            height: 32,
            data: &data,
        };
        let err = sample_cell(&view, &square_quad(20.0, 20.0, 30.0), 4, &SamplerParams::default())
            .unwrap_err();
        assert!(matches!(err, SamplingError::OutOfBounds { cell: 4, .. }));
    }

    #[test]
    fn degenerate_quad_fails() {
        let data = solid_image(32, 32, [10, 10, 10]);
        let view = RgbImageView {
            width: 32,
            height: 32,
            data: &data,
        };
        let quad = [Point2::new(5.0, 5.0); 4];
        let err = sample_cell(&view, &quad, 7, &SamplerParams::default()).unwrap_err();
        assert!(matches!(err, SamplingError::DegenerateCell { cell: 7 }));
    }
}
