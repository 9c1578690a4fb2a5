use cube_scan_core::GrayImage;

/// L1 gradient magnitudes (|gx| + |gy|), same geometry as the source plane.
#[derive(Clone, Debug)]
pub struct GradientPlane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

impl GradientPlane {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }
}

/// Box-mean downscale by an integer factor. A factor of 1 copies.
///
/// Trailing rows/columns that do not fill a full box are dropped, matching
/// the truncated output dimensions.
pub fn box_downscale(src: &GrayImage, factor: usize) -> GrayImage {
    assert!(factor >= 1);
    if factor == 1 {
        return src.clone();
    }
    let w = src.width / factor;
    let h = src.height / factor;
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            for dy in 0..factor {
                for dx in 0..factor {
                    sum += src.data[(y * factor + dy) * src.width + (x * factor + dx)] as u32;
                }
            }
            data.push((sum / (factor * factor) as u32) as u8);
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}

/// Sobel L1 gradient magnitude. Border pixels read out-of-bounds taps as 0,
/// which makes the image border itself high-gradient; the blob stage relies
/// on that to keep regions away from the frame edge.
pub fn sobel_magnitude(src: &GrayImage) -> GradientPlane {
    let w = src.width;
    let h = src.height;
    let mut data = vec![0u16; w * h];

    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let p = |dx: i32, dy: i32| src.get(x + dx, y + dy) as i32;

            let gx = (p(1, -1) + 2 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2 * p(0, -1) + p(1, -1));

            data[y as usize * w + x as usize] = (gx.abs() + gy.abs()) as u16;
        }
    }

    GradientPlane {
        width: w,
        height: h,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_zero_interior_gradient() {
        let img = GrayImage {
            width: 8,
            height: 8,
            data: vec![120; 64],
        };
        let grad = sobel_magnitude(&img);
        for y in 1..7 {
            for x in 1..7 {
                assert_eq!(grad.get(x, y), 0);
            }
        }
        // Border taps fall outside and read 0, so the border is an edge.
        assert!(grad.get(0, 3) > 0);
    }

    #[test]
    fn step_edge_produces_gradient() {
        let mut data = vec![0u8; 64];
        for y in 0..8 {
            for x in 4..8 {
                data[y * 8 + x] = 200;
            }
        }
        let img = GrayImage {
            width: 8,
            height: 8,
            data,
        };
        let grad = sobel_magnitude(&img);
        assert!(grad.get(4, 4) >= 600);
        assert_eq!(grad.get(2, 4), 0);
    }

    #[test]
    fn downscale_halves_dimensions_and_averages() {
        let img = GrayImage {
            width: 4,
            height: 2,
            data: vec![0, 0, 100, 100, 0, 0, 100, 100],
        };
        let small = box_downscale(&img, 2);
        assert_eq!((small.width, small.height), (2, 1));
        assert_eq!(small.data, vec![0, 100]);
    }
}
