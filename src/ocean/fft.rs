//! 2-D FFT in the Stockham formulation.
//!
//! The Stockham variant needs no bit-reversal pass: each stage applies an
//! index permutation while ping-ponging between two scratch buffers. The
//! full 2-D transform is log2(R) row-wise stages followed by log2(R)
//! column-wise stages, with two independent complex channels packed per
//! sample and transformed together.

use num_complex::Complex32;
use std::f32::consts::PI;

const ZERO_SAMPLE: [Complex32; 2] = [Complex32::new(0.0, 0.0); 2];

pub struct StockhamFft {
    resolution: usize,
    stages_per_axis: u32,
    scratch: [Vec<[Complex32; 2]>; 2],
}

impl StockhamFft {
    pub fn new(resolution: usize) -> Result<Self, String> {
        if resolution < 2 || !resolution.is_power_of_two() {
            return Err(format!(
                "FFT resolution must be a power of two >= 2, got {}",
                resolution
            ));
        }
        let len = resolution * resolution;
        Ok(Self {
            resolution,
            stages_per_axis: resolution.trailing_zeros(),
            scratch: [vec![ZERO_SAMPLE; len], vec![ZERO_SAMPLE; len]],
        })
    }

    /// Run the full 2-D transform.
    ///
    /// Stage 0 reads `input`, the final stage writes straight into
    /// `output`, and every intermediate stage ping-pongs between the two
    /// scratch buffers based on stage parity. On a conjugate-symmetric
    /// spectrum the result is real-valued per channel (up to float noise).
    pub fn inverse_2d(&mut self, input: &[[Complex32; 2]], output: &mut [[Complex32; 2]]) {
        let r = self.resolution;
        debug_assert_eq!(input.len(), r * r);
        debug_assert_eq!(output.len(), r * r);

        let total_stages = self.stages_per_axis * 2;
        let [ping, pong] = &mut self.scratch;

        for stage in 0..total_stages {
            let horizontal = stage < self.stages_per_axis;
            let subtransform_size = 1usize << ((stage % self.stages_per_axis) + 1);

            let (src, dst): (&[[Complex32; 2]], &mut [[Complex32; 2]]) = if stage == 0 {
                (input, &mut ping[..])
            } else if stage == total_stages - 1 {
                // total stage count is even, so the last write went to ping
                (&ping[..], &mut *output)
            } else if stage % 2 == 1 {
                (&ping[..], &mut pong[..])
            } else {
                (&pong[..], &mut ping[..])
            };

            subtransform(src, dst, r, subtransform_size, horizontal);
        }
    }
}

/// One butterfly stage over the whole grid, along rows or columns.
fn subtransform(
    src: &[[Complex32; 2]],
    dst: &mut [[Complex32; 2]],
    resolution: usize,
    subtransform_size: usize,
    horizontal: bool,
) {
    let half_size = subtransform_size / 2;
    let half_res = resolution / 2;

    for y in 0..resolution {
        for x in 0..resolution {
            let index = if horizontal { x } else { y };
            let even_index = index / subtransform_size * half_size + index % half_size;

            let (even, odd) = if horizontal {
                (
                    src[y * resolution + even_index],
                    src[y * resolution + even_index + half_res],
                )
            } else {
                (
                    src[even_index * resolution + x],
                    src[(even_index + half_res) * resolution + x],
                )
            };

            let twiddle = Complex32::from_polar(
                1.0,
                -2.0 * PI * index as f32 / subtransform_size as f32,
            );
            dst[y * resolution + x] =
                [even[0] + twiddle * odd[0], even[1] + twiddle * odd[1]];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;

    fn zeros(r: usize) -> Vec<[Complex32; 2]> {
        vec![ZERO_SAMPLE; r * r]
    }

    /// Reference 2-D DFT: rustfft forward over rows, then over columns.
    fn reference_2d(field: &[[Complex32; 2]], r: usize) -> Vec<[Complex32; 2]> {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(r);
        let mut out = field.to_vec();

        for channel in 0..2 {
            // rows
            for y in 0..r {
                let mut row: Vec<Complex32> =
                    (0..r).map(|x| out[y * r + x][channel]).collect();
                fft.process(&mut row);
                for x in 0..r {
                    out[y * r + x][channel] = row[x];
                }
            }
            // columns
            for x in 0..r {
                let mut col: Vec<Complex32> =
                    (0..r).map(|y| out[y * r + x][channel]).collect();
                fft.process(&mut col);
                for y in 0..r {
                    out[y * r + x][channel] = col[y];
                }
            }
        }
        out
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(StockhamFft::new(0).is_err());
        assert!(StockhamFft::new(1).is_err());
        assert!(StockhamFft::new(48).is_err());
        assert!(StockhamFft::new(64).is_ok());
    }

    #[test]
    fn test_matches_reference_dft() {
        let r = 16;
        let mut input = zeros(r);
        // deterministic pseudo-random field, both channels
        let mut state = 0x12345678u32;
        let mut next = || {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 8) as f32 / (1 << 24) as f32 - 0.5
        };
        for sample in input.iter_mut() {
            *sample = [
                Complex32::new(next(), next()),
                Complex32::new(next(), next()),
            ];
        }

        let mut output = zeros(r);
        StockhamFft::new(r).unwrap().inverse_2d(&input, &mut output);
        let expected = reference_2d(&input, r);

        for (got, want) in output.iter().zip(&expected) {
            for channel in 0..2 {
                let err = (got[channel] - want[channel]).norm();
                assert!(err < 1e-3, "channel error {} vs reference", err);
            }
        }
    }

    #[test]
    fn test_impulse_produces_sinusoid() {
        let r = 32;
        let (n0, m0) = (3, 5);
        let mut input = zeros(r);
        input[m0 * r + n0][0] = Complex32::new(1.0, 0.0);

        let mut output = zeros(r);
        StockhamFft::new(r).unwrap().inverse_2d(&input, &mut output);

        // an impulse at bin (n0, m0) transforms to a pure complex
        // exponential of that spatial frequency
        for y in 0..r {
            for x in 0..r {
                let theta =
                    -2.0 * PI * (n0 * x + m0 * y) as f32 / r as f32;
                let want = Complex32::from_polar(1.0, theta);
                let got = output[y * r + x][0];
                assert!(
                    (got - want).norm() < 1e-4,
                    "expected {:?}, got {:?} at ({}, {})",
                    want,
                    got,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_round_trip_recovers_input() {
        let r = 16;
        let mut input = zeros(r);
        for (i, sample) in input.iter_mut().enumerate() {
            let v = (i as f32 * 0.37).sin();
            *sample = [Complex32::new(v, -v * 0.5), Complex32::new(0.25 * v, v)];
        }

        let mut transformed = zeros(r);
        StockhamFft::new(r).unwrap().inverse_2d(&input, &mut transformed);

        // invert with the reference transform and matching normalization
        let mut planner = FftPlanner::<f32>::new();
        let ifft = planner.plan_fft_inverse(r);
        let mut recovered = transformed.clone();
        for channel in 0..2 {
            for y in 0..r {
                let mut row: Vec<Complex32> =
                    (0..r).map(|x| recovered[y * r + x][channel]).collect();
                ifft.process(&mut row);
                for x in 0..r {
                    recovered[y * r + x][channel] = row[x];
                }
            }
            for x in 0..r {
                let mut col: Vec<Complex32> =
                    (0..r).map(|y| recovered[y * r + x][channel]).collect();
                ifft.process(&mut col);
                for y in 0..r {
                    recovered[y * r + x][channel] = col[y] / (r * r) as f32;
                }
            }
        }

        for (got, want) in recovered.iter().zip(&input) {
            for channel in 0..2 {
                let err = (got[channel] - want[channel]).norm();
                assert!(err < 1e-3, "round-trip error {}", err);
            }
        }
    }
}
