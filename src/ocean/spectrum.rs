//! Frequency-domain wave synthesis: the initial swell spectrum, phase
//! evolution, and the per-frame complex spectrum snapshot.

use glam::Vec2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

use crate::params::OceanSpectrumParams;

/// Gravitational acceleration (m/s^2)
pub const G: f32 = 9.81;

/// Gravity-capillary crossover wavenumber (rad/m)
pub const KM: f32 = 370.0;

/// Phase speed at the capillary peak (m/s)
const CM: f32 = 0.23;

/// Dispersion relation for gravity-capillary waves.
pub fn omega(k: f32) -> f32 {
    (G * k * (1.0 + (k / KM) * (k / KM))).sqrt()
}

/// Wavevector for grid cell (n, m), with indices wrapped so the
/// zero-frequency bin sits at (0, 0) and negative frequencies fill the
/// upper half of each axis.
pub fn wave_vector(n: usize, m: usize, resolution: usize, size: f32) -> Vec2 {
    let half = (resolution / 2) as f32;
    let nf = n as f32;
    let mf = m as f32;
    let x = if nf < half { nf } else { nf - resolution as f32 };
    let y = if mf < half { mf } else { mf - resolution as f32 };
    Vec2::new(x, y) * (2.0 * PI / size)
}

/// Initial frequency-domain wave amplitudes.
///
/// Combines a dominant-wind long-wave peak with a capillary correction
/// term, weighted by directional spreading against the wind. Amplitudes are
/// real by construction; conjugate symmetry is applied when the snapshot is
/// taken. The zero bin is always zero.
pub struct WaveSpectrum {
    resolution: usize,
    amplitudes: Vec<f32>,
}

impl WaveSpectrum {
    pub fn new(params: &OceanSpectrumParams) -> Self {
        let r = params.resolution;
        let mut amplitudes = vec![0.0f32; r * r];

        let u10 = params.wind.length();
        let wind_dir = params.wind / u10;

        // inverse wave age of a fully developed sea
        let omega_c = 0.84f32;
        let kp = G * (omega_c / u10) * (omega_c / u10);
        let cp = omega(kp) / kp;

        let z0 = 0.000037 * u10 * u10 / G * (u10 / cp).powf(0.9);
        let u_star = 0.41 * u10 / (10.0 / z0).ln();
        let alpha_p = 0.006 * omega_c.sqrt();
        let alpha_m = if u_star < CM {
            0.01 * (1.0 + (u_star / CM).ln())
        } else {
            0.01 * (1.0 + 3.0 * (u_star / CM).ln())
        };
        let gamma = 1.7f32;
        let sigma = 0.08 * (1.0 + 4.0 * omega_c.powf(-3.0));
        let a0 = 2.0f32.ln() / 4.0;
        let am = 0.13 * u_star / CM;
        let dk = 2.0 * PI / params.size;

        for m in 0..r {
            for n in 0..r {
                let k_vec = wave_vector(n, m, r, params.size);
                let k = k_vec.length();
                if k == 0.0 {
                    continue; // zero bin stays at zero amplitude
                }
                let c = omega(k) / k;

                // long-wave peak
                let lpm = (-1.25 * (kp / k) * (kp / k)).exp();
                let peak_shape =
                    (-((k / kp).sqrt() - 1.0).powi(2) / 2.0 * sigma * sigma).exp();
                let jp = gamma.powf(peak_shape);
                let fp = lpm * jp * (-omega_c / 10.0f32.sqrt() * ((k / kp).sqrt() - 1.0)).exp();
                let bl = 0.5 * alpha_p * cp / c * fp;

                // capillary correction
                let fm = (-0.25 * (k / KM - 1.0).powi(2)).exp();
                let bh = 0.5 * alpha_m * CM / c * fm * lpm;

                let delta =
                    (a0 + 4.0 * (c / cp).powf(2.5) + am * (CM / c).powf(2.5)).tanh();
                let cos_phi = wind_dir.dot(k_vec / k);

                let spread = 1.0 + delta * (2.0 * cos_phi * cos_phi - 1.0);
                let s = (1.0 / (2.0 * PI)) * k.powi(-4) * (bl + bh) * spread;

                amplitudes[m * r + n] = (s.max(0.0) / 2.0).sqrt() * dk;
            }
        }

        Self { resolution: r, amplitudes }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn amplitude(&self, n: usize, m: usize) -> f32 {
        self.amplitudes[m * self.resolution + n]
    }
}

/// Per-bin phases, advanced every frame by the dispersion frequency.
///
/// Tracked as durable state (rather than recomputed from absolute time) so
/// that wind or size edits mid-session never snap the surface; stored as an
/// explicit double buffer indexed by frame parity.
pub struct PhaseField {
    resolution: usize,
    buffers: [Vec<f32>; 2],
    parity: usize,
}

impl PhaseField {
    pub fn new(resolution: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let initial: Vec<f32> = (0..resolution * resolution)
            .map(|_| rng.gen::<f32>() * 2.0 * PI)
            .collect();
        let other = vec![0.0f32; resolution * resolution];
        Self {
            resolution,
            buffers: [initial, other],
            parity: 0,
        }
    }

    /// Advance every phase by `omega(k) * dt`, wrapped into [0, 2pi).
    ///
    /// Reads the parity buffer, writes the other, then flips parity; the
    /// buffer being read is never the buffer being written.
    pub fn advance(&mut self, size: f32, dt: f32) {
        let r = self.resolution;
        let [front, back] = &mut self.buffers;
        let (src, dst) = if self.parity == 0 {
            (&*front, back)
        } else {
            (&*back, front)
        };
        for m in 0..r {
            for n in 0..r {
                let k = wave_vector(n, m, r, size).length();
                let idx = m * r + n;
                dst[idx] = (src[idx] + omega(k) * dt).rem_euclid(2.0 * PI);
            }
        }
        self.parity ^= 1;
    }

    /// The most recently written phase grid.
    pub fn current(&self) -> &[f32] {
        &self.buffers[self.parity]
    }
}

/// Collapse the spectrum and phases into per-bin complex amplitudes.
///
/// Each output sample packs two independent complex channels so the FFT can
/// batch two transforms per pass: channel 0 carries `hX + i*h` (choppy X
/// displacement and height), channel 1 carries `hZ`. The snapshot is built
/// conjugate-symmetric, which guarantees a real-valued field after the
/// inverse transform.
pub fn spectrum_snapshot(
    spectrum: &WaveSpectrum,
    phases: &[f32],
    size: f32,
    choppiness: f32,
    out: &mut [[Complex32; 2]],
) {
    let r = spectrum.resolution();
    let i = Complex32::new(0.0, 1.0);
    for m in 0..r {
        for n in 0..r {
            let idx = m * r + n;
            let k_vec = wave_vector(n, m, r, size);
            let k = k_vec.length();
            if k == 0.0 {
                out[idx] = [Complex32::new(0.0, 0.0); 2];
                continue;
            }

            let rot = Complex32::from_polar(1.0, phases[idx]);
            let h0 = Complex32::new(spectrum.amplitude(n, m), 0.0);
            // the conjugate partner lives at the negated wavevector
            let h0_neg = Complex32::new(
                spectrum.amplitude((r - n) % r, (r - m) % r),
                0.0,
            );
            let h = h0 * rot + h0_neg.conj() * rot.conj();

            let hx = -(i * (h * (k_vec.x / k))) * choppiness;
            let hz = -(i * (h * (k_vec.y / k))) * choppiness;
            out[idx] = [hx + i * h, hz];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OceanSpectrumParams;

    fn test_params(resolution: usize) -> OceanSpectrumParams {
        OceanSpectrumParams {
            resolution,
            ..OceanSpectrumParams::default()
        }
    }

    #[test]
    fn test_spectrum_zero_bin_is_zero() {
        let spectrum = WaveSpectrum::new(&test_params(64));
        assert_eq!(spectrum.amplitude(0, 0), 0.0);
    }

    #[test]
    fn test_spectrum_amplitudes_non_negative() {
        let spectrum = WaveSpectrum::new(&test_params(64));
        for m in 0..64 {
            for n in 0..64 {
                let h = spectrum.amplitude(n, m);
                assert!(h >= 0.0, "negative amplitude {} at ({}, {})", h, n, m);
                assert!(h.is_finite(), "non-finite amplitude at ({}, {})", n, m);
            }
        }
    }

    #[test]
    fn test_wave_vector_wrapping() {
        let r = 8;
        let size = 100.0;
        // index 1 maps to +1, index r-1 maps to -1
        let pos = wave_vector(1, 0, r, size);
        let neg = wave_vector(r - 1, 0, r, size);
        assert!((pos.x + neg.x).abs() < 1e-6);
        assert_eq!(wave_vector(0, 0, r, size), Vec2::ZERO);
    }

    #[test]
    fn test_phase_advance_zero_dt_is_identity() {
        let mut phases = PhaseField::new(32, 7);
        let before = phases.current().to_vec();
        phases.advance(1000.0, 0.0);
        let after = phases.current();
        for (a, b) in before.iter().zip(after) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_phase_advance_stays_in_range() {
        let mut phases = PhaseField::new(32, 7);
        for _ in 0..100 {
            phases.advance(1000.0, 0.3);
        }
        for &p in phases.current() {
            assert!((0.0..2.0 * PI + 1e-4).contains(&p), "phase {} out of range", p);
        }
    }

    #[test]
    fn test_phase_advance_periodicity() {
        let r = 16;
        let size = 500.0;
        let mut phases = PhaseField::new(r, 3);
        let before = phases.current().to_vec();

        // one full period of the (1, 0) bin, split across many steps
        let k = wave_vector(1, 0, r, size).length();
        let period = 2.0 * PI / omega(k);
        let steps = 64;
        for _ in 0..steps {
            phases.advance(size, period / steps as f32);
        }

        let idx = 1; // bin (1, 0)
        let delta = (phases.current()[idx] - before[idx]).rem_euclid(2.0 * PI);
        let wrapped = delta.min(2.0 * PI - delta);
        assert!(wrapped < 1e-2, "phase drifted by {} after one period", wrapped);
    }

    #[test]
    fn test_snapshot_zero_bin_and_symmetry() {
        let r = 16;
        let params = test_params(r);
        let spectrum = WaveSpectrum::new(&params);
        let phases = PhaseField::new(r, 11);
        let mut snapshot = vec![[Complex32::new(0.0, 0.0); 2]; r * r];
        spectrum_snapshot(&spectrum, phases.current(), params.size, 1.0, &mut snapshot);

        assert_eq!(snapshot[0][0], Complex32::new(0.0, 0.0));
        assert_eq!(snapshot[0][1], Complex32::new(0.0, 0.0));

        // h(k) built from h0 and h0(-k) must be finite everywhere
        for sample in &snapshot {
            assert!(sample[0].re.is_finite() && sample[0].im.is_finite());
            assert!(sample[1].re.is_finite() && sample[1].im.is_finite());
        }
    }
}
