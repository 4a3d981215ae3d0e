//! The per-frame ocean pipeline and its state machine.

use glam::{Vec2, Vec3};
use num_complex::Complex32;

use super::fft::StockhamFft;
use super::spectrum::{spectrum_snapshot, PhaseField, WaveSpectrum};
use crate::params::OceanSpectrumParams;

const ZERO_SAMPLE: [Complex32; 2] = [Complex32::new(0.0, 0.0); 2];

/// Owns every field of the spectral pipeline and the `changed` flag that
/// gates base-spectrum recomputation and size-dependent uniform refresh.
///
/// Per frame: phase advance -> snapshot -> inverse FFT -> normals. Only a
/// parameter edit (wind, size, choppiness) re-derives the base spectrum.
pub struct OceanSynthesizer {
    params: OceanSpectrumParams,
    changed: bool,
    spectrum: WaveSpectrum,
    phases: PhaseField,
    snapshot: Vec<[Complex32; 2]>,
    transformed: Vec<[Complex32; 2]>,
    fft: StockhamFft,
    displacement: Vec<[f32; 4]>,
    normals: Vec<[f32; 4]>,
}

impl OceanSynthesizer {
    pub fn new(params: OceanSpectrumParams) -> Result<Self, String> {
        params.validate()?;
        let r = params.resolution;
        let len = r * r;
        Ok(Self {
            spectrum: WaveSpectrum::new(&params),
            phases: PhaseField::new(r, params.phase_seed),
            snapshot: vec![ZERO_SAMPLE; len],
            transformed: vec![ZERO_SAMPLE; len],
            fft: StockhamFft::new(r)?,
            displacement: vec![[0.0; 4]; len],
            normals: vec![[0.0, 1.0, 0.0, 1.0]; len],
            changed: true,
            params,
        })
    }

    pub fn resolution(&self) -> usize {
        self.params.resolution
    }

    pub fn size(&self) -> f32 {
        self.params.size
    }

    pub fn wind(&self) -> Vec2 {
        self.params.wind
    }

    pub fn choppiness(&self) -> f32 {
        self.params.choppiness
    }

    /// Displacement field: (x offset, height, z offset, pad) per texel.
    pub fn displacement(&self) -> &[[f32; 4]] {
        &self.displacement
    }

    /// Surface normals: (x, y, z, 1) per texel.
    pub fn normals(&self) -> &[[f32; 4]] {
        &self.normals
    }

    pub fn set_wind(&mut self, wind: Vec2) -> Result<(), String> {
        if wind.length_squared() == 0.0 {
            return Err("wind vector must be non-zero".to_string());
        }
        self.params.wind = wind;
        self.changed = true;
        Ok(())
    }

    pub fn set_size(&mut self, size: f32) -> Result<(), String> {
        if size <= 0.0 {
            return Err(format!("patch size must be positive, got {}", size));
        }
        self.params.size = size;
        self.changed = true;
        Ok(())
    }

    pub fn set_choppiness(&mut self, choppiness: f32) -> Result<(), String> {
        if choppiness < 0.0 {
            return Err(format!("choppiness must be non-negative, got {}", choppiness));
        }
        self.params.choppiness = choppiness;
        self.changed = true;
        Ok(())
    }

    /// Advance the simulation by `dt` seconds and rebuild the displacement
    /// and normal fields.
    pub fn update(&mut self, dt: f32) {
        if self.changed {
            self.spectrum = WaveSpectrum::new(&self.params);
        }

        self.phases.advance(self.params.size, dt);
        spectrum_snapshot(
            &self.spectrum,
            self.phases.current(),
            self.params.size,
            self.params.choppiness,
            &mut self.snapshot,
        );
        self.fft.inverse_2d(&self.snapshot, &mut self.transformed);

        for (dst, src) in self.displacement.iter_mut().zip(&self.transformed) {
            // channel 0 carries (x offset, height), channel 1 carries z
            *dst = [src[0].re, src[0].im, src[1].re, 0.0];
        }

        self.compute_normals();
    }

    /// True exactly once after a parameter edit; the consumer refreshes its
    /// size-dependent uniform state on that frame.
    pub fn consume_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Central-difference normal estimate from four neighboring texels,
    /// summing the cross products of adjacent edge vectors. Edges clamp.
    fn compute_normals(&mut self) {
        let r = self.params.resolution;
        let texel_size = self.params.size / r as f32;
        let max = (r - 1) as isize;

        let at = |displacement: &[[f32; 4]], x: isize, y: isize| -> Vec3 {
            let x = x.clamp(0, max) as usize;
            let y = y.clamp(0, max) as usize;
            let d = displacement[y * r + x];
            Vec3::new(d[0], d[1], d[2])
        };

        for m in 0..r as isize {
            for n in 0..r as isize {
                let center = at(&self.displacement, n, m);
                let right =
                    Vec3::new(texel_size, 0.0, 0.0) + at(&self.displacement, n + 1, m) - center;
                let left =
                    Vec3::new(-texel_size, 0.0, 0.0) + at(&self.displacement, n - 1, m) - center;
                let top =
                    Vec3::new(0.0, 0.0, -texel_size) + at(&self.displacement, n, m - 1) - center;
                let bottom =
                    Vec3::new(0.0, 0.0, texel_size) + at(&self.displacement, n, m + 1) - center;

                let normal = (right.cross(top)
                    + top.cross(left)
                    + left.cross(bottom)
                    + bottom.cross(right))
                .normalize();

                self.normals[(m * r as isize + n) as usize] =
                    [normal.x, normal.y, normal.z, 1.0];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OceanSpectrumParams;

    fn synthesizer(resolution: usize) -> OceanSynthesizer {
        OceanSynthesizer::new(OceanSpectrumParams {
            resolution,
            ..OceanSpectrumParams::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_degenerate_params() {
        let mut params = OceanSpectrumParams::default();
        params.size = 0.0;
        assert!(OceanSynthesizer::new(params).is_err());

        let mut params = OceanSpectrumParams::default();
        params.resolution = 100;
        assert!(OceanSynthesizer::new(params).is_err());
    }

    #[test]
    fn test_displacement_is_real_and_bounded() {
        let mut ocean = synthesizer(32);
        ocean.update(1.0 / 60.0);
        for texel in ocean.displacement() {
            for component in texel {
                assert!(component.is_finite());
            }
        }
    }

    #[test]
    fn test_update_produces_unit_normals() {
        let mut ocean = synthesizer(32);
        ocean.update(1.0 / 60.0);
        for normal in ocean.normals() {
            let len = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2])
                .sqrt();
            assert!((len - 1.0).abs() < 1e-4, "normal length {}", len);
            // the surface never folds fully over
            assert!(normal[1] > 0.0);
        }
    }

    #[test]
    fn test_changed_flag_lifecycle() {
        let mut ocean = synthesizer(16);
        assert!(ocean.consume_changed(), "fresh synthesizer starts dirty");
        assert!(!ocean.consume_changed());

        ocean.set_choppiness(1.5).unwrap();
        assert!(ocean.consume_changed());
        assert!(!ocean.consume_changed());

        ocean.set_wind(Vec2::new(8.0, 1.0)).unwrap();
        ocean.update(0.016);
        assert!(ocean.consume_changed());
    }

    #[test]
    fn test_setters_validate() {
        let mut ocean = synthesizer(16);
        assert!(ocean.set_size(-5.0).is_err());
        assert!(ocean.set_wind(Vec2::ZERO).is_err());
        assert!(ocean.set_choppiness(-1.0).is_err());
        // a failed edit must not dirty the pipeline
        ocean.consume_changed();
        assert!(ocean.set_size(0.0).is_err());
        assert!(!ocean.consume_changed());
    }

    #[test]
    fn test_phase_continuity_across_parameter_edit() {
        // editing the wind must not reset phases: heights evolve smoothly
        let mut ocean = synthesizer(32);
        ocean.update(0.016);
        let before: Vec<f32> = ocean.displacement().iter().map(|d| d[1]).collect();

        ocean.set_choppiness(4.0).unwrap();
        ocean.update(1e-6);
        let after: Vec<f32> = ocean.displacement().iter().map(|d| d[1]).collect();

        // choppiness only scales horizontal offsets; heights barely move
        // over a microsecond step
        let max_delta = before
            .iter()
            .zip(&after)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        let max_height = before.iter().fold(0.0f32, |acc, h| acc.max(h.abs()));
        assert!(
            max_delta < max_height * 0.05 + 1e-3,
            "height field jumped by {} after a parameter edit",
            max_delta
        );
    }
}
