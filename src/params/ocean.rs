//! Spectral ocean synthesizer parameters.

use glam::Vec2;

/// Wave spectrum synthesis parameters
#[derive(Debug, Clone)]
pub struct OceanSpectrumParams {
    /// Wind vector over the patch (m/s, horizontal components)
    pub wind: Vec2,

    /// Simulated patch size (meters per spectrum period)
    pub size: f32,

    /// Spectrum grid resolution (samples per side, must be a power of two)
    pub resolution: usize,

    /// Horizontal displacement scale producing sharper crests (dimensionless)
    pub choppiness: f32,

    /// Seed for the initial random phase field
    pub phase_seed: u64,
}

impl Default for OceanSpectrumParams {
    fn default() -> Self {
        Self {
            wind: Vec2::new(5.0, 5.0),
            size: 1000.0,
            // 256 keeps the per-frame transform comfortably under 16ms;
            // raise via --resolution on faster machines.
            resolution: 256,
            choppiness: 3.0,
            phase_seed: 42,
        }
    }
}

impl OceanSpectrumParams {
    /// Validate parameters before any field is allocated.
    ///
    /// Non-positive size or a degenerate resolution would silently produce
    /// an all-zero ocean, so they are rejected up front.
    pub fn validate(&self) -> Result<(), String> {
        if self.size <= 0.0 {
            return Err(format!("patch size must be positive, got {}", self.size));
        }
        if self.resolution < 2 || !self.resolution.is_power_of_two() {
            return Err(format!(
                "spectrum resolution must be a power of two >= 2, got {}",
                self.resolution
            ));
        }
        if self.wind.length_squared() == 0.0 {
            return Err("wind vector must be non-zero".to_string());
        }
        if self.choppiness < 0.0 {
            return Err(format!(
                "choppiness must be non-negative, got {}",
                self.choppiness
            ));
        }
        Ok(())
    }
}

/// Ocean patch geometry (the rendered mesh, distinct from the spectrum grid)
#[derive(Debug, Clone)]
pub struct OceanGeometry {
    /// Vertices per side of the rendered patch
    pub resolution: usize,

    /// World-space extent of the patch (meters per side)
    pub size: f32,

    /// World-space XZ origin of the patch corner (meters)
    pub origin: [f32; 2],
}

impl Default for OceanGeometry {
    fn default() -> Self {
        Self {
            resolution: 256,
            size: 2000.0,
            origin: [-1000.0, -1000.0],
        }
    }
}
