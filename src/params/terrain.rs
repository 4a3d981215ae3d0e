//! Terrain generation options and island shaping configuration.

/// Noise function selection for terrain generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    /// Lattice value noise (blocky rolling swells)
    Wave,
    /// Gradient noise
    Perlin,
    /// OpenSimplex noise
    Simplex,
}

/// Heightfield generation options
///
/// Same `(seed, noisefn, options)` always yields an identical mesh; there is
/// no hidden global state behind a generation call.
#[derive(Debug, Clone)]
pub struct TerrainOptions {
    /// Grid cells along X (vertex coordinates span 0..=width)
    pub width: usize,

    /// Peak height of the generated terrain (world units)
    pub height: f32,

    /// Grid cells along Z (vertex coordinates span 0..=depth)
    pub depth: usize,

    /// Noise seed
    pub seed: u32,

    /// Noise function used for elevation
    pub noisefn: NoiseKind,

    /// Noise amplitude scale (values past 1/roughness saturate toward
    /// plateaus); frequency is fixed by the grid, not by roughness
    pub roughness: f32,
}

impl TerrainOptions {
    /// Island options derived from a single size, matching the scene's
    /// size slider semantics.
    pub fn island(size: usize, seed: u32) -> Self {
        Self {
            width: size,
            height: 3.0 + 0.1 * size as f32,
            depth: size,
            seed,
            noisefn: NoiseKind::Perlin,
            roughness: 5.0 + 0.05 * size as f32,
        }
    }

    /// Static sea-bed options: broad, shallow, heavily saturated swells.
    pub fn sea_bed(seed: u32) -> Self {
        Self {
            width: 200,
            height: 0.25,
            depth: 200,
            seed,
            noisefn: NoiseKind::Perlin,
            roughness: 500.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.depth == 0 {
            return Err(format!(
                "terrain grid must be non-empty, got {}x{}",
                self.width, self.depth
            ));
        }
        Ok(())
    }
}

/// Radial island shaping parameters
///
/// Several incompatible literal variants of this shaping exist in the wild;
/// this is the smooth-falloff variant with every constant exposed.
#[derive(Debug, Clone)]
pub struct IslandShaping {
    /// Shaping radius as a fraction of the island size
    pub radius_fraction: f32,

    /// Base of the exponential falloff applied outside the radius
    pub falloff_base: f32,

    /// Exponent applied to size for the interior spike-suppression bias
    pub interior_bias_exponent: f32,

    /// Squared-distance overshoot (relative to island size) past which the
    /// outer texture-coordinate branch is used; the resulting seam is
    /// intentional
    pub uv_seam_scale: f32,
}

impl Default for IslandShaping {
    fn default() -> Self {
        Self {
            radius_fraction: 1.0 / 3.0,
            falloff_base: 1.01,
            interior_bias_exponent: -1.5,
            uv_seam_scale: 1.0,
        }
    }
}
