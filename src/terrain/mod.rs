//! Procedural heightfield terrain: mesh generation, island shaping,
//! height-derived colormaps, flat normals, and the two-region texture
//! policy.

mod noise;

pub use noise::NoiseField;

use glam::Vec3;

use crate::params::{IslandShaping, TerrainOptions};

/// Noise cycles across a generated grid. Elevation detail is tied to the
/// grid resolution; roughness only scales amplitude.
const LATTICE_CYCLES: f64 = 4.0;

/// Heightfield mesh generator.
///
/// Meshes come back as flat vertex runs, three vertices per triangle, two
/// triangles per grid cell, in row-major cell order.
#[derive(Default)]
pub struct TerrainGenerator;

impl TerrainGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a `width` x `depth` triangulated heightfield.
    ///
    /// Pure function of its options: the same `(seed, noisefn, options)`
    /// yields a byte-identical vertex sequence.
    pub fn generate_terrain_mesh(&self, options: &TerrainOptions) -> Result<Vec<Vec3>, String> {
        options.validate()?;
        let field = NoiseField::new(options.noisefn, options.seed);
        let (w, d) = (options.width, options.depth);

        let height_at = |x: usize, z: usize| -> f32 {
            let nx = x as f64 / w as f64 * LATTICE_CYCLES;
            let nz = z as f64 / d as f64 * LATTICE_CYCLES;
            (field.sample(nx, nz) * options.roughness).clamp(-1.0, 1.0) * options.height
        };

        let mut triangles = Vec::with_capacity(w * d * 6);
        for z in 0..d {
            for x in 0..w {
                let p00 = Vec3::new(x as f32, height_at(x, z), z as f32);
                let p10 = Vec3::new((x + 1) as f32, height_at(x + 1, z), z as f32);
                let p01 = Vec3::new(x as f32, height_at(x, z + 1), (z + 1) as f32);
                let p11 = Vec3::new((x + 1) as f32, height_at(x + 1, z + 1), (z + 1) as f32);

                triangles.extend_from_slice(&[p00, p01, p11]);
                triangles.extend_from_slice(&[p00, p11, p10]);
            }
        }
        Ok(triangles)
    }
}

/// Reshape a heightfield into an island, in place.
///
/// Outside the shaping radius, height decays exponentially with the squared
/// overshoot and sinks below sea level; inside, a small negative bias
/// suppresses spikes near the center. The two branches agree exactly at the
/// radius.
pub fn fix_island(terrain: &mut [Vec3], size: f32, shaping: &IslandShaping) {
    let center = size / 2.0;
    let radius = size * shaping.radius_fraction;
    for vertex in terrain.iter_mut() {
        let distance = (vertex.x - center).powi(2) + (vertex.z - center).powi(2);
        let over_size = distance - radius * radius;
        if over_size > 0.0 {
            vertex.y = vertex.y * shaping.falloff_base.powf(-over_size) - over_size / size;
        } else {
            vertex.y -= over_size * size.powf(shaping.interior_bias_exponent);
        }
    }
}

/// Sand near the waterline band, grass shading above it.
pub fn build_island_colors(terrain: &[Vec3], height: f32) -> Vec<[f32; 3]> {
    let border = height / 4.0;
    terrain
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            let over_height = vertex.y + border;
            if over_height < 0.0 {
                [1.0 - (i % 3) as f32 / 20.0, 0.95, 0.85]
            } else {
                let shade = over_height / height / 2.0;
                [0.4 - shade, 0.6 - shade, 0.0]
            }
        })
        .collect()
}

/// Depth-tinted blue ramp; peaks shade toward white.
pub fn build_sea_colors(terrain: &[Vec3], height: f32) -> Vec<[f32; 3]> {
    terrain
        .iter()
        .map(|vertex| {
            let shade = (vertex.y / height - 0.25) * 3.0 + 0.25;
            [shade, shade, 1.0]
        })
        .collect()
}

/// Per-triangle face normals replicated across the triangle's vertices.
/// Terrain colors are per-vertex, but lighting stays faceted.
pub fn build_flat_normals(terrain: &[Vec3]) -> Vec<[f32; 3]> {
    let mut normals = Vec::with_capacity(terrain.len());
    for triangle in terrain.chunks_exact(3) {
        let normal = (triangle[1] - triangle[0])
            .cross(triangle[2] - triangle[0])
            .normalize_or_zero();
        for _ in 0..3 {
            normals.push(normal.to_array());
        }
    }
    normals
}

/// Two-region texture mapping: vertices far past the shaping radius use the
/// lower-left quarter of the texture, everything else the upper-right. The
/// seam between the regions is intentional.
pub fn build_island_tex_coords(
    terrain: &[Vec3],
    size: f32,
    shaping: &IslandShaping,
) -> Vec<[f32; 2]> {
    let center = size / 2.0;
    let radius = size * shaping.radius_fraction;
    let threshold = size * shaping.uv_seam_scale;
    terrain
        .iter()
        .map(|vertex| {
            let distance = (vertex.x - center).powi(2) + (vertex.z - center).powi(2);
            let over_size = distance - radius * radius;
            if over_size > threshold {
                [vertex.x / size / 2.0, vertex.z / size / 2.0]
            } else {
                [vertex.x / size / 2.0 + 0.5, vertex.z / size / 2.0 + 0.5]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::NoiseKind;

    fn island_options() -> TerrainOptions {
        TerrainOptions::island(20, 1234)
    }

    #[test]
    fn test_mesh_has_two_triangles_per_cell() {
        let mesh = TerrainGenerator::new()
            .generate_terrain_mesh(&island_options())
            .unwrap();
        assert_eq!(mesh.len(), 20 * 20 * 6);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = TerrainGenerator::new();
        let options = island_options();
        let a = generator.generate_terrain_mesh(&options).unwrap();
        let b = generator.generate_terrain_mesh(&options).unwrap();
        assert_eq!(a.len(), b.len());
        for (va, vb) in a.iter().zip(&b) {
            assert_eq!(va.to_array(), vb.to_array());
        }
    }

    #[test]
    fn test_noise_kinds_produce_distinct_terrain() {
        let generator = TerrainGenerator::new();
        let mut options = island_options();
        let perlin = generator.generate_terrain_mesh(&options).unwrap();
        options.noisefn = NoiseKind::Simplex;
        let simplex = generator.generate_terrain_mesh(&options).unwrap();
        assert!(perlin.iter().zip(&simplex).any(|(a, b)| a.y != b.y));
    }

    #[test]
    fn test_rejects_empty_grid() {
        let mut options = island_options();
        options.width = 0;
        assert!(TerrainGenerator::new().generate_terrain_mesh(&options).is_err());
    }

    #[test]
    fn test_heights_respect_cap() {
        let options = TerrainOptions {
            roughness: 1e6, // saturates every sample
            ..island_options()
        };
        let mesh = TerrainGenerator::new().generate_terrain_mesh(&options).unwrap();
        for vertex in &mesh {
            assert!(vertex.y.abs() <= options.height + 1e-4);
        }
    }

    #[test]
    fn test_fix_island_branch_continuity() {
        let size = 30.0;
        let shaping = IslandShaping::default();
        let radius = size * shaping.radius_fraction;

        // a vertex on the shaping radius: over_size ~= 0, interior branch,
        // and the height is untouched
        let on_radius = Vec3::new(size / 2.0 + radius, 4.0, size / 2.0);
        let mut exact = [on_radius];
        fix_island(&mut exact, size, &shaping);
        assert!((exact[0].y - 4.0).abs() < 1e-4);

        // an infinitesimally smaller radius flips the same vertex into the
        // falloff branch; the branches agree at the boundary
        let mut shrunk = shaping.clone();
        shrunk.radius_fraction -= 1e-6;
        let mut outer = [on_radius];
        fix_island(&mut outer, size, &shrunk);
        assert!((outer[0].y - 4.0).abs() < 1e-2);
    }

    #[test]
    fn test_fix_island_flattens_rim() {
        let generator = TerrainGenerator::new();
        let options = island_options();
        let size = options.width as f32;
        let mut mesh = generator.generate_terrain_mesh(&options).unwrap();
        fix_island(&mut mesh, size, &IslandShaping::default());

        // corner vertices end well below sea level
        for vertex in mesh.iter().filter(|v| v.x == 0.0 && v.z == 0.0) {
            assert!(vertex.y < -1.0, "corner height {} not sunk", vertex.y);
        }
    }

    #[test]
    fn test_island_colors_sand_below_grass_above() {
        let height = 8.0;
        let terrain = [
            Vec3::new(0.0, -height / 2.0, 0.0), // well below the border
            Vec3::new(0.0, height, 0.0),        // a peak
        ];
        let colors = build_island_colors(&terrain, height);
        assert!(colors[0][2] > 0.5, "low vertex should be sandy");
        assert_eq!(colors[1][2], 0.0, "high vertex should be grassy");
    }

    #[test]
    fn test_attribute_lengths_match() {
        let generator = TerrainGenerator::new();
        let options = island_options();
        let size = options.width as f32;
        let mesh = generator.generate_terrain_mesh(&options).unwrap();
        let shaping = IslandShaping::default();

        assert_eq!(build_island_colors(&mesh, options.height).len(), mesh.len());
        assert_eq!(build_sea_colors(&mesh, options.height).len(), mesh.len());
        assert_eq!(build_flat_normals(&mesh).len(), mesh.len());
        assert_eq!(build_island_tex_coords(&mesh, size, &shaping).len(), mesh.len());
    }
}
