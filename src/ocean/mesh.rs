//! Ocean patch geometry: a flat XZ grid displaced in the vertex stage.

use bytemuck::{Pod, Zeroable};

use crate::params::OceanGeometry;

/// Vertex data for the ocean mesh (position + displacement-map UV)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OceanVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Static ocean patch grid; all motion comes from the displacement map.
pub struct OceanPatch {
    pub vertices: Vec<OceanVertex>,
    pub indices: Vec<u32>,
}

impl OceanPatch {
    pub fn new(geometry: &OceanGeometry) -> Self {
        let r = geometry.resolution;
        let span = (r - 1) as f32;
        let mut vertices = Vec::with_capacity(r * r);

        for z in 0..r {
            for x in 0..r {
                vertices.push(OceanVertex {
                    position: [
                        x as f32 / span * geometry.size + geometry.origin[0],
                        0.0,
                        z as f32 / span * geometry.size + geometry.origin[1],
                    ],
                    uv: [x as f32 / span, z as f32 / span],
                });
            }
        }

        let mut indices = Vec::with_capacity((r - 1) * (r - 1) * 6);
        for z in 0..r - 1 {
            for x in 0..r - 1 {
                let top_left = (z * r + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = top_left + r as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    bottom_right,
                    bottom_right,
                    top_right,
                    top_left,
                ]);
            }
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_dimensions() {
        let geometry = OceanGeometry {
            resolution: 64,
            size: 2000.0,
            origin: [-1000.0, -1000.0],
        };
        let patch = OceanPatch::new(&geometry);

        assert_eq!(patch.vertices.len(), 64 * 64);
        assert_eq!(patch.indices.len(), 63 * 63 * 6);

        // corners span origin..origin+size
        let first = patch.vertices.first().unwrap().position;
        let last = patch.vertices.last().unwrap().position;
        assert_eq!(first[0], -1000.0);
        assert_eq!(last[0], 1000.0);
        assert_eq!(last[2], 1000.0);
    }

    #[test]
    fn test_patch_uv_covers_unit_square() {
        let patch = OceanPatch::new(&OceanGeometry::default());
        let last = patch.vertices.last().unwrap();
        assert_eq!(last.uv, [1.0, 1.0]);
    }
}
