//! Rigid-model geometry: the ingestion contract plus the procedural
//! stand-in meshes the binary ships with.
//!
//! `ModelMesh` is the boundary with whatever produces geometry: three
//! parallel flat arrays (positions, normals, texture coordinates) grouped
//! per triangle in emission order. Any loader able to fill those arrays can
//! feed the scene; the builders below generate primitive hulls so the
//! binary needs no asset files.

use glam::Vec3;
use std::f32::consts::PI;

/// Parallel per-triangle attribute arrays
#[derive(Debug, Clone, Default)]
pub struct ModelMesh {
    /// 3 components per vertex
    pub positions: Vec<f32>,
    /// 3 components per vertex
    pub normals: Vec<f32>,
    /// 2 components per vertex
    pub tex_coords: Vec<f32>,
}

impl ModelMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        for p in [a, b, c] {
            self.positions.extend_from_slice(&p.to_array());
            self.normals.extend_from_slice(&normal.to_array());
            self.tex_coords
                .extend_from_slice(&[p.x * 0.5 + 0.5, p.z * 0.5 + 0.5]);
        }
    }

    fn push_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        self.push_triangle(a, b, c);
        self.push_triangle(a, c, d);
    }
}

/// Revolve a (radius, z) profile around the Z axis.
fn lathe(profile: &[[f32; 2]], segments: usize) -> ModelMesh {
    let mut mesh = ModelMesh::default();
    for ring in 0..profile.len() - 1 {
        let [r0, z0] = profile[ring];
        let [r1, z1] = profile[ring + 1];
        for segment in 0..segments {
            let t0 = segment as f32 / segments as f32 * 2.0 * PI;
            let t1 = (segment + 1) as f32 / segments as f32 * 2.0 * PI;
            let p00 = Vec3::new(r0 * t0.cos(), r0 * t0.sin(), z0);
            let p01 = Vec3::new(r0 * t1.cos(), r0 * t1.sin(), z0);
            let p10 = Vec3::new(r1 * t0.cos(), r1 * t0.sin(), z1);
            let p11 = Vec3::new(r1 * t1.cos(), r1 * t1.sin(), z1);
            mesh.push_quad(p00, p01, p11, p10);
        }
    }
    mesh
}

/// Axis-aligned box from center and half extents.
fn push_box(mesh: &mut ModelMesh, center: Vec3, half: Vec3) {
    let corner = |sx: f32, sy: f32, sz: f32| {
        center + Vec3::new(half.x * sx, half.y * sy, half.z * sz)
    };
    // +X, -X, +Y, -Y, +Z, -Z
    mesh.push_quad(
        corner(1.0, -1.0, -1.0),
        corner(1.0, 1.0, -1.0),
        corner(1.0, 1.0, 1.0),
        corner(1.0, -1.0, 1.0),
    );
    mesh.push_quad(
        corner(-1.0, -1.0, 1.0),
        corner(-1.0, 1.0, 1.0),
        corner(-1.0, 1.0, -1.0),
        corner(-1.0, -1.0, -1.0),
    );
    mesh.push_quad(
        corner(-1.0, 1.0, -1.0),
        corner(-1.0, 1.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(1.0, 1.0, -1.0),
    );
    mesh.push_quad(
        corner(-1.0, -1.0, 1.0),
        corner(-1.0, -1.0, -1.0),
        corner(1.0, -1.0, -1.0),
        corner(1.0, -1.0, 1.0),
    );
    mesh.push_quad(
        corner(-1.0, -1.0, 1.0),
        corner(1.0, -1.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(-1.0, 1.0, 1.0),
    );
    mesh.push_quad(
        corner(1.0, -1.0, -1.0),
        corner(-1.0, -1.0, -1.0),
        corner(-1.0, 1.0, -1.0),
        corner(1.0, 1.0, -1.0),
    );
}

/// Submarine hull: a tapered body of revolution along Z, bow toward -Z.
pub fn submarine_hull() -> ModelMesh {
    lathe(
        &[
            [0.0, -60.0],
            [2.0, -52.0],
            [4.0, -30.0],
            [4.5, 0.0],
            [4.0, 35.0],
            [2.0, 52.0],
            [0.0, 58.0],
        ],
        24,
    )
}

/// Conning tower and hatch block on top of the hull.
pub fn submarine_hatch() -> ModelMesh {
    let mut mesh = ModelMesh::default();
    push_box(&mut mesh, Vec3::new(0.0, 5.5, -6.0), Vec3::new(1.6, 3.0, 8.0));
    push_box(&mut mesh, Vec3::new(0.0, 9.0, -9.0), Vec3::new(0.4, 1.5, 0.4));
    mesh
}

/// Three-bladed propeller in the XY plane, hub at the origin.
pub fn propeller() -> ModelMesh {
    let mut mesh = ModelMesh::default();
    push_box(&mut mesh, Vec3::ZERO, Vec3::new(0.3, 0.3, 0.5));
    for blade in 0..3 {
        let angle = blade as f32 / 3.0 * 2.0 * PI;
        let dir = Vec3::new(angle.cos(), angle.sin(), 0.0);
        let side = Vec3::new(-angle.sin(), angle.cos(), 0.0) * 0.35;
        let tip = dir * 1.8;
        let root = dir * 0.3;
        mesh.push_quad(root - side, tip - side, tip + side, root + side);
    }
    mesh
}

/// Float plane: fuselage, wing, tail, and two pontoons.
pub fn seaplane() -> ModelMesh {
    let mut mesh = ModelMesh::default();
    push_box(&mut mesh, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.8, 0.8, 5.0));
    push_box(&mut mesh, Vec3::new(0.0, 1.6, -1.0), Vec3::new(6.0, 0.15, 1.4));
    push_box(&mut mesh, Vec3::new(0.0, 2.2, 4.4), Vec3::new(2.2, 0.12, 0.7));
    push_box(&mut mesh, Vec3::new(-2.2, -0.6, 0.0), Vec3::new(0.35, 0.35, 3.0));
    push_box(&mut mesh, Vec3::new(2.2, -0.6, 0.0), Vec3::new(0.35, 0.35, 3.0));
    mesh
}

/// Patrol boat: hull block with a bridge superstructure.
pub fn patrol_boat() -> ModelMesh {
    let mut mesh = ModelMesh::default();
    push_box(&mut mesh, Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.5, 1.0, 9.0));
    push_box(&mut mesh, Vec3::new(0.0, 3.0, -1.5), Vec3::new(1.8, 1.0, 3.0));
    push_box(&mut mesh, Vec3::new(0.0, 4.6, -2.0), Vec3::new(0.25, 0.6, 0.25));
    mesh
}

/// Torpedo: slim body of revolution along Z.
pub fn torpedo() -> ModelMesh {
    lathe(
        &[[0.0, -1.6], [0.22, -1.1], [0.22, 1.1], [0.0, 1.6]],
        12,
    )
}

/// Explosion ball: a unit UV sphere, scaled at draw time.
pub fn explosion_ball() -> ModelMesh {
    let mut mesh = ModelMesh::default();
    let (rings, segments) = (8, 12);
    for ring in 0..rings {
        let phi0 = ring as f32 / rings as f32 * PI;
        let phi1 = (ring + 1) as f32 / rings as f32 * PI;
        for segment in 0..segments {
            let t0 = segment as f32 / segments as f32 * 2.0 * PI;
            let t1 = (segment + 1) as f32 / segments as f32 * 2.0 * PI;
            let point = |phi: f32, theta: f32| {
                Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin())
            };
            mesh.push_quad(
                point(phi0, t0),
                point(phi0, t1),
                point(phi1, t1),
                point(phi1, t0),
            );
        }
    }
    mesh
}

/// The full set of rigid meshes the scene draws.
pub struct SceneMeshes {
    pub hull: ModelMesh,
    pub hatch: ModelMesh,
    pub prop: ModelMesh,
    pub plane: ModelMesh,
    pub boat: ModelMesh,
    pub torpedo: ModelMesh,
    pub explosion: ModelMesh,
}

impl SceneMeshes {
    pub fn procedural() -> Self {
        Self {
            hull: submarine_hull(),
            hatch: submarine_hatch(),
            prop: propeller(),
            plane: seaplane(),
            boat: patrol_boat(),
            torpedo: torpedo(),
            explosion: explosion_ball(),
        }
    }
}

/// Gray ramp, one shade per triangle.
pub fn build_color_attributes(vertex_count: usize) -> Vec<[f32; 3]> {
    let mut colors = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count / 3 {
        let shade = i as f32 * 3.0 / vertex_count as f32;
        for _ in 0..3 {
            colors.push([shade, shade, shade]);
        }
    }
    colors
}

/// Hull ramp with anti-fouling red below the waterline.
pub fn build_hull_colors(positions: &[f32]) -> Vec<[f32; 3]> {
    let vertex_count = positions.len() / 3;
    let mut colors = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count / 3 {
        for vert in 0..3 {
            let mut shade = i as f32 * 3.0 / vertex_count as f32;
            if shade > 0.75 {
                shade = shade * 4.0 - 3.0;
            }
            if positions[(i * 3 + vert) * 3 + 1] < -0.5 {
                colors.push([shade, 0.0, 0.0]);
            } else {
                colors.push([shade, shade, shade]);
            }
        }
    }
    colors
}

/// Brass ramp for propellers.
pub fn build_prop_colors(vertex_count: usize) -> Vec<[f32; 3]> {
    let mut colors = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count / 3 {
        let shade = i as f32 * 1.5 / vertex_count as f32 + 0.5;
        for _ in 0..3 {
            colors.push([shade, shade, 0.0]);
        }
    }
    colors
}

/// Green-tinted ramp for the seaplane.
pub fn build_plane_colors(vertex_count: usize) -> Vec<[f32; 3]> {
    let mut colors = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count / 3 {
        let shade = i as f32 * 1.5 / vertex_count as f32;
        for _ in 0..3 {
            colors.push([shade, 0.5, shade]);
        }
    }
    colors
}

/// Flat white for the explosion ball.
pub fn build_expl_colors(vertex_count: usize) -> Vec<[f32; 3]> {
    vec![[1.0, 1.0, 1.0]; vertex_count]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshes_are_triangle_lists() {
        let meshes = SceneMeshes::procedural();
        for mesh in [
            &meshes.hull,
            &meshes.hatch,
            &meshes.prop,
            &meshes.plane,
            &meshes.boat,
            &meshes.torpedo,
            &meshes.explosion,
        ] {
            assert!(mesh.vertex_count() > 0);
            assert_eq!(mesh.vertex_count() % 3, 0);
            assert_eq!(mesh.normals.len(), mesh.positions.len());
            assert_eq!(mesh.tex_coords.len() / 2, mesh.vertex_count());
        }
    }

    #[test]
    fn test_hull_spans_both_waterline_sides() {
        let hull = submarine_hull();
        let ys: Vec<f32> = hull.positions.chunks_exact(3).map(|p| p[1]).collect();
        assert!(ys.iter().any(|&y| y < -0.5));
        assert!(ys.iter().any(|&y| y > 0.5));
    }

    #[test]
    fn test_hull_colors_red_below_waterline() {
        let hull = submarine_hull();
        let colors = build_hull_colors(&hull.positions);
        assert_eq!(colors.len(), hull.vertex_count());

        let mut saw_red = false;
        for (i, color) in colors.iter().enumerate() {
            if hull.positions[i * 3 + 1] < -0.5 {
                assert_eq!(color[1], 0.0);
                assert_eq!(color[2], 0.0);
                saw_red = true;
            }
        }
        assert!(saw_red);
    }

    #[test]
    fn test_color_builders_cover_every_vertex() {
        let plane = seaplane();
        let count = plane.vertex_count();
        assert_eq!(build_color_attributes(count).len(), count);
        assert_eq!(build_plane_colors(count).len(), count);
        assert_eq!(build_prop_colors(count).len(), count);
        assert_eq!(build_expl_colors(count).len(), count);
    }

    #[test]
    fn test_explosion_ball_is_unit_sphere() {
        let ball = explosion_ball();
        for p in ball.positions.chunks_exact(3) {
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }
}
