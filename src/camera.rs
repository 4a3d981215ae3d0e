//! Orbit and free-fly camera.

use glam::{Mat4, Quat, Vec3};

use crate::params::CameraConfig;
use crate::scene::InputState;

/// Camera with two modes: an orbit around the scene origin driven by
/// distance/angle/height scalars, and a detached free-fly pose integrated
/// from body-frame input.
pub struct Camera {
    config: CameraConfig,

    /// Free-fly mode when true, orbit mode otherwise
    pub detached: bool,

    // orbit scalars (persist while detached)
    pub distance: f32,
    pub angle_deg: f32,
    pub height: f32,

    // detached pose
    pub position: Vec3,
    rotation: Quat,
    axis_x: Vec3,
    axis_y: Vec3,
    axis_z: Vec3,

    world_position: Vec3,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            detached: false,
            distance: config.initial_distance,
            angle_deg: config.initial_angle_deg,
            height: config.initial_height,
            position: Vec3::from_array(config.detached_position),
            rotation: Quat::IDENTITY,
            axis_x: Vec3::X,
            axis_y: Vec3::Y,
            axis_z: Vec3::Z,
            world_position: Vec3::ZERO,
            config,
        };
        camera.world_position = camera.orbit_position();
        camera
    }

    /// Switch between orbit and free-fly. Entering free-fly always starts
    /// from the fixed default pose; orbit scalars are left untouched, so a
    /// round-trip toggle restores the orbit view exactly.
    pub fn toggle_detached(&mut self) {
        self.detached = !self.detached;
        if self.detached {
            self.position = Vec3::from_array(self.config.detached_position);
            self.rotation = Quat::IDENTITY;
            self.axis_x = Vec3::X;
            self.axis_y = Vec3::Y;
            self.axis_z = Vec3::Z;
        }
    }

    /// Apply held input. Orbit rates scale with the frame delta; free-fly
    /// steps per tick in the camera's own frame.
    pub fn update(&mut self, input: &InputState, dt_ms: f32) {
        let thrust = input.thrust_axis();
        let turn = input.turn_axis();
        let lift = input.lift_axis();
        let roll = input.roll_axis();

        if self.detached {
            self.position -= self.axis_z * self.config.fly_speed * thrust;

            let step = -self.config.fly_rot_speed_deg.to_radians();
            let delta = Quat::from_axis_angle(self.axis_y, step * turn)
                * Quat::from_axis_angle(self.axis_x, step * lift)
                * Quat::from_axis_angle(self.axis_z, step * roll);
            self.rotation *= delta;

            // body axes counter-rotate so input stays camera-relative
            let inverse = delta.inverse();
            self.axis_x = inverse * self.axis_x;
            self.axis_y = inverse * self.axis_y;
            self.axis_z = inverse * self.axis_z;
        } else {
            self.distance = (self.distance - self.config.distance_speed * dt_ms * thrust)
                .max(self.config.min_distance);
            self.angle_deg += self.config.angle_speed_deg * dt_ms * turn;
            self.height = (self.height + self.config.height_speed * dt_ms * lift)
                .max(self.config.min_height);
        }
    }

    fn orbit_position(&self) -> Vec3 {
        let angle = self.angle_deg.to_radians();
        Vec3::new(angle.cos(), self.height, angle.sin()).normalize() * self.distance
    }

    /// View matrix for the current mode; refreshes the cached eye position.
    pub fn view_matrix(&mut self) -> Mat4 {
        if self.detached {
            self.world_position = self.position;
            Mat4::from_quat(self.rotation) * Mat4::from_translation(-self.position)
        } else {
            self.world_position = self.orbit_position();
            Mat4::look_at_rh(self.world_position, Vec3::ZERO, Vec3::Y)
        }
    }

    /// Eye position in world space, as of the last `view_matrix` call.
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(forward: bool, left: bool, up: bool) -> InputState {
        InputState {
            forward,
            left,
            up,
            ..InputState::default()
        }
    }

    #[test]
    fn test_orbit_position_on_sphere() {
        let mut camera = Camera::new(CameraConfig::default());
        let view = camera.view_matrix();
        assert_ne!(view, Mat4::IDENTITY);
        let eye = camera.world_position();
        assert!((eye.length() - camera.distance).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_distance_clamped() {
        let config = CameraConfig::default();
        let min = config.min_distance;
        let mut camera = Camera::new(config);
        for _ in 0..10_000 {
            camera.update(&pressed(true, false, false), 16.0);
        }
        assert_eq!(camera.distance, min);
    }

    #[test]
    fn test_toggle_round_trip_preserves_orbit_scalars() {
        let mut camera = Camera::new(CameraConfig::default());
        camera.update(&pressed(false, true, true), 16.0);
        let (distance, angle, height) = (camera.distance, camera.angle_deg, camera.height);

        camera.toggle_detached();
        assert!(camera.detached);
        camera.toggle_detached();
        assert!(!camera.detached);

        assert_eq!(camera.distance, distance);
        assert_eq!(camera.angle_deg, angle);
        assert_eq!(camera.height, height);
    }

    #[test]
    fn test_detached_pose_resets_on_entry() {
        let config = CameraConfig::default();
        let home = Vec3::from_array(config.detached_position);
        let mut camera = Camera::new(config);

        camera.toggle_detached();
        camera.update(&pressed(true, true, false), 16.0);
        assert_ne!(camera.position, home);

        camera.toggle_detached();
        camera.toggle_detached();
        assert_eq!(camera.position, home);
    }

    #[test]
    fn test_detached_forward_moves_along_minus_z() {
        let mut camera = Camera::new(CameraConfig::default());
        camera.toggle_detached();
        let start = camera.position;
        camera.update(&pressed(true, false, false), 16.0);
        assert!(camera.position.z < start.z);
        assert_eq!(camera.position.x, start.x);
    }

    #[test]
    fn test_detached_axes_stay_orthonormal() {
        let mut camera = Camera::new(CameraConfig::default());
        camera.toggle_detached();
        let input = InputState {
            left: true,
            up: true,
            roll_right: true,
            ..InputState::default()
        };
        for _ in 0..500 {
            camera.update(&input, 16.0);
        }
        assert!((camera.axis_x.length() - 1.0).abs() < 1e-3);
        assert!(camera.axis_x.dot(camera.axis_y).abs() < 1e-3);
        assert!(camera.axis_y.dot(camera.axis_z).abs() < 1e-3);
    }
}
