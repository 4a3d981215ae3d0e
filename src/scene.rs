//! Scene simulation state: held input, entity transforms, the torpedo hit
//! gate, and the explosion ramp.
//!
//! Everything mutable lives in `SimulationState` and is advanced by
//! `tick`; there is no module-level state.

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::params::{CameraConfig, ScenarioConfig};

/// World-space scale applied to the island mesh by its model transform.
const ISLAND_MODEL_SCALE: f32 = 5.0;

/// Held-key state; opposing pairs collapse to signed axes in {-1, 0, 1}.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub roll_left: bool,
    pub roll_right: bool,
}

impl InputState {
    fn axis(positive: bool, negative: bool) -> f32 {
        (positive as i8 - negative as i8) as f32
    }

    pub fn thrust_axis(&self) -> f32 {
        Self::axis(self.forward, self.backward)
    }

    pub fn turn_axis(&self) -> f32 {
        Self::axis(self.left, self.right)
    }

    pub fn lift_axis(&self) -> f32 {
        Self::axis(self.up, self.down)
    }

    pub fn roll_axis(&self) -> f32 {
        Self::axis(self.roll_left, self.roll_right)
    }
}

/// One-way explosion lifecycle; there is no reverse transition short of a
/// full scenario reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionPhase {
    Idle,
    Growing,
    Capped,
}

/// All per-session mutable scene state.
pub struct SimulationState {
    pub input: InputState,
    pub camera: Camera,

    pub submarine: Mat4,
    pub left_prop: Mat4,
    pub right_prop: Mat4,
    pub plane: Mat4,
    /// Patrol boat circling the island; the torpedo's target
    pub boat: Mat4,
    pub torpedo: Mat4,
    pub explosion: Mat4,
    pub island: Mat4,
    pub sea_bed: Mat4,

    pub plane_launched: bool,
    pub torpedo_fired: bool,
    pub torpedo_dist: f32,
    /// Boat heading around the island (degrees, wraps at 360)
    pub boat_angle: f32,
    pub hit: bool,
    pub expl_scale: f32,
    pub expl_intensity: f32,
    pub sky_color: [f32; 3],

    island_radius: f32,
    base_sky_color: [f32; 3],
    scenario: ScenarioConfig,
}

impl SimulationState {
    pub fn new(
        scenario: ScenarioConfig,
        camera_config: CameraConfig,
        island_size: usize,
        sky_color: [f32; 3],
    ) -> Self {
        let mut state = Self {
            input: InputState::default(),
            camera: Camera::new(camera_config),
            submarine: Mat4::IDENTITY,
            left_prop: Mat4::IDENTITY,
            right_prop: Mat4::IDENTITY,
            plane: Mat4::IDENTITY,
            boat: Mat4::IDENTITY,
            torpedo: Mat4::IDENTITY,
            explosion: Mat4::IDENTITY,
            island: Mat4::IDENTITY,
            sea_bed: Mat4::IDENTITY,
            plane_launched: true,
            torpedo_fired: false,
            torpedo_dist: scenario.torp_initial_dist,
            boat_angle: 0.0,
            hit: false,
            expl_scale: 0.0,
            expl_intensity: 0.0,
            sky_color,
            island_radius: island_radius(island_size),
            base_sky_color: sky_color,
            scenario,
        };
        state.reset_transforms();
        state
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn island_radius(&self) -> f32 {
        self.island_radius
    }

    /// Advance every entity by one tick of `dt_ms` milliseconds.
    pub fn tick(&mut self, dt_ms: f32) {
        self.camera.update(&self.input, dt_ms);

        let angle = self.scenario.prop_rotation_speed_deg * dt_ms;
        let prop_spin = Mat4::from_rotation_z(angle.to_radians());
        self.left_prop *= prop_spin;
        self.right_prop *= prop_spin;

        // the boat orbits the island in the world frame
        let orbit_step = angle * self.scenario.boat_orbit_ratio;
        self.boat_angle += orbit_step;
        if self.boat_angle > 360.0 {
            self.boat_angle -= 360.0;
        }
        self.boat = Mat4::from_rotation_y(orbit_step.to_radians()) * self.boat;

        if self.plane_launched {
            let speed = self.scenario.plane_speed * dt_ms;
            let climb = speed * self.scenario.plane_climb_angle.tan();
            self.plane *= Mat4::from_translation(Vec3::new(0.0, climb, -speed));
        }

        if self.torpedo_fired {
            let speed = self.scenario.torp_speed * dt_ms;
            self.torpedo_dist += speed;
            if self.in_hit_distance_window() && self.in_hit_angle_window() {
                self.hit = true;
            }
            // fresh delta composed onto the previous transform every tick:
            // translation in the world frame, roll in the torpedo's own
            self.torpedo = Mat4::from_translation(Vec3::new(0.0, 0.0, -speed))
                * self.torpedo
                * Mat4::from_rotation_z((angle / 2.0).to_radians());
        }

        if self.hit && self.expl_scale < self.scenario.expl_cap {
            self.expl_scale += self.scenario.expl_rate * dt_ms;
            let brightness = self.scenario.expl_brightness
                - self.expl_scale * self.scenario.expl_brightness_falloff;
            self.expl_intensity = brightness;
            self.sky_color = [
                self.base_sky_color[0] + brightness,
                self.base_sky_color[1] + brightness,
                self.base_sky_color[2] + brightness,
            ];
        } else if self.expl_scale >= self.scenario.expl_cap {
            self.explosion = Mat4::from_scale(Vec3::ZERO);
            self.expl_intensity = 0.0;
            self.sky_color = self.base_sky_color;
        }
    }

    fn in_hit_distance_window(&self) -> bool {
        let target = self.scenario.hit_target_dist(self.island_radius);
        self.torpedo_dist > target - self.scenario.hit_dist_epsilon
            && self.torpedo_dist < target + self.scenario.hit_dist_epsilon
    }

    fn in_hit_angle_window(&self) -> bool {
        self.boat_angle > self.scenario.hit_angle_lo
            && self.boat_angle < self.scenario.hit_angle_hi
    }

    pub fn explosion_phase(&self) -> ExplosionPhase {
        if !self.hit {
            ExplosionPhase::Idle
        } else if self.expl_scale < self.scenario.expl_cap {
            ExplosionPhase::Growing
        } else {
            ExplosionPhase::Capped
        }
    }

    /// World transform of the explosion including the current growth scale.
    pub fn explosion_transform(&self) -> Mat4 {
        self.explosion * Mat4::from_scale(Vec3::splat(self.expl_scale))
    }

    pub fn fire_torpedo(&mut self) {
        self.torpedo_fired = true;
    }

    pub fn boat_visible(&self) -> bool {
        self.plane_launched && self.expl_scale < self.scenario.boat_hide_scale
    }

    pub fn torpedo_visible(&self) -> bool {
        self.torpedo_fired && !self.hit
    }

    pub fn explosion_visible(&self) -> bool {
        self.hit
    }

    /// Restart the scenario without touching the camera.
    pub fn reset(&mut self) {
        self.torpedo_fired = false;
        self.hit = false;
        self.boat_angle = 0.0;
        self.torpedo_dist = self.scenario.torp_initial_dist;
        self.expl_scale = 0.0;
        self.expl_intensity = 0.0;
        self.sky_color = self.base_sky_color;
        self.reset_transforms();
    }

    /// A new island size moves every island-relative transform, so the
    /// scenario restarts as well.
    pub fn set_island_size(&mut self, island_size: usize) {
        self.island_radius = island_radius(island_size);
        self.reset();
    }

    fn reset_transforms(&mut self) {
        let radius = self.island_radius;
        let dist = self.scenario.island_dist;

        self.submarine = Mat4::IDENTITY;
        self.left_prop = Mat4::from_translation(Vec3::new(-2.2903, -4.7443, 54.25));
        self.right_prop = Mat4::from_translation(Vec3::new(2.2902, -4.7443, 54.25));
        self.plane = Mat4::IDENTITY;
        self.boat = Mat4::from_translation(Vec3::new(0.0, 0.0, -radius))
            * Mat4::from_rotation_y(90.0f32.to_radians())
            * Mat4::from_scale(Vec3::splat(2.0));
        self.torpedo =
            Mat4::from_translation(Vec3::new(0.0, -0.5, -self.scenario.torp_initial_dist))
                * Mat4::from_scale(Vec3::splat(5.0));
        self.explosion = Mat4::from_translation(Vec3::new(0.0, 0.0, radius - dist));
        self.island = Mat4::from_translation(Vec3::new(-radius, 25.0, -radius))
            * Mat4::from_scale(Vec3::splat(ISLAND_MODEL_SCALE));
        self.sea_bed = Mat4::from_translation(Vec3::new(-1000.0, -40.0, -1000.0))
            * Mat4::from_scale(Vec3::splat(10.0));
    }
}

/// World-space island radius for a given grid size.
fn island_radius(island_size: usize) -> f32 {
    island_size as f32 * ISLAND_MODEL_SCALE / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Atmosphere;

    fn state() -> SimulationState {
        SimulationState::new(
            ScenarioConfig::default(),
            CameraConfig::default(),
            50,
            Atmosphere::default().sky_color,
        )
    }

    #[test]
    fn test_input_axes() {
        let mut input = InputState::default();
        assert_eq!(input.thrust_axis(), 0.0);
        input.forward = true;
        assert_eq!(input.thrust_axis(), 1.0);
        input.backward = true;
        assert_eq!(input.thrust_axis(), 0.0);
        input.forward = false;
        assert_eq!(input.thrust_axis(), -1.0);
    }

    #[test]
    fn test_torpedo_hits_at_window_midpoints() {
        let mut sim = state();
        sim.fire_torpedo();

        // place both gates at their exact midpoints
        let target = sim.scenario.hit_target_dist(sim.island_radius());
        sim.torpedo_dist = target;
        sim.boat_angle = (sim.scenario.hit_angle_lo + sim.scenario.hit_angle_hi) / 2.0;

        sim.tick(1e-3); // negligible travel, both windows still hold
        assert!(sim.hit);
        assert_eq!(sim.explosion_phase(), ExplosionPhase::Growing);
    }

    #[test]
    fn test_torpedo_needs_both_windows() {
        // distance window satisfied, angle violated
        let mut sim = state();
        sim.fire_torpedo();
        sim.torpedo_dist = sim.scenario.hit_target_dist(sim.island_radius());
        sim.boat_angle = sim.scenario.hit_angle_lo - 30.0;
        sim.tick(1e-3);
        assert!(!sim.hit);

        // angle window satisfied, distance violated
        let mut sim = state();
        sim.fire_torpedo();
        sim.torpedo_dist = 0.0;
        sim.boat_angle = 180.0;
        sim.tick(1e-3);
        assert!(!sim.hit);
    }

    #[test]
    fn test_torpedo_does_not_move_before_firing() {
        let mut sim = state();
        let before = sim.torpedo;
        sim.tick(16.0);
        assert_eq!(sim.torpedo, before);
        assert_eq!(sim.torpedo_dist, sim.scenario.torp_initial_dist);
    }

    #[test]
    fn test_explosion_ramp_reaches_cap_and_collapses() {
        let mut sim = state();
        sim.hit = true;

        let rate = sim.scenario.expl_rate;
        let cap = sim.scenario.expl_cap;
        let ticks = (cap / rate).ceil() as usize;

        for _ in 0..ticks {
            sim.tick(1.0);
        }
        assert!(sim.expl_scale >= cap);
        assert_eq!(sim.explosion_phase(), ExplosionPhase::Capped);

        // one more tick collapses the transform to zero scale
        sim.tick(1.0);
        let collapsed = sim.explosion_transform();
        assert_eq!(collapsed.transform_point3(Vec3::new(1.0, 2.0, 3.0)), Vec3::ZERO);
        assert_eq!(sim.expl_intensity, 0.0);
        assert_eq!(sim.sky_color, Atmosphere::default().sky_color);
    }

    #[test]
    fn test_explosion_brightens_sky_while_growing() {
        let mut sim = state();
        sim.hit = true;
        sim.tick(1.0);
        assert_eq!(sim.explosion_phase(), ExplosionPhase::Growing);
        assert!(sim.sky_color[0] > Atmosphere::default().sky_color[0]);
        assert!(sim.expl_intensity > 0.0);
    }

    #[test]
    fn test_boat_angle_wraps() {
        let mut sim = state();
        sim.boat_angle = 359.9;
        sim.tick(20.0);
        assert!(sim.boat_angle < 360.0);
        assert!(sim.boat_angle >= 0.0);
    }

    #[test]
    fn test_visibility_rules() {
        let mut sim = state();
        assert!(sim.boat_visible());
        assert!(!sim.torpedo_visible());
        assert!(!sim.explosion_visible());

        sim.fire_torpedo();
        assert!(sim.torpedo_visible());

        sim.hit = true;
        assert!(!sim.torpedo_visible());
        assert!(sim.explosion_visible());

        sim.expl_scale = sim.scenario.boat_hide_scale + 1.0;
        assert!(!sim.boat_visible());
    }

    #[test]
    fn test_reset_restores_scenario() {
        let mut sim = state();
        sim.fire_torpedo();
        for _ in 0..100 {
            sim.tick(16.0);
        }
        sim.reset();

        assert!(!sim.torpedo_fired);
        assert!(!sim.hit);
        assert_eq!(sim.boat_angle, 0.0);
        assert_eq!(sim.torpedo_dist, sim.scenario.torp_initial_dist);
        assert_eq!(sim.explosion_phase(), ExplosionPhase::Idle);
    }

    #[test]
    fn test_props_spin_in_place() {
        let mut sim = state();
        let origin_before = sim.left_prop.transform_point3(Vec3::ZERO);
        sim.tick(16.0);
        let origin_after = sim.left_prop.transform_point3(Vec3::ZERO);
        // rotation about the local Z axis keeps the hub fixed
        assert!((origin_before - origin_after).length() < 1e-4);
        assert_ne!(sim.left_prop, Mat4::from_translation(origin_before));
    }
}
