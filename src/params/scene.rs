//! Scenario configuration: entity speeds, the torpedo hit gate, and the
//! explosion ramp.

/// Per-tick scenario constants
///
/// Rates are per millisecond of wall-clock delta unless noted.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Distance from the scene origin to the island center (world units)
    pub island_dist: f32,

    /// Propeller spin rate (degrees per millisecond)
    pub prop_rotation_speed_deg: f32,

    /// Target boat orbit rate as a fraction of the propeller rate
    pub boat_orbit_ratio: f32,

    /// Seaplane forward speed (units per millisecond)
    pub plane_speed: f32,

    /// Seaplane climb slope (radians fed through tan)
    pub plane_climb_angle: f32,

    /// Torpedo forward speed (units per millisecond)
    pub torp_speed: f32,

    /// Torpedo travel distance at launch (world units)
    pub torp_initial_dist: f32,

    /// Half-width of the torpedo distance window (world units)
    pub hit_dist_epsilon: f32,

    /// Lower bound of the boat-heading window (degrees, exclusive)
    pub hit_angle_lo: f32,

    /// Upper bound of the boat-heading window (degrees, exclusive)
    pub hit_angle_hi: f32,

    /// Explosion growth rate (scale units per millisecond)
    pub expl_rate: f32,

    /// Explosion scale cap; past it the explosion collapses to zero scale
    pub expl_cap: f32,

    /// Peak explosion brightness added to lighting and sky
    pub expl_brightness: f32,

    /// Brightness lost per unit of explosion scale
    pub expl_brightness_falloff: f32,

    /// Explosion scale past which the target boat stops being drawn
    pub boat_hide_scale: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            island_dist: 500.0,
            prop_rotation_speed_deg: 1.0,
            boat_orbit_ratio: 1.0 / 50.0,
            plane_speed: 0.15,
            plane_climb_angle: 0.2,
            torp_speed: 0.05,
            torp_initial_dist: 50.0,
            hit_dist_epsilon: 1.0,
            hit_angle_lo: 160.0,
            hit_angle_hi: 200.0,
            expl_rate: 0.5,
            expl_cap: 150.0,
            expl_brightness: 15.0,
            expl_brightness_falloff: 0.1,
            boat_hide_scale: 50.0,
        }
    }
}

impl ScenarioConfig {
    /// Center of the torpedo distance window for a given island radius.
    pub fn hit_target_dist(&self, island_radius: f32) -> f32 {
        self.island_dist - island_radius
    }
}
