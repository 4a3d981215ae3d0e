//! Camera movement configuration.

/// Camera speeds and limits for both orbit and detached modes
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Detached-mode translation per tick (world units)
    pub fly_speed: f32,

    /// Detached-mode rotation per tick (degrees)
    pub fly_rot_speed_deg: f32,

    /// Orbit distance change (units per millisecond)
    pub distance_speed: f32,

    /// Orbit angle change (degrees per millisecond)
    pub angle_speed_deg: f32,

    /// Orbit height-ratio change (per millisecond)
    pub height_speed: f32,

    /// Closest allowed orbit distance (world units)
    pub min_distance: f32,

    /// Lowest allowed orbit height ratio
    pub min_height: f32,

    /// Starting orbit distance (world units)
    pub initial_distance: f32,

    /// Starting orbit angle (degrees)
    pub initial_angle_deg: f32,

    /// Starting orbit height ratio
    pub initial_height: f32,

    /// Pose the detached camera resets to on every mode toggle
    pub detached_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fly_speed: 1.0,
            fly_rot_speed_deg: 0.5,
            distance_speed: 0.1,
            angle_speed_deg: 0.1,
            height_speed: 0.0025,
            min_distance: 10.0,
            min_height: 0.1,
            initial_distance: 100.0,
            initial_angle_deg: 90.0,
            initial_height: 0.25,
            detached_position: [0.0, 30.0, 100.0],
        }
    }
}
