//! Rendering configuration.

/// Window and projection configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters), generous enough for the island horizon
    pub far_plane_m: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 800,
            fov_degrees: 90.0,
            near_plane_m: 0.1,
            far_plane_m: 10000.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Lighting and water shading uniforms shared by the ocean and sky passes
#[derive(Debug, Clone)]
pub struct Atmosphere {
    /// Sun direction (world space, toward the sun, not normalized)
    pub sun_direction: [f32; 3],

    /// Deep-water absorption color (linear)
    pub ocean_color: [f32; 3],

    /// HDR sky radiance before exposure
    pub sky_color: [f32; 3],

    /// Exposure applied by the HDR tonemap `1 - exp(-color * exposure)`
    pub exposure: f32,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            sun_direction: [-1.0, 1.0, -2.0],
            ocean_color: [0.004, 0.016, 0.047],
            sky_color: [6.4, 9.6, 11.2],
            exposure: 0.35,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }
}
