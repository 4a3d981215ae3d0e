//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, milliseconds, degrees, etc.)
//! - Documented ranges and meanings
//! - Validation where the simulation would otherwise degenerate

mod camera;
mod ocean;
mod render;
mod scene;
mod terrain;

// Re-export all types
pub use camera::CameraConfig;
pub use ocean::{OceanGeometry, OceanSpectrumParams};
pub use render::{Atmosphere, RecordingConfig, RenderConfig};
pub use scene::ScenarioConfig;
pub use terrain::{IslandShaping, NoiseKind, TerrainOptions};
