//! Command-line argument parsing.

use clap::Parser;
use glam::Vec2;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::params::{NoiseKind, OceanSpectrumParams, RecordingConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Seastrike")]
#[command(about = "Interactive submarine scene with an FFT-synthesized ocean", long_about = None)]
pub struct Args {
    /// Record frames to PNG (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Island size (grid cells per side)
    #[arg(long, value_name = "CELLS", default_value = "50")]
    pub island_size: usize,

    /// Island noise kind: wave, perlin, simplex
    #[arg(long, value_name = "KIND", default_value = "perlin")]
    pub noise: String,

    /// Terrain seed (defaults to the system clock)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u32>,

    /// Wind vector over the ocean patch, comma separated (m/s)
    #[arg(long, value_name = "X,Y", default_value = "5,5")]
    pub wind: String,

    /// Simulated ocean patch size (meters)
    #[arg(long, value_name = "METERS", default_value = "1000")]
    pub size: f32,

    /// Spectrum resolution (power of two)
    #[arg(long, value_name = "SAMPLES", default_value = "256")]
    pub resolution: usize,

    /// Choppiness (horizontal displacement scale)
    #[arg(long, value_name = "FACTOR", default_value = "3")]
    pub choppiness: f32,
}

impl Args {
    /// Parse the noise kind, falling back to perlin on unknown input.
    pub fn parse_noise_kind(&self) -> NoiseKind {
        match self.noise.to_lowercase().as_str() {
            "wave" => NoiseKind::Wave,
            "simplex" => NoiseKind::Simplex,
            "perlin" => NoiseKind::Perlin,
            other => {
                eprintln!("Warning: Unknown noise kind '{}', using perlin", other);
                NoiseKind::Perlin
            }
        }
    }

    /// Parse the wind argument into a vector.
    pub fn parse_wind(&self) -> Result<Vec2, String> {
        let parts: Vec<&str> = self.wind.split(',').collect();
        if parts.len() != 2 {
            return Err(format!("wind must be 'X,Y', got '{}'", self.wind));
        }
        let x: f32 = parts[0]
            .trim()
            .parse()
            .map_err(|_| format!("bad wind component '{}'", parts[0]))?;
        let y: f32 = parts[1]
            .trim()
            .parse()
            .map_err(|_| format!("bad wind component '{}'", parts[1]))?;
        Ok(Vec2::new(x, y))
    }

    /// Assemble and validate the spectrum parameters.
    pub fn spectrum_params(&self) -> Result<OceanSpectrumParams, String> {
        let params = OceanSpectrumParams {
            wind: self.parse_wind()?,
            size: self.size,
            resolution: self.resolution,
            choppiness: self.choppiness,
            ..OceanSpectrumParams::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Terrain seed: explicit, or from the wall clock like the size slider
    /// semantics expect (each regeneration still reseeds).
    pub fn terrain_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.subsec_millis())
                .unwrap_or(0)
        })
    }

    /// Create recording configuration if recording mode is enabled.
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let config = RecordingConfig::new(duration);

            std::fs::create_dir_all(config.frames_dir())
                .expect("Failed to create frames directory");

            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["seastrike"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_validate() {
        let args = args(&[]);
        let params = args.spectrum_params().unwrap();
        assert_eq!(params.resolution, 256);
        assert_eq!(params.wind, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_wind_parsing() {
        let args_ok = args(&["--wind", "10, -3.5"]);
        assert_eq!(args_ok.parse_wind().unwrap(), Vec2::new(10.0, -3.5));

        let args_bad = args(&["--wind", "10"]);
        assert!(args_bad.parse_wind().is_err());
    }

    #[test]
    fn test_bad_resolution_rejected() {
        let args = args(&["--resolution", "100"]);
        assert!(args.spectrum_params().is_err());
    }

    #[test]
    fn test_noise_kind_fallback() {
        assert_eq!(args(&["--noise", "simplex"]).parse_noise_kind(), NoiseKind::Simplex);
        assert_eq!(args(&["--noise", "granite"]).parse_noise_kind(), NoiseKind::Perlin);
    }
}
