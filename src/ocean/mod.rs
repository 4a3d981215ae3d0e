//! Spectral ocean synthesizer.
//!
//! A frequency-domain wave spectrum is evolved over time and collapsed into
//! spatial displacement and normal fields once per frame:
//!
//! initial spectrum -> phase advance -> snapshot -> inverse FFT -> normals
//!
//! Every stage is a deterministic full-grid pass; the phase double buffer
//! and the FFT scratch pair swap roles by parity, never by locking.

mod fft;
mod mesh;
mod spectrum;
mod system;

pub use fft::StockhamFft;
pub use mesh::{OceanPatch, OceanVertex};
pub use spectrum::{omega, spectrum_snapshot, wave_vector, PhaseField, WaveSpectrum, G, KM};
pub use system::OceanSynthesizer;
