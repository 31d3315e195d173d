//! GPU FFT ocean: JONSWAP spectra evolved and inverse-transformed in wgpu compute passes,
//! assembled into per-domain displacement and slope texture arrays.

pub mod generate_plane;
pub mod gpu;
pub mod ocean;

pub use generate_plane::{generate_plane, PlaneVertex, WaterPlane};
pub use gpu::GpuContext;
pub use ocean::{OceanError, OceanSimulationConfig, OceanSurface};
