pub mod config;
pub mod error;
pub mod ocean_parameters;
mod ocean_surface;
mod pipelines;
pub mod readback;
pub mod reference;
pub mod schedule;
pub mod textures;
mod utils;

pub use config::OceanSimulationConfig;
pub use error::{ConfigurationError, OceanError, ResourceError};
pub use ocean_parameters::{
  ComputeSpectrumRecord, FrameParameters, LayerParameters, SpectrumParameters,
};
pub use ocean_surface::*;
pub use schedule::{BufferRole, FftAxis, Schedule};
pub use utils::exact_log2;
