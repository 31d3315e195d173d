mod fft;
mod generate_mipmaps_pipeline;
mod initial_spectrum_pipeline;
mod spectrum_buffers;
mod time_dependent_spectrum_pipeline;
mod waves_data_merge_pipeline;

pub use fft::FFT;
pub use generate_mipmaps_pipeline::GenerateMipmapsPipeline;
pub use initial_spectrum_pipeline::{generate_noise_data, InitialSpectrumPipeline};
pub use spectrum_buffers::SpectrumBuffers;
pub use time_dependent_spectrum_pipeline::TimeDependentSpectrumPipeline;
pub use waves_data_merge_pipeline::WavesDataMergePipeline;
