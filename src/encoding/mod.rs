pub mod spectral;

pub use spectral::{FullFft, HalfFft, QuarterFft, SpectralTables, fft_size_needed};
