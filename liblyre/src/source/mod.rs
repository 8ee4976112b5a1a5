//! Spectrogram producers
//!
//! The pipeline consumes spectrograms from three places: the FFT
//! accelerator character device (`device`), whitespace-numeric text
//! files (`crate::spectrogram`), and a software STFT over decoded
//! samples (`stft`) that reproduces the hardware's geometry.

#[cfg(unix)]
pub mod device;
pub mod stft;

#[cfg(unix)]
pub use device::FftAccelerator;
pub use stft::spectrogram_from_samples;
