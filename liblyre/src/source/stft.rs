//! Software STFT front-end
//!
//! Produces the same spectrogram geometry the FFT accelerator delivers:
//! non-overlapping windows of `nfft` input samples, one column per
//! window, keeping the lower `nfft / 2` magnitude bins. Lets songs be
//! enrolled and queried from ordinary audio files with no hardware.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::spectrogram::Spectrogram;

fn hann_window(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

/// Transform mono samples into a magnitude spectrogram
///
/// The hop equals `nfft`, matching the hardware's down-sampling factor.
/// A tail shorter than one window is discarded.
pub fn spectrogram_from_samples(samples: &[f32], nfft: usize) -> Spectrogram {
    let bins = nfft / 2;
    let mut spec = Spectrogram::new(bins);
    if nfft == 0 || samples.len() < nfft {
        return spec;
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(nfft);
    let window = hann_window(nfft);
    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); nfft];

    for chunk in samples.chunks_exact(nfft) {
        for (slot, (&sample, &w)) in buffer.iter_mut().zip(chunk.iter().zip(window.iter())) {
            *slot = Complex::new(sample * w, 0.0);
        }
        fft.process(&mut buffer);

        let column: Vec<f32> = buffer.iter().take(bins).map(|c| c.norm()).collect();
        // length is bins by construction
        let _ = spec.push_column(column);
    }

    spec
}

// tests
