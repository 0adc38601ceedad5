use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::decode::Track;
use super::features::{AnalysisRecord, FeatureName, FeatureSet, FeatureValue, Loudness};
use crate::error::SketchError;

const BARK_BANDS: usize = 24;
const LOUDNESS_EXPONENT: f32 = 0.23;
const ROLLOFF_FRACTION: f32 = 0.99;

/// Per-buffer feature extractor. One instance per thread; cloning shares the FFT plan.
#[derive(Clone)]
pub struct FeatureExtractor {
    buffer_size: usize,
    sample_rate: u32,
    features: FeatureSet,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    band_of_bin: Vec<usize>,
    scratch: Vec<Complex<f32>>,
}

impl FeatureExtractor {
    pub fn new(buffer_size: usize, sample_rate: u32, features: FeatureSet) -> Result<Self, SketchError> {
        if buffer_size < 2 || !buffer_size.is_power_of_two() {
            return Err(SketchError::InvalidBufferSize(buffer_size));
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(buffer_size);

        Ok(Self {
            buffer_size,
            sample_rate,
            features,
            fft,
            window: hann_window(buffer_size),
            band_of_bin: bark_bands(buffer_size / 2, buffer_size, sample_rate),
            scratch: vec![Complex::new(0.0, 0.0); buffer_size],
        })
    }

    /// Extract the allow-listed features of one buffer. Short buffers are zero-padded.
    pub fn extract(&mut self, signal: &[f32]) -> AnalysisRecord {
        let mut record = AnalysisRecord::new();
        if self.features.is_empty() {
            return record;
        }

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = signal.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let half = self.buffer_size / 2;
        let amplitude: Vec<f32> = self.scratch[..half].iter().map(|c| c.norm()).collect();

        let loudness = self.loudness(&amplitude);
        let nyquist_bin = self.sample_rate as f32 / 2.0 / (half.max(2) - 1) as f32;

        for name in self.features.iter() {
            let value = match name {
                FeatureName::Rms => FeatureValue::Scalar(rms(signal)),
                FeatureName::Energy => FeatureValue::Scalar(signal.iter().map(|s| s * s).sum()),
                FeatureName::Zcr => FeatureValue::Scalar(zero_crossings(signal) as f32),
                FeatureName::AmplitudeSpectrum => FeatureValue::Vector(amplitude.clone()),
                FeatureName::PowerSpectrum => {
                    FeatureValue::Vector(amplitude.iter().map(|a| a * a).collect())
                }
                FeatureName::SpectralCentroid => FeatureValue::Scalar(moment(1, &amplitude)),
                FeatureName::SpectralSpread => {
                    let mu1 = moment(1, &amplitude);
                    FeatureValue::Scalar((moment(2, &amplitude) - mu1 * mu1).sqrt())
                }
                FeatureName::SpectralFlatness => FeatureValue::Scalar(flatness(&amplitude)),
                FeatureName::SpectralRolloff => {
                    FeatureValue::Scalar(rolloff_bins(&amplitude) as f32 * nyquist_bin)
                }
                FeatureName::Loudness => FeatureValue::Loudness(loudness.clone()),
                FeatureName::PerceptualSpread => FeatureValue::Scalar(perceptual_spread(&loudness)),
                FeatureName::PerceptualSharpness => {
                    FeatureValue::Scalar(perceptual_sharpness(&loudness))
                }
            };
            record.insert(name, value);
        }

        record
    }

    fn loudness(&self, amplitude: &[f32]) -> Loudness {
        let mut band_sums = [0.0f32; BARK_BANDS];
        for (bin, &amp) in amplitude.iter().enumerate() {
            band_sums[self.band_of_bin[bin]] += amp;
        }
        let specific: Vec<f32> = band_sums.iter().map(|s| s.powf(LOUDNESS_EXPONENT)).collect();
        let total = specific.iter().sum();
        Loudness { total, specific }
    }
}

/// Split a track into full buffers and extract one record per buffer, in order.
///
/// A trailing partial buffer is dropped: the analyzer only fires on full buffers.
pub fn analyze_track(
    track: &Track,
    buffer_size: usize,
    features: &FeatureSet,
) -> Result<Vec<AnalysisRecord>, SketchError> {
    let extractor = FeatureExtractor::new(buffer_size, track.sample_rate, features.clone())?;

    if features.is_empty() {
        log::warn!("No feature extractors configured, the sketch will receive no analysis callbacks");
        return Ok(Vec::new());
    }

    let chunks: Vec<&[f32]> = track.samples.chunks_exact(buffer_size).collect();
    let dropped = track.samples.len() % buffer_size;
    log::info!(
        "Extracting {} buffers of {} samples ({} trailing samples dropped)",
        chunks.len(),
        buffer_size,
        dropped
    );

    let records: Vec<AnalysisRecord> = chunks
        .into_par_iter()
        .map_with(extractor, |ex, chunk| ex.extract(chunk))
        .collect();

    Ok(records)
}

fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

fn zero_crossings(signal: &[f32]) -> usize {
    signal
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count()
}

/// Spectral moment over bin indices. NaN for an all-zero spectrum.
fn moment(order: i32, amplitude: &[f32]) -> f32 {
    let total: f32 = amplitude.iter().sum();
    let weighted: f32 = amplitude
        .iter()
        .enumerate()
        .map(|(k, &a)| (k as f32).powi(order) * a)
        .sum();
    weighted / total
}

fn flatness(amplitude: &[f32]) -> f32 {
    let n = amplitude.len() as f32;
    let log_mean = amplitude.iter().map(|a| a.ln()).sum::<f32>() / n;
    let mean = amplitude.iter().sum::<f32>() / n;
    log_mean.exp() / mean
}

/// Number of low bins holding `ROLLOFF_FRACTION` of the spectral energy.
fn rolloff_bins(amplitude: &[f32]) -> usize {
    let total: f32 = amplitude.iter().sum();
    let threshold = ROLLOFF_FRACTION * total;
    let mut remaining = total;
    let mut n = amplitude.len();
    while n > 0 && remaining > threshold {
        n -= 1;
        remaining -= amplitude[n];
    }
    n
}

fn perceptual_spread(loudness: &Loudness) -> f32 {
    let max = loudness.specific.iter().copied().fold(0.0f32, f32::max);
    ((loudness.total - max) / loudness.total).powi(2)
}

fn perceptual_sharpness(loudness: &Loudness) -> f32 {
    let weighted: f32 = loudness
        .specific
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let z = (i + 1) as f32;
            let g = if i < 15 { 1.0 } else { 0.066 * (0.171 * z).exp() };
            z * g * s
        })
        .sum();
    0.11 * weighted / loudness.total
}

fn bark(freq: f32) -> f32 {
    13.0 * (freq / 1315.8).atan() + 3.5 * (freq / 7518.0).powi(2).atan()
}

/// Bark band index for every amplitude bin.
fn bark_bands(bins: usize, buffer_size: usize, sample_rate: u32) -> Vec<usize> {
    let bin_hz = sample_rate as f32 / buffer_size as f32;
    let max_bark = bark(bins.saturating_sub(1) as f32 * bin_hz);
    (0..bins)
        .map(|k| {
            if max_bark <= 0.0 {
                return 0;
            }
            let band = (bark(k as f32 * bin_hz) / max_bark * BARK_BANDS as f32) as usize;
            band.min(BARK_BANDS - 1)
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
