use serde::Serialize;
use std::f32::consts::{PI, SQRT_2, TAU};

use super::bucket;
use super::smoothing::MovingAverage;
use crate::audio::features::{AnalysisRecord, FeatureName};
use crate::config::{Config, MappingConfig, SquaresConfig};
use crate::error::SketchError;
use crate::render::surface::Color;

/// Features the mapper reads from every record.
pub const REQUIRED_FEATURES: [FeatureName; 6] = [
    FeatureName::SpectralCentroid,
    FeatureName::PerceptualSpread,
    FeatureName::Rms,
    FeatureName::Loudness,
    FeatureName::AmplitudeSpectrum,
    FeatureName::PowerSpectrum,
];

const SQUARE_LOW: Color = Color::RED;
const SQUARE_HIGH: Color = Color::YELLOW;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SquareParams {
    /// Normalized bucket amplitude in [0, 1].
    pub amplitude: f32,
    pub angle: f32,
    pub size: f32,
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisualParameters {
    pub ball_distance: f32,
    /// Accumulated rotation of the dancing circles.
    pub rotation: f32,
    pub rotation_increment: f32,
    pub radius: f32,
    pub stroke_weight: f32,
    pub bucket_amplitudes: Vec<f32>,
    pub squares: Vec<SquareParams>,
    /// First half of the latest power spectrum.
    pub power_spectrum: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumBar {
    pub height: f32,
    pub width: f32,
}

/// Linear range mapping without clamping; values outside the input range extrapolate.
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Real-input spectra are symmetric; only the first half carries information.
pub fn first_half(spectrum: &[f32]) -> &[f32] {
    &spectrum[..spectrum.len() / 2]
}

/// Bars laid around half a circle of `radius`: height from the square root of the
/// power, width the arc length per bar.
pub fn spectrum_bars(spectrum: &[f32], radius: f32) -> Vec<SpectrumBar> {
    let width = radius * PI / spectrum.len() as f32;
    spectrum
        .iter()
        .map(|&p| SpectrumBar {
            height: map_range(p.sqrt() * 2.0, 0.0, 10.0, 0.0, radius),
            width,
        })
        .collect()
}

/// Turns analysis records into drawing parameters.
///
/// An invalid or missing input leaves the parameter it drives at its previous value.
pub struct VisualParameterMapper {
    mapping: MappingConfig,
    squares: SquaresConfig,
    width: f32,
    centroid: MovingAverage,
    spread: MovingAverage,
    params: VisualParameters,
    /// Set once a spectrum too short for every bucket has been reported.
    warned_sparse: bool,
}

impl VisualParameterMapper {
    pub fn new(config: &Config) -> Result<Self, SketchError> {
        config.validate()?;
        let mut mapper = Self {
            mapping: config.mapping.clone(),
            squares: config.squares.clone(),
            width: config.canvas.width as f32,
            centroid: MovingAverage::new(config.smoothing.centroid_window)?,
            spread: MovingAverage::new(config.smoothing.spread_window)?,
            params: VisualParameters {
                ball_distance: 0.0,
                rotation: 0.0,
                rotation_increment: 0.0,
                radius: 0.0,
                stroke_weight: 0.0,
                bucket_amplitudes: Vec::new(),
                squares: Vec::new(),
                power_spectrum: Vec::new(),
            },
            warned_sparse: false,
        };
        mapper.reset();
        Ok(mapper)
    }

    pub fn params(&self) -> &VisualParameters {
        &self.params
    }

    /// Clear smoothing state and restore the initial parameters.
    pub fn reset(&mut self) {
        self.centroid.reset();
        self.spread.reset();
        let amplitudes = vec![0.0; self.squares.count];
        self.params = VisualParameters {
            ball_distance: 100.0,
            rotation: 0.0,
            rotation_increment: self.mapping.rotation_base,
            radius: 100.0,
            stroke_weight: 1.0,
            squares: self.square_params(&amplitudes, 1.0),
            bucket_amplitudes: amplitudes,
            power_spectrum: Vec::new(),
        };
    }

    pub fn update(&mut self, record: &AnalysisRecord, speed_multiplier: f32) -> &VisualParameters {
        let m = &self.mapping;

        let centroid = record
            .scalar(FeatureName::SpectralCentroid)
            .and_then(|c| self.centroid.update(c));
        if let Some(avg) = centroid {
            let [lo, hi] = m.centroid_range;
            self.params.ball_distance =
                map_range(avg, lo, hi, m.distance_min, self.width * m.distance_width_ratio);
        }

        let spread = record
            .scalar(FeatureName::PerceptualSpread)
            .and_then(|s| self.spread.update(s));
        if let Some(avg) = spread {
            let [lo, hi] = m.spread_range;
            let [slow, fast] = m.rotation_speed_range;
            let speed = map_range(avg, lo, hi, slow, fast) * speed_multiplier;
            self.params.rotation_increment = m.rotation_base + speed;
        }
        if self.params.rotation.is_nan() {
            self.params.rotation = 0.0;
        }
        self.params.rotation += self.params.rotation_increment;

        if let Some(rms) = record.scalar(FeatureName::Rms).filter(|v| v.is_finite()) {
            let [lo, hi] = m.radius_range;
            self.params.radius = (rms * m.rms_gain).clamp(lo, hi);
        }

        let loudness = record.loudness().map(|l| l.total).filter(|v| v.is_finite());
        if let Some(total) = loudness {
            let [lo, hi] = m.stroke_range;
            self.params.stroke_weight = (total / m.stroke_divisor).clamp(lo, hi);
        }

        if let Some(spectrum) = record.vector(FeatureName::AmplitudeSpectrum) {
            let half = first_half(spectrum);
            if !half.is_empty() {
                if half.len() < self.squares.count && !self.warned_sparse {
                    log::warn!(
                        "Spectrum has {} bins for {} squares, empty buckets will read as silent",
                        half.len(),
                        self.squares.count
                    );
                    self.warned_sparse = true;
                }
                let amplitudes = bucket::normalize(&bucket::bucketize(half, self.squares.count));
                let scale = 1.0 + self.squares.loudness_gain * loudness.unwrap_or(0.0);
                self.params.squares = self.square_params(&amplitudes, scale);
                self.params.bucket_amplitudes = amplitudes;
            }
        }

        if let Some(power) = record.vector(FeatureName::PowerSpectrum) {
            self.params.power_spectrum = first_half(power).to_vec();
        }

        &self.params
    }

    /// Edge length of the cell each square lives in, so a rotated square never overlaps.
    fn cell_width(&self) -> f32 {
        (self.width / 2.0 / (self.squares.count + 1) as f32) / SQRT_2
    }

    fn square_params(&self, amplitudes: &[f32], scale: f32) -> Vec<SquareParams> {
        let cell = self.cell_width();
        amplitudes
            .iter()
            .map(|&v| SquareParams {
                amplitude: v,
                angle: v * TAU,
                size: (cell * v).max(1.0) * scale,
                color: SQUARE_LOW.lerp(SQUARE_HIGH, v),
            })
            .collect()
    }
}
