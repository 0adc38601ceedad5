use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::audio::features::{FeatureName, FeatureSet};
use crate::error::SketchError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub squares: SquaresConfig,
    #[serde(default = "default_spectrum_circles")]
    pub spectrum_circles: Vec<SpectrumCircleConfig>,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_features")]
    pub features: Vec<FeatureName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default = "default_centroid_window")]
    pub centroid_window: usize,
    #[serde(default = "default_spread_window")]
    pub spread_window: usize,
}

/// Feature-to-parameter mapping constants.
///
/// The two sketch variants disagree on the stroke weight: the default is
/// `loudness / 5` clamped to [1, 15]; `config/alternate.toml` uses
/// `loudness / 10` clamped to [1, 10].
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_centroid_range")]
    pub centroid_range: [f32; 2],
    #[serde(default = "default_distance_min")]
    pub distance_min: f32,
    /// Maximum ball distance as a fraction of the canvas width.
    #[serde(default = "default_distance_width_ratio")]
    pub distance_width_ratio: f32,
    #[serde(default = "default_spread_range")]
    pub spread_range: [f32; 2],
    #[serde(default = "default_rotation_speed_range")]
    pub rotation_speed_range: [f32; 2],
    /// Rotation added every callback regardless of the spread.
    #[serde(default = "default_rotation_base")]
    pub rotation_base: f32,
    #[serde(default = "default_rms_gain")]
    pub rms_gain: f32,
    #[serde(default = "default_radius_range")]
    pub radius_range: [f32; 2],
    #[serde(default = "default_stroke_divisor")]
    pub stroke_divisor: f32,
    #[serde(default = "default_stroke_range")]
    pub stroke_range: [f32; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquaresConfig {
    #[serde(default = "default_square_count")]
    pub count: usize,
    /// Square size factor is `1 + loudness_gain * loudness.total`.
    #[serde(default)]
    pub loudness_gain: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpectrumCircleConfig {
    pub radius: f32,
    pub speed: f32,
    #[serde(default = "default_rotation_rate")]
    pub rotation_rate: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_initial_background")]
    pub initial_background: u8,
    #[serde(default = "default_speed_step")]
    pub speed_step: f32,
    /// Silence in seconds that closes a recognised phrase.
    #[serde(default = "default_phrase_gap")]
    pub phrase_gap: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            analysis: AnalysisConfig::default(),
            smoothing: SmoothingConfig::default(),
            mapping: MappingConfig::default(),
            squares: SquaresConfig::default(),
            spectrum_circles: default_spectrum_circles(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            features: default_features(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            centroid_window: default_centroid_window(),
            spread_window: default_spread_window(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            centroid_range: default_centroid_range(),
            distance_min: default_distance_min(),
            distance_width_ratio: default_distance_width_ratio(),
            spread_range: default_spread_range(),
            rotation_speed_range: default_rotation_speed_range(),
            rotation_base: default_rotation_base(),
            rms_gain: default_rms_gain(),
            radius_range: default_radius_range(),
            stroke_divisor: default_stroke_divisor(),
            stroke_range: default_stroke_range(),
        }
    }
}

impl Default for SquaresConfig {
    fn default() -> Self {
        Self {
            count: default_square_count(),
            loudness_gain: 0.0,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            initial_background: default_initial_background(),
            speed_step: default_speed_step(),
            phrase_gap: default_phrase_gap(),
        }
    }
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 450 }
fn default_fps() -> u32 { 60 }
fn default_buffer_size() -> usize { 512 }
fn default_features() -> Vec<FeatureName> {
    vec![
        FeatureName::PowerSpectrum,
        FeatureName::Rms,
        FeatureName::AmplitudeSpectrum,
        FeatureName::SpectralCentroid,
        FeatureName::Loudness,
        FeatureName::PerceptualSpread,
    ]
}
fn default_centroid_window() -> usize { 7 }
fn default_spread_window() -> usize { 10 }
fn default_centroid_range() -> [f32; 2] { [0.0, 250.0] }
fn default_distance_min() -> f32 { 10.0 }
fn default_distance_width_ratio() -> f32 { 0.75 }
fn default_spread_range() -> [f32; 2] { [0.75, 0.9] }
fn default_rotation_speed_range() -> [f32; 2] { [-0.1, 0.02] }
fn default_rotation_base() -> f32 { 0.01 }
fn default_rms_gain() -> f32 { 500.0 }
fn default_radius_range() -> [f32; 2] { [100.0, 300.0] }
fn default_stroke_divisor() -> f32 { 5.0 }
fn default_stroke_range() -> [f32; 2] { [1.0, 15.0] }
fn default_square_count() -> usize { 10 }
fn default_rotation_rate() -> f32 { 0.001 }
fn default_spectrum_circles() -> Vec<SpectrumCircleConfig> {
    vec![
        SpectrumCircleConfig { radius: 100.0, speed: 1.0, rotation_rate: default_rotation_rate() },
        SpectrumCircleConfig { radius: 300.0, speed: -1.0, rotation_rate: default_rotation_rate() },
    ]
}
fn default_initial_background() -> u8 { 255 }
fn default_speed_step() -> f32 { 1.0 }
fn default_phrase_gap() -> f32 { 0.5 }

impl Config {
    pub fn feature_set(&self) -> FeatureSet {
        FeatureSet::new(&self.analysis.features)
    }

    /// Reject values the pipeline cannot be built from.
    pub fn validate(&self) -> Result<(), SketchError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SketchError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        let size = self.analysis.buffer_size;
        if size < 2 || !size.is_power_of_two() {
            return Err(SketchError::InvalidBufferSize(size));
        }
        if self.smoothing.centroid_window == 0 || self.smoothing.spread_window == 0 {
            return Err(SketchError::ZeroWindow);
        }
        if self.squares.count == 0 {
            return Err(SketchError::ZeroBuckets);
        }

        let m = &self.mapping;
        // map_range divides by the input span, clamp needs min <= max
        distinct("centroid_range", m.centroid_range)?;
        distinct("spread_range", m.spread_range)?;
        ordered("radius_range", m.radius_range)?;
        ordered("stroke_range", m.stroke_range)?;
        if m.stroke_divisor == 0.0 || !m.stroke_divisor.is_finite() {
            return Err(SketchError::InvalidRange {
                name: "stroke_divisor",
                min: m.stroke_divisor,
                max: m.stroke_divisor,
            });
        }
        let gap = self.speech.phrase_gap;
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(SketchError::InvalidRange { name: "phrase_gap", min: gap, max: gap });
        }
        Ok(())
    }
}

fn distinct(name: &'static str, [min, max]: [f32; 2]) -> Result<(), SketchError> {
    if min.is_finite() && max.is_finite() && min != max {
        Ok(())
    } else {
        Err(SketchError::InvalidRange { name, min, max })
    }
}

fn ordered(name: &'static str, [min, max]: [f32; 2]) -> Result<(), SketchError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(SketchError::InvalidRange { name, min, max })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.mapping.stroke_divisor, 5.0);
        assert_eq!(config.spectrum_circles.len(), 2);
        assert!(config.feature_set().contains(FeatureName::PerceptualSpread));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [mapping]
            stroke_divisor = 10.0
            stroke_range = [1.0, 10.0]

            [analysis]
            buffer_size = 2048
            features = ["rms", "loudness", "zcr"]
            "#,
        )
        .unwrap();
        assert_eq!(config.mapping.stroke_divisor, 10.0);
        assert_eq!(config.mapping.stroke_range, [1.0, 10.0]);
        assert_eq!(config.mapping.radius_range, [100.0, 300.0]);
        assert_eq!(config.analysis.buffer_size, 2048);
        assert!(config.feature_set().contains(FeatureName::Zcr));
        assert_eq!(config.smoothing.centroid_window, 7);
    }

    #[test]
    fn alternate_variant_parses() {
        let config = parse_config(include_str!("../config/alternate.toml")).unwrap();
        assert_eq!(config.mapping.stroke_divisor, 10.0);
        assert_eq!(config.mapping.stroke_range, [1.0, 10.0]);
        assert_eq!(config.squares.count, 10);
    }

    #[test]
    fn unknown_feature_is_rejected() {
        assert!(parse_config("[analysis]\nfeatures = [\"spectralFlux\"]").is_err());
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = parse_config("[smoothing]\nspread_window = 0").unwrap_err();
        assert_eq!(err.downcast_ref::<SketchError>(), Some(&SketchError::ZeroWindow));
    }

    #[test]
    fn inverted_clamp_is_rejected() {
        let mut config = Config::default();
        config.mapping.radius_range = [300.0, 100.0];
        assert!(matches!(
            config.validate(),
            Err(SketchError::InvalidRange { name: "radius_range", .. })
        ));
    }

    #[test]
    fn negative_phrase_gap_is_rejected() {
        let err = parse_config("[speech]\nphrase_gap = -0.5").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SketchError>(),
            Some(SketchError::InvalidRange { name: "phrase_gap", .. })
        ));
    }

    #[test]
    fn odd_buffer_size_is_rejected() {
        let mut config = Config::default();
        config.analysis.buffer_size = 1000;
        assert_eq!(config.validate(), Err(SketchError::InvalidBufferSize(1000)));
    }

    #[test]
    fn spectrum_circles_parse() {
        let config = parse_config(
            "[[spectrum_circles]]\nradius = 50.0\nspeed = 2.0\n",
        )
        .unwrap();
        assert_eq!(config.spectrum_circles.len(), 1);
        assert_eq!(config.spectrum_circles[0].rotation_rate, 0.001);
    }
}
