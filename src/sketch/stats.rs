use serde::Serialize;
use std::cmp::Ordering;

use super::session::{FeatureSeries, GroupedFeatures};
use crate::audio::features::FeatureName;

/// Summary of one scalar feature over a finished session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureStatistics {
    pub feature: FeatureName,
    /// Finite values the statistics were computed from.
    pub samples: usize,
    pub mean: f32,
    /// Population standard deviation divided by `max - min`.
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub records: usize,
    /// Ascending by normalized standard deviation, NaN last.
    pub features: Vec<FeatureStatistics>,
}

/// Statistics over the finite entries of `values`.
///
/// With no finite entries every statistic is NaN; a constant series has a NaN std.
pub fn describe(feature: FeatureName, values: &[f32]) -> FeatureStatistics {
    let finite: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| f64::from(v))
        .collect();

    if finite.is_empty() {
        return FeatureStatistics {
            feature,
            samples: 0,
            mean: f32::NAN,
            std: f32::NAN,
            min: f32::NAN,
            max: f32::NAN,
        };
    }

    let n = finite.len() as f64;
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt() / (max - min);

    FeatureStatistics {
        feature,
        samples: finite.len(),
        mean: mean as f32,
        std: std as f32,
        min: min as f32,
        max: max as f32,
    }
}

/// Describe every scalar feature and rank by variability. Spectra are skipped.
pub fn summarize(grouped: &GroupedFeatures) -> SessionSummary {
    let mut features: Vec<FeatureStatistics> = grouped
        .series
        .iter()
        .filter_map(|(name, series)| match series {
            FeatureSeries::Scalars(values) => Some(describe(*name, values)),
            FeatureSeries::Vectors(_) => None,
        })
        .collect();

    features.sort_by(|a, b| match (a.std.is_nan(), b.std.is_nan()) {
        (false, false) => a.std.partial_cmp(&b.std).unwrap_or(Ordering::Equal),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    });

    SessionSummary {
        records: grouped.records,
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn population_statistics() {
        let stats = describe(FeatureName::Rms, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.samples, 5);
        assert!(approx(stats.mean, 3.0));
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!(approx(stats.std, 2.0f32.sqrt() / 4.0));
        assert!(approx(stats.std, 0.3536));
    }

    #[test]
    fn non_finite_values_are_filtered() {
        let stats = describe(
            FeatureName::Zcr,
            &[f32::NAN, 1.0, f32::INFINITY, 3.0, f32::NEG_INFINITY],
        );
        assert_eq!(stats.samples, 2);
        assert!(approx(stats.mean, 2.0));
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn empty_series_propagates_nan() {
        let stats = describe(FeatureName::Energy, &[f32::NAN, f32::INFINITY]);
        assert_eq!(stats.samples, 0);
        assert!(stats.mean.is_nan() && stats.std.is_nan());
        assert!(stats.min.is_nan() && stats.max.is_nan());
    }

    #[test]
    fn constant_series_has_nan_std() {
        let stats = describe(FeatureName::Rms, &[2.0, 2.0]);
        assert!(approx(stats.mean, 2.0));
        assert!(stats.std.is_nan());
    }

    #[test]
    fn ranks_ascending_and_skips_spectra() {
        let grouped = GroupedFeatures {
            records: 4,
            series: vec![
                // normalized std 0.5
                (FeatureName::Rms, FeatureSeries::Scalars(vec![0.0, 1.0, 0.0, 1.0])),
                (FeatureName::PowerSpectrum, FeatureSeries::Vectors(vec![vec![1.0]; 4])),
                // NaN std
                (FeatureName::Energy, FeatureSeries::Scalars(vec![1.0; 4])),
                // normalized std ~0.433
                (FeatureName::Zcr, FeatureSeries::Scalars(vec![0.0, 0.0, 0.0, 1.0])),
            ],
        };
        let summary = summarize(&grouped);
        let order: Vec<FeatureName> = summary.features.iter().map(|s| s.feature).collect();
        assert_eq!(order, vec![FeatureName::Zcr, FeatureName::Rms, FeatureName::Energy]);
        assert_eq!(summary.records, 4);
    }
}
