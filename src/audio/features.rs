use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SketchError;

/// Supported feature extractors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureName {
    Rms,
    Energy,
    Zcr,
    AmplitudeSpectrum,
    PowerSpectrum,
    SpectralCentroid,
    SpectralFlatness,
    SpectralRolloff,
    SpectralSpread,
    Loudness,
    PerceptualSpread,
    PerceptualSharpness,
}

/// Value layout of a feature, fixed per feature name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureShape {
    Scalar,
    Vector,
    Loudness,
}

impl FeatureName {
    pub const ALL: [FeatureName; 12] = [
        FeatureName::Rms,
        FeatureName::Energy,
        FeatureName::Zcr,
        FeatureName::AmplitudeSpectrum,
        FeatureName::PowerSpectrum,
        FeatureName::SpectralCentroid,
        FeatureName::SpectralFlatness,
        FeatureName::SpectralRolloff,
        FeatureName::SpectralSpread,
        FeatureName::Loudness,
        FeatureName::PerceptualSpread,
        FeatureName::PerceptualSharpness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Rms => "rms",
            FeatureName::Energy => "energy",
            FeatureName::Zcr => "zcr",
            FeatureName::AmplitudeSpectrum => "amplitudeSpectrum",
            FeatureName::PowerSpectrum => "powerSpectrum",
            FeatureName::SpectralCentroid => "spectralCentroid",
            FeatureName::SpectralFlatness => "spectralFlatness",
            FeatureName::SpectralRolloff => "spectralRolloff",
            FeatureName::SpectralSpread => "spectralSpread",
            FeatureName::Loudness => "loudness",
            FeatureName::PerceptualSpread => "perceptualSpread",
            FeatureName::PerceptualSharpness => "perceptualSharpness",
        }
    }

    pub fn shape(self) -> FeatureShape {
        match self {
            FeatureName::AmplitudeSpectrum | FeatureName::PowerSpectrum => FeatureShape::Vector,
            FeatureName::Loudness => FeatureShape::Loudness,
            _ => FeatureShape::Scalar,
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| SketchError::UnknownFeature(s.to_string()))
    }
}

/// Total loudness plus the per-Bark-band specific loudness.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Loudness {
    pub total: f32,
    pub specific: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f32),
    Vector(Vec<f32>),
    Loudness(Loudness),
}

/// Features extracted from one audio buffer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnalysisRecord {
    values: BTreeMap<FeatureName, FeatureValue>,
}

impl AnalysisRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, name: FeatureName, value: FeatureValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: FeatureName, value: FeatureValue) {
        self.values.insert(name, value);
    }

    /// Scalar value of `name`. Loudness resolves to its total.
    pub fn scalar(&self, name: FeatureName) -> Option<f32> {
        match self.values.get(&name)? {
            FeatureValue::Scalar(v) => Some(*v),
            FeatureValue::Loudness(l) => Some(l.total),
            FeatureValue::Vector(_) => None,
        }
    }

    pub fn vector(&self, name: FeatureName) -> Option<&[f32]> {
        match self.values.get(&name)? {
            FeatureValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn loudness(&self) -> Option<&Loudness> {
        match self.values.get(&FeatureName::Loudness)? {
            FeatureValue::Loudness(l) => Some(l),
            _ => None,
        }
    }
}

/// Allow-list of features extracted for a session, in canonical order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSet {
    names: Vec<FeatureName>,
}

impl FeatureSet {
    pub fn new(names: &[FeatureName]) -> Self {
        let mut names = names.to_vec();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn all() -> Self {
        Self::new(&FeatureName::ALL)
    }

    pub fn contains(&self, name: FeatureName) -> bool {
        self.names.binary_search(&name).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureName> + '_ {
        self.names.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Features required by `required` that this set does not provide.
    pub fn missing(&self, required: &[FeatureName]) -> Vec<FeatureName> {
        required.iter().copied().filter(|n| !self.contains(*n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_names() {
        assert_eq!("spectralCentroid".parse::<FeatureName>(), Ok(FeatureName::SpectralCentroid));
        assert_eq!("rms".parse::<FeatureName>(), Ok(FeatureName::Rms));
        assert_eq!(
            "spectralFlux".parse::<FeatureName>(),
            Err(SketchError::UnknownFeature("spectralFlux".into()))
        );
    }

    #[test]
    fn serde_names_match_display() {
        for name in FeatureName::ALL {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name));
        }
    }

    #[test]
    fn scalar_accessor_projects_loudness() {
        let record = AnalysisRecord::new()
            .with(FeatureName::Rms, FeatureValue::Scalar(0.25))
            .with(
                FeatureName::Loudness,
                FeatureValue::Loudness(Loudness { total: 7.0, specific: vec![3.0, 4.0] }),
            )
            .with(FeatureName::PowerSpectrum, FeatureValue::Vector(vec![1.0, 2.0]));

        assert_eq!(record.scalar(FeatureName::Rms), Some(0.25));
        assert_eq!(record.scalar(FeatureName::Loudness), Some(7.0));
        assert_eq!(record.scalar(FeatureName::PowerSpectrum), None);
        assert_eq!(record.vector(FeatureName::PowerSpectrum), Some(&[1.0, 2.0][..]));
        assert!(record.scalar(FeatureName::Zcr).is_none());
    }

    #[test]
    fn feature_set_dedups_and_reports_missing() {
        let set = FeatureSet::new(&[FeatureName::Rms, FeatureName::Loudness, FeatureName::Rms]);
        assert_eq!(set.iter().count(), 2);
        assert!(set.contains(FeatureName::Loudness));
        assert_eq!(
            set.missing(&[FeatureName::Rms, FeatureName::SpectralCentroid]),
            vec![FeatureName::SpectralCentroid]
        );
    }
}
