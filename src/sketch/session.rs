use crate::audio::features::{AnalysisRecord, FeatureName, FeatureSet, FeatureShape};

/// One feature's values across a session, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureSeries {
    /// Scalar features, loudness projected to its total. Missing values are NaN.
    Scalars(Vec<f32>),
    /// Spectra. Missing values are empty.
    Vectors(Vec<Vec<f32>>),
}

/// Session records regrouped into one parallel series per feature.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedFeatures {
    pub records: usize,
    pub series: Vec<(FeatureName, FeatureSeries)>,
}

pub fn group_by_feature(records: &[AnalysisRecord], features: &FeatureSet) -> GroupedFeatures {
    let series = features
        .iter()
        .map(|name| {
            let series = match name.shape() {
                FeatureShape::Scalar | FeatureShape::Loudness => FeatureSeries::Scalars(
                    records
                        .iter()
                        .map(|r| r.scalar(name).unwrap_or(f32::NAN))
                        .collect(),
                ),
                FeatureShape::Vector => FeatureSeries::Vectors(
                    records
                        .iter()
                        .map(|r| r.vector(name).map(<[f32]>::to_vec).unwrap_or_default())
                        .collect(),
                ),
            };
            (name, series)
        })
        .collect();

    GroupedFeatures {
        records: records.len(),
        series,
    }
}

/// Buffers analysis records between playback start and end.
pub struct Session {
    features: FeatureSet,
    records: Vec<AnalysisRecord>,
    recording: bool,
}

impl Session {
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            records: Vec::new(),
            recording: false,
        }
    }

    /// Discard the previous session and start buffering.
    pub fn start(&mut self) {
        self.records.clear();
        self.recording = true;
    }

    pub fn push(&mut self, record: AnalysisRecord) {
        if self.recording {
            self.records.push(record);
        } else {
            log::trace!("Dropping analysis record outside of a session");
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Stop buffering and regroup. `None` when no session is running.
    pub fn finish(&mut self) -> Option<GroupedFeatures> {
        if !self.recording {
            return None;
        }
        self.recording = false;
        Some(group_by_feature(&self.records, &self.features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::{FeatureValue, Loudness};

    fn series(grouped: &GroupedFeatures, name: FeatureName) -> Option<&FeatureSeries> {
        grouped.series.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    fn record(rms: f32, total: f32) -> AnalysisRecord {
        AnalysisRecord::new()
            .with(FeatureName::Rms, FeatureValue::Scalar(rms))
            .with(
                FeatureName::Loudness,
                FeatureValue::Loudness(Loudness { total, specific: vec![total, 0.0] }),
            )
            .with(FeatureName::PowerSpectrum, FeatureValue::Vector(vec![rms; 2]))
    }

    fn features() -> FeatureSet {
        FeatureSet::new(&[FeatureName::Rms, FeatureName::Loudness, FeatureName::PowerSpectrum])
    }

    #[test]
    fn groups_in_arrival_order() {
        let mut session = Session::new(features());
        session.start();
        session.push(record(0.1, 1.0));
        session.push(record(0.2, 2.0));
        session.push(record(0.3, 3.0));

        let grouped = session.finish().unwrap();
        assert_eq!(grouped.records, 3);
        assert_eq!(
            series(&grouped, FeatureName::Rms),
            Some(&FeatureSeries::Scalars(vec![0.1, 0.2, 0.3]))
        );
        assert_eq!(
            series(&grouped, FeatureName::Loudness),
            Some(&FeatureSeries::Scalars(vec![1.0, 2.0, 3.0]))
        );
        assert!(matches!(series(&grouped, FeatureName::PowerSpectrum), Some(FeatureSeries::Vectors(v)) if v.len() == 3));
    }

    #[test]
    fn missing_scalars_become_nan() {
        let records = vec![AnalysisRecord::new(), record(0.5, 1.0)];
        let grouped = group_by_feature(&records, &features());
        match series(&grouped, FeatureName::Rms) {
            Some(FeatureSeries::Scalars(v)) => {
                assert!(v[0].is_nan());
                assert_eq!(v[1], 0.5);
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn start_discards_previous_session() {
        let mut session = Session::new(features());
        session.start();
        session.push(record(0.1, 1.0));
        session.finish();
        assert_eq!(session.len(), 1);

        session.start();
        assert_eq!(session.len(), 0);
        assert!(session.recording);
    }

    #[test]
    fn records_outside_session_are_dropped() {
        let mut session = Session::new(features());
        session.push(record(0.1, 1.0));
        assert_eq!(session.len(), 0);
        assert!(session.finish().is_none());
    }
}
