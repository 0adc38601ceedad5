use std::ops::Range;

/// Ranges narrower than this normalize to the midpoint.
const DEGENERATE_RANGE: f32 = 1e-6;

/// Contiguous index ranges of each bucket.
///
/// Index `i` of `len` bins lands in bucket `floor(i / (len / count))`, evaluated
/// in integers as `i * count / len`.
pub fn bucket_ranges(len: usize, count: usize) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }
    let mut start = 0;
    (0..count)
        .map(|b| {
            // First index whose bucket is beyond b: ceil((b + 1) * len / count)
            let end = ((b + 1) * len).div_ceil(count).min(len).max(start);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

/// Mean of each bucket, then natural log. An empty bucket yields NaN.
pub fn bucketize(spectrum: &[f32], count: usize) -> Vec<f32> {
    bucket_ranges(spectrum.len(), count)
        .into_iter()
        .map(|range| {
            let slice = &spectrum[range];
            let mean = slice.iter().sum::<f32>() / slice.len() as f32;
            mean.ln()
        })
        .collect()
}

/// Min-max normalize into [0, 1].
///
/// Extremes are taken over finite entries only and non-finite entries map to 0.
/// A degenerate range maps every finite entry to 0.5.
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                0.0
            } else if range < DEGENERATE_RANGE {
                0.5
            } else {
                (v - min) / range
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_of(index: usize, len: usize, count: usize) -> usize {
        index * count / len
    }

    #[test]
    fn ranges_partition_every_index_once() {
        for len in 1..70 {
            for count in 1..=len {
                let ranges = bucket_ranges(len, count);
                assert_eq!(ranges.len(), count);
                assert_eq!(ranges[0].start, 0);
                assert_eq!(ranges[count - 1].end, len);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
                let total: usize = ranges.iter().map(|r| r.len()).sum();
                assert_eq!(total, len);
                for (b, r) in ranges.iter().enumerate() {
                    assert!(!r.is_empty(), "empty bucket {} for len {} count {}", b, len, count);
                    for i in r.clone() {
                        assert_eq!(bucket_of(i, len, count), b);
                    }
                }
            }
        }
    }

    #[test]
    fn uneven_split_matches_floor_rule() {
        // len/count = 3.33: indices 0..=3 -> 0, 4..=6 -> 1, 7..=9 -> 2
        assert_eq!(bucket_ranges(10, 3), vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn bucketize_takes_log_of_mean() {
        let spectrum = [1.0, 3.0, 10.0, 10.0];
        let out = bucketize(&spectrum, 2);
        assert!((out[0] - 2.0f32.ln()).abs() < 1e-6);
        assert!((out[1] - 10.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn normalize_maps_extremes() {
        let out = normalize(&[2.0, 4.0, 3.0]);
        assert_eq!(out, vec![0.0, 1.0, 0.5]);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn degenerate_range_is_midpoint() {
        assert_eq!(normalize(&[1.5, 1.5, 1.5]), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn silent_buckets_do_not_poison_others() {
        // ln(0) = -inf for a silent bucket
        let out = normalize(&[f32::NEG_INFINITY, 1.0, 3.0]);
        assert_eq!(out, vec![0.0, 0.0, 1.0]);
        assert_eq!(normalize(&[f32::NEG_INFINITY; 3]), vec![0.0, 0.0, 0.0]);
    }
}
