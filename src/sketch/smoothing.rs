use std::collections::VecDeque;

use crate::error::SketchError;

/// Trailing average over the last `size` valid samples, seeded with zeros.
#[derive(Clone, Debug)]
pub struct MovingAverage {
    window: VecDeque<f32>,
}

impl MovingAverage {
    pub fn new(size: usize) -> Result<Self, SketchError> {
        if size == 0 {
            return Err(SketchError::ZeroWindow);
        }
        Ok(Self {
            window: std::iter::repeat(0.0).take(size).collect(),
        })
    }

    /// Push `value` and return the new average.
    ///
    /// NaN samples are discarded: the window is untouched and `None` is returned.
    pub fn update(&mut self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        self.window.pop_front();
        self.window.push_back(value);
        Some(self.average())
    }

    pub fn average(&self) -> f32 {
        self.window.iter().sum::<f32>() / self.window.len() as f32
    }

    /// Back to all zeros.
    pub fn reset(&mut self) {
        self.window.iter_mut().for_each(|v| *v = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(MovingAverage::new(0).err(), Some(SketchError::ZeroWindow));
    }

    #[test]
    fn first_update_divides_by_window() {
        for k in 1..=12 {
            let mut avg = MovingAverage::new(k).unwrap();
            let got = avg.update(6.0).unwrap();
            assert!((got - 6.0 / k as f32).abs() < 1e-6);
            assert_eq!(avg.window.len(), k);
        }
    }

    #[test]
    fn oldest_sample_drops_out() {
        let mut avg = MovingAverage::new(3).unwrap();
        avg.update(3.0);
        avg.update(6.0);
        assert_eq!(avg.update(9.0), Some(6.0));
        assert_eq!(avg.update(0.0), Some(5.0));
    }

    #[test]
    fn nan_is_a_no_op() {
        let mut with_nan = MovingAverage::new(4).unwrap();
        let mut without = MovingAverage::new(4).unwrap();
        for v in [1.0, 2.0, 3.0] {
            with_nan.update(v);
            without.update(v);
        }
        assert_eq!(with_nan.update(f32::NAN), None);
        assert_eq!(with_nan.update(4.0), without.update(4.0));
        assert_eq!(with_nan.window.len(), 4);
    }

    #[test]
    fn valid_inputs_never_produce_nan() {
        let mut avg = MovingAverage::new(5).unwrap();
        for i in 0..50 {
            let v = (i as f32 * 0.7).sin() * 100.0;
            assert!(!avg.update(v).unwrap().is_nan());
        }
    }

    #[test]
    fn reset_zeroes_window() {
        let mut avg = MovingAverage::new(2).unwrap();
        avg.update(10.0);
        avg.reset();
        assert_eq!(avg.average(), 0.0);
        assert_eq!(avg.update(2.0), Some(1.0));
    }
}
