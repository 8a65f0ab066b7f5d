//! Trailing-window statistics over series with undefined points.
//!
//! A window of length `n` only yields a statistic once it holds `n`
//! observations and every one of them is defined. Partial windows never
//! produce a value, and a single undefined point blocks the statistic until it
//! has slid out of the window again.

use std::collections::VecDeque;

/// Maps NaN to `None`. Infinities are kept: they are legitimate results of
/// dividing by an exact zero.
pub(crate) fn defined(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

/// Trailing window over a single optional-valued series.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    len: usize,
    values: VecDeque<Option<f64>>,
    missing: usize,
}

impl RollingWindow {
    /// Creates an empty window. `len` must be at least 1.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "rolling window length must be at least 1");
        Self {
            len,
            values: VecDeque::with_capacity(len),
            missing: 0,
        }
    }

    /// Appends the next observation, evicting the oldest once full.
    pub fn push(&mut self, value: Option<f64>) {
        if self.values.len() == self.len {
            if let Some(None) = self.values.pop_front() {
                self.missing -= 1;
            }
        }
        let value = value.and_then(defined);
        if value.is_none() {
            self.missing += 1;
        }
        self.values.push_back(value);
    }

    /// True when the window is full and every observation is defined.
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.len && self.missing == 0
    }

    fn observations(&self) -> Option<impl Iterator<Item = f64> + '_> {
        self.is_ready().then(|| self.values.iter().flatten().copied())
    }

    pub fn mean(&self) -> Option<f64> {
        let sum: f64 = self.observations()?.sum();
        defined(sum / self.len as f64)
    }

    /// Bessel-corrected variance. Undefined for a window of one.
    pub fn sample_variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let squares: f64 = self.observations()?.map(|x| (x - mean).powi(2)).sum();
        defined(squares / (self.len as f64 - 1.0))
    }

    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}

/// Trailing window over a pair of series sampled on the same axis.
///
/// A position counts as defined only when both sides are.
#[derive(Debug, Clone)]
pub struct RollingPair {
    len: usize,
    pairs: VecDeque<Option<(f64, f64)>>,
    missing: usize,
}

impl RollingPair {
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "rolling window length must be at least 1");
        Self {
            len,
            pairs: VecDeque::with_capacity(len),
            missing: 0,
        }
    }

    pub fn push(&mut self, x: Option<f64>, y: Option<f64>) {
        if self.pairs.len() == self.len {
            if let Some(None) = self.pairs.pop_front() {
                self.missing -= 1;
            }
        }
        let pair = x.and_then(defined).zip(y.and_then(defined));
        if pair.is_none() {
            self.missing += 1;
        }
        self.pairs.push_back(pair);
    }

    pub fn is_ready(&self) -> bool {
        self.pairs.len() == self.len && self.missing == 0
    }

    fn observations(&self) -> Option<impl Iterator<Item = (f64, f64)> + '_> {
        self.is_ready().then(|| self.pairs.iter().flatten().copied())
    }

    /// Means of the `x` and `y` sides.
    pub fn means(&self) -> Option<(f64, f64)> {
        let (sum_x, sum_y) = self
            .observations()?
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let n = self.len as f64;
        defined(sum_x / n).zip(defined(sum_y / n))
    }

    /// Sample covariance of `x` and `y`.
    pub fn covariance(&self) -> Option<f64> {
        let (mean_x, mean_y) = self.means()?;
        let cross: f64 = self
            .observations()?
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();
        defined(cross / (self.len as f64 - 1.0))
    }

    /// Sample variance of the `y` side.
    pub fn variance_y(&self) -> Option<f64> {
        let (_, mean_y) = self.means()?;
        let squares: f64 = self.observations()?.map(|(_, y)| (y - mean_y).powi(2)).sum();
        defined(squares / (self.len as f64 - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn partial_window_is_undefined() {
        let mut w = RollingWindow::new(3);
        w.push(Some(1.0));
        w.push(Some(2.0));
        assert!(w.mean().is_none());
        w.push(Some(3.0));
        assert!(close(w.mean().unwrap(), 2.0));
        assert!(close(w.sample_std().unwrap(), 1.0));
    }

    #[test]
    fn window_slides() {
        let mut w = RollingWindow::new(2);
        for x in [1.0, 2.0, 4.0] {
            w.push(Some(x));
        }
        assert!(close(w.mean().unwrap(), 3.0));
        assert!(close(w.sample_variance().unwrap(), 2.0));
    }

    #[test]
    fn undefined_point_blocks_until_evicted() {
        let mut w = RollingWindow::new(2);
        w.push(Some(1.0));
        w.push(None);
        assert!(w.mean().is_none());
        w.push(Some(3.0));
        assert!(w.mean().is_none());
        w.push(Some(5.0));
        assert!(close(w.mean().unwrap(), 4.0));
    }

    #[test]
    fn nan_counts_as_undefined() {
        let mut w = RollingWindow::new(1);
        w.push(Some(f64::NAN));
        assert!(!w.is_ready());
        w.push(Some(2.0));
        assert_eq!(w.mean(), Some(2.0));
    }

    #[test]
    fn single_point_variance_is_undefined() {
        let mut w = RollingWindow::new(1);
        w.push(Some(2.0));
        assert!(w.sample_variance().is_none());
    }

    #[test]
    fn constant_window_has_zero_std() {
        let mut w = RollingWindow::new(4);
        for _ in 0..4 {
            w.push(Some(0.5));
        }
        assert_eq!(w.sample_std(), Some(0.0));
    }

    #[test]
    fn pair_covariance_of_scaled_series() {
        let mut p = RollingPair::new(3);
        for y in [1.0, 2.0, 4.0] {
            p.push(Some(2.0 * y), Some(y));
        }
        let var_y = p.variance_y().unwrap();
        let cov = p.covariance().unwrap();
        assert!(close(cov / var_y, 2.0));
    }

    #[test]
    fn pair_needs_both_sides() {
        let mut p = RollingPair::new(2);
        p.push(Some(1.0), Some(1.0));
        p.push(Some(2.0), None);
        assert!(p.covariance().is_none());
        p.push(Some(3.0), Some(2.0));
        assert!(p.covariance().is_none());
        p.push(Some(5.0), Some(3.0));
        // x = [3, 5], y = [2, 3]
        assert!(close(p.covariance().unwrap(), 1.0));
        assert!(close(p.variance_y().unwrap(), 0.5));
    }
}
