//! Sample Sequences
//!
//! The evaluator output: an ordered run of `(x, y)` pairs computed at evenly
//! spaced positions. A sequence is rebuilt from scratch on every evaluation and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};

/// One evaluated point in world (physical) units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
///
/// A single point sits at `start`; zero points yield an empty iterator.
pub fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let span = end - start;
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    (0..n).map(move |i| start + span * (i as f64) / denom)
}

/// Ordered list of samples for one plotted quantity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleSequence(Vec<Sample>);

impl SampleSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `f` at `n` evenly spaced positions across `[start, end]`
    pub fn from_fn(start: f64, end: f64, n: usize, mut f: impl FnMut(f64) -> f64) -> Self {
        Self(linspace(start, end, n).map(|x| Sample::new(x, f(x))).collect())
    }

    /// Evaluate `f` at integer indices `0..n`, where the closure returns the full sample
    pub fn from_indices(n: usize, f: impl FnMut(usize) -> Sample) -> Self {
        Self((0..n).map(f).collect())
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self(samples)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.0.last()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.0.get(index)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|s| s.y)
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|s| s.x)
    }

    /// True when no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Sample::is_finite)
    }

    /// (min, max) of the y values
    pub fn y_range(&self) -> Option<(f64, f64)> {
        range_of(self.ys())
    }

    /// (min, max) of the x values
    pub fn x_range(&self) -> Option<(f64, f64)> {
        range_of(self.xs())
    }

    /// Sample whose x is closest to `x`
    pub fn nearest(&self, x: f64) -> Option<Sample> {
        self.0
            .iter()
            .min_by(|a, b| {
                (a.x - x)
                    .abs()
                    .partial_cmp(&(b.x - x).abs())
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
            .copied()
    }

    /// Mean of `y²` over the sequence
    pub fn mean_square(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.ys().map(|y| y * y).sum::<f64>() / self.0.len() as f64
    }
}

impl FromIterator<Sample> for SampleSequence {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SampleSequence {
    type Item = &'a Sample;
    type IntoIter = core::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn range_of(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace_endpoints() {
        let xs: Vec<f64> = linspace(0.0, 10.0, 11).collect();
        assert_eq!(xs.len(), 11);
        assert_eq!(xs[0], 0.0);
        assert_eq!(xs[10], 10.0);
        assert_relative_eq!(xs[3], 3.0);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert_eq!(linspace(0.0, 1.0, 0).count(), 0);
        let single: Vec<f64> = linspace(2.0, 5.0, 1).collect();
        assert_eq!(single, vec![2.0]);
    }

    #[test]
    fn test_from_fn() {
        let seq = SampleSequence::from_fn(0.0, 1.0, 5, |x| 2.0 * x);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.last().unwrap().y, 2.0);
        assert!(seq.is_finite());
    }

    #[test]
    fn test_ranges() {
        let seq = SampleSequence::from_fn(-1.0, 1.0, 21, |x| x * x);
        let (lo, hi) = seq.y_range().unwrap();
        assert_relative_eq!(lo, 0.0, epsilon = 1e-12);
        assert_relative_eq!(hi, 1.0);
        assert_eq!(seq.x_range(), Some((-1.0, 1.0)));
        assert_eq!(SampleSequence::new().y_range(), None);
    }

    #[test]
    fn test_nearest() {
        let seq = SampleSequence::from_fn(0.0, 10.0, 11, |x| x + 100.0);
        let s = seq.nearest(6.3).unwrap();
        assert_eq!(s.x, 6.0);
        assert_eq!(s.y, 106.0);
    }

    #[test]
    fn test_detects_non_finite() {
        let seq = SampleSequence::from_samples(vec![Sample::new(0.0, 1.0), Sample::new(1.0, f64::NAN)]);
        assert!(!seq.is_finite());
    }

    #[test]
    fn test_mean_square() {
        let seq = SampleSequence::from_samples(vec![Sample::new(0.0, 2.0), Sample::new(1.0, -2.0)]);
        assert_relative_eq!(seq.mean_square(), 4.0);
        assert_eq!(SampleSequence::new().mean_square(), 0.0);
    }
}
