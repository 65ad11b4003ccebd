use argminmax::ArgMinMax;
use itertools::Itertools;
use statrs::statistics::{Data, Median, Statistics};
use std::f64;

#[derive(serde::Deserialize, serde::Serialize, Default, Debug, Clone)]
pub struct RangeF64 {
    pub start_range: f64,
    pub end_range: f64,
    pub n_chunks: usize,
}

impl RangeF64 {
    pub fn new(start_range: f64, end_range: f64, n_chunks: usize) -> Self {
        debug_assert!(n_chunks > 0);
        RangeF64 {
            start_range,
            end_range,
            n_chunks,
        }
    }

    /// Range spanning the min and max of `values` (which must be non-empty)
    pub fn spanning(values: &[f64], n_chunks: usize) -> Self {
        let (min, max) = get_min_max(values);
        Self::new(min, max, n_chunks)
    }

    #[inline]
    pub fn n_chunks(&self) -> usize {
        self.n_chunks
    }

    pub fn range_length(&self) -> f64 {
        self.end_range - self.start_range
    }

    pub fn chunk_size(&self) -> f64 {
        self.range_length() / (self.n_chunks as f64)
    }

    pub fn chunk_index(&self, value: f64) -> usize {
        let index = (value - self.start_range) / self.chunk_size();
        let chunk_index = index as usize;

        // Clamping handles floating-point inaccuracies at the boundary (value == end_range).
        chunk_index.min(self.n_chunks - 1)
    }

    pub fn chunk_bounds(&self, chunk_index: usize) -> (f64, f64) {
        debug_assert!(chunk_index < self.n_chunks);
        let lower_bound = self.start_range + chunk_index as f64 * self.chunk_size();
        let upper_bound = self.start_range + (chunk_index + 1) as f64 * self.chunk_size();
        (lower_bound, upper_bound)
    }
}

/// Given an interval size, how many intervals total in a given range,
/// This assumes the range is exclusive, and hence why we need to add 1
/// i.e `range_end` is start of the last interval, not the end
pub fn intervals(range_start: i64, range_end: i64, interval: i64) -> i64 {
    debug_assert_eq!((range_end - range_start) % interval, 0);
    ((range_end - range_start) / interval) + 1
}

/// In which interval is `value`
pub fn index_into_range(range_start: i64, value: i64, range_interval: i64) -> i64 {
    debug_assert_eq!((value - range_start) % range_interval, 0);
    (value - range_start) / range_interval
}

pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    let (min_index, max_index) = vec.argminmax();
    (vec[min_index], vec[max_index])
}

/// `x[i+1] - x[i]` for every adjacent pair
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .tuple_windows()
        .map(|(prev, next)| next - prev)
        .collect()
}

/// Sample (n - 1) standard deviation. Fewer than two values, or all values equal, gives 0.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    // Exact zero for constant input, independent of rounding in the mean
    if values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let std_dev = values.std_dev();
    if std_dev.is_finite() { std_dev.max(0.0) } else { 0.0 }
}

/// Median of `values`, or None if empty
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let data = Data::new(values.to_vec());
    Some(data.median())
}

/// Arithmetic mean, or None if empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_index_clamps_top_edge() {
        let range = RangeF64::new(10.0, 20.0, 4);
        assert_eq!(range.chunk_index(10.0), 0);
        assert_eq!(range.chunk_index(12.49), 0);
        assert_eq!(range.chunk_index(12.5), 1);
        assert_eq!(range.chunk_index(19.99), 3);
        assert_eq!(range.chunk_index(20.0), 3, "max value must land in the last bucket");
        assert_eq!(range.chunk_bounds(1), (12.5, 15.0));
    }

    #[test]
    fn test_min_max() {
        let values = [3.0, -1.5, 8.25, 0.0];
        assert_eq!(get_min_max(&values), (-1.5, 8.25));
    }

    #[test]
    fn test_first_differences() {
        assert_eq!(first_differences(&[10.0, 11.0, 10.5]), vec![1.0, -0.5]);
        assert!(first_differences(&[10.0]).is_empty());
        assert!(first_differences(&[]).is_empty());
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[4.2]), 0.0);
        assert_eq!(sample_std_dev(&[10.1; 7]), 0.0);
        // Sample variance of [1, 2, 3, 4] is 5/3
        let sd = sample_std_dev(&[1.0, 2.0, 3.0, 4.0]);
        assert!((sd - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_median_and_mean() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_intervals_and_index() {
        assert_eq!(intervals(0, 300, 60), 6);
        assert_eq!(index_into_range(1_000, 1_180, 60), 3);
    }
}
