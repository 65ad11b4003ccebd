use std::ops::Range;

use crate::analysis::PipelineError;

/// A fixed-length slice of the symbol sequence.
///
/// Symbol `j` is the move from price `j` to price `j + 1`, so the window's symbols
/// `[start, start + length)` cover the prices `[start, start + length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub start: usize,
    pub length: usize,
}

impl Window {
    pub fn symbol_range(&self) -> Range<usize> {
        self.start..self.start + self.length
    }

    pub fn price_range(&self) -> Range<usize> {
        self.start..self.start + self.length + 1
    }

    pub fn slice<'a, T>(&self, sequence: &'a [T]) -> &'a [T] {
        &sequence[self.symbol_range()]
    }
}

/// Cuts a sequence into windows `W_i = S[i*stride .. i*stride + length]`.
/// A trailing partial window is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlicer {
    length: usize,
    stride: usize,
}

impl WindowSlicer {
    pub fn new(length: usize, stride: usize) -> Result<Self, PipelineError> {
        if length == 0 {
            return Err(PipelineError::invalid("window length must be > 0"));
        }
        if stride == 0 {
            return Err(PipelineError::invalid("stride must be > 0"));
        }
        Ok(WindowSlicer { length, stride })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `floor((m - length) / stride) + 1` when `m >= length`, else 0
    pub fn window_count(&self, sequence_len: usize) -> usize {
        if sequence_len < self.length {
            0
        } else {
            (sequence_len - self.length) / self.stride + 1
        }
    }

    pub fn windows(&self, sequence_len: usize) -> Vec<Window> {
        (0..self.window_count(sequence_len))
            .map(|index| Window {
                index,
                start: index * self.stride,
                length: self.length,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_matches_formula() {
        let slicer = WindowSlicer::new(4, 2).unwrap();
        for m in 0..40 {
            let expected = if m >= 4 { (m - 4) / 2 + 1 } else { 0 };
            assert_eq!(slicer.window_count(m), expected, "m = {}", m);
            assert_eq!(slicer.windows(m).len(), expected, "m = {}", m);
        }
    }

    #[test]
    fn test_offsets_and_lengths() {
        let slicer = WindowSlicer::new(3, 2).unwrap();
        let sequence: Vec<usize> = (0..10).collect();
        let windows = slicer.windows(sequence.len());
        // Starts 0,2,4,6 fit (6+3 <= 10); 8+3 > 10 is dropped
        assert_eq!(windows.len(), 4);
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.index, i);
            assert_eq!(window.start, i * 2);
            assert_eq!(window.slice(&sequence).len(), 3);
        }
        assert_eq!(windows[3].slice(&sequence), &[6, 7, 8]);
        assert_eq!(windows[3].price_range(), 6..10);
    }

    #[test]
    fn test_overlapping_and_gapped_strides() {
        let overlapping = WindowSlicer::new(5, 1).unwrap();
        assert_eq!(overlapping.window_count(7), 3);

        // Stride larger than length skips symbols between windows
        let gapped = WindowSlicer::new(2, 5).unwrap();
        let starts: Vec<usize> = gapped.windows(13).iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 5, 10]);
    }

    #[test]
    fn test_short_sequence_gives_no_windows() {
        let slicer = WindowSlicer::new(100, 50).unwrap();
        assert!(slicer.windows(99).is_empty());
        assert_eq!(slicer.windows(100).len(), 1);
    }

    #[test]
    fn test_zero_parameters_rejected() {
        assert!(WindowSlicer::new(0, 1).is_err());
        assert!(WindowSlicer::new(1, 0).is_err());
    }
}
