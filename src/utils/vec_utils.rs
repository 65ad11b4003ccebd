// Helpers for Vec<Option<T>> columns while a price series is being assembled

pub fn has_any_none_elements<T>(vec: &[Option<T>]) -> bool {
    vec.iter().any(Option::is_none)
}

/// Percentage (0..100) of elements that are None
pub fn count_pct_none_elements<T>(vec: &[Option<T>]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    let none_count = vec.iter().filter(|v| v.is_none()).count();
    none_count as f64 * 100.0 / vec.len() as f64
}

/// Index just after the last None (0 if there is none), i.e. where the gap-free tail starts
pub fn find_last_none_index<T>(vec: &[Option<T>]) -> usize {
    vec.iter().rposition(Option::is_none).map_or(0, |i| i + 1)
}

/// Replace every None with the previous Some value (or `default` before the first one).
/// Returns how many elements were filled.
pub fn fill_forward_mut<T: Copy>(vec: &mut [Option<T>], default: T) -> u32 {
    let mut last = default;
    let mut filled = 0;
    for slot in vec.iter_mut() {
        match slot {
            Some(value) => last = *value,
            None => {
                *slot = Some(last);
                filled += 1;
            }
        }
    }
    filled
}

pub fn are_all_elements_same<T: PartialEq>(vec: &[T]) -> bool {
    vec.windows(2).all(|w| w[0] == w[1])
}
