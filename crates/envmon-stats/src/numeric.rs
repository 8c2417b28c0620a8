//! Small numeric helpers over slices of readings.

use crate::series::SeriesError;

/// Sum of all values. Zero for an empty slice.
#[must_use]
pub fn sum_values(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Index of the largest value; the first one wins on ties.
///
/// # Errors
///
/// Returns [`SeriesError::EmptyValues`] if `values` is empty.
pub fn max_index(values: &[f64]) -> Result<usize, SeriesError> {
    extreme_index(values, |candidate, best| candidate > best)
}

/// Index of the smallest value; the first one wins on ties.
///
/// # Errors
///
/// Returns [`SeriesError::EmptyValues`] if `values` is empty.
pub fn min_index(values: &[f64]) -> Result<usize, SeriesError> {
    extreme_index(values, |candidate, best| candidate < best)
}

fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Result<usize, SeriesError> {
    let (first, rest) = values.split_first().ok_or(SeriesError::EmptyValues)?;
    let mut best = *first;
    let mut best_index = 0;
    for (i, &v) in rest.iter().enumerate() {
        if better(v, best) {
            best = v;
            best_index = i + 1;
        }
    }
    Ok(best_index)
}

/// Arithmetic mean.
///
/// # Errors
///
/// Returns [`SeriesError::EmptyValues`] if `values` is empty.
pub fn mean_value(values: &[f64]) -> Result<f64, SeriesError> {
    if values.is_empty() {
        return Err(SeriesError::EmptyValues);
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(sum_values(values) / values.len() as f64)
}

/// Number of elements equal to `x`.
#[must_use]
pub fn count_value<T: PartialEq>(values: &[T], x: &T) -> usize {
    values.iter().filter(|v| *v == x).count()
}

/// Median; the mean of the two middle values for an even count.
///
/// # Errors
///
/// Returns [`SeriesError::EmptyValues`] if `values` is empty.
pub fn median_value(values: &[f64]) -> Result<f64, SeriesError> {
    if values.is_empty() {
        return Err(SeriesError::EmptyValues);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Ok(sorted[mid])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_empty_is_zero() {
        assert!(sum_values(&[]).abs() < f64::EPSILON);
        assert!((sum_values(&[1.5, 2.5, -1.0]) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_and_min_index() {
        let values = [3.0, 9.0, -2.0, 9.0, -2.0];
        assert_eq!(max_index(&values).unwrap(), 1);
        assert_eq!(min_index(&values).unwrap(), 2);
    }

    #[test]
    fn single_value_is_both_extremes() {
        assert_eq!(max_index(&[4.0]).unwrap(), 0);
        assert_eq!(min_index(&[4.0]).unwrap(), 0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(max_index(&[]), Err(SeriesError::EmptyValues)));
        assert!(matches!(min_index(&[]), Err(SeriesError::EmptyValues)));
        assert!(matches!(mean_value(&[]), Err(SeriesError::EmptyValues)));
        assert!(matches!(median_value(&[]), Err(SeriesError::EmptyValues)));
    }

    #[test]
    fn mean() {
        assert!((mean_value(&[1.0, 2.0, 3.0, 4.0]).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn median_odd_and_even() {
        assert!((median_value(&[5.0, 1.0, 3.0]).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((median_value(&[4.0, 1.0, 3.0, 2.0]).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn count_matches() {
        assert_eq!(count_value(&[1, 2, 1, 3, 1], &1), 3);
        assert_eq!(count_value(&["a", "b"], &"z"), 0);
    }
}
