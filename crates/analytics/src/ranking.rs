//! Top-N / bottom-N selection over any computed metric.

use std::cmp::Ordering;

use rust_decimal::Decimal;

/// Orders two optional metric values, undefined values always last.
///
/// Whichever direction is chosen, a row without a value sinks below every
/// row that has one, so an undefined metric can never claim a top or bottom
/// slot.
pub fn compare_metric(a: Option<Decimal>, b: Option<Decimal>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            if ascending {
                x.cmp(&y)
            } else {
                y.cmp(&x)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The first `n` rows under a stable sort by `key`.
///
/// Ties keep their pre-sort order. Fewer than `n` rows returns all of them,
/// never an error.
pub fn top_n<T, F>(rows: &[T], key: F, n: usize, ascending: bool) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<Decimal>,
{
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| compare_metric(key(a), key(b), ascending));
    sorted.truncate(n);
    sorted
}

/// [`top_n`] from the other end: the `n` smallest values first.
pub fn bottom_n<T, F>(rows: &[T], key: F, n: usize) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<Decimal>,
{
    top_n(rows, key, n, true)
}
