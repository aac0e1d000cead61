//! Cumulative counters to daily increments and back.

use super::value::{Value, combine};

/// Daily increments of a cumulative counter.
///
/// The output has the input's length; day 0 is `0` (there is no prior day).
/// Negative increments (report corrections) are passed through.
pub fn difference(counter: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(counter.len());
    if counter.is_empty() {
        return out;
    }
    out.push(Some(0.0));
    out.extend(
        counter
            .windows(2)
            .map(|w| combine(w[1], w[0], |cur, prev| cur - prev)),
    );
    out
}

/// Running total; a missing day makes every later total missing.
pub fn cumsum(increments: &[Value]) -> Vec<Value> {
    let mut total = Some(0.0);
    increments
        .iter()
        .map(|v| {
            total = combine(total, *v, |a, b| a + b);
            total
        })
        .collect()
}
