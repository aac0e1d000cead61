//! Length reconciliation between series reported on different schedules.
//!
//! This is the only place a series may change length. Padding always uses an
//! explicit fill value; truncation keeps the most recent days.
//!
//! Tables keyed by date are first cut to start on the main axis' first day
//! (`DailySeries::since`); from there [`pad_reporting_lag`] fits them to the
//! axis length.

use super::value::Value;

/// Which end of a series receives padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

/// Pad `series` with `fill` on `side` up to `target_len`, or keep only its last
/// `target_len` days if it is longer.
pub fn pad(series: &[Value], target_len: usize, fill: Value, side: Side) -> Vec<Value> {
    if series.len() >= target_len {
        return series[series.len() - target_len..].to_vec();
    }

    let missing = target_len - series.len();
    let mut out = Vec::with_capacity(target_len);
    match side {
        Side::Start => {
            out.extend(std::iter::repeat_n(fill, missing));
            out.extend_from_slice(series);
        }
        Side::End => {
            out.extend_from_slice(series);
            out.extend(std::iter::repeat_n(fill, missing));
        }
    }
    out
}

/// Two-stage alignment for a late-starting series published with a fixed lag.
///
/// 1. Right-pad by `lag` days with `lag_fill`, keeping the last known value
///    `lag` days before the end of the axis.
/// 2. Left-pad (or truncate) the result to `target_len` with `start_fill`.
///
/// The order is observable when the series is short: `[5, 10, 15]` with
/// `lag = 2` and `target_len = 6` becomes `[0, 5, 10, 15, -, -]`.
pub fn pad_lagged(
    series: &[Value],
    lag: usize,
    target_len: usize,
    lag_fill: Value,
    start_fill: Value,
) -> Vec<Value> {
    let lagged = pad(series, series.len() + lag, lag_fill, Side::End);
    pad(&lagged, target_len, start_fill, Side::Start)
}

/// Fit a series that starts on the axis' first day to `target_len`, treating
/// the last `lag` days of the axis as not yet reported.
///
/// Days past `target_len - lag` are dropped and the end is padded with `fill`.
pub fn pad_reporting_lag(series: &[Value], lag: usize, target_len: usize, fill: Value) -> Vec<Value> {
    let known = target_len.saturating_sub(lag).min(series.len());
    pad(&series[..known], target_len, fill, Side::End)
}
