//! Rolling windows and per-value arithmetic over daily series.
//!
//! Missing observations are `None` throughout. A window containing a missing
//! value produces no average, matching how the upstream tables treat blanks.

/// Multiplier for per-capita figures (cases per 100,000 people).
pub const PER_CAPITA_SCALE: f64 = 100_000.0;

/// Trailing mean over `window` values.
///
/// The first `window - 1` positions are `None`, as is any position whose
/// window holds a missing value.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .try_fold(0.0, |sum, v| v.map(|v| sum + v))
                .map(|sum| sum / window as f64)
        })
        .collect()
}

/// Ratio of two rolling means.
///
/// Averaging numerator and denominator separately keeps a single noisy day
/// from dominating the rate.
pub fn rolling_ratio(
    numerator: &[Option<f64>],
    denominator: &[Option<f64>],
    window: usize,
) -> Vec<Option<f64>> {
    let num = rolling_mean(numerator, window);
    let den = rolling_mean(denominator, window);
    num.into_iter().zip(den).map(|(n, d)| ratio(n, d)).collect()
}

/// `numerator / denominator`, or `None` when either is missing or the
/// denominator is zero.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Scale `value` to a per-100,000 rate for `population`.
pub fn per_capita(value: Option<f64>, population: Option<f64>) -> Option<f64> {
    match population {
        Some(p) if p > 0.0 => value.map(|v| v * PER_CAPITA_SCALE / p),
        _ => None,
    }
}

/// First difference; turns cumulative totals into daily increments.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut previous = None;
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(match (previous, *value) {
                (Some(p), Some(v)) => Some(v - p),
                _ => None,
            });
        }
        previous = *value;
    }
    out
}

/// Largest finite value, used for `[0, max]` axis domains.
pub fn max_value<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
}
