//! "Worst-N" selection.

use std::cmp::Ordering;

/// Keys of the `n` highest scores, highest first.
///
/// Missing or non-finite scores sort after every present score; equal
/// scores are ordered by key so the result is deterministic.
pub fn top_n<K, I>(scores: I, n: usize) -> Vec<K>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut scored: Vec<(K, Option<f64>)> = scores
        .into_iter()
        .map(|(key, score)| (key, score.filter(|s| s.is_finite())))
        .collect();

    scored.sort_by(|(ka, a), (kb, b)| match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(a).then_with(|| ka.cmp(kb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => ka.cmp(kb),
    });

    scored.into_iter().take(n).map(|(key, _)| key).collect()
}
