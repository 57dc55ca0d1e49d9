use std::collections::BTreeSet;

/// Fraction of the query's tokens that appear in the candidate set.
///
/// The measure is deliberately asymmetric: a candidate that covers the whole
/// query scores 1.0 no matter how many other tokens it contains, so long FAQ
/// answers are never penalized. An empty query never matches anything and
/// scores 0.0.
pub fn relevance(query: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let overlap = query.intersection(candidate).count();
    overlap as f64 / query.len() as f64
}
