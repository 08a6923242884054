//! Cosine-similarity ranking of categories against query vectors

use std::cmp::Ordering;

use super::RegistrySnapshot;
use crate::domain::DomainError;
use crate::domain::embedding::{dot, is_finite, normalize};

/// Returns, for each query vector in input order, the names of the `n` most
/// similar categories, best first.
///
/// Ties are broken by registry row order. `n` larger than the registry is
/// clamped to the registry size.
pub fn top_n(
    snapshot: &RegistrySnapshot,
    queries: &[Vec<f32>],
    n: usize,
) -> Result<Vec<Vec<String>>, DomainError> {
    if snapshot.is_empty() {
        return Err(DomainError::RegistryNotInitialized);
    }

    if queries.is_empty() {
        return Err(DomainError::invalid_argument("No query vectors provided"));
    }

    queries
        .iter()
        .map(|query| {
            let ranked = rank(snapshot, query, n)?;
            Ok(ranked
                .into_iter()
                .map(|(index, _)| snapshot.names()[index].clone())
                .collect())
        })
        .collect()
}

/// Scores every category against one query and returns the best `n`
/// as `(row index, similarity)` pairs, best first.
pub(crate) fn rank(
    snapshot: &RegistrySnapshot,
    query: &[f32],
    n: usize,
) -> Result<Vec<(usize, f32)>, DomainError> {
    if snapshot.is_empty() {
        return Err(DomainError::RegistryNotInitialized);
    }

    if n == 0 {
        return Err(DomainError::invalid_argument("n must be a positive integer"));
    }

    if query.len() != snapshot.dimensions() {
        return Err(DomainError::dimension_mismatch(
            snapshot.dimensions(),
            query.len(),
        ));
    }

    if !is_finite(query) {
        return Err(DomainError::invalid_argument(
            "Query vector has non-finite components",
        ));
    }

    let query = normalize(query);
    let mut scored: Vec<(usize, f32)> = (0..snapshot.len())
        .filter_map(|index| {
            snapshot
                .normalized_row(index)
                .map(|row| (index, dot(&query, row)))
        })
        .collect();

    // Scores are finite here; the index comparison keeps equal scores in row order.
    scored.sort_by(|(ia, sa), (ib, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then(ia.cmp(ib))
    });
    scored.truncate(n);

    Ok(scored)
}
