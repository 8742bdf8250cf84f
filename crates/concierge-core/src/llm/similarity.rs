//! Cosine similarity and in-process ranking

use crate::error::{ConciergeError, Result};
use crate::knowledge::{KnowledgeEntry, StoredKnowledgeEntry};
use std::cmp::Ordering;

/// Compute cosine similarity between two embeddings
///
/// Accumulates in `f64`. Vectors of different length are an error; a zero
/// norm on either side yields `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(ConciergeError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Score `corpus` against `query` and keep the `k` best
///
/// Entries without an embedding are skipped. Ordering is similarity
/// descending, then id ascending, so equal scores rank deterministically.
pub fn rank_by_similarity(
    query: &[f32],
    corpus: &[StoredKnowledgeEntry],
    k: usize,
) -> Result<Vec<KnowledgeEntry>> {
    let mut scored = Vec::with_capacity(corpus.len());
    for stored in corpus {
        let Some(ref embedding) = stored.embedding else {
            continue;
        };
        let similarity = cosine_similarity(query, embedding)?;
        scored.push(stored.to_entry(similarity));
    }

    scored.sort_by(compare_ranked);
    scored.truncate(k);
    Ok(scored)
}

fn compare_ranked(a: &KnowledgeEntry, b: &KnowledgeEntry) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stored(id: &str, embedding: Option<Vec<f32>>) -> StoredKnowledgeEntry {
        StoredKnowledgeEntry {
            id: id.to_string(),
            title: format!("Title {}", id),
            content: format!("Content {}", id),
            category: "general".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ConciergeError::DimensionMismatch { left: 3, right: 2 }
        ));
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let corpus = vec![
            stored("a", Some(vec![0.0, 1.0])),
            stored("b", Some(vec![1.0, 0.0])),
            stored("c", Some(vec![1.0, 1.0])),
            stored("d", None),
        ];

        let ranked = rank_by_similarity(&[1.0, 0.0], &corpus, 2).unwrap();
        let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(ranked[0].similarity > ranked[1].similarity);
    }

    #[test]
    fn test_rank_breaks_ties_by_id() {
        let corpus = vec![
            stored("zeta", Some(vec![2.0, 0.0])),
            stored("alpha", Some(vec![1.0, 0.0])),
        ];
        let ranked = rank_by_similarity(&[1.0, 0.0], &corpus, 10).unwrap();
        assert_eq!(ranked[0].id, "alpha");
        assert_eq!(ranked[1].id, "zeta");
    }

    #[test]
    fn test_rank_empty_corpus() {
        assert!(rank_by_similarity(&[1.0], &[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_rank_propagates_mismatch() {
        let corpus = vec![stored("a", Some(vec![1.0, 0.0, 0.0]))];
        assert!(rank_by_similarity(&[1.0, 0.0], &corpus, 5).is_err());
    }

    proptest! {
        #[test]
        fn prop_self_similarity_is_one(v in prop::collection::vec(-100.0f32..100.0, 1..64)) {
            prop_assume!(v.iter().any(|x| x.abs() > 1e-3));
            let sim = cosine_similarity(&v, &v).unwrap();
            prop_assert!((sim - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_similarity_is_symmetric_and_bounded(
            pair in (1usize..32).prop_flat_map(|n| (
                prop::collection::vec(-10.0f32..10.0, n),
                prop::collection::vec(-10.0f32..10.0, n),
            ))
        ) {
            let (a, b) = pair;
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            prop_assert!((ab - ba).abs() < 1e-12);
            prop_assert!((-1.0..=1.0).contains(&ab));
        }
    }
}
