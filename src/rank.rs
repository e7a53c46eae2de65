//! Maximal-marginal-relevance selection.
//!
//! Reduces near-duplicate overlap in retrieval results by iteratively
//! picking, from a similarity-ranked candidate pool, the candidate that
//! maximizes `lambda * sim(query, c) - (1 - lambda) * max sim(c, selected)`
//! until `k` are chosen or the pool is exhausted.

use crate::embedding::cosine_similarity;

/// A retrieval candidate: its position in the caller's result set plus
/// its embedding vector.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub index: usize,
    pub vector: Vec<f32>,
}

/// Select up to `k` diverse candidates, returning their `index` values in
/// selection order. `lambda` is clamped to `[0.0, 1.0]`.
pub fn mmr_select(query: &[f32], candidates: &[Candidate], k: usize, lambda: f32) -> Vec<usize> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let k = k.min(candidates.len());

    let mut selected: Vec<&Candidate> = Vec::with_capacity(k);
    let mut remaining: Vec<&Candidate> = candidates.iter().collect();

    for _ in 0..k {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let relevance = cosine_similarity(query, &candidate.vector);

            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&candidate.vector, &s.vector))
                .fold(0.0f32, f32::max);

            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected.into_iter().map(|c| c.index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, vector: Vec<f32>) -> Candidate {
        Candidate { index, vector }
    }

    #[test]
    fn test_empty_pool() {
        let query = vec![1.0, 0.0];
        assert!(mmr_select(&query, &[], 3, 0.5).is_empty());
    }

    #[test]
    fn test_k_zero() {
        let query = vec![1.0, 0.0];
        let pool = vec![candidate(0, vec![1.0, 0.0])];
        assert!(mmr_select(&query, &pool, 0, 0.5).is_empty());
    }

    #[test]
    fn test_k_larger_than_pool() {
        let query = vec![1.0, 0.0];
        let pool = vec![candidate(0, vec![1.0, 0.0]), candidate(1, vec![0.0, 1.0])];
        assert_eq!(mmr_select(&query, &pool, 10, 0.5).len(), 2);
    }

    #[test]
    fn test_pure_relevance_preserves_similarity_order() {
        let query = vec![1.0, 0.0];
        let pool = vec![
            candidate(0, vec![0.9, 0.1]),
            candidate(1, vec![0.5, 0.5]),
            candidate(2, vec![0.99, 0.01]),
        ];
        let picked = mmr_select(&query, &pool, 3, 1.0);
        assert_eq!(picked, vec![2, 0, 1]);
    }

    #[test]
    fn test_diversity_avoids_near_duplicates() {
        let query = vec![1.0, 0.0, 0.0];
        let pool = vec![
            candidate(0, vec![0.99, 0.01, 0.0]),
            candidate(1, vec![0.98, 0.02, 0.0]), // near-duplicate of 0
            candidate(2, vec![0.0, 0.0, 1.0]),   // orthogonal
        ];
        let picked = mmr_select(&query, &pool, 2, 0.5);
        assert_eq!(picked[0], 0);
        assert_eq!(picked[1], 2, "should prefer the diverse candidate");
    }

    #[test]
    fn test_distinct_chunks_beat_duplicate_pool() {
        // Ten near-duplicates of one vector plus three distinct vectors;
        // k=3 diversified must return the three distinct ones. The
        // duplicates sit close to the top pick, so their redundancy
        // penalty exceeds their relevance edge.
        let query = vec![1.0, 0.0, 0.0, 0.0];
        let mut pool = Vec::new();
        for i in 0..10 {
            let wobble = 1e-4 * i as f32;
            pool.push(candidate(i, vec![0.88, 0.47497 + wobble, 0.0, 0.0]));
        }
        pool.push(candidate(10, vec![0.9, 0.43589, 0.0, 0.0]));
        pool.push(candidate(11, vec![0.8, 0.0, 0.6, 0.0]));
        pool.push(candidate(12, vec![0.8, 0.0, 0.0, 0.6]));

        let picked = mmr_select(&query, &pool, 3, 0.5);
        let mut got: Vec<usize> = picked.clone();
        got.sort_unstable();
        assert_eq!(got, vec![10, 11, 12], "picked: {:?}", picked);
    }

    #[test]
    fn test_identical_vectors_still_fill_k() {
        let query = vec![1.0, 0.0];
        let pool = vec![
            candidate(0, vec![1.0, 0.0]),
            candidate(1, vec![1.0, 0.0]),
            candidate(2, vec![1.0, 0.0]),
        ];
        assert_eq!(mmr_select(&query, &pool, 3, 0.5).len(), 3);
    }

    #[test]
    fn test_lambda_clamped() {
        let query = vec![1.0, 0.0];
        let pool = vec![candidate(0, vec![1.0, 0.0]), candidate(1, vec![0.0, 1.0])];
        // Out-of-range lambda behaves like its clamped value
        assert_eq!(
            mmr_select(&query, &pool, 2, 7.5),
            mmr_select(&query, &pool, 2, 1.0)
        );
    }
}
