//! Fuzzy name matching for pointer/count field pairing.
//!
//! The ratio is `2 * LCS(a, b) / (len(a) + len(b))`, computed over bytes with
//! a two-row table. `1.0` for identical names, `0.0` for nothing in common.
//! The resolver treats the function as pluggable so callers can swap in their
//! own metric.

/// Signature of a pluggable similarity metric.
pub type SimilarityFn = fn(&str, &str) -> f64;

/// Similarity ratio in `[0.0, 1.0]` based on the longest common subsequence.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_len(a.as_bytes(), b.as_bytes());
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Best candidate with ratio above `floor`, or `None`.
///
/// Comparison is strictly greater-than, so ties keep the earliest candidate.
pub fn closest_match<'a, I>(query: &str, candidates: I, floor: f64, metric: SimilarityFn) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = metric(query, candidate);
        if score < floor {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(name, _)| name)
}
