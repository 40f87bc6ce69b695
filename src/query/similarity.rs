//! Fuzzy token similarity between feature text and flow steps.
//!
//! Tokens are compared with Jaro-Winkler so inflected forms still match
//! (`sending` against `send` scores about 0.91). Pairs below
//! [`TOKEN_MATCH_CUTOFF`] count as no match at all.

use strsim::jaro_winkler;

pub const TOKEN_MATCH_CUTOFF: f64 = 0.85;

const COVERAGE_WEIGHT: f64 = 0.7;
const ORDER_WEIGHT: f64 = 0.3;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "i", "in", "into",
    "is", "it", "its", "let", "me", "my", "of", "on", "or", "our", "so", "that", "the", "their",
    "them", "then", "this", "to", "we", "with", "you", "your",
];

/// Lowercased alphanumeric words, without stopwords
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Similarity of two tokens in [0, 1]; 0 below the cut-off
pub fn token_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let score = jaro_winkler(a, b);
    if score >= TOKEN_MATCH_CUTOFF {
        score
    } else {
        0.0
    }
}

/// Best match of `token` among `candidates`: (score, position). The earliest
/// position wins ties.
fn best_match(token: &str, candidates: &[(usize, String)]) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (position, candidate) in candidates {
        let score = token_similarity(token, candidate);
        if score > 0.0 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, *position));
        }
    }
    best
}

/// Mean best-match score of the query tokens against the candidate tokens
pub fn token_coverage(query: &[String], candidates: &[String]) -> f64 {
    if query.is_empty() || candidates.is_empty() {
        return 0.0;
    }
    let indexed: Vec<(usize, String)> = candidates.iter().cloned().enumerate().collect();
    let total: f64 = query
        .iter()
        .filter_map(|q| best_match(q, &indexed))
        .map(|(score, _)| score)
        .sum();
    (total / query.len() as f64).clamp(0.0, 1.0)
}

/// Fraction of consecutive matched positions that do not go backwards
fn order_agreement(positions: &[usize]) -> f64 {
    match positions.len() {
        0 => 0.0,
        1 => 1.0,
        n => {
            let agreeing = positions.windows(2).filter(|w| w[0] <= w[1]).count();
            agreeing as f64 / (n - 1) as f64
        }
    }
}

/// Similarity of an ordered token sequence to an ordered list of steps.
///
/// `0.7 * coverage + 0.3 * order`, where coverage is the mean best-match
/// score of each query token over all step tokens and order rewards query
/// tokens whose matches appear in step order.
pub fn sequence_similarity(query: &[String], steps: &[&str]) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let step_tokens: Vec<(usize, String)> = steps
        .iter()
        .enumerate()
        .flat_map(|(position, step)| {
            tokenize(step)
                .into_iter()
                .map(move |token| (position, token))
        })
        .collect();

    if step_tokens.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut positions = Vec::new();
    for token in query {
        if let Some((score, position)) = best_match(token, &step_tokens) {
            total += score;
            positions.push(position);
        }
    }

    if positions.is_empty() {
        return 0.0;
    }

    let coverage = total / query.len() as f64;
    (COVERAGE_WEIGHT * coverage + ORDER_WEIGHT * order_agreement(&positions)).clamp(0.0, 1.0)
}
