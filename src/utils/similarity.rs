//! Fuzzy string scores on a 0-100 scale.
//!
//! Scores are Indel ratios: `2 * LCS / (len_a + len_b) * 100`, where LCS is
//! the longest common subsequence in characters. Thresholds used by the
//! verifier (90 title, 70 fallback, 80 author) are calibrated for it.

/// Lowercase, fold all whitespace runs to one space and trim
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Length of the longest common subsequence of `a` and `b`
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &x in a {
        for (j, &y) in b.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Whole-string similarity between `a` and `b`
///
/// Two empty strings are identical (100). One empty string against a
/// non-empty one scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_ratio(&a, &b)
}

/// Best similarity of the shorter string against any equally long window
/// of the longer one
///
/// Scores 0 when either side is empty.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let score = indel_ratio(&short, window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Title similarity, insensitive to case and whitespace layout
pub fn title_similarity(a: &str, b: &str) -> f64 {
    ratio(&normalize(a), &normalize(b))
}

/// Author similarity, insensitive to case and whitespace layout
pub fn author_similarity(a: &str, b: &str) -> f64 {
    partial_ratio(&normalize(a), &normalize(b))
}

/// Round a score to two decimals for stable report output
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
