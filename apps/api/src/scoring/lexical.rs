//! Lexical similarity: TF-IDF cosine between two texts, the stand-in whenever the semantic
//! backend is unavailable.
//!
//! Tokens are lowercase runs of two or more word characters, minus English stop words.
//! IDF is smoothed: `ln((1 + n) / (1 + df)) + 1` over the two-document corpus.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Term frequencies of the non-stop-word tokens of `text`.
pub fn term_counts(text: &str) -> BTreeMap<String, usize> {
    let lowered = text.to_lowercase();
    let mut counts = BTreeMap::new();
    for token in TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()) {
        if !is_stop_word(token) {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// TF-IDF cosine similarity in [0, 1]. Either side empty (after stop words) → 0.
pub fn tfidf_similarity(a: &str, b: &str) -> f64 {
    let tf_a = term_counts(a);
    let tf_b = term_counts(b);
    if tf_a.is_empty() || tf_b.is_empty() {
        return 0.0;
    }

    let vocabulary: BTreeSet<&String> = tf_a.keys().chain(tf_b.keys()).collect();
    let n_docs = 2.0_f64;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for term in vocabulary {
        let count_a = tf_a.get(term).copied().unwrap_or(0) as f64;
        let count_b = tf_b.get(term).copied().unwrap_or(0) as f64;
        let df = [count_a, count_b].iter().filter(|c| **c > 0.0).count() as f64;
        let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;

        let wa = count_a * idf;
        let wb = count_b * idf;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}
