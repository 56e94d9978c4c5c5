//! Partial-ratio fuzzy similarity between a short alias and a longer text.
//!
//! The alias is compared against windows of the text that start at a word boundary and are
//! one char shorter, equal to, or one char longer than the alias, using normalised Levenshtein
//! similarity. Windows must also end at a word boundary, so `java` never aligns inside
//! `javascript`, unless the rest of the word is an inflection suffix such as `-s` or `-ing`.
//! Such a hit spans the whole inflected word. The best window wins; ties go to the
//! earliest window so results are stable.

/// Best-scoring window of the haystack. Offsets are byte offsets into the haystack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyHit {
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// Lowercased chars paired with their byte offset in the source text.
fn lowered(text: &str) -> Vec<(usize, char)> {
    text.char_indices()
        .map(|(i, c)| (i, c.to_lowercase().next().unwrap_or(c)))
        .collect()
}

/// Word endings that may follow an aligned window without breaking the word-boundary rule.
const INFLECTION_SUFFIXES: &[&str] = &["s", "es", "ed", "ing"];

/// Index just past the alphanumeric run starting at `from`.
fn word_end(hay: &[(usize, char)], from: usize) -> usize {
    hay[from..]
        .iter()
        .position(|(_, c)| !c.is_alphanumeric())
        .map_or(hay.len(), |offset| from + offset)
}

/// Where a window ending at `end` may close: `end` itself on a word boundary, or the end of
/// the word when only an inflection suffix remains.
fn aligned_end(hay: &[(usize, char)], end: usize) -> Option<usize> {
    if end == hay.len() || !hay[end].1.is_alphanumeric() {
        return Some(end);
    }
    let stop = word_end(hay, end);
    let rest: String = hay[end..stop].iter().map(|(_, c)| *c).collect();
    INFLECTION_SUFFIXES.contains(&rest.as_str()).then_some(stop)
}

fn window_lengths(needle_len: usize) -> impl Iterator<Item = usize> {
    [Some(needle_len), needle_len.checked_sub(1).filter(|l| *l > 0), Some(needle_len + 1)]
        .into_iter()
        .flatten()
}

/// Similarity in [0, 1] of `needle` against its best-aligned window in `haystack`.
/// Returns `None` when either side is empty or no window aligns on word boundaries.
pub fn partial_ratio(needle: &str, haystack: &str) -> Option<FuzzyHit> {
    let needle: String = needle.trim().to_lowercase();
    let needle_len = needle.chars().count();
    let hay = lowered(haystack);
    if needle_len == 0 || hay.is_empty() {
        return None;
    }

    let byte_end = |idx: usize| hay.get(idx).map(|(b, _)| *b).unwrap_or(haystack.len());

    if hay.len() <= needle_len {
        let whole: String = hay.iter().map(|(_, c)| *c).collect();
        return Some(FuzzyHit {
            score: strsim::normalized_levenshtein(&needle, &whole),
            start: 0,
            end: haystack.len(),
        });
    }

    let mut best: Option<FuzzyHit> = None;
    for start in 0..hay.len() {
        let at_word_start = hay[start].1.is_alphanumeric()
            && (start == 0 || !hay[start - 1].1.is_alphanumeric());
        if !at_word_start {
            continue;
        }
        for len in window_lengths(needle_len) {
            let end = (start + len).min(hay.len());
            let Some(hit_end) = aligned_end(&hay, end) else {
                continue;
            };
            let window: String = hay[start..end].iter().map(|(_, c)| *c).collect();
            let score = strsim::normalized_levenshtein(&needle, &window);

            if best.map_or(true, |b| score > b.score) {
                best = Some(FuzzyHit {
                    score,
                    start: hay[start].0,
                    end: byte_end(hit_end),
                });
            }
        }
        if best.is_some_and(|b| b.score >= 1.0) {
            break;
        }
    }
    best
}
