//! Text utilities.
//!
//! Turns harvested text blobs (course descriptions, dataset abstracts) into
//! sentence-sized trivia candidates. Segmentation is a punctuation heuristic,
//! not a linguistic one.
use itertools::Itertools;

use crate::filtering::{Filter, Quality};

/// Collapses every whitespace run into a single space and trims both ends.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// A sentence boundary is a `.`, `!` or `?` followed by whitespace and then by
/// an uppercase ASCII letter, a digit or an opening bracket.
fn opens_sentence(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '(' || c == '['
}

/// Splits text into sentences, preserving source order.
///
/// Input is whitespace-normalized first, so the only whitespace left between
/// two sentences is a single space, which is dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = normalize_space(text);
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c == ' ' {
            let ends_sentence = matches!(prev, Some('.' | '!' | '?'));
            let next_opens = chars.peek().map_or(false, |(_, next)| opens_sentence(*next));
            if ends_sentence && next_opens {
                sentences.push(text[start..idx].to_string());
                start = idx + c.len_utf8();
            }
        }
        prev = Some(c);
    }
    sentences.push(text[start..].to_string());

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Returns whether a sentence passes the default [Quality] gate.
pub fn is_good_sentence(text: &str) -> bool {
    Quality::default().detect(text)
}

/// Splits `text` and keeps at most `max_sentences` sentences passing the default [Quality] gate.
pub fn pick_best_sentences(text: &str, max_sentences: usize) -> Vec<String> {
    pick_sentences_with(text, max_sentences, &Quality::default())
}

/// Same as [pick_best_sentences] with a custom quality gate.
///
/// The gate runs before truncation, so a stricter gate does not waste slots
/// on sentences it would reject.
pub fn pick_sentences_with(text: &str, max_sentences: usize, quality: &Quality) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|sentence| quality.detect(sentence.as_str()))
        .take(max_sentences)
        .collect()
}
