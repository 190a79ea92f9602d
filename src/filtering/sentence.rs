//! sentence-level filtering
use lazy_static::lazy_static;
use regex::Regex;

use super::Filter;
use crate::text::normalize_space;

lazy_static! {
    static ref LETTER_RUN: Regex = Regex::new(r"[A-Za-z]{4,}").unwrap();
    static ref PERSONAL_PRONOUN: Regex = Regex::new(r"\b(i|we|you|our|my|your)\b").unwrap();
    static ref COPULA: Regex =
        Regex::new(r"\b(is|are|was|were|refers to|defined as|consists of|includes)\b").unwrap();
    static ref DATE_OR_NUMBER: Regex =
        Regex::new(r"\b(1[6-9]\d{2}|20\d{2}|[0-9]+(\.[0-9]+)?)\b").unwrap();
    static ref PASSIVE_FACT: Regex = Regex::new(
        r"\b(was discovered|was developed|was proposed|was introduced|was first)\b"
    )
    .unwrap();
}

/// Substrings that mark navigation chrome, legal footers and calls to action.
const BOILERPLATE: [&str; 10] = [
    "click",
    "cookie",
    "all rights reserved",
    "terms of use",
    "privacy policy",
    "creativecommons",
    "download",
    "subscribe",
    "log in",
    "sign in",
];

/// Opinion, marketing and call-to-action phrases.
const NOT_FACTUAL: [&str; 23] = [
    "i think",
    "i believe",
    "in my opinion",
    "we think",
    "we believe",
    "you should",
    "we should",
    "should consider",
    "must",
    "let's",
    "amazing",
    "awesome",
    "wonderful",
    "terrible",
    "great!",
    "best",
    "worst",
    "join us",
    "sign up",
    "subscribe",
    "learn more",
    "click here",
    "watch",
];

/// Bounded length filter, in unicode codepoints.
///
/// Keeps sentences whose length is within `min_size..=max_size`.
/// Defaults to `60..=280`: shorter sentences rarely carry a fact, longer ones
/// do not fit in an embed field.
#[derive(Debug, Clone)]
pub struct Length {
    min_size: usize,
    max_size: usize,
}

impl Length {
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self { min_size, max_size }
    }

    /// Get a reference to the length's min size.
    pub fn min_size(&self) -> &usize {
        &self.min_size
    }

    /// Get a reference to the length's max size.
    pub fn max_size(&self) -> &usize {
        &self.max_size
    }
}

impl Filter<&str> for Length {
    fn detect(&self, sentence: &str) -> bool {
        let count = sentence.chars().count();
        count >= self.min_size && count <= self.max_size
    }
}

impl Default for Length {
    fn default() -> Self {
        Length::new(60, 280)
    }
}

/// Rejects sentences containing any of the (lowercase) boilerplate terms.
#[derive(Debug, Clone)]
pub struct Boilerplate {
    terms: Vec<String>,
}

impl Boilerplate {
    pub fn new(terms: Vec<String>) -> Self {
        Self {
            terms: terms.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

impl Filter<&str> for Boilerplate {
    fn detect(&self, sentence: &str) -> bool {
        let low = sentence.to_lowercase();
        !self.terms.iter().any(|term| low.contains(term.as_str()))
    }
}

impl Default for Boilerplate {
    fn default() -> Self {
        Self::new(BOILERPLATE.iter().map(|t| t.to_string()).collect())
    }
}

/// Requires at least one run of 4 or more ASCII letters.
///
/// Rules out numeric tables, identifiers and code fragments.
#[derive(Debug, Clone, Default)]
pub struct LetterRun;

impl Filter<&str> for LetterRun {
    fn detect(&self, sentence: &str) -> bool {
        LETTER_RUN.is_match(sentence)
    }
}

/// Conservative "factual tone" filter.
///
/// Rejects opinions, marketing, calls to action, questions, exclamations and
/// sentences written in the first or second person. What remains must either
/// contain a copula/definitional verb, a number or year, or a passive
/// "was discovered/developed/..." construction.
#[derive(Debug, Clone, Default)]
pub struct Factual;

impl Filter<&str> for Factual {
    fn detect(&self, sentence: &str) -> bool {
        let low = sentence.to_lowercase();
        if NOT_FACTUAL.iter().any(|phrase| low.contains(phrase)) {
            return false;
        }
        if sentence.contains('?') || sentence.contains('!') {
            return false;
        }
        if PERSONAL_PRONOUN.is_match(&low) {
            return false;
        }

        COPULA.is_match(&low) || DATE_OR_NUMBER.is_match(sentence) || PASSIVE_FACT.is_match(&low)
    }
}

/// Sentence quality gate used before a sentence can become a pool item.
///
/// Runs on the whitespace-normalized sentence and combines [Length],
/// [Boilerplate] and [LetterRun], plus [Factual] when built with
/// [Quality::factual_only].
#[derive(Debug, Clone, Default)]
pub struct Quality {
    length: Length,
    boilerplate: Boilerplate,
    letters: LetterRun,
    factual: Option<Factual>,
}

impl Quality {
    pub fn new(length: Length, boilerplate: Boilerplate, factual_only: bool) -> Self {
        Self {
            length,
            boilerplate,
            letters: LetterRun,
            factual: factual_only.then_some(Factual),
        }
    }

    /// Default quality gate with the factual tone filter enabled.
    pub fn factual_only() -> Self {
        Self::new(Length::default(), Boilerplate::default(), true)
    }
}

impl Filter<&str> for Quality {
    fn detect(&self, sentence: &str) -> bool {
        let sentence = normalize_space(sentence);
        let sentence = sentence.as_str();

        self.length.detect(sentence)
            && self.boilerplate.detect(sentence)
            && self.letters.detect(sentence)
            && self
                .factual
                .as_ref()
                .map_or(true, |factual| factual.detect(sentence))
    }
}
