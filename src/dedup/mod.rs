/*! Deduplication

Sentences go through two checks before being accepted:

1. an exact check, using [runiq](https://github.com/whitfin/runiq) on the whitespace-normalized, lowercased sentence,
1. a near-duplicate check, comparing the sentence's [simhash::simhash64] with the fingerprints sharing a band with it in a [NearDuplicateIndex].

A sentence whose similarity with any candidate reaches the threshold is rejected.
Otherwise its fingerprint is indexed and the sentence is accepted.
!*/
pub mod index;
pub mod simhash;

use log::debug;
use runiq::filters::{DigestFilter, Filter as _};

use crate::error::Error;
use crate::filtering::FilterMut;
use crate::text::normalize_space;
pub use index::{ItemId, NearDuplicateIndex, Snapshot};
use simhash::{approx_similarity_from_hamming, hamming64, simhash64, BITS};

/// Default similarity threshold.
pub const DEFAULT_SIMILARITY: f64 = 0.80;

/// Why a sentence was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Duplicate {
    Exact,
    Near { id: ItemId, similarity: f64 },
}

pub struct Deduplicator {
    exact: DigestFilter,
    index: NearDuplicateIndex,
    threshold: f64,
    exhaustive: bool,
}

impl Deduplicator {
    /// Create a deduplicator with an empty index.
    ///
    /// `threshold` is the similarity (in `[0, 1]`) from which a sentence is a near duplicate.
    pub fn new(threshold: f64) -> Result<Self, Error> {
        Self::with_index(NearDuplicateIndex::default(), threshold)
    }

    /// Create a deduplicator on top of an existing (possibly restored) index.
    pub fn with_index(index: NearDuplicateIndex, threshold: f64) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        // Banding only guarantees recall for tiny distances. Once the threshold
        // accepts distances of half the fingerprint or more, every indexed
        // fingerprint may match, so the whole index has to be scanned.
        let max_distance = ((1.0 - threshold) * f64::from(BITS)).floor() as u32;
        let exhaustive = max_distance >= BITS / 2;

        Ok(Self {
            exact: DigestFilter::default(),
            index,
            threshold,
            exhaustive,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn index(&self) -> &NearDuplicateIndex {
        &self.index
    }

    pub fn into_index(self) -> NearDuplicateIndex {
        self.index
    }

    /// Most similar indexed fingerprint reaching the threshold, if any.
    fn find_near(&self, fingerprint: u64) -> Option<Duplicate> {
        let candidates: Box<dyn Iterator<Item = (u64, ItemId)>> = if self.exhaustive {
            Box::new(self.index.iter())
        } else {
            Box::new(self.index.query_candidates(fingerprint).into_iter())
        };

        candidates
            .map(|(candidate, id)| {
                let similarity = approx_similarity_from_hamming(hamming64(fingerprint, candidate));
                (id, similarity)
            })
            .filter(|(_, similarity)| *similarity >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, similarity)| Duplicate::Near { id, similarity })
    }

    /// Checks a sentence against everything accepted so far, and records it if it is new.
    ///
    /// Returns the id of the indexed fingerprint when the sentence is accepted.
    /// Sentences without any token are accepted on the exact check alone and are not indexed,
    /// since their fingerprint (`0`) carries no information.
    pub fn check_and_insert(&mut self, sentence: &str) -> Result<Option<ItemId>, Duplicate> {
        let key = normalize_space(sentence).to_lowercase();
        if !self.exact.detect(key.as_bytes()) {
            return Err(Duplicate::Exact);
        }

        let fingerprint = simhash64(&key);
        if fingerprint == 0 {
            debug!("no token in {:?}, skipping near-duplicate check", sentence);
            return Ok(None);
        }

        if let Some(duplicate) = self.find_near(fingerprint) {
            return Err(duplicate);
        }

        Ok(Some(self.index.add(fingerprint)))
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            exact: DigestFilter::default(),
            index: NearDuplicateIndex::default(),
            threshold: DEFAULT_SIMILARITY,
            exhaustive: false,
        }
    }
}

impl FilterMut<&str> for Deduplicator {
    fn detect_mut(&mut self, sentence: &str) -> bool {
        match self.check_and_insert(sentence) {
            Ok(_) => true,
            Err(duplicate) => {
                debug!("duplicate ({:?}): {:?}", duplicate, sentence);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEWTON: &str = "This course covers classical mechanics, including Newton's laws of motion and energy conservation, taught over a 14-week semester.";
    const BYZANTIUM: &str = "The Byzantine Empire preserved Roman legal traditions in Constantinople until the Ottoman conquest in 1453.";
    const MITOCHONDRION: &str = "The mitochondrion is a double membrane bound organelle found in most eukaryotic organisms, \
        where it generates most of the chemical energy needed to power biochemical reactions, \
        stored in adenosine triphosphate, and it also takes part in signalling, cellular differentiation and cell death.";

    #[test]
    fn exact_duplicate() {
        let mut dedup = Deduplicator::default();
        assert_eq!(dedup.check_and_insert(NEWTON), Ok(Some(0)));
        assert_eq!(dedup.check_and_insert(NEWTON), Err(Duplicate::Exact));
        assert_eq!(dedup.index().len(), 1);
    }

    #[test]
    fn exact_ignores_spacing_and_case() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.detect_mut(NEWTON));
        let shouted = format!("  {}  ", NEWTON.to_uppercase().replace(' ', "\n "));
        assert_eq!(dedup.check_and_insert(&shouted), Err(Duplicate::Exact));
    }

    #[test]
    fn near_duplicate_reordered() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.detect_mut(NEWTON));
        let reordered = "Taught over a 14-week semester, this course covers classical mechanics, including Newton's laws of motion and energy conservation.";
        assert_eq!(
            dedup.check_and_insert(reordered),
            Err(Duplicate::Near {
                id: 0,
                similarity: 1.0
            })
        );
    }

    #[test]
    fn near_duplicate_reworded() {
        // exhaustive scan, so the result does not depend on band collisions
        let mut dedup = Deduplicator::new(0.5).unwrap();
        assert!(dedup.detect_mut(MITOCHONDRION));
        let reworded = MITOCHONDRION.replace("signalling", "messaging");
        match dedup.check_and_insert(&reworded) {
            Err(Duplicate::Near { id, similarity }) => {
                assert_eq!(id, 0);
                assert!(similarity > 0.8, "similarity was {}", similarity);
            }
            other => panic!("expected a near duplicate, got {:?}", other),
        }
    }

    #[test]
    fn unrelated_sentences() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.detect_mut(NEWTON));
        assert!(dedup.detect_mut(BYZANTIUM));
        assert_eq!(dedup.index().len(), 2);
    }

    #[test]
    fn threshold_one_only_rejects_identical_fingerprints() {
        let mut dedup = Deduplicator::new(1.0).unwrap();
        assert!(dedup.detect_mut(MITOCHONDRION));

        // same tokens, different text: exact check passes, fingerprints are equal
        let punctuated = MITOCHONDRION.replace(',', ";");
        assert!(matches!(
            dedup.check_and_insert(&punctuated),
            Err(Duplicate::Near { similarity, .. }) if similarity == 1.0
        ));

        // different fingerprint, even a close one, passes
        let reworded = MITOCHONDRION.replace("signalling", "messaging");
        if simhash64(&reworded.to_lowercase()) != simhash64(&MITOCHONDRION.to_lowercase()) {
            assert!(dedup.detect_mut(&reworded));
        }
    }

    #[test]
    fn threshold_zero_rejects_everything_after_first() {
        let mut dedup = Deduplicator::new(0.0).unwrap();
        assert!(dedup.detect_mut(NEWTON));
        assert!(!dedup.detect_mut(BYZANTIUM));
        assert!(!dedup.detect_mut(MITOCHONDRION));
        assert_eq!(dedup.index().len(), 1);
    }

    #[test]
    fn invalid_threshold() {
        assert!(Deduplicator::new(1.5).is_err());
        assert!(Deduplicator::new(-0.1).is_err());
    }

    #[test]
    fn tokenless_sentences_are_not_indexed() {
        let mut dedup = Deduplicator::default();
        assert_eq!(dedup.check_and_insert("! ? ."), Ok(None));
        assert_eq!(dedup.check_and_insert("1 2 3"), Ok(None));
        assert!(dedup.index().is_empty());
    }

    #[test]
    fn restored_index() {
        let mut first = Deduplicator::default();
        assert!(first.detect_mut(NEWTON));
        let snapshot = first.into_index().snapshot();

        // a new run knows nothing of the exact set, but still finds the fingerprint
        let index = NearDuplicateIndex::from_snapshot(snapshot).unwrap();
        let mut second = Deduplicator::with_index(index, DEFAULT_SIMILARITY).unwrap();
        assert_eq!(
            second.check_and_insert(NEWTON),
            Err(Duplicate::Near {
                id: 0,
                similarity: 1.0
            })
        );
        assert!(second.detect_mut(BYZANTIUM));
        assert_eq!(second.index().len(), 2);
    }
}
