//! Banded SimHash index.
//!
//! Fingerprints are cut into contiguous bands (4 bands of 16 bits by default).
//! Each `(band number, band value)` pair is a bucket, and an inserted fingerprint is
//! stored in every one of its buckets. Looking a fingerprint up only compares it with
//! fingerprints sharing at least one band, which finds every fingerprint closer than
//! the number of bands (pigeonhole) and most of the moderately close ones.
//!
//! The index can be saved to and restored from a JSON [Snapshot], so that a build
//! can be checked against items accepted by previous builds.
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::simhash::BITS;
use crate::error::Error;

/// Identifier of an indexed fingerprint, unique within an index (and its snapshots).
pub type ItemId = usize;

/// `(band number, band value)`
type BandKey = (u32, u64);

#[derive(Debug, Clone)]
pub struct NearDuplicateIndex {
    band_bits: u32,
    fingerprints: Vec<u64>,
    buckets: HashMap<BandKey, Vec<ItemId>>,
}

/// Serialized form of a [NearDuplicateIndex].
///
/// Only fingerprints are stored, in insertion order: an item id is its position in the list,
/// and buckets are rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub band_bits: u32,
    pub fingerprints: Vec<u64>,
}

impl NearDuplicateIndex {
    /// Create an empty index with bands of `band_bits` bits.
    ///
    /// `band_bits` has to split 64 bits evenly, with at least 2 bands.
    pub fn with_band_bits(band_bits: u32) -> Result<Self, Error> {
        if band_bits == 0 || band_bits >= BITS || BITS % band_bits != 0 {
            return Err(Error::Config(format!(
                "band width must divide {} and be smaller than it, got {}",
                BITS, band_bits
            )));
        }
        Ok(Self {
            band_bits,
            fingerprints: Vec::new(),
            buckets: HashMap::new(),
        })
    }

    pub fn band_bits(&self) -> u32 {
        self.band_bits
    }

    pub fn nb_bands(&self) -> u32 {
        BITS / self.band_bits
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    fn bands(&self, fingerprint: u64) -> impl Iterator<Item = BandKey> {
        let band_bits = self.band_bits;
        let mask = (1u64 << band_bits) - 1;
        (0..self.nb_bands()).map(move |band| (band, (fingerprint >> (band * band_bits)) & mask))
    }

    /// Insert a fingerprint in all of its buckets, returning its fresh id.
    pub fn add(&mut self, fingerprint: u64) -> ItemId {
        let id = self.fingerprints.len();
        self.fingerprints.push(fingerprint);
        let keys: Vec<BandKey> = self.bands(fingerprint).collect();
        for key in keys {
            self.buckets.entry(key).or_default().push(id);
        }
        id
    }

    /// Fingerprints sharing at least one band with `fingerprint`, each id reported once.
    pub fn query_candidates(&self, fingerprint: u64) -> Vec<(u64, ItemId)> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for key in self.bands(fingerprint) {
            if let Some(ids) = self.buckets.get(&key) {
                for &id in ids {
                    if seen.insert(id) {
                        candidates.push((self.fingerprints[id], id));
                    }
                }
            }
        }
        candidates
    }

    /// Every indexed fingerprint, for callers that need an exhaustive scan.
    pub fn iter(&self) -> impl Iterator<Item = (u64, ItemId)> + '_ {
        self.fingerprints
            .iter()
            .enumerate()
            .map(|(id, fingerprint)| (*fingerprint, id))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            band_bits: self.band_bits,
            fingerprints: self.fingerprints.clone(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, Error> {
        let mut index = Self::with_band_bits(snapshot.band_bits)?;
        for fingerprint in snapshot.fingerprints {
            index.add(fingerprint);
        }
        Ok(index)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, &self.snapshot())?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        Self::from_snapshot(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        debug!("saving {} fingerprints to {:?}", self.len(), path);
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let index = Self::from_reader(BufReader::new(File::open(path)?))?;
        debug!("loaded {} fingerprints from {:?}", index.len(), path);
        Ok(index)
    }
}

impl Default for NearDuplicateIndex {
    /// 4 bands of 16 bits.
    fn default() -> Self {
        Self {
            band_bits: 16,
            fingerprints: Vec::new(),
            buckets: HashMap::new(),
        }
    }
}
