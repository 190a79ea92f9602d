//! Trivia pool builder.
//!
//! Sources are harvested one after the other, until the pool reaches its target size
//! or every source has been processed.
//!
//! # Processing
//! 1. Each source fetches its records. A source failing to do so is logged and skipped.
//! 1. Each record goes through the source's required license check, then the global [LicenseFilter].
//!    Rejected records are skipped.
//! 1. Up to `max_sentences` sentences passing the [Quality] gate are extracted from the record's text.
//! 1. Each sentence goes through the [Deduplicator], shared by every source.
//!    Accepted sentences become pool items, attributed to the source and record they come from.
//!
//! The run is sequential: there is no concurrent request, so no provider is ever hammered.
use log::{debug, error, info};

use crate::config::{LicenseWhitelist, SourceConfig};
use crate::dedup::{Deduplicator, NearDuplicateIndex, DEFAULT_SIMILARITY};
use crate::error::Error;
use crate::filtering::sentence::{Boilerplate, Length};
use crate::filtering::{LicenseFilter, Quality, Verdict};
use crate::io::{Pool, PoolItem};
use crate::pipeline::Pipeline;
use crate::sources::{HttpClient, RawRecord, Source};
use crate::text::{normalize_space, pick_sentences_with};

pub const DEFAULT_TARGET: usize = 1200;
pub const DEFAULT_MAX_SENTENCES: usize = 2;

/// What happened to a source during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub id: String,
    pub fetched: usize,
    pub license_rejected: usize,
    pub duplicates: usize,
    pub accepted: usize,
    /// set when the source could not be fetched
    pub error: Option<String>,
}

/// Result of a build: the pool, the index it was deduplicated against, and per-source reports.
#[derive(Debug)]
pub struct BuildResult {
    pub pool: Pool,
    pub index: NearDuplicateIndex,
    pub reports: Vec<SourceReport>,
}

/// License an accepted record is published under.
///
/// A record let in by its source's declared license carries that license,
/// whatever its own rights text says.
fn license_label(record: &RawRecord, verdict: Verdict) -> String {
    match (verdict, record.declared_license.as_deref()) {
        (Verdict::DeclaredLicense, Some(declared)) => normalize_space(declared),
        _ => record.license_label(),
    }
}

pub struct PoolBuilder {
    sources: Vec<Source>,
    license: LicenseFilter,
    quality: Quality,
    similarity: f64,
    target: usize,
    max_sentences: usize,
    index: Option<NearDuplicateIndex>,
}

impl PoolBuilder {
    /// Builder over already constructed sources, with the default license whitelist and settings.
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources,
            license: LicenseFilter::default(),
            quality: Quality::default(),
            similarity: DEFAULT_SIMILARITY,
            target: DEFAULT_TARGET,
            max_sentences: DEFAULT_MAX_SENTENCES,
            index: None,
        }
    }

    /// Builder over configured sources, all sharing `client`.
    pub fn from_config(configs: &[SourceConfig], client: &HttpClient) -> Result<Self, Error> {
        let sources = configs
            .iter()
            .map(|config| Source::from_config(config, client))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sources))
    }

    pub fn with_whitelist(mut self, whitelist: &LicenseWhitelist) -> Self {
        self.license = LicenseFilter::new(whitelist);
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    /// Similarity threshold of the near-duplicate check, within `[0, 1]`.
    pub fn with_similarity(mut self, similarity: f64) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&similarity) {
            return Err(Error::Config(format!(
                "similarity must be within [0, 1], got {}",
                similarity
            )));
        }
        self.similarity = similarity;
        Ok(self)
    }

    pub fn with_max_sentences(mut self, max_sentences: usize) -> Self {
        self.max_sentences = max_sentences;
        self
    }

    pub fn with_factual_only(mut self, factual_only: bool) -> Self {
        self.quality = Quality::new(Length::default(), Boilerplate::default(), factual_only);
        self
    }

    /// Deduplicate against fingerprints accepted by a previous build.
    pub fn with_index(mut self, index: NearDuplicateIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Process the records of a source, adding accepted sentences to `items` until the target is reached.
    fn process_records(
        &self,
        source: &Source,
        records: Vec<RawRecord>,
        dedup: &mut Deduplicator,
        items: &mut Vec<PoolItem>,
        report: &mut SourceReport,
    ) {
        for record in records {
            if items.len() >= self.target {
                return;
            }

            if !source.has_required_license(&record) {
                debug!("[{}] required license missing: {:?}", source.id(), record.rights);
                report.license_rejected += 1;
                continue;
            }

            let verdict = self
                .license
                .classify(&record.rights, record.declared_license.as_deref());
            if !verdict.is_accepted() {
                debug!(
                    "[{}] license rejected ({:?}): {:?} {:?}",
                    source.id(),
                    verdict,
                    record.rights,
                    record.url
                );
                report.license_rejected += 1;
                continue;
            }

            let license = license_label(&record, verdict);
            for sentence in pick_sentences_with(&record.text, self.max_sentences, &self.quality) {
                match dedup.check_and_insert(&sentence) {
                    Ok(_) => {
                        report.accepted += 1;
                        items.push(PoolItem {
                            text: sentence,
                            source_org: source.org().to_string(),
                            source_title: record.title.clone(),
                            source_url: record.url.clone(),
                            license: license.clone(),
                        });
                        if items.len() >= self.target {
                            return;
                        }
                    }
                    Err(duplicate) => {
                        debug!("[{}] {:?}: {:?}", source.id(), duplicate, sentence);
                        report.duplicates += 1;
                    }
                }
            }
        }
    }
}

impl Pipeline<BuildResult> for PoolBuilder {
    fn run(&self) -> Result<BuildResult, Error> {
        let index = self.index.clone().unwrap_or_default();
        let mut dedup = Deduplicator::with_index(index, self.similarity)?;
        let mut items = Vec::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            if items.len() >= self.target {
                info!("target of {} items reached", self.target);
                break;
            }

            let mut report = SourceReport {
                id: source.id().to_string(),
                ..Default::default()
            };

            println!("[{}] harvesting", source.id());
            match source.fetch() {
                Ok(records) => {
                    report.fetched = records.len();
                    println!("[{}] {} records fetched", source.id(), records.len());
                    self.process_records(source, records, &mut dedup, &mut items, &mut report);
                    println!(
                        "[{}] +{} items ({}/{})",
                        source.id(),
                        report.accepted,
                        items.len(),
                        self.target
                    );
                    info!(
                        "[{}] {} license rejections, {} duplicates",
                        source.id(),
                        report.license_rejected,
                        report.duplicates
                    );
                }
                Err(e) => {
                    error!("[{}] could not fetch records: {:?}", source.id(), e);
                    report.error = Some(format!("{:?}", e));
                }
            }
            reports.push(report);
        }

        Ok(BuildResult {
            pool: Pool::new(items, self.target),
            index: dedup.into_index(),
            reports,
        })
    }
}
