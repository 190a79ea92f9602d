/*! Filtering utilities

Filters can operate on sentence or record level.

Filters implement [filter::Filter], [filter::FilterMut] or both:
- [filter::Filter] is implemented for filters that do not have state (see [sentence::Length] for example)
- [filter::FilterMut] is implemented for filters that do have state (see [crate::dedup::Deduplicator], which remembers every sentence it kept).

Sentence-level filters decide whether a sentence is a usable trivia item,
the record-level [license::LicenseFilter] decides whether a harvested record may be used at all.
! */
mod filter;
pub mod license;
pub mod sentence;

pub use filter::Filter;
pub use filter::FilterMut;
pub use license::{LicenseFilter, Verdict};
pub use sentence::Quality;
