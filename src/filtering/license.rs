//! Record-level license gate.
//!
//! Decides whether a harvested record's declared rights allow it into an
//! openly redistributable pool. The gate is default-deny: a record is only kept
//! when some evidence of an open license is found.
//!
//! Decision order (first match wins):
//! 1. a source-declared license URL matching an allowed pattern accepts, whatever the record says,
//! 1. rights matching a blocked pattern reject,
//! 1. rights matching an explicit allowlist entry accept,
//! 1. rights containing a Creative Commons license or public domain URL accept,
//! 1. rights matching an allowed pattern accept,
//! 1. anything else is rejected.
//!
//! Every comparison is a case-insensitive substring match.
use log::debug;

use super::Filter;
use crate::config::LicenseWhitelist;
use crate::sources::RawRecord;

/// URL signatures of Creative Commons licenses and public domain tools.
const CC_URL_SIGNATURES: [&str; 2] = [
    "creativecommons.org/licenses/",
    "creativecommons.org/publicdomain/",
];

/// Outcome of a license check, with the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    DeclaredLicense,
    Blocked,
    Allowlisted,
    CreativeCommonsUrl,
    AllowedPattern,
    NoEvidence,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            Verdict::DeclaredLicense
                | Verdict::Allowlisted
                | Verdict::CreativeCommonsUrl
                | Verdict::AllowedPattern
        )
    }
}

#[derive(Debug, Clone)]
pub struct LicenseFilter {
    allow: Vec<String>,
    allowed_patterns: Vec<String>,
    blocked_patterns: Vec<String>,
}

fn lowercased(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn matches_any(haystack: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| haystack.contains(p.as_str()))
}

impl LicenseFilter {
    pub fn new(whitelist: &LicenseWhitelist) -> Self {
        Self {
            allow: lowercased(&whitelist.allow),
            allowed_patterns: lowercased(&whitelist.allowed_license_patterns),
            blocked_patterns: lowercased(&whitelist.blocked_license_patterns),
        }
    }

    /// Classify a record's rights text, optionally backed by a license URL the source declares for its whole catalog.
    pub fn classify(&self, rights: &str, declared_license_url: Option<&str>) -> Verdict {
        if let Some(declared) = declared_license_url {
            let declared = declared.trim().to_lowercase();
            if !declared.is_empty() && matches_any(&declared, &self.allowed_patterns) {
                return Verdict::DeclaredLicense;
            }
        }

        let rights = rights.trim().to_lowercase();
        if rights.is_empty() {
            return Verdict::NoEvidence;
        }

        if matches_any(&rights, &self.blocked_patterns) {
            Verdict::Blocked
        } else if matches_any(&rights, &self.allow) {
            Verdict::Allowlisted
        } else if CC_URL_SIGNATURES.iter().any(|sig| rights.contains(sig)) {
            Verdict::CreativeCommonsUrl
        } else if matches_any(&rights, &self.allowed_patterns) {
            Verdict::AllowedPattern
        } else {
            Verdict::NoEvidence
        }
    }
}

impl Default for LicenseFilter {
    fn default() -> Self {
        Self::new(&LicenseWhitelist::default())
    }
}

impl Filter<&RawRecord> for LicenseFilter {
    fn detect(&self, record: &RawRecord) -> bool {
        let verdict = self.classify(&record.rights, record.declared_license.as_deref());
        if !verdict.is_accepted() {
            debug!("license rejected ({:?}): {:?} {:?}", verdict, record.rights, record.url);
        }
        verdict.is_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::{LicenseFilter, Verdict};
    use crate::config::LicenseWhitelist;
    use crate::filtering::Filter;
    use crate::sources::RawRecord;

    const CC0_URL: &str = "https://creativecommons.org/publicdomain/zero/1.0/";

    #[test]
    fn all_rights_reserved() {
        let f = LicenseFilter::default();
        assert_eq!(f.classify("All rights reserved", None), Verdict::Blocked);
    }

    #[test]
    fn cc0() {
        let f = LicenseFilter::default();
        assert!(f.classify("CC0 1.0", None).is_accepted());
    }

    #[test]
    fn declared_license_without_rights() {
        let f = LicenseFilter::default();
        assert_eq!(f.classify("", Some(CC0_URL)), Verdict::DeclaredLicense);
    }

    #[test]
    fn declared_license_wins_over_blocked_rights() {
        let f = LicenseFilter::default();
        assert_eq!(
            f.classify("All rights reserved", Some(CC0_URL)),
            Verdict::DeclaredLicense
        );
    }

    #[test]
    fn declared_license_not_allowed() {
        let f = LicenseFilter::default();
        assert_eq!(
            f.classify("", Some("https://example.org/terms")),
            Verdict::NoEvidence
        );
    }

    #[test]
    fn empty_rights() {
        let f = LicenseFilter::default();
        assert_eq!(f.classify("   ", None), Verdict::NoEvidence);
    }

    #[test]
    fn cc_url_signature() {
        let whitelist = LicenseWhitelist {
            allow: vec![],
            allowed_license_patterns: vec![],
            blocked_license_patterns: vec![],
        };
        let f = LicenseFilter::new(&whitelist);
        assert_eq!(
            f.classify("See https://creativecommons.org/licenses/by/4.0/", None),
            Verdict::CreativeCommonsUrl
        );
        assert_eq!(f.classify("CC BY 4.0", None), Verdict::NoEvidence);
    }

    #[test]
    fn blocked_before_allowed() {
        let whitelist = LicenseWhitelist {
            allow: vec!["creative commons".to_string()],
            allowed_license_patterns: vec![],
            blocked_license_patterns: vec!["NonCommercial".to_string()],
        };
        let f = LicenseFilter::new(&whitelist);
        assert_eq!(
            f.classify("Creative Commons Attribution-NonCommercial 4.0", None),
            Verdict::Blocked
        );
        assert_eq!(
            f.classify("Creative Commons Attribution 4.0", None),
            Verdict::Allowlisted
        );
    }

    #[test]
    fn allowed_pattern() {
        let whitelist = LicenseWhitelist {
            allow: vec![],
            allowed_license_patterns: vec!["open government licence".to_string()],
            blocked_license_patterns: vec![],
        };
        let f = LicenseFilter::new(&whitelist);
        assert_eq!(
            f.classify("Open Government Licence v3.0", None),
            Verdict::AllowedPattern
        );
    }

    #[test]
    fn stanford_not_cc() {
        let f = LicenseFilter::default();
        assert!(!f.classify("NOT_CC", None).is_accepted());
        assert!(f.classify("Creative Commons (SEE)", None).is_accepted());
    }

    #[test]
    fn record_filter() {
        let f = LicenseFilter::default();
        let mut record = RawRecord::new("some text", "", "title", "https://example.org/1");
        assert!(!f.detect(&record));

        record.declared_license = Some(CC0_URL.to_string());
        assert!(f.detect(&record));
    }
}
