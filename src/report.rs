//! Serializable pipeline output. Everything here is camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grade::Grade;
use crate::legal::LegalTextStatus;
use crate::readability::ReadabilityResult;
use crate::rights::RightsAssessment;
use crate::summarize::{DocumentSummary, OverallRisk};
use crate::uri::{CombinedGrade, UriResult};

/// Short anonymized id: first 12 hex chars of SHA-256.
pub fn document_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub document_id: String,
    pub analyzed_at: DateTime<Utc>,
    /// False when the clause model was disabled or failed to load (rules only).
    pub model_loaded: bool,
    pub word_count: usize,
    pub legal_term_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub readability: ReadabilityResult,
    pub rights: RightsAssessment,
    pub user_rights_index: UriResult,
    pub summary: DocumentSummary,
    pub detection: LegalTextStatus,
    pub combined_grade: CombinedGrade,
    pub metadata: ReportMetadata,
}

/// Compact "fingerprint" of a report for quick diagnostics. Holds no text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFingerprint {
    pub ts_unix: i64,
    pub document_id: String,
    pub uri_score: f64,
    pub uri_grade: Grade,
    pub rights_score: f64,
    pub readability_grade: Grade,
    pub combined_grade: Grade,
    pub overall_risk: OverallRisk,
    pub model_loaded: bool,
    pub degraded: bool,
}

impl Report {
    pub fn fingerprint(&self) -> ReportFingerprint {
        ReportFingerprint {
            ts_unix: self.metadata.analyzed_at.timestamp(),
            document_id: self.metadata.document_id.clone(),
            uri_score: self.user_rights_index.weighted_score,
            uri_grade: self.user_rights_index.grade,
            rights_score: self.rights.rights_score,
            readability_grade: self.readability.average_grade,
            combined_grade: self.combined_grade.grade,
            overall_risk: self.summary.overall_risk,
            model_loaded: self.metadata.model_loaded,
            degraded: self.user_rights_index.is_degraded(),
        }
    }
}
