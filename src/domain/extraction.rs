//! # Extraction Result
//!
//! The structured record derived from one listing title, plus the diff type
//! maintenance jobs use to track whether a re-extraction improved a stored record.

use serde::{Deserialize, Serialize};

use super::card_type::CardTypeFlags;
use super::sport::Sport;

/// Structured record for one listing.
///
/// `summary_title` is a pure function of the other fields and the original
/// title; extracting the same listing twice yields a byte-identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub sport: Sport,
    pub year: Option<u16>,
    pub brand: Option<String>,
    pub product: Option<String>,
    pub parallel: Option<String>,
    pub print_run: Option<String>,
    pub card_number: Option<String>,
    pub player_name: Option<String>,
    pub card_type_flags: CardTypeFlags,
    pub summary_title: String,
    pub confidence: f64,
}

impl ExtractionResult {
    /// Result for malformed input: every field empty, zero confidence
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sport: Sport::Unknown,
            year: None,
            brand: None,
            product: None,
            parallel: None,
            print_run: None,
            card_number: None,
            player_name: None,
            card_type_flags: CardTypeFlags::new(),
            summary_title: String::new(),
            confidence: 0.0,
        }
    }

    /// Field name / rendered value pairs, in serialization order
    fn field_values(&self) -> [(&'static str, Option<String>); 10] {
        let flags = if self.card_type_flags.is_empty() {
            None
        } else {
            serde_json::to_string(&self.card_type_flags).ok()
        };
        [
            ("sport", self.sport.is_known().then(|| self.sport.to_string())),
            ("year", self.year.map(|y| y.to_string())),
            ("brand", self.brand.clone()),
            ("product", self.product.clone()),
            ("parallel", self.parallel.clone()),
            ("printRun", self.print_run.clone()),
            ("cardNumber", self.card_number.clone()),
            ("playerName", self.player_name.clone()),
            ("cardTypeFlags", flags),
            ("summaryTitle", Some(self.summary_title.clone()).filter(|s| !s.is_empty())),
        ]
    }

    /// Number of populated fields, not counting the summary title
    #[must_use]
    pub fn populated_fields(&self) -> usize {
        self.field_values()
            .iter()
            .filter(|(name, value)| *name != "summaryTitle" && value.is_some())
            .count()
    }

    /// Compare against a previously stored extraction of the same listing
    #[must_use]
    pub fn diff(&self, previous: &Self) -> ExtractionDiff {
        let mut changes = Vec::new();
        for ((field, old), (_, new)) in previous.field_values().into_iter().zip(self.field_values()) {
            let kind = match (&old, &new) {
                (None, None) => continue,
                (Some(a), Some(b)) if a == b => continue,
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Removed,
                (Some(_), Some(_)) => ChangeKind::Changed,
            };
            changes.push(FieldChange {
                field: field.to_string(),
                previous: old,
                current: new,
                kind,
            });
        }

        let verdict = DiffVerdict::judge(&changes, previous.confidence, self.confidence);
        ExtractionDiff {
            changes,
            previous_confidence: previous.confidence,
            current_confidence: self.confidence,
            verdict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiffVerdict {
    Unchanged,
    Improved,
    Regressed,
    /// Values moved without a clear gain or loss
    Changed,
}

impl DiffVerdict {
    fn judge(changes: &[FieldChange], previous_confidence: f64, current_confidence: f64) -> Self {
        if changes.is_empty() {
            return Self::Unchanged;
        }
        let added = changes.iter().filter(|c| c.kind == ChangeKind::Added).count();
        let removed = changes.iter().filter(|c| c.kind == ChangeKind::Removed).count();

        if current_confidence > previous_confidence || (added > removed && current_confidence >= previous_confidence) {
            Self::Improved
        } else if current_confidence < previous_confidence || removed > added {
            Self::Regressed
        } else {
            Self::Changed
        }
    }
}

/// Old-versus-new comparison for "improvement" tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDiff {
    pub changes: Vec<FieldChange>,
    pub previous_confidence: f64,
    pub current_confidence: f64,
    pub verdict: DiffVerdict,
}

impl ExtractionDiff {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.verdict == DiffVerdict::Unchanged
    }

    #[must_use]
    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            sport: Sport::Football,
            year: Some(2021),
            brand: Some("Panini".into()),
            product: Some("Prizm".into()),
            parallel: None,
            print_run: None,
            card_number: None,
            player_name: None,
            card_type_flags: CardTypeFlags::new(),
            summary_title: "2021 Prizm".into(),
            confidence: 0.55,
        }
    }

    #[test]
    fn test_identical_results_are_unchanged() {
        let a = sample();
        let diff = a.diff(&a.clone());
        assert!(diff.is_unchanged());
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn test_added_player_is_improvement() {
        let old = sample();
        let mut new = sample();
        new.player_name = Some("Ja'Marr Chase".into());
        new.summary_title = "2021 Prizm Ja'Marr Chase".into();
        new.confidence = 0.85;

        let diff = new.diff(&old);
        assert_eq!(diff.verdict, DiffVerdict::Improved);
        assert_eq!(diff.changed_fields(), vec!["playerName", "summaryTitle"]);
        assert_eq!(diff.changes[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_lost_field_is_regression() {
        let old = sample();
        let mut new = sample();
        new.brand = None;
        new.confidence = 0.45;
        assert_eq!(new.diff(&old).verdict, DiffVerdict::Regressed);
    }

    #[test]
    fn test_empty_result_json_shape() {
        let json = serde_json::to_value(ExtractionResult::empty()).unwrap();
        assert_eq!(json["sport"], "unknown");
        assert!(json["playerName"].is_null());
        assert_eq!(json["cardTypeFlags"], serde_json::json!([]));
        assert_eq!(json["confidence"], 0.0);
    }

    #[test]
    fn test_populated_fields_excludes_summary() {
        assert_eq!(sample().populated_fields(), 4);
        assert_eq!(ExtractionResult::empty().populated_fields(), 0);
    }
}
