//! Data-quality assessment over a batch of extraction results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::domain::ExtractionResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_results: usize,
    pub complete_results: usize,
    pub incomplete_results: usize,
    pub missing_fields: BTreeMap<String, usize>,
    pub low_confidence: usize,
    pub unknown_sport: usize,
    pub average_confidence: f64,
    /// Share of complete results, in percent
    pub quality_score: f32,
    pub issues: Vec<QualityIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: IssueSeverity,
    pub field_name: String,
    pub issue_type: IssueType,
    /// Source id, or the summary title when the listing has none
    pub listing: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    MissingRequired,
    LowConfidence,
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageRecommendation {
    HighlyRecommended,
    ConditionallyRecommended,
    ReviewRequired,
    NotRecommended,
}

impl fmt::Display for StorageRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HighlyRecommended => "highly recommended",
            Self::ConditionallyRecommended => "conditionally recommended",
            Self::ReviewRequired => "review required",
            Self::NotRecommended => "not recommended",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAssessment {
    pub total_results: usize,
    pub quality_score: f32,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub recommendation: StorageRecommendation,
    pub summary: String,
}

struct Completeness {
    missing_fields: Vec<&'static str>,
    issues: Vec<QualityIssue>,
}

#[derive(Debug, Clone, Copy)]
pub struct DataQualityAnalyzer {
    low_confidence_threshold: f64,
}

impl Default for DataQualityAnalyzer {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl DataQualityAnalyzer {
    pub const fn new(low_confidence_threshold: f64) -> Self {
        Self {
            low_confidence_threshold,
        }
    }

    /// `results` pairs each extraction with the listing's source id
    pub fn analyze(&self, results: &[(Option<&str>, &ExtractionResult)]) -> DataQualityReport {
        let mut missing_fields = BTreeMap::new();
        let mut issues = Vec::new();
        let mut complete = 0;
        let mut low_confidence = 0;
        let mut unknown_sport = 0;

        for (source_id, result) in results {
            let listing = source_id.map_or_else(|| result.summary_title.clone(), str::to_string);
            let completeness = self.completeness(&listing, result);
            if completeness.missing_fields.is_empty() {
                complete += 1;
            }
            for field in completeness.missing_fields {
                *missing_fields.entry(field.to_string()).or_insert(0) += 1;
            }
            low_confidence += usize::from(result.confidence < self.low_confidence_threshold);
            unknown_sport += usize::from(!result.sport.is_known());
            issues.extend(completeness.issues);
        }

        let total_results = results.len();
        let quality_score = if total_results > 0 {
            (complete as f32 / total_results as f32) * 100.0
        } else {
            0.0
        };
        let average_confidence = if total_results > 0 {
            results.iter().map(|(_, r)| r.confidence).sum::<f64>() / total_results as f64
        } else {
            0.0
        };

        DataQualityReport {
            total_results,
            complete_results: complete,
            incomplete_results: total_results - complete,
            missing_fields,
            low_confidence,
            unknown_sport,
            average_confidence,
            quality_score,
            issues,
        }
    }

    fn completeness(&self, listing: &str, result: &ExtractionResult) -> Completeness {
        let mut missing_fields = Vec::new();
        let mut issues = Vec::new();
        let mut issue = |severity, field: &'static str, issue_type| {
            issues.push(QualityIssue {
                severity,
                field_name: field.to_string(),
                issue_type,
                listing: listing.to_string(),
            });
        };

        if result.player_name.is_none() {
            missing_fields.push("playerName");
            issue(IssueSeverity::Critical, "playerName", IssueType::MissingRequired);
        }
        if result.year.is_none() {
            missing_fields.push("year");
            issue(IssueSeverity::Warning, "year", IssueType::MissingRequired);
        }
        if result.product.is_none() && result.brand.is_none() {
            missing_fields.push("product");
            issue(IssueSeverity::Warning, "product", IssueType::MissingRequired);
        }
        if !result.sport.is_known() {
            missing_fields.push("sport");
            issue(IssueSeverity::Warning, "sport", IssueType::Unclassified);
        }
        if result.confidence < self.low_confidence_threshold {
            issue(IssueSeverity::Info, "confidence", IssueType::LowConfidence);
        }

        Completeness { missing_fields, issues }
    }

    pub fn assess_for_storage(&self, report: &DataQualityReport) -> StorageAssessment {
        let critical_issues = report
            .issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .count();
        let warning_issues = report
            .issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count();

        let critical_ratio = if report.total_results > 0 {
            critical_issues as f32 / report.total_results as f32
        } else {
            1.0
        };
        let recommendation = if report.total_results == 0 {
            StorageRecommendation::NotRecommended
        } else if report.quality_score >= 80.0 && critical_issues == 0 {
            StorageRecommendation::HighlyRecommended
        } else if report.quality_score >= 60.0 && critical_ratio <= 0.1 {
            StorageRecommendation::ConditionallyRecommended
        } else if report.quality_score >= 30.0 {
            StorageRecommendation::ReviewRequired
        } else {
            StorageRecommendation::NotRecommended
        };

        let summary = Self::generate_summary(report);
        if recommendation == StorageRecommendation::NotRecommended {
            warn!("Data quality too low for storage: {}", summary);
        } else {
            info!("Data quality: {} ({})", summary, recommendation);
        }

        StorageAssessment {
            total_results: report.total_results,
            quality_score: report.quality_score,
            critical_issues,
            warning_issues,
            recommendation,
            summary,
        }
    }

    fn generate_summary(report: &DataQualityReport) -> String {
        let most_missing = report
            .missing_fields
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map_or_else(|| "none".to_string(), |(field, count)| format!("{field} ({count})"));
        format!(
            "{}/{} complete ({:.1}%), avg confidence {:.2}, {} low-confidence, {} unknown sport, most missing: {}",
            report.complete_results,
            report.total_results,
            report.quality_score,
            report.average_confidence,
            report.low_confidence,
            report.unknown_sport,
            most_missing
        )
    }
}
