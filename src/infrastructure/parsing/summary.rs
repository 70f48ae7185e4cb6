//! Summary title and confidence score
//!
//! Both are pure functions of the extracted fields (plus the title for the
//! fallback), which is what makes re-extraction byte-identical.

use crate::domain::ExtractionResult;

/// Fields that make up a summary title, in output order
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFields<'a> {
    pub year: Option<u16>,
    pub product: Option<&'a str>,
    pub player_name: Option<&'a str>,
    pub parallel: Option<&'a str>,
    pub print_run: Option<&'a str>,
}

impl<'a> SummaryFields<'a> {
    pub fn from_result(result: &'a ExtractionResult) -> Self {
        Self {
            year: result.year,
            product: result.product.as_deref(),
            player_name: result.player_name.as_deref(),
            parallel: result.parallel.as_deref(),
            print_run: result.print_run.as_deref(),
        }
    }

    fn parts(&self) -> Vec<String> {
        let year = self.year.map(|y| y.to_string());
        [year.as_deref(), self.product, self.player_name, self.parallel, self.print_run]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `[year] [product] [player] [parallel] [printRun]`. Fewer than two parts
/// fall back to the normalized title, then to the raw title.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryComposer;

impl SummaryComposer {
    pub const MIN_PARTS: usize = 2;

    pub fn compose(fields: &SummaryFields<'_>, normalized: &str, raw: &str) -> String {
        let parts = fields.parts();
        if parts.len() >= Self::MIN_PARTS {
            return collapse_whitespace(&parts.join(" "));
        }

        let normalized = collapse_whitespace(normalized);
        if normalized.is_empty() {
            collapse_whitespace(raw)
        } else {
            normalized
        }
    }
}

/// Per-field contribution to the confidence score. Defaults sum to 1.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceWeights {
    pub year: f64,
    pub brand: f64,
    pub product: f64,
    pub player_name: f64,
    /// Parallel or print run; either earns it once
    pub parallel: f64,
    pub card_number: f64,
    pub sport: f64,
    pub ambiguity_penalty: f64,
    pub max_penalty: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            year: 0.15,
            brand: 0.10,
            product: 0.20,
            player_name: 0.30,
            parallel: 0.10,
            card_number: 0.05,
            sport: 0.10,
            ambiguity_penalty: 0.05,
            max_penalty: 0.20,
        }
    }
}

impl ConfidenceWeights {
    #[must_use]
    pub const fn with_ambiguity_penalty(mut self, penalty: f64) -> Self {
        self.ambiguity_penalty = penalty;
        self
    }

    /// Score in `[0, 1]`, rounded to two decimals
    pub fn score(&self, result: &ExtractionResult, ambiguities: usize) -> f64 {
        let earned = [
            (result.year.is_some(), self.year),
            (result.brand.is_some(), self.brand),
            (result.product.is_some(), self.product),
            (result.player_name.is_some(), self.player_name),
            (result.parallel.is_some() || result.print_run.is_some(), self.parallel),
            (result.card_number.is_some(), self.card_number),
            (result.sport.is_known(), self.sport),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .fold(0.0_f64, |acc, (_, weight)| acc + weight);

        let penalty = (self.ambiguity_penalty * ambiguities as f64).min(self.max_penalty);
        // `+ 0.0` folds a negative zero so the JSON always reads `0.0`
        ((earned - penalty).clamp(0.0, 1.0) * 100.0).round() / 100.0 + 0.0
    }
}
