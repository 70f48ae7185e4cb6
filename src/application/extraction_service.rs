//! Extraction pipeline: raw listing title → `ExtractionResult`
//!
//! normalize → tokenize → tag knowledge spans → field extractors →
//! player-name resolver → sport cascade → summary and confidence.
//!
//! Extraction never fails. Malformed input yields `ExtractionResult::empty()`
//! and every collaborator failure degrades a single field.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::domain::{CardTypeFlag, ExtractionContext, ExtractionDiff, ExtractionResult, RawListing};
use crate::infrastructure::config::{AppConfig, ExtractionSettings};
use crate::infrastructure::extraction_error::{ExtractionError, KnowledgeError};
use crate::infrastructure::knowledge::{DirectoryKnowledgeSource, KnowledgeBase, KnowledgeRegistry, tokenize};
use crate::infrastructure::parsing::{
    CardNumberExtractor, CardTypeExtractor, CatalogFieldExtractor, ConfidenceWeights, FieldExtractor, FieldInput,
    LexicalNormalizer, NormalizerRules, PlayerNameResolver, PrintRunExtractor, SportClassifier, SportDecision,
    SportStrategy, SummaryComposer, SummaryFields, YearExtractor,
};
use crate::infrastructure::sport_directory::{HttpSportDirectory, PlayerSportDirectory};

/// Fresh result plus what changed against the caller's prior result
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub diff: Option<ExtractionDiff>,
    pub sport_strategy: SportStrategy,
}

/// Everything except the sport decision, which may need the directory
struct Draft {
    result: ExtractionResult,
    normalized: String,
    catalog_sport: Option<SportDecision>,
    keyword_sport: Option<SportDecision>,
    ambiguities: usize,
}

pub struct ExtractionPipeline {
    registry: Arc<KnowledgeRegistry>,
    normalizer: LexicalNormalizer,
    years: YearExtractor,
    card_numbers: CardNumberExtractor,
    resolver: PlayerNameResolver,
    classifier: SportClassifier,
    weights: ConfidenceWeights,
    directory: Option<Arc<dyn PlayerSportDirectory>>,
    lookup_timeout: Duration,
}

impl ExtractionPipeline {
    pub fn new(registry: Arc<KnowledgeRegistry>, settings: &ExtractionSettings) -> Result<Self, KnowledgeError> {
        Ok(Self::with_normalizer(registry, settings, LexicalNormalizer::builtin()?))
    }

    pub fn with_normalizer(
        registry: Arc<KnowledgeRegistry>,
        settings: &ExtractionSettings,
        normalizer: LexicalNormalizer,
    ) -> Self {
        let years = YearExtractor::new(settings.min_year, settings.resolved_current_year());
        Self {
            registry,
            normalizer,
            years,
            card_numbers: CardNumberExtractor::new(years),
            resolver: PlayerNameResolver::new(settings.name_min_chars, settings.name_max_chars),
            classifier: SportClassifier::new(settings.fuzzy_catalog_threshold),
            weights: ConfidenceWeights::default().with_ambiguity_penalty(settings.ambiguity_penalty),
            directory: None,
            lookup_timeout: Duration::from_secs(2),
        }
    }

    /// Embedded knowledge and rules, default settings
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::new(Arc::new(KnowledgeRegistry::builtin()), &ExtractionSettings::default())
    }

    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn PlayerSportDirectory>, timeout: Duration) -> Self {
        self.directory = Some(directory);
        self.lookup_timeout = timeout;
        self
    }

    /// Build everything an `AppConfig` describes: knowledge source,
    /// normalizer rules and, when enabled, the HTTP sport directory
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = match &config.knowledge.data_dir {
            Some(dir) => KnowledgeRegistry::load(&DirectoryKnowledgeSource::new(dir)).await,
            None => KnowledgeRegistry::builtin(),
        };

        let rules = match &config.knowledge.normalizer_rules {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read normalizer rules {}", path.display()))?;
                NormalizerRules::from_json(&path.display().to_string(), &raw)?
            }
            None => NormalizerRules::embedded()?,
        };
        let normalizer = LexicalNormalizer::new(&rules)?;

        let mut pipeline = Self::with_normalizer(Arc::new(registry), &config.extraction, normalizer);
        if config.sport_lookup.enabled {
            let directory = HttpSportDirectory::new(&config.sport_lookup).context("Failed to create sport directory")?;
            pipeline = pipeline.with_directory(
                Arc::new(directory),
                Duration::from_millis(config.sport_lookup.timeout_ms),
            );
        }

        info!(
            "Extraction pipeline ready (knowledge {}, normalizer {}, directory {})",
            &pipeline.knowledge().fingerprint()[..12],
            pipeline.normalizer.version(),
            pipeline.has_directory()
        );
        Ok(pipeline)
    }

    pub fn knowledge(&self) -> Arc<KnowledgeBase> {
        self.registry.snapshot()
    }

    pub const fn registry(&self) -> &Arc<KnowledgeRegistry> {
        &self.registry
    }

    pub const fn has_directory(&self) -> bool {
        self.directory.is_some()
    }

    /// Synchronous extraction without the external directory
    pub fn extract(&self, listing: &RawListing) -> ExtractionResult {
        self.extract_with_context(listing, &ExtractionContext::default()).result
    }

    pub fn extract_with_context(&self, listing: &RawListing, context: &ExtractionContext) -> ExtractionOutcome {
        let Some(draft) = self.draft(listing, context) else {
            return Self::outcome(ExtractionResult::empty(), SportStrategy::Fallback, context);
        };
        let decision = draft
            .catalog_sport
            .or(draft.keyword_sport)
            .unwrap_or_else(SportDecision::unknown);
        self.finish(draft, decision, listing, context)
    }

    /// Full cascade including the directory, when one is configured
    pub async fn extract_enriched(&self, listing: &RawListing, context: &ExtractionContext) -> ExtractionOutcome {
        let Some(draft) = self.draft(listing, context) else {
            return Self::outcome(ExtractionResult::empty(), SportStrategy::Fallback, context);
        };

        let mut decision = draft.catalog_sport;
        if decision.is_none() {
            if let (Some(directory), Some(player)) = (&self.directory, draft.result.player_name.as_deref()) {
                decision = SportClassifier::lookup(directory.as_ref(), player, self.lookup_timeout)
                    .await
                    .map(|sport| SportDecision {
                        sport,
                        strategy: SportStrategy::ExternalLookup,
                    });
            }
        }
        let decision = decision
            .or(draft.keyword_sport)
            .unwrap_or_else(SportDecision::unknown);
        self.finish(draft, decision, listing, context)
    }

    fn outcome(result: ExtractionResult, sport_strategy: SportStrategy, context: &ExtractionContext) -> ExtractionOutcome {
        let diff = context.prior_extraction.as_ref().map(|prior| result.diff(prior));
        ExtractionOutcome {
            result,
            diff,
            sport_strategy,
        }
    }

    fn draft(&self, listing: &RawListing, context: &ExtractionContext) -> Option<Draft> {
        if listing.is_blank() {
            debug!("{}", ExtractionError::malformed("title has no visible characters"));
            return None;
        }

        let knowledge = self.registry.snapshot();
        let normalized = self.normalizer.normalize(&listing.title);
        let tokens = tokenize(normalized.as_str());

        // the listing year qualifies year-specific catalog entries
        let listing_year = tokens.iter().find_map(|t| self.years.year_of(t));
        let tags = knowledge.tag(&tokens, listing_year);
        let input = FieldInput::new(normalized.as_str(), &tokens, &tags, &knowledge);

        let year = self.years.extract(&input);
        let text_print_run = PrintRunExtractor.extract(&input);
        let card_number = self.card_numbers.extract(&input);
        let catalog = CatalogFieldExtractor.extract(&input).unwrap_or_default();
        let mut flags = CardTypeExtractor.extract(&input).unwrap_or_default();

        let claimed: Vec<(usize, usize)> = [
            year.as_ref().map(|y| y.span()),
            text_print_run.as_ref().map(|p| p.span()),
            card_number.as_ref().map(|c| c.span()),
        ]
        .into_iter()
        .flatten()
        .collect();
        let hint = context.known_player_name_hint.as_deref();
        let player_name = self.resolver.resolve(&input, &claimed, hint);

        // a catalog-numbered parallel supplies the print run the title omits
        let print_run = text_print_run.map(|p| p.value).or_else(|| {
            catalog
                .parallel_print_run
                .map(|run| if run == 1 { "1/1".to_string() } else { format!("/{run}") })
        });
        if print_run.is_some() {
            flags.insert(CardTypeFlag::Numbered);
        }
        if catalog.short_print {
            flags.insert(CardTypeFlag::ShortPrint);
        }

        let year = year.map(|y| y.value);
        let catalog_sport = self.classifier.catalog(&input, year);
        let keyword_sport = SportClassifier::keyword(&input, player_name.as_deref());
        trace!("Tagged {} spans in '{}'", tags.accepted.len(), normalized.as_str());

        let mut result = ExtractionResult::empty();
        result.year = year;
        result.brand = catalog.brand;
        result.product = catalog.product;
        result.parallel = catalog.parallel;
        result.print_run = print_run;
        result.card_number = card_number.map(|c| c.value);
        result.player_name = player_name;
        result.card_type_flags = flags;

        Some(Draft {
            result,
            ambiguities: tags.ambiguities.len(),
            catalog_sport,
            keyword_sport,
            normalized: normalized.text,
        })
    }

    fn finish(
        &self,
        draft: Draft,
        decision: SportDecision,
        listing: &RawListing,
        context: &ExtractionContext,
    ) -> ExtractionOutcome {
        let Draft {
            mut result,
            normalized,
            ambiguities,
            ..
        } = draft;

        result.sport = decision.sport;
        result.summary_title = SummaryComposer::compose(&SummaryFields::from_result(&result), &normalized, &listing.title);
        result.confidence = self.weights.score(&result, ambiguities);
        if ambiguities > 0 {
            debug!("{} ambiguous overlaps settled by declaration order", ambiguities);
        }

        Self::outcome(result, decision.strategy, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sport;
    use once_cell::sync::Lazy;

    static PIPELINE: Lazy<ExtractionPipeline> = Lazy::new(|| {
        let settings = ExtractionSettings {
            current_year: Some(2025),
            ..ExtractionSettings::default()
        };
        ExtractionPipeline::new(Arc::new(KnowledgeRegistry::builtin()), &settings).unwrap()
    });

    fn extract(title: &str) -> ExtractionResult {
        PIPELINE.extract(&RawListing::new(title))
    }

    #[test]
    fn test_blank_title_is_empty_result() {
        assert_eq!(extract("  \t "), ExtractionResult::empty());
    }

    #[test]
    fn test_prizm_rookie_listing() {
        let r = extract("2021 Panini Prizm- Ja'marr Chase- Rookie Pink Prizm- PSA 10 💎");
        assert_eq!(r.year, Some(2021));
        assert_eq!(r.brand.as_deref(), Some("Panini"));
        assert_eq!(r.product.as_deref(), Some("Prizm"));
        assert_eq!(r.parallel.as_deref(), Some("Pink Prizm"));
        assert_eq!(r.player_name.as_deref(), Some("Ja'Marr Chase"));
        assert_eq!(r.sport, Sport::Football);
        assert!(r.card_type_flags.contains(CardTypeFlag::Rookie));
        assert_eq!(r.summary_title, "2021 Prizm Ja'Marr Chase Pink Prizm");
    }

    #[test]
    fn test_catalog_print_run_sets_numbered() {
        let r = extract("2020 Topps Chrome Superfractor Luis Robert");
        assert_eq!(r.print_run.as_deref(), Some("1/1"));
        assert!(r.card_type_flags.contains(CardTypeFlag::Numbered));
        assert!(r.card_type_flags.contains(CardTypeFlag::ShortPrint));
    }

    #[test]
    fn test_prior_result_is_diffed() {
        let listing = RawListing::new("2021 Panini Prizm Ja'marr Chase Rookie");
        let first = PIPELINE.extract(&listing);
        let outcome = PIPELINE.extract_with_context(&listing, &ExtractionContext::with_prior(first.clone()));
        assert_eq!(outcome.result, first);
        assert!(outcome.diff.is_some_and(|d| d.is_unchanged()));
    }
}
