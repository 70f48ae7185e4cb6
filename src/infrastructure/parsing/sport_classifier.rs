//! Sport classification cascade
//!
//! Strategies run in order and the first confident answer wins:
//! catalog vote → external directory (async extraction only) → keyword cascade →
//! `Unknown`. A strategy that errors or is unsure counts as no match.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use strsim::jaro_winkler;
use tracing::{debug, trace};

use super::FieldInput;
use crate::domain::{Category, Sport};
use crate::infrastructure::extraction_error::LookupError;
use crate::infrastructure::knowledge::KnowledgeBase;
use crate::infrastructure::sport_directory::PlayerSportDirectory;

/// Shortest pattern (in chars) that may match approximately
const MIN_FUZZY_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SportStrategy {
    Catalog,
    ExternalLookup,
    Keyword,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SportDecision {
    pub sport: Sport,
    pub strategy: SportStrategy,
}

impl SportDecision {
    const fn new(sport: Sport, strategy: SportStrategy) -> Self {
        Self { sport, strategy }
    }

    pub const fn unknown() -> Self {
        Self::new(Sport::Unknown, SportStrategy::Fallback)
    }
}

/// A catalog product found in the title, by token range
#[derive(Debug)]
struct CatalogHit<'a> {
    first: usize,
    last: usize,
    label: &'a str,
    sport: Sport,
}

impl CatalogHit<'_> {
    const fn width(&self) -> usize {
        self.last - self.first + 1
    }

    const fn inside(&self, other: &Self) -> bool {
        other.first <= self.first && self.last <= other.last && other.width() > self.width()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SportClassifier {
    fuzzy_threshold: f64,
}

impl Default for SportClassifier {
    fn default() -> Self {
        Self::new(0.92)
    }
}

impl SportClassifier {
    pub const fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    /// Synchronous cascade without the external directory
    pub fn classify(&self, input: &FieldInput<'_>, year: Option<u16>, player: Option<&str>) -> SportDecision {
        self.catalog(input, year)
            .or_else(|| Self::keyword(input, player))
            .unwrap_or_else(SportDecision::unknown)
    }

    /// Directory step of the async cascade; runs only when the catalog
    /// vote was not confident. Every failure, including the timeout, folds
    /// into `None`.
    pub async fn lookup(directory: &dyn PlayerSportDirectory, name: &str, timeout: Duration) -> Option<Sport> {
        let outcome = match tokio::time::timeout(timeout, directory.resolve_sport_for_player(name)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LookupError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))),
        };

        match outcome {
            Ok(sport) if sport.is_known() => Some(sport),
            Ok(_) => {
                trace!("Directory {} does not know '{}'", directory.name(), name);
                None
            }
            Err(e) => {
                e.into_extraction_error(name).report();
                None
            }
        }
    }

    /// Vote over sport-tagged catalog products found in the title. Only a
    /// strict plurality is confident.
    pub fn catalog(&self, input: &FieldInput<'_>, year: Option<u16>) -> Option<SportDecision> {
        let keys: Vec<&str> = input.tokens.iter().map(|t| t.key.as_str()).collect();
        let table = input.knowledge.table(Category::Product);
        let brands = input.knowledge.brand_houses(&input.tags.candidates);

        let mut hits = Vec::new();
        for (entry, pattern) in table.entries().zip(table.pattern_keys()) {
            let Some(sport) = entry.sport.filter(|s| s.is_known()) else {
                continue;
            };
            if entry.year.is_some() && entry.year != year {
                continue;
            }
            if KnowledgeBase::contradicts_brands(entry, &brands) {
                continue;
            }
            let n = pattern.len();
            if n == 0 || n > keys.len() {
                continue;
            }

            let wanted = pattern.join(" ");
            for (first, window) in keys.windows(n).enumerate() {
                let seen = window.join(" ");
                if self.similar(&seen, &wanted) {
                    hits.push(CatalogHit {
                        first,
                        last: first + n - 1,
                        label: entry.label(),
                        sport,
                    });
                }
            }
        }

        // "Crown Zenith" swallows the shorter "Zenith" it contains
        let mut counts: BTreeMap<Sport, BTreeSet<&str>> = BTreeMap::new();
        for hit in hits.iter().filter(|h| !hits.iter().any(|other| h.inside(other))) {
            counts.entry(hit.sport).or_default().insert(hit.label);
        }

        let mut ranked: Vec<(Sport, usize)> = counts.into_iter().map(|(s, labels)| (s, labels.len())).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        match ranked.as_slice() {
            [] => None,
            [(sport, _)] => Some(SportDecision::new(*sport, SportStrategy::Catalog)),
            [(sport, top), (_, next), ..] if top > next => Some(SportDecision::new(*sport, SportStrategy::Catalog)),
            _ => {
                debug!("Catalog vote tied between {:?}, falling through", ranked);
                None
            }
        }
    }

    fn similar(&self, seen: &str, wanted: &str) -> bool {
        if seen == wanted {
            return true;
        }
        let approximate = wanted.chars().count() >= MIN_FUZZY_CHARS
            && !seen.chars().any(|c| c.is_ascii_digit())
            && !wanted.chars().any(|c| c.is_ascii_digit());
        approximate && jaro_winkler(seen, wanted) >= self.fuzzy_threshold
    }

    /// First sport, in cascade order, with any keyword evidence: teams,
    /// positions, known players and sport names, plus the resolved player
    /// when the player table knows them.
    pub fn keyword(input: &FieldInput<'_>, player: Option<&str>) -> Option<SportDecision> {
        let knowledge = input.knowledge;
        let mut sports: BTreeSet<Sport> = input
            .tags
            .undominated()
            .filter(|m| m.category.is_sport_keyword())
            .filter_map(|m| knowledge.entry_for(m)?.sport)
            .filter(|s| s.is_known())
            .collect();

        if let Some(known) = player.and_then(|p| knowledge.whole_match(Category::Player, p)) {
            if let Some(sport) = knowledge.entry_for(&known).and_then(|e| e.sport) {
                sports.insert(sport);
            }
        }
        sports.remove(&Sport::Unknown);

        // `Sport` orders in cascade order
        sports
            .into_iter()
            .next()
            .map(|sport| SportDecision::new(sport, SportStrategy::Keyword))
    }
}
