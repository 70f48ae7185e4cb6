//! Loaded knowledge snapshot: all category tables, aliases and the denylist

use std::collections::{BTreeMap, HashSet};

use super::aliases::AliasTable;
use super::table::KnowledgeTable;
use super::tokens::{Token, tokenize};
use crate::domain::{Category, KnowledgeEntry, Match};
use crate::infrastructure::extraction_error::ExtractionError;

/// Overlap resolution outcome for one text
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    /// Non-overlapping winners, sorted by start offset
    pub accepted: Vec<Match>,
    /// Every raw candidate before resolution
    pub candidates: Vec<Match>,
    /// Equally specific overlapping pairs that declaration order had to settle
    pub ambiguities: Vec<(Match, Match)>,
}

impl TagSet {
    pub fn accepted_in(&self, category: Category) -> impl Iterator<Item = &Match> {
        self.accepted.iter().filter(move |m| m.category == category)
    }

    /// A candidate survives if no accepted match of greater specificity covers it
    pub fn undominated(&self) -> impl Iterator<Item = &Match> {
        self.candidates.iter().filter(|c| {
            !self
                .accepted
                .iter()
                .any(|a| a.overlaps(c) && a.specificity > c.specificity)
        })
    }
}

/// Immutable knowledge snapshot shared read-only by every extraction
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    tables: BTreeMap<Category, KnowledgeTable>,
    offsets: BTreeMap<Category, usize>,
    aliases: AliasTable,
    denylist: HashSet<String>,
    fingerprint: String,
}

impl KnowledgeBase {
    /// Assemble a snapshot. Missing categories become empty tables.
    pub fn new(tables: Vec<KnowledgeTable>, aliases: AliasTable) -> Self {
        let mut by_category: BTreeMap<Category, KnowledgeTable> =
            tables.into_iter().map(|t| (t.category(), t)).collect();
        for category in Category::ALL {
            by_category
                .entry(category)
                .or_insert_with(|| KnowledgeTable::empty(category));
        }

        let mut offsets = BTreeMap::new();
        let mut next = 0;
        for (category, table) in &by_category {
            offsets.insert(*category, next);
            next += table.len();
        }

        let denylist = Self::build_denylist(&by_category);

        let mut hasher = blake3::Hasher::new();
        for table in by_category.values() {
            hasher.update(table.fingerprint().as_bytes());
        }
        hasher.update(aliases.version().as_bytes());

        Self {
            tables: by_category,
            offsets,
            aliases,
            denylist,
            fingerprint: hasher.finalize().to_hex().to_string(),
        }
    }

    /// Residual vocabulary a player-name window must not contain.
    ///
    /// Residual entries, every single-token pattern of a tagged category
    /// (players excluded), and the trailing word of multi-word parallels and
    /// team names (`Pink Prizm` → `prizm`, `Red Sox` → `sox`). City words are
    /// deliberately absent so names such as "Dallas Goedert" survive.
    fn build_denylist(tables: &BTreeMap<Category, KnowledgeTable>) -> HashSet<String> {
        let mut denylist = HashSet::new();
        for (category, table) in tables {
            if *category == Category::Player {
                continue;
            }
            for keys in table.pattern_keys() {
                match (category, keys) {
                    (_, [single]) => {
                        denylist.insert(single.clone());
                    }
                    (Category::Residual, many) => {
                        denylist.extend(many.iter().cloned());
                    }
                    (Category::Parallel | Category::Team, [.., last]) => {
                        denylist.insert(last.clone());
                    }
                    _ => {}
                }
            }
        }
        denylist
    }

    pub fn table(&self, category: Category) -> &KnowledgeTable {
        // every category is populated in `new`
        &self.tables[&category]
    }

    pub fn tables(&self) -> impl Iterator<Item = &KnowledgeTable> {
        self.tables.values()
    }

    pub const fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Versions per category, for logs and maintenance reports
    pub fn versions(&self) -> BTreeMap<String, String> {
        self.tables
            .iter()
            .map(|(c, t)| (c.to_string(), t.version().to_string()))
            .chain(std::iter::once(("aliases".to_string(), self.aliases.version().to_string())))
            .collect()
    }

    pub fn is_denied(&self, word: &str) -> bool {
        let key = super::tokens::token_key(word);
        !key.is_empty() && self.denylist.contains(&key)
    }

    /// Table entry behind a match
    pub fn entry_for(&self, m: &Match) -> Option<&KnowledgeEntry> {
        let offset = *self.offsets.get(&m.category)?;
        self.table(m.category).entry(m.declaration_index.checked_sub(offset)?)
    }

    /// Public lookup contract: matches of one category, overlaps resolved
    /// to the most specific pattern, sorted by position.
    pub fn lookup(&self, category: Category, text: &str) -> Vec<Match> {
        let tokens = tokenize(text);
        let candidates = self.table(category).find_matches(&tokens, None, self.offsets[&category]);
        Self::resolve(candidates).accepted
    }

    /// Match covering the whole text, if the text is exactly one pattern
    pub fn whole_match(&self, category: Category, text: &str) -> Option<Match> {
        let trimmed = text.trim();
        self.lookup(category, trimmed)
            .into_iter()
            .find(|m| m.start == 0 && m.end == trimmed.len())
    }

    /// Tag every tagged category in one pass and resolve overlaps across them
    pub fn tag(&self, tokens: &[Token<'_>], listing_year: Option<u16>) -> TagSet {
        let mut candidates: Vec<Match> = self
            .tables
            .iter()
            .filter(|(category, _)| category.is_tagged())
            .flat_map(|(category, table)| table.find_matches(tokens, listing_year, self.offsets[category]))
            .collect();

        // like a year mismatch, another brand's product never matches
        let brands = self.brand_houses(&candidates);
        candidates.retain(|m| {
            m.category != Category::Product || !self.entry_for(m).is_some_and(|e| Self::contradicts_brands(e, &brands))
        });
        Self::resolve(candidates)
    }

    /// Lowercased brands named by the brand matches, with their parent houses
    pub fn brand_houses<'m>(&self, matches: impl IntoIterator<Item = &'m Match>) -> HashSet<String> {
        let mut houses = HashSet::new();
        for m in matches.into_iter().filter(|m| m.category == Category::Brand) {
            houses.insert(m.label.to_lowercase());
            if let Some(parent) = self.entry_for(m).and_then(|e| e.brand.as_deref()) {
                houses.insert(parent.to_lowercase());
            }
        }
        houses
    }

    /// The entry carries a brand and the title names only other houses
    pub fn contradicts_brands(entry: &KnowledgeEntry, houses: &HashSet<String>) -> bool {
        !houses.is_empty()
            && entry
                .brand
                .as_deref()
                .is_some_and(|brand| !houses.contains(&brand.to_lowercase()))
    }

    /// Greedy most-specific-first resolution; ties go to declaration order
    fn resolve(candidates: Vec<Match>) -> TagSet {
        let mut ranked = candidates.clone();
        ranked.sort_by(|a, b| {
            b.specificity
                .cmp(&a.specificity)
                .then(a.declaration_index.cmp(&b.declaration_index))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Match> = Vec::new();
        let mut ambiguities = Vec::new();
        for candidate in ranked {
            match accepted.iter().find(|a| a.overlaps(&candidate)) {
                None => accepted.push(candidate),
                Some(winner) => {
                    let same_meaning = winner.category == candidate.category && winner.label == candidate.label;
                    if winner.specificity == candidate.specificity && !same_meaning {
                        ExtractionError::ambiguous(&winner.label, &candidate.label).report();
                        ambiguities.push((winner.clone(), candidate));
                    }
                }
            }
        }

        accepted.sort_by_key(|m| (m.start, m.end));
        TagSet {
            accepted,
            candidates,
            ambiguities,
        }
    }
}
