//! Versioned knowledge table with token-aligned matching

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tokens::{Token, pattern_keys};
use crate::domain::{Category, KnowledgeEntry, Match, Specificity};

/// On-disk table file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFile {
    pub version: String,
    pub category: String,
    pub entries: Vec<KnowledgeEntry>,
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    entry: KnowledgeEntry,
    keys: Vec<String>,
}

/// A named, versioned collection of vocabulary entries for one category.
///
/// Matching is case-insensitive and token-aligned: a pattern only matches a
/// run of whole tokens, so `Red` never matches inside `Redemption`.
#[derive(Debug, Clone)]
pub struct KnowledgeTable {
    category: Category,
    version: String,
    fingerprint: String,
    entries: Vec<CompiledEntry>,
    /// first token key -> entry indices, in declaration order
    index: HashMap<String, Vec<usize>>,
}

impl KnowledgeTable {
    pub fn new(category: Category, version: impl Into<String>, entries: Vec<KnowledgeEntry>) -> Self {
        let version = version.into();
        let mut hasher = blake3::Hasher::new();
        hasher.update(category.as_str().as_bytes());
        hasher.update(version.as_bytes());

        let mut compiled = Vec::with_capacity(entries.len());
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for entry in entries {
            let keys = pattern_keys(&entry.pattern);
            if keys.is_empty() {
                continue;
            }
            hasher.update(entry.pattern.as_bytes());
            hasher.update(entry.label().as_bytes());

            index.entry(keys[0].clone()).or_default().push(compiled.len());
            compiled.push(CompiledEntry { entry, keys });
        }

        Self {
            category,
            version,
            fingerprint: hasher.finalize().to_hex().to_string(),
            entries: compiled,
            index,
        }
    }

    /// Empty table used when a category fails to load
    pub fn empty(category: Category) -> Self {
        Self::new(category, "unavailable", Vec::new())
    }

    pub fn from_file(file: TableFile, category: Category) -> Self {
        Self::new(category, file.version, file.entries)
    }

    pub const fn category(&self) -> Category {
        self.category
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().map(|c| &c.entry)
    }

    pub fn entry(&self, local_index: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(local_index).map(|c| &c.entry)
    }

    /// Pattern key sequences, in declaration order
    pub fn pattern_keys(&self) -> impl Iterator<Item = &[String]> {
        self.entries.iter().map(|c| c.keys.as_slice())
    }

    /// Every occurrence of every pattern in the token stream.
    ///
    /// Overlaps are not resolved here. `declaration_offset` places this
    /// table's entries in the global load order; `listing_year` drives the
    /// qualification bonus and excludes variants of other years.
    pub fn find_matches(
        &self,
        tokens: &[Token<'_>],
        listing_year: Option<u16>,
        declaration_offset: usize,
    ) -> Vec<Match> {
        let mut matches = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let Some(candidates) = self.index.get(&token.key) else {
                continue;
            };

            for &local in candidates {
                let compiled = &self.entries[local];
                let n = compiled.keys.len();
                if i + n > tokens.len() {
                    continue;
                }
                let aligned = compiled
                    .keys
                    .iter()
                    .zip(&tokens[i..i + n])
                    .all(|(key, tok)| *key == tok.key);
                if !aligned {
                    continue;
                }

                let qualified = match (compiled.entry.year, listing_year) {
                    (Some(entry_year), Some(year)) if entry_year != year => continue,
                    (Some(entry_year), Some(year)) => entry_year == year,
                    _ => false,
                };

                let start = token.start;
                let end = tokens[i + n - 1].end;
                matches.push(Match {
                    pattern: compiled.entry.pattern.clone(),
                    label: compiled.entry.label().to_string(),
                    category: self.category,
                    start,
                    end,
                    specificity: Specificity {
                        tokens: u8::try_from(n).unwrap_or(u8::MAX),
                        chars: u16::try_from(compiled.entry.pattern.chars().count()).unwrap_or(u16::MAX),
                        qualified,
                    },
                    declaration_index: declaration_offset + local,
                });
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::knowledge::tokens::tokenize;

    fn products() -> KnowledgeTable {
        KnowledgeTable::new(
            Category::Product,
            "test-1",
            vec![
                KnowledgeEntry::new("Chrome"),
                KnowledgeEntry::new("Chrome UEFA Women's Champions League"),
                KnowledgeEntry::new("Prizm").with_year(2012),
            ],
        )
    }

    #[test]
    fn test_finds_overlapping_candidates() {
        let text = "2021 Topps Chrome UEFA Women's Champions League Tobin Heath";
        let tokens = tokenize(text);
        let matches = products().find_matches(&tokens, Some(2021), 0);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].label, "Chrome UEFA Women's Champions League");
        assert!(matches[1].specificity > matches[0].specificity);
    }

    #[test]
    fn test_year_qualified_entry_requires_matching_year() {
        let text = "Panini Prizm Anthony Davis";
        let tokens = tokenize(text);
        let table = products();
        assert!(table.find_matches(&tokens, Some(2019), 0).is_empty());

        let found = table.find_matches(&tokens, Some(2012), 10);
        assert_eq!(found.len(), 1);
        assert!(found[0].specificity.qualified);
        assert_eq!(found[0].declaration_index, 12);
    }

    #[test]
    fn test_whole_token_alignment() {
        let table = KnowledgeTable::new(Category::Parallel, "t", vec![KnowledgeEntry::new("Red")]);
        let text = "Redemption card";
        assert!(table.find_matches(&tokenize(text), None, 0).is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = products();
        let b = KnowledgeTable::new(Category::Product, "test-1", vec![KnowledgeEntry::new("Chrome")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), products().fingerprint());
    }
}
