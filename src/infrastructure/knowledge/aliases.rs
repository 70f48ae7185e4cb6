//! Player-name alias normalization table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tokens::pattern_keys;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasRecord {
    pub variant: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasFile {
    pub version: String,
    pub aliases: Vec<AliasRecord>,
}

/// A word after alias resolution; `canonical` words keep their spelling verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasedWord {
    pub text: String,
    pub canonical: bool,
}

/// Maps irregular spellings (`ja marr`, `jamarr`, `smith njigba`) onto the
/// canonical form (`Ja'Marr`, `Smith-Njigba`). Variants span up to a few
/// words and are matched longest-first.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    version: String,
    variants: HashMap<Vec<String>, String>,
    max_words: usize,
}

impl AliasTable {
    pub fn new(version: impl Into<String>, records: Vec<AliasRecord>) -> Self {
        let mut variants = HashMap::new();
        let mut max_words = 0;
        for record in records {
            let keys = pattern_keys(&record.variant);
            if keys.is_empty() {
                continue;
            }
            max_words = max_words.max(keys.len());
            variants.entry(keys).or_insert(record.canonical);
        }
        Self {
            version: version.into(),
            variants,
            max_words,
        }
    }

    pub fn from_file(file: AliasFile) -> Self {
        Self::new(file.version, file.aliases)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Canonical form of a whole phrase, if the phrase is a known variant
    pub fn canonical_for(&self, phrase: &str) -> Option<&str> {
        self.variants.get(&pattern_keys(phrase)).map(String::as_str)
    }

    /// Replace known variants inside a word sequence, longest match first
    pub fn apply(&self, words: &[&str]) -> Vec<AliasedWord> {
        let keys: Vec<String> = words.iter().map(|w| super::tokens::token_key(w)).collect();
        let mut out = Vec::with_capacity(words.len());
        let mut i = 0;

        'outer: while i < words.len() {
            let longest = self.max_words.min(words.len() - i);
            for n in (1..=longest).rev() {
                if let Some(canonical) = self.variants.get(&keys[i..i + n]) {
                    out.extend(canonical.split_whitespace().map(|part| AliasedWord {
                        text: part.to_string(),
                        canonical: true,
                    }));
                    i += n;
                    continue 'outer;
                }
            }
            out.push(AliasedWord {
                text: words[i].to_string(),
                canonical: false,
            });
            i += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new(
            "t",
            vec![
                AliasRecord { variant: "ja marr".into(), canonical: "Ja'Marr".into() },
                AliasRecord { variant: "ja'marr".into(), canonical: "Ja'Marr".into() },
                AliasRecord { variant: "smith njigba".into(), canonical: "Smith-Njigba".into() },
            ],
        )
    }

    #[test]
    fn test_two_word_variant_collapses() {
        let out = table().apply(&["Ja", "marr", "Chase"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Ja'Marr");
        assert!(out[0].canonical);
        assert_eq!(out[1].text, "Chase");
        assert!(!out[1].canonical);
    }

    #[test]
    fn test_case_insensitive_variant() {
        let out = table().apply(&["JA'MARR", "chase"]);
        assert_eq!(out[0].text, "Ja'Marr");
        assert_eq!(table().canonical_for("Smith Njigba"), Some("Smith-Njigba"));
    }
}
