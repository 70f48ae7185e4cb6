//! Knowledge-table vocabulary types
//!
//! Tables are data: each entry is a `(pattern, label, category)` triple with
//! optional catalog metadata. The matching algorithm never depends on a
//! particular vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::sport::Sport;

/// Knowledge category. Declaration order doubles as the load order and
/// therefore as the final tie-break between equally specific matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grading,
    CardType,
    Player,
    Brand,
    Product,
    Parallel,
    Team,
    Position,
    SportName,
    /// Denylist-only vocabulary; never tagged as a span
    Residual,
}

impl Category {
    pub const ALL: [Self; 10] = [
        Self::Grading,
        Self::CardType,
        Self::Player,
        Self::Brand,
        Self::Product,
        Self::Parallel,
        Self::Team,
        Self::Position,
        Self::SportName,
        Self::Residual,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grading => "grading",
            Self::CardType => "card_type",
            Self::Player => "player",
            Self::Brand => "brand",
            Self::Product => "product",
            Self::Parallel => "parallel",
            Self::Team => "team",
            Self::Position => "position",
            Self::SportName => "sport_name",
            Self::Residual => "residual",
        }
    }

    /// File stem used by directory-backed sources
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Grading => "grading",
            Self::CardType => "card_types",
            Self::Player => "players",
            Self::Brand => "brands",
            Self::Product => "products",
            Self::Parallel => "parallels",
            Self::Team => "teams",
            Self::Position => "positions",
            Self::SportName => "sport_names",
            Self::Residual => "residual",
        }
    }

    /// Categories whose keywords feed the sport cascade
    #[must_use]
    pub const fn is_sport_keyword(self) -> bool {
        matches!(self, Self::Team | Self::Position | Self::Player | Self::SportName)
    }

    #[must_use]
    pub const fn is_tagged(self) -> bool {
        !matches!(self, Self::Residual)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s || c.file_stem() == s)
            .ok_or_else(|| format!("unknown knowledge category '{s}'"))
    }
}

/// One vocabulary entry as stored in a table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub pattern: String,
    /// Canonical label; defaults to the pattern
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sport: Option<Sport>,
    /// Year qualifier for year-specific product variants
    #[serde(default)]
    pub year: Option<u16>,
    /// Catalog brand of a product (backfills a missing brand), or the
    /// parent house of a brand (`Donruss` → `Panini`)
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub print_run: Option<u32>,
    #[serde(default)]
    pub rarity: Option<String>,
}

impl KnowledgeEntry {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            label: None,
            sport: None,
            year: None,
            brand: None,
            print_run: None,
            rarity: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn with_sport(mut self, sport: Sport) -> Self {
        self.sport = Some(sport);
        self
    }

    #[must_use]
    pub const fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.pattern)
    }

    /// SP / SSP rarity marks a short print
    #[must_use]
    pub fn is_short_print(&self) -> bool {
        self.rarity.as_deref().is_some_and(|r| {
            let r = r.trim().to_ascii_lowercase();
            r == "sp" || r == "ssp" || r.contains("short print")
        })
    }
}

/// Set record as returned by a catalog source (`getAllSets`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSet {
    pub set_name: String,
    pub sport: Sport,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Parallel record as returned by a catalog source (`getParallelsForSet`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParallel {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub print_run: Option<u32>,
}

/// Ranking key for overlapping matches. Field order is comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Specificity {
    pub tokens: u8,
    pub chars: u16,
    /// Set when the entry's year qualifier equals the listing year
    pub qualified: bool,
}

/// A pattern occurrence in a normalized text (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub pattern: String,
    pub label: String,
    pub category: Category,
    pub start: usize,
    pub end: usize,
    pub specificity: Specificity,
    /// Global position of the entry in load order
    pub declaration_index: usize,
}

impl Match {
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specificity_ordering() {
        let bare = Specificity { tokens: 1, chars: 6, qualified: false };
        let long = Specificity { tokens: 5, chars: 36, qualified: false };
        let qualified = Specificity { tokens: 1, chars: 6, qualified: true };
        assert!(long > bare);
        assert!(qualified > bare);
        assert!(long > qualified);
    }

    #[test]
    fn test_category_round_trip_through_file_stem() {
        for category in Category::ALL {
            assert_eq!(category.file_stem().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_entry_defaults_label_to_pattern() {
        let entry: KnowledgeEntry = serde_json::from_str(r#"{"pattern":"Prizm"}"#).unwrap();
        assert_eq!(entry.label(), "Prizm");
        assert!(!entry.is_short_print());
    }
}
