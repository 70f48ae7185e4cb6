//! Card-type flags (rookie, auto, relic, numbered, short print)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardTypeFlag {
    Rookie,
    Auto,
    Relic,
    Numbered,
    ShortPrint,
}

impl FromStr for CardTypeFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rookie" => Ok(Self::Rookie),
            "auto" | "autograph" => Ok(Self::Auto),
            "relic" | "memorabilia" => Ok(Self::Relic),
            "numbered" => Ok(Self::Numbered),
            "shortprint" | "short_print" | "sp" => Ok(Self::ShortPrint),
            other => Err(format!("unknown card type flag '{other}'")),
        }
    }
}

/// Ordered flag set. `BTreeSet` keeps JSON output byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardTypeFlags(BTreeSet<CardTypeFlag>);

impl CardTypeFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: CardTypeFlag) -> bool {
        self.0.insert(flag)
    }

    #[must_use]
    pub fn contains(&self, flag: CardTypeFlag) -> bool {
        self.0.contains(&flag)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardTypeFlag> + '_ {
        self.0.iter().copied()
    }

    /// Parse a composite table label such as `rookie+auto+relic`.
    /// Unknown parts are skipped.
    pub fn extend_from_label(&mut self, label: &str) {
        for part in label.split('+') {
            if let Ok(flag) = part.parse() {
                self.0.insert(flag);
            }
        }
    }
}

impl FromIterator<CardTypeFlag> for CardTypeFlags {
    fn from_iter<I: IntoIterator<Item = CardTypeFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_label() {
        let mut flags = CardTypeFlags::new();
        flags.extend_from_label("rookie+auto+relic");
        assert_eq!(flags.len(), 3);
        assert!(flags.contains(CardTypeFlag::Auto));
        assert!(!flags.contains(CardTypeFlag::Numbered));
    }

    #[test]
    fn test_serialized_order_is_stable() {
        let a: CardTypeFlags = [CardTypeFlag::ShortPrint, CardTypeFlag::Rookie].into_iter().collect();
        let b: CardTypeFlags = [CardTypeFlag::Rookie, CardTypeFlag::ShortPrint].into_iter().collect();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, serde_json::to_string(&b).unwrap());
        assert_eq!(json, "[\"rookie\",\"shortPrint\"]");
    }
}
