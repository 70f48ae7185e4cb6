//! Sport classification value type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sport (or card-game family) a listing belongs to.
///
/// Declaration order is significant: the keyword cascade walks sports in this
/// order and the first hit wins, so genuinely ambiguous keywords ("Giants",
/// "Cardinals", "Rangers") always resolve the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Football,
    Basketball,
    Baseball,
    Hockey,
    Soccer,
    CardGames,
    #[default]
    Unknown,
}

impl Sport {
    /// Classified sports in cascade order (excludes `Unknown`)
    pub const CASCADE_ORDER: [Self; 6] = [
        Self::Football,
        Self::Basketball,
        Self::Baseball,
        Self::Hockey,
        Self::Soccer,
        Self::CardGames,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Football => "football",
            Self::Basketball => "basketball",
            Self::Baseball => "baseball",
            Self::Hockey => "hockey",
            Self::Soccer => "soccer",
            Self::CardGames => "card_games",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Position in the cascade; `Unknown` sorts last
    #[must_use]
    pub fn cascade_rank(self) -> usize {
        Self::CASCADE_ORDER
            .iter()
            .position(|s| *s == self)
            .unwrap_or(Self::CASCADE_ORDER.len())
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = std::convert::Infallible;

    /// Lenient parse used for table metadata and lookup responses.
    /// Anything unrecognised maps to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sport = match s.trim().to_ascii_lowercase().as_str() {
            "football" | "nfl" | "american football" => Self::Football,
            "basketball" | "nba" | "wnba" => Self::Basketball,
            "baseball" | "mlb" => Self::Baseball,
            "hockey" | "nhl" => Self::Hockey,
            "soccer" | "futbol" | "mls" => Self::Soccer,
            "card_games" | "card games" | "cardgames" | "tcg" | "pokemon" => Self::CardGames,
            _ => Self::Unknown,
        };
        Ok(sport)
    }
}
