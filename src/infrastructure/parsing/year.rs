//! Release year extractor

use super::{FieldExtractor, FieldInput, Located};
use crate::infrastructure::knowledge::Token;

/// First four-digit year in `[min_year, current_year + 1]`.
///
/// Tokens carrying `/` or `#` belong to print runs and card numbers and are
/// never read as years. A season (`2021-22`) yields its first year.
#[derive(Debug, Clone, Copy)]
pub struct YearExtractor {
    min_year: u16,
    max_year: u16,
}

impl YearExtractor {
    pub const fn new(min_year: u16, current_year: u16) -> Self {
        Self {
            min_year,
            max_year: current_year.saturating_add(1),
        }
    }

    pub const fn max_year(&self) -> u16 {
        self.max_year
    }

    pub const fn in_range(&self, year: u16) -> bool {
        year >= self.min_year && year <= self.max_year
    }

    /// Year value of a token, if the token reads as one
    pub fn year_of(&self, token: &Token<'_>) -> Option<u16> {
        if token.raw.contains(['/', '#']) {
            return None;
        }
        let digits = match token.core.split_once('-') {
            Some((head, tail)) if tail.len() == 2 && tail.chars().all(|c| c.is_ascii_digit()) => head,
            Some(_) => return None,
            None => token.core,
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|&year| self.in_range(year))
    }
}

impl FieldExtractor for YearExtractor {
    type Output = Located<u16>;

    fn extract(&self, input: &FieldInput<'_>) -> Option<Located<u16>> {
        input
            .free_tokens()
            .find_map(|token| self.year_of(token).map(|year| Located::new(year, token.start, token.end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::test_support::{KNOWLEDGE, Tagged};

    fn year(text: &str) -> Option<u16> {
        let tagged = Tagged::new(text, None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        YearExtractor::new(1900, 2025).extract(&input).map(|y| y.value)
    }

    #[test]
    fn test_first_year_in_range() {
        assert_eq!(year("2021 Panini Prizm Ja'marr Chase"), Some(2021));
        assert_eq!(year("Topps 1952 Mickey Mantle 311"), Some(1952));
        assert_eq!(year("2026 Bowman Chrome"), Some(2026));
    }

    #[test]
    fn test_out_of_range_years_rejected() {
        assert_eq!(year("2027 Bowman Chrome"), None);
        assert_eq!(year("1850 Trade Card"), None);
    }

    #[test]
    fn test_print_run_and_card_number_are_not_years() {
        assert_eq!(year("Mike Trout /2011 #2011"), None);
        assert_eq!(year("Prizm 1999/2000 2019 Zion"), Some(2019));
    }

    #[test]
    fn test_season_notation() {
        assert_eq!(year("2021-22 Upper Deck Young Guns"), Some(2021));
        assert_eq!(year("2021-2022 Hoops"), None);
    }
}
