//! Card number extractor

use super::year::YearExtractor;
use super::{FieldExtractor, FieldInput, Located};
use crate::domain::Category;
use crate::infrastructure::knowledge::Token;

const MAX_HASH_LEN: usize = 12;
const MAX_BARE_LEN: usize = 10;

/// Card numbers are stored uppercase without the leading `#`.
///
/// Preference order: an explicit `#123`/`#RPA-JC`, then a standalone
/// letter-digit code (`BDC-1`, `US175`), then a bare one-to-four digit
/// number. Years, seasons, ordinals, print runs and grading codes never
/// qualify.
#[derive(Debug, Clone, Copy)]
pub struct CardNumberExtractor {
    years: YearExtractor,
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_ordinal(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    ["st", "nd", "rd", "th"].iter().any(|suffix| {
        lower
            .strip_suffix(suffix)
            .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
    })
}

impl CardNumberExtractor {
    pub const fn new(years: YearExtractor) -> Self {
        Self { years }
    }

    fn is_grading_code(input: &FieldInput<'_>, word: &str) -> bool {
        let letters: String = word.chars().take_while(char::is_ascii_alphabetic).collect();
        !letters.is_empty() && input.knowledge.whole_match(Category::Grading, &letters).is_some()
    }

    fn hashed(&self, input: &FieldInput<'_>, token: &Token<'_>) -> Option<String> {
        let code = token.raw.strip_prefix('#')?.trim_end_matches(['.', ',', ')']);
        let valid = !code.is_empty()
            && code.len() <= MAX_HASH_LEN
            && code.chars().all(is_code_char)
            && code.chars().any(|c| c.is_ascii_alphanumeric())
            && !Self::is_grading_code(input, code);
        valid.then(|| code.trim_matches('-').to_ascii_uppercase())
    }

    fn standalone(&self, input: &FieldInput<'_>, token: &Token<'_>) -> Option<String> {
        let code = token.core;
        let has_letter = code.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = code.chars().any(|c| c.is_ascii_digit());
        let valid = has_letter
            && has_digit
            && code.len() <= MAX_BARE_LEN
            && code.chars().all(is_code_char)
            && !is_ordinal(code)
            && !Self::is_grading_code(input, code)
            && self.years.year_of(token).is_none();
        valid.then(|| code.to_ascii_uppercase())
    }

    fn bare_number(&self, token: &Token<'_>) -> Option<String> {
        let valid = token.is_numeric()
            && token.core.len() <= 4
            && token.raw.len() == token.core.len()
            && self.years.year_of(token).is_none();
        valid.then(|| token.core.trim_start_matches('0').to_string()).filter(|n| !n.is_empty())
    }
}

impl FieldExtractor for CardNumberExtractor {
    type Output = Located<String>;

    fn extract(&self, input: &FieldInput<'_>) -> Option<Located<String>> {
        let candidates: Vec<&Token<'_>> = input
            .free_tokens()
            .filter(|t| !t.raw.contains('/'))
            .collect();
        let located = |t: &Token<'_>, value: String| Located::new(value, t.start, t.end);

        candidates
            .iter()
            .find_map(|t| self.hashed(input, t).map(|v| located(t, v)))
            .or_else(|| {
                candidates
                    .iter()
                    .find_map(|t| self.standalone(input, t).map(|v| located(t, v)))
            })
            .or_else(|| candidates.iter().find_map(|t| self.bare_number(t).map(|v| located(t, v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::test_support::{KNOWLEDGE, Tagged};

    fn number(text: &str) -> Option<String> {
        let tagged = Tagged::new(text, None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        CardNumberExtractor::new(YearExtractor::new(1900, 2025))
            .extract(&input)
            .map(|n| n.value)
    }

    #[test]
    fn test_hash_number_preferred() {
        assert_eq!(number("2024 Panini Prizm Anthony Edwards Bulls #123").as_deref(), Some("123"));
        assert_eq!(number("2023 Bowman Chrome BDC-1 #rpa-jc").as_deref(), Some("RPA-JC"));
    }

    #[test]
    fn test_alphanumeric_code() {
        assert_eq!(number("2023 Bowman Chrome Paul Skenes bdc-1").as_deref(), Some("BDC-1"));
        assert_eq!(number("Topps Update US175 Mike Trout").as_deref(), Some("US175"));
    }

    #[test]
    fn test_bare_number_fallback() {
        assert_eq!(number("Topps 1952 Mickey Mantle 311").as_deref(), Some("311"));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(number("2021 Prizm 12/99"), None);
        assert_eq!(number("Charizard 1st Edition"), None);
        assert_eq!(number("2021-22 Young Guns"), None);
        assert_eq!(number("Connor Bedard PSA10"), None);
        assert_eq!(number("San Francisco 49ers Brock Purdy"), None);
    }
}
