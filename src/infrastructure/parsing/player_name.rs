//! Player-name resolver
//!
//! Runs after the other extractors. Order of evidence:
//! 1. a caller-supplied hint that literally occurs in the title,
//! 2. a known player from the player table,
//! 3. a 2-3 word window over the words nothing else claimed.
//!
//! Step 3 rejects any window containing a denylisted word. When nothing
//! qualifies the result is `None`; a name is never guessed.

use tracing::trace;

use super::FieldInput;
use crate::domain::Category;
use crate::infrastructure::knowledge::tokens::{pattern_keys, token_key};
use crate::infrastructure::knowledge::{AliasedWord, KnowledgeBase, Token};

const SUFFIXES: &[(&str, &str)] = &[("jr", "Jr."), ("sr", "Sr."), ("ii", "II"), ("iii", "III"), ("iv", "IV")];
const PARTICLES: &[&str] = &["de", "la", "le", "del", "da", "di", "van", "von", "st", "du", "dos", "el"];

fn suffix_form(word: &str) -> Option<&'static str> {
    let key = token_key(word);
    SUFFIXES.iter().find(|(k, _)| *k == key).map(|(_, form)| *form)
}

fn is_particle(word: &str) -> bool {
    PARTICLES.contains(&token_key(word).as_str())
}

/// Letters first, then only letters and name punctuation
fn has_name_shape(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_alphabetic)
        && word.chars().all(|c| c.is_alphabetic() || matches!(c, '\'' | '-' | '.'))
}

/// Title-case words typed all-lower or all-upper; keep deliberate casing
fn display_case(word: &AliasedWord) -> String {
    if word.canonical {
        return word.text.clone();
    }
    if let Some(form) = suffix_form(&word.text) {
        return form.to_string();
    }
    let has_upper = word.text.chars().any(char::is_uppercase);
    let has_lower = word.text.chars().any(char::is_lowercase);
    if has_upper && has_lower {
        return word.text.clone();
    }

    let mut out = String::with_capacity(word.text.len());
    let mut boundary = true;
    for c in word.text.chars() {
        if boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        boundary = matches!(c, '-' | '\'' | '.');
    }
    out
}

/// Token text for name building. Short abbreviations keep their trailing
/// period (`Jr.`, `St.`, `C.J.`).
fn word_text<'a>(token: &Token<'a>) -> &'a str {
    let Some(offset) = token.raw.find(token.core) else {
        return token.core;
    };
    let end = offset + token.core.len();
    if token.core.len() <= 3 && token.raw[end..].starts_with('.') {
        &token.raw[offset..=end]
    } else {
        token.core
    }
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerNameResolver {
    min_chars: usize,
    max_chars: usize,
}

impl Default for PlayerNameResolver {
    fn default() -> Self {
        Self::new(3, 30)
    }
}

impl PlayerNameResolver {
    pub const fn new(min_chars: usize, max_chars: usize) -> Self {
        Self { min_chars, max_chars }
    }

    /// `claimed` holds byte ranges consumed by the numeric extractors
    pub fn resolve(&self, input: &FieldInput<'_>, claimed: &[(usize, usize)], hint: Option<&str>) -> Option<String> {
        if let Some(name) = hint.and_then(|h| Self::hint_in_title(input, h)) {
            trace!("Player name from context hint: {}", name);
            return Some(name);
        }

        if let Some(known) = input.tags.accepted_in(Category::Player).next() {
            return Some(known.label.clone());
        }

        let name = Self::segments(input, claimed)
            .into_iter()
            .find_map(|segment| self.best_window(input.knowledge, &segment))?;

        // a heuristic name that spells a known player takes the table's form
        Some(
            input
                .knowledge
                .whole_match(Category::Player, &name)
                .map_or(name, |m| m.label),
        )
    }

    fn hint_in_title(input: &FieldInput<'_>, hint: &str) -> Option<String> {
        let wanted = pattern_keys(hint);
        if wanted.is_empty() {
            return None;
        }

        let plain: Vec<String> = input.tokens.iter().map(|t| t.key.clone()).collect();
        let words: Vec<&str> = input.tokens.iter().map(|t| t.core).collect();
        let aliased: Vec<String> = input
            .knowledge
            .aliases()
            .apply(&words)
            .iter()
            .flat_map(|w| pattern_keys(&w.text))
            .collect();

        (contains_run(&plain, &wanted) || contains_run(&aliased, &wanted))
            .then(|| hint.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Runs of unclaimed words. A removed token splits the run, so a window
    /// never bridges a team name or a number.
    fn segments<'a>(input: &FieldInput<'a>, claimed: &[(usize, usize)]) -> Vec<Vec<&'a str>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for token in input.tokens {
            let removed = input.is_tagged(token)
                || token.has_digit()
                || claimed.iter().any(|&(s, e)| s < token.end && token.start < e);
            if removed {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(word_text(token));
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    fn best_window(&self, knowledge: &KnowledgeBase, segment: &[&str]) -> Option<String> {
        let words: Vec<AliasedWord> = knowledge
            .aliases()
            .apply(segment)
            .into_iter()
            .filter(|w| w.canonical || w.text.chars().filter(|c| c.is_alphabetic()).count() > 1)
            .collect();

        for i in 0..words.len() {
            let wide = i + 2 < words.len() && (suffix_form(&words[i + 2].text).is_some() || is_particle(&words[i + 1].text));
            if wide {
                if let Some(name) = self.accept(knowledge, &words[i..i + 3]) {
                    return Some(name);
                }
            }
            if i + 1 < words.len() {
                if let Some(name) = self.accept(knowledge, &words[i..i + 2]) {
                    return Some(name);
                }
            }
        }
        None
    }

    fn accept(&self, knowledge: &KnowledgeBase, window: &[AliasedWord]) -> Option<String> {
        let last = window.len() - 1;
        for (pos, word) in window.iter().enumerate() {
            let suffix = suffix_form(&word.text).is_some();
            let particle = is_particle(&word.text);
            let ok = match (pos, suffix, particle) {
                (0, true, _) | (0, _, true) => false,
                (p, true, _) => p == last && window.len() == 3,
                (p, _, true) => p != last,
                _ => word.canonical || (has_name_shape(&word.text) && !knowledge.is_denied(&word.text)),
            };
            if !ok {
                trace!("Rejected name window at '{}'", word.text);
                return None;
            }
        }

        let name = window.iter().map(display_case).collect::<Vec<_>>().join(" ");
        let chars = name.chars().count();
        (self.min_chars..=self.max_chars).contains(&chars).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::test_support::{KNOWLEDGE, Tagged};

    fn resolve_with(text: &str, hint: Option<&str>) -> Option<String> {
        let tagged = Tagged::new(text, None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        PlayerNameResolver::default().resolve(&input, &[], hint)
    }

    fn resolve(text: &str) -> Option<String> {
        resolve_with(text, None)
    }

    #[test]
    fn test_known_player_label() {
        assert_eq!(resolve("2021 Panini Prizm ja'marr chase Rookie").as_deref(), Some("Ja'Marr Chase"));
    }

    #[test]
    fn test_alias_restores_apostrophe() {
        assert_eq!(resolve("2021 Panini Prizm Ja marr Chase Rookie").as_deref(), Some("Ja'Marr Chase"));
    }

    #[test]
    fn test_team_word_is_never_part_of_a_name() {
        assert_eq!(resolve("2024 Panini Prizm Anthony Edwards Bulls #123").as_deref(), Some("Anthony Edwards"));
        assert_eq!(resolve("Bulls Anthony"), None);
    }

    #[test]
    fn test_denylisted_words_block_windows() {
        assert_eq!(resolve("2023 Gold Base Insert"), None);
        assert_eq!(resolve("2023"), None);
    }

    #[test]
    fn test_suffix_and_particle_windows() {
        assert_eq!(resolve("2019 Topps Marcus Freeman jr").as_deref(), Some("Marcus Freeman Jr."));
        assert_eq!(resolve("Topps Update Amon-Ra St. Brown").as_deref(), Some("Amon-Ra St. Brown"));
    }

    #[test]
    fn test_uppercase_title_is_title_cased() {
        assert_eq!(resolve("TOPPS CHROME TOBIN HEATH").as_deref(), Some("Tobin Heath"));
    }

    #[test]
    fn test_hint_must_occur_in_title() {
        assert_eq!(
            resolve_with("Prizm Anthony Edwards", Some("Anthony  Edwards")).as_deref(),
            Some("Anthony Edwards")
        );
        assert_eq!(resolve_with("Prizm Silver", Some("LeBron James")), None);
    }

    #[test]
    fn test_length_bounds() {
        let resolver = PlayerNameResolver::new(3, 10);
        let tagged = Tagged::new("Bartholomew Wellington", None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        assert_eq!(resolver.resolve(&input, &[], None), None);
    }

    #[test]
    fn test_claimed_span_splits_segment() {
        let tagged = Tagged::new("Sweet Card Alpha Omega", None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        // claim "Alpha" so no two free words remain adjacent on the right
        let claimed = [(tokens[2].start, tokens[2].end)];
        let name = PlayerNameResolver::default().resolve(&input, &claimed, None);
        assert_eq!(name, None);
    }
}
