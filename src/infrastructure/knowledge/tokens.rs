//! Whitespace tokenizer shared by table matching and name resolution

/// A whitespace-delimited token with its punctuation-trimmed core.
///
/// `start`/`end` are byte offsets of the trimmed core inside the source text,
/// so claimed spans never swallow neighbouring punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub raw: &'a str,
    pub core: &'a str,
    pub key: String,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !self.core.is_empty() && self.core.chars().all(|c| c.is_ascii_digit())
    }

    #[must_use]
    pub fn has_digit(&self) -> bool {
        self.core.chars().any(|c| c.is_ascii_digit())
    }
}

/// Comparison key: lowercase, outer punctuation trimmed, inner kept
/// (`Women's` → `women's`, `A.J.` → `a.j`, `Prizm-` → `prizm`).
#[must_use]
pub fn token_key(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Split text into tokens, dropping pure-punctuation fragments
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut bounds = Vec::new();
    let mut current: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), current) {
            (true, Some(s)) => {
                bounds.push((s, i));
                current = None;
            }
            (false, None) => current = Some(i),
            _ => {}
        }
    }
    if let Some(s) = current {
        bounds.push((s, text.len()));
    }

    for (raw_start, raw_end) in bounds {
        let raw = &text[raw_start..raw_end];
        let leading = raw.len() - raw.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let core = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if core.is_empty() {
            continue;
        }

        let start = raw_start + leading;
        tokens.push(Token {
            raw,
            core,
            key: core.to_lowercase(),
            start,
            end: start + core.len(),
        });
    }

    tokens
}

/// Pattern keys for a vocabulary entry
#[must_use]
pub fn pattern_keys(pattern: &str) -> Vec<String> {
    pattern
        .split_whitespace()
        .map(token_key)
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_point_at_trimmed_core() {
        let text = "Prizm- Ja'marr  #123";
        let tokens = tokenize(text);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].core, "Prizm");
        assert_eq!(&text[tokens[1].start..tokens[1].end], "Ja'marr");
        assert_eq!(tokens[2].core, "123");
        assert_eq!(tokens[2].raw, "#123");
        assert!(tokens[2].is_numeric());
    }

    #[test]
    fn test_punctuation_only_tokens_dropped() {
        let tokens = tokenize("Chase - / Rookie");
        let keys: Vec<_> = tokens.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["chase", "rookie"]);
    }

    #[test]
    fn test_pattern_keys_keep_inner_apostrophe() {
        assert_eq!(
            pattern_keys("Chrome UEFA Women's Champions League"),
            vec!["chrome", "uefa", "women's", "champions", "league"]
        );
    }
}
