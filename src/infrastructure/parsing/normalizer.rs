//! Lexical normalizer for raw listing titles
//!
//! Passes run in a fixed order: fold, protect idioms, strip grading and
//! vendor noise, filter characters, clean words, restore idioms. The
//! normalizer is a pure function of its rules and the input.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::infrastructure::extraction_error::KnowledgeError;

const EMBEDDED_RULES: &str = include_str!("../../../data/normalizer.json");

/// Normalizer vocabulary, loaded from `data/normalizer.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizerRules {
    pub version: String,
    /// Multi-word idioms shielded from the destructive passes
    pub protected: Vec<String>,
    /// Grading company codes stripped together with their grade
    pub grading_companies: Vec<String>,
    /// Vendor filler words and phrases, matched word by word
    pub noise: Vec<String>,
}

impl NormalizerRules {
    pub fn embedded() -> Result<Self, KnowledgeError> {
        Self::from_json("embedded:normalizer.json", EMBEDDED_RULES)
    }

    pub fn from_json(path: &str, raw: &str) -> Result<Self, KnowledgeError> {
        serde_json::from_str(raw).map_err(|source| KnowledgeError::Format {
            path: path.to_string(),
            source,
        })
    }
}

/// An idiom that survived normalization verbatim, with its byte range in
/// the normalized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Normalizer output; owned by one extraction pass and never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub protected: Vec<ProtectedSpan>,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LexicalNormalizer {
    version: String,
    protected: Option<Regex>,
    graded: Option<Regex>,
    grade_phrase: Regex,
    cert: Regex,
    joined_run: Regex,
    bare_run: Regex,
    hash_gap: Regex,
    noise: Vec<Vec<String>>,
}

fn compile(rule: &str) -> Result<Regex, KnowledgeError> {
    Regex::new(rule).map_err(|source| KnowledgeError::InvalidRule {
        rule: rule.to_string(),
        source,
    })
}

/// Case-insensitive whole-word alternation, longest phrase first
fn alternation(phrases: &[String]) -> Option<String> {
    let mut escaped: Vec<String> = phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    Some(escaped.join("|"))
}

impl LexicalNormalizer {
    pub fn new(rules: &NormalizerRules) -> Result<Self, KnowledgeError> {
        let protected = alternation(&rules.protected)
            .map(|alt| compile(&format!(r"(?i)\b(?:{alt})\b")))
            .transpose()?;
        let graded = alternation(&rules.grading_companies)
            .map(|alt| {
                compile(&format!(
                    r"(?i)\b(?:{alt})\s*-?\s*(?:GEM\s*-?\s*(?:MT|MINT)\s*|MINT\s*)?(?:10|\d(?:\.5)?)\b(?:\s*/\s*10\b)?"
                ))
            })
            .transpose()?;

        let noise = rules
            .noise
            .iter()
            .map(|phrase| phrase.split_whitespace().map(noise_key).collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();

        Ok(Self {
            version: rules.version.clone(),
            protected,
            graded,
            grade_phrase: compile(r"(?i)\bGEM\s*-?\s*(?:MT|MINT)\b(?:\s*(?:10|\d(?:\.5)?)\b)?")?,
            cert: compile(r"(?i)\bCERT(?:IFICATION)?\s*(?:#|NO\.?|NUMBER)?\s*:?\s*\d+")?,
            joined_run: compile(r"(\d)\s*/\s*(\d)")?,
            bare_run: compile(r"(^|\s)/\s+(\d)")?,
            hash_gap: compile(r"#\s+([A-Za-z0-9])")?,
            noise,
        })
    }

    /// Normalizer over the embedded rules file
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::new(&NormalizerRules::embedded()?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let folded = fold_text(raw);

        let mut shielded = Vec::new();
        let guarded = match &self.protected {
            Some(re) => re
                .replace_all(&folded, |caps: &regex::Captures<'_>| {
                    let original = caps[0].to_string();
                    let slug = placeholder(&original);
                    shielded.push((slug.clone(), original));
                    format!(" {slug} ")
                })
                .into_owned(),
            None => folded,
        };

        let stripped = self.strip_grading(&guarded);
        let quiet = self.strip_noise(&stripped);
        let filtered = filter_chars(&quiet);
        let joined = self.join_numeric(&filtered);

        restore(clean_words(&joined), shielded)
    }

    fn strip_grading(&self, text: &str) -> String {
        let text = match &self.graded {
            Some(re) => re.replace_all(text, " ").into_owned(),
            None => text.to_string(),
        };
        let text = self.grade_phrase.replace_all(&text, " ");
        self.cert.replace_all(&text, " ").into_owned()
    }

    fn strip_noise(&self, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        let keys: Vec<String> = words.iter().map(|w| noise_key(w)).collect();
        let mut kept = Vec::with_capacity(words.len());
        let mut i = 0;

        'words: while i < words.len() {
            for phrase in &self.noise {
                let n = phrase.len();
                if i + n <= keys.len() && keys[i..i + n] == phrase[..] {
                    i += n;
                    continue 'words;
                }
            }
            kept.push(words[i]);
            i += 1;
        }

        kept.join(" ")
    }

    fn join_numeric(&self, text: &str) -> String {
        let text = self.joined_run.replace_all(text, "$1/$2");
        let text = self.bare_run.replace_all(&text, "$1/$2");
        self.hash_gap.replace_all(&text, "#$1").into_owned()
    }
}

/// Comparison key for noise matching: lowercase, trailing `!`/`.` dropped
fn noise_key(word: &str) -> String {
    word.trim_end_matches(['!', '.', ',']).to_lowercase()
}

/// `1st Edition` → `1ST_EDITION`
fn placeholder(original: &str) -> String {
    let mut slug = String::with_capacity(original.len());
    for c in original.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_uppercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Typographic folding: curly quotes, dashes, accented Latin letters.
/// Raw underscores become spaces so only placeholders carry them.
fn fold_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' | '`' | '\u{00B4}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '_' => out.push(' '),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            _ => out.push(strip_accent(c)),
        }
    }
    out
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' => 'A',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ě' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'ī' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ī' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ō' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ū' | 'Ů' => 'U',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'š' | 'ś' => 's',
        'Š' | 'Ś' => 'S',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ř' => 'r',
        'Ř' => 'R',
        other => other,
    }
}

/// Keep ASCII alphanumerics and `# / . - '`; everything else becomes a space
fn filter_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '#' | '/' | '.' | '-' | '\'' | '_' => c,
            _ => ' ',
        })
        .collect()
}

/// Drop stray hyphens and punctuation-only words, then collapse consecutive
/// duplicates (`Prizm Prizm` → `Prizm`)
fn clean_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let word = word.trim_matches('-');
        if !word.chars().any(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        let duplicate = words
            .last()
            .is_some_and(|last| last.eq_ignore_ascii_case(word));
        if !duplicate {
            words.push(word.to_string());
        }
    }
    words
}

fn restore(words: Vec<String>, mut shielded: Vec<(String, String)>) -> NormalizedText {
    let mut text = String::new();
    let mut protected = Vec::new();

    for word in words {
        if !text.is_empty() {
            text.push(' ');
        }
        let pending = shielded.iter().position(|(slug, _)| *slug == word);
        match pending {
            Some(idx) => {
                let (_, original) = shielded.remove(idx);
                let start = text.len();
                text.push_str(&original);
                protected.push(ProtectedSpan {
                    text: original,
                    start,
                    end: text.len(),
                });
            }
            None => text.push_str(&word),
        }
    }

    NormalizedText { text, protected }
}
