//! Title parsing infrastructure: normalizer, field extractors, player-name
//! resolver, sport classifier and summary composer.
//!
//! Every extractor reads the same tagged token stream, so they are
//! independent of each other and safe to run concurrently.

pub mod card_number;
pub mod card_type;
pub mod catalog_fields;
pub mod normalizer;
pub mod player_name;
pub mod print_run;
pub mod sport_classifier;
pub mod summary;
pub mod year;

pub use card_number::CardNumberExtractor;
pub use card_type::CardTypeExtractor;
pub use catalog_fields::{CatalogFieldExtractor, CatalogFields};
pub use normalizer::{LexicalNormalizer, NormalizedText, NormalizerRules, ProtectedSpan};
pub use player_name::PlayerNameResolver;
pub use print_run::PrintRunExtractor;
pub use sport_classifier::{SportClassifier, SportDecision, SportStrategy};
pub use summary::{ConfidenceWeights, SummaryComposer, SummaryFields};
pub use year::YearExtractor;

use crate::infrastructure::knowledge::{KnowledgeBase, TagSet, Token};

/// Shared, read-only view of one normalized title
#[derive(Debug, Clone, Copy)]
pub struct FieldInput<'a> {
    pub text: &'a str,
    pub tokens: &'a [Token<'a>],
    pub tags: &'a TagSet,
    pub knowledge: &'a KnowledgeBase,
}

impl<'a> FieldInput<'a> {
    pub const fn new(text: &'a str, tokens: &'a [Token<'a>], tags: &'a TagSet, knowledge: &'a KnowledgeBase) -> Self {
        Self {
            text,
            tokens,
            tags,
            knowledge,
        }
    }

    /// Whether an accepted knowledge span covers the token
    pub fn is_tagged(&self, token: &Token<'_>) -> bool {
        self.tags
            .accepted
            .iter()
            .any(|m| m.start < token.end && token.start < m.end)
    }

    /// Tokens outside every accepted knowledge span
    pub fn free_tokens(&self) -> impl Iterator<Item = &'a Token<'a>> {
        let input = *self;
        self.tokens.iter().filter(move |t| !input.is_tagged(t))
    }
}

/// A value with the byte range it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

impl<T> Located<T> {
    pub const fn new(value: T, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    pub const fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Pure extractor over a tagged title. `None` is a normal outcome.
pub trait FieldExtractor {
    type Output;

    fn extract(&self, input: &FieldInput<'_>) -> Option<Self::Output>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::infrastructure::knowledge::{KnowledgeBase, TagSet, Token, tokenize};
    use once_cell::sync::Lazy;

    pub static KNOWLEDGE: Lazy<KnowledgeBase> = Lazy::new(KnowledgeBase::builtin);

    /// Owns the pieces a `FieldInput` borrows
    pub struct Tagged {
        pub text: String,
        pub tags: TagSet,
    }

    impl Tagged {
        pub fn new(text: &str, year: Option<u16>) -> Self {
            let tags = KNOWLEDGE.tag(&tokenize(text), year);
            Self {
                text: text.to_string(),
                tags,
            }
        }

        pub fn tokens(&self) -> Vec<Token<'_>> {
            tokenize(&self.text)
        }
    }
}
