//! Card-type flags from card-type vocabulary matches

use super::{FieldExtractor, FieldInput};
use crate::domain::{CardTypeFlags, Category};

/// Collects flags from every accepted card-type match; labels may carry
/// several flags (`RPA` → `rookie+auto+relic`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CardTypeExtractor;

impl FieldExtractor for CardTypeExtractor {
    type Output = CardTypeFlags;

    fn extract(&self, input: &FieldInput<'_>) -> Option<CardTypeFlags> {
        let mut flags = CardTypeFlags::new();
        for m in input.tags.accepted_in(Category::CardType) {
            flags.extend_from_label(&m.label);
        }
        (!flags.is_empty()).then_some(flags)
    }
}
