//! Brand, product and parallel fields read from the knowledge tags

use super::{FieldExtractor, FieldInput};
use crate::domain::{Category, KnowledgeEntry, Match};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFields {
    pub brand: Option<String>,
    pub product: Option<String>,
    pub parallel: Option<String>,
    /// Print run the catalog records for the matched parallel
    pub parallel_print_run: Option<u32>,
    pub short_print: bool,
}

impl CatalogFields {
    pub const fn is_empty(&self) -> bool {
        self.brand.is_none() && self.product.is_none() && self.parallel.is_none()
    }
}

/// First accepted match per category. When no brand token survives overlap
/// resolution (`Donruss Optic`, `Bowman Chrome`), the brand is backfilled
/// from the product entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogFieldExtractor;

impl CatalogFieldExtractor {
    fn first<'a>(input: &FieldInput<'a>, category: Category) -> Option<(&'a Match, Option<&'a KnowledgeEntry>)> {
        let knowledge = input.knowledge;
        input
            .tags
            .accepted_in(category)
            .next()
            .map(|m| (m, knowledge.entry_for(m)))
    }
}

impl FieldExtractor for CatalogFieldExtractor {
    type Output = CatalogFields;

    fn extract(&self, input: &FieldInput<'_>) -> Option<CatalogFields> {
        let product = Self::first(input, Category::Product);
        let parallel = Self::first(input, Category::Parallel);

        let brand = Self::first(input, Category::Brand)
            .map(|(m, _)| m.label.clone())
            .or_else(|| product.and_then(|(_, entry)| entry?.brand.clone()));

        let fields = CatalogFields {
            brand,
            product: product.map(|(m, _)| m.label.clone()),
            parallel: parallel.map(|(m, _)| m.label.clone()),
            parallel_print_run: parallel.and_then(|(_, entry)| entry?.print_run),
            short_print: parallel
                .and_then(|(_, entry)| entry)
                .is_some_and(KnowledgeEntry::is_short_print),
        };

        (!fields.is_empty()).then_some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::test_support::{KNOWLEDGE, Tagged};

    fn fields(text: &str, year: Option<u16>) -> CatalogFields {
        let tagged = Tagged::new(text, year);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        CatalogFieldExtractor.extract(&input).unwrap_or_default()
    }

    #[test]
    fn test_specific_product_over_chrome() {
        let f = fields("2021 Topps Chrome UEFA Women's Champions League Tobin Heath /25", Some(2021));
        assert_eq!(f.brand.as_deref(), Some("Topps"));
        assert_eq!(f.product.as_deref(), Some("Chrome UEFA Women's Champions League"));
        assert_eq!(f.parallel, None);
    }

    #[test]
    fn test_parallel_after_product() {
        let f = fields("2021 Panini Prizm Ja'marr Chase Rookie Pink Prizm", Some(2021));
        assert_eq!(f.product.as_deref(), Some("Prizm"));
        assert_eq!(f.parallel.as_deref(), Some("Pink Prizm"));
    }

    #[test]
    fn test_brand_backfilled_from_product() {
        let f = fields("2023 Bowman Chrome Paul Skenes Gold Refractor", Some(2023));
        assert_eq!(f.product.as_deref(), Some("Bowman Chrome"));
        assert_eq!(f.brand.as_deref(), Some("Bowman"));
        assert_eq!(f.parallel.as_deref(), Some("Gold Refractor"));
    }

    #[test]
    fn test_parallel_metadata() {
        let f = fields("2020 Topps Chrome Superfractor Luis Robert", Some(2020));
        assert_eq!(f.parallel_print_run, Some(1));
        assert!(f.short_print);
    }

    #[test]
    fn test_nothing_recognised() {
        let tagged = Tagged::new("vintage lot", None);
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        assert!(CatalogFieldExtractor.extract(&input).is_none());
    }
}
