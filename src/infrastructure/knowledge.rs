//! Knowledge tables: data-driven vocabularies with specificity-ranked matching
//!
//! Tables are loaded once per process (or per explicit reload) and shared
//! read-only across every extraction.

pub mod aliases;
pub mod base;
pub mod registry;
pub mod source;
pub mod table;
pub mod tokens;

pub use aliases::{AliasRecord, AliasTable, AliasedWord};
pub use base::{KnowledgeBase, TagSet};
pub use registry::{KnowledgeRegistry, load_knowledge_base};
pub use source::{
    CatalogKnowledgeSource, CatalogSource, DirectoryKnowledgeSource, EmbeddedKnowledgeSource, InMemoryCatalog,
    KnowledgeSource,
};
pub use table::{KnowledgeTable, TableFile};
pub use tokens::{Token, tokenize};
