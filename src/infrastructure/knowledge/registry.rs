//! Shared knowledge snapshot with an explicit reload path

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use super::aliases::AliasTable;
use super::base::KnowledgeBase;
use super::source::{EmbeddedKnowledgeSource, KnowledgeSource, log_loaded};
use super::table::KnowledgeTable;
use crate::domain::Category;

/// Load every category from a source. A failing category degrades to an
/// empty table with a warning; loading itself never fails.
pub async fn load_knowledge_base(source: &dyn KnowledgeSource) -> KnowledgeBase {
    let mut tables = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        match source.load_table(category).await {
            Ok(table) => {
                log_loaded(source.name(), &table);
                tables.push(table);
            }
            Err(e) => {
                let degraded = e.into_extraction_error(category);
                warn!("{} (source {}), continuing with an empty table", degraded, source.name());
                tables.push(KnowledgeTable::empty(category));
            }
        }
    }

    let aliases = source.load_aliases().await.unwrap_or_else(|e| {
        warn!("Alias table unavailable from {}: {}", source.name(), e);
        AliasTable::default()
    });

    KnowledgeBase::new(tables, aliases)
}

impl KnowledgeBase {
    /// Snapshot built from the embedded data files, synchronously
    pub fn builtin() -> Self {
        let tables = Category::ALL
            .iter()
            .map(|&category| {
                EmbeddedKnowledgeSource::load_table_sync(category).unwrap_or_else(|e| {
                    warn!("Embedded {} table unavailable: {}", category, e);
                    KnowledgeTable::empty(category)
                })
            })
            .collect();
        let aliases = EmbeddedKnowledgeSource::load_aliases_sync().unwrap_or_else(|e| {
            warn!("Embedded alias table unavailable: {}", e);
            AliasTable::default()
        });
        Self::new(tables, aliases)
    }
}

/// Holds the current snapshot. Readers clone the `Arc` and keep using it
/// for the whole extraction even if a reload swaps it meanwhile.
#[derive(Debug)]
pub struct KnowledgeRegistry {
    current: RwLock<Arc<KnowledgeBase>>,
}

impl KnowledgeRegistry {
    pub fn new(base: KnowledgeBase) -> Self {
        Self {
            current: RwLock::new(Arc::new(base)),
        }
    }

    pub fn builtin() -> Self {
        Self::new(KnowledgeBase::builtin())
    }

    pub async fn load(source: &dyn KnowledgeSource) -> Self {
        Self::new(load_knowledge_base(source).await)
    }

    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Administrative reload; the only mutation path
    pub async fn reload(&self, source: &dyn KnowledgeSource) -> Arc<KnowledgeBase> {
        let fresh = Arc::new(load_knowledge_base(source).await);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, Arc::clone(&fresh))
        };
        info!(
            "Knowledge reloaded from {}: {} -> {}",
            source.name(),
            &previous.fingerprint()[..12],
            &fresh.fingerprint()[..12]
        );
        fresh
    }

    /// Swap in an already-built snapshot (tests, static deployments)
    pub fn replace(&self, base: KnowledgeBase) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(base);
    }
}

impl Default for KnowledgeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::knowledge::source::DirectoryKnowledgeSource;

    #[tokio::test]
    async fn test_empty_directory_degrades_to_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let base = load_knowledge_base(&DirectoryKnowledgeSource::new(dir.path())).await;
        assert!(base.tables().all(KnowledgeTable::is_empty));
        assert!(base.aliases().is_empty());
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot_but_keeps_old_readers_valid() {
        let registry = KnowledgeRegistry::builtin();
        let before = registry.snapshot();
        assert!(!before.table(Category::Brand).is_empty());

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brands.json"),
            r#"{"version":"2","category":"brand","entries":[{"pattern":"Leaf"}]}"#,
        )
        .unwrap();
        registry.reload(&DirectoryKnowledgeSource::new(dir.path())).await;

        let after = registry.snapshot();
        assert_eq!(after.table(Category::Brand).len(), 1);
        assert_eq!(after.table(Category::Brand).version(), "2");
        assert!(after.table(Category::Product).is_empty());
        // the earlier snapshot is untouched
        assert!(before.table(Category::Brand).len() > 1);
    }

    #[tokio::test]
    async fn test_category_mismatch_degrades() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("teams.json"),
            r#"{"version":"1","category":"brand","entries":[{"pattern":"Bulls"}]}"#,
        )
        .unwrap();
        let base = load_knowledge_base(&DirectoryKnowledgeSource::new(dir.path())).await;
        assert!(base.table(Category::Team).is_empty());
    }
}
