//! Knowledge sources: embedded data files, a directory of table files, or a
//! read-only product/parallel catalog layered over either of them.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::aliases::{AliasFile, AliasTable};
use super::table::{KnowledgeTable, TableFile};
use crate::domain::{CatalogParallel, CatalogSet, Category, KnowledgeEntry};
use crate::infrastructure::extraction_error::KnowledgeError;

/// Where knowledge tables come from. Implementations are read-only.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &str;
    async fn load_table(&self, category: Category) -> Result<KnowledgeTable, KnowledgeError>;
    async fn load_aliases(&self) -> Result<AliasTable, KnowledgeError>;
}

/// Product/parallel catalog query interface (the scraper-fed catalog database)
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn get_all_sets(&self) -> Result<Vec<CatalogSet>, KnowledgeError>;
    async fn get_parallels_for_set(&self, set_name: &str) -> Result<Vec<CatalogParallel>, KnowledgeError>;
}

fn parse_table(path: &str, raw: &str, category: Category) -> Result<KnowledgeTable, KnowledgeError> {
    let file: TableFile = serde_json::from_str(raw).map_err(|source| KnowledgeError::Format {
        path: path.to_string(),
        source,
    })?;
    if file.category.parse::<Category>().ok() != Some(category) {
        return Err(KnowledgeError::CategoryMismatch {
            path: path.to_string(),
            expected: category,
            found: file.category,
        });
    }
    Ok(KnowledgeTable::from_file(file, category))
}

fn parse_aliases(path: &str, raw: &str) -> Result<AliasTable, KnowledgeError> {
    serde_json::from_str::<AliasFile>(raw)
        .map(AliasTable::from_file)
        .map_err(|source| KnowledgeError::Format {
            path: path.to_string(),
            source,
        })
}

/// Tables compiled into the binary from `data/knowledge/`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedKnowledgeSource;

impl EmbeddedKnowledgeSource {
    const ALIASES: &'static str = include_str!("../../../data/knowledge/aliases.json");

    const fn raw(category: Category) -> &'static str {
        match category {
            Category::Grading => include_str!("../../../data/knowledge/grading.json"),
            Category::CardType => include_str!("../../../data/knowledge/card_types.json"),
            Category::Player => include_str!("../../../data/knowledge/players.json"),
            Category::Brand => include_str!("../../../data/knowledge/brands.json"),
            Category::Product => include_str!("../../../data/knowledge/products.json"),
            Category::Parallel => include_str!("../../../data/knowledge/parallels.json"),
            Category::Team => include_str!("../../../data/knowledge/teams.json"),
            Category::Position => include_str!("../../../data/knowledge/positions.json"),
            Category::SportName => include_str!("../../../data/knowledge/sport_names.json"),
            Category::Residual => include_str!("../../../data/knowledge/residual.json"),
        }
    }

    pub fn load_table_sync(category: Category) -> Result<KnowledgeTable, KnowledgeError> {
        let path = format!("embedded:{}.json", category.file_stem());
        parse_table(&path, Self::raw(category), category)
    }

    pub fn load_aliases_sync() -> Result<AliasTable, KnowledgeError> {
        parse_aliases("embedded:aliases.json", Self::ALIASES)
    }
}

#[async_trait]
impl KnowledgeSource for EmbeddedKnowledgeSource {
    fn name(&self) -> &str {
        "embedded"
    }

    async fn load_table(&self, category: Category) -> Result<KnowledgeTable, KnowledgeError> {
        Self::load_table_sync(category)
    }

    async fn load_aliases(&self) -> Result<AliasTable, KnowledgeError> {
        Self::load_aliases_sync()
    }
}

/// Flat JSON table files in a directory, one per category (`brands.json`, …)
#[derive(Debug, Clone)]
pub struct DirectoryKnowledgeSource {
    dir: PathBuf,
    label: String,
}

impl DirectoryKnowledgeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = format!("directory:{}", dir.display());
        Self { dir, label }
    }

    async fn read(&self, file_name: &str) -> Result<(String, String), KnowledgeError> {
        let path = self.dir.join(file_name);
        let display = path.display().to_string();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| KnowledgeError::Io {
                path: display.clone(),
                source,
            })?;
        Ok((display, raw))
    }
}

#[async_trait]
impl KnowledgeSource for DirectoryKnowledgeSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn load_table(&self, category: Category) -> Result<KnowledgeTable, KnowledgeError> {
        let (path, raw) = self.read(&format!("{}.json", category.file_stem())).await?;
        parse_table(&path, &raw, category)
    }

    async fn load_aliases(&self) -> Result<AliasTable, KnowledgeError> {
        let (path, raw) = self.read("aliases.json").await?;
        parse_aliases(&path, &raw)
    }
}

/// In-process catalog, used for tests and static deployments
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    sets: Vec<CatalogSet>,
    parallels: HashMap<String, Vec<CatalogParallel>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_set(mut self, set: CatalogSet, parallels: Vec<CatalogParallel>) -> Self {
        self.parallels.insert(set.set_name.clone(), parallels);
        self.sets.push(set);
        self
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn get_all_sets(&self) -> Result<Vec<CatalogSet>, KnowledgeError> {
        Ok(self.sets.clone())
    }

    async fn get_parallels_for_set(&self, set_name: &str) -> Result<Vec<CatalogParallel>, KnowledgeError> {
        Ok(self.parallels.get(set_name).cloned().unwrap_or_default())
    }
}

/// Layers catalog sets and parallels over a base source.
///
/// Catalog products are appended after the base entries, so hand-curated
/// patterns keep declaration priority on exact ties. A catalog failure
/// degrades to the base table.
pub struct CatalogKnowledgeSource<S, C> {
    base: S,
    catalog: C,
    label: String,
}

impl<S: KnowledgeSource, C: CatalogSource> CatalogKnowledgeSource<S, C> {
    pub fn new(base: S, catalog: C) -> Self {
        let label = format!("{}+catalog", base.name());
        Self { base, catalog, label }
    }

    async fn catalog_products(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let sets = self.catalog.get_all_sets().await?;
        Ok(sets
            .into_iter()
            .map(|set| KnowledgeEntry {
                pattern: set.set_name.clone(),
                label: Some(set.set_name),
                sport: Some(set.sport).filter(|s| s.is_known()),
                year: set.year,
                brand: set.brand,
                print_run: None,
                rarity: None,
            })
            .collect())
    }

    async fn catalog_parallels(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let sets = self.catalog.get_all_sets().await?;
        // BTreeMap keyed by lowercase name keeps the merged order stable
        let mut merged: BTreeMap<String, KnowledgeEntry> = BTreeMap::new();

        for set in sets {
            let parallels = match self.catalog.get_parallels_for_set(&set.set_name).await {
                Ok(parallels) => parallels,
                Err(e) => {
                    warn!("Skipping parallels for set '{}': {}", set.set_name, e);
                    continue;
                }
            };
            for parallel in parallels {
                let key = parallel.name.to_lowercase();
                let entry = merged.entry(key).or_insert_with(|| KnowledgeEntry::new(parallel.name.clone()));
                entry.print_run = entry.print_run.or(parallel.print_run);
                if entry.rarity.is_none() {
                    entry.rarity = parallel.rarity.clone();
                }
            }
        }

        Ok(merged.into_values().collect())
    }
}

#[async_trait]
impl<S: KnowledgeSource, C: CatalogSource> KnowledgeSource for CatalogKnowledgeSource<S, C> {
    fn name(&self) -> &str {
        &self.label
    }

    async fn load_table(&self, category: Category) -> Result<KnowledgeTable, KnowledgeError> {
        let base = self.base.load_table(category).await?;
        let extra = match category {
            Category::Product => self.catalog_products().await,
            Category::Parallel => self.catalog_parallels().await,
            _ => return Ok(base),
        };

        match extra {
            Ok(extra) => {
                debug!("Catalog contributed {} {} entries", extra.len(), category);
                let version = format!("{}+catalog", base.version());
                let mut entries: Vec<KnowledgeEntry> = base.entries().cloned().collect();
                for entry in extra {
                    // parallels are name-only: enrich an existing pattern instead of shadowing it
                    let existing = (category == Category::Parallel)
                        .then(|| entries.iter_mut().find(|e| e.pattern.eq_ignore_ascii_case(&entry.pattern)))
                        .flatten();
                    match existing {
                        Some(known) => {
                            known.print_run = known.print_run.or(entry.print_run);
                            if known.rarity.is_none() {
                                known.rarity = entry.rarity;
                            }
                        }
                        None => entries.push(entry),
                    }
                }
                Ok(KnowledgeTable::new(category, version, entries))
            }
            Err(e) => {
                warn!("Catalog unavailable for {}, using base table only: {}", category, e);
                Ok(base)
            }
        }
    }

    async fn load_aliases(&self) -> Result<AliasTable, KnowledgeError> {
        self.base.load_aliases().await
    }
}

/// Record a successful load
pub(crate) fn log_loaded(source: &str, table: &KnowledgeTable) {
    info!(
        "Loaded {} table from {}: {} entries (version {})",
        table.category(),
        source,
        table.len(),
        table.version()
    );
}
