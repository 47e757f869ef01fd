//! In-memory store
//!
//! Holds every table in a [`MemorySeed`], which can be written by hand or
//! loaded from a YAML fixture. The item cache sits behind the same lock as the
//! tables, so create-if-absent is a single entry-API insert under the write
//! guard.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PmsStore;
use crate::models::{
    BranchTableEntry, CachedItem, CachedItemFilter, CatalogReference, Component,
    ComponentDescription, ConstructionDescription, DimensionalStandard, Material, PmsLine, Rating,
    ReducerTableEntry, Schedule, Scope, ScopedRow, Size, SizeRangeEntry, Specification,
    ValvePmsLine, ValveSubType,
};

/// Full contents of a [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySeed {
    pub specifications: Vec<Specification>,
    pub pms_lines: Vec<PmsLine>,
    pub valve_pms_lines: Vec<ValvePmsLine>,
    pub size_ranges: Vec<SizeRangeEntry>,
    pub components: Vec<Component>,
    pub component_descriptions: Vec<ComponentDescription>,
    pub sizes: Vec<Size>,
    pub schedules: Vec<Schedule>,
    pub ratings: Vec<Rating>,
    pub materials: Vec<Material>,
    pub dimensional_standards: Vec<DimensionalStandard>,
    pub catalog_references: Vec<CatalogReference>,
    pub construction_descriptions: Vec<ConstructionDescription>,
    pub valve_sub_types: Vec<ValveSubType>,
    pub branch_table: Vec<BranchTableEntry>,
    pub reducer_table: Vec<ReducerTableEntry>,
    pub cached_items: BTreeMap<String, CachedItem>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    seed: RwLock<MemorySeed>,
}

impl MemoryStore {
    pub fn new(seed: MemorySeed) -> Self {
        Self {
            seed: RwLock::new(seed),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let seed: MemorySeed =
            serde_yaml::from_str(yaml).context("Failed to parse PMS fixture YAML")?;
        Ok(Self::new(seed))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Apply an edit to the stored tables.
    pub async fn modify(&self, edit: impl FnOnce(&mut MemorySeed)) {
        let mut seed = self.seed.write().await;
        edit(&mut seed);
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> MemorySeed {
        self.seed.read().await.clone()
    }
}

fn scoped<T: ScopedRow + Clone>(rows: &[T], scope: Scope) -> Vec<T> {
    rows.iter()
        .filter(|row| scope.contains(row.project_id()))
        .cloned()
        .collect()
}

fn sorted_by_order<T: Clone>(rows: impl Iterator<Item = T>, order: impl Fn(&T) -> i32) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| order(row));
    rows
}

#[async_trait]
impl PmsStore for MemoryStore {
    async fn specification(&self, spec_id: Uuid) -> Result<Option<Specification>> {
        let seed = self.seed.read().await;
        Ok(seed
            .specifications
            .iter()
            .find(|s| s.spec_id == spec_id)
            .cloned())
    }

    async fn specifications_for_project(&self, project_id: Uuid) -> Result<Vec<Specification>> {
        let seed = self.seed.read().await;
        Ok(seed
            .specifications
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn pms_lines(&self, spec_id: Uuid) -> Result<Vec<PmsLine>> {
        let seed = self.seed.read().await;
        Ok(sorted_by_order(
            seed.pms_lines.iter().filter(|l| l.spec_id == spec_id).cloned(),
            |l| l.sort_order,
        ))
    }

    async fn valve_pms_lines(&self, spec_id: Uuid) -> Result<Vec<ValvePmsLine>> {
        let seed = self.seed.read().await;
        Ok(sorted_by_order(
            seed.valve_pms_lines
                .iter()
                .filter(|l| l.spec_id == spec_id)
                .cloned(),
            |l| l.sort_order,
        ))
    }

    async fn size_range(&self, spec_id: Uuid) -> Result<Vec<SizeRangeEntry>> {
        let seed = self.seed.read().await;
        Ok(seed
            .size_ranges
            .iter()
            .filter(|r| r.spec_id == spec_id)
            .cloned()
            .collect())
    }

    async fn components(&self, scope: Scope) -> Result<Vec<Component>> {
        Ok(scoped(&self.seed.read().await.components, scope))
    }

    async fn component_descriptions(&self, scope: Scope) -> Result<Vec<ComponentDescription>> {
        Ok(scoped(&self.seed.read().await.component_descriptions, scope))
    }

    async fn sizes(&self, scope: Scope) -> Result<Vec<Size>> {
        Ok(scoped(&self.seed.read().await.sizes, scope))
    }

    async fn schedules(&self, scope: Scope) -> Result<Vec<Schedule>> {
        Ok(scoped(&self.seed.read().await.schedules, scope))
    }

    async fn ratings(&self, scope: Scope) -> Result<Vec<Rating>> {
        Ok(scoped(&self.seed.read().await.ratings, scope))
    }

    async fn materials(&self, scope: Scope) -> Result<Vec<Material>> {
        Ok(scoped(&self.seed.read().await.materials, scope))
    }

    async fn dimensional_standards(&self, scope: Scope) -> Result<Vec<DimensionalStandard>> {
        Ok(scoped(&self.seed.read().await.dimensional_standards, scope))
    }

    async fn catalog_references(&self, scope: Scope) -> Result<Vec<CatalogReference>> {
        Ok(scoped(&self.seed.read().await.catalog_references, scope))
    }

    async fn construction_descriptions(
        &self,
        scope: Scope,
    ) -> Result<Vec<ConstructionDescription>> {
        Ok(scoped(&self.seed.read().await.construction_descriptions, scope))
    }

    async fn valve_sub_types(&self, scope: Scope) -> Result<Vec<ValveSubType>> {
        Ok(scoped(&self.seed.read().await.valve_sub_types, scope))
    }

    async fn branch_table(&self, scope: Scope) -> Result<Vec<BranchTableEntry>> {
        Ok(scoped(&self.seed.read().await.branch_table, scope))
    }

    async fn reducer_table(&self, scope: Scope) -> Result<Vec<ReducerTableEntry>> {
        Ok(scoped(&self.seed.read().await.reducer_table, scope))
    }

    async fn cached_item(&self, item_code: &str) -> Result<Option<CachedItem>> {
        Ok(self.seed.read().await.cached_items.get(item_code).cloned())
    }

    async fn cached_items_by_codes(&self, item_codes: &[String]) -> Result<Vec<CachedItem>> {
        let seed = self.seed.read().await;
        Ok(item_codes
            .iter()
            .filter_map(|code| seed.cached_items.get(code).cloned())
            .collect())
    }

    async fn insert_cached_items_if_absent(&self, items: &[CachedItem]) -> Result<usize> {
        let mut seed = self.seed.write().await;
        let mut inserted = 0;
        for item in items {
            if let Entry::Vacant(slot) = seed.cached_items.entry(item.item_code.clone()) {
                slot.insert(item.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update_unit_weight(
        &self,
        item_code: &str,
        weight: Decimal,
    ) -> Result<Option<CachedItem>> {
        let mut seed = self.seed.write().await;
        Ok(seed.cached_items.get_mut(item_code).map(|item| {
            item.unit_weight = weight;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn filter_cached_items(&self, filter: &CachedItemFilter) -> Result<Vec<CachedItem>> {
        let seed = self.seed.read().await;
        Ok(seed
            .cached_items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }
}
