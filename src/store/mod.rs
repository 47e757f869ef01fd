//! Persistence seam for the expansion engine
//!
//! The service layer reads domain values and declared rules, and maintains the
//! item cache, exclusively through [`PmsStore`]. Backends: [`MemoryStore`] for
//! tests, fixtures and the CLI; `PgPmsStore` (feature `database`) for
//! production.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    BranchTableEntry, CachedItem, CachedItemFilter, CatalogReference, Component,
    ComponentDescription, ConstructionDescription, DimensionalStandard, Material, PmsLine, Rating,
    ReducerTableEntry, Schedule, Scope, Size, SizeRangeEntry, Specification, ValvePmsLine,
    ValveSubType,
};

pub mod memory;

pub use memory::{MemorySeed, MemoryStore};

#[async_trait]
pub trait PmsStore: Send + Sync {
    // ── Specifications and declared rules ──

    async fn specification(&self, spec_id: Uuid) -> Result<Option<Specification>>;
    async fn specifications_for_project(&self, project_id: Uuid) -> Result<Vec<Specification>>;

    /// Ordered by declared sort order.
    async fn pms_lines(&self, spec_id: Uuid) -> Result<Vec<PmsLine>>;
    /// Ordered by declared sort order.
    async fn valve_pms_lines(&self, spec_id: Uuid) -> Result<Vec<ValvePmsLine>>;
    async fn size_range(&self, spec_id: Uuid) -> Result<Vec<SizeRangeEntry>>;

    // ── Overlay domain values, one scope per call ──

    async fn components(&self, scope: Scope) -> Result<Vec<Component>>;
    async fn component_descriptions(&self, scope: Scope) -> Result<Vec<ComponentDescription>>;
    async fn sizes(&self, scope: Scope) -> Result<Vec<Size>>;
    async fn schedules(&self, scope: Scope) -> Result<Vec<Schedule>>;
    async fn ratings(&self, scope: Scope) -> Result<Vec<Rating>>;
    async fn materials(&self, scope: Scope) -> Result<Vec<Material>>;
    async fn dimensional_standards(&self, scope: Scope) -> Result<Vec<DimensionalStandard>>;
    async fn catalog_references(&self, scope: Scope) -> Result<Vec<CatalogReference>>;
    async fn construction_descriptions(&self, scope: Scope)
        -> Result<Vec<ConstructionDescription>>;
    async fn valve_sub_types(&self, scope: Scope) -> Result<Vec<ValveSubType>>;
    async fn branch_table(&self, scope: Scope) -> Result<Vec<BranchTableEntry>>;
    async fn reducer_table(&self, scope: Scope) -> Result<Vec<ReducerTableEntry>>;

    // ── Item cache ──

    async fn cached_item(&self, item_code: &str) -> Result<Option<CachedItem>>;
    async fn cached_items_by_codes(&self, item_codes: &[String]) -> Result<Vec<CachedItem>>;

    /// Atomic create-if-absent keyed on item code. Returns how many were inserted.
    async fn insert_cached_items_if_absent(&self, items: &[CachedItem]) -> Result<usize>;

    /// Overwrite the unit weight; `None` when no entry exists for the code.
    async fn update_unit_weight(
        &self,
        item_code: &str,
        weight: Decimal,
    ) -> Result<Option<CachedItem>>;

    async fn filter_cached_items(&self, filter: &CachedItemFilter) -> Result<Vec<CachedItem>>;
}
