//! Postgres-backed PMS store
//!
//! Overlay tables store the global default tier as `project_id IS NULL`;
//! a scope query therefore compares with `IS NOT DISTINCT FROM`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    BranchTableEntry, CachedItem, CachedItemFilter, CatalogReference, Component,
    ComponentDescription, ConstructionDescription, DimensionalStandard, Material, PmsLine, Rating,
    ReducerTableEntry, Schedule, Scope, Size, SizeRangeEntry, Specification, ValvePmsLine,
    ValveSubType,
};
use crate::store::PmsStore;

const CACHED_ITEM_COLUMNS: &str = "item_code, spec_name, comp_type, client_item_code, long_desc, \
     short_desc, size1_inch, size2_inch, rating, catalog, unit_weight, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgPmsStore {
    pool: PgPool,
}

impl PgPmsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Rows of one overlay tier. `table` and `columns` are compile-time
    /// constants of this module.
    async fn fetch_scoped<T>(
        &self,
        table: &'static str,
        columns: &'static str,
        scope: Scope,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT project_id, {columns} FROM pms.{table} \
             WHERE project_id IS NOT DISTINCT FROM $1"
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(scope.project_id())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to load {table} for {scope:?}"))?;
        debug!(table, ?scope, rows = rows.len(), "Loaded overlay tier");
        Ok(rows)
    }
}

#[async_trait]
impl PmsStore for PgPmsStore {
    // ── Specifications and declared rules ──

    async fn specification(&self, spec_id: Uuid) -> Result<Option<Specification>> {
        sqlx::query_as::<_, Specification>(
            r#"SELECT spec_id, project_id, name FROM pms.specifications WHERE spec_id = $1"#,
        )
        .bind(spec_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get specification")
    }

    async fn specifications_for_project(&self, project_id: Uuid) -> Result<Vec<Specification>> {
        sqlx::query_as::<_, Specification>(
            r#"SELECT spec_id, project_id, name FROM pms.specifications
               WHERE project_id = $1 ORDER BY name"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list specifications for project")
    }

    async fn pms_lines(&self, spec_id: Uuid) -> Result<Vec<PmsLine>> {
        sqlx::query_as::<_, PmsLine>(
            r#"SELECT line_id, spec_id, comp_type, component_desc_code, size1_code, size2_code,
                      rating_code, material_code, dimensional_standard_code, sort_order
               FROM pms.pms_lines WHERE spec_id = $1 ORDER BY sort_order, line_id"#,
        )
        .bind(spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load PMS lines")
    }

    async fn valve_pms_lines(&self, spec_id: Uuid) -> Result<Vec<ValvePmsLine>> {
        sqlx::query_as::<_, ValvePmsLine>(
            r#"SELECT line_id, spec_id, comp_type, component_desc_code, construction_desc_code,
                      valve_sub_type_code, size1_code, size2_code, rating_code, material_code,
                      dimensional_standard_code, sort_order
               FROM pms.valve_pms_lines WHERE spec_id = $1 ORDER BY sort_order, line_id"#,
        )
        .bind(spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load valve PMS lines")
    }

    async fn size_range(&self, spec_id: Uuid) -> Result<Vec<SizeRangeEntry>> {
        sqlx::query_as::<_, SizeRangeEntry>(
            r#"SELECT spec_id, size_code, schedule_code FROM pms.size_ranges WHERE spec_id = $1"#,
        )
        .bind(spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load size range")
    }

    // ── Overlay domain values ──

    async fn components(&self, scope: Scope) -> Result<Vec<Component>> {
        self.fetch_scoped("components", "comp_type, short_code, description", scope)
            .await
    }

    async fn component_descriptions(&self, scope: Scope) -> Result<Vec<ComponentDescription>> {
        self.fetch_scoped(
            "component_descriptions",
            "comp_type, code, client_code, description, g_type, s_type, skey",
            scope,
        )
        .await
    }

    async fn sizes(&self, scope: Scope) -> Result<Vec<Size>> {
        self.fetch_scoped(
            "sizes",
            "size1_size2, code, client_code, size_mm, od",
            scope,
        )
        .await
    }

    async fn schedules(&self, scope: Scope) -> Result<Vec<Schedule>> {
        self.fetch_scoped(
            "schedules",
            "code, client_code, sch1_sch2, description",
            scope,
        )
        .await
    }

    async fn ratings(&self, scope: Scope) -> Result<Vec<Rating>> {
        self.fetch_scoped("ratings", "code, client_code, rating", scope)
            .await
    }

    async fn materials(&self, scope: Scope) -> Result<Vec<Material>> {
        self.fetch_scoped("materials", "code, client_code, description", scope)
            .await
    }

    async fn dimensional_standards(&self, scope: Scope) -> Result<Vec<DimensionalStandard>> {
        self.fetch_scoped("dimensional_standards", "code, description", scope)
            .await
    }

    async fn catalog_references(&self, scope: Scope) -> Result<Vec<CatalogReference>> {
        self.fetch_scoped(
            "catalog_references",
            "item_short_desc, rating, catalog",
            scope,
        )
        .await
    }

    async fn construction_descriptions(
        &self,
        scope: Scope,
    ) -> Result<Vec<ConstructionDescription>> {
        self.fetch_scoped(
            "construction_descriptions",
            "code, client_code, description",
            scope,
        )
        .await
    }

    async fn valve_sub_types(&self, scope: Scope) -> Result<Vec<ValveSubType>> {
        self.fetch_scoped("valve_sub_types", "code, client_code, description", scope)
            .await
    }

    async fn branch_table(&self, scope: Scope) -> Result<Vec<BranchTableEntry>> {
        self.fetch_scoped("branch_table", "run_size, branch_size, tag", scope)
            .await
    }

    async fn reducer_table(&self, scope: Scope) -> Result<Vec<ReducerTableEntry>> {
        self.fetch_scoped("reducer_table", "family, big_size, small_size", scope)
            .await
    }

    // ── Item cache ──

    async fn cached_item(&self, item_code: &str) -> Result<Option<CachedItem>> {
        let sql = format!("SELECT {CACHED_ITEM_COLUMNS} FROM pms.cached_items WHERE item_code = $1");
        sqlx::query_as::<_, CachedItem>(&sql)
            .bind(item_code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get cached item")
    }

    async fn cached_items_by_codes(&self, item_codes: &[String]) -> Result<Vec<CachedItem>> {
        if item_codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CACHED_ITEM_COLUMNS} FROM pms.cached_items WHERE item_code = ANY($1)"
        );
        sqlx::query_as::<_, CachedItem>(&sql)
            .bind(item_codes)
            .fetch_all(&self.pool)
            .await
            .context("Failed to batch-load cached items")
    }

    async fn insert_cached_items_if_absent(&self, items: &[CachedItem]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin cache transaction")?;

        let mut inserted = 0usize;
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO pms.cached_items (
                    item_code, spec_name, comp_type, client_item_code, long_desc, short_desc,
                    size1_inch, size2_inch, rating, catalog, unit_weight, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (item_code) DO NOTHING
                "#,
            )
            .bind(&item.item_code)
            .bind(&item.spec_name)
            .bind(&item.comp_type)
            .bind(&item.client_item_code)
            .bind(&item.long_desc)
            .bind(&item.short_desc)
            .bind(&item.size1_inch)
            .bind(&item.size2_inch)
            .bind(&item.rating)
            .bind(&item.catalog)
            .bind(item.unit_weight)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to cache item {}", item.item_code))?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .context("Failed to commit cache transaction")?;

        debug!(offered = items.len(), inserted, "Cached items upserted");
        Ok(inserted)
    }

    async fn update_unit_weight(
        &self,
        item_code: &str,
        weight: Decimal,
    ) -> Result<Option<CachedItem>> {
        let sql = format!(
            "UPDATE pms.cached_items SET unit_weight = $1, updated_at = NOW() \
             WHERE item_code = $2 RETURNING {CACHED_ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, CachedItem>(&sql)
            .bind(weight)
            .bind(item_code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update unit weight")
    }

    async fn filter_cached_items(&self, filter: &CachedItemFilter) -> Result<Vec<CachedItem>> {
        let sql = format!(
            "SELECT {CACHED_ITEM_COLUMNS} FROM pms.cached_items \
             WHERE ($1::text IS NULL OR comp_type = $1) \
             AND ($2::text IS NULL OR size1_inch = $2) \
             AND ($3::text IS NULL OR size2_inch = $3) \
             AND ($4::text IS NULL OR rating = $4) \
             ORDER BY item_code"
        );
        sqlx::query_as::<_, CachedItem>(&sql)
            .bind(&filter.comp_type)
            .bind(&filter.size1)
            .bind(&filter.size2)
            .bind(&filter.rating)
            .fetch_all(&self.pool)
            .await
            .context("Failed to filter cached items")
    }
}
