//! Expansion service
//!
//! Thin persistence wrapper around the pure [`expand`] function: loads the
//! overlay snapshot and declared rules through a [`PmsStore`], runs the
//! expansion, and maintains the item/weight cache.

use std::collections::HashMap;

use chrono::Utc;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PmsError, PmsResult};
use crate::expansion::{
    apply_weights, expand, format_weight, DomainSnapshot, ExpansionDiagnostic, ExpansionOutput,
    SizeRange, SpecificationRules, DEFAULT_WEIGHT,
};
use crate::models::{CachedItem, CachedItemFilter, GeneratedItem, Scope};
use crate::overlay::{NaturalKey, Overlay, OverlayResolver};
use crate::store::PmsStore;

/// Outcome of caching every specification of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub specifications: usize,
    /// Specifications without any PMS or valve lines
    pub empty_specifications: usize,
    pub generated: usize,
    /// New cache entries; items already cached are left untouched
    pub inserted: usize,
    /// PMS lines skipped for a missing required reference
    pub skipped: usize,
}

/// `{success, data}` / `{success: false, error}` envelope for expansion results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<GeneratedItem>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ExpansionDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExpandResponse {
    pub fn from_result(result: PmsResult<ExpansionOutput>) -> Self {
        match result {
            Ok(output) => Self {
                success: true,
                data: Some(output.items),
                diagnostics: output.diagnostics,
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                diagnostics: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

fn overlay<T: NaturalKey>(defaults: Vec<T>, project_rows: Vec<T>) -> Overlay<T::Key, T> {
    OverlayResolver::<T, T::Key>::by_natural_key().resolve(defaults, project_rows)
}

pub struct ExpansionService<S> {
    store: S,
}

impl<S: PmsStore> ExpansionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load every overlay table for a project (defaults only when `None`).
    pub async fn load_snapshot(&self, project_id: Option<Uuid>) -> PmsResult<DomainSnapshot> {
        let store = &self.store;
        let default = Scope::Default;

        // an absent project scope yields no rows
        macro_rules! tier {
            ($method:ident) => {
                async {
                    match project_id {
                        Some(id) => store.$method(Scope::Project(id)).await,
                        None => Ok(Vec::new()),
                    }
                }
            };
        }

        let (
            (components_d, components_p),
            (descriptions_d, descriptions_p),
            (sizes_d, sizes_p),
            (schedules_d, schedules_p),
            (ratings_d, ratings_p),
            (materials_d, materials_p),
        ) = tokio::try_join!(
            async { tokio::try_join!(store.components(default), tier!(components)) },
            async {
                tokio::try_join!(
                    store.component_descriptions(default),
                    tier!(component_descriptions)
                )
            },
            async { tokio::try_join!(store.sizes(default), tier!(sizes)) },
            async { tokio::try_join!(store.schedules(default), tier!(schedules)) },
            async { tokio::try_join!(store.ratings(default), tier!(ratings)) },
            async { tokio::try_join!(store.materials(default), tier!(materials)) },
        )?;

        let (
            (standards_d, standards_p),
            (catalogs_d, catalogs_p),
            (constructions_d, constructions_p),
            (sub_types_d, sub_types_p),
            (branch_d, branch_p),
            (reducer_d, reducer_p),
        ) = tokio::try_join!(
            async {
                tokio::try_join!(
                    store.dimensional_standards(default),
                    tier!(dimensional_standards)
                )
            },
            async {
                tokio::try_join!(store.catalog_references(default), tier!(catalog_references))
            },
            async {
                tokio::try_join!(
                    store.construction_descriptions(default),
                    tier!(construction_descriptions)
                )
            },
            async { tokio::try_join!(store.valve_sub_types(default), tier!(valve_sub_types)) },
            async { tokio::try_join!(store.branch_table(default), tier!(branch_table)) },
            async { tokio::try_join!(store.reducer_table(default), tier!(reducer_table)) },
        )?;

        Ok(DomainSnapshot {
            components: overlay(components_d, components_p),
            component_descriptions: overlay(descriptions_d, descriptions_p),
            sizes: overlay(sizes_d, sizes_p),
            schedules: overlay(schedules_d, schedules_p),
            ratings: overlay(ratings_d, ratings_p),
            materials: overlay(materials_d, materials_p),
            dimensional_standards: overlay(standards_d, standards_p),
            catalog_references: overlay(catalogs_d, catalogs_p),
            construction_descriptions: overlay(constructions_d, constructions_p),
            valve_sub_types: overlay(sub_types_d, sub_types_p),
            branch_table: overlay(branch_d, branch_p),
            reducer_table: overlay(reducer_d, reducer_p),
        })
    }

    /// Declared rules of a specification
    pub async fn load_rules(&self, spec_id: Uuid) -> PmsResult<SpecificationRules> {
        let (spec, size_range, lines, valve_lines) = tokio::try_join!(
            self.store.specification(spec_id),
            self.store.size_range(spec_id),
            self.store.pms_lines(spec_id),
            self.store.valve_pms_lines(spec_id),
        )?;

        let spec = spec.ok_or_else(|| PmsError::not_found("specification", spec_id.to_string()))?;

        Ok(SpecificationRules {
            spec,
            size_range: SizeRange::from_entries(size_range),
            lines,
            valve_lines,
        })
    }

    /// Expand every declared line of a specification.
    ///
    /// Returns [`PmsError::EmptyInput`] when the specification has no lines.
    pub async fn expand(&self, spec_id: Uuid, project_id: Option<Uuid>) -> PmsResult<ExpansionOutput> {
        let (snapshot, rules) =
            tokio::try_join!(self.load_snapshot(project_id), self.load_rules(spec_id))?;
        self.expand_loaded(&snapshot, &rules)
    }

    fn expand_loaded(
        &self,
        snapshot: &DomainSnapshot,
        rules: &SpecificationRules,
    ) -> PmsResult<ExpansionOutput> {
        let spec_id = rules.spec.spec_id;
        if rules.is_empty() {
            info!(%spec_id, spec = %rules.spec.name, "No PMS lines declared");
            return Err(PmsError::EmptyInput { spec_id });
        }

        let output = expand(snapshot, rules);
        for diagnostic in &output.diagnostics {
            warn!(
                %spec_id,
                line_id = %diagnostic.line_id,
                comp_type = %diagnostic.comp_type,
                level = ?diagnostic.level,
                "{}",
                diagnostic.message
            );
        }
        info!(
            %spec_id,
            spec = %rules.spec.name,
            lines = rules.lines.len() + rules.valve_lines.len(),
            items = output.items.len(),
            skipped = output.skipped_lines(),
            "Expanded specification"
        );
        Ok(output)
    }

    /// [`Self::expand`] with each item's cached unit weight filled in.
    pub async fn expand_with_weights(
        &self,
        spec_id: Uuid,
        project_id: Option<Uuid>,
    ) -> PmsResult<ExpansionOutput> {
        let mut output = self.expand(spec_id, project_id).await?;

        let codes: Vec<String> = output.items.iter().map(|i| i.item_code.clone()).collect();
        let weights: HashMap<String, Decimal> = self
            .store
            .cached_items_by_codes(&codes)
            .await?
            .into_iter()
            .map(|cached| (cached.item_code, cached.unit_weight))
            .collect();
        debug!(%spec_id, cached = weights.len(), "Resolved unit weights");

        apply_weights(&mut output.items, &weights);
        Ok(output)
    }

    /// Expand every specification of a project and create cache entries for
    /// item codes not cached yet. Specifications without lines are skipped.
    pub async fn load_and_cache(&self, project_id: Uuid) -> PmsResult<LoadSummary> {
        let (specs, snapshot) = tokio::try_join!(
            async { Ok::<_, PmsError>(self.store.specifications_for_project(project_id).await?) },
            self.load_snapshot(Some(project_id)),
        )?;

        let outputs = try_join_all(
            specs
                .iter()
                .map(|spec| self.expand_for_cache(&snapshot, spec.spec_id)),
        )
        .await?;

        let now = Utc::now();
        let mut summary = LoadSummary {
            specifications: specs.len(),
            ..LoadSummary::default()
        };
        let mut records = Vec::new();
        for output in outputs {
            let Some(output) = output else {
                summary.empty_specifications += 1;
                continue;
            };
            summary.generated += output.items.len();
            summary.skipped += output.skipped_lines();
            records.extend(
                output
                    .items
                    .iter()
                    .map(|item| CachedItem::from_generated(item, now)),
            );
        }

        summary.inserted = self.store.insert_cached_items_if_absent(&records).await?;
        info!(
            %project_id,
            specifications = summary.specifications,
            empty_specifications = summary.empty_specifications,
            generated = summary.generated,
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Loaded project catalog into item cache"
        );
        Ok(summary)
    }

    async fn expand_for_cache(
        &self,
        snapshot: &DomainSnapshot,
        spec_id: Uuid,
    ) -> PmsResult<Option<ExpansionOutput>> {
        let rules = self.load_rules(spec_id).await?;
        match self.expand_loaded(snapshot, &rules) {
            Ok(output) => Ok(Some(output)),
            Err(e) if e.is_no_data() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cached weight for an item code, `"0.00"` when nothing is cached
    pub async fn resolve_weight(&self, item_code: &str) -> PmsResult<String> {
        Ok(self
            .store
            .cached_item(item_code)
            .await?
            .map(|cached| format_weight(cached.unit_weight))
            .unwrap_or_else(|| DEFAULT_WEIGHT.to_string()))
    }

    /// Overwrite the weight of an existing cache entry. Never creates one.
    pub async fn update_unit_weight(
        &self,
        item_code: &str,
        weight: Decimal,
    ) -> PmsResult<CachedItem> {
        let updated = self
            .store
            .update_unit_weight(item_code, weight)
            .await?
            .ok_or_else(|| PmsError::not_found("cached item", item_code))?;
        info!(item_code, weight = %updated.unit_weight, "Updated unit weight");
        Ok(updated)
    }

    pub async fn filter_cached_items(&self, filter: &CachedItemFilter) -> PmsResult<Vec<CachedItem>> {
        Ok(self.store.filter_cached_items(filter).await?)
    }
}
