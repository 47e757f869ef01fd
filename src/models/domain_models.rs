//! Domain models for piping material specifications
//!
//! Rows that take part in the overlay carry `project_id`: `None` marks a
//! global default, `Some(id)` a project-specific override. References between
//! rows go through natural keys (codes), never row ids, so an override with
//! the same code transparently replaces the default.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::overlay::NaturalKey;

/// Which tier of the overlay a query addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "project_id")]
pub enum Scope {
    Default,
    Project(Uuid),
}

impl Scope {
    /// `true` when a row stored with `project_id` belongs to this scope
    pub fn contains(&self, project_id: Option<Uuid>) -> bool {
        match (self, project_id) {
            (Scope::Default, None) => true,
            (Scope::Project(id), Some(row)) => *id == row,
            _ => false,
        }
    }

    /// Stored `project_id` value for rows of this scope
    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            Scope::Default => None,
            Scope::Project(id) => Some(*id),
        }
    }
}

/// A row that belongs to one overlay scope
pub trait ScopedRow {
    fn project_id(&self) -> Option<Uuid>;
}

// ============================================================================
// Overlay domain values
// ============================================================================

/// Component type (TEE, REDUCER, FLANGE, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Component {
    pub project_id: Option<Uuid>,
    pub comp_type: String,
    pub short_code: String,
    pub description: Option<String>,
}

/// Component description, the leading part of every item code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ComponentDescription {
    pub project_id: Option<Uuid>,
    pub comp_type: String,
    pub code: String,
    pub client_code: String,
    pub description: String,
    pub g_type: Option<String>,
    pub s_type: Option<String>,
    pub skey: Option<String>,
}

/// Nominal pipe size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Size {
    pub project_id: Option<Uuid>,
    /// Inch designator, e.g. `2` or `1-1/2`
    pub size1_size2: String,
    pub code: String,
    pub client_code: String,
    pub size_mm: i32,
    /// Outer diameter; range iteration order
    pub od: Decimal,
}

/// Wall-thickness designation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Schedule {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub client_code: String,
    pub sch1_sch2: String,
    pub description: String,
}

/// Pressure class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Rating {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub client_code: String,
    /// Display text, e.g. `150#`
    pub rating: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Material {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub client_code: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct DimensionalStandard {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub description: String,
}

/// Valve construction description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ConstructionDescription {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub client_code: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ValveSubType {
    pub project_id: Option<Uuid>,
    pub code: String,
    pub client_code: String,
    pub description: String,
}

/// Catalog reference matched on (short description, rating text)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct CatalogReference {
    pub project_id: Option<Uuid>,
    pub item_short_desc: String,
    pub rating: Option<String>,
    pub catalog: String,
}

/// Physically valid run/branch pair for branch fittings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct BranchTableEntry {
    pub project_id: Option<Uuid>,
    pub run_size: i32,
    pub branch_size: i32,
    /// Branch geometry: `T` for tees, `W`/`H`/`O`/`S`/`L` for olets
    pub tag: String,
}

/// Physically valid big/small pair for reducers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ReducerTableEntry {
    pub project_id: Option<Uuid>,
    /// `REDUCER` or `REDUCER SWAGE`
    pub family: String,
    pub big_size: String,
    pub small_size: String,
}

macro_rules! scoped_rows {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ScopedRow for $ty {
                fn project_id(&self) -> Option<Uuid> {
                    self.project_id
                }
            }
        )+
    };
}

scoped_rows!(
    Component,
    ComponentDescription,
    Size,
    Schedule,
    Rating,
    Material,
    DimensionalStandard,
    ConstructionDescription,
    ValveSubType,
    CatalogReference,
    BranchTableEntry,
    ReducerTableEntry,
);

macro_rules! keyed_by_code {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl NaturalKey for $ty {
                type Key = String;

                fn natural_key(&self) -> String {
                    self.code.clone()
                }
            }
        )+
    };
}

keyed_by_code!(
    ComponentDescription,
    Size,
    Schedule,
    Rating,
    Material,
    DimensionalStandard,
    ConstructionDescription,
    ValveSubType,
);

impl NaturalKey for Component {
    type Key = String;

    fn natural_key(&self) -> String {
        self.comp_type.clone()
    }
}

impl NaturalKey for CatalogReference {
    type Key = (String, String);

    fn natural_key(&self) -> (String, String) {
        (
            self.item_short_desc.clone(),
            self.rating.clone().unwrap_or_default(),
        )
    }
}

impl NaturalKey for BranchTableEntry {
    type Key = (i32, i32, String);

    fn natural_key(&self) -> (i32, i32, String) {
        (self.run_size, self.branch_size, self.tag.clone())
    }
}

impl NaturalKey for ReducerTableEntry {
    type Key = (String, String, String);

    fn natural_key(&self) -> (String, String, String) {
        (
            self.family.clone(),
            self.big_size.clone(),
            self.small_size.clone(),
        )
    }
}

// ============================================================================
// Specification and declared rules
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Specification {
    pub spec_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
}

/// Size enabled for a specification, with its assigned schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SizeRangeEntry {
    pub spec_id: Uuid,
    pub size_code: String,
    pub schedule_code: Option<String>,
}

/// Declared PMS rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct PmsLine {
    pub line_id: Uuid,
    pub spec_id: Uuid,
    pub comp_type: String,
    pub component_desc_code: String,
    pub size1_code: String,
    pub size2_code: String,
    pub rating_code: Option<String>,
    pub material_code: String,
    pub dimensional_standard_code: Option<String>,
    pub sort_order: i32,
}

/// Declared valve rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ValvePmsLine {
    pub line_id: Uuid,
    pub spec_id: Uuid,
    pub comp_type: String,
    pub component_desc_code: String,
    pub construction_desc_code: Option<String>,
    pub valve_sub_type_code: Option<String>,
    pub size1_code: String,
    pub size2_code: String,
    pub rating_code: Option<String>,
    pub material_code: String,
    pub dimensional_standard_code: Option<String>,
    pub sort_order: i32,
}

impl ValvePmsLine {
    /// The attributes shared with ordinary PMS lines
    pub fn as_pms_line(&self) -> PmsLine {
        PmsLine {
            line_id: self.line_id,
            spec_id: self.spec_id,
            comp_type: self.comp_type.clone(),
            component_desc_code: self.component_desc_code.clone(),
            size1_code: self.size1_code.clone(),
            size2_code: self.size2_code.clone(),
            rating_code: self.rating_code.clone(),
            material_code: self.material_code.clone(),
            dimensional_standard_code: self.dimensional_standard_code.clone(),
            sort_order: self.sort_order,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// One concrete, coded line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub spec_name: String,
    pub pms_line_id: Uuid,
    pub comp_type: String,
    pub short_code: String,
    pub item_code: String,
    pub client_item_code: String,
    pub long_desc: String,
    pub short_desc: String,
    pub size1_inch: String,
    pub size2_inch: Option<String>,
    pub size1_mm: i32,
    pub size2_mm: Option<i32>,
    pub schedule1: String,
    pub schedule2: String,
    pub rating: String,
    pub g_type: Option<String>,
    pub s_type: Option<String>,
    pub skey: Option<String>,
    pub catalog: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valve_sub_type: Option<String>,
}

/// Cached item, keyed by item code, holding the unit weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct CachedItem {
    pub item_code: String,
    pub spec_name: String,
    pub comp_type: String,
    pub client_item_code: String,
    pub long_desc: String,
    pub short_desc: String,
    pub size1_inch: String,
    pub size2_inch: Option<String>,
    pub rating: String,
    pub catalog: String,
    pub unit_weight: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedItem {
    /// Cache record for a freshly generated item; weight starts at zero
    pub fn from_generated(item: &GeneratedItem, now: DateTime<Utc>) -> Self {
        Self {
            item_code: item.item_code.clone(),
            spec_name: item.spec_name.clone(),
            comp_type: item.comp_type.clone(),
            client_item_code: item.client_item_code.clone(),
            long_desc: item.long_desc.clone(),
            short_desc: item.short_desc.clone(),
            size1_inch: item.size1_inch.clone(),
            size2_inch: item.size2_inch.clone(),
            rating: item.rating.clone(),
            catalog: item.catalog.clone(),
            unit_weight: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filter over cached items; `None` fields match anything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedItemFilter {
    pub comp_type: Option<String>,
    pub size1: Option<String>,
    pub size2: Option<String>,
    pub rating: Option<String>,
}

impl CachedItemFilter {
    pub fn matches(&self, item: &CachedItem) -> bool {
        fn accepts(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().map_or(true, |w| actual == Some(w))
        }

        accepts(&self.comp_type, Some(&item.comp_type))
            && accepts(&self.size1, Some(&item.size1_inch))
            && accepts(&self.size2, item.size2_inch.as_deref())
            && accepts(&self.rating, Some(&item.rating))
    }
}
