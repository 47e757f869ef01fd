//! Expansion Types
//!
//! The resolved domain snapshot an expansion reads from, the per-spec rules it
//! expands, and the output/diagnostics it produces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::size_range::SizeRange;
use crate::models::{
    BranchTableEntry, CatalogReference, Component, ComponentDescription, ConstructionDescription,
    DimensionalStandard, GeneratedItem, Material, PmsLine, Rating, ReducerTableEntry, Schedule,
    Size, Specification, ValvePmsLine, ValveSubType,
};
use crate::overlay::Overlay;

// =============================================================================
// INPUT
// =============================================================================

/// Every overlay-merged table one expansion needs, loaded once per call
#[derive(Debug, Clone, Default)]
pub struct DomainSnapshot {
    pub components: Overlay<String, Component>,
    pub component_descriptions: Overlay<String, ComponentDescription>,
    pub sizes: Overlay<String, Size>,
    pub schedules: Overlay<String, Schedule>,
    pub ratings: Overlay<String, Rating>,
    pub materials: Overlay<String, Material>,
    pub dimensional_standards: Overlay<String, DimensionalStandard>,
    pub construction_descriptions: Overlay<String, ConstructionDescription>,
    pub valve_sub_types: Overlay<String, ValveSubType>,
    pub catalog_references: Overlay<(String, String), CatalogReference>,
    pub branch_table: Overlay<(i32, i32, String), BranchTableEntry>,
    pub reducer_table: Overlay<(String, String, String), ReducerTableEntry>,
}

/// Declared rules of one specification
#[derive(Debug, Clone)]
pub struct SpecificationRules {
    pub spec: Specification,
    pub size_range: SizeRange,
    pub lines: Vec<PmsLine>,
    pub valve_lines: Vec<ValvePmsLine>,
}

impl SpecificationRules {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.valve_lines.is_empty()
    }
}

// =============================================================================
// INTERMEDIATE
// =============================================================================

/// A size of the spec's range with the schedule assigned to it
#[derive(Debug, Clone, Copy)]
pub struct EnabledSize<'a> {
    pub size: &'a Size,
    pub schedule_code: Option<&'a str>,
}

/// One concrete combination to synthesize
#[derive(Debug, Clone, Copy)]
pub struct ItemTuple<'a> {
    pub size1: &'a Size,
    pub size2: Option<&'a Size>,
    pub schedule1: Option<&'a str>,
    pub schedule2: Option<&'a str>,
}

impl<'a> ItemTuple<'a> {
    pub fn single(size: EnabledSize<'a>) -> Self {
        Self {
            size1: size.size,
            size2: None,
            schedule1: size.schedule_code,
            schedule2: None,
        }
    }

    pub fn pair(first: EnabledSize<'a>, second: EnabledSize<'a>) -> Self {
        Self {
            size1: first.size,
            size2: Some(second.size),
            schedule1: first.schedule_code,
            schedule2: second.schedule_code,
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

/// Note about a single PMS line; an `Error` means the line was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionDiagnostic {
    pub level: DiagnosticLevel,
    pub line_id: Uuid,
    pub comp_type: String,
    pub message: String,
}

/// Generated items of one specification plus per-line diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpansionOutput {
    pub items: Vec<GeneratedItem>,
    pub diagnostics: Vec<ExpansionDiagnostic>,
}

impl ExpansionOutput {
    pub fn skipped_lines(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }
}
