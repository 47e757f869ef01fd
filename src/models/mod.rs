//! Models for piping material specifications
//!
//! Overlay domain values, declared PMS rules, and the generated/cached items
//! the engine produces.

pub mod domain_models;

// Re-export commonly used types for convenience
pub use domain_models::{
    BranchTableEntry, CachedItem, CachedItemFilter, CatalogReference, Component,
    ComponentDescription, ConstructionDescription, DimensionalStandard, GeneratedItem, Material,
    PmsLine, Rating, ReducerTableEntry, Schedule, Scope, ScopedRow, Size, SizeRangeEntry,
    Specification, ValvePmsLine, ValveSubType,
};
