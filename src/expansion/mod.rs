//! Specification Expansion Module
//!
//! Turns the compact rules of a piping material specification into concrete,
//! uniquely coded line items.
//!
//! ## Pipeline Position
//!
//! ```text
//! PMS lines ─┬─ size_range ── policy ── synthesis ── catalog ──> GeneratedItem[]
//!            │
//!            └── ExpansionDiagnostic[] (skipped lines, degraded references)
//! ```
//!
//! ## Key Concepts
//!
//! - **Expansion is pure**: the caller loads a [`DomainSnapshot`] once; no
//!   store access happens per line or per item
//! - **Combination policy**: component type decides how sizes combine (plain,
//!   tee, reducer, reducing pair, olet)
//! - **Placeholders**: absent optional values render as `X` / `XX`, never as
//!   empty code positions

pub mod catalog;
mod engine;
pub mod policy;
pub mod size_range;
pub mod synthesis;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use catalog::{apply_weights, format_weight, resolve_catalog, resolve_weight, DEFAULT_WEIGHT};
pub use engine::expand;
pub use policy::CombinationPolicy;
pub use size_range::{enabled_sizes_in_range, SizeRange};
pub use synthesis::{synthesize, ItemAttributes, SynthesizedCodes};
pub use types::{
    DiagnosticLevel, DomainSnapshot, EnabledSize, ExpansionDiagnostic, ExpansionOutput, ItemTuple,
    SpecificationRules,
};
