//! Combination policies
//!
//! Each component type expands its enabled sizes differently. Every policy is
//! a pure function from the enabled-size list (and the branch/reducer tables)
//! to a lazy sequence of [`ItemTuple`]s; ordering always follows the enabled
//! list, which is ascending by outer diameter.

use super::types::{DomainSnapshot, EnabledSize, ItemTuple};
use crate::models::ComponentDescription;

pub const REDUCER: &str = "REDUCER";
pub const REDUCER_SWAGE: &str = "REDUCER SWAGE";

/// Branch geometry tag of tees
const TEE_TAG: &str = "T";
/// Branch geometry tags of olets
const OLET_TAGS: [&str; 5] = ["W", "H", "O", "S", "L"];
/// Candidate small ends per size for reducing couplings/flanges
const MAX_REDUCING_STEPS: usize = 4;

/// How a PMS line's sizes combine into items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationPolicy {
    /// One item per enabled size
    Plain,
    /// Run size joined with branch table entries tagged `T`
    Tee,
    /// Big end joined with reducer table entries of one family
    Reducer { family: &'static str },
    /// Each size paired with up to four next-lower sizes
    ReducingPair,
    /// Branch size joined with branch table entries tagged as olets
    Olet,
}

impl CombinationPolicy {
    /// Component-type tags are case-sensitive; description matches are not.
    pub fn for_line(comp_type: &str, description: &ComponentDescription) -> Self {
        let text = &description.description;
        match comp_type {
            "TEE" => CombinationPolicy::Tee,
            "REDUCER" => CombinationPolicy::Reducer {
                family: if contains_ignore_case(text, "swage") {
                    REDUCER_SWAGE
                } else {
                    REDUCER
                },
            },
            "COUPLING" => CombinationPolicy::ReducingPair,
            "FLANGE" if contains_ignore_case(text, "reducing") => CombinationPolicy::ReducingPair,
            "OLET" => CombinationPolicy::Olet,
            _ => CombinationPolicy::Plain,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Inputs shared by every policy for one PMS line
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub snapshot: &'a DomainSnapshot,
    /// Enabled sizes inside the line's span
    pub enabled: &'a [EnabledSize<'a>],
    /// Every size enabled for the specification
    pub spec_sizes: &'a [EnabledSize<'a>],
}

impl<'a> PolicyContext<'a> {
    /// Expand with the given policy.
    pub fn combinations(self, policy: CombinationPolicy) -> Vec<ItemTuple<'a>> {
        match policy {
            CombinationPolicy::Plain => plain(self.enabled).collect(),
            CombinationPolicy::Tee => tee(self).collect(),
            CombinationPolicy::Reducer { family } => reducer(self, family).collect(),
            CombinationPolicy::ReducingPair => reducing_pairs(self.enabled).collect(),
            CombinationPolicy::Olet => olet(self).collect(),
        }
    }
}

fn find_by_mm<'a>(sizes: &[EnabledSize<'a>], size_mm: i32) -> Option<EnabledSize<'a>> {
    sizes.iter().copied().find(|e| e.size.size_mm == size_mm)
}

fn find_by_designator<'a>(sizes: &[EnabledSize<'a>], designator: &str) -> Option<EnabledSize<'a>> {
    sizes
        .iter()
        .copied()
        .find(|e| e.size.size1_size2 == designator)
}

pub fn plain<'a>(enabled: &'a [EnabledSize<'a>]) -> impl Iterator<Item = ItemTuple<'a>> + 'a {
    enabled.iter().copied().map(ItemTuple::single)
}

/// Run × branch pairs. The branch must itself be enabled in the span; its
/// schedule may still be unassigned.
pub fn tee<'a>(ctx: PolicyContext<'a>) -> impl Iterator<Item = ItemTuple<'a>> + 'a {
    let smallest = ctx.enabled.iter().map(|e| e.size.size_mm).min();

    ctx.enabled.iter().copied().flat_map(move |run| {
        let mut branches: Vec<EnabledSize<'a>> = ctx
            .snapshot
            .branch_table
            .values()
            .filter(|b| b.tag == TEE_TAG && b.run_size == run.size.size_mm)
            .filter(|b| smallest.is_some_and(|min| b.branch_size >= min))
            .filter_map(|b| find_by_mm(ctx.enabled, b.branch_size))
            .collect();
        branches.sort_by(|a, b| b.size.size_mm.cmp(&a.size.size_mm));

        branches
            .into_iter()
            .map(move |branch| ItemTuple::pair(run, branch))
    })
}

/// Big × small pairs from the reducer table. The enabled list is already
/// restricted to the line's span, so both ends are in span once found there.
pub fn reducer<'a>(
    ctx: PolicyContext<'a>,
    family: &'a str,
) -> impl Iterator<Item = ItemTuple<'a>> + 'a {
    ctx.enabled.iter().copied().flat_map(move |big| {
        let mut smalls: Vec<EnabledSize<'a>> = ctx
            .snapshot
            .reducer_table
            .values()
            .filter(|r| r.family == family && r.big_size == big.size.size1_size2)
            .filter_map(|r| find_by_designator(ctx.enabled, &r.small_size))
            .filter(|small| small.size.code != big.size.code)
            .collect();
        smalls.sort_by(|a, b| b.size.size_mm.cmp(&a.size.size_mm));

        smalls
            .into_iter()
            .map(move |small| ItemTuple::pair(big, small))
    })
}

/// Each size with up to four next-lower enabled sizes, nearest first.
pub fn reducing_pairs<'a>(
    enabled: &'a [EnabledSize<'a>],
) -> impl Iterator<Item = ItemTuple<'a>> + 'a {
    enabled.iter().copied().flat_map(move |big| {
        let mut lower: Vec<EnabledSize<'a>> = enabled
            .iter()
            .copied()
            .filter(|small| small.size.size_mm < big.size.size_mm)
            .collect();
        lower.sort_by(|a, b| b.size.size_mm.cmp(&a.size.size_mm));
        lower.truncate(MAX_REDUCING_STEPS);

        lower
            .into_iter()
            .map(move |small| ItemTuple::pair(big, small))
    })
}

/// Run × branch pairs keyed on the branch. The run must be enabled for the
/// specification but may lie outside the line's span.
pub fn olet<'a>(ctx: PolicyContext<'a>) -> impl Iterator<Item = ItemTuple<'a>> + 'a {
    ctx.enabled.iter().copied().flat_map(move |branch| {
        let mut runs: Vec<EnabledSize<'a>> = ctx
            .snapshot
            .branch_table
            .values()
            .filter(|b| b.branch_size == branch.size.size_mm)
            .filter(|b| OLET_TAGS.contains(&b.tag.as_str()))
            .filter_map(|b| find_by_mm(ctx.spec_sizes, b.run_size))
            .collect();
        runs.sort_by_key(|r| r.size.size_mm);
        // several geometry tags may name the same run size
        runs.dedup_by_key(|r| r.size.size_mm);

        runs.into_iter()
            .map(move |run| ItemTuple::pair(run, branch))
    })
}
