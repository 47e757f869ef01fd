//! Item code and description synthesis
//!
//! Codes are plain concatenations of the resolved values' codes in fixed
//! positions. Absent optional values take a placeholder so every position is
//! always occupied.

use crate::models::{ComponentDescription, DimensionalStandard, Material, Rating, Schedule, Size};

/// Placeholder for absent single-character positions (size2, rating)
pub const PLACEHOLDER: &str = "X";
/// Placeholder for absent schedule positions
pub const SCHEDULE_PLACEHOLDER: &str = "XX";

/// Resolved values that make up one item
#[derive(Debug, Clone, Copy)]
pub struct ItemAttributes<'a> {
    pub component_desc: &'a ComponentDescription,
    pub size1: &'a Size,
    pub size2: Option<&'a Size>,
    pub schedule1: Option<&'a Schedule>,
    pub schedule2: Option<&'a Schedule>,
    pub rating: Option<&'a Rating>,
    pub material: &'a Material,
    pub dimensional_standard: Option<&'a DimensionalStandard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCodes {
    pub item_code: String,
    pub client_item_code: String,
    pub long_desc: String,
    pub short_desc: String,
}

pub fn synthesize(attrs: &ItemAttributes<'_>) -> SynthesizedCodes {
    SynthesizedCodes {
        item_code: item_code(attrs),
        client_item_code: client_item_code(attrs),
        long_desc: long_description(attrs),
        short_desc: attrs.component_desc.description.clone(),
    }
}

pub fn item_code(attrs: &ItemAttributes<'_>) -> String {
    [
        attrs.component_desc.code.as_str(),
        attrs.size1.code.as_str(),
        attrs.size2.map_or(PLACEHOLDER, |s| s.code.as_str()),
        attrs.schedule1.map_or(SCHEDULE_PLACEHOLDER, |s| s.code.as_str()),
        attrs.schedule2.map_or(SCHEDULE_PLACEHOLDER, |s| s.code.as_str()),
        attrs.rating.map_or(PLACEHOLDER, |r| r.code.as_str()),
        attrs.material.code.as_str(),
    ]
    .concat()
}

pub fn client_item_code(attrs: &ItemAttributes<'_>) -> String {
    [
        attrs.component_desc.client_code.as_str(),
        attrs.size1.client_code.as_str(),
        attrs.size2.map_or(PLACEHOLDER, |s| s.client_code.as_str()),
        attrs
            .schedule1
            .map_or(SCHEDULE_PLACEHOLDER, |s| s.client_code.as_str()),
        attrs
            .schedule2
            .map_or(SCHEDULE_PLACEHOLDER, |s| s.client_code.as_str()),
        attrs.rating.map_or(PLACEHOLDER, |r| r.client_code.as_str()),
        attrs.material.client_code.as_str(),
    ]
    .concat()
}

/// `<desc>, <sch1>, <sch2>, <rating>, <material>, <dimensional standard>`,
/// omitting absent clauses. With no schedule or rating the description is
/// followed by a lone comma.
pub fn long_description(attrs: &ItemAttributes<'_>) -> String {
    let clauses: Vec<&str> = [
        attrs.schedule1.map(|s| s.description.as_str()),
        attrs.schedule2.map(|s| s.description.as_str()),
        attrs.rating.map(|r| r.rating.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut desc = attrs.component_desc.description.clone();
    if !clauses.is_empty() {
        desc.push_str(", ");
        desc.push_str(&clauses.join(", "));
    }
    desc.push_str(", ");
    desc.push_str(&attrs.material.description);
    if let Some(standard) = attrs.dimensional_standard {
        desc.push_str(", ");
        desc.push_str(&standard.description);
    }
    desc
}
