//! Size/schedule range resolution
//!
//! A size takes part in an expansion only when it is numerically inside the
//! line's span *and* enabled for the specification.

use std::collections::BTreeMap;

use super::types::EnabledSize;
use crate::models::{Size, SizeRangeEntry};
use crate::overlay::Overlay;

/// Sizes enabled for one specification, with their assigned schedules
#[derive(Debug, Clone, Default)]
pub struct SizeRange {
    schedules: BTreeMap<String, Option<String>>,
}

impl SizeRange {
    pub fn from_entries(entries: impl IntoIterator<Item = SizeRangeEntry>) -> Self {
        let schedules = entries
            .into_iter()
            .map(|e| (e.size_code, e.schedule_code))
            .collect();
        Self { schedules }
    }

    pub fn is_enabled(&self, size_code: &str) -> bool {
        self.schedules.contains_key(size_code)
    }

    /// Schedule assigned to an enabled size; `None` when disabled or unassigned
    pub fn schedule_for(&self, size_code: &str) -> Option<&str> {
        self.schedules.get(size_code).and_then(|s| s.as_deref())
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub(crate) fn enabled<'a>(&'a self, size: &'a Size) -> Option<EnabledSize<'a>> {
        self.is_enabled(&size.code).then(|| EnabledSize {
            size,
            schedule_code: self.schedule_for(&size.code),
        })
    }
}

/// Whole size catalog in iteration order: outer diameter, then mm, then code.
pub fn ordered_sizes(sizes: &Overlay<String, Size>) -> Vec<&Size> {
    let mut ordered: Vec<&Size> = sizes.values().collect();
    ordered.sort_by(|a, b| {
        a.od.cmp(&b.od)
            .then(a.size_mm.cmp(&b.size_mm))
            .then_with(|| a.code.cmp(&b.code))
    });
    ordered
}

/// Enabled sizes whose mm value lies in `[size_from.mm, size_to.mm]`, ascending
/// by outer diameter.
pub fn enabled_sizes_in_range<'a>(
    sizes: &'a Overlay<String, Size>,
    size_from: &Size,
    size_to: &Size,
    size_range: &'a SizeRange,
) -> Vec<EnabledSize<'a>> {
    let low = size_from.size_mm.min(size_to.size_mm);
    let high = size_from.size_mm.max(size_to.size_mm);

    ordered_sizes(sizes)
        .into_iter()
        .filter(|s| (low..=high).contains(&s.size_mm))
        .filter_map(|s| size_range.enabled(s))
        .collect()
}

/// Every size enabled for the specification, in iteration order, regardless of
/// any line's span.
pub fn spec_enabled_sizes<'a>(
    sizes: &'a Overlay<String, Size>,
    size_range: &'a SizeRange,
) -> Vec<EnabledSize<'a>> {
    ordered_sizes(sizes)
        .into_iter()
        .filter_map(|s| size_range.enabled(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::fixtures;

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let snapshot = fixtures::snapshot();
        let range = fixtures::size_range(&[("S50", Some("STD")), ("S80", None), ("S150", Some("XS"))]);
        let from = fixtures::size(&snapshot, "S50");
        let to = fixtures::size(&snapshot, "S150");

        let enabled = enabled_sizes_in_range(&snapshot.sizes, from, to, &range);
        let codes: Vec<_> = enabled.iter().map(|e| e.size.code.as_str()).collect();

        assert_eq!(codes, vec!["S50", "S80", "S150"]);
        assert_eq!(enabled[0].schedule_code, Some("STD"));
        assert_eq!(enabled[1].schedule_code, None);
        assert_eq!(enabled[2].schedule_code, Some("XS"));
    }

    #[test]
    fn test_disabled_sizes_are_dropped_even_in_range() {
        let snapshot = fixtures::snapshot();
        let range = fixtures::size_range(&[("S50", Some("STD")), ("S200", Some("STD"))]);
        let from = fixtures::size(&snapshot, "S25");
        let to = fixtures::size(&snapshot, "S150");

        let enabled = enabled_sizes_in_range(&snapshot.sizes, from, to, &range);
        let codes: Vec<_> = enabled.iter().map(|e| e.size.code.as_str()).collect();

        // S200 is enabled but outside the span; S80..S150 are in span but disabled
        assert_eq!(codes, vec!["S50"]);
    }

    #[test]
    fn test_reversed_span_is_normalised() {
        let snapshot = fixtures::snapshot();
        let range = fixtures::size_range(&[("S50", None), ("S80", None)]);
        let from = fixtures::size(&snapshot, "S80");
        let to = fixtures::size(&snapshot, "S50");

        let enabled = enabled_sizes_in_range(&snapshot.sizes, from, to, &range);
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled[0].size.code, "S50");
    }

    #[test]
    fn test_spec_enabled_sizes_ignore_span() {
        let snapshot = fixtures::snapshot();
        let range = fixtures::size_range(&[("S200", None), ("S15", Some("XS"))]);

        let enabled = spec_enabled_sizes(&snapshot.sizes, &range);
        let codes: Vec<_> = enabled.iter().map(|e| e.size.code.as_str()).collect();
        assert_eq!(codes, vec!["S15", "S200"]);
    }

    #[test]
    fn test_equal_outer_diameter_ties_break_on_mm_then_code() {
        use crate::models::Size;
        use crate::overlay::OverlayResolver;
        use rust_decimal::Decimal;

        let mk = |code: &str, mm: i32| Size {
            project_id: None,
            size1_size2: code.to_string(),
            code: code.to_string(),
            client_code: code.to_string(),
            size_mm: mm,
            od: Decimal::new(603, 1),
        };
        let sizes = OverlayResolver::<Size, String>::by_natural_key()
            .resolve(vec![mk("B", 50), mk("A", 50), mk("C", 49)], Vec::new());

        let codes: Vec<_> = ordered_sizes(&sizes).iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }
}
