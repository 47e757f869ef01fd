//! Catalog reference and unit weight resolution

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{CatalogReference, GeneratedItem};
use crate::overlay::Overlay;

/// Weight rendered when nothing is cached for an item code
pub const DEFAULT_WEIGHT: &str = "0.00";

/// `<catalog>-<size1mm>x<size2mm>` (or `<catalog>-<size1mm>`) for an exact
/// (short description, rating) match; empty when unmatched.
pub fn resolve_catalog(
    catalogs: &Overlay<(String, String), CatalogReference>,
    short_desc: &str,
    rating_text: &str,
    size1_mm: i32,
    size2_mm: Option<i32>,
) -> String {
    let key = (short_desc.to_string(), rating_text.to_string());
    match catalogs.get(&key).optional() {
        Some(reference) => match size2_mm {
            Some(size2) => format!("{}-{}x{}", reference.catalog, size1_mm, size2),
            None => format!("{}-{}", reference.catalog, size1_mm),
        },
        None => String::new(),
    }
}

pub fn format_weight(weight: Decimal) -> String {
    format!("{:.2}", weight.round_dp(2))
}

/// Cached weight as a two-decimal string, `"0.00"` when absent
pub fn resolve_weight(weights: &HashMap<String, Decimal>, item_code: &str) -> String {
    weights
        .get(item_code)
        .map(|w| format_weight(*w))
        .unwrap_or_else(|| DEFAULT_WEIGHT.to_string())
}

/// Fill `unit_weight` on every item from a batch of cached weights.
pub fn apply_weights(items: &mut [GeneratedItem], weights: &HashMap<String, Decimal>) {
    for item in items {
        item.unit_weight = Some(resolve_weight(weights, &item.item_code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::fixtures;
    use std::str::FromStr;

    #[test]
    fn test_catalog_suffixes() {
        let snapshot = fixtures::snapshot();
        let catalogs = &snapshot.catalog_references;

        assert_eq!(resolve_catalog(catalogs, "FLANGE WN RF", "150#", 50, None), "CAT-FL-50");
        assert_eq!(
            resolve_catalog(catalogs, "FLANGE WN RF", "150#", 80, Some(50)),
            "CAT-FL-80x50"
        );
    }

    #[test]
    fn test_catalog_requires_exact_rating() {
        let snapshot = fixtures::snapshot();
        let catalogs = &snapshot.catalog_references;

        assert_eq!(resolve_catalog(catalogs, "FLANGE WN RF", "300#", 50, None), "");
        assert_eq!(resolve_catalog(catalogs, "FLANGE WN RF", "", 50, None), "");
        assert_eq!(resolve_catalog(catalogs, "flange wn rf", "150#", 50, None), "");
    }

    #[test]
    fn test_weight_defaults_and_formatting() {
        let mut weights = HashMap::new();
        weights.insert("A".to_string(), Decimal::from_str("12.5").unwrap());
        weights.insert("B".to_string(), Decimal::from_str("3.14159").unwrap());

        assert_eq!(resolve_weight(&weights, "A"), "12.50");
        assert_eq!(resolve_weight(&weights, "B"), "3.14");
        assert_eq!(resolve_weight(&weights, "missing"), DEFAULT_WEIGHT);
        assert_eq!(format_weight(Decimal::ZERO), "0.00");
    }
}
