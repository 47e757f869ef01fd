//! Expansion Engine
//!
//! Expands the declared rules of one specification into generated items.
//!
//! Key principles:
//! - Expansion is PURE: every table arrives pre-loaded in a [`DomainSnapshot`]
//! - Same input always produces identical output, in line sort order then
//!   policy order
//! - A line with a missing required reference is skipped with a diagnostic;
//!   the rest of the specification still expands
//! - Missing optional references degrade to placeholders

use tracing::debug;

use super::catalog::resolve_catalog;
use super::policy::{plain, CombinationPolicy, PolicyContext};
use super::size_range::{enabled_sizes_in_range, spec_enabled_sizes};
use super::synthesis::{synthesize, ItemAttributes, PLACEHOLDER, SCHEDULE_PLACEHOLDER};
use super::types::{
    DiagnosticLevel, DomainSnapshot, EnabledSize, ExpansionDiagnostic, ExpansionOutput, ItemTuple,
    SpecificationRules,
};
use crate::error::MissingReference;
use crate::models::{
    Component, ComponentDescription, ConstructionDescription, DimensionalStandard, GeneratedItem,
    Material, PmsLine, Rating, Schedule, Size, ValvePmsLine, ValveSubType,
};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Expand every PMS line and valve PMS line of a specification.
pub fn expand(snapshot: &DomainSnapshot, rules: &SpecificationRules) -> ExpansionOutput {
    let spec_sizes = spec_enabled_sizes(&snapshot.sizes, &rules.size_range);
    let mut output = ExpansionOutput::default();

    let mut lines: Vec<&PmsLine> = rules.lines.iter().collect();
    lines.sort_by_key(|line| line.sort_order);
    for line in lines {
        let expanded = expand_line(snapshot, rules, &spec_sizes, line, None);
        collect(&mut output, line, expanded);
    }

    let mut valve_lines: Vec<&ValvePmsLine> = rules.valve_lines.iter().collect();
    valve_lines.sort_by_key(|line| line.sort_order);
    for valve_line in valve_lines {
        let line = valve_line.as_pms_line();
        let extras = ValveExtras::resolve(snapshot, valve_line, &mut output.diagnostics);
        let expanded = expand_line(snapshot, rules, &spec_sizes, &line, Some(extras));
        collect(&mut output, &line, expanded);
    }

    debug!(
        spec = %rules.spec.name,
        items = output.items.len(),
        skipped = output.skipped_lines(),
        "Expanded specification"
    );
    output
}

// =============================================================================
// PER-LINE EXPANSION
// =============================================================================

/// Required and optional references of one line, resolved against the snapshot
struct ResolvedLine<'a> {
    component: &'a Component,
    component_desc: &'a ComponentDescription,
    size1: &'a Size,
    size2: &'a Size,
    rating: Option<&'a Rating>,
    material: &'a Material,
    dimensional_standard: Option<&'a DimensionalStandard>,
}

/// Valve-only attributes carried as separate output fields
#[derive(Clone, Copy)]
struct ValveExtras<'a> {
    construction: Option<&'a ConstructionDescription>,
    sub_type: Option<&'a ValveSubType>,
}

struct LineExpansion {
    items: Vec<GeneratedItem>,
    warnings: Vec<String>,
}

fn collect(
    output: &mut ExpansionOutput,
    line: &PmsLine,
    expanded: Result<LineExpansion, Vec<MissingReference>>,
) {
    match expanded {
        Ok(expansion) => {
            debug!(
                line_id = %line.line_id,
                comp_type = %line.comp_type,
                items = expansion.items.len(),
                "Expanded PMS line"
            );
            for message in expansion.warnings {
                output
                    .diagnostics
                    .push(diagnostic(DiagnosticLevel::Warning, line, message));
            }
            if expansion.items.is_empty() {
                output.diagnostics.push(diagnostic(
                    DiagnosticLevel::Warning,
                    line,
                    format!(
                        "no enabled sizes produce items between {} and {}",
                        line.size1_code, line.size2_code
                    ),
                ));
            }
            output.items.extend(expansion.items);
        }
        Err(missing) => {
            let message = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            output.diagnostics.push(diagnostic(
                DiagnosticLevel::Error,
                line,
                format!("line skipped: {}", message),
            ));
        }
    }
}

fn diagnostic(level: DiagnosticLevel, line: &PmsLine, message: String) -> ExpansionDiagnostic {
    ExpansionDiagnostic {
        level,
        line_id: line.line_id,
        comp_type: line.comp_type.clone(),
        message,
    }
}

fn expand_line(
    snapshot: &DomainSnapshot,
    rules: &SpecificationRules,
    spec_sizes: &[EnabledSize<'_>],
    line: &PmsLine,
    valve: Option<ValveExtras<'_>>,
) -> Result<LineExpansion, Vec<MissingReference>> {
    let (resolved, mut warnings) = resolve_line(snapshot, line)?;

    let enabled = enabled_sizes_in_range(
        &snapshot.sizes,
        resolved.size1,
        resolved.size2,
        &rules.size_range,
    );

    let tuples = match valve {
        Some(_) => plain(&enabled).collect(),
        None => {
            let policy = CombinationPolicy::for_line(&line.comp_type, resolved.component_desc);
            PolicyContext {
                snapshot,
                enabled: &enabled,
                spec_sizes,
            }
            .combinations(policy)
        }
    };

    let items = tuples
        .into_iter()
        .map(|tuple| {
            let mut item = build_item(
                snapshot,
                &rules.spec.name,
                line,
                &resolved,
                tuple,
                &mut warnings,
            );
            if let Some(extras) = valve {
                item.construction_desc = extras.construction.map(|c| c.description.clone());
                item.valve_sub_type = extras.sub_type.map(|v| v.description.clone());
            }
            item
        })
        .collect();

    Ok(LineExpansion { items, warnings })
}

fn resolve_line<'a>(
    snapshot: &'a DomainSnapshot,
    line: &PmsLine,
) -> Result<(ResolvedLine<'a>, Vec<String>), Vec<MissingReference>> {
    let component = snapshot
        .components
        .get(line.comp_type.as_str())
        .required("component", &line.comp_type);
    let component_desc = snapshot
        .component_descriptions
        .get(line.component_desc_code.as_str())
        .required("component description", &line.component_desc_code);
    let size1 = snapshot
        .sizes
        .get(line.size1_code.as_str())
        .required("size1", &line.size1_code);
    let size2 = snapshot
        .sizes
        .get(line.size2_code.as_str())
        .required("size2", &line.size2_code);
    let material = snapshot
        .materials
        .get(line.material_code.as_str())
        .required("material", &line.material_code);

    let (component, component_desc, size1, size2, material) =
        match (component, component_desc, size1, size2, material) {
            (Ok(c), Ok(cd), Ok(s1), Ok(s2), Ok(m)) => (c, cd, s1, s2, m),
            (c, cd, s1, s2, m) => {
                let missing = [c.err(), cd.err(), s1.err(), s2.err(), m.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                return Err(missing);
            }
        };

    let mut warnings = Vec::new();
    let rating = optional_ref(&snapshot.ratings, line.rating_code.as_deref(), "rating", &mut warnings);
    let dimensional_standard = optional_ref(
        &snapshot.dimensional_standards,
        line.dimensional_standard_code.as_deref(),
        "dimensional standard",
        &mut warnings,
    );

    Ok((
        ResolvedLine {
            component,
            component_desc,
            size1,
            size2,
            rating,
            material,
            dimensional_standard,
        },
        warnings,
    ))
}

/// Declared-but-unknown optional codes degrade to `None` with a warning.
fn optional_ref<'a, T>(
    overlay: &'a crate::overlay::Overlay<String, T>,
    code: Option<&str>,
    kind: &str,
    warnings: &mut Vec<String>,
) -> Option<&'a T> {
    let code = code?;
    let found = overlay.get(code).optional();
    if found.is_none() {
        warnings.push(format!("{} '{}' not found, using placeholder", kind, code));
    }
    found
}

/// Schedules are looked up per item; each unknown code is reported once per line.
fn schedule_ref<'a>(
    snapshot: &'a DomainSnapshot,
    code: Option<&str>,
    warnings: &mut Vec<String>,
) -> Option<&'a Schedule> {
    let mut missing = Vec::new();
    let found = optional_ref(&snapshot.schedules, code, "schedule", &mut missing);
    for message in missing {
        if !warnings.contains(&message) {
            warnings.push(message);
        }
    }
    found
}

impl<'a> ValveExtras<'a> {
    fn resolve(
        snapshot: &'a DomainSnapshot,
        line: &ValvePmsLine,
        diagnostics: &mut Vec<ExpansionDiagnostic>,
    ) -> Self {
        let mut warnings = Vec::new();
        let construction = optional_ref(
            &snapshot.construction_descriptions,
            line.construction_desc_code.as_deref(),
            "construction description",
            &mut warnings,
        );
        let sub_type = optional_ref(
            &snapshot.valve_sub_types,
            line.valve_sub_type_code.as_deref(),
            "valve sub-type",
            &mut warnings,
        );
        diagnostics.extend(warnings.into_iter().map(|message| ExpansionDiagnostic {
            level: DiagnosticLevel::Warning,
            line_id: line.line_id,
            comp_type: line.comp_type.clone(),
            message,
        }));
        Self {
            construction,
            sub_type,
        }
    }
}

// =============================================================================
// ITEM CONSTRUCTION
// =============================================================================

fn build_item(
    snapshot: &DomainSnapshot,
    spec_name: &str,
    line: &PmsLine,
    resolved: &ResolvedLine<'_>,
    tuple: ItemTuple<'_>,
    warnings: &mut Vec<String>,
) -> GeneratedItem {
    let schedule1 = schedule_ref(snapshot, tuple.schedule1, warnings);
    let schedule2 = schedule_ref(snapshot, tuple.schedule2, warnings);

    let attrs = ItemAttributes {
        component_desc: resolved.component_desc,
        size1: tuple.size1,
        size2: tuple.size2,
        schedule1,
        schedule2,
        rating: resolved.rating,
        material: resolved.material,
        dimensional_standard: resolved.dimensional_standard,
    };
    let codes = synthesize(&attrs);

    let rating_text = resolved.rating.map_or("", |r| r.rating.as_str());
    let size2_mm = tuple.size2.map(|s| s.size_mm);
    let catalog = resolve_catalog(
        &snapshot.catalog_references,
        &codes.short_desc,
        rating_text,
        tuple.size1.size_mm,
        size2_mm,
    );

    let desc = resolved.component_desc;
    GeneratedItem {
        spec_name: spec_name.to_string(),
        pms_line_id: line.line_id,
        comp_type: line.comp_type.clone(),
        short_code: resolved.component.short_code.clone(),
        item_code: codes.item_code,
        client_item_code: codes.client_item_code,
        long_desc: codes.long_desc,
        short_desc: codes.short_desc,
        size1_inch: tuple.size1.size1_size2.clone(),
        size2_inch: tuple.size2.map(|s| s.size1_size2.clone()),
        size1_mm: tuple.size1.size_mm,
        size2_mm,
        schedule1: schedule1
            .map_or(SCHEDULE_PLACEHOLDER, |s| s.sch1_sch2.as_str())
            .to_string(),
        schedule2: schedule2
            .map_or(SCHEDULE_PLACEHOLDER, |s| s.sch1_sch2.as_str())
            .to_string(),
        rating: resolved
            .rating
            .map_or(PLACEHOLDER, |r| r.rating.as_str())
            .to_string(),
        g_type: desc.g_type.clone(),
        s_type: desc.s_type.clone(),
        skey: desc.skey.clone(),
        catalog,
        unit_weight: None,
        construction_desc: None,
        valve_sub_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::fixtures;
    use uuid::Uuid;

    #[test]
    fn test_default_policy_yields_one_item_per_enabled_size() {
        let snapshot = fixtures::snapshot();
        let rules = fixtures::rules(
            vec![fixtures::line("PIPE", "PIP", "S25", "S100")],
            fixtures::size_range(&[("S25", Some("S40")), ("S50", Some("STD")), ("S100", None)]),
        );

        let output = expand(&snapshot, &rules);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.items.len(), 3);
        for item in &output.items {
            assert_eq!(item.size2_inch, None);
            assert_eq!(item.schedule2, SCHEDULE_PLACEHOLDER);
            assert_eq!(item.short_code, "PP");
        }
        assert_eq!(output.items[2].schedule1, SCHEDULE_PLACEHOLDER);
        assert_eq!(output.items[0].item_code, "PIPS25XS40XXR1M1");
    }

    #[test]
    fn test_flange_end_to_end() {
        let snapshot = fixtures::snapshot();
        let rules = fixtures::rules(
            vec![fixtures::line("FLANGE", "RF", "S50", "S150")],
            fixtures::size_range(&[
                ("S50", Some("STD")),
                ("S80", Some("STD")),
                ("S100", Some("STD")),
                ("S150", Some("STD")),
            ]),
        );

        let output = expand(&snapshot, &rules);
        let codes: Vec<_> = output.items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(
            codes,
            vec![
                "RFS50XSTDXXR1M1",
                "RFS80XSTDXXR1M1",
                "RFS100XSTDXXR1M1",
                "RFS150XSTDXXR1M1",
            ]
        );
        let catalogs: Vec<_> = output.items.iter().map(|i| i.catalog.as_str()).collect();
        assert_eq!(catalogs, vec!["CAT-FL-50", "CAT-FL-80", "CAT-FL-100", "CAT-FL-150"]);
        assert!(output.items.iter().all(|i| i.schedule1 == "STD"));
        assert!(output.items.iter().all(|i| i.unit_weight.is_none()));
        assert_eq!(
            output.items[0].long_desc,
            "FLANGE WN RF, SCH STD, 150#, ASTM A105, ASME B16.5"
        );
    }

    #[test]
    fn test_missing_required_reference_skips_only_that_line() {
        let snapshot = fixtures::snapshot();
        let mut broken = fixtures::line("FLANGE", "RF", "S50", "S80");
        broken.material_code = "NOPE".to_string();
        broken.size2_code = "S999".to_string();
        let rules = fixtures::rules(
            vec![broken.clone(), fixtures::line("PIPE", "PIP", "S50", "S80")],
            fixtures::full_size_range(Some("STD")),
        );

        let output = expand(&snapshot, &rules);
        assert_eq!(output.items.len(), 2);
        assert_eq!(output.skipped_lines(), 1);

        let diag = &output.diagnostics[0];
        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.line_id, broken.line_id);
        assert!(diag.message.contains("size2 'S999'"));
        assert!(diag.message.contains("material 'NOPE'"));
    }

    #[test]
    fn test_missing_rating_degrades_with_warning() {
        let snapshot = fixtures::snapshot();
        let mut line = fixtures::line("PIPE", "PIP", "S50", "S50");
        line.rating_code = Some("R9".to_string());
        let rules = fixtures::rules(vec![line], fixtures::full_size_range(None));

        let output = expand(&snapshot, &rules);
        assert_eq!(output.items.len(), 1);
        assert_eq!(output.items[0].rating, PLACEHOLDER);
        assert_eq!(output.items[0].item_code, "PIPS50XXXXXXM1");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn test_unknown_schedule_degrades_with_one_warning() {
        let snapshot = fixtures::snapshot();
        let rules = fixtures::rules(
            vec![fixtures::line("PIPE", "PIP", "S50", "S100")],
            fixtures::size_range(&[("S50", Some("SX")), ("S80", Some("SX")), ("S100", Some("STD"))]),
        );

        let output = expand(&snapshot, &rules);
        assert_eq!(output.items.len(), 3);
        assert_eq!(output.items[0].schedule1, SCHEDULE_PLACEHOLDER);
        assert_eq!(output.items[1].schedule1, SCHEDULE_PLACEHOLDER);
        assert_eq!(output.items[2].schedule1, "STD");
        assert_eq!(output.skipped_lines(), 0);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].level, DiagnosticLevel::Warning);
        assert_eq!(
            output.diagnostics[0].message,
            "schedule 'SX' not found, using placeholder"
        );
    }

    #[test]
    fn test_lines_follow_sort_order() {
        let snapshot = fixtures::snapshot();
        let mut second = fixtures::line("PIPE", "PIP", "S50", "S50");
        second.sort_order = 2;
        let mut first = fixtures::line("FLANGE", "RF", "S50", "S50");
        first.sort_order = 1;
        let rules = fixtures::rules(vec![second, first], fixtures::full_size_range(None));

        let output = expand(&snapshot, &rules);
        let types: Vec<_> = output.items.iter().map(|i| i.comp_type.as_str()).collect();
        assert_eq!(types, vec!["FLANGE", "PIPE"]);
    }

    #[test]
    fn test_empty_span_reports_warning() {
        let snapshot = fixtures::snapshot();
        let rules = fixtures::rules(
            vec![fixtures::line("PIPE", "PIP", "S50", "S80")],
            fixtures::size_range(&[("S200", None)]),
        );

        let output = expand(&snapshot, &rules);
        assert!(output.items.is_empty());
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.skipped_lines(), 0);
    }

    #[test]
    fn test_valve_lines_carry_construction_and_sub_type() {
        let snapshot = fixtures::snapshot();
        let mut rules = fixtures::rules(Vec::new(), fixtures::size_range(&[("S50", Some("STD")), ("S80", None)]));
        rules.valve_lines.push(ValvePmsLine {
            line_id: Uuid::new_v4(),
            spec_id: fixtures::SPEC_ID,
            comp_type: "VALV".to_string(),
            component_desc_code: "GAV".to_string(),
            construction_desc_code: Some("BB".to_string()),
            valve_sub_type_code: Some("OSY".to_string()),
            size1_code: "S50".to_string(),
            size2_code: "S80".to_string(),
            rating_code: Some("R1".to_string()),
            material_code: "M1".to_string(),
            dimensional_standard_code: None,
            sort_order: 1,
        });

        let output = expand(&snapshot, &rules);
        assert_eq!(output.items.len(), 2);
        let valve = &output.items[0];
        assert_eq!(valve.construction_desc.as_deref(), Some("BOLTED BONNET"));
        assert_eq!(valve.valve_sub_type.as_deref(), Some("OS&Y"));
        // not folded into the code
        assert_eq!(valve.item_code, "GAVS50XSTDXXR1M1");
        assert_eq!(output.items[1].item_code, "GAVS80XXXXXR1M1");
    }
}
