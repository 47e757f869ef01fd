//! Shared catalog for expansion unit tests

use rust_decimal::Decimal;
use uuid::Uuid;

use super::size_range::SizeRange;
use super::types::{DomainSnapshot, SpecificationRules};
use crate::models::*;
use crate::overlay::OverlayResolver;

pub const SPEC_ID: Uuid = Uuid::from_u128(0x5bec);

fn resolve<T: crate::overlay::NaturalKey>(rows: Vec<T>) -> crate::overlay::Overlay<T::Key, T> {
    OverlayResolver::<T, T::Key>::by_natural_key().resolve(rows, Vec::new())
}

fn s(v: &str) -> String {
    v.to_string()
}

pub fn sizes() -> Vec<Size> {
    [
        ("1/2", 15, 213),
        ("3/4", 20, 267),
        ("1", 25, 334),
        ("1-1/2", 40, 483),
        ("2", 50, 603),
        ("3", 80, 889),
        ("4", 100, 1143),
        ("6", 150, 1683),
        ("8", 200, 2191),
    ]
    .into_iter()
    .map(|(inch, mm, od)| Size {
        project_id: None,
        size1_size2: s(inch),
        code: format!("S{mm}"),
        client_code: format!("C{mm}"),
        size_mm: mm,
        od: Decimal::new(od, 1),
    })
    .collect()
}

pub fn snapshot() -> DomainSnapshot {
    let components = [
        ("FLANGE", "FL"),
        ("TEE", "TE"),
        ("REDUCER", "RD"),
        ("COUPLING", "CP"),
        ("OLET", "OL"),
        ("VALV", "VA"),
        ("PIPE", "PP"),
    ]
    .into_iter()
    .map(|(comp_type, short_code)| Component {
        project_id: None,
        comp_type: s(comp_type),
        short_code: s(short_code),
        description: None,
    })
    .collect();

    let component_descriptions = [
        ("FLANGE", "RF", "FLANGE WN RF"),
        ("FLANGE", "RFR", "FLANGE REDUCING RF"),
        ("TEE", "TEQ", "TEE BW"),
        ("REDUCER", "RCON", "REDUCER CONC BW"),
        ("REDUCER", "RSWG", "Swage Conc PBE"),
        ("COUPLING", "CPL", "COUPLING RED SW"),
        ("OLET", "WOL", "WELDOLET"),
        ("VALV", "GAV", "GATE VALVE"),
        ("PIPE", "PIP", "PIPE SMLS BE"),
    ]
    .into_iter()
    .map(|(comp_type, code, description)| ComponentDescription {
        project_id: None,
        comp_type: s(comp_type),
        code: s(code),
        client_code: format!("K{code}"),
        description: s(description),
        g_type: Some(s(comp_type)),
        s_type: Some(s("BW")),
        skey: Some(format!("{code}BW")),
    })
    .collect();

    let schedules = [("STD", "SCH STD"), ("XS", "SCH XS"), ("S40", "SCH 40")]
        .into_iter()
        .map(|(code, description)| Schedule {
            project_id: None,
            code: s(code),
            client_code: format!("C{code}"),
            sch1_sch2: s(code),
            description: s(description),
        })
        .collect();

    let branch_table = [
        (80, 50, "T"),
        (80, 80, "T"),
        (100, 50, "T"),
        (100, 80, "T"),
        (100, 100, "T"),
        (100, 25, "T"),
        (150, 50, "W"),
        (200, 50, "W"),
        (150, 80, "W"),
        (100, 50, "H"),
    ]
    .into_iter()
    .map(|(run, branch, tag)| BranchTableEntry {
        project_id: None,
        run_size: run,
        branch_size: branch,
        tag: s(tag),
    })
    .collect();

    let reducer_table = [
        ("REDUCER", "3", "2"),
        ("REDUCER", "4", "3"),
        ("REDUCER", "4", "2"),
        ("REDUCER", "6", "4"),
        ("REDUCER", "8", "6"),
        ("REDUCER SWAGE", "2", "1"),
        ("REDUCER SWAGE", "3", "2"),
    ]
    .into_iter()
    .map(|(family, big, small)| ReducerTableEntry {
        project_id: None,
        family: s(family),
        big_size: s(big),
        small_size: s(small),
    })
    .collect();

    DomainSnapshot {
        components: resolve(components),
        component_descriptions: resolve(component_descriptions),
        sizes: resolve(sizes()),
        schedules: resolve(schedules),
        ratings: resolve(vec![Rating {
            project_id: None,
            code: s("R1"),
            client_code: s("CR1"),
            rating: s("150#"),
        }]),
        materials: resolve(vec![Material {
            project_id: None,
            code: s("M1"),
            client_code: s("CM1"),
            description: s("ASTM A105"),
        }]),
        dimensional_standards: resolve(vec![DimensionalStandard {
            project_id: None,
            code: s("D1"),
            description: s("ASME B16.5"),
        }]),
        construction_descriptions: resolve(vec![ConstructionDescription {
            project_id: None,
            code: s("BB"),
            client_code: s("CBB"),
            description: s("BOLTED BONNET"),
        }]),
        valve_sub_types: resolve(vec![ValveSubType {
            project_id: None,
            code: s("OSY"),
            client_code: s("COSY"),
            description: s("OS&Y"),
        }]),
        catalog_references: resolve(vec![CatalogReference {
            project_id: None,
            item_short_desc: s("FLANGE WN RF"),
            rating: Some(s("150#")),
            catalog: s("CAT-FL"),
        }]),
        branch_table: resolve(branch_table),
        reducer_table: resolve(reducer_table),
    }
}

pub fn size<'a>(snapshot: &'a DomainSnapshot, code: &str) -> &'a Size {
    snapshot
        .sizes
        .get(code)
        .optional()
        .unwrap_or_else(|| panic!("fixture size {code} missing"))
}

pub fn size_range(entries: &[(&str, Option<&str>)]) -> SizeRange {
    SizeRange::from_entries(entries.iter().map(|(code, schedule)| SizeRangeEntry {
        spec_id: SPEC_ID,
        size_code: s(code),
        schedule_code: schedule.map(s),
    }))
}

/// Every fixture size enabled with the given schedule
pub fn full_size_range(schedule: Option<&str>) -> SizeRange {
    SizeRange::from_entries(sizes().into_iter().map(|sz| SizeRangeEntry {
        spec_id: SPEC_ID,
        size_code: sz.code,
        schedule_code: schedule.map(s),
    }))
}

pub fn line(comp_type: &str, desc_code: &str, size1: &str, size2: &str) -> PmsLine {
    PmsLine {
        line_id: Uuid::new_v4(),
        spec_id: SPEC_ID,
        comp_type: s(comp_type),
        component_desc_code: s(desc_code),
        size1_code: s(size1),
        size2_code: s(size2),
        rating_code: Some(s("R1")),
        material_code: s("M1"),
        dimensional_standard_code: Some(s("D1")),
        sort_order: 0,
    }
}

pub fn rules(lines: Vec<PmsLine>, size_range: SizeRange) -> SpecificationRules {
    SpecificationRules {
        spec: Specification {
            spec_id: SPEC_ID,
            project_id: Uuid::from_u128(0x9),
            name: s("A1"),
        },
        size_range,
        lines,
        valve_lines: Vec::new(),
    }
}
