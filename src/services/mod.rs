//! Services over the PMS store

pub mod expansion_service;

pub use expansion_service::{ExpandResponse, ExpansionService, LoadSummary};
