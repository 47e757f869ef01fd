//! Error handling for the PMS expansion engine
//!
//! Service-level failures use [`PmsError`]. Store backends return
//! `anyhow::Result` with context strings, which fold into [`PmsError::Store`].
//! Reference lookups that fail while expanding a single PMS line are not
//! errors at this level: they surface as [`MissingReference`] and become a
//! diagnostic for that line.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for expansion and cache operations
#[derive(Error, Debug)]
pub enum PmsError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("No PMS lines declared for specification {spec_id}")]
    EmptyInput { spec_id: Uuid },

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PmsError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        PmsError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// `true` for outcomes that callers report as "no data" rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, PmsError::EmptyInput { .. })
    }
}

/// A required reference of a PMS line that is absent from the resolved overlay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing {kind} '{key}'")]
pub struct MissingReference {
    pub kind: &'static str,
    pub key: String,
}

pub type PmsResult<T> = Result<T, PmsError>;
