//! Diagnostic utilities shared across the workspace.
//!
//! This module centralises reusable metadata such as source spans and the
//! defect reports raised when the compiler's own invariants break.

pub mod error;
pub mod span;

pub use error::{DefectReport, PassFrame};
pub use span::Span;

use serde::{Deserialize, Serialize};

/// Categories of internal compiler defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefectCode {
    UnboundSymbol,
    IllegalBinding,
    StaleMutation,
    KindMismatch,
    MutationAfterRemoval,
    UnknownDeclaration,
    InvariantViolation,
    StageExhausted,
}

impl DefectCode {
    /// Stable label used in rendered reports.
    pub fn as_str(self) -> &'static str {
        match self {
            DefectCode::UnboundSymbol => "unbound-symbol",
            DefectCode::IllegalBinding => "illegal-binding",
            DefectCode::StaleMutation => "stale-mutation",
            DefectCode::KindMismatch => "kind-mismatch",
            DefectCode::MutationAfterRemoval => "mutation-after-removal",
            DefectCode::UnknownDeclaration => "unknown-declaration",
            DefectCode::InvariantViolation => "invariant-violation",
            DefectCode::StageExhausted => "stage-exhausted",
        }
    }
}
