//! Structural defects raised by the IR store.
//!
//! None of these are user diagnostics. Each one means a pass used the store
//! incorrectly, and the pipeline driver aborts the compilation with a
//! [`DefectReport`] when it sees one.

use flux_core::diag::{DefectCode, DefectReport};
use thiserror::Error;

use super::ids::SymbolId;
use super::stage::Stage;
use super::symbols::SymbolKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("symbol {symbol} is not bound to a declaration")]
    UnboundSymbol { symbol: SymbolId },

    #[error("symbol {symbol} is already bound to a declaration")]
    IllegalBinding { symbol: SymbolId },

    #[error("{kind} symbol {symbol} cannot be bound to a {found} declaration")]
    SymbolKindMismatch {
        symbol: SymbolId,
        kind: SymbolKind,
        found: SymbolKind,
    },

    #[error("{structure} declaration was given {facets} facets")]
    FacetKindMismatch {
        structure: SymbolKind,
        facets: SymbolKind,
    },

    #[error("{symbol} has no `{facet}` facet ({kind} declaration)")]
    FacetNotApplicable {
        symbol: SymbolId,
        facet: &'static str,
        kind: SymbolKind,
    },

    #[error("{symbol} was last modified at stage {last_modified}, cannot write at stage {stage}")]
    StaleMutation {
        symbol: SymbolId,
        stage: Stage,
        last_modified: Stage,
    },

    #[error("{symbol} was removed at stage {removed_on}, cannot write at stage {stage}")]
    MutationAfterRemoval {
        symbol: SymbolId,
        stage: Stage,
        removed_on: Stage,
    },

    #[error("symbol {symbol} resolves to a missing declaration slot")]
    UnknownDeclaration { symbol: SymbolId },

    #[error("stage space exhausted after stage {last}")]
    StageExhausted { last: Stage },
}

impl IrError {
    pub fn code(&self) -> DefectCode {
        match self {
            IrError::UnboundSymbol { .. } => DefectCode::UnboundSymbol,
            IrError::IllegalBinding { .. } => DefectCode::IllegalBinding,
            IrError::SymbolKindMismatch { .. }
            | IrError::FacetKindMismatch { .. }
            | IrError::FacetNotApplicable { .. } => DefectCode::KindMismatch,
            IrError::StaleMutation { .. } => DefectCode::StaleMutation,
            IrError::MutationAfterRemoval { .. } => DefectCode::MutationAfterRemoval,
            IrError::UnknownDeclaration { .. } => DefectCode::UnknownDeclaration,
            IrError::StageExhausted { .. } => DefectCode::StageExhausted,
        }
    }

    /// Convert into the developer-facing abort record.
    pub fn into_report(self, stage: Stage) -> DefectReport {
        DefectReport::new(self.code(), self.to_string(), stage.to_raw())
    }
}

pub type IrResult<T> = Result<T, IrError>;
