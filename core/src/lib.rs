//! Core crate entry point.
//!
//! Holds the diagnostics vocabulary shared by the rest of the FluxLang
//! workspace: source spans, defect codes and the report raised when a
//! compiler pass breaks an internal invariant.

pub mod diag;

pub use diag::{DefectCode, DefectReport, PassFrame, Span};
