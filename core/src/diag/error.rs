//! Defect payload types.
//!
//! A `DefectReport` is what the compiler produces when a structural invariant
//! of its own data is violated. It is addressed to compiler developers, not to
//! end users, and carries the pass trace that led to the abort.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DefectCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectReport {
    pub code: DefectCode,
    pub message: String,
    /// Pipeline stage that was executing when the defect surfaced.
    pub stage: u32,
    pub trace: Vec<PassFrame>,
}

/// One completed or aborted pass in the pipeline history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFrame {
    pub pass: String,
    pub stage: u32,
}

impl DefectReport {
    pub fn new(code: DefectCode, message: impl Into<String>, stage: u32) -> Self {
        Self {
            code,
            message: message.into(),
            stage,
            trace: Vec::new(),
        }
    }

    /// Attach the pass trace, oldest frame first.
    pub fn with_trace(mut self, trace: Vec<PassFrame>) -> Self {
        self.trace = trace;
        self
    }
}

impl fmt::Display for DefectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "internal compiler defect [{}] at stage {}: {}",
            self.code.as_str(),
            self.stage,
            self.message
        )?;
        for frame in self.trace.iter().rev() {
            writeln!(f, "  in pass `{}` (stage {})", frame.pass, frame.stage)?;
        }
        Ok(())
    }
}

impl std::error::Error for DefectReport {}
