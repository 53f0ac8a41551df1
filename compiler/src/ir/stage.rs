//! Pipeline stage numbering.
//!
//! Every lowering pass runs under exactly one stage. Stages form a single
//! linear sequence; the controller only ever moves forward.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{IrError, IrResult};

/// A discrete, totally ordered step of the compiler pipeline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(u32);

impl Stage {
    /// Stage the front end is considered to run at.
    pub const FRONTEND: Stage = Stage(0);
    /// Sentinel for "never removed".
    pub const NEVER: Stage = Stage(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub fn is_never(self) -> bool {
        self == Self::NEVER
    }

    /// The stage immediately after this one, or `None` when that would be
    /// the sentinel.
    pub fn next(self) -> Option<Stage> {
        self.0
            .checked_add(1)
            .filter(|raw| *raw < u32::MAX)
            .map(Stage)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("Stage(never)")
        } else {
            write!(f, "Stage({})", self.0)
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("never")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Owner of the pipeline's notion of "now".
///
/// The controller is an explicit value held by the pipeline driver and passed
/// by reference into every call that stamps a mutation.
#[derive(Debug, Clone)]
pub struct StageController {
    current: Stage,
}

impl StageController {
    /// Controller positioned at the front-end stage.
    pub fn new() -> Self {
        Self::starting_at(Stage::FRONTEND)
    }

    pub fn starting_at(stage: Stage) -> Self {
        Self { current: stage }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Move to the next stage and return it.
    ///
    /// # Panics
    ///
    /// Panics when the stage space is exhausted; the pipeline driver uses
    /// [`try_advance`](Self::try_advance) instead.
    pub fn advance(&mut self) -> Stage {
        match self.try_advance() {
            Ok(stage) => stage,
            Err(err) => panic!("{err}"),
        }
    }

    /// Move to the next stage, failing instead of reusing the current one.
    pub fn try_advance(&mut self) -> IrResult<Stage> {
        let next = self
            .current
            .next()
            .ok_or(IrError::StageExhausted { last: self.current })?;
        self.current = next;
        Ok(next)
    }
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}
