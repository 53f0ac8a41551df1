//! Copy-on-write facet history.
//!
//! A [`CarrierEngine`] stores every version of a declaration's mutable state.
//! The state is a plain value `C` (for declarations, [`Facets`]); each
//! [`Carrier`] is a full snapshot of it stamped with the stage that produced
//! it. Reads resolve the newest carrier at or before the requested stage.
//! Writes at the stage of the newest carrier edit it in place; writes at a
//! later stage clone it first. Superseded carriers are never touched again.
//!
//! [`Facets`]: super::decl::Facets

use super::stage::Stage;

/// Snapshot of all mutable facets, valid from `stage` until the next carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct Carrier<C> {
    stage: Stage,
    values: C,
}

impl<C> Carrier<C> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn values(&self) -> &C {
        &self.values
    }
}

/// What an accepted write did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// The value equalled the current one; nothing was recorded.
    Unchanged,
    /// The newest carrier already belonged to this stage and was edited.
    Coalesced,
    /// A new carrier was appended for this stage.
    Appended,
}

/// Rejected write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// The write targets a stage older than the newest carrier.
    Stale { last_modified: Stage },
    /// The projection found no slot for the facet in this carrier.
    Missing,
}

/// Versioned storage for one declaration's facets.
///
/// The construction-time values form the baseline carrier, stamped with the
/// creation stage. The baseline is not part of [`history`](Self::history),
/// which therefore starts out empty.
#[derive(Debug, Clone)]
pub struct CarrierEngine<C> {
    baseline: Carrier<C>,
    history: Vec<Carrier<C>>,
}

impl<C: Clone> CarrierEngine<C> {
    pub fn new(initial: C, created_on: Stage) -> Self {
        Self {
            baseline: Carrier {
                stage: created_on,
                values: initial,
            },
            history: Vec::new(),
        }
    }

    /// Stage of the newest carrier. Before any appended carrier this is the
    /// baseline stamp, i.e. the creation stage.
    pub fn last_modified(&self) -> Stage {
        self.newest().stage
    }

    pub fn baseline(&self) -> &Carrier<C> {
        &self.baseline
    }

    /// Carriers appended after construction, oldest first.
    pub fn history(&self) -> &[Carrier<C>] {
        &self.history
    }

    /// Facet values as of the newest carrier.
    pub fn latest(&self) -> &C {
        &self.newest().values
    }

    /// Facet values visible at `stage`.
    ///
    /// Stages before the baseline observe the baseline.
    pub fn resolve(&self, stage: Stage) -> &C {
        let idx = self.history.partition_point(|carrier| carrier.stage <= stage);
        match idx {
            0 => &self.baseline.values,
            _ => &self.history[idx - 1].values,
        }
    }

    /// Write one facet at `stage`.
    ///
    /// `read` and `write` project the facet out of a snapshot. Equal values
    /// are dropped, same-stage writes coalesce, and later-stage writes append.
    pub fn set<T: PartialEq>(
        &mut self,
        stage: Stage,
        read: impl Fn(&C) -> Option<&T>,
        write: impl FnOnce(&mut C) -> Option<&mut T>,
        value: T,
    ) -> Result<WriteKind, WriteError> {
        let last_modified = self.last_modified();
        if stage < last_modified {
            return Err(WriteError::Stale { last_modified });
        }

        let current = read(self.latest()).ok_or(WriteError::Missing)?;
        if *current == value {
            return Ok(WriteKind::Unchanged);
        }

        if stage == last_modified {
            let newest = self.newest_mut();
            *write(&mut newest.values).ok_or(WriteError::Missing)? = value;
            return Ok(WriteKind::Coalesced);
        }

        let mut values = self.latest().clone();
        *write(&mut values).ok_or(WriteError::Missing)? = value;
        self.history.push(Carrier { stage, values });
        Ok(WriteKind::Appended)
    }

    /// Fold every carrier superseded at `floor` into the baseline.
    ///
    /// Afterwards reads at or after `floor` are unchanged and reads before it
    /// observe the floor state. Returns the number of carriers dropped.
    pub fn compact_before(&mut self, floor: Stage) -> usize {
        let idx = self.history.partition_point(|carrier| carrier.stage <= floor);
        if idx == 0 {
            return 0;
        }
        if let Some(newest_folded) = self.history.drain(..idx).last() {
            self.baseline = newest_folded;
        }
        idx
    }

    /// Whether carrier stamps strictly increase from the baseline onward.
    pub fn is_stage_ordered(&self) -> bool {
        let mut previous = self.baseline.stage;
        for carrier in &self.history {
            if carrier.stage <= previous {
                return false;
            }
            previous = carrier.stage;
        }
        true
    }

    /// Every carrier including the baseline, oldest first.
    pub fn carriers(&self) -> impl Iterator<Item = &Carrier<C>> {
        std::iter::once(&self.baseline).chain(self.history.iter())
    }

    fn newest(&self) -> &Carrier<C> {
        self.history.last().unwrap_or(&self.baseline)
    }

    fn newest_mut(&mut self) -> &mut Carrier<C> {
        match self.history.last_mut() {
            Some(carrier) => carrier,
            None => &mut self.baseline,
        }
    }
}
