//! Lowering pipeline driver.
//!
//! The driver owns the stage controller and the declaration factory. Each
//! lowering pass gets a fresh stage and exclusive access to the store for its
//! duration; the pass itself is opaque and known only by name and stage.
//! Any structural defect aborts the run with a [`DefectReport`].

use flux_core::diag::{DefectCode, DefectReport, PassFrame};
use serde::Serialize;
use tracing::{error, info, info_span};

use crate::config::PipelineConfig;
use crate::ir::{
    verify, Declaration, ExprId, Facet, IrFactory, IrResult, Metadata, NewDeclaration, Stage,
    StageController, StageView, SymbolId, SymbolKind, WriteKind,
};

/// A stage-stamped mutator of the declaration graph.
pub trait LoweringPass {
    fn name(&self) -> &str;

    fn run(&mut self, cx: &mut PassContext<'_>) -> IrResult<()>;
}

/// Store access handed to the running pass.
pub struct PassContext<'a> {
    stages: &'a StageController,
    factory: &'a mut IrFactory,
}

impl<'a> PassContext<'a> {
    pub fn new(stages: &'a StageController, factory: &'a mut IrFactory) -> Self {
        Self { stages, factory }
    }

    pub fn stage(&self) -> Stage {
        self.stages.current()
    }

    pub fn factory(&self) -> &IrFactory {
        self.factory
    }

    pub fn allocate_symbol(&mut self, kind: SymbolKind) -> SymbolId {
        self.factory.allocate_symbol(kind)
    }

    pub fn create(&mut self, symbol: Option<SymbolId>, init: NewDeclaration) -> IrResult<SymbolId> {
        self.factory.create(self.stages, symbol, init)
    }

    pub fn declaration(&self, symbol: SymbolId) -> IrResult<&Declaration> {
        self.factory.declaration(symbol)
    }

    pub fn get<F: Facet>(&self, symbol: SymbolId, facet: F) -> IrResult<&F::Value> {
        self.factory.get(symbol, facet, self.stages)
    }

    pub fn set<F: Facet>(
        &mut self,
        symbol: SymbolId,
        facet: F,
        value: F::Value,
    ) -> IrResult<WriteKind> {
        self.factory.set(symbol, facet, self.stages, value)
    }

    pub fn remove(&mut self, symbol: SymbolId) -> IrResult<()> {
        self.factory.remove(self.stages, symbol)
    }

    pub fn body_owner(&self, body: ExprId) -> Option<SymbolId> {
        self.factory.body_owner(body)
    }

    pub fn set_metadata(&mut self, symbol: SymbolId, metadata: Option<Metadata>) -> IrResult<()> {
        self.factory.set_metadata(symbol, metadata)
    }

    /// Read-only view of the store at the running stage.
    pub fn view(&self) -> StageView<'_> {
        self.factory.view_at(self.stage())
    }

    /// Live declarations not yet processed by this stage, in creation order.
    pub fn pending(&self) -> Vec<SymbolId> {
        let stage = self.stage();
        self.factory
            .live_at(stage)
            .filter(|decl| decl.needs_lowering(stage))
            .map(Declaration::symbol)
            .collect()
    }
}

/// Summary of one executed pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass: String,
    pub stage: Stage,
    pub created: usize,
    pub removed: usize,
    pub carriers_appended: usize,
    pub carriers_compacted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub final_stage: Stage,
    pub passes: Vec<PassReport>,
}

impl PipelineReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug)]
pub struct PipelineDriver {
    config: PipelineConfig,
    stages: StageController,
    factory: IrFactory,
    trace: Vec<PassFrame>,
    reports: Vec<PassReport>,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Self {
        let stages = StageController::starting_at(config.initial_stage());
        Self {
            config,
            stages,
            factory: IrFactory::new(),
            trace: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stages(&self) -> &StageController {
        &self.stages
    }

    pub fn factory(&self) -> &IrFactory {
        &self.factory
    }

    /// View of the store at the stage of the last completed pass.
    pub fn view(&self) -> StageView<'_> {
        self.factory.view_at(self.stages.current())
    }

    /// Populate the store at the initial stage, as the front end does.
    pub fn frontend<R>(
        &mut self,
        build: impl FnOnce(&mut PassContext<'_>) -> IrResult<R>,
    ) -> Result<R, DefectReport> {
        let stage = self.stages.current();
        let mut cx = PassContext::new(&self.stages, &mut self.factory);
        let result = match build(&mut cx) {
            Ok(result) => result,
            Err(err) => return Err(self.abort("frontend", stage, err.into_report(stage))),
        };
        self.trace.push(PassFrame {
            pass: "frontend".to_string(),
            stage: stage.to_raw(),
        });
        Ok(result)
    }

    /// Advance to a new stage and run `pass` under it.
    pub fn run_pass(&mut self, pass: &mut dyn LoweringPass) -> Result<PassReport, DefectReport> {
        let name = pass.name().to_string();
        let stage = match self.stages.try_advance() {
            Ok(stage) => stage,
            Err(err) => {
                let stage = self.stages.current();
                return Err(self.abort(&name, stage, err.into_report(stage)));
            }
        };
        let span = info_span!("lowering_pass", pass = %name, %stage);
        let _entered = span.enter();

        let created_before = self.factory.len();
        let removed_before = self.factory.removed_up_to(stage).count();
        let carriers_before = total_history(&self.factory);

        let mut cx = PassContext::new(&self.stages, &mut self.factory);
        if let Err(err) = pass.run(&mut cx) {
            return Err(self.abort(&name, stage, err.into_report(stage)));
        }

        let carriers_appended = total_history(&self.factory).saturating_sub(carriers_before);
        self.factory.mark_lowered(stage);
        let carriers_compacted = match self.config.retention_floor(stage) {
            Some(floor) => self.factory.compact_before(floor),
            None => 0,
        };

        if self.config.verify_each_pass {
            let violations = verify(&self.factory);
            if !violations.is_empty() {
                let message = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                let report =
                    DefectReport::new(DefectCode::InvariantViolation, message, stage.to_raw());
                return Err(self.abort(&name, stage, report));
            }
        }

        let report = PassReport {
            pass: name.clone(),
            stage,
            created: self.factory.len() - created_before,
            removed: self.factory.removed_up_to(stage).count() - removed_before,
            carriers_appended,
            carriers_compacted,
        };
        info!(
            created = report.created,
            removed = report.removed,
            appended = report.carriers_appended,
            compacted = report.carriers_compacted,
            "pass complete"
        );
        self.trace.push(PassFrame {
            pass: name,
            stage: stage.to_raw(),
        });
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Run every pass in order, stopping at the first defect.
    pub fn run_all(
        &mut self,
        passes: &mut [Box<dyn LoweringPass>],
    ) -> Result<PipelineReport, DefectReport> {
        for pass in passes.iter_mut() {
            self.run_pass(pass.as_mut())?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            final_stage: self.stages.current(),
            passes: self.reports.clone(),
        }
    }

    pub fn into_factory(self) -> IrFactory {
        self.factory
    }

    fn abort(&self, pass: &str, stage: Stage, report: DefectReport) -> DefectReport {
        let mut trace = self.trace.clone();
        trace.push(PassFrame {
            pass: pass.to_string(),
            stage: stage.to_raw(),
        });
        error!(
            pass,
            %stage,
            code = report.code.as_str(),
            message = %report.message,
            "pipeline aborted"
        );
        report.with_trace(trace)
    }
}

fn total_history(factory: &IrFactory) -> usize {
    factory.declarations().map(Declaration::history_len).sum()
}
