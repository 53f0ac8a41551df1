//! Declaration factory: the single owner of every IR node.
//!
//! The factory allocates symbols, binds each one exactly once, stamps new
//! declarations with the current stage and keeps removal accounting. Passes
//! reach declarations through symbols only; read-only consumers take a
//! [`StageView`] pinned to one stage.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::arena::{Arena, ArenaIndex};
use super::carrier::WriteKind;
use super::decl::{facet, Declaration, Facet, Facets, Metadata, NewDeclaration};
use super::error::{IrError, IrResult};
use super::ids::{DeclId, ExprId, SymbolId};
use super::stage::{Stage, StageController};
use super::symbols::{SymbolKind, SymbolTable};

#[derive(Debug, Default)]
pub struct IrFactory {
    symbols: SymbolTable,
    decls: Arena<Declaration>,
    removals: Vec<(Stage, SymbolId)>,
    /// Declaration each expression body was last handed to.
    body_owners: BTreeMap<ExprId, SymbolId>,
}

impl IrFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Allocate an unbound symbol so declarations can be referenced before
    /// they are created.
    pub fn allocate_symbol(&mut self, kind: SymbolKind) -> SymbolId {
        self.symbols.allocate(kind)
    }

    /// Construct a declaration at the current stage and bind its symbol.
    ///
    /// With `symbol == None` a fresh symbol is allocated. A pre-allocated
    /// symbol must still be unbound and of the declaration's kind.
    pub fn create(
        &mut self,
        stages: &StageController,
        symbol: Option<SymbolId>,
        init: NewDeclaration,
    ) -> IrResult<SymbolId> {
        let kind = init.structure.symbol_kind();
        let facets_kind = init.facets.kind.symbol_kind();
        if kind != facets_kind {
            return Err(IrError::FacetKindMismatch {
                structure: kind,
                facets: facets_kind,
            });
        }

        let symbol = match symbol {
            Some(symbol) => symbol,
            None => self.symbols.allocate(kind),
        };
        let index = self.decls.next_index();
        let decl_id = DeclId::from_raw(index.to_raw() as u32);
        self.symbols.bind(symbol, decl_id, kind)?;

        let stage = stages.current();
        debug!(%symbol, name = %init.name, %kind, %stage, "created declaration");
        if let Some(body) = init.facets.body() {
            self.link_body(body, symbol);
        }
        self.decls.alloc(Declaration::new(symbol, init, stage));
        Ok(symbol)
    }

    pub fn resolve(&self, symbol: SymbolId) -> IrResult<DeclId> {
        self.symbols.resolve(symbol)
    }

    pub fn declaration(&self, symbol: SymbolId) -> IrResult<&Declaration> {
        let decl = self.resolve(symbol)?;
        self.decls
            .get(ArenaIndex::from_raw(decl.index()))
            .ok_or(IrError::UnknownDeclaration { symbol })
    }

    pub fn declaration_mut(&mut self, symbol: SymbolId) -> IrResult<&mut Declaration> {
        let decl = self.resolve(symbol)?;
        self.decls
            .get_mut(ArenaIndex::from_raw(decl.index()))
            .ok_or(IrError::UnknownDeclaration { symbol })
    }

    pub(crate) fn declaration_by_id(&self, decl: DeclId) -> Option<&Declaration> {
        self.decls.get(ArenaIndex::from_raw(decl.index()))
    }

    /// Read a facet of the declaration bound to `symbol` at the current stage.
    pub fn get<F: Facet>(
        &self,
        symbol: SymbolId,
        facet: F,
        stages: &StageController,
    ) -> IrResult<&F::Value> {
        self.declaration(symbol)?.get(facet, stages)
    }

    /// Write a facet of the declaration bound to `symbol` at the current stage.
    ///
    /// A written expression body is linked back to `symbol`.
    pub fn set<F: Facet>(
        &mut self,
        symbol: SymbolId,
        facet: F,
        stages: &StageController,
        value: F::Value,
    ) -> IrResult<WriteKind> {
        let body = F::body_of(&value);
        let outcome = self.declaration_mut(symbol)?.set(facet, stages, value)?;
        match body {
            Some(body) if outcome != WriteKind::Unchanged => self.link_body(body, symbol),
            _ => {}
        }
        Ok(outcome)
    }

    /// Declaration that an expression body was last assigned to.
    pub fn body_owner(&self, body: ExprId) -> Option<SymbolId> {
        self.body_owners.get(&body).copied()
    }

    fn link_body(&mut self, body: ExprId, owner: SymbolId) {
        trace!(%body, %owner, "linked expression body");
        self.body_owners.insert(body, owner);
    }

    /// Replace the backend metadata of a declaration. Metadata is not
    /// versioned: every stage observes the latest value.
    pub fn set_metadata(&mut self, symbol: SymbolId, metadata: Option<Metadata>) -> IrResult<()> {
        self.declaration_mut(symbol)?.set_metadata(metadata);
        Ok(())
    }

    /// Mark the declaration removed at the current stage.
    ///
    /// Removing an already removed declaration keeps the original stage.
    pub fn remove(&mut self, stages: &StageController, symbol: SymbolId) -> IrResult<()> {
        let stage = stages.current();
        let decl = self.declaration_mut(symbol)?;
        let was_removed = decl.is_removed();
        decl.mark_removed(stage)?;
        if !was_removed {
            self.removals.push((stage, symbol));
        }
        Ok(())
    }

    /// Symbols removed at or before `stage`, in removal order.
    pub fn removed_up_to(&self, stage: Stage) -> impl Iterator<Item = SymbolId> + '_ {
        self.removals
            .iter()
            .filter(move |(removed_on, _)| *removed_on <= stage)
            .map(|(_, symbol)| *symbol)
    }

    /// Every declaration ever created, removed ones included.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().map(|(_, decl)| decl)
    }

    /// Declarations live traversal at `stage` should visit.
    pub fn live_at(&self, stage: Stage) -> impl Iterator<Item = &Declaration> {
        self.declarations().filter(move |decl| decl.is_live_at(stage))
    }

    /// Live declarations whose facets changed at or after `stage`.
    pub fn modified_since(&self, stage: Stage) -> impl Iterator<Item = &Declaration> {
        self.declarations()
            .filter(move |decl| !decl.is_removed() && decl.last_modified() >= stage)
    }

    /// Raise the lowering high-water mark of every declaration live at `stage`.
    pub fn mark_lowered(&mut self, stage: Stage) {
        for decl in self.decls.iter_mut() {
            if decl.is_live_at(stage) {
                decl.mark_lowered(stage);
            }
        }
    }

    /// Drop history that no read at or after `floor` can observe.
    pub fn compact_before(&mut self, floor: Stage) -> usize {
        let dropped: usize = self
            .decls
            .iter_mut()
            .map(|decl| decl.compact_before(floor))
            .sum();
        if dropped > 0 {
            debug!(%floor, dropped, "compacted carrier history");
        }
        dropped
    }

    /// Read-only view of the whole store as of `stage`.
    pub fn view_at(&self, stage: Stage) -> StageView<'_> {
        StageView {
            factory: self,
            stage,
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// The store as seen by checkers and the backend at one fixed stage.
#[derive(Debug, Clone, Copy)]
pub struct StageView<'a> {
    factory: &'a IrFactory,
    stage: Stage,
}

impl<'a> StageView<'a> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn declaration(&self, symbol: SymbolId) -> IrResult<&'a Declaration> {
        self.factory.declaration(symbol)
    }

    pub fn get<F: Facet>(&self, symbol: SymbolId, facet: F) -> IrResult<&'a F::Value> {
        self.factory.declaration(symbol)?.get_at(facet, self.stage)
    }

    pub fn facets(&self, symbol: SymbolId) -> IrResult<&'a Facets> {
        Ok(self.factory.declaration(symbol)?.facets_at(self.stage))
    }

    pub fn is_live(&self, symbol: SymbolId) -> IrResult<bool> {
        Ok(self.factory.declaration(symbol)?.is_live_at(self.stage))
    }

    /// Declarations live at this stage, in creation order.
    pub fn live(&self) -> impl Iterator<Item = &'a Declaration> {
        self.factory.live_at(self.stage)
    }

    /// Members of a class that are still live at this stage.
    pub fn live_members(&self, class: SymbolId) -> IrResult<Vec<SymbolId>> {
        let mut live = Vec::new();
        for member in self.get(class, facet::Members)? {
            if self.is_live(*member)? {
                live.push(*member);
            }
        }
        Ok(live)
    }
}
