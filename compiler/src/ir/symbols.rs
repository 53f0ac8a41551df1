//! Symbol table: stable indirect handles for declarations.
//!
//! Declarations never point at each other directly. A class lists its members
//! by symbol, a member names its parent by symbol, and the table resolves a
//! symbol to the arena slot of the one declaration bound to it. That keeps
//! ownership acyclic (the factory owns every node) while references may form
//! cycles freely.

use std::fmt;

use super::error::{IrError, IrResult};
use super::ids::{DeclId, SymbolId};

/// Classification of a symbol and of the declaration it may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Function,
    Field,
    Property,
    Parameter,
    TypeAlias,
}

impl SymbolKind {
    /// Human-readable description used in defect reports.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Parameter => "parameter",
            SymbolKind::TypeAlias => "type alias",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct SymbolSlot {
    kind: SymbolKind,
    owner: Option<DeclId>,
}

/// Central registry of every symbol allocated during a compilation.
#[derive(Debug, Default)]
pub struct SymbolTable {
    slots: Vec<SymbolSlot>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocate a fresh, unbound symbol.
    pub fn allocate(&mut self, kind: SymbolKind) -> SymbolId {
        let id = SymbolId::from_raw(self.slots.len() as u32);
        self.slots.push(SymbolSlot { kind, owner: None });
        id
    }

    /// Bind `symbol` to `decl`. Binding happens once per symbol, ever.
    pub fn bind(&mut self, symbol: SymbolId, decl: DeclId, kind: SymbolKind) -> IrResult<()> {
        let slot = self
            .slots
            .get_mut(symbol.index())
            .ok_or(IrError::UnboundSymbol { symbol })?;
        if slot.owner.is_some() {
            return Err(IrError::IllegalBinding { symbol });
        }
        if slot.kind != kind {
            return Err(IrError::SymbolKindMismatch {
                symbol,
                kind: slot.kind,
                found: kind,
            });
        }
        slot.owner = Some(decl);
        Ok(())
    }

    /// Look up the declaration bound to `symbol`.
    pub fn resolve(&self, symbol: SymbolId) -> IrResult<DeclId> {
        self.slots
            .get(symbol.index())
            .and_then(|slot| slot.owner)
            .ok_or(IrError::UnboundSymbol { symbol })
    }

    pub fn is_bound(&self, symbol: SymbolId) -> bool {
        self.resolve(symbol).is_ok()
    }

    /// Kind the symbol was allocated for, if it exists.
    pub fn kind(&self, symbol: SymbolId) -> Option<SymbolKind> {
        self.slots.get(symbol.index()).map(|slot| slot.kind)
    }

    /// Iterate over bound symbols in allocation order.
    pub fn bound(&self) -> impl Iterator<Item = (SymbolId, DeclId)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.owner
                .map(|decl| (SymbolId::from_raw(idx as u32), decl))
        })
    }

    /// Number of allocated symbols, bound or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
