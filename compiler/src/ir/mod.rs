//! Stage-versioned IR declaration store.
//!
//! Lowering passes mutate declaration facets through this module while every
//! earlier stage's view of a node stays reconstructible. The store is split
//! into the stage controller, the symbol table, the generic carrier engine,
//! declaration nodes, and the factory that owns them all.

pub mod arena;
pub mod carrier;
pub mod decl;
pub mod display;
pub mod error;
pub mod factory;
pub mod ids;
pub mod stage;
pub mod symbols;
pub mod types;
pub mod verify;

pub use arena::{Arena, ArenaIndex};
pub use carrier::{Carrier, CarrierEngine, WriteKind};
pub use decl::{
    facet, ClassFacets, ClassInfo, ClassKind, DeclKind, Declaration, Facet, Facets, FieldFacets,
    FieldInfo, FunctionFacets, FunctionInfo, KindFacets, Metadata, NewDeclaration, ParameterFacets,
    ParameterInfo, PropertyFacets, PropertyInfo, TypeAliasFacets, TypeAliasInfo,
};
pub use display::{format_history, format_view, IrFormatter};
pub use error::{IrError, IrResult};
pub use factory::{IrFactory, StageView};
pub use ids::{DeclId, ExprId, SymbolId};
pub use stage::{Stage, StageController};
pub use symbols::{SymbolKind, SymbolTable};
pub use types::{Annotation, IrConst, IrExpr, IrType, Origin, Visibility};
pub use verify::{verify, InvariantRule, InvariantViolation};
