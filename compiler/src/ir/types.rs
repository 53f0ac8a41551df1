//! Values stored in declaration facets.
//!
//! Facet values are ordinary owned data compared with `PartialEq`. Anything
//! that refers to another declaration does so through a [`SymbolId`], and
//! expression bodies owned by other subsystems are referenced by [`ExprId`].

use std::fmt;

use super::ids::{ExprId, SymbolId};

/// Type of a value-carrying declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Unit,
    Bool,
    Int,
    Long,
    Double,
    String,
    Any,
    Nothing,
    /// Nominal type of the class bound to the symbol.
    Class(SymbolId),
    Nullable(Box<IrType>),
    Array(Box<IrType>),
}

impl IrType {
    pub fn nullable(inner: IrType) -> Self {
        match inner {
            IrType::Nullable(_) => inner,
            other => IrType::Nullable(Box::new(other)),
        }
    }

    pub fn array_of(element: IrType) -> Self {
        IrType::Array(Box::new(element))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, IrType::Nullable(_))
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Unit => f.write_str("Unit"),
            IrType::Bool => f.write_str("Boolean"),
            IrType::Int => f.write_str("Int"),
            IrType::Long => f.write_str("Long"),
            IrType::Double => f.write_str("Double"),
            IrType::String => f.write_str("String"),
            IrType::Any => f.write_str("Any"),
            IrType::Nothing => f.write_str("Nothing"),
            IrType::Class(symbol) => write!(f, "{}", symbol),
            IrType::Nullable(inner) => write!(f, "{}?", inner),
            IrType::Array(element) => write!(f, "Array<{}>", element),
        }
    }
}

/// Compile-time constant.
///
/// Doubles compare by bit pattern, so `-0.0` differs from `0.0` and a NaN
/// equals itself.
#[derive(Debug, Clone)]
pub enum IrConst {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl PartialEq for IrConst {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IrConst::Null, IrConst::Null) => true,
            (IrConst::Bool(a), IrConst::Bool(b)) => a == b,
            (IrConst::Int(a), IrConst::Int(b)) => a == b,
            (IrConst::Double(a), IrConst::Double(b)) => a.to_bits() == b.to_bits(),
            (IrConst::String(a), IrConst::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for IrConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrConst::Null => f.write_str("null"),
            IrConst::Bool(value) => write!(f, "{}", value),
            IrConst::Int(value) => write!(f, "{}", value),
            IrConst::Double(value) => write!(f, "{:?}", value),
            IrConst::String(value) => write!(f, "{:?}", value),
        }
    }
}

/// Initializer or default-value expression attached to a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum IrExpr {
    Const(IrConst),
    /// Read of the value held by another declaration.
    Get(SymbolId),
    /// Expression tree owned by the body store.
    Body(ExprId),
}

impl IrExpr {
    pub fn int(value: i64) -> Self {
        IrExpr::Const(IrConst::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        IrExpr::Const(IrConst::String(value.into()))
    }

    pub fn double(value: f64) -> Self {
        IrExpr::Const(IrConst::Double(value))
    }

    /// Body this expression hands ownership of, if any.
    pub fn body(&self) -> Option<ExprId> {
        match self {
            IrExpr::Body(expr) => Some(*expr),
            _ => None,
        }
    }
}

impl fmt::Display for IrExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrExpr::Const(value) => write!(f, "{}", value),
            IrExpr::Get(symbol) => write!(f, "get({})", symbol),
            IrExpr::Body(expr) => write!(f, "{}", expr),
        }
    }
}

/// Annotation use: the annotation class plus its constant arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub class: SymbolId,
    pub arguments: Vec<IrConst>,
}

impl Annotation {
    pub fn marker(class: SymbolId) -> Self {
        Self {
            class,
            arguments: Vec::new(),
        }
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Written in source.
    Defined,
    /// Inherited member materialised in a subclass.
    FakeOverride,
    /// Backing storage of a property.
    PropertyBackingField,
    /// Produced by the named lowering pass.
    Lowered(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Defined => f.write_str("DEFINED"),
            Origin::FakeOverride => f.write_str("FAKE_OVERRIDE"),
            Origin::PropertyBackingField => f.write_str("PROPERTY_BACKING_FIELD"),
            Origin::Lowered(pass) => write!(f, "LOWERED({})", pass),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
    Local,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
            Visibility::Local => "local",
        }
    }
}
