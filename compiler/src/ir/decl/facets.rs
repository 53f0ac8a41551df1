//! Mutable facet sets and the typed facet protocol.
//!
//! Everything a lowering pass may change about a declaration lives in
//! [`Facets`]; the carrier engine snapshots the whole struct. Individual
//! facets are addressed through zero-sized markers in [`facet`] implementing
//! [`Facet`], so reads and writes are uniform across kinds and statically
//! typed.

use std::fmt;

use crate::ir::ids::{ExprId, SymbolId};
use crate::ir::symbols::SymbolKind;
use crate::ir::types::{Annotation, IrExpr, IrType, Origin, Visibility};

/// Full set of mutable values of one declaration at one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Facets {
    /// Containing declaration. Structural only; the parent does not own us.
    pub parent: Option<SymbolId>,
    pub origin: Origin,
    pub visibility: Visibility,
    pub annotations: Vec<Annotation>,
    pub kind: KindFacets,
}

impl Facets {
    pub fn new(kind: KindFacets) -> Self {
        Self {
            parent: None,
            origin: Origin::Defined,
            visibility: Visibility::Public,
            annotations: Vec::new(),
            kind,
        }
    }

    /// Expression body held by these facets: a function body, a field
    /// initializer or a parameter default.
    pub fn body(&self) -> Option<ExprId> {
        match &self.kind {
            KindFacets::Function(function) => function.body,
            KindFacets::Field(field) => field.initializer.as_ref().and_then(IrExpr::body),
            KindFacets::Parameter(parameter) => {
                parameter.default_value.as_ref().and_then(IrExpr::body)
            }
            _ => None,
        }
    }
}

/// Kind-specific facet payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum KindFacets {
    Class(ClassFacets),
    Function(FunctionFacets),
    Field(FieldFacets),
    Property(PropertyFacets),
    Parameter(ParameterFacets),
    TypeAlias(TypeAliasFacets),
}

impl KindFacets {
    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            KindFacets::Class(_) => SymbolKind::Class,
            KindFacets::Function(_) => SymbolKind::Function,
            KindFacets::Field(_) => SymbolKind::Field,
            KindFacets::Property(_) => SymbolKind::Property,
            KindFacets::Parameter(_) => SymbolKind::Parameter,
            KindFacets::TypeAlias(_) => SymbolKind::TypeAlias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassFacets {
    pub super_types: Vec<IrType>,
    /// Member declarations in source order.
    pub members: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionFacets {
    pub return_type: IrType,
    pub parameters: Vec<SymbolId>,
    pub body: Option<ExprId>,
    /// Property this function is an accessor of.
    pub corresponding_property: Option<SymbolId>,
    pub overridden: Vec<SymbolId>,
}

impl FunctionFacets {
    pub fn new(return_type: IrType) -> Self {
        Self {
            return_type,
            parameters: Vec::new(),
            body: None,
            corresponding_property: None,
            overridden: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFacets {
    pub ty: IrType,
    pub initializer: Option<IrExpr>,
    /// Property this field backs.
    pub corresponding_property: Option<SymbolId>,
}

impl FieldFacets {
    pub fn new(ty: IrType) -> Self {
        Self {
            ty,
            initializer: None,
            corresponding_property: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFacets {
    pub backing_field: Option<SymbolId>,
    pub getter: Option<SymbolId>,
    pub setter: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterFacets {
    pub ty: IrType,
    pub default_value: Option<IrExpr>,
}

impl ParameterFacets {
    pub fn new(ty: IrType) -> Self {
        Self {
            ty,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasFacets {
    pub expanded_type: IrType,
}

/// One addressable mutable attribute.
///
/// `read` and `write` return `None` when the declaration kind has no such
/// facet.
pub trait Facet: Copy {
    type Value: Clone + PartialEq + fmt::Debug;

    /// Name used in defect reports and dumps.
    const NAME: &'static str;

    fn read(facets: &Facets) -> Option<&Self::Value>;

    fn write(facets: &mut Facets) -> Option<&mut Self::Value>;

    /// Expression body a value of this facet hands to its declaration.
    fn body_of(_value: &Self::Value) -> Option<ExprId> {
        None
    }
}

macro_rules! common_facet {
    ($(#[$meta:meta])* $marker:ident, $name:literal, $value:ty, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $marker;

        impl Facet for $marker {
            type Value = $value;
            const NAME: &'static str = $name;

            fn read(facets: &Facets) -> Option<&$value> {
                Some(&facets.$field)
            }

            fn write(facets: &mut Facets) -> Option<&mut $value> {
                Some(&mut facets.$field)
            }
        }
    };
}

macro_rules! kind_facet {
    (
        $(#[$meta:meta])* $marker:ident, $name:literal, $value:ty,
        [$($variant:ident . $field:ident),+ $(,)?]
        $(, body_of = $body_of:path)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $marker;

        impl Facet for $marker {
            type Value = $value;
            const NAME: &'static str = $name;

            fn read(facets: &Facets) -> Option<&$value> {
                match &facets.kind {
                    $(KindFacets::$variant(inner) => Some(&inner.$field),)+
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }

            fn write(facets: &mut Facets) -> Option<&mut $value> {
                match &mut facets.kind {
                    $(KindFacets::$variant(inner) => Some(&mut inner.$field),)+
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }

            $(
                fn body_of(value: &$value) -> Option<ExprId> {
                    $body_of(value)
                }
            )?
        }
    };
}

/// Facet markers, one per mutable attribute.
pub mod facet {
    use super::{Facet, Facets, KindFacets};
    use crate::ir::ids::{ExprId, SymbolId};
    use crate::ir::types;

    common_facet!(Parent, "parent", Option<SymbolId>, parent);
    common_facet!(Origin, "origin", types::Origin, origin);
    common_facet!(Visibility, "visibility", types::Visibility, visibility);
    common_facet!(Annotations, "annotations", Vec<types::Annotation>, annotations);

    kind_facet!(
        /// Value type of a field or parameter.
        Type,
        "type",
        types::IrType,
        [Field.ty, Parameter.ty]
    );
    kind_facet!(ReturnType, "return_type", types::IrType, [Function.return_type]);
    kind_facet!(
        Initializer,
        "initializer",
        Option<types::IrExpr>,
        [Field.initializer],
        body_of = expr_body
    );
    kind_facet!(
        DefaultValue,
        "default_value",
        Option<types::IrExpr>,
        [Parameter.default_value],
        body_of = expr_body
    );
    kind_facet!(Body, "body", Option<ExprId>, [Function.body], body_of = body_id);
    kind_facet!(Parameters, "parameters", Vec<SymbolId>, [Function.parameters]);
    kind_facet!(Overridden, "overridden", Vec<SymbolId>, [Function.overridden]);
    kind_facet!(
        /// Property a field backs or a function is an accessor of.
        CorrespondingProperty,
        "corresponding_property",
        Option<SymbolId>,
        [Field.corresponding_property, Function.corresponding_property]
    );
    kind_facet!(SuperTypes, "super_types", Vec<types::IrType>, [Class.super_types]);
    kind_facet!(Members, "members", Vec<SymbolId>, [Class.members]);
    kind_facet!(BackingField, "backing_field", Option<SymbolId>, [Property.backing_field]);
    kind_facet!(Getter, "getter", Option<SymbolId>, [Property.getter]);
    kind_facet!(Setter, "setter", Option<SymbolId>, [Property.setter]);
    kind_facet!(ExpandedType, "expanded_type", types::IrType, [TypeAlias.expanded_type]);

    fn expr_body(value: &Option<types::IrExpr>) -> Option<ExprId> {
        value.as_ref().and_then(types::IrExpr::body)
    }

    fn body_id(value: &Option<ExprId>) -> Option<ExprId> {
        *value
    }
}
