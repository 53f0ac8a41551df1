//! Declaration nodes.
//!
//! A [`Declaration`] is identity (its symbol), structural attributes fixed at
//! construction, four stage markers, and one [`CarrierEngine`] holding every
//! mutable facet. Kinds are a tagged variant ([`DeclKind`]) rather than a type
//! hierarchy, so every kind shares the same versioning rules.

pub mod facets;

pub use facets::{
    facet, ClassFacets, Facet, Facets, FieldFacets, FunctionFacets, KindFacets, ParameterFacets,
    PropertyFacets, TypeAliasFacets,
};

use std::collections::BTreeMap;

use flux_core::diag::Span;
use tracing::{debug, trace};

use super::carrier::{Carrier, CarrierEngine, WriteError, WriteKind};
use super::error::{IrError, IrResult};
use super::ids::SymbolId;
use super::stage::{Stage, StageController};
use super::symbols::SymbolKind;
use super::types::{Annotation, IrType, Origin, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Object,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassInfo {
    pub class_kind: ClassKind,
    pub is_data: bool,
    pub is_inner: bool,
    pub is_external: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionInfo {
    pub is_constructor: bool,
    pub is_inline: bool,
    pub is_external: bool,
    pub is_suspend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldInfo {
    pub is_final: bool,
    pub is_external: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyInfo {
    pub is_var: bool,
    pub is_const: bool,
    pub is_lateinit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterInfo {
    /// Position in the owning function's parameter list.
    pub index: u32,
    pub is_vararg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeAliasInfo {
    pub is_actual: bool,
}

/// Backend-facing description of a declaration, attached outside the
/// carrier history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    /// Name the backend emits the declaration under.
    pub source_name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Immutable, kind-specific structure of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class(ClassInfo),
    Function(FunctionInfo),
    Field(FieldInfo),
    Property(PropertyInfo),
    Parameter(ParameterInfo),
    TypeAlias(TypeAliasInfo),
}

impl DeclKind {
    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            DeclKind::Class(_) => SymbolKind::Class,
            DeclKind::Function(_) => SymbolKind::Function,
            DeclKind::Field(_) => SymbolKind::Field,
            DeclKind::Property(_) => SymbolKind::Property,
            DeclKind::Parameter(_) => SymbolKind::Parameter,
            DeclKind::TypeAlias(_) => SymbolKind::TypeAlias,
        }
    }
}

/// Everything the front end supplies to construct a declaration: structural
/// attributes plus the zeroth facet values.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeclaration {
    pub name: String,
    pub span: Option<Span>,
    pub structure: DeclKind,
    pub facets: Facets,
}

impl NewDeclaration {
    fn new(name: impl Into<String>, structure: DeclKind, kind: KindFacets) -> Self {
        Self {
            name: name.into(),
            span: None,
            structure,
            facets: Facets::new(kind),
        }
    }

    pub fn class(name: impl Into<String>, info: ClassInfo) -> Self {
        Self::new(
            name,
            DeclKind::Class(info),
            KindFacets::Class(ClassFacets::default()),
        )
    }

    pub fn function(name: impl Into<String>, info: FunctionInfo, facets: FunctionFacets) -> Self {
        Self::new(name, DeclKind::Function(info), KindFacets::Function(facets))
    }

    pub fn field(name: impl Into<String>, info: FieldInfo, facets: FieldFacets) -> Self {
        Self::new(name, DeclKind::Field(info), KindFacets::Field(facets))
    }

    pub fn property(name: impl Into<String>, info: PropertyInfo) -> Self {
        Self::new(
            name,
            DeclKind::Property(info),
            KindFacets::Property(PropertyFacets::default()),
        )
    }

    pub fn parameter(name: impl Into<String>, info: ParameterInfo, ty: IrType) -> Self {
        Self::new(
            name,
            DeclKind::Parameter(info),
            KindFacets::Parameter(ParameterFacets::new(ty)),
        )
    }

    pub fn type_alias(name: impl Into<String>, info: TypeAliasInfo, expanded: IrType) -> Self {
        Self::new(
            name,
            DeclKind::TypeAlias(info),
            KindFacets::TypeAlias(TypeAliasFacets {
                expanded_type: expanded,
            }),
        )
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_parent(mut self, parent: SymbolId) -> Self {
        self.facets.parent = Some(parent);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.facets.origin = origin;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.facets.visibility = visibility;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.facets.annotations = annotations;
        self
    }
}

/// An IR declaration with stage-versioned facets.
#[derive(Debug)]
pub struct Declaration {
    symbol: SymbolId,
    name: String,
    span: Option<Span>,
    structure: DeclKind,
    created_on: Stage,
    removed_on: Stage,
    lowered_up_to: Stage,
    facets: CarrierEngine<Facets>,
    metadata: Option<Metadata>,
}

impl Declaration {
    pub(crate) fn new(symbol: SymbolId, init: NewDeclaration, stage: Stage) -> Self {
        Self {
            symbol,
            name: init.name,
            span: init.span,
            structure: init.structure,
            created_on: stage,
            removed_on: Stage::NEVER,
            lowered_up_to: stage,
            facets: CarrierEngine::new(init.facets, stage),
            metadata: None,
        }
    }

    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn structure(&self) -> &DeclKind {
        &self.structure
    }

    pub fn kind(&self) -> SymbolKind {
        self.structure.symbol_kind()
    }

    pub fn created_on(&self) -> Stage {
        self.created_on
    }

    /// Removal stage, or [`Stage::NEVER`].
    pub fn removed_on(&self) -> Stage {
        self.removed_on
    }

    pub fn last_modified(&self) -> Stage {
        self.facets.last_modified()
    }

    pub fn lowered_up_to(&self) -> Stage {
        self.lowered_up_to
    }

    pub fn is_removed(&self) -> bool {
        !self.removed_on.is_never()
    }

    /// Whether live traversal at `stage` should see this declaration.
    ///
    /// A declaration leaves live traversal at its removal stage; reads at
    /// any stage keep working.
    pub fn is_live_at(&self, stage: Stage) -> bool {
        self.created_on <= stage && stage < self.removed_on
    }

    /// Number of carriers appended after construction.
    pub fn history_len(&self) -> usize {
        self.facets.history().len()
    }

    /// Baseline followed by every appended carrier.
    pub fn carriers(&self) -> impl Iterator<Item = &Carrier<Facets>> {
        self.facets.carriers()
    }

    /// All facet values visible at `stage`.
    pub fn facets_at(&self, stage: Stage) -> &Facets {
        if stage > self.removed_on {
            trace!(symbol = %self.symbol, %stage, "forensic read of removed declaration");
        }
        self.facets.resolve(stage)
    }

    /// Read a facet at the controller's current stage.
    pub fn get<F: Facet>(&self, facet: F, stages: &StageController) -> IrResult<&F::Value> {
        self.get_at(facet, stages.current())
    }

    /// Read a facet as it was at `stage`.
    pub fn get_at<F: Facet>(&self, _facet: F, stage: Stage) -> IrResult<&F::Value> {
        F::read(self.facets_at(stage)).ok_or(IrError::FacetNotApplicable {
            symbol: self.symbol,
            facet: F::NAME,
            kind: self.kind(),
        })
    }

    pub fn parent_at(&self, stage: Stage) -> Option<SymbolId> {
        self.facets_at(stage).parent
    }

    pub fn annotations_at(&self, stage: Stage) -> &[Annotation] {
        &self.facets_at(stage).annotations
    }

    /// Write a facet at the controller's current stage.
    pub fn set<F: Facet>(
        &mut self,
        _facet: F,
        stages: &StageController,
        value: F::Value,
    ) -> IrResult<WriteKind> {
        let stage = stages.current();
        if stage > self.removed_on {
            return Err(IrError::MutationAfterRemoval {
                symbol: self.symbol,
                stage,
                removed_on: self.removed_on,
            });
        }

        let outcome = self
            .facets
            .set(stage, F::read, F::write, value)
            .map_err(|err| match err {
                WriteError::Stale { last_modified } => IrError::StaleMutation {
                    symbol: self.symbol,
                    stage,
                    last_modified,
                },
                WriteError::Missing => IrError::FacetNotApplicable {
                    symbol: self.symbol,
                    facet: F::NAME,
                    kind: self.structure.symbol_kind(),
                },
            })?;

        match outcome {
            WriteKind::Appended => debug!(
                symbol = %self.symbol,
                facet = F::NAME,
                %stage,
                history = self.facets.history().len(),
                "appended carrier"
            ),
            WriteKind::Coalesced => {
                trace!(symbol = %self.symbol, facet = F::NAME, %stage, "coalesced write")
            }
            WriteKind::Unchanged => {}
        }
        Ok(outcome)
    }

    pub(crate) fn mark_removed(&mut self, stage: Stage) -> IrResult<()> {
        let last_modified = self.last_modified();
        if stage < last_modified {
            return Err(IrError::StaleMutation {
                symbol: self.symbol,
                stage,
                last_modified,
            });
        }
        if self.is_removed() {
            return Ok(());
        }
        self.removed_on = stage;
        debug!(symbol = %self.symbol, name = %self.name, %stage, "removed declaration");
        Ok(())
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn set_metadata(&mut self, metadata: Option<Metadata>) {
        self.metadata = metadata;
    }

    /// Whether passes up to `stage` still have to visit this declaration.
    pub fn needs_lowering(&self, stage: Stage) -> bool {
        self.lowered_up_to < stage
    }

    /// Raise the lowering high-water mark. Never moves backwards.
    pub fn mark_lowered(&mut self, stage: Stage) {
        if stage > self.lowered_up_to {
            self.lowered_up_to = stage;
        }
    }

    pub(crate) fn compact_before(&mut self, floor: Stage) -> usize {
        self.facets.compact_before(floor)
    }

    pub(crate) fn carrier_engine(&self) -> &CarrierEngine<Facets> {
        &self.facets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::IrExpr;

    fn field_at(stage: Stage) -> Declaration {
        Declaration::new(
            SymbolId::from_raw(0),
            NewDeclaration::field("x", FieldInfo::default(), FieldFacets::new(IrType::Int)),
            stage,
        )
    }

    #[test]
    fn construction_stamps_every_marker() {
        let decl = field_at(Stage::new(2));
        assert_eq!(decl.created_on(), Stage::new(2));
        assert_eq!(decl.last_modified(), Stage::new(2));
        assert_eq!(decl.lowered_up_to(), Stage::new(2));
        assert_eq!(decl.removed_on(), Stage::NEVER);
        assert_eq!(decl.history_len(), 0);
    }

    #[test]
    fn wrong_kind_facet_is_rejected() {
        let mut decl = field_at(Stage::new(0));
        let stages = StageController::starting_at(Stage::new(1));
        let err = decl
            .set(facet::Members, &stages, vec![SymbolId::from_raw(1)])
            .unwrap_err();
        assert_eq!(
            err,
            IrError::FacetNotApplicable {
                symbol: SymbolId::from_raw(0),
                facet: "members",
                kind: SymbolKind::Field,
            }
        );
        assert_eq!(decl.history_len(), 0);
    }

    #[test]
    fn removed_declaration_rejects_later_writes_but_serves_reads() {
        let mut decl = field_at(Stage::new(0));
        let mut stages = StageController::new();
        stages.advance();
        decl.set(facet::Initializer, &stages, Some(IrExpr::int(1)))
            .unwrap();
        decl.mark_removed(stages.current()).unwrap();
        stages.advance();

        let err = decl
            .set(facet::Initializer, &stages, Some(IrExpr::int(2)))
            .unwrap_err();
        assert!(matches!(err, IrError::MutationAfterRemoval { .. }));
        assert_eq!(
            decl.get(facet::Initializer, &stages).unwrap(),
            &Some(IrExpr::int(1))
        );
        assert!(!decl.is_live_at(stages.current()));
    }

    #[test]
    fn builder_attributes_and_versioned_parent() {
        let class = SymbolId::from_raw(5);
        let moved_to = SymbolId::from_raw(6);
        let marker = Annotation::marker(SymbolId::from_raw(7));
        let init = NewDeclaration::field("x", FieldInfo::default(), FieldFacets::new(IrType::Int))
            .with_span(Span::new(4, 9))
            .with_parent(class)
            .with_visibility(Visibility::Private)
            .with_annotations(vec![marker.clone()]);
        let mut decl = Declaration::new(SymbolId::from_raw(0), init, Stage::new(0));

        let stages = StageController::starting_at(Stage::new(2));
        decl.set(facet::Parent, &stages, Some(moved_to)).unwrap();
        decl.set(facet::Annotations, &stages, Vec::new()).unwrap();

        assert_eq!(decl.span(), Some(&Span::new(4, 9)));
        assert_eq!(
            decl.get_at(facet::Visibility, Stage::new(2)).unwrap(),
            &Visibility::Private
        );
        assert_eq!(decl.parent_at(Stage::new(1)), Some(class));
        assert_eq!(decl.parent_at(Stage::new(2)), Some(moved_to));
        assert_eq!(decl.annotations_at(Stage::new(0)), &[marker][..]);
        assert!(decl.annotations_at(Stage::new(3)).is_empty());
        assert_eq!(decl.history_len(), 1);
    }

    #[test]
    fn metadata_is_not_versioned() {
        let mut decl = field_at(Stage::new(0));
        decl.set_metadata(Some(Metadata::new("x$field").with_attribute("jvm", "static")));

        assert_eq!(decl.history_len(), 0);
        let metadata = decl.metadata().unwrap();
        assert_eq!(metadata.source_name, "x$field");
        assert_eq!(metadata.attributes.get("jvm").map(String::as_str), Some("static"));
    }

    #[test]
    fn lowering_mark_never_regresses() {
        let mut decl = field_at(Stage::new(0));
        decl.mark_lowered(Stage::new(4));
        decl.mark_lowered(Stage::new(2));
        assert_eq!(decl.lowered_up_to(), Stage::new(4));
        assert!(!decl.needs_lowering(Stage::new(4)));
        assert!(decl.needs_lowering(Stage::new(5)));
    }
}
