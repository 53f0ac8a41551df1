//! Structural invariant checks over the whole store.
//!
//! The pipeline driver runs [`verify`] between passes when configured to. A
//! non-empty result is a defect in whichever pass ran last.

use std::fmt;

use super::factory::IrFactory;
use super::ids::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantRule {
    /// Carrier stamped outside `created_on ..= removed_on`.
    CarrierOutsideLifetime,
    /// Carrier stamps do not strictly increase.
    CarriersOutOfOrder,
    /// Symbol table and declaration disagree about identity.
    BindingMismatch,
    /// Lowering mark below the creation stage.
    LoweringMarkBeforeCreation,
    /// Parent facet names a symbol with no declaration.
    DanglingParent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub symbol: SymbolId,
    pub rule: InvariantRule,
    pub detail: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.symbol, self.rule, self.detail)
    }
}

/// Check every declaration and binding; returns all violations found.
pub fn verify(factory: &IrFactory) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut report = |symbol: SymbolId, rule: InvariantRule, detail: String| {
        violations.push(InvariantViolation {
            symbol,
            rule,
            detail,
        });
    };

    for (symbol, decl_id) in factory.symbols().bound() {
        match factory.declaration_by_id(decl_id) {
            Some(decl) if decl.symbol() == symbol => {}
            Some(decl) => report(
                symbol,
                InvariantRule::BindingMismatch,
                format!("bound to {:?} which holds {}", decl_id, decl.symbol()),
            ),
            None => report(
                symbol,
                InvariantRule::BindingMismatch,
                format!("bound to missing slot {:?}", decl_id),
            ),
        }
    }

    for decl in factory.declarations() {
        let symbol = decl.symbol();
        let engine = decl.carrier_engine();

        if !engine.is_stage_ordered() {
            report(
                symbol,
                InvariantRule::CarriersOutOfOrder,
                "carrier stamps are not strictly increasing".to_string(),
            );
        }

        for carrier in engine.carriers() {
            if carrier.stage() < decl.created_on() || carrier.stage() > decl.removed_on() {
                report(
                    symbol,
                    InvariantRule::CarrierOutsideLifetime,
                    format!(
                        "carrier at stage {} outside {}..={}",
                        carrier.stage(),
                        decl.created_on(),
                        decl.removed_on()
                    ),
                );
            }
        }

        if decl.lowered_up_to() < decl.created_on() {
            report(
                symbol,
                InvariantRule::LoweringMarkBeforeCreation,
                format!(
                    "lowered up to {} but created on {}",
                    decl.lowered_up_to(),
                    decl.created_on()
                ),
            );
        }

        if !decl.is_removed() {
            if let Some(parent) = engine.latest().parent {
                if !factory.symbols().is_bound(parent) {
                    report(
                        symbol,
                        InvariantRule::DanglingParent,
                        format!("parent {} is not bound", parent),
                    );
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::decl::{ClassInfo, FieldFacets, FieldInfo, NewDeclaration};
    use crate::ir::stage::StageController;
    use crate::ir::symbols::SymbolKind;
    use crate::ir::types::IrType;

    #[test]
    fn well_formed_store_has_no_violations() {
        let mut stages = StageController::new();
        let mut factory = IrFactory::new();
        let class = factory
            .create(&stages, None, NewDeclaration::class("A", ClassInfo::default()))
            .unwrap();
        let field = factory
            .create(
                &stages,
                None,
                NewDeclaration::field("x", FieldInfo::default(), FieldFacets::new(IrType::Int))
                    .with_parent(class),
            )
            .unwrap();
        stages.advance();
        factory.remove(&stages, field).unwrap();

        assert!(verify(&factory).is_empty());
    }

    #[test]
    fn unbound_parent_is_reported() {
        let stages = StageController::new();
        let mut factory = IrFactory::new();
        let pending = factory.allocate_symbol(SymbolKind::Class);
        let field = factory
            .create(
                &stages,
                None,
                NewDeclaration::field("x", FieldInfo::default(), FieldFacets::new(IrType::Int))
                    .with_parent(pending),
            )
            .unwrap();

        let violations = verify(&factory);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].symbol, field);
        assert_eq!(violations[0].rule, InvariantRule::DanglingParent);
    }
}
