//! Debug dumps of carrier history and stage views.
//!
//! Output is deterministic so it can back snapshot-style regression tests
//! and be pasted into defect reports.

use std::fmt::{self, Write};

use super::decl::{Declaration, Facets, KindFacets};
use super::factory::StageView;
use super::ids::SymbolId;

/// Render every carrier of one declaration, baseline first.
pub fn format_history(decl: &Declaration) -> String {
    let mut formatter = IrFormatter::new();
    formatter.write_history(decl).expect("string writer");
    formatter.finish()
}

/// Render every live declaration as seen by `view`.
pub fn format_view(view: &StageView<'_>) -> String {
    let mut formatter = IrFormatter::new();
    formatter.write_view(view).expect("string writer");
    formatter.finish()
}

#[derive(Debug, Default)]
pub struct IrFormatter {
    buffer: String,
}

impl IrFormatter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn write_history(&mut self, decl: &Declaration) -> fmt::Result {
        self.indent_line(
            0,
            &format!(
                "{} {} ({}) created {}, removed {}, modified {}, lowered {}",
                decl.kind(),
                decl.name(),
                decl.symbol(),
                decl.created_on(),
                decl.removed_on(),
                decl.last_modified(),
                decl.lowered_up_to()
            ),
        )?;
        for (idx, carrier) in decl.carriers().enumerate() {
            let label = if idx == 0 { " baseline" } else { "" };
            self.indent_line(
                1,
                &format!(
                    "@{}{}: {}",
                    carrier.stage(),
                    label,
                    facet_summary(carrier.values())
                ),
            )?;
        }
        Ok(())
    }

    pub fn write_view(&mut self, view: &StageView<'_>) -> fmt::Result {
        self.indent_line(0, &format!("view @{} {{", view.stage()))?;
        for decl in view.live() {
            self.indent_line(
                1,
                &format!(
                    "{} {} ({}): {}",
                    decl.kind(),
                    decl.name(),
                    decl.symbol(),
                    facet_summary(decl.facets_at(view.stage()))
                ),
            )?;
        }
        self.indent_line(0, "}")
    }

    /// Consume the formatter and return the accumulated string.
    pub fn finish(self) -> String {
        self.buffer
    }

    fn indent_line(&mut self, indent: usize, line: &str) -> fmt::Result {
        for _ in 0..indent {
            write!(self.buffer, "  ")?;
        }
        writeln!(self.buffer, "{}", line)
    }
}

fn facet_summary(facets: &Facets) -> String {
    let mut parts = vec![
        format!("parent={}", optional(facets.parent.as_ref())),
        format!("origin={}", facets.origin),
        format!("visibility={}", facets.visibility.as_str()),
    ];
    if !facets.annotations.is_empty() {
        let names: Vec<_> = facets
            .annotations
            .iter()
            .map(|annotation| format!("@{}", annotation.class))
            .collect();
        parts.push(format!("annotations=[{}]", names.join(", ")));
    }

    match &facets.kind {
        KindFacets::Class(class) => {
            let supers: Vec<_> = class.super_types.iter().map(ToString::to_string).collect();
            parts.push(format!("supers=[{}]", supers.join(", ")));
            parts.push(format!("members={}", symbol_list(&class.members)));
        }
        KindFacets::Function(function) => {
            parts.push(format!("returns={}", function.return_type));
            parts.push(format!("params={}", symbol_list(&function.parameters)));
            parts.push(format!("body={}", optional(function.body.as_ref())));
            if let Some(property) = function.corresponding_property {
                parts.push(format!("property={}", property));
            }
            if !function.overridden.is_empty() {
                parts.push(format!("overrides={}", symbol_list(&function.overridden)));
            }
        }
        KindFacets::Field(field) => {
            parts.push(format!("type={}", field.ty));
            parts.push(format!("initializer={}", optional(field.initializer.as_ref())));
            if let Some(property) = field.corresponding_property {
                parts.push(format!("property={}", property));
            }
        }
        KindFacets::Property(property) => {
            parts.push(format!("field={}", optional(property.backing_field.as_ref())));
            parts.push(format!("getter={}", optional(property.getter.as_ref())));
            parts.push(format!("setter={}", optional(property.setter.as_ref())));
        }
        KindFacets::Parameter(parameter) => {
            parts.push(format!("type={}", parameter.ty));
            parts.push(format!(
                "default={}",
                optional(parameter.default_value.as_ref())
            ));
        }
        KindFacets::TypeAlias(alias) => {
            parts.push(format!("expands={}", alias.expanded_type));
        }
    }

    parts.join(" ")
}

fn optional<T: fmt::Display>(value: Option<&T>) -> String {
    value
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

fn symbol_list(symbols: &[SymbolId]) -> String {
    let labels: Vec<_> = symbols.iter().map(ToString::to_string).collect();
    format!("[{}]", labels.join(", "))
}
