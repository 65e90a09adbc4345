use std::fmt::Write as _;

use crate::ir::{Classifier, DeclId, DeclKind, IrModule, IrType, TypeArgument, Variance};

pub fn render_type(module: &IrModule, ty: &IrType) -> String {
    let mut out = String::new();
    write_type(module, ty, &mut out);
    out
}

fn write_type(module: &IrModule, ty: &IrType, out: &mut String) {
    match ty {
        IrType::Dynamic => out.push_str("dynamic"),
        IrType::Error => out.push_str("<error>"),
        IrType::Simple(simple) => {
            let id = match simple.classifier {
                Classifier::Class(id) | Classifier::TypeParameter(id) => id,
            };
            out.push_str(module.name(id));
            if !simple.arguments.is_empty() {
                out.push('<');
                for (i, arg) in simple.arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match arg {
                        TypeArgument::Star => out.push('*'),
                        TypeArgument::Projection { variance, ty } => {
                            if *variance != Variance::Invariant {
                                out.push_str(variance.label());
                                out.push(' ');
                            }
                            write_type(module, ty, out);
                        }
                    }
                }
                out.push('>');
            }
            if simple.nullable {
                out.push('?');
            }
        }
    }
}

fn render_types(module: &IrModule, types: &[IrType]) -> String {
    types
        .iter()
        .map(|t| render_type(module, t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Indented one-line-per-declaration dump of `id` and everything nested in
/// it. Ids are left out so that structurally equal trees dump identically.
pub fn render_declaration(module: &IrModule, id: DeclId) -> String {
    let mut out = String::new();
    write_declaration(module, id, 0, &mut out);
    out
}

fn write_declaration(module: &IrModule, id: DeclId, depth: usize, out: &mut String) {
    let decl = module.decl(id);
    let indent = "  ".repeat(depth);
    let origin = decl.origin.as_str();
    let _ = match &decl.kind {
        DeclKind::File(f) => writeln!(out, "{indent}FILE name:{} package:{}", f.name, f.package),
        DeclKind::Class(c) => writeln!(
            out,
            "{indent}CLASS name:{} modality:{} visibility:{} superTypes:[{}] origin={origin}",
            c.name,
            c.modality.as_str(),
            c.visibility.as_str(),
            render_types(module, &c.super_types)
        ),
        DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => {
            let head = if module.is_constructor(id) {
                "CONSTRUCTOR"
            } else {
                "FUN"
            };
            let overridden = f
                .overridden_symbols
                .iter()
                .map(|s| {
                    let owner = module
                        .decl(*s)
                        .parent
                        .map(|p| module.name(p).to_string())
                        .unwrap_or_default();
                    format!("{owner}.{}", module.name(*s))
                })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                out,
                "{indent}{head} name:{} modality:{} visibility:{} returnType:{} overridden:[{overridden}] origin={origin}",
                f.name,
                f.modality.as_str(),
                f.visibility.as_str(),
                render_type(module, &f.return_type)
            )
        }
        DeclKind::Property(p) => writeln!(
            out,
            "{indent}PROPERTY name:{} type:{} var:{} origin={origin}",
            p.name,
            render_type(module, &p.ty),
            p.is_var
        ),
        DeclKind::ValueParameter(p) => writeln!(
            out,
            "{indent}VALUE_PARAMETER name:{} index:{} type:{}{} origin={origin}",
            p.name,
            p.index,
            render_type(module, &p.ty),
            if p.default_value.is_some() {
                " default"
            } else {
                ""
            }
        ),
        DeclKind::TypeParameter(p) => writeln!(
            out,
            "{indent}TYPE_PARAMETER name:{} index:{} variance:{} superTypes:[{}] origin={origin}",
            p.name,
            p.index,
            p.variance.label(),
            render_types(module, &p.super_types)
        ),
        DeclKind::Variable(v) => writeln!(
            out,
            "{indent}VAR name:{} type:{} origin={origin}",
            v.name,
            render_type(module, &v.ty)
        ),
    };
    for nested in module.nested_declarations(id) {
        write_declaration(module, nested, depth + 1, out);
    }
}
