//! Explicit entries for inherited members a class does not override.

use std::collections::BTreeSet;

use tracing::debug;

use crate::deep_copy::DeepCopier;
use crate::error::{Result, ToolkitError};
use crate::ir::{DeclId, DeclKind, Declaration, Function, IrModule, Origin, SymbolMap, Visibility};
use crate::ir_render::render_type;
use crate::remap::TypeRemapper;
use crate::toolkit::copy_parameter_declarations_from;

/// Functions and property accessors declared directly in `class`.
fn functions_and_accessors(module: &IrModule, class: DeclId) -> Result<Vec<DeclId>> {
    let mut out = Vec::new();
    for &member in module.declarations_of(class)? {
        match &module.decl(member).kind {
            DeclKind::SimpleFunction(_) => out.push(member),
            DeclKind::Property(p) => {
                out.extend(p.getter);
                out.extend(p.setter);
            }
            _ => {}
        }
    }
    Ok(out)
}

/// Synthesizes one fake override per group of inherited, non-private,
/// not-yet-overridden functions of `class` and appends them to it.
///
/// A member counts as overridden when it appears in the overridden symbols
/// of a function or accessor of `class`, or of one of `implemented`.
/// Candidates are grouped by name followed by value-parameter count, so
/// overloads of equal arity share a single fake override.
pub fn add_fake_overrides(
    module: &mut IrModule,
    class: DeclId,
    implemented: &[DeclId],
) -> Result<Vec<DeclId>> {
    let mut overridden = BTreeSet::new();
    for member in functions_and_accessors(module, class)?
        .into_iter()
        .chain(implemented.iter().copied())
    {
        overridden.extend(module.function(member)?.overridden_symbols.iter().copied());
    }

    let mut seen = BTreeSet::new();
    let mut candidates = Vec::new();
    for super_type in module.class(class)?.super_types.clone() {
        let Some(super_class) = super_type.class_or_null() else {
            return Err(ToolkitError::UnsupportedSuperType {
                class,
                ty: render_type(module, &super_type),
            });
        };
        for member in functions_and_accessors(module, super_class)? {
            let function = module.function(member)?;
            if function.visibility == Visibility::Private || overridden.contains(&member) {
                continue;
            }
            if seen.insert(member) {
                candidates.push(member);
            }
        }
    }

    let mut groups: Vec<(String, Vec<DeclId>)> = Vec::new();
    for member in candidates {
        let function = module.function(member)?;
        let key = format!("{}{}", function.name, function.value_parameters.len());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(member),
            None => groups.push((key, vec![member])),
        }
    }

    let mut created = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let id = build_fake_override(module, class, &members)?;
        debug!(%class, fake = %id, group = %key, overridden = members.len(), "added fake override");
        created.push(id);
    }
    Ok(created)
}

fn build_fake_override(module: &mut IrModule, class: DeclId, group: &[DeclId]) -> Result<DeclId> {
    let first = group[0];
    let template = module.function(first)?.clone();
    let mut fake = Function::new(template.name.clone(), template.return_type.clone());
    fake.visibility = template.visibility;
    fake.modality = template.modality;
    fake.flags = template.flags;
    fake.flags.is_fake_override = true;
    fake.overridden_symbols = group.to_vec();

    let mut decl = Declaration::new(Origin::FakeOverride, DeclKind::SimpleFunction(fake));
    decl.parent = Some(class);
    let id = module.alloc(decl);

    copy_parameter_declarations_from(module, first, id)?;
    let remapper = TypeRemapper::new(first, id, Default::default());
    let annotations = DeepCopier::new(id, SymbolMap::new(), Some(&remapper))
        .copy_annotations(module, &template.annotations)?;
    let return_type = remapper.remap(module, &template.return_type)?;
    let fake = module.function_mut(id)?;
    fake.annotations = annotations;
    fake.return_type = return_type;

    module.mutation_permit().add_child(class, id)?;
    Ok(id)
}
