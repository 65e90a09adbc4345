//! Moving types between type-parameter containers.

use std::collections::BTreeMap;

use crate::error::{Result, ToolkitError};
use crate::ir::{
    Classifier, DeclId, IrModule, IrType, SimpleType, TypeArgument, TypeParameterMap,
};

/// Rewrites every type-parameter reference in `ty` for use inside `target`.
///
/// Resolution order per reference: the explicit `map`, then the parameter at
/// the same index in `target` when the reference belongs to `source`, then
/// the reference unchanged (it belongs to an enclosing or unrelated scope).
/// Class types recurse into their arguments; other shapes pass through.
pub fn remap_type_parameters(
    module: &IrModule,
    ty: &IrType,
    source: DeclId,
    target: DeclId,
    map: Option<&TypeParameterMap>,
) -> Result<IrType> {
    let IrType::Simple(simple) = ty else {
        return Ok(ty.clone());
    };
    match simple.classifier {
        Classifier::TypeParameter(param) => {
            let mapped = match map.and_then(|m| m.get(&param)) {
                Some(mapped) => *mapped,
                None => positional_counterpart(module, param, source, target)?.unwrap_or(param),
            };
            Ok(IrType::Simple(SimpleType {
                classifier: Classifier::TypeParameter(mapped),
                nullable: simple.nullable,
                arguments: simple.arguments.clone(),
                annotations: simple.annotations.clone(),
            }))
        }
        Classifier::Class(_) => {
            let arguments = simple
                .arguments
                .iter()
                .map(|arg| match arg {
                    TypeArgument::Star => Ok(TypeArgument::Star),
                    TypeArgument::Projection { variance, ty } => Ok(TypeArgument::Projection {
                        variance: *variance,
                        ty: remap_type_parameters(module, ty, source, target, map)?,
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(IrType::Simple(SimpleType {
                classifier: simple.classifier,
                nullable: simple.nullable,
                arguments,
                annotations: simple.annotations.clone(),
            }))
        }
    }
}

fn positional_counterpart(
    module: &IrModule,
    param: DeclId,
    source: DeclId,
    target: DeclId,
) -> Result<Option<DeclId>> {
    if module.decl(param).parent != Some(source) {
        return Ok(None);
    }
    let index = module.type_parameter(param)?.index;
    module
        .type_parameters_of(target)?
        .get(index)
        .copied()
        .map(Some)
        .ok_or(ToolkitError::MissingTypeParameter {
            container: target,
            index,
        })
}

/// Replaces type parameters with concrete types. Nullability of the
/// replaced reference is kept: `T?` with `T := Int` becomes `Int?`.
pub fn substitute_type(ty: &IrType, substitution: &BTreeMap<DeclId, IrType>) -> IrType {
    let IrType::Simple(simple) = ty else {
        return ty.clone();
    };
    if let Classifier::TypeParameter(param) = simple.classifier {
        if let Some(replacement) = substitution.get(&param) {
            return if simple.nullable {
                replacement.clone().with_nullability(true)
            } else {
                replacement.clone()
            };
        }
    }
    IrType::Simple(SimpleType {
        classifier: simple.classifier,
        nullable: simple.nullable,
        arguments: simple
            .arguments
            .iter()
            .map(|arg| match arg {
                TypeArgument::Star => TypeArgument::Star,
                TypeArgument::Projection { variance, ty } => TypeArgument::Projection {
                    variance: *variance,
                    ty: substitute_type(ty, substitution),
                },
            })
            .collect(),
        annotations: simple.annotations.clone(),
    })
}

/// A remapping bound to one source/target pair, applied to many types.
#[derive(Debug, Clone)]
pub struct TypeRemapper {
    pub source: DeclId,
    pub target: DeclId,
    pub map: TypeParameterMap,
}

impl TypeRemapper {
    pub fn new(source: DeclId, target: DeclId, map: TypeParameterMap) -> Self {
        Self {
            source,
            target,
            map,
        }
    }

    pub fn remap(&self, module: &IrModule, ty: &IrType) -> Result<IrType> {
        remap_type_parameters(module, ty, self.source, self.target, Some(&self.map))
    }
}
