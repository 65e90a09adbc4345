//! Copying parameters and type parameters between declarations, and the
//! synthesized members built on top of that (receivers, constructors).
//!
//! Every copy is non-destructive: the source declaration and its default
//! values are left exactly as they were.

use std::collections::BTreeMap;

use tracing::debug;

use crate::deep_copy::DeepCopier;
use crate::error::{Result, ToolkitError};
use crate::ir::{
    DeclId, DeclKind, Declaration, Function, IrExpr, IrModule, IrStatement, IrType, Origin,
    SymbolMap, TypeArgument, TypeParameter, TypeParameterMap, ValueParameter,
    RECEIVER_PARAMETER_INDEX,
};
use crate::ir_render::render_type;
use crate::remap::{remap_type_parameters, substitute_type, TypeRemapper};
use crate::subtyping::{is_subtype_of, is_subtype_of_class};

pub const STATIC_DISPATCH_RECEIVER_NAME: &str = "$this";
pub const STATIC_EXTENSION_RECEIVER_NAME: &str = "$receiver";
pub const THIS_RECEIVER_NAME: &str = "<this>";
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DefaultValue {
    /// Deep-copy the source parameter's default value.
    #[default]
    Copy,
    Drop,
    /// Deep-copy this expression instead.
    Replace(IrExpr),
}

/// Overrides for [`copy_value_parameter`]. Unset fields are taken from the
/// source parameter; the type is remapped unless `ty` is given.
#[derive(Debug, Clone, Default)]
pub struct CopyParameterOptions {
    pub origin: Option<Origin>,
    pub index: Option<i32>,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub name: Option<String>,
    pub ty: Option<IrType>,
    pub vararg_element_type: Option<IrType>,
    pub default_value: DefaultValue,
    pub is_crossinline: Option<bool>,
    pub is_noinline: Option<bool>,
    /// Redirects references inside the default value, e.g. to parameters
    /// already copied to the target.
    pub symbol_map: SymbolMap,
}

/// Copies `param` into a new parameter whose parent is `target`. The caller
/// decides which slot of `target` the copy occupies.
pub fn copy_value_parameter(
    module: &mut IrModule,
    param: DeclId,
    target: DeclId,
    options: CopyParameterOptions,
    type_map: Option<&TypeParameterMap>,
) -> Result<DeclId> {
    let source_function = module.parent(param)?;
    let old = module.value_parameter(param)?.clone();
    let (old_origin, old_start, old_end) = {
        let decl = module.decl(param);
        (decl.origin, decl.start_offset, decl.end_offset)
    };

    let remapper = TypeRemapper::new(
        module.class_if_constructor(source_function)?,
        module.class_if_constructor(target)?,
        type_map.cloned().unwrap_or_default(),
    );
    let ty = match options.ty {
        Some(ty) => ty,
        None => remapper.remap(module, &old.ty)?,
    };
    let vararg_element_type = match options.vararg_element_type {
        Some(ty) => Some(ty),
        None => old
            .vararg_element_type
            .as_ref()
            .map(|t| remapper.remap(module, t))
            .transpose()?,
    };

    let default_source = match options.default_value {
        DefaultValue::Copy => old.default_value.clone(),
        DefaultValue::Drop => None,
        DefaultValue::Replace(expr) => Some(expr),
    };
    let mut copier = DeepCopier::new(target, options.symbol_map, Some(&remapper));
    let default_value = default_source
        .map(|expr| copier.copy_expr(module, &expr))
        .transpose()?;
    let annotations = copier.copy_annotations(module, &old.annotations)?;

    let copy = ValueParameter {
        name: options.name.unwrap_or(old.name),
        index: options.index.unwrap_or(old.index),
        ty,
        vararg_element_type,
        default_value,
        is_crossinline: options.is_crossinline.unwrap_or(old.is_crossinline),
        is_noinline: options.is_noinline.unwrap_or(old.is_noinline),
        annotations,
    };
    let mut decl = Declaration::new(
        options.origin.unwrap_or(old_origin),
        DeclKind::ValueParameter(copy),
    )
    .with_offsets(
        options.start_offset.unwrap_or(old_start),
        options.end_offset.unwrap_or(old_end),
    );
    decl.parent = Some(target);
    let id = module.alloc(decl);
    debug!(source = %param, copy = %id, %target, "copied value parameter");
    Ok(id)
}

fn copy_type_parameter_without_super_types(
    module: &mut IrModule,
    old: DeclId,
    target: DeclId,
    index: usize,
    origin: Option<Origin>,
    name: Option<String>,
) -> Result<DeclId> {
    let param = module.type_parameter(old)?;
    let copy = TypeParameter {
        name: name.unwrap_or_else(|| param.name.clone()),
        index,
        variance: param.variance,
        is_reified: param.is_reified,
        super_types: Vec::new(),
        annotations: param.annotations.clone(),
    };
    let decl = module.decl(old);
    let mut new_decl = Declaration::new(
        origin.unwrap_or(decl.origin),
        DeclKind::TypeParameter(copy),
    )
    .with_offsets(decl.start_offset, decl.end_offset);
    new_decl.parent = Some(target);
    Ok(module.alloc(new_decl))
}

/// Remaps the bounds of `old` through `map` and installs them on `new`.
fn copy_super_types(
    module: &mut IrModule,
    old: DeclId,
    new: DeclId,
    map: &TypeParameterMap,
) -> Result<()> {
    let source = module.parent(old)?;
    let target = module.parent(new)?;
    let super_types = module
        .type_parameter(old)?
        .super_types
        .iter()
        .map(|t| remap_type_parameters(module, t, source, target, Some(map)))
        .collect::<Result<Vec<_>>>()?;
    module.type_parameter_mut(new)?.super_types = super_types;
    Ok(())
}

/// Copies `params` into `target` after the type parameters it already has.
///
/// Bounds may mention sibling parameters in any order, so all parameters are
/// created first and bounds are remapped in a second pass through the
/// complete old -> new map (layered over `base_map`).
pub fn copy_type_parameters(
    module: &mut IrModule,
    params: &[DeclId],
    target: DeclId,
    origin: Option<Origin>,
    base_map: Option<&TypeParameterMap>,
) -> Result<Vec<DeclId>> {
    let shift = module.type_parameters_of(target)?.len();
    let mut map = base_map.cloned().unwrap_or_default();
    let mut copies = Vec::with_capacity(params.len());
    for (i, &old) in params.iter().enumerate() {
        let new = copy_type_parameter_without_super_types(module, old, target, shift + i, origin, None)?;
        map.insert(old, new);
        copies.push(new);
    }
    module
        .type_parameters_of_mut(target)?
        .extend(copies.iter().copied());
    for (&old, &new) in params.iter().zip(&copies) {
        copy_super_types(module, old, new, &map)?;
    }
    debug!(%target, count = copies.len(), "copied type parameters");
    Ok(copies)
}

pub fn copy_type_parameters_from(
    module: &mut IrModule,
    source: DeclId,
    target: DeclId,
) -> Result<Vec<DeclId>> {
    let params = module.type_parameters_of(source)?.to_vec();
    copy_type_parameters(module, &params, target, None, None)
}

/// Copies `context` type parameters into `target`, renaming any whose name
/// is taken by `existing`: `T` becomes `T_I1`, or the first `T_I<n>` not
/// used by either list.
pub fn copy_and_rename_conflicting_type_parameters(
    module: &mut IrModule,
    context: &[DeclId],
    existing: &[DeclId],
    target: DeclId,
) -> Result<Vec<DeclId>> {
    let existing_names: Vec<String> = existing.iter().map(|p| module.name(*p).to_string()).collect();
    let mut taken: std::collections::BTreeSet<String> = context
        .iter()
        .map(|p| module.name(*p).to_string())
        .chain(existing_names.iter().cloned())
        .collect();

    let shift = module.type_parameters_of(target)?.len();
    let mut copies = Vec::with_capacity(context.len());
    for (i, &old) in context.iter().enumerate() {
        let name = module.name(old).to_string();
        let new_name = if existing_names.contains(&name) {
            let mut n = 1u32;
            let mut fresh = format!("{name}_I{n}");
            while taken.contains(&fresh) {
                n += 1;
                fresh = format!("{name}_I{n}");
            }
            taken.insert(fresh.clone());
            debug!(from = %name, to = %fresh, "renamed conflicting type parameter");
            fresh
        } else {
            name
        };
        copies.push(copy_type_parameter_without_super_types(
            module,
            old,
            target,
            shift + i,
            None,
            Some(new_name),
        )?);
    }
    let map: TypeParameterMap = context.iter().copied().zip(copies.iter().copied()).collect();
    for (&old, &new) in context.iter().zip(&copies) {
        copy_super_types(module, old, new, &map)?;
    }
    module
        .type_parameters_of_mut(target)?
        .extend(copies.iter().copied());
    Ok(copies)
}

/// Rebuilds the parameter surface of `source` on `target` as ordinary
/// parameters: dispatch receiver first (`$this`), extension receiver next
/// (`$receiver`), then the value parameters shifted accordingly.
///
/// `dispatch_receiver_type` overrides the receiver's type and must be a
/// subtype of the original receiver type.
pub fn copy_value_parameters_to_static(
    module: &mut IrModule,
    source: DeclId,
    target: DeclId,
    origin: Origin,
    dispatch_receiver_type: Option<IrType>,
    type_map: &TypeParameterMap,
) -> Result<Vec<DeclId>> {
    if !module.function(target)?.value_parameters.is_empty() {
        return Err(ToolkitError::ParametersAlreadyPresent { function: target });
    }
    let source_fn = module.function(source)?.clone();
    let target_container = module.class_if_constructor(target)?;

    let mut shift = 0i32;
    let mut symbol_map = SymbolMap::new();
    let mut copies = Vec::new();

    if let Some(old_receiver) = source_fn.dispatch_receiver_parameter {
        let declared = module.value_parameter(old_receiver)?.ty.clone();
        let receiver_type = dispatch_receiver_type.unwrap_or_else(|| declared.clone());
        let compatible = match declared.class_or_null() {
            Some(class) => is_subtype_of_class(module, &receiver_type, class),
            None => is_subtype_of(module, &receiver_type, &declared),
        };
        if !compatible {
            return Err(ToolkitError::ReceiverTypeMismatch {
                function: source,
                expected: render_type(module, &declared),
                found: render_type(module, &receiver_type),
            });
        }
        let receiver_owner = module.class_if_constructor(module.parent(old_receiver)?)?;
        let ty = remap_type_parameters(
            module,
            &receiver_type,
            receiver_owner,
            target_container,
            Some(type_map),
        )?;
        let new = copy_value_parameter(
            module,
            old_receiver,
            target,
            CopyParameterOptions {
                origin: Some(Origin::MovedDispatchReceiver),
                index: Some(shift),
                name: Some(STATIC_DISPATCH_RECEIVER_NAME.to_string()),
                ty: Some(ty),
                symbol_map: symbol_map.clone(),
                ..Default::default()
            },
            Some(type_map),
        )?;
        shift += 1;
        symbol_map.insert(old_receiver, new);
        copies.push(new);
    }

    if let Some(old_receiver) = source_fn.extension_receiver_parameter {
        let new = copy_value_parameter(
            module,
            old_receiver,
            target,
            CopyParameterOptions {
                origin: Some(Origin::MovedExtensionReceiver),
                index: Some(shift),
                name: Some(STATIC_EXTENSION_RECEIVER_NAME.to_string()),
                symbol_map: symbol_map.clone(),
                ..Default::default()
            },
            Some(type_map),
        )?;
        shift += 1;
        symbol_map.insert(old_receiver, new);
        copies.push(new);
    }

    for old in source_fn.value_parameters {
        let index = module.value_parameter(old)?.index + shift;
        let new = copy_value_parameter(
            module,
            old,
            target,
            CopyParameterOptions {
                origin: Some(origin),
                index: Some(index),
                symbol_map: symbol_map.clone(),
                ..Default::default()
            },
            Some(type_map),
        )?;
        symbol_map.insert(old, new);
        copies.push(new);
    }

    module
        .function_mut(target)?
        .value_parameters
        .extend(copies.iter().copied());
    Ok(copies)
}

/// Copies receivers (kept as receivers) and value parameters from `source`
/// to `target`. Without an explicit map, type parameters are matched by
/// position between the two containers.
pub fn copy_value_parameters_from(
    module: &mut IrModule,
    source: DeclId,
    target: DeclId,
    type_map: Option<&TypeParameterMap>,
) -> Result<()> {
    let target_fn = module.function(target)?;
    if target_fn.dispatch_receiver_parameter.is_some()
        || target_fn.extension_receiver_parameter.is_some()
    {
        return Err(ToolkitError::ReceiverAlreadyPresent { owner: target });
    }
    if !target_fn.value_parameters.is_empty() {
        return Err(ToolkitError::ParametersAlreadyPresent { function: target });
    }
    let source_fn = module.function(source)?.clone();
    let map = match type_map {
        Some(map) => map.clone(),
        None => {
            let from = module.type_parameters_of(module.class_if_constructor(source)?)?;
            let to = module.type_parameters_of(module.class_if_constructor(target)?)?;
            from.iter().copied().zip(to.iter().copied()).collect()
        }
    };

    let mut symbol_map = SymbolMap::new();
    let copy = |module: &mut IrModule, old: DeclId, symbol_map: &mut SymbolMap| -> Result<DeclId> {
        let new = copy_value_parameter(
            module,
            old,
            target,
            CopyParameterOptions {
                symbol_map: symbol_map.clone(),
                ..Default::default()
            },
            Some(&map),
        )?;
        symbol_map.insert(old, new);
        Ok(new)
    };

    let dispatch = source_fn
        .dispatch_receiver_parameter
        .map(|old| copy(module, old, &mut symbol_map))
        .transpose()?;
    let extension = source_fn
        .extension_receiver_parameter
        .map(|old| copy(module, old, &mut symbol_map))
        .transpose()?;
    let values = source_fn
        .value_parameters
        .iter()
        .map(|old| copy(module, *old, &mut symbol_map))
        .collect::<Result<Vec<_>>>()?;

    let target_fn = module.function_mut(target)?;
    target_fn.dispatch_receiver_parameter = dispatch;
    target_fn.extension_receiver_parameter = extension;
    target_fn.value_parameters = values;
    Ok(())
}

/// Type parameters, receivers and value parameters of `source`, copied onto
/// a `target` that has none yet.
pub fn copy_parameter_declarations_from(
    module: &mut IrModule,
    source: DeclId,
    target: DeclId,
) -> Result<()> {
    if !module.function(target)?.type_parameters.is_empty() {
        return Err(ToolkitError::TypeParametersAlreadyPresent { owner: target });
    }
    copy_type_parameters_from(module, source, target)?;
    copy_value_parameters_from(module, source, target, None)
}

/// The class applied to its own type parameters: `C<T, U>` for `class C<T, U>`.
pub fn default_type(module: &IrModule, class: DeclId) -> Result<IrType> {
    let arguments = module
        .class(class)?
        .type_parameters
        .iter()
        .map(|p| TypeArgument::invariant(IrType::type_parameter(*p)))
        .collect();
    Ok(IrType::class_with_arguments(class, arguments))
}

/// Creates the implicit `<this>` receiver of instance members of `class`.
pub fn create_this_receiver_parameter(module: &mut IrModule, class: DeclId) -> Result<DeclId> {
    if module.class(class)?.this_receiver.is_some() {
        return Err(ToolkitError::ReceiverAlreadyPresent { owner: class });
    }
    let ty = default_type(module, class)?;
    let mut decl = Declaration::new(
        Origin::InstanceReceiver,
        DeclKind::ValueParameter(ValueParameter::new(
            THIS_RECEIVER_NAME,
            RECEIVER_PARAMETER_INDEX,
            ty,
        )),
    );
    decl.parent = Some(class);
    let id = module.alloc(decl);
    module.class_mut(class)?.this_receiver = Some(id);
    Ok(id)
}

/// Adds a constructor to `class` that forwards all of its arguments to
/// `super_constructor` and then runs the instance initializer.
///
/// Parameter types are expressed in `class`'s scope by substituting the
/// super class's type parameters with the arguments `class` passes to it.
/// Default values are not carried over.
pub fn add_simple_delegating_constructor(
    module: &mut IrModule,
    class: DeclId,
    super_constructor: DeclId,
    origin: Option<Origin>,
    is_primary: bool,
) -> Result<DeclId> {
    let super_class = module.parent(super_constructor)?;
    let super_fn = module.function(super_constructor)?.clone();

    let nullable_any = module.builtins().nullable_any_type();
    let type_arguments: Vec<IrType> = module
        .class(class)?
        .super_types
        .iter()
        .find(|t| t.class_or_null() == Some(super_class))
        .and_then(IrType::as_simple)
        .map(|s| {
            s.arguments
                .iter()
                .map(|a| a.ty().cloned().unwrap_or_else(|| nullable_any.clone()))
                .collect()
        })
        .unwrap_or_default();
    let substitution: BTreeMap<DeclId, IrType> = module
        .type_parameters_of(super_class)?
        .iter()
        .copied()
        .zip(type_arguments.iter().cloned())
        .collect();

    let mut constructor = Function::new(CONSTRUCTOR_NAME, default_type(module, class)?);
    constructor.visibility = super_fn.visibility;
    constructor.flags.is_primary = is_primary;
    let mut decl = Declaration::new(
        origin.unwrap_or(Origin::DelegatingConstructor),
        DeclKind::Constructor(constructor),
    );
    decl.parent = Some(class);
    let id = module.alloc(decl);

    let mut params = Vec::with_capacity(super_fn.value_parameters.len());
    for (index, &old) in super_fn.value_parameters.iter().enumerate() {
        let old_param = module.value_parameter(old)?;
        let ty = substitute_type(&old_param.ty, &substitution);
        let vararg_element_type = old_param
            .vararg_element_type
            .as_ref()
            .map(|t| substitute_type(t, &substitution));
        params.push(copy_value_parameter(
            module,
            old,
            id,
            CopyParameterOptions {
                index: Some(index as i32),
                ty: Some(ty),
                vararg_element_type,
                default_value: DefaultValue::Drop,
                ..Default::default()
            },
            None,
        )?);
    }

    let arguments = params
        .iter()
        .map(|p| {
            let ty = module.value_parameter(*p)?.ty.clone();
            Ok(Some(IrExpr::get_value(*p, ty)))
        })
        .collect::<Result<Vec<_>>>()?;
    let unit = module.builtins().unit_type();
    let body = IrExpr::Block {
        statements: vec![
            IrStatement::Expr(IrExpr::DelegatingConstructorCall {
                callee: super_constructor,
                type_arguments,
                arguments,
            }),
            IrStatement::Expr(IrExpr::InstanceInitializerCall { class }),
        ],
        ty: unit,
    };
    let constructor = module.function_mut(id)?;
    constructor.value_parameters = params;
    constructor.body = Some(body);

    module.mutation_permit().add_child(class, id)?;
    debug!(%class, constructor = %id, %super_constructor, "added delegating constructor");
    Ok(id)
}
