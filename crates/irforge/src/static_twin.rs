//! Lowering instance functions to static functions whose receivers are
//! ordinary leading parameters.

use tracing::debug;

use crate::deep_copy::DeepCopier;
use crate::error::Result;
use crate::ir::{
    DeclId, DeclKind, Declaration, Function, IrModule, IrType, Modality, Origin, SymbolMap,
    TypeParameterMap, Visibility,
};
use crate::remap::{remap_type_parameters, TypeRemapper};
use crate::toolkit::{
    copy_and_rename_conflicting_type_parameters, copy_type_parameters,
    copy_value_parameters_to_static,
};

#[derive(Debug, Clone)]
pub struct StaticTwinOptions {
    pub origin: Origin,
    pub modality: Modality,
    /// Defaults to the visibility of the instance function.
    pub visibility: Option<Visibility>,
    /// Narrower type for the `$this` parameter.
    pub dispatch_receiver_type: Option<IrType>,
    /// Type parameters of the enclosing scope (usually the class) that the
    /// twin must declare itself, placed before the function's own.
    pub type_parameters_from_context: Vec<DeclId>,
}

impl Default for StaticTwinOptions {
    fn default() -> Self {
        Self {
            origin: Origin::StaticTwin,
            modality: Modality::Final,
            visibility: None,
            dispatch_receiver_type: None,
            type_parameters_from_context: Vec::new(),
        }
    }
}

/// Builds the static twin of `old` and appends it to `parent`.
pub fn create_static_function_with_receivers(
    module: &mut IrModule,
    parent: DeclId,
    name: &str,
    old: DeclId,
    options: StaticTwinOptions,
) -> Result<DeclId> {
    let old_fn = module.function(old)?.clone();
    let (start_offset, end_offset) = {
        let decl = module.decl(old);
        (decl.start_offset, decl.end_offset)
    };

    let mut twin = Function::new(name, old_fn.return_type.clone());
    twin.visibility = options.visibility.unwrap_or(old_fn.visibility);
    twin.modality = options.modality;
    twin.flags = old_fn.flags;
    twin.flags.is_fake_override = false;
    twin.flags.is_primary = false;
    let mut decl = Declaration::new(options.origin, DeclKind::SimpleFunction(twin))
        .with_offsets(start_offset, end_offset);
    decl.parent = Some(parent);
    let id = module.alloc(decl);

    let context = options.type_parameters_from_context;
    let context_copies =
        copy_and_rename_conflicting_type_parameters(module, &context, &old_fn.type_parameters, id)?;
    let context_map: TypeParameterMap = context
        .iter()
        .copied()
        .zip(context_copies.iter().copied())
        .collect();
    let own_copies = copy_type_parameters(
        module,
        &old_fn.type_parameters,
        id,
        None,
        Some(&context_map),
    )?;
    let mut type_map = context_map;
    type_map.extend(old_fn.type_parameters.iter().copied().zip(own_copies));

    let remapper = TypeRemapper::new(old, id, type_map.clone());
    let annotations =
        DeepCopier::new(id, SymbolMap::new(), Some(&remapper)).copy_annotations(module, &old_fn.annotations)?;

    copy_value_parameters_to_static(
        module,
        old,
        id,
        options.origin,
        options.dispatch_receiver_type,
        &type_map,
    )?;
    let return_type = remap_type_parameters(module, &old_fn.return_type, old, id, Some(&type_map))?;

    let twin = module.function_mut(id)?;
    twin.return_type = return_type;
    twin.annotations = annotations;

    module.mutation_permit().add_child(parent, id)?;
    debug!(instance = %old, twin = %id, name, "created static twin");
    Ok(id)
}
