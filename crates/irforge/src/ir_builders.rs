//! Small constructors for building IR by hand: frontends, tests and the
//! synthesized declarations of the toolkit all go through these.

use crate::error::{Result, ToolkitError};
use crate::ir::{
    Class, ClassKind, DeclId, DeclKind, Declaration, File, Function, IrExpr, IrModule, IrType,
    Origin, Property, TypeParameter, ValueParameter, Variable, RECEIVER_PARAMETER_INDEX,
};

pub fn add_file(module: &mut IrModule, name: &str, package: &str) -> DeclId {
    module.alloc(Declaration::new(
        Origin::Defined,
        DeclKind::File(File {
            name: name.to_string(),
            package: package.to_string(),
            declarations: Vec::new(),
        }),
    ))
}

pub fn add_class(
    module: &mut IrModule,
    container: DeclId,
    name: &str,
    kind: ClassKind,
) -> Result<DeclId> {
    let id = module.alloc(Declaration::new(
        Origin::Defined,
        DeclKind::Class(Class::new(name, kind)),
    ));
    module.mutation_permit().add_child(container, id)?;
    Ok(id)
}

/// Allocates `function` and appends it to a file or class.
pub fn add_function_decl(
    module: &mut IrModule,
    container: DeclId,
    origin: Origin,
    function: Function,
) -> Result<DeclId> {
    let id = module.alloc(Declaration::new(origin, DeclKind::SimpleFunction(function)));
    module.mutation_permit().add_child(container, id)?;
    Ok(id)
}

pub fn add_function(
    module: &mut IrModule,
    container: DeclId,
    name: &str,
    return_type: IrType,
) -> Result<DeclId> {
    add_function_decl(
        module,
        container,
        Origin::Defined,
        Function::new(name, return_type),
    )
}

/// Appends a value parameter at the next free index.
pub fn add_value_parameter(
    module: &mut IrModule,
    function: DeclId,
    name: &str,
    ty: IrType,
) -> Result<DeclId> {
    let index = module.function(function)?.value_parameters.len() as i32;
    let mut decl = Declaration::new(
        Origin::Defined,
        DeclKind::ValueParameter(ValueParameter::new(name, index, ty)),
    );
    decl.parent = Some(function);
    let id = module.alloc(decl);
    module.function_mut(function)?.value_parameters.push(id);
    Ok(id)
}

/// Appends a type parameter at the next free index of a class or function.
pub fn add_type_parameter(
    module: &mut IrModule,
    container: DeclId,
    name: &str,
    super_types: Vec<IrType>,
) -> Result<DeclId> {
    let index = module.type_parameters_of(container)?.len();
    let mut param = TypeParameter::new(name, index);
    param.super_types = super_types;
    let mut decl = Declaration::new(Origin::Defined, DeclKind::TypeParameter(param));
    decl.parent = Some(container);
    let id = module.alloc(decl);
    module.type_parameters_of_mut(container)?.push(id);
    Ok(id)
}

fn new_receiver(module: &mut IrModule, owner: DeclId, name: &str, ty: IrType) -> DeclId {
    let mut decl = Declaration::new(
        Origin::Defined,
        DeclKind::ValueParameter(ValueParameter::new(name, RECEIVER_PARAMETER_INDEX, ty)),
    );
    decl.parent = Some(owner);
    module.alloc(decl)
}

pub fn set_dispatch_receiver(module: &mut IrModule, function: DeclId, ty: IrType) -> Result<DeclId> {
    if module.function(function)?.dispatch_receiver_parameter.is_some() {
        return Err(ToolkitError::ReceiverAlreadyPresent { owner: function });
    }
    let id = new_receiver(module, function, "<this>", ty);
    module.function_mut(function)?.dispatch_receiver_parameter = Some(id);
    Ok(id)
}

pub fn set_extension_receiver(
    module: &mut IrModule,
    function: DeclId,
    ty: IrType,
) -> Result<DeclId> {
    if module.function(function)?.extension_receiver_parameter.is_some() {
        return Err(ToolkitError::ReceiverAlreadyPresent { owner: function });
    }
    let id = new_receiver(module, function, "<receiver>", ty);
    module.function_mut(function)?.extension_receiver_parameter = Some(id);
    Ok(id)
}

/// Adds a property with a getter (and a setter when `is_var`) to a class.
/// Accessors take the class as their parent and dispatch on it.
pub fn add_property(
    module: &mut IrModule,
    class: DeclId,
    name: &str,
    ty: IrType,
    is_var: bool,
) -> Result<DeclId> {
    let class_type = crate::toolkit::default_type(module, class)?;
    let unit = module.builtins().unit_type();

    let getter = module.alloc(Declaration::new(
        Origin::Defined,
        DeclKind::SimpleFunction(Function::new(format!("<get-{name}>"), ty.clone())),
    ));
    set_dispatch_receiver(module, getter, class_type.clone())?;

    let setter = if is_var {
        let setter = module.alloc(Declaration::new(
            Origin::Defined,
            DeclKind::SimpleFunction(Function::new(format!("<set-{name}>"), unit)),
        ));
        set_dispatch_receiver(module, setter, class_type)?;
        add_value_parameter(module, setter, "<set-?>", ty.clone())?;
        Some(setter)
    } else {
        None
    };

    let property = module.alloc(Declaration::new(
        Origin::Defined,
        DeclKind::Property(Property {
            name: name.to_string(),
            visibility: Default::default(),
            modality: Default::default(),
            ty,
            is_var,
            getter: Some(getter),
            setter,
        }),
    ));
    module.mutation_permit().add_child(class, property)?;
    Ok(property)
}

/// Allocates a local variable owned by `function`. The caller places it in a
/// block with [`crate::ir::IrStatement::Variable`].
pub fn new_variable(
    module: &mut IrModule,
    function: DeclId,
    name: &str,
    ty: IrType,
    initializer: Option<IrExpr>,
) -> DeclId {
    let mut decl = Declaration::new(
        Origin::Defined,
        DeclKind::Variable(Variable {
            name: name.to_string(),
            ty,
            is_var: false,
            initializer,
        }),
    );
    decl.parent = Some(function);
    module.alloc(decl)
}
