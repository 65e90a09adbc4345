//! Declaration arena for the IR.
//!
//! Declarations live in one [`IrModule`] and are addressed by [`DeclId`].
//! Containers hold ids, never owned children, so a declaration can be moved
//! between containers by rewriting ids and its `parent` pointer.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ToolkitError};

pub use crate::ir_expr::{ConstValue, IrExpr, IrStatement, TypeOperator};
pub use crate::ir_types::{Classifier, IrType, SimpleType, TypeArgument, Variance};

pub const UNDEFINED_OFFSET: i32 = -1;
pub const RECEIVER_PARAMETER_INDEX: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Old -> new substitution for declarations (type parameters, value
/// parameters, variables). Passed by reference, never mutated in place by the
/// toolkit.
pub type SymbolMap = BTreeMap<DeclId, DeclId>;
pub type TypeParameterMap = SymbolMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Defined,
    FakeOverride,
    InstanceReceiver,
    MovedDispatchReceiver,
    MovedExtensionReceiver,
    DelegatingConstructor,
    StaticTwin,
    Synthetic(&'static str),
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Defined => "DEFINED",
            Origin::FakeOverride => "FAKE_OVERRIDE",
            Origin::InstanceReceiver => "INSTANCE_RECEIVER",
            Origin::MovedDispatchReceiver => "MOVED_DISPATCH_RECEIVER",
            Origin::MovedExtensionReceiver => "MOVED_EXTENSION_RECEIVER",
            Origin::DelegatingConstructor => "DELEGATING_CONSTRUCTOR",
            Origin::StaticTwin => "STATIC_TWIN",
            Origin::Synthetic(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
    Local,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
            Visibility::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modality {
    #[default]
    Final,
    Sealed,
    Open,
    Abstract,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Final => "FINAL",
            Modality::Sealed => "SEALED",
            Modality::Open => "OPEN",
            Modality::Abstract => "ABSTRACT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    EnumClass,
    AnnotationClass,
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub class: DeclId,
    pub arguments: Vec<IrExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionFlags {
    pub is_suspend: bool,
    pub is_operator: bool,
    pub is_infix: bool,
    pub is_inline: bool,
    pub is_external: bool,
    pub is_tailrec: bool,
    /// Constructors only.
    pub is_primary: bool,
    pub is_fake_override: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub package: String,
    pub declarations: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    pub modality: Modality,
    pub type_parameters: Vec<DeclId>,
    pub super_types: Vec<IrType>,
    pub declarations: Vec<DeclId>,
    pub this_receiver: Option<DeclId>,
    pub is_inner: bool,
    pub annotations: Vec<Annotation>,
}

impl Class {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            modality: Modality::Final,
            type_parameters: Vec::new(),
            super_types: Vec::new(),
            declarations: Vec::new(),
            this_receiver: None,
            is_inner: false,
            annotations: Vec::new(),
        }
    }
}

/// Shared shape of simple functions and constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub visibility: Visibility,
    pub modality: Modality,
    pub type_parameters: Vec<DeclId>,
    pub dispatch_receiver_parameter: Option<DeclId>,
    pub extension_receiver_parameter: Option<DeclId>,
    pub value_parameters: Vec<DeclId>,
    pub return_type: IrType,
    pub flags: FunctionFlags,
    pub overridden_symbols: Vec<DeclId>,
    pub annotations: Vec<Annotation>,
    pub body: Option<IrExpr>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            modality: Modality::Final,
            type_parameters: Vec::new(),
            dispatch_receiver_parameter: None,
            extension_receiver_parameter: None,
            value_parameters: Vec::new(),
            return_type,
            flags: FunctionFlags::default(),
            overridden_symbols: Vec::new(),
            annotations: Vec::new(),
            body: None,
        }
    }

    /// Dispatch receiver, extension receiver, then ordinary parameters.
    pub fn all_parameters(&self) -> Vec<DeclId> {
        self.dispatch_receiver_parameter
            .into_iter()
            .chain(self.extension_receiver_parameter)
            .chain(self.value_parameters.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub visibility: Visibility,
    pub modality: Modality,
    pub ty: IrType,
    pub is_var: bool,
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParameter {
    pub name: String,
    /// Position in the owner's value parameter list, or
    /// [`RECEIVER_PARAMETER_INDEX`] for receiver slots.
    pub index: i32,
    pub ty: IrType,
    pub vararg_element_type: Option<IrType>,
    pub default_value: Option<IrExpr>,
    pub is_crossinline: bool,
    pub is_noinline: bool,
    pub annotations: Vec<Annotation>,
}

impl ValueParameter {
    pub fn new(name: impl Into<String>, index: i32, ty: IrType) -> Self {
        Self {
            name: name.into(),
            index,
            ty,
            vararg_element_type: None,
            default_value: None,
            is_crossinline: false,
            is_noinline: false,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub index: usize,
    pub variance: Variance,
    pub is_reified: bool,
    pub super_types: Vec<IrType>,
    pub annotations: Vec<Annotation>,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            variance: Variance::Invariant,
            is_reified: false,
            super_types: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ty: IrType,
    pub is_var: bool,
    pub initializer: Option<IrExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    File(File),
    Class(Class),
    SimpleFunction(Function),
    Constructor(Function),
    Property(Property),
    ValueParameter(ValueParameter),
    TypeParameter(TypeParameter),
    Variable(Variable),
}

impl DeclKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::File(_) => "file",
            DeclKind::Class(_) => "class",
            DeclKind::SimpleFunction(_) => "simple function",
            DeclKind::Constructor(_) => "constructor",
            DeclKind::Property(_) => "property",
            DeclKind::ValueParameter(_) => "value parameter",
            DeclKind::TypeParameter(_) => "type parameter",
            DeclKind::Variable(_) => "variable",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeclKind::File(f) => &f.name,
            DeclKind::Class(c) => &c.name,
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => &f.name,
            DeclKind::Property(p) => &p.name,
            DeclKind::ValueParameter(p) => &p.name,
            DeclKind::TypeParameter(p) => &p.name,
            DeclKind::Variable(v) => &v.name,
        }
    }

    /// Kinds that become the `parent` of the declarations nested in them.
    /// Properties, parameters and variables pass their own parent through.
    pub fn is_declaration_parent(&self) -> bool {
        matches!(
            self,
            DeclKind::File(_)
                | DeclKind::Class(_)
                | DeclKind::SimpleFunction(_)
                | DeclKind::Constructor(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub origin: Origin,
    pub start_offset: i32,
    pub end_offset: i32,
    pub parent: Option<DeclId>,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(origin: Origin, kind: DeclKind) -> Self {
        Self {
            origin,
            start_offset: UNDEFINED_OFFSET,
            end_offset: UNDEFINED_OFFSET,
            parent: None,
            kind,
        }
    }

    pub fn with_offsets(mut self, start_offset: i32, end_offset: i32) -> Self {
        self.start_offset = start_offset;
        self.end_offset = end_offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltIns {
    pub file: DeclId,
    pub any: DeclId,
    pub unit: DeclId,
    pub nothing: DeclId,
    pub int: DeclId,
    pub boolean: DeclId,
    pub string: DeclId,
}

impl BuiltIns {
    pub fn any_type(&self) -> IrType {
        IrType::class(self.any)
    }

    pub fn nullable_any_type(&self) -> IrType {
        IrType::class(self.any).with_nullability(true)
    }

    pub fn unit_type(&self) -> IrType {
        IrType::class(self.unit)
    }

    pub fn int_type(&self) -> IrType {
        IrType::class(self.int)
    }

    pub fn boolean_type(&self) -> IrType {
        IrType::class(self.boolean)
    }

    pub fn string_type(&self) -> IrType {
        IrType::class(self.string)
    }
}

#[derive(Debug, Clone)]
pub struct IrModule {
    pub name: String,
    decls: Vec<Declaration>,
    builtins: BuiltIns,
    pub(crate) mutation_depth: u32,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        let mut decls = Vec::new();
        let mut push = |decl: Declaration| {
            decls.push(decl);
            DeclId((decls.len() - 1) as u32)
        };
        let file = push(Declaration::new(
            Origin::Synthetic("BUILTINS"),
            DeclKind::File(File {
                name: "<builtins>".to_string(),
                package: "std".to_string(),
                declarations: Vec::new(),
            }),
        ));
        let mut builtin_class = |name: &str, modality: Modality| {
            let mut class = Class::new(name, ClassKind::Class);
            class.modality = modality;
            let mut decl = Declaration::new(Origin::Synthetic("BUILTINS"), DeclKind::Class(class));
            decl.parent = Some(file);
            push(decl)
        };
        let any = builtin_class("Any", Modality::Open);
        let unit = builtin_class("Unit", Modality::Final);
        let nothing = builtin_class("Nothing", Modality::Final);
        let int = builtin_class("Int", Modality::Final);
        let boolean = builtin_class("Boolean", Modality::Final);
        let string = builtin_class("String", Modality::Final);

        let mut module = Self {
            name: name.into(),
            decls,
            builtins: BuiltIns {
                file,
                any,
                unit,
                nothing,
                int,
                boolean,
                string,
            },
            mutation_depth: 0,
        };
        for class in [unit, nothing, int, boolean, string] {
            if let DeclKind::Class(c) = &mut module.decls[class.index()].kind {
                c.super_types.push(IrType::class(any));
            }
        }
        if let DeclKind::File(f) = &mut module.decls[file.index()].kind {
            f.declarations = vec![any, unit, nothing, int, boolean, string];
        }
        module
    }

    pub fn builtins(&self) -> &BuiltIns {
        &self.builtins
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Allocates a declaration without attaching it anywhere.
    pub fn alloc(&mut self, decl: Declaration) -> DeclId {
        self.decls.push(decl);
        DeclId((self.decls.len() - 1) as u32)
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.decls.len()).map(|i| DeclId(i as u32))
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.index()]
    }

    pub fn name(&self, id: DeclId) -> &str {
        self.decl(id).kind.name()
    }

    pub fn parent(&self, id: DeclId) -> Result<DeclId> {
        self.decl(id)
            .parent
            .ok_or(ToolkitError::MissingParent { id })
    }

    pub fn is_mutating(&self) -> bool {
        self.mutation_depth > 0
    }

    pub fn file(&self, id: DeclId) -> Result<&File> {
        match &self.decl(id).kind {
            DeclKind::File(f) => Ok(f),
            other => Err(ToolkitError::wrong_kind(id, "file", other.describe())),
        }
    }

    pub fn class(&self, id: DeclId) -> Result<&Class> {
        match &self.decl(id).kind {
            DeclKind::Class(c) => Ok(c),
            other => Err(ToolkitError::wrong_kind(id, "class", other.describe())),
        }
    }

    pub fn class_mut(&mut self, id: DeclId) -> Result<&mut Class> {
        match &mut self.decl_mut(id).kind {
            DeclKind::Class(c) => Ok(c),
            other => Err(ToolkitError::wrong_kind(id, "class", other.describe())),
        }
    }

    /// Simple function or constructor.
    pub fn function(&self, id: DeclId) -> Result<&Function> {
        match &self.decl(id).kind {
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => Ok(f),
            other => Err(ToolkitError::wrong_kind(id, "function", other.describe())),
        }
    }

    pub fn function_mut(&mut self, id: DeclId) -> Result<&mut Function> {
        match &mut self.decl_mut(id).kind {
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => Ok(f),
            other => Err(ToolkitError::wrong_kind(id, "function", other.describe())),
        }
    }

    pub fn is_constructor(&self, id: DeclId) -> bool {
        matches!(self.decl(id).kind, DeclKind::Constructor(_))
    }

    pub fn property(&self, id: DeclId) -> Result<&Property> {
        match &self.decl(id).kind {
            DeclKind::Property(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(id, "property", other.describe())),
        }
    }

    pub fn property_mut(&mut self, id: DeclId) -> Result<&mut Property> {
        match &mut self.decl_mut(id).kind {
            DeclKind::Property(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(id, "property", other.describe())),
        }
    }

    pub fn value_parameter(&self, id: DeclId) -> Result<&ValueParameter> {
        match &self.decl(id).kind {
            DeclKind::ValueParameter(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(
                id,
                "value parameter",
                other.describe(),
            )),
        }
    }

    pub fn value_parameter_mut(&mut self, id: DeclId) -> Result<&mut ValueParameter> {
        match &mut self.decl_mut(id).kind {
            DeclKind::ValueParameter(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(
                id,
                "value parameter",
                other.describe(),
            )),
        }
    }

    pub fn type_parameter(&self, id: DeclId) -> Result<&TypeParameter> {
        match &self.decl(id).kind {
            DeclKind::TypeParameter(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(
                id,
                "type parameter",
                other.describe(),
            )),
        }
    }

    pub fn type_parameter_mut(&mut self, id: DeclId) -> Result<&mut TypeParameter> {
        match &mut self.decl_mut(id).kind {
            DeclKind::TypeParameter(p) => Ok(p),
            other => Err(ToolkitError::wrong_kind(
                id,
                "type parameter",
                other.describe(),
            )),
        }
    }

    pub fn variable(&self, id: DeclId) -> Result<&Variable> {
        match &self.decl(id).kind {
            DeclKind::Variable(v) => Ok(v),
            other => Err(ToolkitError::wrong_kind(id, "variable", other.describe())),
        }
    }

    pub fn variable_mut(&mut self, id: DeclId) -> Result<&mut Variable> {
        match &mut self.decl_mut(id).kind {
            DeclKind::Variable(v) => Ok(v),
            other => Err(ToolkitError::wrong_kind(id, "variable", other.describe())),
        }
    }

    /// Type parameters of a class, simple function or constructor.
    pub fn type_parameters_of(&self, container: DeclId) -> Result<&[DeclId]> {
        match &self.decl(container).kind {
            DeclKind::Class(c) => Ok(&c.type_parameters),
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => Ok(&f.type_parameters),
            other => Err(ToolkitError::wrong_kind(
                container,
                "type parameters container",
                other.describe(),
            )),
        }
    }

    pub fn type_parameters_of_mut(&mut self, container: DeclId) -> Result<&mut Vec<DeclId>> {
        match &mut self.decl_mut(container).kind {
            DeclKind::Class(c) => Ok(&mut c.type_parameters),
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => Ok(&mut f.type_parameters),
            other => Err(ToolkitError::wrong_kind(
                container,
                "type parameters container",
                other.describe(),
            )),
        }
    }

    /// Member list of a file or class.
    pub fn declarations_of(&self, container: DeclId) -> Result<&[DeclId]> {
        match &self.decl(container).kind {
            DeclKind::File(f) => Ok(&f.declarations),
            DeclKind::Class(c) => Ok(&c.declarations),
            other => Err(ToolkitError::wrong_kind(
                container,
                "declaration container",
                other.describe(),
            )),
        }
    }

    pub(crate) fn declarations_of_mut(&mut self, container: DeclId) -> Result<&mut Vec<DeclId>> {
        match &mut self.decl_mut(container).kind {
            DeclKind::File(f) => Ok(&mut f.declarations),
            DeclKind::Class(c) => Ok(&mut c.declarations),
            other => Err(ToolkitError::wrong_kind(
                container,
                "declaration container",
                other.describe(),
            )),
        }
    }

    /// Constructors take their type parameters from the constructed class.
    pub fn class_if_constructor(&self, function: DeclId) -> Result<DeclId> {
        if self.is_constructor(function) {
            self.parent(function)
        } else {
            Ok(function)
        }
    }

    /// Nearest enclosing class, walking parent pointers.
    pub fn parent_class_or_null(&self, id: DeclId) -> Option<DeclId> {
        let mut current = self.decl(id).parent;
        while let Some(p) = current {
            if matches!(self.decl(p).kind, DeclKind::Class(_)) {
                return Some(p);
            }
            current = self.decl(p).parent;
        }
        None
    }

    /// Declarations directly nested in `id`: members, type parameters,
    /// receivers, parameters, accessors and variables declared in bodies,
    /// default values and initializers.
    pub fn nested_declarations(&self, id: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        match &self.decl(id).kind {
            DeclKind::File(f) => out.extend(f.declarations.iter().copied()),
            DeclKind::Class(c) => {
                out.extend(c.type_parameters.iter().copied());
                out.extend(c.this_receiver);
                out.extend(c.declarations.iter().copied());
            }
            DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => {
                out.extend(f.type_parameters.iter().copied());
                out.extend(f.all_parameters());
                if let Some(body) = &f.body {
                    body.collect_declared_variables(&mut out);
                }
            }
            DeclKind::Property(p) => {
                out.extend(p.getter);
                out.extend(p.setter);
            }
            DeclKind::ValueParameter(p) => {
                if let Some(default) = &p.default_value {
                    default.collect_declared_variables(&mut out);
                }
            }
            DeclKind::Variable(v) => {
                if let Some(init) = &v.initializer {
                    init.collect_declared_variables(&mut out);
                }
            }
            DeclKind::TypeParameter(_) => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_parented_to_the_builtins_file() {
        let module = IrModule::new("m");
        let b = *module.builtins();
        assert_eq!(module.decl(b.int).parent, Some(b.file));
        assert_eq!(module.name(b.string), "String");
        assert_eq!(
            module.class(b.int).expect("int").super_types,
            vec![IrType::class(b.any)]
        );
        assert!(module.class(b.any).expect("any").super_types.is_empty());
    }

    #[test]
    fn typed_accessors_reject_other_kinds() {
        let module = IrModule::new("m");
        let b = *module.builtins();
        let err = module.function(b.int).expect_err("int is a class");
        assert_eq!(
            err,
            ToolkitError::WrongDeclarationKind {
                id: b.int,
                expected: "function",
                found: "class",
            }
        );
    }

    #[test]
    fn all_parameters_orders_receivers_first() {
        let mut module = IrModule::new("m");
        let int = module.builtins().int_type();
        let a = module.alloc(Declaration::new(
            Origin::Defined,
            DeclKind::ValueParameter(ValueParameter::new("a", 0, int.clone())),
        ));
        let d = module.alloc(Declaration::new(
            Origin::Defined,
            DeclKind::ValueParameter(ValueParameter::new("<this>", -1, int.clone())),
        ));
        let e = module.alloc(Declaration::new(
            Origin::Defined,
            DeclKind::ValueParameter(ValueParameter::new("<receiver>", -1, int.clone())),
        ));
        let mut f = Function::new("f", int);
        f.value_parameters.push(a);
        f.dispatch_receiver_parameter = Some(d);
        f.extension_receiver_parameter = Some(e);
        assert_eq!(f.all_parameters(), vec![d, e, a]);
    }
}
