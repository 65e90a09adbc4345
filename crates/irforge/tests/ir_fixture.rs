#![allow(dead_code)]

use irforge::ir::{
    ClassKind, DeclId, DeclKind, Declaration, Function, IrModule, IrType, Origin, TypeArgument,
};
use irforge::ir_builders::{add_class, add_file, add_function, add_type_parameter};
use irforge::toolkit::{default_type, CONSTRUCTOR_NAME};

/// A module with one file `test.kt` in package `test`.
pub struct Fixture {
    pub module: IrModule,
    pub file: DeclId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut module = IrModule::new("test");
        let file = add_file(&mut module, "test.kt", "test");
        Self { module, file }
    }

    pub fn int(&self) -> IrType {
        self.module.builtins().int_type()
    }

    pub fn string(&self) -> IrType {
        self.module.builtins().string_type()
    }

    pub fn class(&mut self, name: &str, type_parameters: &[&str]) -> DeclId {
        self.class_of_kind(name, ClassKind::Class, type_parameters)
    }

    pub fn interface(&mut self, name: &str) -> DeclId {
        self.class_of_kind(name, ClassKind::Interface, &[])
    }

    fn class_of_kind(&mut self, name: &str, kind: ClassKind, type_parameters: &[&str]) -> DeclId {
        let class = add_class(&mut self.module, self.file, name, kind).expect("add class");
        for tp in type_parameters {
            add_type_parameter(&mut self.module, class, tp, Vec::new()).expect("add type parameter");
        }
        class
    }

    pub fn function(&mut self, container: DeclId, name: &str, return_type: IrType) -> DeclId {
        add_function(&mut self.module, container, name, return_type).expect("add function")
    }

    pub fn constructor(&mut self, class: DeclId) -> DeclId {
        let return_type = default_type(&self.module, class).expect("default type");
        let id = self.module.alloc(Declaration::new(
            Origin::Defined,
            DeclKind::Constructor(Function::new(CONSTRUCTOR_NAME, return_type)),
        ));
        self.module
            .mutation_permit()
            .add_child(class, id)
            .expect("add constructor");
        id
    }

    pub fn type_parameter(&self, container: DeclId, index: usize) -> DeclId {
        self.module
            .type_parameters_of(container)
            .expect("type parameters")[index]
    }

    pub fn type_parameter_type(&self, container: DeclId, index: usize) -> IrType {
        IrType::type_parameter(self.type_parameter(container, index))
    }

    pub fn add_super_type(&mut self, class: DeclId, super_type: IrType) {
        self.module
            .class_mut(class)
            .expect("class")
            .super_types
            .push(super_type);
    }

    pub fn applied(&self, class: DeclId, arguments: Vec<IrType>) -> IrType {
        IrType::class_with_arguments(
            class,
            arguments.into_iter().map(TypeArgument::invariant).collect(),
        )
    }
}
