use irforge::ir::{
    DeclKind, Declaration, Function, IrExpr, IrStatement, IrType, Origin, TypeArgument,
};
use irforge::ir_builders::{add_property, add_value_parameter, new_variable};
use irforge::ir_mutation::patch_declaration_parents;
use irforge::ir_verify::verify_module;
use irforge::toolkit::add_simple_delegating_constructor;

mod ir_fixture;

use ir_fixture::Fixture;

#[test]
fn permits_nest_and_release() {
    let mut fx = Fixture::new();
    assert!(!fx.module.is_mutating());
    {
        let mut outer = fx.module.mutation_permit();
        assert!(outer.is_mutating());
        {
            let inner = outer.mutation_permit();
            assert!(inner.is_mutating());
        }
        assert!(outer.is_mutating());
    }
    assert!(!fx.module.is_mutating());
}

#[test]
fn add_child_reparents_the_inserted_subtree() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let int = fx.int();
    let f = fx.module.alloc(Declaration::new(
        Origin::Defined,
        DeclKind::SimpleFunction(Function::new("f", int.clone())),
    ));
    let p = add_value_parameter(&mut fx.module, f, "p", int.clone()).expect("p");
    let v = new_variable(&mut fx.module, f, "v", int.clone(), Some(IrExpr::int(1, int.clone())));
    fx.module.function_mut(f).expect("f").body = Some(IrExpr::Block {
        statements: vec![
            IrStatement::Variable(v),
            IrStatement::Expr(IrExpr::get_value(p, int.clone())),
        ],
        ty: int,
    });
    // Stale pointers from an earlier placement.
    fx.module.decl_mut(p).parent = Some(fx.file);
    fx.module.decl_mut(v).parent = None;

    fx.module
        .mutation_permit()
        .add_child(class, f)
        .expect("add child");
    assert_eq!(fx.module.decl(f).parent, Some(class));
    assert_eq!(fx.module.decl(p).parent, Some(f));
    assert_eq!(fx.module.decl(v).parent, Some(f));
    assert_eq!(fx.module.class(class).expect("class").declarations, vec![f]);
    assert!(verify_module(&fx.module).is_empty());
}

#[test]
fn accessors_take_the_class_as_parent() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let other = fx.class("D", &[]);
    let int = fx.int();
    let property = add_property(&mut fx.module, class, "n", int, false).expect("property");
    let getter = fx.module.property(property).expect("n").getter.expect("getter");
    assert_eq!(fx.module.decl(getter).parent, Some(class));

    patch_declaration_parents(&mut fx.module, property, other);
    assert_eq!(fx.module.decl(property).parent, Some(other));
    assert_eq!(fx.module.decl(getter).parent, Some(other));
}

#[test]
fn verification_waits_for_open_permits() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let int = fx.int();
    let f = fx.function(class, "f", int.clone());
    let p = add_value_parameter(&mut fx.module, f, "p", int).expect("p");
    fx.module.decl_mut(p).parent = Some(class);

    {
        let permit = fx.module.mutation_permit();
        assert!(verify_module(&permit).is_empty());
    }
    let issues = verify_module(&fx.module);
    assert_eq!(issues.len(), 1, "{issues:?}");
    assert_eq!(issues[0].decl, p);
    assert!(issues[0].message.contains("has parent"), "{}", issues[0].message);
}

#[test]
fn verification_reports_wrong_indices() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let f = fx.function(fx.file, "f", int.clone());
    add_value_parameter(&mut fx.module, f, "a", int.clone()).expect("a");
    let b = add_value_parameter(&mut fx.module, f, "b", int).expect("b");
    fx.module.value_parameter_mut(b).expect("b").index = 5;

    let issues = verify_module(&fx.module);
    assert_eq!(issues.len(), 1, "{issues:?}");
    assert!(issues[0].message.contains("has index 5, expected 1"));
}

#[test]
fn delegating_constructor_forwards_substituted_parameters() {
    let mut fx = Fixture::new();
    let base = fx.class("Base", &["E"]);
    let e = fx.type_parameter_type(base, 0);
    let int = fx.int();
    let string = fx.string();
    let super_ctor = fx.constructor(base);
    add_value_parameter(&mut fx.module, super_ctor, "value", e).expect("value");
    let count = add_value_parameter(&mut fx.module, super_ctor, "count", int.clone()).expect("count");
    fx.module.value_parameter_mut(count).expect("count").default_value =
        Some(IrExpr::int(1, int.clone()));

    let derived = fx.class("Derived", &[]);
    let super_type = fx.applied(base, vec![string.clone()]);
    fx.add_super_type(derived, super_type);

    let ctor = add_simple_delegating_constructor(&mut fx.module, derived, super_ctor, None, true)
        .expect("delegating constructor");
    assert_eq!(fx.module.decl(ctor).origin, Origin::DelegatingConstructor);
    assert_eq!(fx.module.decl(ctor).parent, Some(derived));
    assert!(fx.module.is_constructor(ctor));
    assert!(fx.module.class(derived).expect("derived").declarations.contains(&ctor));

    let function = fx.module.function(ctor).expect("ctor").clone();
    assert!(function.flags.is_primary);
    let params = function.value_parameters.clone();
    let types: Vec<_> = params
        .iter()
        .map(|p| fx.module.value_parameter(*p).expect("param").ty.clone())
        .collect();
    assert_eq!(types, vec![string.clone(), int.clone()]);
    assert!(params
        .iter()
        .all(|p| fx.module.value_parameter(*p).expect("param").default_value.is_none()));
    // The super constructor keeps its default.
    assert!(fx.module.value_parameter(count).expect("count").default_value.is_some());

    let expected = IrExpr::Block {
        statements: vec![
            IrStatement::Expr(IrExpr::DelegatingConstructorCall {
                callee: super_ctor,
                type_arguments: vec![string.clone()],
                arguments: vec![
                    Some(IrExpr::get_value(params[0], string)),
                    Some(IrExpr::get_value(params[1], int)),
                ],
            }),
            IrStatement::Expr(IrExpr::InstanceInitializerCall { class: derived }),
        ],
        ty: fx.module.builtins().unit_type(),
    };
    assert_eq!(function.body, Some(expected));
    assert!(verify_module(&fx.module).is_empty());
}

#[test]
fn star_super_type_argument_becomes_nullable_any() {
    let mut fx = Fixture::new();
    let base = fx.class("Base", &["E"]);
    let e = fx.type_parameter_type(base, 0);
    let super_ctor = fx.constructor(base);
    add_value_parameter(&mut fx.module, super_ctor, "value", e).expect("value");
    let derived = fx.class("Derived", &[]);
    fx.add_super_type(
        derived,
        IrType::class_with_arguments(base, vec![TypeArgument::Star]),
    );

    let ctor = add_simple_delegating_constructor(&mut fx.module, derived, super_ctor, None, false)
        .expect("delegating constructor");
    let param = fx.module.function(ctor).expect("ctor").value_parameters[0];
    assert_eq!(
        fx.module.value_parameter(param).expect("value").ty,
        fx.module.builtins().nullable_any_type()
    );
}
