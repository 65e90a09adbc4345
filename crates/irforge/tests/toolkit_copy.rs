use irforge::error::{ErrorKind, ToolkitError};
use irforge::ir::{IrExpr, IrStatement, IrType, Origin, TypeParameterMap};
use irforge::ir_builders::{add_type_parameter, add_value_parameter, new_variable, set_dispatch_receiver};
use irforge::ir_verify::verify_module;
use irforge::remap::remap_type_parameters;
use irforge::toolkit::{
    copy_parameter_declarations_from, copy_type_parameters, copy_type_parameters_from,
    copy_value_parameter, copy_value_parameters_from, create_this_receiver_parameter,
    CopyParameterOptions, DefaultValue, THIS_RECEIVER_NAME,
};

mod ir_fixture;

use ir_fixture::Fixture;

#[test]
fn remap_prefers_explicit_map_then_position_then_identity() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &["T"]);
    let int = fx.int();
    let f = fx.function(class, "f", int.clone());
    let g = fx.function(class, "g", int);
    let a = add_type_parameter(&mut fx.module, f, "A", Vec::new()).expect("A");
    let b = add_type_parameter(&mut fx.module, g, "B", Vec::new()).expect("B");
    let x = add_type_parameter(&mut fx.module, g, "X", Vec::new()).expect("X");
    let t = fx.type_parameter(class, 0);

    let positional = remap_type_parameters(&fx.module, &IrType::type_parameter(a), f, g, None)
        .expect("positional remap");
    assert_eq!(positional, IrType::type_parameter(b));

    let map: TypeParameterMap = [(a, x)].into_iter().collect();
    let explicit = remap_type_parameters(&fx.module, &IrType::type_parameter(a), f, g, Some(&map))
        .expect("explicit remap");
    assert_eq!(explicit, IrType::type_parameter(x));

    // T belongs to the class, not to f: it is left alone.
    let list = fx.applied(class, vec![IrType::type_parameter(t).with_nullability(true)]);
    let unchanged = remap_type_parameters(&fx.module, &list, f, g, None).expect("unrelated remap");
    assert_eq!(unchanged, list);
}

#[test]
fn copy_value_parameter_leaves_the_source_untouched() {
    let mut fx = Fixture::new();
    let source_class = fx.class("C", &["T"]);
    let target_class = fx.class("D", &["U"]);
    let int = fx.int();
    let f = fx.function(source_class, "f", int.clone());
    let g = fx.function(target_class, "g", int.clone());
    let t = fx.type_parameter(source_class, 0);
    let u = fx.type_parameter(target_class, 0);

    let a = add_value_parameter(&mut fx.module, f, "a", IrType::type_parameter(t)).expect("a");
    let b = add_value_parameter(&mut fx.module, f, "b", int.clone()).expect("b");
    let v = new_variable(
        &mut fx.module,
        f,
        "v",
        int.clone(),
        Some(IrExpr::get_value(a, IrType::type_parameter(t))),
    );
    let default = IrExpr::Block {
        statements: vec![
            IrStatement::Variable(v),
            IrStatement::Expr(IrExpr::get_value(v, int.clone())),
        ],
        ty: int.clone(),
    };
    fx.module.value_parameter_mut(b).expect("b").default_value = Some(default.clone());
    let before = fx.module.decl(b).clone();

    let map: TypeParameterMap = [(t, u)].into_iter().collect();
    let a2 = copy_value_parameter(&mut fx.module, a, g, CopyParameterOptions::default(), Some(&map))
        .expect("copy a");
    let b2 = copy_value_parameter(
        &mut fx.module,
        b,
        g,
        CopyParameterOptions {
            symbol_map: [(a, a2)].into_iter().collect(),
            ..Default::default()
        },
        Some(&map),
    )
    .expect("copy b");

    assert_eq!(fx.module.decl(b), &before, "source parameter must not change");
    assert_eq!(fx.module.decl(v).parent, Some(f));

    let a2_param = fx.module.value_parameter(a2).expect("a2");
    assert_eq!(a2_param.ty, IrType::type_parameter(u));
    assert_eq!(fx.module.decl(a2).parent, Some(g));
    // The caller places the copy.
    assert!(fx.module.function(g).expect("g").value_parameters.is_empty());

    let Some(IrExpr::Block { statements, .. }) =
        fx.module.value_parameter(b2).expect("b2").default_value.clone()
    else {
        panic!("default value should be a copied block");
    };
    let IrStatement::Variable(v2) = statements[0] else {
        panic!("first statement should declare the copied variable");
    };
    assert_ne!(v2, v);
    assert_eq!(fx.module.decl(v2).parent, Some(g));
    assert_eq!(
        fx.module.variable(v2).expect("v2").initializer,
        Some(IrExpr::get_value(a2, IrType::type_parameter(u)))
    );
    assert_eq!(statements[1], IrStatement::Expr(IrExpr::get_value(v2, int)));
}

#[test]
fn copy_value_parameter_honours_overrides() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let string = fx.string();
    let f = fx.function(fx.file, "f", int.clone());
    let g = fx.function(fx.file, "g", int.clone());
    let p = add_value_parameter(&mut fx.module, f, "p", int.clone()).expect("p");
    fx.module.value_parameter_mut(p).expect("p").default_value = Some(IrExpr::int(1, int.clone()));

    let dropped = copy_value_parameter(
        &mut fx.module,
        p,
        g,
        CopyParameterOptions {
            name: Some("q".to_string()),
            index: Some(3),
            ty: Some(string.clone()),
            origin: Some(Origin::Synthetic("TEST")),
            is_noinline: Some(true),
            default_value: DefaultValue::Drop,
            ..Default::default()
        },
        None,
    )
    .expect("copy with overrides");
    let copy = fx.module.value_parameter(dropped).expect("copy");
    assert_eq!(copy.name, "q");
    assert_eq!(copy.index, 3);
    assert_eq!(copy.ty, string);
    assert!(copy.is_noinline);
    assert_eq!(copy.default_value, None);
    assert_eq!(fx.module.decl(dropped).origin.as_str(), "TEST");

    let replaced = copy_value_parameter(
        &mut fx.module,
        p,
        g,
        CopyParameterOptions {
            default_value: DefaultValue::Replace(IrExpr::int(7, int.clone())),
            ..Default::default()
        },
        None,
    )
    .expect("copy with replaced default");
    assert_eq!(
        fx.module.value_parameter(replaced).expect("copy").default_value,
        Some(IrExpr::int(7, int))
    );
}

#[test]
fn type_parameter_bounds_may_reference_later_siblings() {
    let mut fx = Fixture::new();
    let boxed = fx.class("Box", &["E"]);
    let int = fx.int();
    let f = fx.function(fx.file, "f", int.clone());
    let g = fx.function(fx.file, "g", int);
    let a = add_type_parameter(&mut fx.module, f, "A", Vec::new()).expect("A");
    let b = add_type_parameter(&mut fx.module, f, "B", Vec::new()).expect("B");
    let bound = fx.applied(boxed, vec![IrType::type_parameter(b)]);
    fx.module.type_parameter_mut(a).expect("A").super_types = vec![bound];
    let existing = add_type_parameter(&mut fx.module, g, "X", Vec::new()).expect("X");

    let copies = copy_type_parameters_from(&mut fx.module, f, g).expect("copy type parameters");
    assert_eq!(copies.len(), 2);
    let (a2, b2) = (copies[0], copies[1]);
    assert_eq!(
        fx.module.function(g).expect("g").type_parameters,
        vec![existing, a2, b2]
    );
    assert_eq!(fx.module.type_parameter(a2).expect("A'").index, 1);
    assert_eq!(fx.module.type_parameter(b2).expect("B'").index, 2);
    assert_eq!(fx.module.decl(a2).parent, Some(g));
    assert_eq!(
        fx.module.type_parameter(a2).expect("A'").super_types,
        vec![fx.applied(boxed, vec![IrType::type_parameter(b2)])]
    );
    // The source bound still names the original B.
    assert_eq!(
        fx.module.type_parameter(a).expect("A").super_types,
        vec![fx.applied(boxed, vec![IrType::type_parameter(b)])]
    );
    assert!(verify_module(&fx.module).is_empty());
}

#[test]
fn copy_type_parameters_layers_over_a_base_map() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &["T"]);
    let other = fx.class("D", &["S"]);
    let int = fx.int();
    let f = fx.function(class, "f", int.clone());
    let g = fx.function(fx.file, "g", int);
    let t = fx.type_parameter(class, 0);
    let s = fx.type_parameter(other, 0);
    let r = add_type_parameter(&mut fx.module, f, "R", vec![IrType::type_parameter(t)]).expect("R");

    let base: TypeParameterMap = [(t, s)].into_iter().collect();
    let copies = copy_type_parameters(&mut fx.module, &[r], g, None, Some(&base)).expect("copy");
    assert_eq!(
        fx.module.type_parameter(copies[0]).expect("R'").super_types,
        vec![IrType::type_parameter(s)]
    );
}

#[test]
fn value_parameters_from_match_class_type_parameters_by_position() {
    let mut fx = Fixture::new();
    let source_class = fx.class("C", &["T"]);
    let target_class = fx.class("D", &["U"]);
    let source = fx.constructor(source_class);
    let target = fx.constructor(target_class);
    let t = fx.type_parameter_type(source_class, 0);
    let u = fx.type_parameter_type(target_class, 0);
    add_value_parameter(&mut fx.module, source, "x", t).expect("x");

    copy_value_parameters_from(&mut fx.module, source, target, None).expect("copy parameters");
    let params = fx.module.function(target).expect("target").value_parameters.clone();
    assert_eq!(params.len(), 1);
    assert_eq!(fx.module.value_parameter(params[0]).expect("x'").ty, u);
    assert_eq!(fx.module.decl(params[0]).parent, Some(target));
    assert!(verify_module(&fx.module).is_empty());
}

#[test]
fn receivers_stay_receivers_and_defaults_follow_earlier_parameters() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let int = fx.int();
    let class_type = fx.applied(class, Vec::new());
    let f = fx.function(class, "f", int.clone());
    let g = fx.function(class, "g", int.clone());
    let this = set_dispatch_receiver(&mut fx.module, f, class_type.clone()).expect("receiver");
    let a = add_value_parameter(&mut fx.module, f, "a", int.clone()).expect("a");
    let b = add_value_parameter(&mut fx.module, f, "b", int.clone()).expect("b");
    fx.module.value_parameter_mut(b).expect("b").default_value =
        Some(IrExpr::get_value(a, int.clone()));

    copy_value_parameters_from(&mut fx.module, f, g, None).expect("copy parameters");
    let copied = fx.module.function(g).expect("g").clone();
    let this2 = copied.dispatch_receiver_parameter.expect("dispatch receiver");
    assert_ne!(this2, this);
    assert_eq!(fx.module.value_parameter(this2).expect("this").ty, class_type);
    assert_eq!(copied.value_parameters.len(), 2);
    assert_eq!(
        fx.module
            .value_parameter(copied.value_parameters[1])
            .expect("b'")
            .default_value,
        Some(IrExpr::get_value(copied.value_parameters[0], int))
    );
}

#[test]
fn filled_slots_are_precondition_errors() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let int = fx.int();
    let class_type = fx.applied(class, Vec::new());
    let f = fx.function(class, "f", int.clone());
    add_value_parameter(&mut fx.module, f, "a", int.clone()).expect("a");

    let with_receiver = fx.function(class, "r", int.clone());
    set_dispatch_receiver(&mut fx.module, with_receiver, class_type).expect("receiver");
    let err = copy_value_parameters_from(&mut fx.module, f, with_receiver, None)
        .expect_err("receiver slot is taken");
    assert_eq!(err, ToolkitError::ReceiverAlreadyPresent { owner: with_receiver });
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let with_params = fx.function(class, "p", int.clone());
    add_value_parameter(&mut fx.module, with_params, "z", int.clone()).expect("z");
    let err = copy_value_parameters_from(&mut fx.module, f, with_params, None)
        .expect_err("parameters are taken");
    assert_eq!(err, ToolkitError::ParametersAlreadyPresent { function: with_params });

    let with_type_params = fx.function(class, "t", int);
    add_type_parameter(&mut fx.module, with_type_params, "T", Vec::new()).expect("T");
    let err = copy_parameter_declarations_from(&mut fx.module, f, with_type_params)
        .expect_err("type parameters are taken");
    assert_eq!(
        err,
        ToolkitError::TypeParametersAlreadyPresent { owner: with_type_params }
    );
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.code, irforge::error::INTERNAL_ERROR_CODE);
    assert!(diagnostic.message.contains("already has type parameters"));
}

#[test]
fn wrong_declaration_kind_is_internal() {
    let mut fx = Fixture::new();
    let class = fx.class("C", &[]);
    let int = fx.int();
    let f = fx.function(class, "f", int);
    let err = copy_value_parameters_from(&mut fx.module, class, f, None)
        .expect_err("a class has no parameters");
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn this_receiver_is_created_once() {
    let mut fx = Fixture::new();
    let class = fx.class("Box", &["E"]);
    let e = fx.type_parameter_type(class, 0);
    let receiver = create_this_receiver_parameter(&mut fx.module, class).expect("create receiver");

    let param = fx.module.value_parameter(receiver).expect("receiver");
    assert_eq!(param.name, THIS_RECEIVER_NAME);
    assert_eq!(param.index, -1);
    assert_eq!(param.ty, fx.applied(class, vec![e]));
    assert_eq!(fx.module.decl(receiver).origin, Origin::InstanceReceiver);
    assert_eq!(fx.module.decl(receiver).parent, Some(class));
    assert_eq!(fx.module.class(class).expect("class").this_receiver, Some(receiver));
    assert!(verify_module(&fx.module).is_empty());

    let err = create_this_receiver_parameter(&mut fx.module, class).expect_err("second receiver");
    assert_eq!(err, ToolkitError::ReceiverAlreadyPresent { owner: class });
}
