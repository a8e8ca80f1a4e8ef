use jtype_classfile::access::*;
use jtype_classfile::{ClassFileBuilder, FieldSpec, MethodSpec};
use jtype_oracle::{CompilationUnit, ContractViolation, OracleConfig, OracleError, TypeOracle};
use jtype_test_utils::{class, class_unit, init_tracing, jdk, unit};
use jtype_types::{TypeData, WildcardKind};

use pretty_assertions::assert_eq;

fn oracle(config: OracleConfig, units: impl IntoIterator<Item = CompilationUnit>) -> TypeOracle {
    init_tracing();
    let mut oracle = TypeOracle::with_config(config);
    oracle.add_units(jdk::all());
    oracle.add_units(units);
    oracle
}

fn build(units: impl IntoIterator<Item = CompilationUnit>) -> TypeOracle {
    let mut oracle = oracle(OracleConfig::default(), units);
    oracle.build().unwrap();
    oracle
}

fn violation(units: impl IntoIterator<Item = CompilationUnit>) -> ContractViolation {
    let mut oracle = oracle(OracleConfig::default(), units);
    match oracle.build() {
        Err(OracleError::Contract { violation, .. }) => violation,
        other => panic!("expected a contract violation, got {other:?}"),
    }
}

/// `class Box<T> {}`
fn generic_box() -> CompilationUnit {
    class_unit(
        "test/Box",
        class("test/Box").signature("<T:Ljava/lang/Object;>Ljava/lang/Object;"),
    )
}

fn field_type(oracle: &TypeOracle, class: &str, field: &str) -> String {
    let decl = oracle.class(oracle.get_type(class).unwrap()).unwrap();
    oracle.display(decl.field(field).unwrap().ty)
}

#[test]
fn generic_class_declares_its_type_parameters() {
    let oracle = build([generic_box()]);
    let store = oracle.store();

    let id = oracle.get_type("test.Box").unwrap();
    let decl = oracle.class(id).unwrap();
    assert!(decl.is_generic);
    assert_eq!(store.type_param_names(id), vec!["T"]);
    let param = store.type_param(decl.type_params[0]).unwrap();
    assert_eq!(param.bounds.len(), 1);
    assert_eq!(store.class_of(param.bounds[0]), oracle.java_lang_object());
}

#[test]
fn generic_type_without_arguments_is_raw() {
    let uses = class_unit(
        "test/UsesBox",
        class("test/UsesBox")
            .field(FieldSpec::new(ACC_PRIVATE, "plain", "Ltest/Box;"))
            .field(FieldSpec::new(ACC_PRIVATE, "bare", "Ltest/Box;").signature("Ltest/Box;")),
    );
    let oracle = build([generic_box(), uses]);
    let store = oracle.store();

    let generic = oracle.get_type("test.Box").unwrap();
    let decl = oracle.class(oracle.get_type("test.UsesBox").unwrap()).unwrap();
    for name in ["plain", "bare"] {
        assert_eq!(
            store.ty(decl.field(name).unwrap().ty),
            &TypeData::Raw(generic),
            "{name}"
        );
    }
}

#[test]
fn parameterized_field_and_method_types() {
    let uses = class_unit(
        "test/UsesBox",
        class("test/UsesBox")
            .field(
                FieldSpec::new(ACC_PRIVATE, "names", "Ltest/Box;")
                    .signature("Ltest/Box<Ljava/lang/String;>;"),
            )
            .field(
                FieldSpec::new(ACC_PRIVATE, "numbers", "[Ltest/Box;")
                    .signature("[Ltest/Box<+Ljava/lang/Number;>;"),
            )
            .method(
                MethodSpec::new(ACC_PUBLIC, "wrap", "(Ljava/lang/Object;)Ltest/Box;")
                    .signature("<E:Ljava/lang/Number;>(TE;)Ltest/Box<-TE;>;"),
            ),
    );
    let oracle = build([generic_box(), uses]);
    let store = oracle.store();

    assert_eq!(field_type(&oracle, "test.UsesBox", "names"), "test.Box<java.lang.String>");
    assert_eq!(
        field_type(&oracle, "test.UsesBox", "numbers"),
        "test.Box<? extends java.lang.Number>[]"
    );

    let decl = oracle.class(oracle.get_type("test.UsesBox").unwrap()).unwrap();
    let wrap = decl.methods_named("wrap").next().unwrap();
    assert_eq!(wrap.type_params.len(), 1);
    assert_eq!(oracle.display(wrap.params[0].ty), "E");
    assert_eq!(oracle.display(wrap.return_type), "test.Box<? super E>");
    let bound = &store.type_param(wrap.type_params[0]).unwrap().bounds;
    assert_eq!(
        bound.iter().map(|ty| oracle.display(*ty)).collect::<Vec<_>>(),
        vec!["java.lang.Number"]
    );
}

#[test]
fn unbounded_wildcard_takes_the_formal_bound() {
    let bar = class_unit("test/Bar", class("test/Bar"));
    let foo = class_unit(
        "test/Foo",
        class("test/Foo").signature("<T:Ltest/Bar;>Ljava/lang/Object;"),
    );
    let uses = class_unit(
        "test/UsesFoo",
        class("test/UsesFoo").field(
            FieldSpec::new(ACC_PRIVATE, "foo", "Ltest/Foo;").signature("Ltest/Foo<*>;"),
        ),
    );
    let oracle = build([bar, foo, uses]);
    let store = oracle.store();

    let bar = oracle.get_type("test.Bar").unwrap();
    let foo = oracle.get_type("test.Foo").unwrap();
    let decl = oracle.class(oracle.get_type("test.UsesFoo").unwrap()).unwrap();
    let TypeData::Parameterized { generic, args, .. } = store.ty(decl.field("foo").unwrap().ty)
    else {
        panic!("expected a parameterized type");
    };
    assert_eq!(*generic, foo);
    let TypeData::Wildcard { kind, bound } = store.ty(args[0]) else {
        panic!("expected a wildcard");
    };
    assert_eq!(*kind, WildcardKind::Unbound);
    assert_eq!(store.class_of(*bound), Some(bar));
    assert_eq!(store.upper_bound(args[0]), Some(*bound));
}

#[test]
fn wildcard_takes_a_bound_resolved_later() {
    // `class A<T extends B> {}` and `class B { A<?> a; }`; resolving A's
    // bound resolves B before A's bound is known.
    let a = || {
        class_unit(
            "test/A",
            class("test/A").signature("<T:Ltest/B;>Ljava/lang/Object;"),
        )
    };
    let b = || {
        class_unit(
            "test/B",
            class("test/B")
                .field(FieldSpec::new(0, "a", "Ltest/A;").signature("Ltest/A<*>;")),
        )
    };

    for oracle in [build([a(), b()]), build([b(), a()])] {
        let store = oracle.store();
        let decl = oracle.class(oracle.get_type("test.B").unwrap()).unwrap();
        let TypeData::Parameterized { args, .. } = store.ty(decl.field("a").unwrap().ty) else {
            panic!("expected a parameterized type");
        };
        let bound = store.upper_bound(args[0]).unwrap();
        assert_eq!(oracle.display(bound), "test.B");
    }
}

#[test]
fn recursive_bound_resolves() {
    let comparable = class_unit(
        "test/Ordered",
        ClassFileBuilder::new("test/Ordered")
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .signature("<T::Ltest/Ordered<TT;>;>Ljava/lang/Object;"),
    );
    let oracle = build([comparable]);
    let store = oracle.store();

    let decl = oracle.class(oracle.get_type("test.Ordered").unwrap()).unwrap();
    let param = store.type_param(decl.type_params[0]).unwrap();
    assert_eq!(
        param.bounds.iter().map(|ty| oracle.display(*ty)).collect::<Vec<_>>(),
        vec!["test.Ordered<T>"]
    );
}

/// ```java
/// class Outer<T> {
///     class Inner {}
///     Inner self;
/// }
/// ```
fn generic_outer() -> CompilationUnit {
    let outer = class("test/Outer")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
        .inner_class("test/Outer$Inner", Some("test/Outer"), Some("Inner"), 0)
        .field(
            FieldSpec::new(0, "self", "Ltest/Outer$Inner;").signature("Ltest/Outer$Inner;"),
        );
    let inner = ClassFileBuilder::new("test/Outer$Inner")
        .source_file("Outer.java")
        .inner_class("test/Outer$Inner", Some("test/Outer"), Some("Inner"), 0)
        .field(FieldSpec::new(ACC_FINAL | ACC_SYNTHETIC, "this$0", "Ltest/Outer;"))
        .method(MethodSpec::new(0, "<init>", "(Ltest/Outer;)V"));
    unit(
        "test.Outer",
        [("test/Outer", outer.build()), ("test/Outer$Inner", inner.build())],
    )
}

#[test]
fn inner_class_of_generic_class_is_generic() {
    let oracle = build([generic_outer()]);

    let outer = oracle.get_type("test.Outer").unwrap();
    let inner = oracle.class(oracle.get_type("test.Outer.Inner").unwrap()).unwrap();
    assert!(inner.is_generic);
    assert!(inner.type_params.is_empty());
    assert_eq!(
        oracle.store().ty(inner.enclosing_type.unwrap()),
        &TypeData::Class(outer)
    );
}

#[test]
fn inner_type_through_parameterized_outer() {
    let uses = class_unit(
        "test/UsesInner",
        class("test/UsesInner").field(
            FieldSpec::new(ACC_PRIVATE, "inner", "Ltest/Outer$Inner;")
                .signature("Ltest/Outer<Ljava/lang/String;>.Inner;"),
        ),
    );
    let oracle = build([generic_outer(), uses]);
    let store = oracle.store();

    let inner = oracle.get_type("test.Outer.Inner").unwrap();
    let decl = oracle.class(oracle.get_type("test.UsesInner").unwrap()).unwrap();
    let ty = decl.field("inner").unwrap().ty;
    assert_eq!(oracle.display(ty), "test.Outer<java.lang.String>.Inner");
    let TypeData::Parameterized {
        generic,
        enclosing,
        args,
    } = store.ty(ty)
    else {
        panic!("expected a parameterized type");
    };
    assert_eq!(*generic, inner);
    assert!(args.is_empty());
    assert!(enclosing.is_some_and(|enclosing| store.is_parameterized(enclosing)));
}

#[test]
fn binary_inner_name_reconstructs_the_enclosing_parameterization() {
    let oracle = build([generic_outer()]);

    assert_eq!(field_type(&oracle, "test.Outer", "self"), "test.Outer<T>.Inner");
}

#[test]
fn static_member_of_generic_class_sees_raw_enclosing_type() {
    let outer = class("test/Outer")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
        .inner_class("test/Outer$Nested", Some("test/Outer"), Some("Nested"), ACC_STATIC);
    let nested = class("test/Outer$Nested")
        .inner_class("test/Outer$Nested", Some("test/Outer"), Some("Nested"), ACC_STATIC);
    let oracle = build([unit(
        "test.Outer",
        [("test/Outer", outer.build()), ("test/Outer$Nested", nested.build())],
    )]);
    let store = oracle.store();

    let outer = oracle.get_type("test.Outer").unwrap();
    let nested = oracle.class(oracle.get_type("test.Outer.Nested").unwrap()).unwrap();
    assert!(!nested.is_generic);
    assert_eq!(store.ty(nested.enclosing_type.unwrap()), &TypeData::Raw(outer));
}

#[test]
fn method_type_parameter_shadows_class_type_parameter() {
    let shadow = class_unit(
        "test/Shadow",
        class("test/Shadow")
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .method(
                MethodSpec::new(ACC_PUBLIC, "pick", "(Ljava/lang/Number;)Ljava/lang/Object;")
                    .signature("<T:Ljava/lang/Number;>(TT;)TT;"),
            )
            .field(FieldSpec::new(ACC_PRIVATE, "value", "Ljava/lang/Object;").signature("TT;")),
    );
    let oracle = build([shadow]);
    let store = oracle.store();

    let decl = oracle.class(oracle.get_type("test.Shadow").unwrap()).unwrap();
    let class_param = decl.type_params[0];
    let pick = decl.methods_named("pick").next().unwrap();
    let method_param = pick.type_params[0];
    assert_ne!(class_param, method_param);
    assert_eq!(store.ty(pick.return_type), &TypeData::TypeVar(method_param));
    assert_eq!(
        store.ty(decl.field("value").unwrap().ty),
        &TypeData::TypeVar(class_param)
    );
}

#[test]
fn generic_exceptions_come_from_the_signature() {
    let thrower = class_unit(
        "test/Thrower",
        class("test/Thrower")
            .method(
                MethodSpec::new(ACC_PUBLIC, "run", "()V")
                    .signature("<X:Ljava/lang/Object;>()V^TX;")
                    .exception("java/lang/Object"),
            )
            .method(MethodSpec::new(ACC_PUBLIC, "stop", "()V").exception("java/lang/String")),
    );
    let oracle = build([thrower]);

    let decl = oracle.class(oracle.get_type("test.Thrower").unwrap()).unwrap();
    let thrown = |name| {
        decl.methods_named(name)
            .next()
            .unwrap()
            .thrown
            .iter()
            .map(|ty| oracle.display(*ty))
            .collect::<Vec<_>>()
    };
    assert_eq!(thrown("run"), vec!["X"]);
    assert_eq!(thrown("stop"), vec!["java.lang.String"]);
}

#[test]
fn wrong_number_of_type_arguments_is_a_violation() {
    let uses = class_unit(
        "test/UsesBox",
        class("test/UsesBox").field(
            FieldSpec::new(ACC_PRIVATE, "pair", "Ltest/Box;")
                .signature("Ltest/Box<Ljava/lang/String;Ljava/lang/String;>;"),
        ),
    );

    assert_eq!(
        violation([generic_box(), uses]),
        ContractViolation::TypeArgumentArity {
            generic: "test.Box".to_string(),
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn signature_with_different_parameter_count_is_a_violation() {
    let odd = class_unit(
        "test/Odd",
        class("test/Odd").method(
            MethodSpec::new(ACC_PUBLIC, "pair", "(Ljava/lang/Object;)V")
                .signature("<T:Ljava/lang/Object;>(TT;TT;)V"),
        ),
    );

    assert!(matches!(
        violation([odd]),
        ContractViolation::ParameterCountMismatch { method, .. } if method == "pair"
    ));
}

#[test]
fn interface_signature_with_a_superclass_is_a_violation() {
    let shape = class_unit(
        "test/Shape",
        ClassFileBuilder::new("test/Shape")
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .signature("<T:Ljava/lang/Object;>Ljava/lang/String;"),
    );

    assert_eq!(
        violation([shape]),
        ContractViolation::InterfaceSuperclassNotObject {
            class: "test.Shape".to_string(),
            superclass: "java.lang.String".to_string(),
        }
    );
}
