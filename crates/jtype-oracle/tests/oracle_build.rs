use jtype_classfile::access::*;
use jtype_classfile::{
    AnnotationSpec, ClassFileBuilder, ConstValue, ElementValue, FieldSpec, MethodSpec,
};
use jtype_oracle::{
    BuildReport, CompilationUnit, ContractViolation, NotFound, OracleError, TypeOracle, UnitStatus,
};
use jtype_test_utils::{class, class_unit, init_tracing, jdk, scenarios};
use jtype_types::{AnnotationValue, ClassKind, DeclKind, Severity};

use pretty_assertions::assert_eq;

fn build(units: impl IntoIterator<Item = CompilationUnit>) -> (TypeOracle, BuildReport) {
    init_tracing();
    let mut oracle = TypeOracle::new();
    oracle.add_units(jdk::all());
    oracle.add_units(units);
    let report = oracle.build().unwrap();
    (oracle, report)
}

fn names(oracle: &TypeOracle, ids: &[jtype_types::ClassId]) -> Vec<String> {
    ids.iter()
        .map(|id| oracle.class(*id).unwrap().qualified_name.clone())
        .collect()
}

fn annotation_type(name: &str) -> ClassFileBuilder {
    ClassFileBuilder::new(name)
        .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
        .interface("java/lang/annotation/Annotation")
}

fn color() -> CompilationUnit {
    let constant = |name| {
        FieldSpec::new(ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM, name, "Ltest/Color;")
    };
    class_unit(
        "test/Color",
        ClassFileBuilder::new("test/Color")
            .access(ACC_PUBLIC | ACC_FINAL | ACC_SUPER | ACC_ENUM)
            .super_class(Some("java/lang/Enum"))
            .signature("Ljava/lang/Enum<Ltest/Color;>;")
            .field(constant("RED"))
            .field(constant("GREEN"))
            .field(FieldSpec::new(
                ACC_PRIVATE | ACC_STATIC | ACC_FINAL | ACC_SYNTHETIC,
                "$VALUES",
                "[Ltest/Color;",
            ))
            .method(MethodSpec::new(ACC_PRIVATE, "<init>", "(Ljava/lang/String;I)V"))
            .method(MethodSpec::new(ACC_STATIC, "<clinit>", "()V"))
            .method(MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "values", "()[Ltest/Color;")),
    )
}

#[test]
fn java_lang_object_is_published() {
    let (oracle, report) = build([]);

    let object = oracle.java_lang_object().unwrap();
    assert_eq!(oracle.get_type("java.lang.Object"), Ok(object));
    assert_eq!(oracle.class(object).unwrap().super_class, None);
    assert!(report.pruned.is_empty());
    assert_eq!(report.errors().count(), 0);
}

#[test]
fn unknown_type_is_not_found() {
    let (oracle, _) = build([]);

    assert_eq!(
        oracle.get_type("test.Missing"),
        Err(NotFound {
            name: "test.Missing".to_string()
        })
    );
    assert_eq!(oracle.find_type("test.Missing"), None);
}

#[test]
fn member_types_are_published_under_their_enclosing_type() {
    let (oracle, report) = build([scenarios::outer()]);
    assert_eq!(oracle.unit_status("test.Outer"), Some(&UnitStatus::Valid));
    assert_eq!(report.errors().count(), 0);

    let outer = oracle.get_type("test.Outer").unwrap();
    let nested = oracle.get_type("test.Outer.Nested").unwrap();
    let inner = oracle.get_type("test.Outer.Inner").unwrap();
    assert_eq!(oracle.nested_types(outer), &[nested, inner]);
    assert_eq!(
        names(&oracle, oracle.unit_types("test.Outer")),
        vec!["test.Outer", "test.Outer.Nested", "test.Outer.Inner"]
    );

    let nested_decl = oracle.class(nested).unwrap();
    assert_eq!(nested_decl.nesting, ClassKind::Nested);
    assert_eq!(nested_decl.enclosing, Some(outer));
    assert!(nested_decl.modifiers.is_static());

    let inner_decl = oracle.class(inner).unwrap();
    assert_eq!(inner_decl.nesting, ClassKind::Inner);
    assert_eq!(inner_decl.simple_name, "Inner");
    assert!(!inner_decl.modifiers.is_static());
    assert!(inner_decl.fields.is_empty());
}

#[test]
fn anonymous_classes_are_left_out() {
    let (oracle, _) = build([scenarios::outer()]);

    assert_eq!(oracle.find_by_internal_name("test/Outer$1"), None);
    assert!(oracle
        .types()
        .into_iter()
        .all(|id| !oracle.class(id).unwrap().internal_name.contains("$1")));
}

#[test]
fn member_of_a_local_class_is_left_out_with_it() {
    let (oracle, report) = build([scenarios::local_member()]);

    assert_eq!(oracle.unit_status("test.Top"), Some(&UnitStatus::Valid));
    assert!(oracle.find_type("test.Top").is_some());
    assert_eq!(oracle.find_by_internal_name("test/Top$1Local"), None);
    assert_eq!(oracle.find_by_internal_name("test/Top$1Local$Member"), None);
    assert!(report.pruned.is_empty());
    assert_eq!(report.errors().count(), 0);
}

#[test]
fn inner_constructor_hides_the_enclosing_instance() {
    let (oracle, _) = build([scenarios::outer()]);

    let inner = oracle.class(oracle.get_type("test.Outer.Inner").unwrap()).unwrap();
    assert_eq!(inner.constructors.len(), 1);
    let constructor = &inner.constructors[0];
    assert_eq!(constructor.name, "Inner");
    assert_eq!(constructor.descriptor, "(Ltest/Outer;)V");
    assert!(constructor.params.is_empty());
    assert!(inner.methods.is_empty());
}

#[test]
fn types_are_ordered_by_qualified_name() {
    let (oracle, _) = build([scenarios::unmodified(), scenarios::another_good()]);

    let names = names(&oracle, &oracle.types());
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"test.AnotherGood".to_string()));
}

#[test]
fn members_resolve_against_published_types() {
    let (oracle, _) = build([scenarios::unmodified(), scenarios::another_good()]);
    let store = oracle.store();

    let unmodified = oracle.get_type("test.Unmodified").unwrap();
    let another = oracle.class(oracle.get_type("test.AnotherGood").unwrap()).unwrap();
    let field = another.field("unmodified").unwrap();
    assert_eq!(store.class_of(field.ty), Some(unmodified));
    assert!(field.modifiers.is_private());
    assert_eq!(oracle.display(field.ty), "test.Unmodified");
    assert_eq!(
        another.super_class.and_then(|ty| store.class_of(ty)),
        oracle.java_lang_object()
    );
}

#[test]
fn enum_constants_carry_their_ordinals() {
    let (oracle, report) = build([color()]);
    assert_eq!(report.errors().count(), 0);

    let color = oracle.get_type("test.Color").unwrap();
    let decl = oracle.class(color).unwrap();
    assert_eq!(decl.kind, DeclKind::Enum);
    assert!(decl.type_params.is_empty());
    assert!(decl.constructors.is_empty());

    let fields: Vec<_> = decl
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.enum_ordinal))
        .collect();
    assert_eq!(fields, vec![("RED", Some(0)), ("GREEN", Some(1))]);

    let methods: Vec<_> = decl.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["values"]);

    let super_class = decl.super_class.unwrap();
    assert_eq!(oracle.display(super_class), "java.lang.Enum<test.Color>");
}

#[test]
fn interface_members_get_implicit_modifiers() {
    let shape = class_unit(
        "test/Shape",
        ClassFileBuilder::new("test/Shape")
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .field(
                FieldSpec::new(ACC_PUBLIC | ACC_STATIC | ACC_FINAL, "SIDES", "I")
                    .constant(ConstValue::Int(4)),
            )
            .method(MethodSpec::new(ACC_PUBLIC | ACC_ABSTRACT, "area", "()D"))
            .method(MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "unit", "()Ltest/Shape;")),
    );
    let (oracle, _) = build([shape]);

    let decl = oracle.class(oracle.get_type("test.Shape").unwrap()).unwrap();
    assert_eq!(decl.kind, DeclKind::Interface);
    assert!(decl.modifiers.is_abstract());
    assert_eq!(decl.super_class, None);

    let area = decl.methods_named("area").next().unwrap();
    assert!(area.modifiers.is_public() && area.modifiers.is_abstract());
    let unit = decl.methods_named("unit").next().unwrap();
    assert!(unit.modifiers.is_static() && !unit.modifiers.is_abstract());

    let sides = decl.field("SIDES").unwrap();
    assert!(sides.modifiers.is_static() && sides.modifiers.is_final());
    assert_eq!(sides.constant, Some(ConstValue::Int(4)));
}

#[test]
fn parameter_names_come_from_debug_info_then_source() {
    let mut counter = class_unit(
        "test/Counter",
        class("test/Counter")
            .method(
                MethodSpec::new(ACC_PUBLIC, "put", "(JLjava/lang/String;)V")
                    .local_variable("this", "Ltest/Counter;", 0)
                    .local_variable("key", "J", 1)
                    .local_variable("value", "Ljava/lang/String;", 3),
            )
            .method(MethodSpec::new(ACC_PUBLIC, "add", "(I)V"))
            .method(MethodSpec::new(ACC_PUBLIC, "remove", "(I)V")),
    );
    counter
        .method_args
        .insert("test.Counter", "add", "(I)V", vec!["count".to_string()]);
    let (oracle, _) = build([counter]);

    let decl = oracle.class(oracle.get_type("test.Counter").unwrap()).unwrap();
    let params = |name| {
        let method = decl.methods_named(name).next().unwrap();
        let names: Vec<_> = method.params.iter().map(|p| p.name.clone()).collect();
        (names, method.real_param_names)
    };
    assert_eq!(params("put"), (vec!["key".to_string(), "value".to_string()], true));
    assert_eq!(params("add"), (vec!["count".to_string()], true));
    assert_eq!(params("remove"), (vec!["arg0".to_string()], false));
}

#[test]
fn annotations_resolve_values() {
    let level = class_unit(
        "test/Level",
        ClassFileBuilder::new("test/Level")
            .access(ACC_PUBLIC | ACC_FINAL | ACC_SUPER | ACC_ENUM)
            .super_class(Some("java/lang/Enum"))
            .signature("Ljava/lang/Enum<Ltest/Level;>;")
            .field(FieldSpec::new(
                ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM,
                "HIGH",
                "Ltest/Level;",
            )),
    );
    let level_high = || ElementValue::Enum {
        type_descriptor: "Ltest/Level;".to_string(),
        const_name: "HIGH".to_string(),
    };
    let config = class_unit(
        "test/Config",
        annotation_type("test/Config")
            .method(MethodSpec::new(
                ACC_PUBLIC | ACC_ABSTRACT,
                "name",
                "()Ljava/lang/String;",
            ))
            .method(
                MethodSpec::new(ACC_PUBLIC | ACC_ABSTRACT, "level", "()Ltest/Level;")
                    .annotation_default(level_high()),
            )
            .method(
                MethodSpec::new(ACC_PUBLIC | ACC_ABSTRACT, "type", "()Ljava/lang/Class;")
                    .signature("()Ljava/lang/Class<*>;"),
            ),
    );
    let configured = class_unit(
        "test/Configured",
        class("test/Configured").annotation(
            AnnotationSpec::new("Ltest/Config;")
                .element("name", ElementValue::Const(ConstValue::String("main".to_string())))
                .element("level", level_high())
                .element("type", ElementValue::Class("Ljava/lang/String;".to_string()))
                .build(),
        ),
    );
    let (oracle, report) = build([level, config, configured]);
    assert_eq!(report.errors().count(), 0);
    let store = oracle.store();

    let level = oracle.get_type("test.Level").unwrap();
    let config = oracle.get_type("test.Config").unwrap();
    let string = oracle.get_type("java.lang.String").unwrap();

    let config_decl = oracle.class(config).unwrap();
    assert_eq!(config_decl.kind, DeclKind::Annotation);
    let default = config_decl
        .methods_named("level")
        .next()
        .and_then(|method| method.default_value.clone());
    assert!(matches!(
        default,
        Some(AnnotationValue::Enum { enum_type, ref constant })
            if store.class_of(enum_type) == Some(level) && constant == "HIGH"
    ));

    let decl = oracle.class(oracle.get_type("test.Configured").unwrap()).unwrap();
    assert_eq!(decl.annotations.len(), 1);
    let annotation = &decl.annotations[0];
    assert_eq!(store.class_of(annotation.annotation_type), Some(config));
    assert_eq!(
        annotation.value("name"),
        Some(&AnnotationValue::Const(ConstValue::String("main".to_string())))
    );
    assert!(matches!(
        annotation.value("level"),
        Some(AnnotationValue::Enum { enum_type, constant })
            if store.class_of(*enum_type) == Some(level) && constant == "HIGH"
    ));
    assert!(matches!(
        annotation.value("type"),
        Some(AnnotationValue::Class(ty)) if store.class_of(*ty) == Some(string)
    ));
}

#[test]
fn package_info_annotates_its_package() {
    let marker = class_unit("test/Marker", annotation_type("test/Marker"));
    let package_info = class_unit(
        "test/package-info",
        ClassFileBuilder::new("test/package-info")
            .access(ACC_INTERFACE | ACC_ABSTRACT | ACC_SYNTHETIC)
            .annotation(AnnotationSpec::new("Ltest/Marker;").build()),
    );
    let (oracle, _) = build([marker, package_info]);

    assert_eq!(oracle.find_type("test.package-info"), None);
    let marker = oracle.get_type("test.Marker").unwrap();
    let package = oracle.find_package("test").unwrap();
    assert_eq!(package.annotations.len(), 1);
    assert_eq!(
        oracle.store().class_of(package.annotations[0].annotation_type),
        Some(marker)
    );
}

#[test]
fn unresolvable_annotations_are_dropped() {
    let not_null = || AnnotationSpec::new("Ljavax/validation/constraints/NotNull;").build();
    let first = class_unit("test/First", class("test/First").annotation(not_null()));
    let second = class_unit("test/Second", class("test/Second").annotation(not_null()));
    let third = class_unit(
        "test/Third",
        class("test/Third").annotation(AnnotationSpec::new("Lother/Missing;").build()),
    );
    let (oracle, report) = build([first, second, third]);

    for name in ["test.First", "test.Second", "test.Third"] {
        let decl = oracle.class(oracle.get_type(name).unwrap()).unwrap();
        assert!(decl.annotations.is_empty(), "{name}");
    }

    let messages = |severity| -> Vec<String> {
        report
            .diagnostics
            .iter()
            .filter(|d| d.code == "unresolved-annotation" && d.severity == severity)
            .map(|d| d.message.clone())
            .collect()
    };
    assert_eq!(
        messages(Severity::Warning),
        vec![
            "Detected warnings related to 'javax.validation.*'. Is the jar providing it on the classpath?"
                .to_string(),
            "Ignoring unresolvable annotation type other.Missing".to_string(),
        ]
    );
    assert_eq!(
        messages(Severity::Debug),
        vec![
            "Ignoring unresolvable annotation type javax.validation.constraints.NotNull".to_string();
            2
        ]
    );
}

#[test]
fn malformed_field_signature_falls_back_to_descriptor() {
    let unit = class_unit(
        "test/Sloppy",
        class("test/Sloppy").field(
            FieldSpec::new(ACC_PRIVATE, "name", "Ljava/lang/String;").signature("Ljava/lang/String"),
        ),
    );
    let (oracle, report) = build([unit]);

    let decl = oracle.class(oracle.get_type("test.Sloppy").unwrap()).unwrap();
    assert_eq!(oracle.display(decl.field("name").unwrap().ty), "java.lang.String");
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.code == "invalid-signature" && d.severity == Severity::Warning));
}

#[test]
fn missing_supertype_prunes_the_unit_and_its_dependents() {
    let orphan = class_unit(
        "test/Orphan",
        class("test/Orphan").super_class(Some("test/Missing")),
    );
    let user = class_unit(
        "test/OrphanUser",
        class("test/OrphanUser").field(FieldSpec::new(ACC_PRIVATE, "orphan", "Ltest/Orphan;")),
    );
    let (oracle, report) = build([orphan, user, scenarios::unmodified()]);

    assert_eq!(oracle.find_type("test.Orphan"), None);
    assert_eq!(oracle.find_type("test.OrphanUser"), None);
    assert!(oracle.find_type("test.Unmodified").is_some());

    assert_eq!(
        oracle.unit_status("test.Orphan"),
        Some(&UnitStatus::Invalid {
            reason: "references unavailable type test.Missing".to_string()
        })
    );
    assert_eq!(
        oracle.unit_status("test.OrphanUser"),
        Some(&UnitStatus::Invalid {
            reason: "references unavailable type test.Orphan".to_string()
        })
    );
    assert!(report.is_pruned("test.Orphan"));
    let pruned = report
        .errors()
        .find(|d| d.code == "pruned-unit" && d.location.as_deref() == Some("test/Orphan.java"))
        .unwrap();
    assert_eq!(pruned.message, "Removing test.Orphan from the type oracle");
}

#[test]
fn unit_with_problems_is_never_published() {
    let (oracle, report) = build([scenarios::will_go_bad_broken()]);

    assert_eq!(oracle.find_type("test.WillGoBad"), None);
    assert!(report.is_pruned("test.WillGoBad"));
    assert!(!oracle.unit_status("test.WillGoBad").unwrap().is_valid());
}

#[test]
fn unreadable_class_file_prunes_its_unit() {
    let broken = CompilationUnit::new("test.Garbage", "test/Garbage.java")
        .with_class("test/Garbage", vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00]);
    let (oracle, report) = build([broken, scenarios::unmodified()]);

    assert_eq!(oracle.find_type("test.Garbage"), None);
    assert!(report.is_pruned("test.Garbage"));
    assert!(oracle.find_type("test.Unmodified").is_some());
}

#[test]
fn contract_violation_aborts_without_touching_the_graph() {
    let (mut oracle, _) = build([scenarios::unmodified()]);
    let unmodified = oracle.get_type("test.Unmodified").unwrap();

    let broken_inner = scenarios::outer_classes()
        .into_iter()
        .map(|(name, bytes)| match name {
            "test/Outer$Inner" => (
                name,
                ClassFileBuilder::new(name)
                    .inner_class(name, Some("test/Outer"), Some("Inner"), 0)
                    .method(MethodSpec::new(0, "<init>", "()V"))
                    .build(),
            ),
            _ => (name, bytes),
        });
    oracle.add_unit(jtype_test_utils::unit("test.Outer", broken_inner));

    for _ in 0..2 {
        let err = oracle.build().unwrap_err();
        match err {
            OracleError::Contract {
                location,
                violation,
            } => {
                assert_eq!(location, "test/Outer.java");
                assert_eq!(
                    violation,
                    ContractViolation::MissingHiddenConstructorArg {
                        class: "test/Outer$Inner".to_string(),
                        descriptor: "()V".to_string(),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(oracle.find_type("test.Outer"), None);
        assert_eq!(oracle.find_type("test.Unmodified"), Some(unmodified));
        assert_eq!(oracle.unit_status("test.Outer"), None);
    }
}

#[test]
fn building_without_java_lang_object_prunes_everything() {
    init_tracing();
    let mut oracle = TypeOracle::new();
    oracle.add_unit(scenarios::unmodified());
    let report = oracle.build().unwrap();

    assert_eq!(oracle.find_type("test.Unmodified"), None);
    assert!(report.is_pruned("test.Unmodified"));
}
