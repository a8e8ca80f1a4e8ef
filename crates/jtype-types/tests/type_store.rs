use jtype_types::{
    ClassDecl, ClassKind, DeclKind, Modifiers, PrimitiveType, StoreGcReport, TypeData, TypeId,
    TypeStore, WildcardKind,
};

use pretty_assertions::assert_eq;

fn class(store: &mut TypeStore, name: &str, kind: DeclKind) -> jtype_types::ClassId {
    store.add_class(ClassDecl::shell(name, kind, ClassKind::TopLevel, Modifiers::default()))
}

fn with_object() -> (TypeStore, jtype_types::ClassId) {
    let mut store = TypeStore::new();
    let object = class(&mut store, "java/lang/Object", DeclKind::Class);
    (store, object)
}

#[test]
fn primitives_have_reserved_ids() {
    let store = TypeStore::new();
    assert_eq!(store.primitive(PrimitiveType::Int), TypeId::INT);
    assert_eq!(store.primitive(PrimitiveType::Void), TypeId::VOID);
    assert_eq!(store.ty(TypeId::LONG), &TypeData::Primitive(PrimitiveType::Long));
    assert!(TypeId::DOUBLE.is_primitive());
}

#[test]
fn structural_requests_are_interned() {
    let (mut store, object) = with_object();
    let list = class(&mut store, "java/util/List", DeclKind::Interface);
    store.class_mut(list).unwrap().is_generic = true;

    let object_ty = store.class_type(object);
    let a = store.parameterized(list, None, vec![object_ty]);
    let b = store.parameterized(list, None, vec![object_ty]);
    assert_eq!(a, b);

    let wildcard = store.wildcard(WildcardKind::Extends, object_ty);
    assert_ne!(store.parameterized(list, None, vec![wildcard]), a);

    let two_dims = store.array_of_depth(a, 2);
    let one_dim = store.array_of(a);
    assert_eq!(store.array_of(one_dim), two_dims);
    assert_eq!(store.array_element(two_dims), (a, 2));

    let raw_list = store.raw_type(list);
    assert_eq!(store.ty(raw_list), &TypeData::Raw(list));
    assert_eq!(store.raw_type(object), object_ty);
}

#[test]
fn redefined_class_gets_fresh_identity() {
    let (mut store, _) = with_object();
    let first = class(&mut store, "com/example/Foo", DeclKind::Class);
    store.remove_class(first);
    assert_eq!(store.lookup("com/example/Foo"), None);

    let second = class(&mut store, "com/example/Foo", DeclKind::Class);
    assert_ne!(first, second);
    assert_eq!(store.lookup("com/example/Foo"), Some(second));
    assert!(store.class(first).is_none());
    assert_eq!(store.classes().count(), 2);
}

#[test]
fn shell_names() {
    let decl = ClassDecl::shell(
        "com/example/Outer$Inner",
        DeclKind::Class,
        ClassKind::Inner,
        Modifiers::default(),
    );
    assert_eq!(decl.qualified_name, "com.example.Outer.Inner");
    assert_eq!(decl.package, "com.example");
    assert_eq!(decl.simple_name, "Inner");
    assert!(ClassKind::Inner.has_hidden_constructor_arg());
    assert!(ClassKind::Local.has_no_external_name());
    assert!(!ClassKind::Nested.has_no_external_name());
}

#[test]
fn display_renders_java_source_names() {
    let (mut store, object) = with_object();
    let map = class(&mut store, "java/util/Map", DeclKind::Interface);
    let k = store.add_type_param("K", map);
    let v = store.add_type_param("V", map);
    {
        let decl = store.class_mut(map).unwrap();
        decl.type_params = vec![k, v];
        decl.is_generic = true;
    }
    let k_ty = store.type_var(k);
    let v_ty = store.type_var(v);
    let extends_v = store.wildcard(WildcardKind::Extends, v_ty);
    let ty = store.parameterized(map, None, vec![k_ty, extends_v]);
    let array = store.array_of(ty);
    assert_eq!(store.display(array), "java.util.Map<K, ? extends V>[]");

    let object_ty = store.class_type(object);
    let unbound = store.wildcard(WildcardKind::Unbound, object_ty);
    let super_int = store.wildcard(WildcardKind::Super, object_ty);
    let ty = store.parameterized(map, None, vec![unbound, super_int]);
    assert_eq!(store.display(ty), "java.util.Map<?, ? super java.lang.Object>");
    assert_eq!(store.display(TypeId::BOOLEAN), "boolean");
}

#[test]
fn assignability_follows_the_class_graph() {
    let (mut store, object) = with_object();
    let object_ty = store.class_type(object);
    let number = class(&mut store, "java/lang/Number", DeclKind::Class);
    let comparable = class(&mut store, "java/lang/Comparable", DeclKind::Interface);
    let integer = class(&mut store, "java/lang/Integer", DeclKind::Class);
    let number_ty = store.class_type(number);
    let comparable_ty = store.class_type(comparable);
    {
        let decl = store.class_mut(integer).unwrap();
        decl.super_class = Some(number_ty);
        decl.interfaces = vec![comparable_ty];
    }
    let integer_ty = store.class_type(integer);

    assert!(store.is_subclass(integer, comparable));
    assert!(store.is_assignable(integer_ty, number_ty));
    assert!(!store.is_assignable(number_ty, integer_ty));

    let integers = store.array_of(integer_ty);
    let numbers = store.array_of(number_ty);
    assert!(store.is_assignable(integers, numbers));
    assert!(store.is_assignable(integers, object_ty));
    assert!(!store.is_assignable(numbers, integers));

    let ints = store.array_of(TypeId::INT);
    let longs = store.array_of(TypeId::LONG);
    assert!(!store.is_assignable(ints, longs));
    assert!(!store.is_assignable(TypeId::INT, object_ty));
}

#[test]
fn garbage_collection_frees_what_removed_classes_used() {
    let (mut store, object) = with_object();
    let object_ty = store.class_type(object);
    let list = class(&mut store, "java/util/List", DeclKind::Interface);
    let element = store.add_type_param("E", list);
    store.type_param_mut(element).unwrap().bounds = vec![object_ty];
    let decl = store.class_mut(list).unwrap();
    decl.is_generic = true;
    decl.type_params = vec![element];

    let holder = class(&mut store, "test/Holder", DeclKind::Class);
    let list_of_object = store.parameterized(list, None, vec![object_ty]);
    store.class_mut(holder).unwrap().interfaces = vec![list_of_object];
    let orphan = store.array_of(list_of_object);
    assert!(orphan > list_of_object);

    store.remove_class(holder);
    let report = store.collect_garbage();
    assert_eq!(
        report,
        StoreGcReport {
            freed_types: 2,
            freed_type_params: 0,
            live_types: 10,
            live_type_params: 1,
        }
    );
    assert_eq!(store.ty(object_ty), &TypeData::Class(object));
    assert_eq!(store.array_of(object_ty), list_of_object);

    store.remove_class(list);
    let report = store.collect_garbage();
    assert_eq!(
        report,
        StoreGcReport {
            freed_types: 2,
            freed_type_params: 1,
            live_types: 9,
            live_type_params: 0,
        }
    );
    assert_eq!(store.type_param(element), None);
    assert_eq!(store.class_type(object), object_ty);
}
