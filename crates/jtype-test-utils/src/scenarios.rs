//! Multi-unit setups for oracle tests.

use jtype_classfile::access::*;
use jtype_classfile::{ClassFileBuilder, ConstValue, FieldSpec, MethodSpec};
use jtype_oracle::CompilationUnit;

use crate::{class, class_unit, unit};

// Constant refresh.

/// `GenericList<T>` with a public compile-time constant.
pub fn generic_list() -> CompilationUnit {
    class_unit(
        "test/GenericList",
        class("test/GenericList")
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .field(
                FieldSpec::new(ACC_PUBLIC | ACC_STATIC | ACC_FINAL, "CONSTANT", "I")
                    .constant(ConstValue::Int(0)),
            )
            .field(FieldSpec::new(ACC_PRIVATE, "head", "Ljava/lang/Object;").signature("TT;"))
            .method(MethodSpec::new(ACC_PUBLIC, "get", "(I)Ljava/lang/Object;").signature("(I)TT;")),
    )
}

/// `ExtendsGenericList extends GenericList<Object>`.
pub fn extends_generic_list() -> CompilationUnit {
    class_unit(
        "test/ExtendsGenericList",
        class("test/ExtendsGenericList")
            .super_class(Some("test/GenericList"))
            .signature("Ltest/GenericList<Ljava/lang/Object;>;"),
    )
}

/// Reads `GenericList.CONSTANT`, which the compiler inlined: no type
/// reference is left in the bytecode.
pub fn references_generic_list_constant() -> CompilationUnit {
    class_unit(
        "test/ReferencesGenericListConstant",
        class("test/ReferencesGenericListConstant")
            .method(MethodSpec::new(ACC_PUBLIC, "value", "()I")),
    )
    .with_constant_ref("test/GenericList")
}

// Error isolation.

/// `Good` has a field of type `WillGoBad`.
pub fn good() -> CompilationUnit {
    class_unit(
        "test/Good",
        class("test/Good").field(FieldSpec::new(ACC_PRIVATE, "bad", "Ltest/WillGoBad;")),
    )
}

pub fn will_go_bad() -> CompilationUnit {
    class_unit("test/WillGoBad", class("test/WillGoBad"))
}

/// `WillGoBad` after an edit that does not compile.
pub fn will_go_bad_broken() -> CompilationUnit {
    will_go_bad().with_problem("Syntax error on token \"}\", delete this token")
}

pub fn unmodified() -> CompilationUnit {
    class_unit("test/Unmodified", class("test/Unmodified"))
}

/// `AnotherGood` has a field of type `Unmodified`.
pub fn another_good() -> CompilationUnit {
    class_unit(
        "test/AnotherGood",
        class("test/AnotherGood").field(FieldSpec::new(
            ACC_PRIVATE,
            "unmodified",
            "Ltest/Unmodified;",
        )),
    )
}

// Member classes.

/// The classes compiled from
///
/// ```java
/// public class Outer {
///     static class Nested {}
///     class Inner {}
///     void make() { new Object() {}; }
/// }
/// ```
pub fn outer_classes() -> Vec<(&'static str, Vec<u8>)> {
    let outer = class("test/Outer")
        .inner_class("test/Outer$Nested", Some("test/Outer"), Some("Nested"), ACC_STATIC)
        .inner_class("test/Outer$Inner", Some("test/Outer"), Some("Inner"), 0)
        .inner_class("test/Outer$1", None, None, 0)
        .method(MethodSpec::new(0, "make", "()V"));

    let nested = ClassFileBuilder::new("test/Outer$Nested")
        .access(ACC_SUPER)
        .source_file("Outer.java")
        .inner_class("test/Outer$Nested", Some("test/Outer"), Some("Nested"), ACC_STATIC)
        .method(MethodSpec::new(0, "<init>", "()V"));

    let inner = ClassFileBuilder::new("test/Outer$Inner")
        .access(ACC_SUPER)
        .source_file("Outer.java")
        .inner_class("test/Outer$Inner", Some("test/Outer"), Some("Inner"), 0)
        .field(FieldSpec::new(ACC_FINAL | ACC_SYNTHETIC, "this$0", "Ltest/Outer;"))
        .method(MethodSpec::new(0, "<init>", "(Ltest/Outer;)V"));

    let anonymous = ClassFileBuilder::new("test/Outer$1")
        .access(ACC_SUPER)
        .source_file("Outer.java")
        .enclosing_method("test/Outer", Some(("make", "()V")))
        .inner_class("test/Outer$1", None, None, 0)
        .field(FieldSpec::new(ACC_FINAL | ACC_SYNTHETIC, "this$0", "Ltest/Outer;"))
        .method(MethodSpec::new(0, "<init>", "(Ltest/Outer;)V"));

    vec![
        ("test/Outer", outer.build()),
        ("test/Outer$Nested", nested.build()),
        ("test/Outer$Inner", inner.build()),
        ("test/Outer$1", anonymous.build()),
    ]
}

pub fn outer() -> CompilationUnit {
    unit("test.Outer", outer_classes())
}

/// The classes compiled from
///
/// ```java
/// public class Top {
///     void m() {
///         class Local {
///             class Member {}
///         }
///     }
/// }
/// ```
pub fn local_member_classes() -> Vec<(&'static str, Vec<u8>)> {
    let top = class("test/Top")
        .inner_class("test/Top$1Local", None, Some("Local"), 0)
        .method(MethodSpec::new(0, "m", "()V"));

    let local = ClassFileBuilder::new("test/Top$1Local")
        .access(ACC_SUPER)
        .source_file("Top.java")
        .enclosing_method("test/Top", Some(("m", "()V")))
        .inner_class("test/Top$1Local", None, Some("Local"), 0)
        .inner_class("test/Top$1Local$Member", Some("test/Top$1Local"), Some("Member"), 0)
        .field(FieldSpec::new(ACC_FINAL | ACC_SYNTHETIC, "this$0", "Ltest/Top;"))
        .method(MethodSpec::new(0, "<init>", "(Ltest/Top;)V"));

    let member = ClassFileBuilder::new("test/Top$1Local$Member")
        .access(ACC_SUPER)
        .source_file("Top.java")
        .inner_class("test/Top$1Local", None, Some("Local"), 0)
        .inner_class("test/Top$1Local$Member", Some("test/Top$1Local"), Some("Member"), 0)
        .field(FieldSpec::new(ACC_FINAL | ACC_SYNTHETIC, "this$1", "Ltest/Top$1Local;"))
        .method(MethodSpec::new(0, "<init>", "(Ltest/Top$1Local;)V"));

    vec![
        ("test/Top", top.build()),
        ("test/Top$1Local", local.build()),
        ("test/Top$1Local$Member", member.build()),
    ]
}

pub fn local_member() -> CompilationUnit {
    unit("test.Top", local_member_classes())
}
