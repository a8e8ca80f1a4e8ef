//! Minimal `java.lang` classes.

use jtype_classfile::access::*;
use jtype_classfile::{ClassFileBuilder, MethodSpec};
use jtype_oracle::CompilationUnit;

use crate::{class, class_unit};

pub fn object() -> CompilationUnit {
    class_unit(
        "java/lang/Object",
        class("java/lang/Object")
            .super_class(None)
            .method(MethodSpec::new(ACC_PUBLIC, "equals", "(Ljava/lang/Object;)Z"))
            .method(MethodSpec::new(ACC_PUBLIC, "hashCode", "()I")),
    )
}

pub fn string() -> CompilationUnit {
    class_unit(
        "java/lang/String",
        class("java/lang/String")
            .access(ACC_PUBLIC | ACC_FINAL | ACC_SUPER)
            .method(MethodSpec::new(ACC_PUBLIC, "length", "()I")),
    )
}

pub fn class_type() -> CompilationUnit {
    class_unit(
        "java/lang/Class",
        class("java/lang/Class")
            .access(ACC_PUBLIC | ACC_FINAL | ACC_SUPER)
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .method(MethodSpec::new(ACC_PUBLIC, "getName", "()Ljava/lang/String;")),
    )
}

pub fn number() -> CompilationUnit {
    class_unit(
        "java/lang/Number",
        class("java/lang/Number")
            .access(ACC_PUBLIC | ACC_ABSTRACT | ACC_SUPER)
            .method(MethodSpec::new(ACC_PUBLIC | ACC_ABSTRACT, "intValue", "()I")),
    )
}

pub fn enum_base() -> CompilationUnit {
    class_unit(
        "java/lang/Enum",
        ClassFileBuilder::new("java/lang/Enum")
            .access(ACC_PUBLIC | ACC_ABSTRACT | ACC_SUPER)
            .source_file("Enum.java")
            .signature("<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;")
            .method(MethodSpec::new(ACC_PROTECTED, "<init>", "(Ljava/lang/String;I)V"))
            .method(MethodSpec::new(ACC_PUBLIC | ACC_FINAL, "ordinal", "()I"))
            .method(MethodSpec::new(ACC_PUBLIC | ACC_FINAL, "name", "()Ljava/lang/String;")),
    )
}

pub fn annotation() -> CompilationUnit {
    class_unit(
        "java/lang/annotation/Annotation",
        ClassFileBuilder::new("java/lang/annotation/Annotation")
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .source_file("Annotation.java"),
    )
}

/// Every class of this module.
pub fn all() -> Vec<CompilationUnit> {
    vec![object(), string(), class_type(), number(), enum_base(), annotation()]
}
