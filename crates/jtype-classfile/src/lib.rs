//! Byte-level access to compiled Java classes.
//!
//! [`ClassFile::parse`] decodes the subset of the class-file format that type
//! modelling needs, and [`ClassFile::accept`] replays it as a stream of visitor
//! callbacks. Generic signatures are walked with [`SignatureReader`].
//! [`ClassFileBuilder`] goes the other way and synthesizes class files.

#![forbid(unsafe_code)]

pub mod access;
mod annotation;
mod classfile;
mod constant_pool;
mod descriptor;
mod error;
mod reader;
mod signature;
mod visitor;
mod writer;

pub use crate::annotation::{Annotation, ConstValue, ElementValue};
pub use crate::classfile::{
    ClassFile, EnclosingMethod, FieldInfo, InnerClassInfo, LocalVariable, MethodInfo,
    ParameterAnnotations,
};
pub use crate::descriptor::{
    descriptor_to_internal_name, parse_field_descriptor, parse_method_descriptor,
};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::signature::{IgnoreSignature, SignatureReader, SignatureVisitor, TypeArgKind};
pub use crate::visitor::{AnnotationVisitor, ClassVisitor, FieldVisitor, MethodVisitor};
pub use crate::writer::{AnnotationSpec, ClassFileBuilder, FieldSpec, MethodSpec};
