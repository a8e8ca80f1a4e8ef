//! Collectors that flatten one class file into a [`ClassRecord`].
//!
//! The records are language-agnostic: names are internal names and types are
//! descriptors or raw signature text. Resolution happens later, once every
//! class of a build has been collected.

mod annotation;
mod class;
mod member;
mod references;
mod type_params;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use jtype_classfile::{ClassFile, ConstValue, FieldType, ReturnType};
use jtype_types::ClassKind;

use crate::error::ContractViolation;

pub use self::class::ClassCollector;
pub use self::references::ReferenceCollector;
pub use self::type_params::formal_type_params;

#[derive(Clone, Debug, PartialEq)]
pub struct ClassRecord {
    pub name: String,
    pub access: u16,
    pub signature: Option<String>,
    /// `None` only for `java/lang/Object`.
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub kind: ClassKind,
    pub outer_class: Option<String>,
    /// Method (name, descriptor) an anonymous or local class is declared in.
    pub enclosing_method: Option<(String, String)>,
    pub annotations: Vec<AnnotationRecord>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
}

impl Default for ClassRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            access: 0,
            signature: None,
            super_name: None,
            interfaces: Vec::new(),
            source_file: None,
            kind: ClassKind::TopLevel,
            outer_class: None,
            enclosing_method: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}

impl ClassRecord {
    pub fn has_no_external_name(&self) -> bool {
        self.kind.has_no_external_name()
    }

    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldRecord {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant: Option<ConstValue>,
    pub annotations: Vec<AnnotationRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodRecord {
    pub access: u16,
    pub name: String,
    /// Erased descriptor exactly as found in the class file.
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotations: Vec<AnnotationRecord>,
    /// Parameter types with any hidden enclosing-instance argument removed.
    pub arg_types: Vec<FieldType>,
    pub return_type: ReturnType,
    /// `argN` unless debug info supplied real names.
    pub arg_names: Vec<String>,
    pub actual_arg_names: bool,
    /// Aligned with `arg_types`.
    pub arg_annotations: Vec<Vec<AnnotationRecord>>,
    pub annotation_default: Option<AnnotationValueRecord>,
}

impl Default for MethodRecord {
    fn default() -> Self {
        Self {
            access: 0,
            name: String::new(),
            descriptor: String::new(),
            signature: None,
            exceptions: Vec::new(),
            annotations: Vec::new(),
            arg_types: Vec::new(),
            return_type: ReturnType::Void,
            arg_names: Vec::new(),
            actual_arg_names: false,
            arg_annotations: Vec::new(),
            annotation_default: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationRecord {
    pub descriptor: String,
    pub visible: bool,
    pub values: IndexMap<String, AnnotationValueRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationValueRecord {
    Const(ConstValue),
    /// Descriptor of a class literal.
    Class(String),
    Enum { descriptor: String, name: String },
    Annotation(Box<AnnotationRecord>),
    Array(Vec<AnnotationValueRecord>),
}

/// Flattens `class` into a record.
pub fn collect_class(class: &ClassFile) -> Result<ClassRecord, ContractViolation> {
    let mut collector = ClassCollector::new();
    class.accept(&mut collector);
    collector.finish()
}

/// Every internal name `class` depends on, excluding annotation types.
pub fn collect_references(class: &ClassFile) -> BTreeSet<String> {
    let mut collector = ReferenceCollector::default();
    class.accept(&mut collector);
    collector.finish()
}
