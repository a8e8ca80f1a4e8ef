use jtype_classfile::access::{self, has};
use jtype_classfile::{
    parse_method_descriptor, AnnotationVisitor, ClassVisitor, ConstValue, FieldVisitor,
    MethodVisitor,
};
use jtype_types::ClassKind;

use super::annotation::{AnnotationCollector, AnnotationSink};
use super::member::{FieldCollector, MethodCollector};
use super::{ClassRecord, FieldRecord};
use crate::error::ContractViolation;

const VISIBILITY: u16 = access::ACC_PUBLIC | access::ACC_PRIVATE | access::ACC_PROTECTED;

/// Builds a [`ClassRecord`] from class callbacks.
///
/// The first contract violation is kept and reported by [`finish`]; later
/// callbacks are still accepted so the visit can run to completion.
///
/// [`finish`]: ClassCollector::finish
#[derive(Default)]
pub struct ClassCollector {
    record: ClassRecord,
    violation: Option<ContractViolation>,
    trace: bool,
}

impl ClassCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs every callback at trace level.
    pub fn with_tracing(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn finish(self) -> Result<ClassRecord, ContractViolation> {
        match self.violation {
            Some(violation) => Err(violation),
            None => Ok(self.record),
        }
    }

    fn violate(&mut self, violation: ContractViolation) {
        if self.violation.is_none() {
            self.violation = Some(violation);
        }
    }
}

fn kind_name(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::TopLevel => "top-level",
        ClassKind::Inner => "inner",
        ClassKind::Nested => "nested",
        ClassKind::Anonymous => "anonymous",
        ClassKind::Local => "local",
    }
}

impl ClassVisitor for ClassCollector {
    fn visit(
        &mut self,
        version: u16,
        access: u16,
        name: &str,
        signature: Option<&str>,
        super_name: Option<&str>,
        interfaces: &[String],
    ) {
        if self.trace {
            tracing::trace!(
                target: "jtype::collect",
                version,
                access = format_args!("{access:#06x}"),
                name,
                ?signature,
                ?super_name,
                ?interfaces,
                "visit"
            );
        }
        self.record.name = name.to_string();
        self.record.access = access;
        self.record.signature = signature.map(str::to_string);
        self.record.super_name = super_name.map(str::to_string);
        self.record.interfaces = interfaces.to_vec();
    }

    fn visit_outer_class(&mut self, owner: &str, name: Option<&str>, descriptor: Option<&str>) {
        if self.trace {
            tracing::trace!(target: "jtype::collect", owner, ?name, ?descriptor, "visit_outer_class");
        }
        self.record.outer_class = Some(owner.to_string());
        if let (Some(name), Some(descriptor)) = (name, descriptor) {
            self.record.enclosing_method = Some((name.to_string(), descriptor.to_string()));
        }
        // Refined to Local by the inner-class entry if the class has a name.
        self.record.kind = ClassKind::Anonymous;
    }

    fn visit_annotation(
        &mut self,
        descriptor: &str,
        visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        if self.trace {
            tracing::trace!(target: "jtype::collect", descriptor, visible, "visit_annotation");
        }
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            visible,
            AnnotationSink::List(&mut self.record.annotations),
        )))
    }

    fn visit_inner_class(
        &mut self,
        name: &str,
        outer_name: Option<&str>,
        inner_name: Option<&str>,
        access: u16,
    ) {
        if self.trace {
            tracing::trace!(
                target: "jtype::collect",
                name,
                ?outer_name,
                ?inner_name,
                access = format_args!("{access:#06x}"),
                "visit_inner_class"
            );
        }
        if name != self.record.name {
            return;
        }
        if let Some(outer_name) = outer_name {
            self.record.outer_class = Some(outer_name.to_string());
        }
        // The header cannot express private, protected or static members.
        self.record.access = (self.record.access & !VISIBILITY)
            | (access & (VISIBILITY | access::ACC_STATIC));

        match self.record.kind {
            ClassKind::TopLevel => {
                self.record.kind = if has(access, access::ACC_STATIC) {
                    ClassKind::Nested
                } else {
                    ClassKind::Inner
                };
            }
            ClassKind::Anonymous => {
                if inner_name.is_some() {
                    self.record.kind = ClassKind::Local;
                }
            }
            // Already established by the enclosing-instance field.
            ClassKind::Inner => {}
            kind => self.violate(ContractViolation::IllegalClassKindTransition {
                class: self.record.name.clone(),
                kind: kind_name(kind),
            }),
        }
    }

    fn visit_field(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        value: Option<&ConstValue>,
    ) -> Option<Box<dyn FieldVisitor + '_>> {
        if self.trace {
            tracing::trace!(
                target: "jtype::collect",
                access = format_args!("{access:#06x}"),
                name,
                descriptor,
                ?signature,
                ?value,
                "visit_field"
            );
        }
        if has(access, access::ACC_SYNTHETIC) {
            if name.starts_with("this$") && self.record.kind == ClassKind::TopLevel {
                self.record.kind = ClassKind::Inner;
            }
            return None;
        }
        let record = FieldRecord {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: signature.map(str::to_string),
            constant: value.cloned(),
            annotations: Vec::new(),
        };
        Some(Box::new(FieldCollector::new(record, &mut self.record.fields)))
    }

    fn visit_method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        exceptions: &[String],
    ) -> Option<Box<dyn MethodVisitor + '_>> {
        if self.trace {
            tracing::trace!(
                target: "jtype::collect",
                access = format_args!("{access:#06x}"),
                name,
                descriptor,
                ?signature,
                ?exceptions,
                "visit_method"
            );
        }
        if has(access, access::ACC_SYNTHETIC) {
            return None;
        }
        let Ok(parsed) = parse_method_descriptor(descriptor) else {
            self.violate(ContractViolation::InvalidDescriptor {
                class: self.record.name.clone(),
                descriptor: descriptor.to_string(),
            });
            return None;
        };

        let strip_hidden = name == "<init>" && self.record.kind.has_hidden_constructor_arg();
        if strip_hidden && parsed.params.is_empty() {
            self.violate(ContractViolation::MissingHiddenConstructorArg {
                class: self.record.name.clone(),
                descriptor: descriptor.to_string(),
            });
            return None;
        }

        Some(Box::new(MethodCollector::new(
            access,
            name,
            descriptor,
            signature,
            exceptions,
            parsed,
            strip_hidden,
            &mut self.record.methods,
        )))
    }

    fn visit_source(&mut self, source: &str) {
        if self.trace {
            tracing::trace!(target: "jtype::collect", source, "visit_source");
        }
        self.record.source_file = Some(source.to_string());
    }

    fn visit_end(&mut self) {
        if self.trace {
            tracing::trace!(
                target: "jtype::collect",
                name = %self.record.name,
                kind = kind_name(self.record.kind),
                "visit_end"
            );
        }
    }
}
