//! Callback protocol for walking a parsed class.
//!
//! Every method has a no-op default so implementors override only what they
//! consume. Methods that descend into a nested structure return an optional
//! child visitor; returning `None` skips that structure. A child borrows its
//! parent, so it can hand its result back when `visit_end` runs.

use crate::annotation::{Annotation, ConstValue, ElementValue};
use crate::classfile::{ClassFile, FieldInfo, MethodInfo};

pub trait ClassVisitor {
    fn visit(
        &mut self,
        _version: u16,
        _access: u16,
        _name: &str,
        _signature: Option<&str>,
        _super_name: Option<&str>,
        _interfaces: &[String],
    ) {
    }

    /// Called when the class is declared inside a method or initializer.
    fn visit_outer_class(&mut self, _owner: &str, _name: Option<&str>, _descriptor: Option<&str>) {}

    fn visit_annotation(
        &mut self,
        _descriptor: &str,
        _visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_inner_class(
        &mut self,
        _name: &str,
        _outer_name: Option<&str>,
        _inner_name: Option<&str>,
        _access: u16,
    ) {
    }

    fn visit_field(
        &mut self,
        _access: u16,
        _name: &str,
        _descriptor: &str,
        _signature: Option<&str>,
        _value: Option<&ConstValue>,
    ) -> Option<Box<dyn FieldVisitor + '_>> {
        None
    }

    fn visit_method(
        &mut self,
        _access: u16,
        _name: &str,
        _descriptor: &str,
        _signature: Option<&str>,
        _exceptions: &[String],
    ) -> Option<Box<dyn MethodVisitor + '_>> {
        None
    }

    fn visit_source(&mut self, _source: &str) {}

    fn visit_end(&mut self) {}
}

pub trait FieldVisitor {
    fn visit_annotation(
        &mut self,
        _descriptor: &str,
        _visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_end(&mut self) {}
}

pub trait MethodVisitor {
    fn visit_annotation_default(&mut self) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_annotation(
        &mut self,
        _descriptor: &str,
        _visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_annotable_parameter_count(&mut self, _count: usize, _visible: bool) {}

    fn visit_parameter_annotation(
        &mut self,
        _parameter: usize,
        _descriptor: &str,
        _visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_local_variable(&mut self, _name: &str, _descriptor: &str, _index: u16) {}

    fn visit_end(&mut self) {}
}

/// Receives annotation members. `name` is `None` for array elements and for
/// an annotation default value.
pub trait AnnotationVisitor {
    fn visit(&mut self, _name: Option<&str>, _value: &ConstValue) {}

    fn visit_enum(&mut self, _name: Option<&str>, _descriptor: &str, _value: &str) {}

    fn visit_class(&mut self, _name: Option<&str>, _descriptor: &str) {}

    fn visit_annotation(
        &mut self,
        _name: Option<&str>,
        _descriptor: &str,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_array(&mut self, _name: Option<&str>) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_end(&mut self) {}
}

impl ClassFile {
    /// Replays the class as callbacks: header, outer class, annotations,
    /// inner classes, fields, methods, source file, end.
    pub fn accept(&self, visitor: &mut (dyn ClassVisitor + '_)) {
        visitor.visit(
            self.major_version,
            self.access_flags,
            &self.this_class,
            self.signature.as_deref(),
            self.super_class.as_deref(),
            &self.interfaces,
        );

        if let Some(enclosing) = &self.enclosing_method {
            visitor.visit_outer_class(
                &enclosing.class,
                enclosing.method_name.as_deref(),
                enclosing.method_descriptor.as_deref(),
            );
        }

        for annotation in &self.annotations {
            if let Some(mut av) = visitor.visit_annotation(&annotation.type_descriptor, annotation.visible)
            {
                accept_annotation(annotation, av.as_mut());
            }
        }

        for inner in &self.inner_classes {
            visitor.visit_inner_class(
                &inner.inner_class,
                inner.outer_class.as_deref(),
                inner.inner_name.as_deref(),
                inner.access_flags,
            );
        }

        for field in &self.fields {
            accept_field(field, visitor);
        }
        for method in &self.methods {
            accept_method(method, visitor);
        }

        if let Some(source) = &self.source_file {
            visitor.visit_source(source);
        }
        visitor.visit_end();
    }
}

fn accept_field(field: &FieldInfo, visitor: &mut (dyn ClassVisitor + '_)) {
    let Some(mut fv) = visitor.visit_field(
        field.access_flags,
        &field.name,
        &field.descriptor,
        field.signature.as_deref(),
        field.constant_value.as_ref(),
    ) else {
        return;
    };
    for annotation in &field.annotations {
        if let Some(mut av) = fv.visit_annotation(&annotation.type_descriptor, annotation.visible) {
            accept_annotation(annotation, av.as_mut());
        }
    }
    fv.visit_end();
}

fn accept_method(method: &MethodInfo, visitor: &mut (dyn ClassVisitor + '_)) {
    let Some(mut mv) = visitor.visit_method(
        method.access_flags,
        &method.name,
        &method.descriptor,
        method.signature.as_deref(),
        &method.exceptions,
    ) else {
        return;
    };

    if let Some(default) = &method.annotation_default {
        if let Some(mut av) = mv.visit_annotation_default() {
            accept_element(None, default, av.as_mut());
            av.visit_end();
        }
    }

    for annotation in &method.annotations {
        if let Some(mut av) = mv.visit_annotation(&annotation.type_descriptor, annotation.visible) {
            accept_annotation(annotation, av.as_mut());
        }
    }

    for group in &method.parameter_annotations {
        mv.visit_annotable_parameter_count(group.parameters.len(), group.visible);
        for (parameter, annotations) in group.parameters.iter().enumerate() {
            for annotation in annotations {
                if let Some(mut av) =
                    mv.visit_parameter_annotation(parameter, &annotation.type_descriptor, group.visible)
                {
                    accept_annotation(annotation, av.as_mut());
                }
            }
        }
    }

    for local in &method.local_variables {
        mv.visit_local_variable(&local.name, &local.descriptor, local.index);
    }
    mv.visit_end();
}

fn accept_annotation(annotation: &Annotation, visitor: &mut (dyn AnnotationVisitor + '_)) {
    for (name, value) in &annotation.elements {
        accept_element(Some(name.as_str()), value, visitor);
    }
    visitor.visit_end();
}

fn accept_element(
    name: Option<&str>,
    value: &ElementValue,
    visitor: &mut (dyn AnnotationVisitor + '_),
) {
    match value {
        ElementValue::Const(value) => visitor.visit(name, value),
        ElementValue::Enum {
            type_descriptor,
            const_name,
        } => visitor.visit_enum(name, type_descriptor, const_name),
        ElementValue::Class(descriptor) => visitor.visit_class(name, descriptor),
        ElementValue::Annotation(nested) => {
            if let Some(mut av) = visitor.visit_annotation(name, &nested.type_descriptor) {
                accept_annotation(nested, av.as_mut());
            }
        }
        ElementValue::Array(values) => {
            if let Some(mut av) = visitor.visit_array(name) {
                for value in values {
                    accept_element(None, value, av.as_mut());
                }
                av.visit_end();
            }
        }
    }
}
