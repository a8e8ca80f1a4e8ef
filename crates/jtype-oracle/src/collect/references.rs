use std::collections::BTreeSet;

use jtype_classfile::{
    parse_field_descriptor, parse_method_descriptor, AnnotationVisitor, ClassVisitor, ConstValue,
    FieldVisitor, MethodVisitor, SignatureReader, SignatureVisitor, TypeArgKind,
};

/// Gathers the internal names a class depends on.
///
/// Annotations are deliberately not visited: annotation types are often
/// binary-only and must not make a class look unresolvable.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    name: String,
    references: BTreeSet<String>,
}

impl ReferenceCollector {
    pub fn finish(mut self) -> BTreeSet<String> {
        self.references.remove(&self.name);
        self.references
    }

    fn add(&mut self, name: &str) {
        if !name.is_empty() {
            self.references.insert(name.to_string());
        }
    }

    fn add_field_descriptor(&mut self, descriptor: &str) {
        if let Ok(ty) = parse_field_descriptor(descriptor) {
            if let Some(name) = ty.object_name() {
                self.add(name);
            }
        }
    }

    fn add_method_descriptor(&mut self, descriptor: &str) {
        if let Ok(parsed) = parse_method_descriptor(descriptor) {
            for name in parsed.object_names() {
                self.add(name);
            }
        }
    }

    /// Malformed signatures are reported during resolution; here they just
    /// contribute whatever was read before the error.
    fn add_signature(&mut self, signature: &str, is_type: bool) {
        let mut visitor = SignatureReferences {
            references: &mut self.references,
            class_types: Vec::new(),
        };
        let reader = SignatureReader::new(signature);
        let _ = if is_type {
            reader.accept_type(&mut visitor)
        } else {
            reader.accept(&mut visitor)
        };
    }
}

impl ClassVisitor for ReferenceCollector {
    fn visit(
        &mut self,
        _version: u16,
        _access: u16,
        name: &str,
        signature: Option<&str>,
        super_name: Option<&str>,
        interfaces: &[String],
    ) {
        self.name = name.to_string();
        if let Some(super_name) = super_name {
            self.add(super_name);
        }
        for interface in interfaces {
            self.add(interface);
        }
        if let Some(signature) = signature {
            self.add_signature(signature, false);
        }
    }

    fn visit_outer_class(&mut self, owner: &str, _name: Option<&str>, _descriptor: Option<&str>) {
        self.add(owner);
    }

    fn visit_annotation(
        &mut self,
        _descriptor: &str,
        _visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        None
    }

    fn visit_inner_class(
        &mut self,
        name: &str,
        outer_name: Option<&str>,
        _inner_name: Option<&str>,
        _access: u16,
    ) {
        // Only our own nesting links matter; entries for unrelated member
        // classes are listed by every class that mentions them.
        if name == self.name {
            if let Some(outer_name) = outer_name {
                self.add(outer_name);
            }
        } else if outer_name == Some(self.name.as_str()) {
            self.add(name);
        }
    }

    fn visit_field(
        &mut self,
        _access: u16,
        _name: &str,
        descriptor: &str,
        signature: Option<&str>,
        _value: Option<&ConstValue>,
    ) -> Option<Box<dyn FieldVisitor + '_>> {
        self.add_field_descriptor(descriptor);
        if let Some(signature) = signature {
            self.add_signature(signature, true);
        }
        None
    }

    fn visit_method(
        &mut self,
        _access: u16,
        _name: &str,
        descriptor: &str,
        signature: Option<&str>,
        exceptions: &[String],
    ) -> Option<Box<dyn MethodVisitor + '_>> {
        self.add_method_descriptor(descriptor);
        if let Some(signature) = signature {
            self.add_signature(signature, false);
        }
        for exception in exceptions {
            self.add(exception);
        }
        None
    }
}

/// Records every class type token of a signature, rebuilding the binary
/// name of `Outer<..>.Inner` continuations.
struct SignatureReferences<'a> {
    references: &'a mut BTreeSet<String>,
    class_types: Vec<String>,
}

impl SignatureVisitor for SignatureReferences<'_> {
    fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_superclass(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_interface(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_parameter_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_return_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_exception_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_array_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_class_type(&mut self, name: &str) {
        self.references.insert(name.to_string());
        self.class_types.push(name.to_string());
    }

    fn visit_inner_class_type(&mut self, name: &str) {
        if let Some(current) = self.class_types.last_mut() {
            current.push('$');
            current.push_str(name);
            self.references.insert(current.clone());
        }
    }

    fn visit_bounded_type_argument(&mut self, _kind: TypeArgKind) -> Box<dyn SignatureVisitor + '_> {
        Box::new(self)
    }

    fn visit_end(&mut self) {
        self.class_types.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtype_classfile::access::*;
    use jtype_classfile::{AnnotationSpec, ClassFile, ClassFileBuilder, FieldSpec, MethodSpec};
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_descriptor_and_signature_names_but_not_annotations() {
        let bytes = ClassFileBuilder::new("p/Holder")
            .interface("p/Marker")
            .signature("<T:Lp/Bound;>Ljava/lang/Object;Lp/Marker;")
            .annotation(AnnotationSpec::new("Lp/Binary;").build())
            .field(
                FieldSpec::new(ACC_PRIVATE, "map", "Ljava/util/Map;")
                    .signature("Ljava/util/Map<Lp/Key;[Lp/Outer<TT;>.Inner;>;")
                    .annotation(AnnotationSpec::new("Lp/FieldOnly;").build()),
            )
            .method(
                MethodSpec::new(ACC_PUBLIC, "run", "([[Lp/Arg;J)Lp/Result;")
                    .exception("p/Failure"),
            )
            .build();
        let class = ClassFile::parse(&bytes).unwrap();

        let references: Vec<_> = crate::collect::collect_references(&class).into_iter().collect();
        assert_eq!(
            references,
            vec![
                "java/lang/Object",
                "java/util/Map",
                "p/Arg",
                "p/Bound",
                "p/Failure",
                "p/Key",
                "p/Marker",
                "p/Outer",
                "p/Outer$Inner",
                "p/Result",
            ]
        );
    }
}
