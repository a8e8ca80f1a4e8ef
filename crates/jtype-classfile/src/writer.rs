//! Synthesizes class files.
//!
//! Method bodies are a constant-returning stub; the output carries the
//! declarations, attributes and debug tables [`ClassFile::parse`] reads, not
//! verifiable bytecode.
//!
//! [`ClassFile::parse`]: crate::ClassFile::parse

use std::collections::HashMap;

use crate::access::{has, ACC_ABSTRACT, ACC_NATIVE, ACC_STATIC, ACC_SUPER, ACC_PUBLIC};
use crate::annotation::{Annotation, ConstValue, ElementValue};
use crate::classfile::{EnclosingMethod, InnerClassInfo, LocalVariable, ParameterAnnotations};
use crate::descriptor::{parse_method_descriptor, BaseType, FieldType, ReturnType};

const MAGIC: u32 = 0xCAFE_BABE;
/// Java 8.
const DEFAULT_MAJOR_VERSION: u16 = 52;

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    access_flags: u16,
    major_version: u16,
    interfaces: Vec<String>,
    signature: Option<String>,
    source_file: Option<String>,
    inner_classes: Vec<InnerClassInfo>,
    enclosing_method: Option<EnclosingMethod>,
    annotations: Vec<Annotation>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassFileBuilder {
    /// A public class named `name` (internal form) extending `java/lang/Object`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            major_version: DEFAULT_MAJOR_VERSION,
            interfaces: Vec::new(),
            signature: None,
            source_file: None,
            inner_classes: Vec::new(),
            enclosing_method: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn access(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn major_version(mut self, version: u16) -> Self {
        self.major_version = version;
        self
    }

    /// `None` is only legal for `java/lang/Object` itself.
    pub fn super_class(mut self, name: Option<&str>) -> Self {
        self.super_name = name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        access_flags: u16,
    ) -> Self {
        self.inner_classes.push(InnerClassInfo {
            inner_class: inner.to_string(),
            outer_class: outer.map(str::to_string),
            inner_name: inner_name.map(str::to_string),
            access_flags,
        });
        self
    }

    /// `method` is `(name, descriptor)` when the class is declared inside a
    /// method body rather than an initializer.
    pub fn enclosing_method(mut self, class: &str, method: Option<(&str, &str)>) -> Self {
        self.enclosing_method = Some(EnclosingMethod {
            class: class.to_string(),
            method_name: method.map(|(name, _)| name.to_string()),
            method_descriptor: method.map(|(_, desc)| desc.to_string()),
        });
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = PoolBuilder::default();
        let mut body = Vec::new();

        put_u2(&mut body, self.access_flags);
        put_u2(&mut body, pool.class(&self.name));
        put_u2(
            &mut body,
            self.super_name.as_deref().map_or(0, |name| pool.class(name)),
        );
        put_u2(&mut body, self.interfaces.len() as u16);
        for iface in &self.interfaces {
            put_u2(&mut body, pool.class(iface));
        }

        put_u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            field.write(&mut pool, &mut body);
        }
        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            method.write(&mut pool, &mut body);
        }

        let mut attrs = AttributeWriter::default();
        if let Some(signature) = &self.signature {
            attrs.signature(&mut pool, signature);
        }
        if let Some(source_file) = &self.source_file {
            let mut info = Vec::new();
            put_u2(&mut info, pool.utf8(source_file));
            attrs.push(&mut pool, "SourceFile", info);
        }
        if !self.inner_classes.is_empty() {
            let mut info = Vec::new();
            put_u2(&mut info, self.inner_classes.len() as u16);
            for inner in &self.inner_classes {
                put_u2(&mut info, pool.class(&inner.inner_class));
                put_u2(
                    &mut info,
                    inner.outer_class.as_deref().map_or(0, |name| pool.class(name)),
                );
                put_u2(
                    &mut info,
                    inner.inner_name.as_deref().map_or(0, |name| pool.utf8(name)),
                );
                put_u2(&mut info, inner.access_flags);
            }
            attrs.push(&mut pool, "InnerClasses", info);
        }
        if let Some(enclosing) = &self.enclosing_method {
            let mut info = Vec::new();
            put_u2(&mut info, pool.class(&enclosing.class));
            let method = match (&enclosing.method_name, &enclosing.method_descriptor) {
                (Some(name), Some(desc)) => pool.name_and_type(name, desc),
                _ => 0,
            };
            put_u2(&mut info, method);
            attrs.push(&mut pool, "EnclosingMethod", info);
        }
        attrs.annotations(&mut pool, &self.annotations);
        attrs.write_to(&mut body);

        let mut out = Vec::with_capacity(body.len() + pool.bytes.len() + 10);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        put_u2(&mut out, 0);
        put_u2(&mut out, self.major_version);
        put_u2(&mut out, pool.next_index);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    constant_value: Option<ConstValue>,
    annotations: Vec<Annotation>,
}

impl FieldSpec {
    pub fn new(access_flags: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            constant_value: None,
            annotations: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn constant(mut self, value: ConstValue) -> Self {
        self.constant_value = Some(value);
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    fn write(&self, pool: &mut PoolBuilder, out: &mut Vec<u8>) {
        put_u2(out, self.access_flags);
        put_u2(out, pool.utf8(&self.name));
        put_u2(out, pool.utf8(&self.descriptor));

        let mut attrs = AttributeWriter::default();
        if let Some(signature) = &self.signature {
            attrs.signature(pool, signature);
        }
        if let Some(value) = &self.constant_value {
            let mut info = Vec::new();
            put_u2(&mut info, pool.constant(value));
            attrs.push(pool, "ConstantValue", info);
        }
        attrs.annotations(pool, &self.annotations);
        attrs.write_to(out);
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    exceptions: Vec<String>,
    annotations: Vec<Annotation>,
    parameter_annotations: Vec<ParameterAnnotations>,
    annotation_default: Option<ElementValue>,
    local_variables: Vec<LocalVariable>,
}

impl MethodSpec {
    pub fn new(access_flags: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            exceptions: Vec::new(),
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
            annotation_default: None,
            local_variables: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn exception(mut self, name: impl Into<String>) -> Self {
        self.exceptions.push(name.into());
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// One entry per annotable parameter; may be shorter than the arity.
    pub fn parameter_annotations(mut self, visible: bool, parameters: Vec<Vec<Annotation>>) -> Self {
        self.parameter_annotations.push(ParameterAnnotations {
            visible,
            parameters,
        });
        self
    }

    pub fn annotation_default(mut self, value: ElementValue) -> Self {
        self.annotation_default = Some(value);
        self
    }

    /// Adds a `LocalVariableTable` entry spanning the whole body.
    pub fn local_variable(mut self, name: impl Into<String>, descriptor: impl Into<String>, index: u16) -> Self {
        self.local_variables.push(LocalVariable {
            start_pc: 0,
            length: 0,
            name: name.into(),
            descriptor: descriptor.into(),
            index,
        });
        self
    }

    fn write(&self, pool: &mut PoolBuilder, out: &mut Vec<u8>) {
        put_u2(out, self.access_flags);
        put_u2(out, pool.utf8(&self.name));
        put_u2(out, pool.utf8(&self.descriptor));

        let mut attrs = AttributeWriter::default();
        if !has(self.access_flags, ACC_ABSTRACT | ACC_NATIVE) {
            let info = self.code(pool);
            attrs.push(pool, "Code", info);
        }
        if let Some(signature) = &self.signature {
            attrs.signature(pool, signature);
        }
        if !self.exceptions.is_empty() {
            let mut info = Vec::new();
            put_u2(&mut info, self.exceptions.len() as u16);
            for exception in &self.exceptions {
                put_u2(&mut info, pool.class(exception));
            }
            attrs.push(pool, "Exceptions", info);
        }
        attrs.annotations(pool, &self.annotations);
        for group in &self.parameter_annotations {
            let mut info = vec![group.parameters.len() as u8];
            for annotations in &group.parameters {
                put_u2(&mut info, annotations.len() as u16);
                for annotation in annotations {
                    write_annotation(pool, &mut info, annotation);
                }
            }
            let name = if group.visible {
                "RuntimeVisibleParameterAnnotations"
            } else {
                "RuntimeInvisibleParameterAnnotations"
            };
            attrs.push(pool, name, info);
        }
        if let Some(value) = &self.annotation_default {
            let mut info = Vec::new();
            write_element(pool, &mut info, value);
            attrs.push(pool, "AnnotationDefault", info);
        }
        attrs.write_to(out);
    }

    fn code(&self, pool: &mut PoolBuilder) -> Vec<u8> {
        let descriptor = parse_method_descriptor(&self.descriptor).ok();
        let bytecode: &[u8] = match descriptor.as_ref().map(|d| &d.return_type) {
            None | Some(ReturnType::Void) => &[0xb1],
            Some(ReturnType::Type(FieldType::Base(BaseType::Long))) => &[0x09, 0xad],
            Some(ReturnType::Type(FieldType::Base(BaseType::Float))) => &[0x0b, 0xae],
            Some(ReturnType::Type(FieldType::Base(BaseType::Double))) => &[0x0e, 0xaf],
            Some(ReturnType::Type(FieldType::Base(_))) => &[0x03, 0xac],
            Some(ReturnType::Type(_)) => &[0x01, 0xb0],
        };

        let receiver = u16::from(!has(self.access_flags, ACC_STATIC));
        let param_slots: u16 = descriptor
            .iter()
            .flat_map(|d| d.params.iter())
            .map(FieldType::slot_size)
            .sum();
        let max_locals = self
            .local_variables
            .iter()
            .map(|local| local.index + 2)
            .fold(receiver + param_slots, u16::max);

        let mut info = Vec::new();
        put_u2(&mut info, 2);
        put_u2(&mut info, max_locals);
        info.extend_from_slice(&(bytecode.len() as u32).to_be_bytes());
        info.extend_from_slice(bytecode);
        put_u2(&mut info, 0);

        let mut attrs = AttributeWriter::default();
        if !self.local_variables.is_empty() {
            let mut table = Vec::new();
            put_u2(&mut table, self.local_variables.len() as u16);
            for local in &self.local_variables {
                put_u2(&mut table, local.start_pc);
                put_u2(&mut table, bytecode.len() as u16);
                put_u2(&mut table, pool.utf8(&local.name));
                put_u2(&mut table, pool.utf8(&local.descriptor));
                put_u2(&mut table, local.index);
            }
            attrs.push(pool, "LocalVariableTable", table);
        }
        attrs.write_to(&mut info);
        info
    }
}

/// Builder for [`Annotation`] values.
#[derive(Debug, Clone)]
pub struct AnnotationSpec {
    annotation: Annotation,
}

impl AnnotationSpec {
    /// A runtime-visible annotation of the given type descriptor.
    pub fn new(type_descriptor: impl Into<String>) -> Self {
        Self {
            annotation: Annotation {
                type_descriptor: type_descriptor.into(),
                visible: true,
                elements: Vec::new(),
            },
        }
    }

    pub fn invisible(mut self) -> Self {
        self.annotation.visible = false;
        self
    }

    pub fn element(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.annotation.elements.push((name.into(), value));
        self
    }

    pub fn build(self) -> Annotation {
        self.annotation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(String),
    String(String),
    NameAndType(String, String),
}

#[derive(Debug)]
struct PoolBuilder {
    bytes: Vec<u8>,
    next_index: u16,
    entries: HashMap<PoolKey, u16>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            entries: HashMap::new(),
        }
    }
}

impl PoolBuilder {
    fn intern(&mut self, key: PoolKey, write: impl FnOnce(&mut Self) -> Vec<u8>) -> u16 {
        if let Some(index) = self.entries.get(&key) {
            return *index;
        }
        let wide = matches!(key, PoolKey::Long(_) | PoolKey::Double(_));
        // Dependencies are interned first so they get lower indices.
        let encoded = write(self);
        let index = self.next_index;
        self.bytes.extend_from_slice(&encoded);
        self.next_index += if wide { 2 } else { 1 };
        self.entries.insert(key, index);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.intern(PoolKey::Utf8(value.to_string()), |_| {
            let encoded = cesu8::to_java_cesu8(value);
            let mut out = vec![1];
            put_u2(&mut out, encoded.len() as u16);
            out.extend_from_slice(&encoded);
            out
        })
    }

    fn class(&mut self, name: &str) -> u16 {
        self.intern(PoolKey::Class(name.to_string()), |pool| {
            let mut out = vec![7];
            put_u2(&mut out, pool.utf8(name));
            out
        })
    }

    fn string(&mut self, value: &str) -> u16 {
        self.intern(PoolKey::String(value.to_string()), |pool| {
            let mut out = vec![8];
            put_u2(&mut out, pool.utf8(value));
            out
        })
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        self.intern(
            PoolKey::NameAndType(name.to_string(), descriptor.to_string()),
            |pool| {
                let mut out = vec![12];
                put_u2(&mut out, pool.utf8(name));
                put_u2(&mut out, pool.utf8(descriptor));
                out
            },
        )
    }

    fn integer(&mut self, value: i32) -> u16 {
        self.intern(PoolKey::Integer(value), |_| {
            let mut out = vec![3];
            out.extend_from_slice(&value.to_be_bytes());
            out
        })
    }

    fn constant(&mut self, value: &ConstValue) -> u16 {
        match value {
            ConstValue::Boolean(v) => self.integer(i32::from(*v)),
            ConstValue::Byte(v) => self.integer(i32::from(*v)),
            ConstValue::Char(v) => self.integer(*v as i32),
            ConstValue::Short(v) => self.integer(i32::from(*v)),
            ConstValue::Int(v) => self.integer(*v),
            ConstValue::Long(v) => self.intern(PoolKey::Long(*v), |_| {
                let mut out = vec![5];
                out.extend_from_slice(&v.to_be_bytes());
                out
            }),
            ConstValue::Float(v) => self.intern(PoolKey::Float(v.to_bits()), |_| {
                let mut out = vec![4];
                out.extend_from_slice(&v.to_bits().to_be_bytes());
                out
            }),
            ConstValue::Double(v) => self.intern(PoolKey::Double(v.to_bits()), |_| {
                let mut out = vec![6];
                out.extend_from_slice(&v.to_bits().to_be_bytes());
                out
            }),
            ConstValue::String(v) => self.string(v),
        }
    }
}

#[derive(Default)]
struct AttributeWriter {
    count: u16,
    bytes: Vec<u8>,
}

impl AttributeWriter {
    fn push(&mut self, pool: &mut PoolBuilder, name: &str, info: Vec<u8>) {
        put_u2(&mut self.bytes, pool.utf8(name));
        self.bytes
            .extend_from_slice(&(info.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(&info);
        self.count += 1;
    }

    fn signature(&mut self, pool: &mut PoolBuilder, signature: &str) {
        let mut info = Vec::new();
        put_u2(&mut info, pool.utf8(signature));
        self.push(pool, "Signature", info);
    }

    fn annotations(&mut self, pool: &mut PoolBuilder, annotations: &[Annotation]) {
        for (visible, name) in [
            (true, "RuntimeVisibleAnnotations"),
            (false, "RuntimeInvisibleAnnotations"),
        ] {
            let group: Vec<&Annotation> =
                annotations.iter().filter(|a| a.visible == visible).collect();
            if group.is_empty() {
                continue;
            }
            let mut info = Vec::new();
            put_u2(&mut info, group.len() as u16);
            for annotation in group {
                write_annotation(pool, &mut info, annotation);
            }
            self.push(pool, name, info);
        }
    }

    fn write_to(self, out: &mut Vec<u8>) {
        put_u2(out, self.count);
        out.extend_from_slice(&self.bytes);
    }
}

fn write_annotation(pool: &mut PoolBuilder, out: &mut Vec<u8>, annotation: &Annotation) {
    put_u2(out, pool.utf8(&annotation.type_descriptor));
    put_u2(out, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        put_u2(out, pool.utf8(name));
        write_element(pool, out, value);
    }
}

fn write_element(pool: &mut PoolBuilder, out: &mut Vec<u8>, value: &ElementValue) {
    out.push(value.tag());
    match value {
        ElementValue::Const(ConstValue::String(s)) => put_u2(out, pool.utf8(s)),
        ElementValue::Const(c) => put_u2(out, pool.constant(c)),
        ElementValue::Enum {
            type_descriptor,
            const_name,
        } => {
            put_u2(out, pool.utf8(type_descriptor));
            put_u2(out, pool.utf8(const_name));
        }
        ElementValue::Class(descriptor) => put_u2(out, pool.utf8(descriptor)),
        ElementValue::Annotation(nested) => write_annotation(pool, out, nested),
        ElementValue::Array(values) => {
            put_u2(out, values.len() as u16);
            for value in values {
                write_element(pool, out, value);
            }
        }
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}
