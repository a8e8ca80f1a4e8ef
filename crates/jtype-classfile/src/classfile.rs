use crate::annotation::{Annotation, ConstValue, ElementValue};
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::reader::Reader;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub inner_classes: Vec<InnerClassInfo>,
    pub enclosing_method: Option<EnclosingMethod>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant_value: Option<ConstValue>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub parameter_annotations: Vec<ParameterAnnotations>,
    pub annotation_default: Option<ElementValue>,
    /// Entries of the `LocalVariableTable` debug attribute, in file order.
    pub local_variables: Vec<LocalVariable>,
}

/// One `Runtime{Visible,Invisible}ParameterAnnotations` attribute.
///
/// `parameters.len()` is the attribute's annotable parameter count, which
/// javac may emit smaller than the descriptor arity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAnnotations {
    pub visible: bool,
    pub parameters: Vec<Vec<Annotation>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: String,
    pub method_name: Option<String>,
    pub method_descriptor: Option<String>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class = match reader.read_u2()? {
            0 => None,
            index => Some(cp.get_class_name(index)?),
        };

        let interfaces_count = reader.read_u2()? as usize;
        let interfaces = (0..interfaces_count)
            .map(|_| cp.get_class_name(reader.read_u2()?))
            .collect::<Result<Vec<_>>>()?;

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_field(&mut reader, &cp)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_method(&mut reader, &cp)?);
        }

        let attrs = parse_attributes(&mut reader, &cp, Target::Class)?;
        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            signature: attrs.signature,
            source_file: attrs.source_file,
            inner_classes: attrs.inner_classes,
            enclosing_method: attrs.enclosing_method,
            annotations: attrs.annotations,
            fields,
            methods,
        })
    }
}

fn parse_field(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<FieldInfo> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    let attrs = parse_attributes(reader, cp, Target::Field(&descriptor))?;
    Ok(FieldInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        constant_value: attrs.constant_value,
        annotations: attrs.annotations,
    })
}

fn parse_method(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<MethodInfo> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    let attrs = parse_attributes(reader, cp, Target::Method)?;
    Ok(MethodInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        exceptions: attrs.exceptions,
        annotations: attrs.annotations,
        parameter_annotations: attrs.parameter_annotations,
        annotation_default: attrs.annotation_default,
        local_variables: attrs.local_variables,
    })
}

#[derive(Clone, Copy)]
enum Target<'a> {
    Class,
    Field(&'a str),
    Method,
    Code,
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    source_file: Option<String>,
    inner_classes: Vec<InnerClassInfo>,
    enclosing_method: Option<EnclosingMethod>,
    annotations: Vec<Annotation>,
    constant_value: Option<ConstValue>,
    exceptions: Vec<String>,
    parameter_annotations: Vec<ParameterAnnotations>,
    annotation_default: Option<ElementValue>,
    local_variables: Vec<LocalVariable>,
}

fn parse_attributes(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    target: Target<'_>,
) -> Result<ParsedAttributes> {
    let count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..count {
        let name = cp.get_utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut sub = Reader::new(reader.read_bytes(length)?);

        match (name, target) {
            ("Signature", Target::Class | Target::Field(_) | Target::Method) => {
                parsed.signature = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
            }
            ("RuntimeVisibleAnnotations", Target::Class | Target::Field(_) | Target::Method) => {
                parsed
                    .annotations
                    .extend(Annotation::parse_list(&mut sub, cp, true)?);
            }
            ("RuntimeInvisibleAnnotations", Target::Class | Target::Field(_) | Target::Method) => {
                parsed
                    .annotations
                    .extend(Annotation::parse_list(&mut sub, cp, false)?);
            }
            ("SourceFile", Target::Class) => {
                parsed.source_file = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
            }
            ("InnerClasses", Target::Class) => {
                let entries = sub.read_u2()? as usize;
                for _ in 0..entries {
                    parsed.inner_classes.push(parse_inner_class(&mut sub, cp)?);
                }
            }
            ("EnclosingMethod", Target::Class) => {
                let class = cp.get_class_name(sub.read_u2()?)?;
                let (method_name, method_descriptor) = match sub.read_u2()? {
                    0 => (None, None),
                    index => {
                        let (name, desc) = cp.get_name_and_type(index)?;
                        (Some(name), Some(desc))
                    }
                };
                parsed.enclosing_method = Some(EnclosingMethod {
                    class,
                    method_name,
                    method_descriptor,
                });
            }
            ("ConstantValue", Target::Field(descriptor)) => {
                parsed.constant_value = Some(cp.get_field_constant(sub.read_u2()?, descriptor)?);
            }
            ("Exceptions", Target::Method) => {
                let entries = sub.read_u2()? as usize;
                for _ in 0..entries {
                    parsed.exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
            }
            ("RuntimeVisibleParameterAnnotations", Target::Method) => {
                parsed
                    .parameter_annotations
                    .push(parse_parameter_annotations(&mut sub, cp, true)?);
            }
            ("RuntimeInvisibleParameterAnnotations", Target::Method) => {
                parsed
                    .parameter_annotations
                    .push(parse_parameter_annotations(&mut sub, cp, false)?);
            }
            ("AnnotationDefault", Target::Method) => {
                parsed.annotation_default = Some(ElementValue::parse(&mut sub, cp, true)?);
            }
            ("Code", Target::Method) => {
                let _max_stack = sub.read_u2()?;
                let _max_locals = sub.read_u2()?;
                let code_length = sub.read_u4()? as usize;
                sub.read_bytes(code_length)?;
                let handlers = sub.read_u2()? as usize;
                sub.read_bytes(handlers * 8)?;
                let code_attrs = parse_attributes(&mut sub, cp, Target::Code)?;
                parsed.local_variables = code_attrs.local_variables;
            }
            ("LocalVariableTable", Target::Code) => {
                let entries = sub.read_u2()? as usize;
                for _ in 0..entries {
                    parsed.local_variables.push(LocalVariable {
                        start_pc: sub.read_u2()?,
                        length: sub.read_u2()?,
                        name: cp.get_utf8(sub.read_u2()?)?.to_string(),
                        descriptor: cp.get_utf8(sub.read_u2()?)?.to_string(),
                        index: sub.read_u2()?,
                    });
                }
            }
            _ => continue,
        }
        sub.ensure_empty()?;
    }

    Ok(parsed)
}

fn parse_inner_class(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<InnerClassInfo> {
    let inner_class = cp.get_class_name(reader.read_u2()?)?;
    let outer_class = match reader.read_u2()? {
        0 => None,
        index => Some(cp.get_class_name(index)?),
    };
    let inner_name = match reader.read_u2()? {
        0 => None,
        index => Some(cp.get_utf8(index)?.to_string()),
    };
    Ok(InnerClassInfo {
        inner_class,
        outer_class,
        inner_name,
        access_flags: reader.read_u2()?,
    })
}

fn parse_parameter_annotations(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    visible: bool,
) -> Result<ParameterAnnotations> {
    let count = reader.read_u1()? as usize;
    let parameters = (0..count)
        .map(|_| Annotation::parse_list(reader, cp, visible))
        .collect::<Result<Vec<_>>>()?;
    Ok(ParameterAnnotations {
        visible,
        parameters,
    })
}
