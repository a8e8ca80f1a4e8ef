use crate::constant_pool::{ConstantPool, CpInfo};
use crate::descriptor::descriptor_to_internal_name;
use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_descriptor: String,
    /// `RuntimeVisible*` vs `RuntimeInvisible*`; nested annotations inherit it.
    pub visible: bool,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn type_internal_name(&self) -> Option<String> {
        descriptor_to_internal_name(&self.type_descriptor)
    }

    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool, visible: bool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let count = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            elements.push((name, ElementValue::parse(reader, cp, visible)?));
        }
        Ok(Self {
            type_descriptor,
            visible,
            elements,
        })
    }

    /// `Runtime{Visible,Invisible}Annotations` body.
    pub(crate) fn parse_list(
        reader: &mut Reader<'_>,
        cp: &ConstantPool,
        visible: bool,
    ) -> Result<Vec<Self>> {
        let count = reader.read_u2()? as usize;
        (0..count)
            .map(|_| Annotation::parse(reader, cp, visible))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal (`Ljava/lang/String;`, `I`, `V`).
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub(crate) fn tag(&self) -> u8 {
        match self {
            ElementValue::Const(value) => value.tag(),
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class(_) => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array(_) => b'[',
        }
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool, visible: bool) -> Result<Self> {
        let tag = reader.read_u1()?;
        let value = match tag {
            b'B' | b'C' | b'I' | b'S' | b'Z' => {
                let index = reader.read_u2()?;
                let CpInfo::Integer(v) = cp.get(index)? else {
                    return Err(mismatch(cp, index, "Integer"));
                };
                let v = *v;
                ElementValue::Const(match tag {
                    b'B' => ConstValue::Byte(v as i8),
                    b'C' => ConstValue::Char(
                        char::from_u32(v as u32).ok_or(Error::MalformedAttribute("element_value"))?,
                    ),
                    b'S' => ConstValue::Short(v as i16),
                    b'Z' => ConstValue::Boolean(v != 0),
                    _ => ConstValue::Int(v),
                })
            }
            b'J' => {
                let index = reader.read_u2()?;
                let CpInfo::Long(v) = cp.get(index)? else {
                    return Err(mismatch(cp, index, "Long"));
                };
                ElementValue::Const(ConstValue::Long(*v))
            }
            b'F' => {
                let index = reader.read_u2()?;
                let CpInfo::Float(v) = cp.get(index)? else {
                    return Err(mismatch(cp, index, "Float"));
                };
                ElementValue::Const(ConstValue::Float(*v))
            }
            b'D' => {
                let index = reader.read_u2()?;
                let CpInfo::Double(v) = cp.get(index)? else {
                    return Err(mismatch(cp, index, "Double"));
                };
                ElementValue::Const(ConstValue::Double(*v))
            }
            b's' => ElementValue::Const(ConstValue::String(
                cp.get_string_constant(reader.read_u2()?)?,
            )),
            b'e' => ElementValue::Enum {
                type_descriptor: cp.get_utf8(reader.read_u2()?)?.to_string(),
                const_name: cp.get_utf8(reader.read_u2()?)?.to_string(),
            },
            b'c' => ElementValue::Class(cp.get_utf8(reader.read_u2()?)?.to_string()),
            b'@' => ElementValue::Annotation(Box::new(Annotation::parse(reader, cp, visible)?)),
            b'[' => {
                let count = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(ElementValue::parse(reader, cp, visible)?);
                }
                ElementValue::Array(values)
            }
            _ => return Err(Error::MalformedAttribute("element_value")),
        };
        Ok(value)
    }
}

fn mismatch(cp: &ConstantPool, index: u16, expected: &'static str) -> Error {
    let found = cp.get(index).map(CpInfo::kind).unwrap_or("Unusable");
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ConstValue {
    pub(crate) fn tag(&self) -> u8 {
        match self {
            ConstValue::Boolean(_) => b'Z',
            ConstValue::Byte(_) => b'B',
            ConstValue::Char(_) => b'C',
            ConstValue::Short(_) => b'S',
            ConstValue::Int(_) => b'I',
            ConstValue::Long(_) => b'J',
            ConstValue::Float(_) => b'F',
            ConstValue::Double(_) => b'D',
            ConstValue::String(_) => b's',
        }
    }
}
