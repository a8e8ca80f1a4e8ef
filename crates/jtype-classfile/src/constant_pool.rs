use crate::annotation::ConstValue;
use crate::error::{Error, Result};
use crate::reader::Reader;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELD_REF: u8 = 9;
const TAG_METHOD_REF: u8 = 10;
const TAG_INTERFACE_METHOD_REF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CpInfo {
    /// Index 0 and the second slot of `Long`/`Double` entries.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    MemberRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Unusable => "Unusable",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::MemberRef { .. } => "MemberRef",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(CpInfo::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let info = match tag {
                TAG_UTF8 => {
                    let len = reader.read_u2()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    let text = cesu8::from_java_cesu8(bytes).map_err(|_| Error::InvalidModifiedUtf8)?;
                    CpInfo::Utf8(text.into_owned())
                }
                TAG_INTEGER => CpInfo::Integer(reader.read_u4()? as i32),
                TAG_FLOAT => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
                TAG_LONG => CpInfo::Long(reader.read_u8()? as i64),
                TAG_DOUBLE => CpInfo::Double(f64::from_bits(reader.read_u8()?)),
                TAG_CLASS => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                TAG_STRING => CpInfo::String {
                    string_index: reader.read_u2()?,
                },
                TAG_FIELD_REF | TAG_METHOD_REF | TAG_INTERFACE_METHOD_REF => CpInfo::MemberRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_NAME_AND_TYPE => CpInfo::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                TAG_METHOD_HANDLE => CpInfo::MethodHandle {
                    kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                TAG_METHOD_TYPE => CpInfo::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => CpInfo::Dynamic {
                    bootstrap_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_MODULE => CpInfo::Module {
                    name_index: reader.read_u2()?,
                },
                TAG_PACKAGE => CpInfo::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };

            let wide = matches!(info, CpInfo::Long(_) | CpInfo::Double(_));
            entries.push(info);
            if wide {
                entries.push(CpInfo::Unusable);
            }
        }

        if entries.len() != count.max(1) {
            // A wide constant in the last slot overflows the declared count.
            return Err(Error::Other("constant pool count mismatch"));
        }

        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            Some(CpInfo::Unusable) | None => Err(Error::InvalidConstantPoolIndex(index)),
            Some(info) => Ok(info),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(s) => Ok(s),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn get_string_constant(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::String { string_index } => Ok(self.get_utf8(*string_index)?.to_string()),
            // Annotation element values reference the Utf8 entry directly.
            CpInfo::Utf8(s) => Ok(s.clone()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "String",
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            CpInfo::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((
                self.get_utf8(*name_index)?.to_string(),
                self.get_utf8(*descriptor_index)?.to_string(),
            )),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "NameAndType",
                found: other.kind(),
            }),
        }
    }

    /// Decode the target of a field's `ConstantValue` attribute.
    ///
    /// The JVM stores `boolean`/`byte`/`char`/`short` constants as `Integer`
    /// entries, so the field descriptor picks the final representation.
    pub(crate) fn get_field_constant(&self, index: u16, descriptor: &str) -> Result<ConstValue> {
        let value = match (self.get(index)?, descriptor) {
            (CpInfo::Integer(v), "Z") => ConstValue::Boolean(*v != 0),
            (CpInfo::Integer(v), "B") => ConstValue::Byte(*v as i8),
            (CpInfo::Integer(v), "S") => ConstValue::Short(*v as i16),
            (CpInfo::Integer(v), "C") => ConstValue::Char(
                char::from_u32(*v as u32).ok_or(Error::MalformedAttribute("ConstantValue"))?,
            ),
            (CpInfo::Integer(v), _) => ConstValue::Int(*v),
            (CpInfo::Long(v), _) => ConstValue::Long(*v),
            (CpInfo::Float(v), _) => ConstValue::Float(*v),
            (CpInfo::Double(v), _) => ConstValue::Double(*v),
            (CpInfo::String { string_index }, _) => {
                ConstValue::String(self.get_utf8(*string_index)?.to_string())
            }
            (other, _) => {
                return Err(Error::ConstantPoolTypeMismatch {
                    index,
                    expected: "constant",
                    found: other.kind(),
                })
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(bytes: &[u8]) -> Result<ConstantPool> {
        ConstantPool::parse(&mut Reader::new(bytes))
    }

    #[test]
    fn wide_constants_take_two_slots() {
        // count = 4: #1 Long, (#2 unusable), #3 Utf8 "A"
        let bytes = [
            0x00, 0x04, 5, 0, 0, 0, 0, 0, 0, 0, 42, 1, 0x00, 0x01, b'A',
        ];
        let cp = pool(&bytes).unwrap();
        assert_eq!(cp.get(1).unwrap(), &CpInfo::Long(42));
        assert_eq!(cp.get(2), Err(Error::InvalidConstantPoolIndex(2)));
        assert_eq!(cp.get_utf8(3).unwrap(), "A");
    }

    #[test]
    fn class_entry_must_point_at_utf8() {
        // count = 3: #1 Class -> #2, #2 Integer
        let bytes = [0x00, 0x03, 7, 0x00, 0x02, 3, 0, 0, 0, 1];
        let cp = pool(&bytes).unwrap();
        assert_eq!(
            cp.get_class_name(1),
            Err(Error::ConstantPoolTypeMismatch {
                index: 2,
                expected: "Utf8",
                found: "Integer",
            })
        );
    }

    #[test]
    fn modified_utf8_null_is_decoded() {
        // "a\0" encoded with the two-byte null form.
        let bytes = [0x00, 0x02, 1, 0x00, 0x03, b'a', 0xC0, 0x80];
        let cp = pool(&bytes).unwrap();
        assert_eq!(cp.get_utf8(1).unwrap(), "a\0");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = [0x00, 0x02, 99];
        assert_eq!(pool(&bytes).unwrap_err(), Error::InvalidConstantPoolTag(99));
    }
}
