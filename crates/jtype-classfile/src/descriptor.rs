use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl BaseType {
    pub fn from_descriptor(c: char) -> Option<Self> {
        Some(match c {
            'Z' => BaseType::Boolean,
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'S' => BaseType::Short,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'F' => BaseType::Float,
            'D' => BaseType::Double,
            _ => return None,
        })
    }

    pub fn descriptor(self) -> char {
        match self {
            BaseType::Boolean => 'Z',
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Short => 'S',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Float => 'F',
            BaseType::Double => 'D',
        }
    }

    pub fn java_name(self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Short => "short",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Float => "float",
            BaseType::Double => "double",
        }
    }

    /// `long` and `double` occupy two local-variable slots.
    pub fn is_wide(self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Base(BaseType),
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Number of local-variable slots a parameter of this type consumes.
    pub fn slot_size(&self) -> u16 {
        match self {
            FieldType::Base(base) if base.is_wide() => 2,
            _ => 1,
        }
    }

    /// The innermost element type and the array depth around it.
    pub fn element(&self) -> (&FieldType, usize) {
        let mut ty = self;
        let mut dims = 0;
        while let FieldType::Array(component) = ty {
            ty = component;
            dims += 1;
        }
        (ty, dims)
    }

    /// Internal name of the class this type mentions, looking through arrays.
    pub fn object_name(&self) -> Option<&str> {
        match self.element().0 {
            FieldType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            FieldType::Base(base) => out.push(base.descriptor()),
            FieldType::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            FieldType::Array(component) => {
                out.push('[');
                component.write_descriptor(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

impl MethodDescriptor {
    /// Every class internal name mentioned by the parameters and return type.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        let ret = match &self.return_type {
            ReturnType::Type(ty) => ty.object_name(),
            ReturnType::Void => None,
        };
        self.params
            .iter()
            .filter_map(FieldType::object_name)
            .chain(ret)
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        match &self.return_type {
            ReturnType::Void => out.push('V'),
            ReturnType::Type(ty) => ty.write_descriptor(&mut out),
        }
        out
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let mut parser = DescriptorParser { desc, pos: 0 };
    let ty = parser.field_type()?;
    parser.finish()?;
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let mut parser = DescriptorParser { desc, pos: 0 };
    parser.expect(b'(')?;
    let mut params = Vec::new();
    while parser.peek()? != b')' {
        params.push(parser.field_type()?);
    }
    parser.pos += 1;

    let return_type = if parser.peek()? == b'V' {
        parser.pos += 1;
        ReturnType::Void
    } else {
        ReturnType::Type(parser.field_type()?)
    };
    parser.finish()?;

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

/// `Lcom/example/Foo;` -> `com/example/Foo`.
pub fn descriptor_to_internal_name(desc: &str) -> Option<String> {
    desc.strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

struct DescriptorParser<'a> {
    desc: &'a str,
    pos: usize,
}

impl DescriptorParser<'_> {
    fn invalid(&self) -> Error {
        Error::InvalidDescriptor(self.desc.to_string())
    }

    fn peek(&self) -> Result<u8> {
        self.desc
            .as_bytes()
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.invalid())
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek()? != b {
            return Err(self.invalid());
        }
        self.pos += 1;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.desc.len() {
            return Err(self.invalid());
        }
        Ok(())
    }

    fn field_type(&mut self) -> Result<FieldType> {
        let c = self.peek()?;
        self.pos += 1;
        if let Some(base) = BaseType::from_descriptor(c as char) {
            return Ok(FieldType::Base(base));
        }
        match c {
            b'L' => {
                let rest = &self.desc[self.pos..];
                let end = rest.find(';').ok_or_else(|| self.invalid())?;
                if end == 0 {
                    return Err(self.invalid());
                }
                let name = rest[..end].to_string();
                self.pos += end + 1;
                Ok(FieldType::Object(name))
            }
            b'[' => Ok(FieldType::Array(Box::new(self.field_type()?))),
            _ => Err(self.invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_arrays_report_element_and_depth() {
        let ty = parse_field_descriptor("[[Ljava/lang/String;").unwrap();
        let (element, dims) = ty.element();
        assert_eq!(element, &FieldType::Object("java/lang/String".to_string()));
        assert_eq!(dims, 2);
        assert_eq!(ty.object_name(), Some("java/lang/String"));
        assert_eq!(ty.descriptor(), "[[Ljava/lang/String;");
    }

    #[test]
    fn method_descriptor_with_wide_params() {
        let desc = parse_method_descriptor("(JLjava/util/List;D[I)Ljava/lang/Object;").unwrap();
        let slots: Vec<u16> = desc.params.iter().map(FieldType::slot_size).collect();
        assert_eq!(slots, vec![2, 1, 2, 1]);
        assert_eq!(
            desc.object_names().collect::<Vec<_>>(),
            vec!["java/util/List", "java/lang/Object"]
        );
        assert_eq!(desc.descriptor(), "(JLjava/util/List;D[I)Ljava/lang/Object;");
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for bad in ["", "Q", "L;", "Ljava/lang/String", "II", "[", "(I", "()", "()VV"] {
            let result = if bad.starts_with('(') {
                parse_method_descriptor(bad).map(|_| ())
            } else {
                parse_field_descriptor(bad).map(|_| ())
            };
            assert_eq!(result, Err(Error::InvalidDescriptor(bad.to_string())), "{bad}");
        }
    }

    #[test]
    fn internal_name_from_descriptor() {
        assert_eq!(
            descriptor_to_internal_name("Ljava/lang/Deprecated;").as_deref(),
            Some("java/lang/Deprecated")
        );
        assert_eq!(descriptor_to_internal_name("I"), None);
    }
}
