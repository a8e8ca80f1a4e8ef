use jtype_classfile::access::{self, has};
use jtype_classfile::{BaseType, ConstValue};

use crate::ids::{ClassId, TypeId, TypeVarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Void,
    ];

    /// Maps a signature/descriptor base type character, including `V`.
    pub fn from_descriptor(c: char) -> Option<Self> {
        if c == 'V' {
            return Some(PrimitiveType::Void);
        }
        BaseType::from_descriptor(c).map(Self::from)
    }

    pub fn java_name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Boolean => BaseType::Boolean.java_name(),
            PrimitiveType::Byte => BaseType::Byte.java_name(),
            PrimitiveType::Char => BaseType::Char.java_name(),
            PrimitiveType::Short => BaseType::Short.java_name(),
            PrimitiveType::Int => BaseType::Int.java_name(),
            PrimitiveType::Long => BaseType::Long.java_name(),
            PrimitiveType::Float => BaseType::Float.java_name(),
            PrimitiveType::Double => BaseType::Double.java_name(),
        }
    }
}

impl From<BaseType> for PrimitiveType {
    fn from(base: BaseType) -> Self {
        match base {
            BaseType::Boolean => PrimitiveType::Boolean,
            BaseType::Byte => PrimitiveType::Byte,
            BaseType::Char => PrimitiveType::Char,
            BaseType::Short => PrimitiveType::Short,
            BaseType::Int => PrimitiveType::Int,
            BaseType::Long => PrimitiveType::Long,
            BaseType::Float => PrimitiveType::Float,
            BaseType::Double => PrimitiveType::Double,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `?`; the bound is `Object` or the declared bound of the formal parameter.
    Unbound,
    Extends,
    Super,
}

/// Structural identity of an interned type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    Primitive(PrimitiveType),
    /// A declared class used as itself. For generic declarations this is the
    /// generic type, carrying its formal parameters.
    Class(ClassId),
    /// A generic declaration used without type arguments.
    Raw(ClassId),
    Parameterized {
        generic: ClassId,
        enclosing: Option<TypeId>,
        args: Vec<TypeId>,
    },
    /// Multi-dimensional arrays nest; the depth is the nesting count.
    Array(TypeId),
    Wildcard {
        kind: WildcardKind,
        bound: TypeId,
    },
    TypeVar(TypeVarId),
}

/// Declaration flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl DeclKind {
    pub fn from_access(flags: u16) -> Self {
        if has(flags, access::ACC_ANNOTATION) {
            DeclKind::Annotation
        } else if has(flags, access::ACC_INTERFACE) {
            DeclKind::Interface
        } else if has(flags, access::ACC_ENUM) {
            DeclKind::Enum
        } else {
            DeclKind::Class
        }
    }

    pub fn is_interface(self) -> bool {
        matches!(self, DeclKind::Interface | DeclKind::Annotation)
    }
}

/// How a class is nested in its enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    TopLevel,
    /// Non-static member class; constructors take the enclosing instance.
    Inner,
    /// Static member class.
    Nested,
    /// Declared inside a method without a name.
    Anonymous,
    /// Named class declared inside a method.
    Local,
}

impl ClassKind {
    pub fn has_hidden_constructor_arg(self) -> bool {
        self == ClassKind::Inner
    }

    pub fn has_no_external_name(self) -> bool {
        matches!(self, ClassKind::Anonymous | ClassKind::Local)
    }
}

/// Access and property flags, stored as JVM access bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u16);

impl Modifiers {
    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn with(self, bits: u16) -> Self {
        Self(self.0 | bits)
    }

    pub fn without(self, bits: u16) -> Self {
        Self(self.0 & !bits)
    }

    pub fn contains(self, bits: u16) -> bool {
        self.0 & bits == bits
    }

    pub fn is_public(self) -> bool {
        self.contains(access::ACC_PUBLIC)
    }

    pub fn is_private(self) -> bool {
        self.contains(access::ACC_PRIVATE)
    }

    pub fn is_protected(self) -> bool {
        self.contains(access::ACC_PROTECTED)
    }

    pub fn is_static(self) -> bool {
        self.contains(access::ACC_STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(access::ACC_FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(access::ACC_ABSTRACT)
    }

    /// Java source keywords, in canonical order.
    pub fn keywords(self) -> Vec<&'static str> {
        [
            (access::ACC_PUBLIC, "public"),
            (access::ACC_PROTECTED, "protected"),
            (access::ACC_PRIVATE, "private"),
            (access::ACC_ABSTRACT, "abstract"),
            (access::ACC_STATIC, "static"),
            (access::ACC_FINAL, "final"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, word)| word)
        .collect()
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Modifiers({:#06x} {:?})", self.0, self.keywords())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDecl {
    /// The annotation interface, as a class type.
    pub annotation_type: TypeId,
    pub visible: bool,
    pub values: Vec<(String, AnnotationValue)>,
}

impl AnnotationDecl {
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Const(ConstValue),
    Enum { enum_type: TypeId, constant: String },
    Class(TypeId),
    Annotation(Box<AnnotationDecl>),
    Array(Vec<AnnotationValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDecl {
    pub name: String,
    /// Declaring class; for method type parameters, the method's owner.
    pub owner: ClassId,
    /// Resolved bounds. Empty until the declaring signature is resolved.
    pub bounds: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeId,
    pub modifiers: Modifiers,
    pub annotations: Vec<AnnotationDecl>,
    /// Position among the enum constants, for enum constant fields.
    pub enum_ordinal: Option<u32>,
    /// Compile-time constant value.
    pub constant: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeId,
    pub annotations: Vec<AnnotationDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    /// Erased JVM descriptor, as found in the class file.
    pub descriptor: String,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeVarId>,
    pub return_type: TypeId,
    pub params: Vec<ParamDecl>,
    /// Whether `params` carry names from debug info or source.
    pub real_param_names: bool,
    pub thrown: Vec<TypeId>,
    pub annotations: Vec<AnnotationDecl>,
    pub is_varargs: bool,
    /// Default of an annotation interface element.
    pub default_value: Option<AnnotationValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// `com/example/Outer$Inner`
    pub internal_name: String,
    /// `com.example.Outer.Inner`
    pub qualified_name: String,
    /// `com.example`, empty for the default package.
    pub package: String,
    pub simple_name: String,
    pub kind: DeclKind,
    pub nesting: ClassKind,
    pub modifiers: Modifiers,
    pub enclosing: Option<ClassId>,
    /// Enclosing type as seen from this class: raw, parameterized or plain.
    pub enclosing_type: Option<TypeId>,
    pub type_params: Vec<TypeVarId>,
    /// Declares type parameters, or is a non-static member of a generic class.
    pub is_generic: bool,
    pub super_class: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<MethodDecl>,
    pub methods: Vec<MethodDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub nested: Vec<ClassId>,
    pub source_file: Option<String>,
    /// Location of the compilation unit that produced this class.
    pub location: String,
    pub last_modified: u64,
}

impl ClassDecl {
    /// A declaration carrying only its name, as created before resolution.
    pub fn shell(internal_name: &str, kind: DeclKind, nesting: ClassKind, modifiers: Modifiers) -> Self {
        let (package, _) = split_package(internal_name);
        Self {
            internal_name: internal_name.to_string(),
            qualified_name: internal_name.replace(['/', '$'], "."),
            package: package.replace('/', "."),
            simple_name: simple_name(internal_name).to_string(),
            kind,
            nesting,
            modifiers,
            enclosing: None,
            enclosing_type: None,
            type_params: Vec::new(),
            is_generic: false,
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            nested: Vec::new(),
            source_file: None,
            location: String::new(),
            last_modified: 0,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDecl> + 'a {
        self.methods.iter().filter(move |method| method.name == name)
    }

    pub fn annotation(&self, annotation_type: TypeId) -> Option<&AnnotationDecl> {
        self.annotations
            .iter()
            .find(|annotation| annotation.annotation_type == annotation_type)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageDecl {
    /// Dotted name, empty for the default package.
    pub name: String,
    pub annotations: Vec<AnnotationDecl>,
}

/// `com/example/Foo$Bar` -> (`com/example`, `Foo$Bar`).
pub(crate) fn split_package(internal_name: &str) -> (&str, &str) {
    match internal_name.rfind('/') {
        Some(slash) => (&internal_name[..slash], &internal_name[slash + 1..]),
        None => ("", internal_name),
    }
}

/// The source-level simple name: the segment after the last `$` of the
/// binary name, or the whole class name for top-level classes.
pub(crate) fn simple_name(internal_name: &str) -> &str {
    let (_, class) = split_package(internal_name);
    match class.rfind('$') {
        Some(dollar) if dollar + 1 < class.len() => &class[dollar + 1..],
        _ => class,
    }
}
