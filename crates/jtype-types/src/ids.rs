use std::fmt;

/// Identity of one class declaration within a [`crate::TypeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

/// Handle of an interned type. Equal handles denote the same type object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Identity of a declared formal type parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(u32);

macro_rules! impl_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

impl_id!(ClassId, "ClassId#");
impl_id!(TypeId, "TypeId#");
impl_id!(TypeVarId, "TypeVarId#");

impl TypeId {
    // Reserved ids; `TypeStore::new` interns the primitives in this order.
    pub const BOOLEAN: TypeId = TypeId(0);
    pub const BYTE: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const SHORT: TypeId = TypeId(3);
    pub const INT: TypeId = TypeId(4);
    pub const LONG: TypeId = TypeId(5);
    pub const FLOAT: TypeId = TypeId(6);
    pub const DOUBLE: TypeId = TypeId(7);
    pub const VOID: TypeId = TypeId(8);

    pub(crate) const FIRST_DYNAMIC: u32 = 9;

    #[inline]
    pub fn is_primitive(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}
