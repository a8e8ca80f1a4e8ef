use std::fmt::Write;

use crate::ids::TypeId;
use crate::model::{TypeData, WildcardKind};
use crate::store::TypeStore;

impl TypeStore {
    /// Java source rendering, e.g. `java.util.Map<K, ? extends V>[]`.
    pub fn display(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        match self.ty(ty) {
            TypeData::Primitive(primitive) => out.push_str(primitive.java_name()),
            TypeData::Class(id) | TypeData::Raw(id) => match self.class(*id) {
                Some(decl) => out.push_str(&decl.qualified_name),
                None => {
                    let _ = write!(out, "<removed {id:?}>");
                }
            },
            TypeData::Parameterized {
                generic,
                enclosing,
                args,
            } => {
                let decl = self.class(*generic);
                match (enclosing, decl) {
                    (Some(enclosing), Some(decl)) if self.is_parameterized(*enclosing) => {
                        self.write_type(out, *enclosing);
                        out.push('.');
                        out.push_str(&decl.simple_name);
                    }
                    (_, Some(decl)) => out.push_str(&decl.qualified_name),
                    (_, None) => {
                        let _ = write!(out, "<removed {generic:?}>");
                    }
                }
                if !args.is_empty() {
                    out.push('<');
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(out, *arg);
                    }
                    out.push('>');
                }
            }
            TypeData::Array(component) => {
                self.write_type(out, *component);
                out.push_str("[]");
            }
            TypeData::Wildcard { kind, bound } => match kind {
                WildcardKind::Unbound => out.push('?'),
                WildcardKind::Extends => {
                    out.push_str("? extends ");
                    self.write_type(out, *bound);
                }
                WildcardKind::Super => {
                    out.push_str("? super ");
                    self.write_type(out, *bound);
                }
            },
            TypeData::TypeVar(var) => match self.type_param(*var) {
                Some(param) => out.push_str(&param.name),
                None => {
                    let _ = write!(out, "<unknown {var:?}>");
                }
            },
        }
    }
}
