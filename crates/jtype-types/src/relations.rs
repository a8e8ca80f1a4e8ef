use std::collections::HashSet;

use crate::ids::{ClassId, TypeId};
use crate::model::TypeData;
use crate::store::TypeStore;
use crate::JAVA_LANG_OBJECT;

impl TypeStore {
    /// The class a reference type erases to; `None` for primitives and
    /// arrays. Type variables and wildcards erase to their first bound.
    pub fn erased_class(&self, ty: TypeId) -> Option<ClassId> {
        let mut seen = HashSet::new();
        let mut current = ty;
        loop {
            if !seen.insert(current) {
                return None;
            }
            match self.ty(current) {
                TypeData::Class(id) | TypeData::Raw(id) => return Some(*id),
                TypeData::Parameterized { generic, .. } => return Some(*generic),
                TypeData::TypeVar(var) => match self.type_param(*var)?.bounds.first() {
                    Some(bound) => current = *bound,
                    None => return self.lookup(JAVA_LANG_OBJECT),
                },
                TypeData::Wildcard { .. } => match self.upper_bound(current) {
                    Some(bound) => current = bound,
                    None => return self.lookup(JAVA_LANG_OBJECT),
                },
                TypeData::Primitive(_) | TypeData::Array(_) => return None,
            }
        }
    }

    /// Whether `sub` is `sup` or inherits from it through superclasses or
    /// interfaces.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![sub];
        while let Some(id) = stack.pop() {
            if id == sup {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            let Some(decl) = self.class(id) else {
                continue;
            };
            stack.extend(
                decl.super_class
                    .iter()
                    .chain(decl.interfaces.iter())
                    .filter_map(|ty| self.class_of(*ty)),
            );
        }
        false
    }

    /// Assignment compatibility on erasure: identity for primitives,
    /// subclassing for class types, covariance for reference arrays, and
    /// everything reference-typed to `Object`.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        if from.is_primitive() || to.is_primitive() {
            return false;
        }

        let object = self.lookup(JAVA_LANG_OBJECT);
        if object.is_some() && self.erased_class(to) == object && !is_wildcard(self.ty(to)) {
            return true;
        }

        match (self.ty(from), self.ty(to)) {
            (TypeData::Array(from_component), TypeData::Array(to_component)) => {
                let (from_component, to_component) = (*from_component, *to_component);
                !from_component.is_primitive() && self.is_assignable(from_component, to_component)
            }
            (TypeData::Array(_), _) | (_, TypeData::Array(_)) => false,
            _ => match (self.erased_class(from), self.erased_class(to)) {
                (Some(sub), Some(sup)) => self.is_subclass(sub, sup),
                _ => false,
            },
        }
    }
}

fn is_wildcard(data: &TypeData) -> bool {
    matches!(data, TypeData::Wildcard { .. })
}
