use std::collections::HashMap;

use jtype_types::{ClassId, TypeData, TypeId, TypeStore, TypeVarId, WildcardKind};

/// Gives every `Foo<?>` in the declarations of `classes` the declared bound
/// of Foo's parameter, so `Foo<T extends Bar>` used as `Foo<?>` reads as
/// `Foo<? extends Bar>`.
///
/// Runs once every formal of the build has its bounds. The bound is taken as
/// resolved from the declaring signature; wildcards inside it are merged
/// where the bound is stored, not where it is copied.
pub(crate) fn merge_wildcard_bounds(
    store: &mut TypeStore,
    object: TypeId,
    classes: impl IntoIterator<Item = ClassId>,
) {
    let mut merger = WildcardMerger {
        store,
        object,
        memo: HashMap::new(),
    };
    let mut bounds: Vec<(TypeVarId, Vec<TypeId>)> = Vec::new();

    for class in classes {
        let Some(mut decl) = merger.store.class(class).cloned() else {
            continue;
        };
        let mut type_params = decl.type_params.clone();

        decl.enclosing_type = decl.enclosing_type.map(|ty| merger.merge(ty));
        decl.super_class = decl.super_class.map(|ty| merger.merge(ty));
        merger.merge_all(&mut decl.interfaces);
        for field in &mut decl.fields {
            field.ty = merger.merge(field.ty);
        }
        for method in decl.constructors.iter_mut().chain(decl.methods.iter_mut()) {
            type_params.extend_from_slice(&method.type_params);
            method.return_type = merger.merge(method.return_type);
            for param in &mut method.params {
                param.ty = merger.merge(param.ty);
            }
            merger.merge_all(&mut method.thrown);
        }
        for var in type_params {
            let Some(param) = merger.store.type_param(var) else {
                continue;
            };
            let mut merged = param.bounds.clone();
            merger.merge_all(&mut merged);
            bounds.push((var, merged));
        }

        if let Some(slot) = merger.store.class_mut(class) {
            *slot = decl;
        }
    }

    // Bounds are read while merging, so they change last.
    for (var, merged) in bounds {
        if let Some(param) = merger.store.type_param_mut(var) {
            param.bounds = merged;
        }
    }
}

struct WildcardMerger<'s> {
    store: &'s mut TypeStore,
    object: TypeId,
    memo: HashMap<TypeId, TypeId>,
}

impl WildcardMerger<'_> {
    fn merge_all(&mut self, types: &mut [TypeId]) {
        for ty in types {
            *ty = self.merge(*ty);
        }
    }

    fn merge(&mut self, ty: TypeId) -> TypeId {
        if let Some(merged) = self.memo.get(&ty) {
            return *merged;
        }
        let merged = match self.store.ty(ty).clone() {
            TypeData::Parameterized {
                generic,
                enclosing,
                args,
            } => {
                let formals = self
                    .store
                    .class(generic)
                    .map(|decl| decl.type_params.clone())
                    .unwrap_or_default();
                let enclosing = enclosing.map(|outer| self.merge(outer));
                let args = args
                    .iter()
                    .enumerate()
                    .map(|(index, arg)| match formals.get(index) {
                        Some(formal) => self.merge_arg(*arg, *formal),
                        None => self.merge(*arg),
                    })
                    .collect();
                self.store.parameterized(generic, enclosing, args)
            }
            TypeData::Array(component) => {
                let component = self.merge(component);
                self.store.array_of(component)
            }
            TypeData::Wildcard { kind, bound } => {
                let bound = self.merge(bound);
                self.store.wildcard(kind, bound)
            }
            _ => ty,
        };
        self.memo.insert(ty, merged);
        merged
    }

    fn merge_arg(&mut self, arg: TypeId, formal: TypeVarId) -> TypeId {
        let unbound_object = matches!(
            self.store.ty(arg),
            TypeData::Wildcard { kind: WildcardKind::Unbound, bound } if *bound == self.object
        );
        if !unbound_object {
            return self.merge(arg);
        }
        let declared = self
            .store
            .type_param(formal)
            .and_then(|param| param.bounds.first().copied());
        match declared {
            Some(declared) => self.store.wildcard(WildcardKind::Unbound, declared),
            None => arg,
        }
    }
}
