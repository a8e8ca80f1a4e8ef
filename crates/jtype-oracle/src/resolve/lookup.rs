use jtype_types::{ClassId, TypeData, TypeStore, TypeVarId};

/// Stack of type parameter scopes, innermost last.
#[derive(Debug, Default)]
pub(crate) struct TypeParameterLookup {
    scopes: Vec<Vec<(String, TypeVarId)>>,
}

impl TypeParameterLookup {
    /// Scopes visible inside `class`: those of the enclosing classes whose
    /// instance it can see, then its own.
    pub(crate) fn for_class(store: &TypeStore, class: ClassId) -> Self {
        let mut lookup = Self::default();
        lookup.push_enclosing_scopes(store, class);
        lookup
    }

    fn push_enclosing_scopes(&mut self, store: &TypeStore, class: ClassId) {
        let Some(decl) = store.class(class) else {
            return;
        };
        if let (Some(enclosing), Some(enclosing_type)) = (decl.enclosing, decl.enclosing_type) {
            // A raw enclosing type means the enclosing parameters are out of scope.
            if !matches!(store.ty(enclosing_type), TypeData::Raw(_)) {
                self.push_enclosing_scopes(store, enclosing);
            }
        }
        if !decl.type_params.is_empty() {
            self.push_scope(store, &decl.type_params);
        }
    }

    pub(crate) fn push_scope(&mut self, store: &TypeStore, params: &[TypeVarId]) {
        let scope = params
            .iter()
            .filter_map(|var| Some((store.type_param(*var)?.name.clone(), *var)))
            .collect();
        self.scopes.push(scope);
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<TypeVarId> {
        self.scopes.iter().rev().find_map(|scope| {
            scope
                .iter()
                .find(|(param, _)| param == name)
                .map(|(_, var)| *var)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtype_types::{ClassDecl, ClassKind, DeclKind, Modifiers};
    use pretty_assertions::assert_eq;

    #[test]
    fn inner_scopes_shadow_outer_ones() {
        let mut store = TypeStore::new();
        let outer = store.add_class(ClassDecl::shell(
            "p/Outer",
            DeclKind::Class,
            ClassKind::TopLevel,
            Modifiers::default(),
        ));
        let outer_t = store.add_type_param("T", outer);
        let outer_u = store.add_type_param("U", outer);
        store.class_mut(outer).unwrap().type_params = vec![outer_t, outer_u];
        let inner = store.add_class(ClassDecl::shell(
            "p/Outer$Inner",
            DeclKind::Class,
            ClassKind::Inner,
            Modifiers::default(),
        ));
        let inner_t = store.add_type_param("T", inner);
        let enclosing_type = store.class_type(outer);
        let decl = store.class_mut(inner).unwrap();
        decl.type_params = vec![inner_t];
        decl.enclosing = Some(outer);
        decl.enclosing_type = Some(enclosing_type);

        let mut lookup = TypeParameterLookup::for_class(&store, inner);
        assert_eq!(lookup.lookup("T"), Some(inner_t));
        assert_eq!(lookup.lookup("U"), Some(outer_u));

        let method_t = store.add_type_param("T", inner);
        lookup.push_scope(&store, &[method_t]);
        assert_eq!(lookup.lookup("T"), Some(method_t));
        lookup.pop_scope();
        assert_eq!(lookup.lookup("T"), Some(inner_t));
        assert_eq!(lookup.lookup("V"), None);
    }

    #[test]
    fn raw_enclosing_type_hides_outer_parameters() {
        let mut store = TypeStore::new();
        let outer = store.add_class(ClassDecl::shell(
            "p/Outer",
            DeclKind::Class,
            ClassKind::TopLevel,
            Modifiers::default(),
        ));
        let outer_t = store.add_type_param("T", outer);
        let decl = store.class_mut(outer).unwrap();
        decl.type_params = vec![outer_t];
        decl.is_generic = true;
        let nested = store.add_class(ClassDecl::shell(
            "p/Outer$Nested",
            DeclKind::Class,
            ClassKind::Nested,
            Modifiers::default(),
        ));
        let raw_outer = store.raw_type(outer);
        let decl = store.class_mut(nested).unwrap();
        decl.enclosing = Some(outer);
        decl.enclosing_type = Some(raw_outer);

        assert_eq!(TypeParameterLookup::for_class(&store, nested).lookup("T"), None);
    }
}
