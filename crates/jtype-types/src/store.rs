use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ids::{ClassId, TypeId, TypeVarId};
use crate::model::{
    AnnotationDecl, AnnotationValue, ClassDecl, PackageDecl, PrimitiveType, TypeData,
    TypeParamDecl, WildcardKind,
};

/// Arena of declarations plus the interning table for structural types.
///
/// Cloning is cheap enough to build on a scratch copy and swap it in once the
/// whole build has succeeded.
#[derive(Debug, Clone)]
pub struct TypeStore {
    classes: Vec<Option<ClassDecl>>,
    by_internal_name: HashMap<String, ClassId>,
    type_params: Vec<Option<TypeParamDecl>>,
    free_type_params: Vec<TypeVarId>,
    types: Vec<Option<TypeData>>,
    free_types: Vec<TypeId>,
    interned: HashMap<TypeData, TypeId>,
    packages: BTreeMap<String, PackageDecl>,
}

/// Result summary of [`TypeStore::collect_garbage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreGcReport {
    pub freed_types: usize,
    pub freed_type_params: usize,
    pub live_types: usize,
    pub live_type_params: usize,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let mut store = Self {
            classes: Vec::new(),
            by_internal_name: HashMap::new(),
            type_params: Vec::new(),
            free_type_params: Vec::new(),
            types: Vec::new(),
            free_types: Vec::new(),
            interned: HashMap::new(),
            packages: BTreeMap::new(),
        };
        for primitive in PrimitiveType::ALL {
            store.intern(TypeData::Primitive(primitive));
        }
        debug_assert_eq!(store.types.len() as u32, TypeId::FIRST_DYNAMIC);
        store
    }

    // Declarations.

    /// Registers a declaration under a fresh id, shadowing any previous
    /// declaration with the same internal name.
    pub fn add_class(&mut self, decl: ClassDecl) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        self.by_internal_name.insert(decl.internal_name.clone(), id);
        self.classes.push(Some(decl));
        id
    }

    /// Drops a declaration. Its id is retired, never handed out again.
    pub fn remove_class(&mut self, id: ClassId) -> Option<ClassDecl> {
        let decl = self.classes.get_mut(id.index())?.take()?;
        if self.by_internal_name.get(&decl.internal_name) == Some(&id) {
            self.by_internal_name.remove(&decl.internal_name);
        }
        Some(decl)
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDecl> {
        self.classes.get(id.index())?.as_ref()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDecl> {
        self.classes.get_mut(id.index())?.as_mut()
    }

    pub fn lookup(&self, internal_name: &str) -> Option<ClassId> {
        self.by_internal_name.get(internal_name).copied()
    }

    /// Live declarations in id order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDecl)> {
        self.classes
            .iter()
            .enumerate()
            .filter_map(|(index, decl)| Some((ClassId::from_index(index), decl.as_ref()?)))
    }

    pub fn add_type_param(&mut self, name: impl Into<String>, owner: ClassId) -> TypeVarId {
        let param = TypeParamDecl {
            name: name.into(),
            owner,
            bounds: Vec::new(),
        };
        if let Some(id) = self.free_type_params.pop() {
            self.type_params[id.index()] = Some(param);
            return id;
        }
        let id = TypeVarId::from_index(self.type_params.len());
        self.type_params.push(Some(param));
        id
    }

    pub fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDecl> {
        self.type_params.get(id.index())?.as_ref()
    }

    pub fn type_param_mut(&mut self, id: TypeVarId) -> Option<&mut TypeParamDecl> {
        self.type_params.get_mut(id.index())?.as_mut()
    }

    pub fn package(&self, name: &str) -> Option<&PackageDecl> {
        self.packages.get(name)
    }

    pub fn package_mut(&mut self, name: &str) -> &mut PackageDecl {
        self.packages
            .entry(name.to_string())
            .or_insert_with(|| PackageDecl {
                name: name.to_string(),
                annotations: Vec::new(),
            })
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageDecl> {
        self.packages.values()
    }

    pub fn remove_package(&mut self, name: &str) -> Option<PackageDecl> {
        self.packages.remove(name)
    }

    // Types.

    pub fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(id) = self.interned.get(&data) {
            return *id;
        }
        let id = match self.free_types.pop() {
            Some(id) => {
                self.types[id.index()] = Some(data.clone());
                id
            }
            None => {
                self.types.push(Some(data.clone()));
                TypeId::from_index(self.types.len() - 1)
            }
        };
        self.interned.insert(data, id);
        id
    }

    /// Structure of an interned type.
    ///
    /// # Panics
    ///
    /// If `id` was not produced by this store (or the store it was cloned
    /// from), or was freed by [`collect_garbage`](Self::collect_garbage).
    pub fn ty(&self, id: TypeId) -> &TypeData {
        match &self.types[id.index()] {
            Some(data) => data,
            None => panic!("{id:?} was collected"),
        }
    }

    /// Number of live interned types, primitives included.
    pub fn type_count(&self) -> usize {
        self.interned.len()
    }

    /// Number of live type parameters.
    pub fn type_param_count(&self) -> usize {
        self.type_params.len() - self.free_type_params.len()
    }

    pub fn primitive(&self, primitive: PrimitiveType) -> TypeId {
        TypeId::from_index(primitive as usize)
    }

    pub fn class_type(&mut self, class: ClassId) -> TypeId {
        self.intern(TypeData::Class(class))
    }

    /// The raw form of a generic declaration; the plain class type otherwise.
    pub fn raw_type(&mut self, class: ClassId) -> TypeId {
        if self.class(class).is_some_and(|decl| decl.is_generic) {
            self.intern(TypeData::Raw(class))
        } else {
            self.class_type(class)
        }
    }

    pub fn parameterized(
        &mut self,
        generic: ClassId,
        enclosing: Option<TypeId>,
        args: Vec<TypeId>,
    ) -> TypeId {
        self.intern(TypeData::Parameterized {
            generic,
            enclosing,
            args,
        })
    }

    pub fn array_of(&mut self, component: TypeId) -> TypeId {
        self.intern(TypeData::Array(component))
    }

    pub fn array_of_depth(&mut self, mut element: TypeId, dims: usize) -> TypeId {
        for _ in 0..dims {
            element = self.array_of(element);
        }
        element
    }

    pub fn wildcard(&mut self, kind: WildcardKind, bound: TypeId) -> TypeId {
        self.intern(TypeData::Wildcard { kind, bound })
    }

    pub fn type_var(&mut self, var: TypeVarId) -> TypeId {
        self.intern(TypeData::TypeVar(var))
    }

    /// The declaration behind a class-like type (plain, raw or parameterized).
    pub fn class_of(&self, ty: TypeId) -> Option<ClassId> {
        match self.ty(ty) {
            TypeData::Class(id) | TypeData::Raw(id) => Some(*id),
            TypeData::Parameterized { generic, .. } => Some(*generic),
            _ => None,
        }
    }

    pub fn is_parameterized(&self, ty: TypeId) -> bool {
        matches!(self.ty(ty), TypeData::Parameterized { .. })
    }

    /// Upper bound of a wildcard: its bound for `?` and `? extends`, `None`
    /// for `? super` (whose upper bound is `Object`).
    pub fn upper_bound(&self, ty: TypeId) -> Option<TypeId> {
        match self.ty(ty) {
            TypeData::Wildcard {
                kind: WildcardKind::Unbound | WildcardKind::Extends,
                bound,
            } => Some(*bound),
            _ => None,
        }
    }

    pub fn lower_bound(&self, ty: TypeId) -> Option<TypeId> {
        match self.ty(ty) {
            TypeData::Wildcard {
                kind: WildcardKind::Super,
                bound,
            } => Some(*bound),
            _ => None,
        }
    }

    /// Array depth and the innermost element type.
    pub fn array_element(&self, mut ty: TypeId) -> (TypeId, usize) {
        let mut dims = 0;
        while let TypeData::Array(component) = self.ty(ty) {
            ty = *component;
            dims += 1;
        }
        (ty, dims)
    }

    /// Formal parameter names of a class, in order.
    pub fn type_param_names(&self, class: ClassId) -> Vec<&str> {
        self.class(class)
            .map(|decl| {
                decl.type_params
                    .iter()
                    .filter_map(|var| self.type_param(*var))
                    .map(|param| param.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    // Garbage collection.

    /// Frees the interned types and type parameters that no live declaration
    /// or package reaches, such as those of removed classes. Freed slots are
    /// handed out again; class ids are not.
    ///
    /// Ids of freed types and type parameters held outside the store become
    /// invalid.
    pub fn collect_garbage(&mut self) -> StoreGcReport {
        let mut marker = Marker {
            store: self,
            types: HashSet::new(),
            type_params: HashSet::new(),
            stack: Vec::new(),
        };
        marker.mark_roots();
        let Marker {
            types: live_types,
            type_params: live_params,
            ..
        } = marker;

        let mut report = StoreGcReport::default();
        for index in TypeId::FIRST_DYNAMIC as usize..self.types.len() {
            let id = TypeId::from_index(index);
            if live_types.contains(&id) {
                continue;
            }
            if let Some(data) = self.types[index].take() {
                self.interned.remove(&data);
                self.free_types.push(id);
                report.freed_types += 1;
            }
        }
        for index in 0..self.type_params.len() {
            let id = TypeVarId::from_index(index);
            if live_params.contains(&id) {
                continue;
            }
            if self.type_params[index].take().is_some() {
                self.free_type_params.push(id);
                report.freed_type_params += 1;
            }
        }
        // `pop` hands out the lowest id first.
        self.free_types.sort_by(|a, b| b.cmp(a));
        self.free_type_params.sort_by(|a, b| b.cmp(a));

        report.live_types = self.type_count();
        report.live_type_params = self.type_param_count();
        report
    }
}

struct Marker<'s> {
    store: &'s TypeStore,
    types: HashSet<TypeId>,
    type_params: HashSet<TypeVarId>,
    stack: Vec<TypeId>,
}

impl Marker<'_> {
    fn mark_roots(&mut self) {
        for index in 0..TypeId::FIRST_DYNAMIC as usize {
            self.types.insert(TypeId::from_index(index));
        }
        let store = self.store;
        for (_, decl) in store.classes() {
            self.mark_class(decl);
        }
        for package in store.packages() {
            self.mark_annotations(&package.annotations);
        }
        self.drain();
    }

    fn mark_class(&mut self, decl: &ClassDecl) {
        self.mark_params(&decl.type_params);
        self.push_all(decl.enclosing_type.iter().chain(&decl.super_class));
        self.push_all(&decl.interfaces);
        self.mark_annotations(&decl.annotations);
        for field in &decl.fields {
            self.push(field.ty);
            self.mark_annotations(&field.annotations);
        }
        for method in decl.constructors.iter().chain(&decl.methods) {
            self.mark_params(&method.type_params);
            self.push(method.return_type);
            for param in &method.params {
                self.push(param.ty);
                self.mark_annotations(&param.annotations);
            }
            self.push_all(&method.thrown);
            self.mark_annotations(&method.annotations);
            if let Some(value) = &method.default_value {
                self.mark_value(value);
            }
        }
    }

    fn mark_params(&mut self, params: &[TypeVarId]) {
        for var in params {
            self.mark_param(*var);
        }
    }

    fn mark_param(&mut self, var: TypeVarId) {
        if !self.type_params.insert(var) {
            return;
        }
        let store = self.store;
        if let Some(param) = store.type_param(var) {
            self.push_all(&param.bounds);
        }
    }

    fn mark_annotations(&mut self, annotations: &[AnnotationDecl]) {
        for annotation in annotations {
            self.push(annotation.annotation_type);
            for (_, value) in &annotation.values {
                self.mark_value(value);
            }
        }
    }

    fn mark_value(&mut self, value: &AnnotationValue) {
        match value {
            AnnotationValue::Const(_) => {}
            AnnotationValue::Enum { enum_type, .. } => self.push(*enum_type),
            AnnotationValue::Class(ty) => self.push(*ty),
            AnnotationValue::Annotation(annotation) => {
                self.mark_annotations(std::slice::from_ref(&**annotation))
            }
            AnnotationValue::Array(values) => {
                for value in values {
                    self.mark_value(value);
                }
            }
        }
    }

    fn push(&mut self, ty: TypeId) {
        if self.types.insert(ty) {
            self.stack.push(ty);
        }
    }

    fn push_all<'t>(&mut self, types: impl IntoIterator<Item = &'t TypeId>) {
        for ty in types {
            self.push(*ty);
        }
    }

    fn drain(&mut self) {
        let store = self.store;
        while let Some(ty) = self.stack.pop() {
            match store.ty(ty) {
                TypeData::Parameterized {
                    enclosing, args, ..
                } => {
                    self.push_all(enclosing.iter().chain(args));
                }
                TypeData::Array(inner) | TypeData::Wildcard { bound: inner, .. } => {
                    self.push(*inner)
                }
                TypeData::TypeVar(var) => self.mark_param(*var),
                TypeData::Primitive(_) | TypeData::Class(_) | TypeData::Raw(_) => {}
            }
        }
    }
}
