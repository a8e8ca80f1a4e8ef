//! One pass of declaring and resolving the classes of a build.
//!
//! Declaration happens first for every class, so resolution can follow
//! forward references in any order. Resolution is demand driven: resolving
//! a class resolves whatever it mentions, and a class that is already in
//! progress counts as resolved so cycles terminate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexSet;
use jtype_classfile::access::{self, has};
use jtype_classfile::FieldType;
use jtype_types::{
    ClassDecl, ClassId, ClassKind, DeclKind, Diagnostic, Modifiers, TypeId, TypeStore,
};

use crate::collect::{formal_type_params, ClassRecord};
use crate::config::OracleConfig;
use crate::diagnostics::DiagnosticSink;
use crate::error::ContractViolation;
use crate::resolve::{
    merge_wildcard_bounds, resolve_annotations, resolve_field, resolve_method,
    ClassSignatureResolver, TypeParameterLookup,
};
use crate::unit::MethodArgNames;

const CLASS_MODIFIERS: u16 = access::ACC_PUBLIC
    | access::ACC_PRIVATE
    | access::ACC_PROTECTED
    | access::ACC_STATIC
    | access::ACC_FINAL
    | access::ACC_ABSTRACT;

/// A collected class waiting to be declared.
#[derive(Clone, Debug)]
pub(crate) struct PendingClass {
    pub(crate) record: Arc<ClassRecord>,
    pub(crate) location: String,
    pub(crate) last_modified: u64,
}

pub(crate) fn is_package_info(record: &ClassRecord) -> bool {
    record.name == "package-info" || record.name.ends_with("/package-info")
}

/// Whether the class gets a declaration. Anonymous and local classes never
/// do; neither do `package-info` classes, which annotate their package.
pub(crate) fn is_declared(record: &ClassRecord) -> bool {
    !record.has_no_external_name() && !is_package_info(record)
}

/// Classes declared by [`declare_classes`], handed to the resolution pass.
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    records: HashMap<ClassId, Arc<ClassRecord>>,
    locations: HashMap<ClassId, String>,
    /// Internal names of the anonymous and local classes of the build and of
    /// their member classes.
    elided: HashSet<String>,
}

/// Creates a declaration for every declarable class of `pending`.
///
/// Member classes are declared after their enclosing class; one whose
/// enclosing class is neither in the batch nor already published stays
/// undeclared (`None`), as do anonymous, local and `package-info` classes
/// and the members of anonymous and local classes.
pub(crate) fn declare_classes(
    store: &mut TypeStore,
    pending: &[PendingClass],
) -> (Vec<Option<ClassId>>, Declarations) {
    let mut declarations = Declarations::default();
    let batch: HashSet<&str> = pending
        .iter()
        .map(|class| class.record.name.as_str())
        .collect();
    for class in pending {
        if class.record.has_no_external_name() {
            declarations.elided.insert(class.record.name.clone());
        }
    }
    // Members of an elided class are elided with it.
    loop {
        let members: Vec<String> = pending
            .iter()
            .filter(|class| !declarations.elided.contains(&class.record.name))
            .filter(|class| {
                enclosing_name(&class.record)
                    .is_some_and(|outer| declarations.elided.contains(outer))
            })
            .map(|class| class.record.name.clone())
            .collect();
        if members.is_empty() {
            break;
        }
        for name in members {
            tracing::debug!(target: "jtype::resolve", class = %name, "enclosing class is elided");
            declarations.elided.insert(name);
        }
    }

    let mut ids: Vec<Option<ClassId>> = vec![None; pending.len()];
    let mut declared: HashSet<ClassId> = HashSet::new();
    loop {
        let mut progress = false;
        for (index, class) in pending.iter().enumerate() {
            if ids[index].is_some()
                || !is_declared(&class.record)
                || declarations.elided.contains(&class.record.name)
            {
                continue;
            }
            let enclosing = match enclosing_name(&class.record) {
                None => None,
                Some(outer) => match store.lookup(outer) {
                    Some(id) if declared.contains(&id) || !batch.contains(outer) => Some(id),
                    _ => continue,
                },
            };
            let id = declare(store, class, enclosing);
            declarations.records.insert(id, Arc::clone(&class.record));
            declarations.locations.insert(id, class.location.clone());
            declared.insert(id);
            ids[index] = Some(id);
            progress = true;
        }
        if !progress {
            return (ids, declarations);
        }
    }
}

fn declare(store: &mut TypeStore, class: &PendingClass, enclosing: Option<ClassId>) -> ClassId {
    let record = &class.record;
    let kind = DeclKind::from_access(record.access);
    let mut modifiers = Modifiers::from_bits(record.access & CLASS_MODIFIERS);
    if kind.is_interface() {
        modifiers = modifiers.with(access::ACC_STATIC | access::ACC_ABSTRACT);
    }

    let mut shell = ClassDecl::shell(&record.name, kind, record.kind, modifiers);
    shell.source_file = record.source_file.clone();
    shell.location = class.location.clone();
    shell.last_modified = class.last_modified;
    let id = store.add_class(shell);

    let formal_names = match (kind, record.signature.as_deref()) {
        (DeclKind::Enum | DeclKind::Annotation, _) | (_, None) => Vec::new(),
        // A malformed signature is reported when it is resolved.
        (_, Some(signature)) => formal_type_params(signature).unwrap_or_default(),
    };
    let type_params: Vec<_> = formal_names
        .into_iter()
        .map(|name| store.add_type_param(name, id))
        .collect();

    let enclosing_generic = enclosing
        .and_then(|enclosing| store.class(enclosing))
        .is_some_and(|decl| decl.is_generic);
    let is_generic = match kind {
        DeclKind::Enum | DeclKind::Annotation => false,
        _ => !type_params.is_empty() || (record.kind == ClassKind::Inner && enclosing_generic),
    };
    let enclosing_type = enclosing.map(|enclosing| {
        let is_static = has(record.access, access::ACC_STATIC) || kind.is_interface();
        if enclosing_generic && is_static {
            store.raw_type(enclosing)
        } else {
            store.class_type(enclosing)
        }
    });

    if let Some(decl) = store.class_mut(id) {
        decl.type_params = type_params;
        decl.is_generic = is_generic;
        decl.enclosing = enclosing;
        decl.enclosing_type = enclosing_type;
    }
    if let Some(parent) = enclosing.and_then(|enclosing| store.class_mut(enclosing)) {
        parent.nested.push(id);
    }
    tracing::trace!(target: "jtype::resolve", class = %record.name, id = ?id, "declared class");
    id
}

pub(crate) struct BuildContext<'a> {
    pub(crate) store: &'a mut TypeStore,
    pub(crate) config: &'a OracleConfig,
    pub(crate) method_args: &'a MethodArgNames,
    sink: &'a mut dyn DiagnosticSink,
    object: ClassId,
    declarations: Declarations,
    resolved: HashSet<ClassId>,
    failed: IndexSet<ClassId>,
    violation: Option<(String, ContractViolation)>,
    pub(crate) annotation_hint_shown: bool,
    location_stack: Vec<String>,
}

impl<'a> BuildContext<'a> {
    /// `None` if the root class is not declared.
    pub(crate) fn new(
        store: &'a mut TypeStore,
        config: &'a OracleConfig,
        method_args: &'a MethodArgNames,
        sink: &'a mut dyn DiagnosticSink,
        declarations: Declarations,
    ) -> Option<Self> {
        let object = store.lookup(&config.java_lang_object)?;
        Some(Self {
            store,
            config,
            method_args,
            sink,
            object,
            declarations,
            resolved: HashSet::new(),
            failed: IndexSet::new(),
            violation: None,
            annotation_hint_shown: false,
            location_stack: Vec::new(),
        })
    }

    // Reporting.

    pub(crate) fn report(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.location.is_none() {
            diagnostic.location = self.location_stack.last().cloned();
        }
        self.sink.report(diagnostic);
    }

    pub(crate) fn error(&mut self, code: &'static str, message: impl Into<String>) {
        self.report(Diagnostic::error(code, message));
    }

    pub(crate) fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        self.report(Diagnostic::warning(code, message));
    }

    /// Keeps the first violation; resolution winds down once one is set.
    pub(crate) fn violate(&mut self, violation: ContractViolation) {
        if self.violation.is_none() {
            let location = self.location_stack.last().cloned().unwrap_or_default();
            self.violation = Some((location, violation));
        }
    }

    pub(crate) fn take_violation(&mut self) -> Option<(String, ContractViolation)> {
        self.violation.take()
    }

    // Well-known types.

    pub(crate) fn object_class(&self) -> ClassId {
        self.object
    }

    pub(crate) fn object_type(&mut self) -> TypeId {
        self.store.class_type(self.object)
    }

    pub(crate) fn qualified_name(&self, class: ClassId) -> String {
        match self.store.class(class) {
            Some(decl) => decl.qualified_name.clone(),
            None => format!("{class:?}"),
        }
    }

    /// Erased type of a descriptor type. `None` if a class is unknown or
    /// failed to resolve.
    pub(crate) fn descriptor_type(&mut self, ty: &FieldType) -> Option<TypeId> {
        match ty {
            FieldType::Base(base) => Some(self.store.primitive((*base).into())),
            FieldType::Object(name) => self.class_type_by_name(name),
            FieldType::Array(component) => {
                let component = self.descriptor_type(component)?;
                Some(self.store.array_of(component))
            }
        }
    }

    /// Raw type of a class named by its internal name. Anonymous and local
    /// classes are elided from the model and stand in as `Object`.
    pub(crate) fn class_type_by_name(&mut self, internal_name: &str) -> Option<TypeId> {
        match self.store.lookup(internal_name) {
            Some(class) if self.resolve_class(class) => Some(self.store.raw_type(class)),
            Some(_) => None,
            None if self.declarations.elided.contains(internal_name) => {
                tracing::debug!(
                    target: "jtype::resolve",
                    class = internal_name,
                    "elided class used as java.lang.Object"
                );
                Some(self.object_type())
            }
            None => None,
        }
    }

    // Resolution.

    /// Resolves a declared class. Published classes from earlier builds are
    /// already resolved.
    pub(crate) fn resolve_class(&mut self, class: ClassId) -> bool {
        if self.failed.contains(&class) {
            return false;
        }
        if !self.resolved.insert(class) {
            return true;
        }
        let Some(record) = self.declarations.records.get(&class).cloned() else {
            return true;
        };

        let location = self
            .declarations
            .locations
            .get(&class)
            .cloned()
            .unwrap_or_default();
        self.location_stack.push(location);
        let _span = tracing::debug_span!(target: "jtype::resolve", "resolve_class", class = %record.name)
            .entered();
        let ok = self.resolve_record(class, &record);
        if !ok {
            self.failed.insert(class);
            let message = format!("Unable to resolve class {}", self.qualified_name(class));
            self.error("unresolved-class", message);
        }
        self.location_stack.pop();
        ok
    }

    fn resolve_record(&mut self, class: ClassId, record: &ClassRecord) -> bool {
        let enclosing = self.store.class(class).and_then(|decl| decl.enclosing);
        if let Some(enclosing) = enclosing {
            if !self.resolve_class(enclosing) {
                let message = format!(
                    "Enclosing class {} of {} failed to resolve",
                    self.qualified_name(enclosing),
                    record.name
                );
                self.warn("unresolved-enclosing", message);
                return false;
            }
        }

        let annotations = resolve_annotations(self, &record.annotations);
        if let Some(decl) = self.store.class_mut(class) {
            decl.annotations = annotations;
        }

        let mut lookup = TypeParameterLookup::for_class(&*self.store, class);
        let supertypes_ok = match record.signature.as_deref() {
            Some(signature) => ClassSignatureResolver::resolve(self, &lookup, class, signature),
            None => self.resolve_erased_supertypes(class, record),
        };
        if !supertypes_ok || self.violation.is_some() {
            return false;
        }

        for method in &record.methods {
            if !resolve_method(self, class, method, &mut lookup) || self.violation.is_some() {
                return false;
            }
        }
        let mut ordinal = 0;
        for field in &record.fields {
            if !resolve_field(self, class, field, &lookup, &mut ordinal) {
                return false;
            }
        }
        true
    }

    /// Supertypes of a class without a generic signature.
    fn resolve_erased_supertypes(&mut self, class: ClassId, record: &ClassRecord) -> bool {
        let is_interface = self.store.class(class).is_some_and(|decl| decl.is_interface());
        if let (Some(super_name), false) = (record.super_name.as_deref(), is_interface) {
            let Some(superclass) = self.class_type_by_name(super_name) else {
                self.warn(
                    "unresolved-supertype",
                    format!("Unable to resolve superclass {super_name}"),
                );
                return false;
            };
            if let Some(decl) = self.store.class_mut(class) {
                decl.super_class = Some(superclass);
            }
        }
        for interface in &record.interfaces {
            let Some(ty) = self.class_type_by_name(interface) else {
                self.warn(
                    "unresolved-supertype",
                    format!("Unable to resolve interface {interface}"),
                );
                return false;
            };
            if let Some(decl) = self.store.class_mut(class) {
                decl.interfaces.push(ty);
            }
        }
        true
    }

    /// Applies the annotations of a `package-info` class to its package and
    /// returns the dotted package name.
    pub(crate) fn declare_package(&mut self, record: &ClassRecord, location: &str) -> String {
        let package = record
            .name
            .rsplit_once('/')
            .map(|(package, _)| package.replace('/', "."))
            .unwrap_or_default();
        self.location_stack.push(location.to_string());
        let annotations = resolve_annotations(self, &record.annotations);
        self.location_stack.pop();
        self.store.package_mut(&package).annotations = annotations;
        package
    }

    /// Completes the classes resolved so far; call once every class of the
    /// build has been resolved.
    pub(crate) fn finish(&mut self) {
        let mut classes: Vec<ClassId> = self
            .declarations
            .records
            .keys()
            .copied()
            .filter(|class| self.resolved.contains(class) && !self.failed.contains(class))
            .collect();
        classes.sort();
        let object = self.object_type();
        merge_wildcard_bounds(&mut *self.store, object, classes);
    }

    /// Whether `internal_name` is an anonymous or local class of the build,
    /// or a member of one.
    pub(crate) fn is_elided(&self, internal_name: &str) -> bool {
        self.declarations.elided.contains(internal_name)
    }

    pub(crate) fn is_failed(&self, class: ClassId) -> bool {
        self.failed.contains(&class)
    }

    /// Logs a resolution summary at debug level.
    pub(crate) fn log_summary(&self) {
        if self.failed.is_empty() {
            return;
        }
        let failed: Vec<_> = self
            .failed
            .iter()
            .map(|class| self.qualified_name(*class))
            .collect();
        tracing::debug!(target: "jtype::resolve", ?failed, "classes failed to resolve");
    }
}

/// Outer class of a member class. Top-level classes have none, and the
/// outer class of anonymous and local classes is not a declaring scope.
fn enclosing_name(record: &ClassRecord) -> Option<&str> {
    match record.kind {
        ClassKind::Inner | ClassKind::Nested => record.outer_class.as_deref(),
        _ => None,
    }
}
