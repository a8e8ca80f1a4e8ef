use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use jtype_classfile::ClassFile;
use jtype_types::{ClassDecl, ClassId, Diagnostic, PackageDecl, Severity, TypeId, TypeStore};

use crate::build::{self, BuildContext, PendingClass};
use crate::collect::{collect_references, ClassCollector, ClassRecord};
use crate::config::OracleConfig;
use crate::deps::{self, UnitDeps};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{NotFound, OracleError};
use crate::resolve::rebind_annotations;
use crate::unit::{CompilationUnit, MethodArgNames};

/// Whether a unit's types are part of the published graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitStatus {
    Valid,
    Invalid { reason: String },
}

impl UnitStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, UnitStatus::Valid)
    }
}

/// Outcome of one [`TypeOracle::build`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildReport {
    /// Units that went through collection and resolution, valid or not.
    pub rebuilt: Vec<String>,
    /// Units left out of the graph, with the reason.
    pub pruned: Vec<(String, String)>,
    pub removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn is_pruned(&self, type_name: &str) -> bool {
        self.pruned.iter().any(|(name, _)| name == type_name)
    }
}

#[derive(Debug)]
struct UnitEntry {
    unit: CompilationUnit,
    deps: UnitDeps,
    classes: Vec<ClassId>,
    packages: Vec<String>,
    status: UnitStatus,
}

enum Collection {
    Collected {
        records: Vec<Arc<ClassRecord>>,
        deps: UnitDeps,
    },
    Invalid(String),
}

/// The published model of every type of a set of compilation units.
///
/// Units are staged with [`add_units`](Self::add_units) and
/// [`remove_unit`](Self::remove_unit) and take effect on
/// [`build`](Self::build). A build only touches the staged units and the
/// units depending on them: every other type keeps its [`ClassId`].
#[derive(Debug)]
pub struct TypeOracle {
    config: OracleConfig,
    store: TypeStore,
    units: IndexMap<String, UnitEntry>,
    staged: IndexMap<String, CompilationUnit>,
    removed: IndexSet<String>,
    by_qualified_name: HashMap<String, ClassId>,
}

impl Default for TypeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeOracle {
    pub fn new() -> Self {
        Self::with_config(OracleConfig::default())
    }

    pub fn with_config(config: OracleConfig) -> Self {
        Self {
            config,
            store: TypeStore::new(),
            units: IndexMap::new(),
            staged: IndexMap::new(),
            removed: IndexSet::new(),
            by_qualified_name: HashMap::new(),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Stages a unit, replacing any unit with the same type name.
    pub fn add_unit(&mut self, unit: CompilationUnit) {
        self.removed.shift_remove(&unit.type_name);
        self.staged.insert(unit.type_name.clone(), unit);
    }

    pub fn add_units(&mut self, units: impl IntoIterator<Item = CompilationUnit>) {
        for unit in units {
            self.add_unit(unit);
        }
    }

    /// Stages the removal of a unit. Returns `false` if it is unknown.
    pub fn remove_unit(&mut self, type_name: &str) -> bool {
        let staged = self.staged.shift_remove(type_name).is_some();
        if self.units.contains_key(type_name) {
            self.removed.insert(type_name.to_string());
            return true;
        }
        staged
    }

    /// Stages `units` and builds.
    pub fn refresh(
        &mut self,
        units: impl IntoIterator<Item = CompilationUnit>,
    ) -> Result<BuildReport, OracleError> {
        self.add_units(units);
        self.build()
    }

    /// Applies the staged changes.
    ///
    /// Units with errors, and units depending on them, are left out of the
    /// graph and listed in [`BuildReport::pruned`]. A contract violation
    /// aborts the build with the published graph and the staged changes
    /// untouched.
    pub fn build(&mut self) -> Result<BuildReport, OracleError> {
        let _span = tracing::info_span!(
            target: "jtype::oracle",
            "build",
            staged = self.staged.len(),
            removed = self.removed.len()
        )
        .entered();

        let mut diagnostics = Vec::new();
        let mut sink = TracingSink::new(&mut diagnostics);

        // Everything the staged and removed units provided or will provide.
        let mut changed: HashSet<String> = HashSet::new();
        for name in self.staged.keys().chain(self.removed.iter()) {
            if let Some(entry) = self.units.get(name) {
                changed.extend(unit_class_names(&entry.unit));
            }
        }
        for unit in self.staged.values() {
            changed.extend(unit_class_names(unit));
        }

        let mut rebuild: IndexSet<String> = self.staged.keys().cloned().collect();
        for (name, entry) in &self.units {
            if !entry.status.is_valid() && !self.removed.contains(name) {
                rebuild.insert(name.clone());
            }
        }
        if rebuild.is_empty() && self.removed.is_empty() {
            tracing::debug!(target: "jtype::oracle", "nothing to build");
            return Ok(BuildReport::default());
        }

        let removed = &self.removed;
        let published = self
            .units
            .iter()
            .filter(|(name, entry)| entry.status.is_valid() && !removed.contains(name.as_str()))
            .map(|(name, entry)| (name.as_str(), &entry.deps));
        let dependents = deps::invalidate(published, &mut changed, &rebuild);
        for name in &dependents {
            tracing::debug!(target: "jtype::oracle", unit = %name, "invalidated by a changed dependency");
        }
        rebuild.extend(dependents);

        // Work on a copy so a contract violation leaves the graph untouched.
        let mut store = self.store.clone();
        let mut retired: HashMap<ClassId, String> = HashMap::new();
        for name in rebuild.iter().chain(self.removed.iter()) {
            let Some(entry) = self.units.get(name) else {
                continue;
            };
            for class in &entry.classes {
                if let Some(decl) = store.remove_class(*class) {
                    retired.insert(*class, decl.internal_name);
                }
            }
            for package in &entry.packages {
                store.remove_package(package);
            }
        }

        let mut candidates: IndexMap<String, UnitDeps> = IndexMap::new();
        let mut collected: IndexMap<String, Vec<Arc<ClassRecord>>> = IndexMap::new();
        let mut invalid: IndexMap<String, String> = IndexMap::new();
        for name in &rebuild {
            let Some(unit) = self.unit_source(name) else {
                continue;
            };
            let _unit_span =
                tracing::debug_span!(target: "jtype::oracle", "collect", unit = %name).entered();
            sink.set_location(Some(unit.location.clone()));
            match collect_unit(unit, &self.config, &mut sink)? {
                Collection::Collected { records, deps } => {
                    candidates.insert(name.clone(), deps);
                    collected.insert(name.clone(), records);
                }
                Collection::Invalid(reason) => {
                    let deps = UnitDeps {
                        provides: unit_class_names(unit).collect(),
                        ..UnitDeps::default()
                    };
                    candidates.insert(name.clone(), deps);
                    invalid.insert(name.clone(), reason);
                }
            }
        }
        sink.set_location(None);

        let candidate_names: HashSet<String> = candidates
            .values()
            .flat_map(|deps| deps.provides.iter().cloned())
            .collect();
        deps::prune_unavailable(&candidates, &mut invalid, |name| {
            !candidate_names.contains(name) && store.lookup(name).is_some()
        });

        let mut pending = Vec::new();
        let mut owners = Vec::new();
        let mut method_args = MethodArgNames::default();
        for (name, records) in &collected {
            if invalid.contains_key(name) {
                continue;
            }
            let Some(unit) = self.unit_source(name) else {
                continue;
            };
            method_args.merge_from(&unit.method_args);
            for record in records {
                pending.push(PendingClass {
                    record: Arc::clone(record),
                    location: unit.location.clone(),
                    last_modified: unit.last_modified,
                });
                owners.push(name.clone());
            }
        }

        let (ids, declarations) = build::declare_classes(&mut store, &pending);
        let mut unit_classes: IndexMap<String, Vec<ClassId>> = IndexMap::new();
        let mut unit_packages: IndexMap<String, Vec<String>> = IndexMap::new();
        for (index, id) in ids.iter().enumerate() {
            if let Some(id) = id {
                unit_classes.entry(owners[index].clone()).or_default().push(*id);
            }
        }

        match BuildContext::new(&mut store, &self.config, &method_args, &mut sink, declarations) {
            Some(mut ctx) => {
                for (index, class) in pending.iter().enumerate() {
                    let owner = &owners[index];
                    match ids[index] {
                        Some(id) => {
                            ctx.resolve_class(id);
                        }
                        None if build::is_package_info(&class.record) => {
                            let package = ctx.declare_package(&class.record, &class.location);
                            unit_packages.entry(owner.clone()).or_default().push(package);
                        }
                        None if ctx.is_elided(&class.record.name) => {}
                        None if build::is_declared(&class.record) => {
                            let message = format!(
                                "Enclosing class of {} is not available",
                                class.record.name.replace('/', ".")
                            );
                            ctx.report(
                                Diagnostic::error("missing-enclosing-class", message.clone())
                                    .at(class.location.clone()),
                            );
                            invalid.entry(owner.clone()).or_insert(message);
                        }
                        None => {}
                    }
                    if let Some((location, violation)) = ctx.take_violation() {
                        return Err(OracleError::Contract {
                            location,
                            violation,
                        });
                    }
                }
                ctx.finish();
                for (index, id) in ids.iter().enumerate() {
                    let Some(id) = *id else {
                        continue;
                    };
                    if ctx.is_failed(id) {
                        let reason = format!("class {} failed to resolve", ctx.qualified_name(id));
                        invalid.entry(owners[index].clone()).or_insert(reason);
                    }
                }
                ctx.log_summary();
            }
            None => {
                let reason = format!("{} is not available", self.config.java_lang_object.replace('/', "."));
                for name in candidates.keys() {
                    invalid.entry(name.clone()).or_insert_with(|| reason.clone());
                }
            }
        }

        deps::prune_unavailable(&candidates, &mut invalid, |name| {
            !candidate_names.contains(name) && store.lookup(name).is_some()
        });

        let mut report = BuildReport::default();
        for (name, reason) in &invalid {
            for class in unit_classes.shift_remove(name).unwrap_or_default() {
                if let Some(decl) = store.remove_class(class) {
                    retired.insert(class, decl.internal_name);
                }
            }
            for package in unit_packages.shift_remove(name).unwrap_or_default() {
                store.remove_package(&package);
            }
            let location = self
                .unit_source(name)
                .map(|unit| unit.location.clone())
                .unwrap_or_default();
            sink.report(
                Diagnostic::error("pruned-unit", format!("Removing {name} from the type oracle"))
                    .with_cause(reason)
                    .at(location),
            );
            report.pruned.push((name.clone(), reason.clone()));
        }
        rebind_annotations(&mut store, &retired);
        let gc = store.collect_garbage();
        tracing::debug!(
            target: "jtype::oracle",
            freed_types = gc.freed_types,
            freed_type_params = gc.freed_type_params,
            live_types = gc.live_types,
            "collected unreachable types"
        );
        drop(sink);

        // Commit.
        self.store = store;
        for name in std::mem::take(&mut self.removed) {
            self.units.shift_remove(&name);
            report.removed.push(name);
        }
        for name in &rebuild {
            let status = match invalid.get(name) {
                Some(reason) => UnitStatus::Invalid {
                    reason: reason.clone(),
                },
                None => UnitStatus::Valid,
            };
            let deps = candidates.shift_remove(name).unwrap_or_default();
            let classes = unit_classes.shift_remove(name).unwrap_or_default();
            let packages = unit_packages.shift_remove(name).unwrap_or_default();
            if let Some(unit) = self.staged.shift_remove(name) {
                self.units.insert(
                    name.clone(),
                    UnitEntry {
                        unit,
                        deps,
                        classes,
                        packages,
                        status,
                    },
                );
            } else if let Some(entry) = self.units.get_mut(name) {
                entry.deps = deps;
                entry.classes = classes;
                entry.packages = packages;
                entry.status = status;
            }
            report.rebuilt.push(name.clone());
        }
        self.by_qualified_name = self
            .store
            .classes()
            .map(|(id, decl)| (decl.qualified_name.clone(), id))
            .collect();

        report.diagnostics = diagnostics;
        tracing::info!(
            target: "jtype::oracle",
            rebuilt = report.rebuilt.len(),
            pruned = report.pruned.len(),
            types = self.by_qualified_name.len(),
            "build finished"
        );
        Ok(report)
    }

    /// The staged version of a unit, else the known one.
    fn unit_source(&self, name: &str) -> Option<&CompilationUnit> {
        self.staged
            .get(name)
            .or_else(|| self.units.get(name).map(|entry| &entry.unit))
    }

    // Queries.

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDecl> {
        self.store.class(id)
    }

    /// Looks a type up by its qualified source name, `com.example.Outer.Inner`.
    pub fn find_type(&self, qualified_name: &str) -> Option<ClassId> {
        self.by_qualified_name.get(qualified_name).copied()
    }

    pub fn get_type(&self, qualified_name: &str) -> Result<ClassId, NotFound> {
        self.find_type(qualified_name).ok_or_else(|| NotFound {
            name: qualified_name.to_string(),
        })
    }

    pub fn find_by_internal_name(&self, internal_name: &str) -> Option<ClassId> {
        self.store.lookup(internal_name)
    }

    /// Every published type, ordered by qualified name.
    pub fn types(&self) -> Vec<ClassId> {
        let mut types: Vec<_> = self.store.classes().collect();
        types.sort_by(|(_, a), (_, b)| a.qualified_name.cmp(&b.qualified_name));
        types.into_iter().map(|(id, _)| id).collect()
    }

    pub fn java_lang_object(&self) -> Option<ClassId> {
        self.store.lookup(&self.config.java_lang_object)
    }

    pub fn nested_types(&self, id: ClassId) -> &[ClassId] {
        self.store
            .class(id)
            .map(|decl| decl.nested.as_slice())
            .unwrap_or_default()
    }

    pub fn find_package(&self, name: &str) -> Option<&PackageDecl> {
        self.store.package(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageDecl> {
        self.store.packages()
    }

    /// Known units and their status, in the order they were first added.
    pub fn units(&self) -> impl Iterator<Item = (&str, &UnitStatus)> {
        self.units
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.status))
    }

    pub fn unit_status(&self, type_name: &str) -> Option<&UnitStatus> {
        self.units.get(type_name).map(|entry| &entry.status)
    }

    /// The published types of a unit.
    pub fn unit_types(&self, type_name: &str) -> &[ClassId] {
        self.units
            .get(type_name)
            .map(|entry| entry.classes.as_slice())
            .unwrap_or_default()
    }

    pub fn display(&self, ty: TypeId) -> String {
        self.store.display(ty)
    }
}

fn unit_class_names(unit: &CompilationUnit) -> impl Iterator<Item = String> + '_ {
    unit.classes.iter().map(|class| class.internal_name.clone())
}

/// Parses and collects every class of `unit`.
fn collect_unit(
    unit: &CompilationUnit,
    config: &OracleConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<Collection, OracleError> {
    if unit.has_errors() {
        for problem in &unit.problems {
            sink.report(Diagnostic::error("source-error", problem.clone()));
        }
        return Ok(Collection::Invalid(format!(
            "{} has errors: {}",
            unit.location,
            unit.problems.join("; ")
        )));
    }

    let mut records = Vec::with_capacity(unit.classes.len());
    let mut references = BTreeSet::new();
    for class in &unit.classes {
        let parsed = match ClassFile::parse(&class.bytes) {
            Ok(parsed) => parsed,
            Err(err) => {
                sink.report(
                    Diagnostic::error(
                        "malformed-class-file",
                        format!("Unable to read class {}", class.internal_name),
                    )
                    .with_cause(&err),
                );
                return Ok(Collection::Invalid(format!(
                    "malformed class file {}: {err}",
                    class.internal_name
                )));
            }
        };
        let mut collector = ClassCollector::new().with_tracing(config.trace_classes);
        parsed.accept(&mut collector);
        let record = collector
            .finish()
            .map_err(|violation| OracleError::Contract {
                location: unit.location.clone(),
                violation,
            })?;
        references.extend(collect_references(&parsed));
        records.push(Arc::new(record));
    }

    let provides: Vec<String> = records.iter().map(|record| record.name.clone()).collect();
    for name in &provides {
        references.remove(name);
    }
    tracing::debug!(
        target: "jtype::collect",
        unit = %unit.type_name,
        classes = provides.len(),
        references = references.len(),
        "collected unit"
    );
    Ok(Collection::Collected {
        records,
        deps: UnitDeps {
            provides,
            references,
            constant_refs: unit.constant_refs.clone(),
        },
    })
}
