use std::collections::HashMap;

/// One compiled class of a [`CompilationUnit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledClass {
    /// `com/example/Foo$Bar`
    pub internal_name: String,
    pub bytes: Vec<u8>,
}

impl CompiledClass {
    pub fn new(internal_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            internal_name: internal_name.into(),
            bytes,
        }
    }
}

/// The output of compiling one source file, as handed to the oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Qualified source name of the main type, `com.example.Foo`. Units are
    /// keyed by it: adding a unit with a known type name replaces the old one.
    pub type_name: String,
    /// Stable identifier used in diagnostics, usually the source path.
    pub location: String,
    pub last_modified: u64,
    pub classes: Vec<CompiledClass>,
    /// Front-end errors. A unit with problems is never published.
    pub problems: Vec<String>,
    /// Internal names of types whose compile-time constants this unit inlined.
    pub constant_refs: Vec<String>,
    /// Parameter names recovered from source.
    pub method_args: MethodArgNames,
}

impl CompilationUnit {
    pub fn new(type_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            location: location.into(),
            last_modified: 0,
            classes: Vec::new(),
            problems: Vec::new(),
            constant_refs: Vec::new(),
            method_args: MethodArgNames::default(),
        }
    }

    pub fn with_class(mut self, internal_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.classes.push(CompiledClass::new(internal_name, bytes));
        self
    }

    pub fn with_problem(mut self, problem: impl Into<String>) -> Self {
        self.problems.push(problem.into());
        self
    }

    pub fn with_constant_ref(mut self, internal_name: impl Into<String>) -> Self {
        self.constant_refs.push(internal_name.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: u64) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.problems.is_empty()
    }
}

/// Parameter names keyed by `com.example.Foo.method(Ljava/lang/String;)V`,
/// where the descriptor is the erased one from the class file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodArgNames {
    names: HashMap<String, Vec<String>>,
}

impl MethodArgNames {
    pub fn key(qualified_owner: &str, method: &str, descriptor: &str) -> String {
        format!("{qualified_owner}.{method}{descriptor}")
    }

    pub fn insert(
        &mut self,
        qualified_owner: &str,
        method: &str,
        descriptor: &str,
        names: Vec<String>,
    ) {
        self.names
            .insert(Self::key(qualified_owner, method, descriptor), names);
    }

    pub fn lookup(&self, qualified_owner: &str, method: &str, descriptor: &str) -> Option<&[String]> {
        self.names
            .get(&Self::key(qualified_owner, method, descriptor))
            .map(Vec::as_slice)
    }

    pub fn merge_from(&mut self, other: &MethodArgNames) {
        self.names
            .extend(other.names.iter().map(|(key, names)| (key.clone(), names.clone())));
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
