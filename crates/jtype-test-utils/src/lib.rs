//! Utilities shared by jtype tests.
//!
//! Fixtures are synthesized with [`ClassFileBuilder`], so tests never need a
//! Java compiler. [`jdk`] provides the handful of `java.lang` classes every
//! build needs; [`scenarios`] holds the multi-unit setups the oracle tests
//! are written against.
//!
//! Set `RUST_LOG=jtype=debug` and call [`init_tracing`] to see build logs.

pub mod jdk;
pub mod scenarios;

use jtype_classfile::access::ACC_PUBLIC;
use jtype_classfile::{ClassFileBuilder, MethodSpec};
use jtype_oracle::CompilationUnit;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `tracing` subscriber honouring `RUST_LOG`.
/// Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A public class with a source file and a public no-arg constructor.
pub fn class(internal_name: &str) -> ClassFileBuilder {
    let simple = internal_name
        .rsplit('/')
        .next()
        .unwrap_or(internal_name)
        .split('$')
        .next()
        .unwrap_or(internal_name);
    ClassFileBuilder::new(internal_name)
        .source_file(format!("{simple}.java"))
        .method(MethodSpec::new(ACC_PUBLIC, "<init>", "()V"))
}

/// A unit named by its qualified type name, holding the given classes.
pub fn unit<N: Into<String>>(
    type_name: &str,
    classes: impl IntoIterator<Item = (N, Vec<u8>)>,
) -> CompilationUnit {
    let location = format!("{}.java", type_name.replace('.', "/"));
    classes
        .into_iter()
        .fold(CompilationUnit::new(type_name, location), |unit, (name, bytes)| {
            unit.with_class(name, bytes)
        })
}

/// A unit holding exactly one class.
pub fn class_unit(internal_name: &str, builder: ClassFileBuilder) -> CompilationUnit {
    unit(
        &internal_name.replace(['/', '$'], "."),
        [(internal_name, builder.build())],
    )
}
