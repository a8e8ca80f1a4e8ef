//! Semantic model of resolved Java types.
//!
//! A [`TypeStore`] owns every declaration of one build and interns structural
//! types, so two requests for the same instantiation yield the same
//! [`TypeId`]. Identity of a declaration is its [`ClassId`]; ids are never
//! reused, so a redefined class always has a fresh one.

mod diagnostic;
mod display;
mod ids;
mod model;
mod relations;
mod store;

pub use crate::diagnostic::{Diagnostic, Severity};
pub use crate::ids::{ClassId, TypeId, TypeVarId};
pub use crate::model::{
    AnnotationDecl, AnnotationValue, ClassDecl, ClassKind, DeclKind, FieldDecl, MethodDecl,
    Modifiers, PackageDecl, ParamDecl, PrimitiveType, TypeData, TypeParamDecl, WildcardKind,
};
pub use crate::store::{StoreGcReport, TypeStore};

/// Internal name of the root class.
pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";
