//! Resolution of generic signatures against the declarations of a build.
//!
//! A resolver for a nested position (a bound, a type argument, a parameter)
//! writes into a [`TypeSlot`] owned by its parent. The parent reads the slot
//! once the signature reader has finished with the child.

mod annotations;
mod class_sig;
mod lookup;
mod members;
mod method_sig;
mod type_sig;
mod wildcards;

use jtype_types::TypeId;

pub(crate) use self::annotations::{rebind_annotations, resolve_annotations};
pub(crate) use self::class_sig::ClassSignatureResolver;
pub(crate) use self::lookup::TypeParameterLookup;
pub(crate) use self::members::{resolve_field, resolve_method};
pub(crate) use self::type_sig::TypeSignatureResolver;
pub(crate) use self::wildcards::merge_wildcard_bounds;

/// Settable-once result of a type resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TypeSlot {
    pub(crate) ty: Option<TypeId>,
    /// Part of the type could not be resolved and was replaced by `Object`.
    pub(crate) degraded: bool,
}

impl TypeSlot {
    pub(crate) fn resolved(ty: TypeId) -> Self {
        Self {
            ty: Some(ty),
            degraded: false,
        }
    }
}
