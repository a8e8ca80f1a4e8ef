use jtype_classfile::{SignatureVisitor, TypeArgKind};
use jtype_types::{ClassId, ClassKind, PrimitiveType, TypeData, TypeId, WildcardKind};

use super::{TypeParameterLookup, TypeSlot};
use crate::build::BuildContext;
use crate::error::ContractViolation;

/// Resolves one type signature (a field type, a bound, a parameter, a type
/// argument) into its slot.
///
/// Base types and type variables are terminal and commit at once. Class
/// types commit on `visit_end`, after their type arguments and any
/// `.Inner` continuations have been applied.
pub(crate) struct TypeSignatureResolver<'r, 'c> {
    ctx: &'r mut BuildContext<'c>,
    lookup: &'r TypeParameterLookup,
    slot: &'r mut TypeSlot,
    kind: TypeArgKind,
    array_depth: usize,
    current: Option<TypeId>,
    /// The outer type of an `Outer<..>.Inner` continuation.
    outer: Option<TypeId>,
    args: Vec<TypeSlot>,
    degraded: bool,
}

impl<'r, 'c> TypeSignatureResolver<'r, 'c> {
    pub(crate) fn new(
        ctx: &'r mut BuildContext<'c>,
        lookup: &'r TypeParameterLookup,
        slot: &'r mut TypeSlot,
    ) -> Self {
        Self::with_kind(ctx, lookup, slot, TypeArgKind::Exact)
    }

    fn with_kind(
        ctx: &'r mut BuildContext<'c>,
        lookup: &'r TypeParameterLookup,
        slot: &'r mut TypeSlot,
        kind: TypeArgKind,
    ) -> Self {
        Self {
            ctx,
            lookup,
            slot,
            kind,
            array_depth: 0,
            current: None,
            outer: None,
            args: Vec::new(),
            degraded: false,
        }
    }

    fn degrade_to_object(&mut self) {
        self.current = Some(self.ctx.object_type());
        self.degraded = true;
    }

    fn commit(&mut self) {
        let Some(mut ty) = self.current.take() else {
            return;
        };
        debug_assert!(self.slot.ty.is_none(), "type slot written twice");
        let store = &mut *self.ctx.store;
        ty = store.array_of_depth(ty, self.array_depth);
        ty = match self.kind {
            TypeArgKind::Exact => ty,
            TypeArgKind::Extends => store.wildcard(WildcardKind::Extends, ty),
            TypeArgKind::Super => store.wildcard(WildcardKind::Super, ty),
        };
        self.slot.ty = Some(ty);
        self.slot.degraded |= self.degraded;
    }

    /// Applies the collected type arguments to the current class type.
    fn resolve_generics(&mut self) {
        let args = std::mem::take(&mut self.args);
        let outer = self.outer.take();
        let Some(current) = self.current else {
            return;
        };
        let TypeData::Class(generic) = *self.ctx.store.ty(current) else {
            return;
        };
        let Some(decl) = self.ctx.store.class(generic) else {
            return;
        };
        if !decl.is_generic {
            return;
        }
        let expected = decl.type_params.len();

        let mut type_args = Vec::with_capacity(args.len());
        for arg in &args {
            self.degraded |= arg.degraded;
            match arg.ty {
                Some(ty) if !matches!(self.ctx.store.ty(ty), TypeData::Primitive(_)) => {
                    type_args.push(ty)
                }
                other => {
                    let rendered = other
                        .map(|ty| self.ctx.store.display(ty))
                        .unwrap_or_else(|| "nothing".to_string());
                    self.ctx.error(
                        "bad-type-argument",
                        format!("Parameterized type argument is {rendered}, expected reference type"),
                    );
                    self.current = Some(self.ctx.store.raw_type(generic));
                    self.degraded = true;
                    return;
                }
            }
        }

        let actual = type_args.len();
        if actual == 0 && expected > 0 {
            self.current = Some(self.ctx.store.raw_type(generic));
            return;
        }
        if actual != expected {
            let generic_name = self.ctx.qualified_name(generic);
            self.ctx.violate(ContractViolation::TypeArgumentArity {
                generic: generic_name,
                expected,
                actual,
            });
            self.current = Some(self.ctx.store.raw_type(generic));
            return;
        }

        let enclosing = match outer {
            Some(outer) => match self.ctx.store.ty(outer) {
                TypeData::Parameterized { .. } | TypeData::Raw(_) => Some(outer),
                _ => None,
            },
            None => self.reconstruct_enclosing(generic),
        };

        self.current = Some(if expected == 0 {
            // Generic only through its enclosing instance.
            match enclosing {
                Some(enclosing) if self.ctx.store.is_parameterized(enclosing) => {
                    self.ctx.store.parameterized(generic, Some(enclosing), Vec::new())
                }
                _ => self.ctx.store.raw_type(generic),
            }
        } else {
            self.ctx.store.parameterized(generic, enclosing, type_args)
        });
    }

    /// Recovers the parameterization of the enclosing class when a member
    /// type is named by its binary name (`LOuter$Inner;`) instead of as
    /// `LOuter<TT;>.Inner;`: the enclosing formals are matched by name
    /// against the type variables in scope.
    fn reconstruct_enclosing(&mut self, class: ClassId) -> Option<TypeId> {
        let decl = self.ctx.store.class(class)?;
        if decl.nesting != ClassKind::Inner {
            return None;
        }
        let enclosing = decl.enclosing?;
        let enclosing_decl = self.ctx.store.class(enclosing)?;
        if !enclosing_decl.is_generic {
            return None;
        }
        let formals = enclosing_decl.type_params.clone();

        let outer_enclosing = self
            .reconstruct_enclosing(enclosing)
            .filter(|ty| self.ctx.store.is_parameterized(*ty));

        let mut args = Vec::with_capacity(formals.len());
        for formal in &formals {
            let name = self.ctx.store.type_param(*formal)?.name.clone();
            match self.lookup.lookup(&name) {
                Some(var) => args.push(self.ctx.store.type_var(var)),
                None => {
                    tracing::debug!(
                        target: "jtype::resolve",
                        class = %self.ctx.qualified_name(class),
                        parameter = %name,
                        "cannot reconstruct enclosing parameterization"
                    );
                    return if self.ctx.config.strict_enclosing_reconstruction {
                        None
                    } else {
                        Some(self.ctx.store.raw_type(enclosing))
                    };
                }
            }
        }
        if args.is_empty() && outer_enclosing.is_none() {
            return None;
        }
        Some(
            self.ctx
                .store
                .parameterized(enclosing, outer_enclosing, args),
        )
    }
}

impl SignatureVisitor for TypeSignatureResolver<'_, '_> {
    fn visit_base_type(&mut self, descriptor: char) {
        match PrimitiveType::from_descriptor(descriptor) {
            Some(primitive) => self.current = Some(self.ctx.store.primitive(primitive)),
            None => {
                self.ctx.error(
                    "bad-base-type",
                    format!("Unknown base type descriptor {descriptor}"),
                );
                self.degrade_to_object();
            }
        }
        self.commit();
    }

    fn visit_type_variable(&mut self, name: &str) {
        match self.lookup.lookup(name) {
            Some(var) => self.current = Some(self.ctx.store.type_var(var)),
            None => {
                self.ctx.error(
                    "unresolved-type-variable",
                    format!("Unable to resolve type variable {name}"),
                );
                self.degrade_to_object();
            }
        }
        self.commit();
    }

    fn visit_array_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.array_depth += 1;
        Box::new(self)
    }

    fn visit_class_type(&mut self, name: &str) {
        match self.ctx.store.lookup(name) {
            Some(class) if self.ctx.resolve_class(class) => {
                self.current = Some(self.ctx.store.class_type(class));
            }
            _ => {
                self.ctx.error(
                    "unresolved-class",
                    format!("Unable to resolve class {name}"),
                );
                self.degrade_to_object();
            }
        }
    }

    fn visit_inner_class_type(&mut self, name: &str) {
        self.resolve_generics();
        self.outer = self.current;
        let Some(search) = self.current.and_then(|ty| self.ctx.store.class_of(ty)) else {
            return;
        };
        let outer_name = match self.ctx.store.class(search) {
            Some(decl) => decl.internal_name.clone(),
            None => return,
        };
        let nested_name = format!("{outer_name}${name}");
        match self.ctx.store.lookup(&nested_name) {
            Some(nested) if self.ctx.resolve_class(nested) => {
                self.current = Some(self.ctx.store.class_type(nested));
            }
            _ => {
                self.ctx.error(
                    "unresolved-inner-class",
                    format!("Unable to resolve inner class {name} in {outer_name}"),
                );
                self.outer = None;
                self.degrade_to_object();
            }
        }
    }

    fn visit_type_argument(&mut self) {
        let object = self.ctx.object_type();
        let wildcard = self.ctx.store.wildcard(WildcardKind::Unbound, object);
        self.args.push(TypeSlot::resolved(wildcard));
    }

    fn visit_bounded_type_argument(&mut self, kind: TypeArgKind) -> Box<dyn SignatureVisitor + '_> {
        self.args.push(TypeSlot::default());
        let index = self.args.len() - 1;
        Box::new(TypeSignatureResolver::with_kind(
            &mut *self.ctx,
            self.lookup,
            &mut self.args[index],
            kind,
        ))
    }

    fn visit_end(&mut self) {
        self.resolve_generics();
        self.commit();
    }
}
