use jtype_classfile::{SignatureReader, SignatureVisitor};
use jtype_types::{ClassId, Diagnostic, TypeVarId};

use super::{TypeParameterLookup, TypeSignatureResolver, TypeSlot};
use crate::build::BuildContext;
use crate::error::ContractViolation;

/// Resolves a class signature: formal parameter bounds, superclass and
/// interfaces.
pub(crate) struct ClassSignatureResolver<'r, 'c> {
    ctx: &'r mut BuildContext<'c>,
    lookup: &'r TypeParameterLookup,
    class: ClassId,
    current_param: Option<TypeVarId>,
    bounds: Vec<TypeSlot>,
    superclass: TypeSlot,
    interfaces: Vec<TypeSlot>,
}

impl<'r, 'c> ClassSignatureResolver<'r, 'c> {
    /// Returns `false` if the supertypes could not be resolved.
    pub(crate) fn resolve(
        ctx: &'r mut BuildContext<'c>,
        lookup: &'r TypeParameterLookup,
        class: ClassId,
        signature: &str,
    ) -> bool {
        let mut resolver = Self {
            ctx,
            lookup,
            class,
            current_param: None,
            bounds: Vec::new(),
            superclass: TypeSlot::default(),
            interfaces: Vec::new(),
        };
        if let Err(err) = SignatureReader::new(signature).accept(&mut resolver) {
            resolver.ctx.report(
                Diagnostic::warning("invalid-signature", "Malformed class signature").with_cause(err),
            );
            return false;
        }
        resolver.finish()
    }

    /// Commits the bounds collected for the previous formal parameter.
    fn finish_bound(&mut self) {
        let Some(param) = self.current_param.take() else {
            self.bounds.clear();
            return;
        };
        let bounds = std::mem::take(&mut self.bounds)
            .into_iter()
            .filter_map(|slot| slot.ty)
            .collect();
        if let Some(param) = self.ctx.store.type_param_mut(param) {
            param.bounds = bounds;
        }
    }

    fn finish(mut self) -> bool {
        self.finish_bound();
        let is_interface = self
            .ctx
            .store
            .class(self.class)
            .is_some_and(|decl| decl.is_interface());
        let mut ok = true;

        if let Some(superclass) = self.superclass.ty {
            if is_interface {
                // Interfaces name Object here by convention.
                let object = self.ctx.object_class();
                if self.ctx.store.class_of(superclass) != Some(object) {
                    let violation = ContractViolation::InterfaceSuperclassNotObject {
                        class: self.ctx.qualified_name(self.class),
                        superclass: self.ctx.store.display(superclass),
                    };
                    self.ctx.violate(violation);
                    ok = false;
                }
            } else if self.superclass.degraded {
                self.ctx.report(Diagnostic::warning(
                    "unresolved-supertype",
                    format!(
                        "Unable to resolve superclass {}",
                        self.ctx.store.display(superclass)
                    ),
                ));
                ok = false;
            } else if let Some(decl) = self.ctx.store.class_mut(self.class) {
                decl.super_class = Some(superclass);
            }
        }

        for slot in std::mem::take(&mut self.interfaces) {
            match slot.ty {
                Some(interface) if !slot.degraded => {
                    if let Some(decl) = self.ctx.store.class_mut(self.class) {
                        decl.interfaces.push(interface);
                    }
                }
                _ => {
                    self.ctx.report(Diagnostic::warning(
                        "unresolved-supertype",
                        "Unable to resolve an implemented interface",
                    ));
                    ok = false;
                }
            }
        }
        ok
    }
}

impl SignatureVisitor for ClassSignatureResolver<'_, '_> {
    fn visit_formal_type_parameter(&mut self, name: &str) {
        self.finish_bound();
        self.current_param = self.lookup.lookup(name);
    }

    fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.bounds.push(TypeSlot::default());
        let index = self.bounds.len() - 1;
        Box::new(TypeSignatureResolver::new(
            &mut *self.ctx,
            self.lookup,
            &mut self.bounds[index],
        ))
    }

    fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.visit_class_bound()
    }

    fn visit_superclass(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.finish_bound();
        Box::new(TypeSignatureResolver::new(
            &mut *self.ctx,
            self.lookup,
            &mut self.superclass,
        ))
    }

    fn visit_interface(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.finish_bound();
        self.interfaces.push(TypeSlot::default());
        let index = self.interfaces.len() - 1;
        Box::new(TypeSignatureResolver::new(
            &mut *self.ctx,
            self.lookup,
            &mut self.interfaces[index],
        ))
    }
}
