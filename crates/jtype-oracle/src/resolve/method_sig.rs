use jtype_classfile::{SignatureReader, SignatureVisitor};
use jtype_types::{ClassId, Diagnostic, TypeId, TypeVarId};

use super::{TypeParameterLookup, TypeSignatureResolver, TypeSlot};
use crate::build::BuildContext;
use crate::collect::MethodRecord;
use crate::error::ContractViolation;

/// Resolved types of a method, before names and annotations are attached.
#[derive(Debug)]
pub(crate) struct MethodParts {
    pub(crate) return_type: TypeId,
    pub(crate) params: Vec<TypeId>,
    pub(crate) thrown: Vec<TypeId>,
}

/// Resolves a method signature. The method's own type parameters must
/// already be the innermost scope of `lookup`.
pub(crate) struct MethodSignatureResolver<'r, 'c> {
    ctx: &'r mut BuildContext<'c>,
    lookup: &'r TypeParameterLookup,
    current_param: Option<TypeVarId>,
    bounds: Vec<TypeSlot>,
    return_type: TypeSlot,
    params: Vec<TypeSlot>,
    exceptions: Vec<TypeSlot>,
}

impl<'r, 'c> MethodSignatureResolver<'r, 'c> {
    /// `None` if a type could not be resolved or the signature is malformed.
    pub(crate) fn resolve(
        ctx: &'r mut BuildContext<'c>,
        lookup: &'r TypeParameterLookup,
        owner: ClassId,
        method: &MethodRecord,
        signature: &str,
    ) -> Option<MethodParts> {
        let mut resolver = Self {
            ctx,
            lookup,
            current_param: None,
            bounds: Vec::new(),
            return_type: TypeSlot::default(),
            params: Vec::new(),
            exceptions: Vec::new(),
        };
        if let Err(err) = SignatureReader::new(signature).accept(&mut resolver) {
            resolver.ctx.report(
                Diagnostic::warning(
                    "invalid-signature",
                    format!("Malformed signature of method {}", method.name),
                )
                .with_cause(err),
            );
            return None;
        }
        resolver.finish(owner, method, signature)
    }

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

    fn finish(mut self, owner: ClassId, method: &MethodRecord, signature: &str) -> Option<MethodParts> {
        self.finish_bound();
        if self.params.len() != method.arg_types.len() {
            let violation = ContractViolation::ParameterCountMismatch {
                class: self.ctx.qualified_name(owner),
                method: method.name.clone(),
                descriptor: method.descriptor.clone(),
                signature: signature.to_string(),
            };
            self.ctx.violate(violation);
            return None;
        }
        let return_type = self.return_type.ty?;
        let params = self
            .params
            .iter()
            .map(|slot| slot.ty)
            .collect::<Option<Vec<_>>>()?;
        let thrown = self
            .exceptions
            .iter()
            .map(|slot| slot.ty)
            .collect::<Option<Vec<_>>>()?;
        Some(MethodParts {
            return_type,
            params,
            thrown,
        })
    }

    fn child(&mut self, slot: Slot) -> Box<dyn SignatureVisitor + '_> {
        let slot = match slot {
            Slot::Bound => push_slot(&mut self.bounds),
            Slot::Param => push_slot(&mut self.params),
            Slot::Exception => push_slot(&mut self.exceptions),
            Slot::Return => &mut self.return_type,
        };
        Box::new(TypeSignatureResolver::new(&mut *self.ctx, self.lookup, slot))
    }
}

enum Slot {
    Bound,
    Param,
    Return,
    Exception,
}

fn push_slot(slots: &mut Vec<TypeSlot>) -> &mut TypeSlot {
    slots.push(TypeSlot::default());
    let index = slots.len() - 1;
    &mut slots[index]
}

impl SignatureVisitor for MethodSignatureResolver<'_, '_> {
    fn visit_formal_type_parameter(&mut self, name: &str) {
        self.finish_bound();
        self.current_param = self.lookup.lookup(name);
    }

    fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.child(Slot::Bound)
    }

    fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.child(Slot::Bound)
    }

    fn visit_parameter_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.finish_bound();
        self.child(Slot::Param)
    }

    fn visit_return_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.finish_bound();
        self.child(Slot::Return)
    }

    fn visit_exception_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        self.child(Slot::Exception)
    }
}
