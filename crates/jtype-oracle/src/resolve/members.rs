use jtype_classfile::access::{self, has};
use jtype_classfile::{parse_field_descriptor, ReturnType, SignatureReader};
use jtype_types::{
    ClassId, DeclKind, Diagnostic, FieldDecl, MethodDecl, Modifiers, ParamDecl, PrimitiveType,
    TypeId,
};

use super::annotations::{resolve_annotations, resolve_value};
use super::method_sig::{MethodParts, MethodSignatureResolver};
use super::{TypeParameterLookup, TypeSignatureResolver, TypeSlot};
use crate::build::BuildContext;
use crate::collect::{formal_type_params, FieldRecord, MethodRecord};

const METHOD_MODIFIERS: u16 = access::ACC_PUBLIC
    | access::ACC_PRIVATE
    | access::ACC_PROTECTED
    | access::ACC_STATIC
    | access::ACC_FINAL
    | access::ACC_ABSTRACT
    | access::ACC_SYNCHRONIZED
    | access::ACC_NATIVE;

const FIELD_MODIFIERS: u16 = access::ACC_PUBLIC
    | access::ACC_PRIVATE
    | access::ACC_PROTECTED
    | access::ACC_STATIC
    | access::ACC_FINAL
    | access::ACC_VOLATILE
    | access::ACC_TRANSIENT;

/// Adds the method to `class`. Returns `false` if one of its types could
/// not be resolved, which fails the whole class.
pub(crate) fn resolve_method(
    ctx: &mut BuildContext<'_>,
    class: ClassId,
    method: &MethodRecord,
    lookup: &mut TypeParameterLookup,
) -> bool {
    let Some((kind, simple_name)) = ctx
        .store
        .class(class)
        .map(|decl| (decl.kind, decl.simple_name.clone()))
    else {
        return false;
    };
    let is_constructor = method.name == "<init>";
    // The descriptors of enum constructors carry the name and ordinal
    // arguments, their signatures do not.
    if method.name == "<clinit>" || (is_constructor && kind == DeclKind::Enum) {
        return true;
    }

    let formal_names = match method.signature.as_deref().map(formal_type_params) {
        Some(Ok(names)) => names,
        _ => Vec::new(),
    };
    let type_params: Vec<_> = formal_names
        .into_iter()
        .map(|name| ctx.store.add_type_param(name, class))
        .collect();
    lookup.push_scope(&*ctx.store, &type_params);
    let parts = resolve_method_types(ctx, class, method, lookup);
    lookup.pop_scope();

    let Some(parts) = parts else {
        ctx.error(
            "unresolved-member-type",
            format!(
                "Unable to resolve the types of {}.{}{}",
                ctx.qualified_name(class),
                method.name,
                method.descriptor
            ),
        );
        return false;
    };

    let mut modifiers = Modifiers::from_bits(method.access & METHOD_MODIFIERS);
    if kind.is_interface() {
        modifiers = modifiers.with(access::ACC_PUBLIC);
        if !modifiers.is_static() {
            modifiers = modifiers.with(access::ACC_ABSTRACT);
        }
    }

    let (names, real_param_names) = param_names(ctx, class, method);
    let mut params = Vec::with_capacity(parts.params.len());
    for (index, (ty, name)) in parts.params.into_iter().zip(names).enumerate() {
        let annotations = match method.arg_annotations.get(index) {
            Some(records) => resolve_annotations(ctx, records),
            None => Vec::new(),
        };
        params.push(ParamDecl {
            name,
            ty,
            annotations,
        });
    }

    let default_value = match (&method.annotation_default, kind) {
        (Some(value), DeclKind::Annotation) => resolve_value(ctx, value),
        _ => None,
    };
    let annotations = resolve_annotations(ctx, &method.annotations);

    let decl = MethodDecl {
        name: if is_constructor {
            simple_name
        } else {
            method.name.clone()
        },
        descriptor: method.descriptor.clone(),
        modifiers,
        type_params,
        return_type: if is_constructor {
            ctx.store.primitive(PrimitiveType::Void)
        } else {
            parts.return_type
        },
        params,
        real_param_names,
        thrown: parts.thrown,
        annotations,
        is_varargs: has(method.access, access::ACC_VARARGS),
        default_value,
    };
    if let Some(owner) = ctx.store.class_mut(class) {
        if is_constructor {
            owner.constructors.push(decl);
        } else {
            owner.methods.push(decl);
        }
    }
    true
}

fn resolve_method_types(
    ctx: &mut BuildContext<'_>,
    class: ClassId,
    method: &MethodRecord,
    lookup: &TypeParameterLookup,
) -> Option<MethodParts> {
    let from_signature = match method.signature.as_deref() {
        Some(signature) => Some(MethodSignatureResolver::resolve(
            ctx, lookup, class, method, signature,
        )?),
        None => None,
    };

    let declared_thrown = method
        .exceptions
        .iter()
        .map(|name| ctx.class_type_by_name(name))
        .collect::<Option<Vec<_>>>();

    match from_signature {
        Some(mut parts) => {
            // Signatures only list exceptions when one of them is generic.
            if parts.thrown.is_empty() {
                parts.thrown = declared_thrown?;
            }
            Some(parts)
        }
        None => {
            let return_type = match &method.return_type {
                ReturnType::Void => ctx.store.primitive(PrimitiveType::Void),
                ReturnType::Type(ty) => ctx.descriptor_type(ty)?,
            };
            let params = method
                .arg_types
                .iter()
                .map(|ty| ctx.descriptor_type(ty))
                .collect::<Option<Vec<_>>>()?;
            Some(MethodParts {
                return_type,
                params,
                thrown: declared_thrown?,
            })
        }
    }
}

/// Debug-info names win; otherwise names recovered from source for the same
/// erased method are borrowed; otherwise the synthetic `argN` names stay.
fn param_names(ctx: &BuildContext<'_>, class: ClassId, method: &MethodRecord) -> (Vec<String>, bool) {
    if method.actual_arg_names {
        return (method.arg_names.clone(), true);
    }
    let owner = ctx.qualified_name(class);
    match ctx.method_args.lookup(&owner, &method.name, &method.descriptor) {
        Some(names) if names.len() == method.arg_names.len() => (names.to_vec(), true),
        _ => (method.arg_names.clone(), false),
    }
}

/// Adds the field to `class`. `ordinal` counts the enum constants seen so far.
pub(crate) fn resolve_field(
    ctx: &mut BuildContext<'_>,
    class: ClassId,
    field: &FieldRecord,
    lookup: &TypeParameterLookup,
    ordinal: &mut u32,
) -> bool {
    let Some(ty) = resolve_field_type(ctx, field, lookup) else {
        ctx.error(
            "unresolved-member-type",
            format!(
                "Unable to resolve the type of {}.{}",
                ctx.qualified_name(class),
                field.name
            ),
        );
        return false;
    };

    let mut modifiers = Modifiers::from_bits(field.access & FIELD_MODIFIERS);
    if ctx.store.class(class).is_some_and(|decl| decl.is_interface()) {
        modifiers = modifiers.with(access::ACC_PUBLIC | access::ACC_STATIC | access::ACC_FINAL);
    }
    let enum_ordinal = has(field.access, access::ACC_ENUM).then(|| {
        let current = *ordinal;
        *ordinal += 1;
        current
    });
    let annotations = resolve_annotations(ctx, &field.annotations);

    if let Some(owner) = ctx.store.class_mut(class) {
        owner.fields.push(FieldDecl {
            name: field.name.clone(),
            ty,
            modifiers,
            annotations,
            enum_ordinal,
            constant: field.constant.clone(),
        });
    }
    true
}

fn resolve_field_type(
    ctx: &mut BuildContext<'_>,
    field: &FieldRecord,
    lookup: &TypeParameterLookup,
) -> Option<TypeId> {
    if let Some(signature) = field.signature.as_deref() {
        let mut slot = TypeSlot::default();
        let result = SignatureReader::new(signature)
            .accept_type(&mut TypeSignatureResolver::new(ctx, lookup, &mut slot));
        match result {
            Ok(()) => return slot.ty,
            Err(err) => ctx.report(
                Diagnostic::warning(
                    "invalid-signature",
                    format!("Malformed signature of field {}, using its descriptor", field.name),
                )
                .with_cause(err),
            ),
        }
    }
    let ty = parse_field_descriptor(&field.descriptor).ok()?;
    ctx.descriptor_type(&ty)
}
