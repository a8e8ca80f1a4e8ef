use std::collections::HashMap;

use jtype_classfile::{descriptor_to_internal_name, parse_field_descriptor};
use jtype_types::{
    AnnotationDecl, AnnotationValue, ClassId, DeclKind, Diagnostic, PrimitiveType, Severity,
    TypeData, TypeId, TypeStore,
};

use crate::build::BuildContext;
use crate::collect::{AnnotationRecord, AnnotationValueRecord};

/// Resolves the annotations of one element, dropping those whose type is
/// unknown to the build.
pub(crate) fn resolve_annotations(
    ctx: &mut BuildContext<'_>,
    records: &[AnnotationRecord],
) -> Vec<AnnotationDecl> {
    records
        .iter()
        .filter_map(|record| resolve_annotation(ctx, record))
        .collect()
}

fn resolve_annotation(ctx: &mut BuildContext<'_>, record: &AnnotationRecord) -> Option<AnnotationDecl> {
    let Some(internal_name) = descriptor_to_internal_name(&record.descriptor) else {
        ctx.warn(
            "invalid-annotation",
            format!("Ignoring annotation with descriptor {}", record.descriptor),
        );
        return None;
    };
    let class = match ctx.store.lookup(&internal_name) {
        Some(class) if ctx.resolve_class(class) => class,
        _ => {
            report_missing_annotation(ctx, &internal_name);
            return None;
        }
    };
    if ctx.store.class(class).map(|decl| decl.kind) != Some(DeclKind::Annotation) {
        ctx.warn(
            "not-an-annotation",
            format!(
                "Ignoring annotation {} because it is not an annotation type",
                ctx.qualified_name(class)
            ),
        );
        return None;
    }

    let mut values = Vec::with_capacity(record.values.len());
    for (name, value) in &record.values {
        if let Some(value) = resolve_value(ctx, value) {
            values.push((name.clone(), value));
        }
    }
    Some(AnnotationDecl {
        annotation_type: ctx.store.class_type(class),
        visible: record.visible,
        values,
    })
}

/// Resolves one annotation member value. `None` drops the member.
pub(crate) fn resolve_value(
    ctx: &mut BuildContext<'_>,
    value: &AnnotationValueRecord,
) -> Option<AnnotationValue> {
    match value {
        AnnotationValueRecord::Const(constant) => Some(AnnotationValue::Const(constant.clone())),
        AnnotationValueRecord::Class(descriptor) => {
            Some(AnnotationValue::Class(resolve_class_literal(ctx, descriptor)))
        }
        AnnotationValueRecord::Enum { descriptor, name } => {
            let enum_class = descriptor_to_internal_name(descriptor)
                .and_then(|internal_name| ctx.store.lookup(&internal_name))
                .filter(|class| ctx.resolve_class(*class));
            match enum_class {
                Some(class) => Some(AnnotationValue::Enum {
                    enum_type: ctx.store.class_type(class),
                    constant: name.clone(),
                }),
                None => {
                    ctx.warn(
                        "unresolved-enum",
                        format!("Ignoring enum constant {name} of unresolvable type {descriptor}"),
                    );
                    None
                }
            }
        }
        AnnotationValueRecord::Annotation(nested) => {
            resolve_annotation(ctx, nested).map(|decl| AnnotationValue::Annotation(Box::new(decl)))
        }
        AnnotationValueRecord::Array(elements) => Some(AnnotationValue::Array(
            elements
                .iter()
                .filter_map(|element| resolve_value(ctx, element))
                .collect(),
        )),
    }
}

fn resolve_class_literal(ctx: &mut BuildContext<'_>, descriptor: &str) -> TypeId {
    if descriptor == "V" {
        return ctx.store.primitive(PrimitiveType::Void);
    }
    let resolved = parse_field_descriptor(descriptor)
        .ok()
        .and_then(|ty| ctx.descriptor_type(&ty));
    match resolved {
        Some(ty) => ty,
        None => {
            ctx.error(
                "unresolved-class-literal",
                format!("Unable to resolve class literal {descriptor}, using java.lang.Object"),
            );
            ctx.object_type()
        }
    }
}

fn report_missing_annotation(ctx: &mut BuildContext<'_>, internal_name: &str) {
    let qualified = internal_name.replace(['/', '$'], ".");
    let message = format!("Ignoring unresolvable annotation type {qualified}");
    let Some(prefix) = ctx
        .config
        .suppressed_annotation_prefixes
        .iter()
        .find(|prefix| qualified.starts_with(prefix.as_str()))
        .cloned()
    else {
        ctx.warn("unresolved-annotation", message);
        return;
    };

    if ctx.annotation_hint_shown {
        ctx.report(Diagnostic::new(Severity::Debug, "unresolved-annotation", message));
        return;
    }
    ctx.annotation_hint_shown = true;
    ctx.warn(
        "unresolved-annotation",
        format!("Detected warnings related to '{prefix}*'. Is the jar providing it on the classpath?"),
    );
    ctx.report(Diagnostic::new(
        Severity::Info,
        "unresolved-annotation",
        "Further unresolvable annotations from this package are only logged at debug level",
    ));
    ctx.report(Diagnostic::new(Severity::Debug, "unresolved-annotation", message));
}

/// Points annotations of surviving declarations at the current declaration
/// of each annotation, enum or class-literal type.
///
/// Annotation types are not dependencies, so a class can outlive a rebuild
/// of an annotation it carries. `retired` maps ids removed by the build to
/// their internal names. Annotations whose type is gone are dropped.
pub(crate) fn rebind_annotations(store: &mut TypeStore, retired: &HashMap<ClassId, String>) {
    if retired.is_empty() {
        return;
    }
    let ids: Vec<ClassId> = store.classes().map(|(id, _)| id).collect();
    for id in ids {
        let Some(mut decl) = store.class(id).cloned() else {
            continue;
        };
        let before = decl.clone();
        rebind_list(store, retired, &mut decl.annotations);
        for field in &mut decl.fields {
            rebind_list(store, retired, &mut field.annotations);
        }
        for method in decl.constructors.iter_mut().chain(decl.methods.iter_mut()) {
            rebind_list(store, retired, &mut method.annotations);
            for param in &mut method.params {
                rebind_list(store, retired, &mut param.annotations);
            }
            method.default_value = method
                .default_value
                .take()
                .and_then(|value| rebind_value(store, retired, value));
        }
        if decl != before {
            if let Some(slot) = store.class_mut(id) {
                *slot = decl;
            }
        }
    }

    let packages: Vec<String> = store.packages().map(|package| package.name.clone()).collect();
    for name in packages {
        let mut annotations = std::mem::take(&mut store.package_mut(&name).annotations);
        rebind_list(store, retired, &mut annotations);
        store.package_mut(&name).annotations = annotations;
    }
}

fn rebind_list(store: &mut TypeStore, retired: &HashMap<ClassId, String>, list: &mut Vec<AnnotationDecl>) {
    *list = std::mem::take(list)
        .into_iter()
        .filter_map(|annotation| rebind_annotation(store, retired, annotation))
        .collect();
}

fn rebind_annotation(
    store: &mut TypeStore,
    retired: &HashMap<ClassId, String>,
    mut annotation: AnnotationDecl,
) -> Option<AnnotationDecl> {
    annotation.annotation_type = rebind_type(store, retired, annotation.annotation_type)?;
    annotation.values = std::mem::take(&mut annotation.values)
        .into_iter()
        .filter_map(|(name, value)| Some((name, rebind_value(store, retired, value)?)))
        .collect();
    Some(annotation)
}

fn rebind_value(
    store: &mut TypeStore,
    retired: &HashMap<ClassId, String>,
    value: AnnotationValue,
) -> Option<AnnotationValue> {
    Some(match value {
        AnnotationValue::Const(_) => value,
        AnnotationValue::Class(ty) => AnnotationValue::Class(rebind_type(store, retired, ty)?),
        AnnotationValue::Enum {
            enum_type,
            constant,
        } => AnnotationValue::Enum {
            enum_type: rebind_type(store, retired, enum_type)?,
            constant,
        },
        AnnotationValue::Annotation(nested) => {
            AnnotationValue::Annotation(Box::new(rebind_annotation(store, retired, *nested)?))
        }
        AnnotationValue::Array(elements) => AnnotationValue::Array(
            elements
                .into_iter()
                .filter_map(|element| rebind_value(store, retired, element))
                .collect(),
        ),
    })
}

/// Erased types only: annotation values never carry parameterizations.
fn rebind_type(store: &mut TypeStore, retired: &HashMap<ClassId, String>, ty: TypeId) -> Option<TypeId> {
    match *store.ty(ty) {
        TypeData::Class(class) | TypeData::Raw(class) => match retired.get(&class) {
            Some(internal_name) => {
                let replacement = store.lookup(internal_name)?;
                Some(store.raw_type(replacement))
            }
            None => Some(ty),
        },
        TypeData::Array(component) => {
            let component = rebind_type(store, retired, component)?;
            Some(store.array_of(component))
        }
        _ => Some(ty),
    }
}
