use jtype_classfile::access::{self, has};
use jtype_classfile::{AnnotationVisitor, FieldVisitor, MethodDescriptor, MethodVisitor};

use super::annotation::{AnnotationCollector, AnnotationSink, DefaultValueCollector};
use super::{FieldRecord, MethodRecord};

pub(super) struct FieldCollector<'a> {
    record: FieldRecord,
    out: &'a mut Vec<FieldRecord>,
}

impl<'a> FieldCollector<'a> {
    pub(super) fn new(record: FieldRecord, out: &'a mut Vec<FieldRecord>) -> Self {
        Self { record, out }
    }
}

impl FieldVisitor for FieldCollector<'_> {
    fn visit_annotation(
        &mut self,
        descriptor: &str,
        visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            visible,
            AnnotationSink::List(&mut self.record.annotations),
        )))
    }

    fn visit_end(&mut self) {
        self.out.push(std::mem::take(&mut self.record));
    }
}

pub(super) struct MethodCollector<'a> {
    record: MethodRecord,
    out: &'a mut Vec<MethodRecord>,
    /// Parameter count of the descriptor, hidden argument included.
    declared_arity: usize,
    /// Local-variable slots taken by `this` and the hidden argument.
    leading_slots: i32,
    hidden_args: usize,
    /// Shift from attribute parameter index to declared parameter index.
    annotation_shift: isize,
    wide_params_seen: i32,
}

impl<'a> MethodCollector<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        access: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        exceptions: &[String],
        parsed: MethodDescriptor,
        strip_hidden: bool,
        out: &'a mut Vec<MethodRecord>,
    ) -> Self {
        let MethodDescriptor {
            params: mut arg_types,
            return_type,
        } = parsed;
        let declared_arity = arg_types.len();

        let mut leading_slots = if has(access, access::ACC_STATIC) { 0 } else { 1 };
        let hidden_args = usize::from(strip_hidden);
        if strip_hidden {
            let hidden = arg_types.remove(0);
            leading_slots += i32::from(hidden.slot_size());
        }

        let arity = arg_types.len();
        let record = MethodRecord {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: signature.map(str::to_string),
            exceptions: exceptions.to_vec(),
            annotations: Vec::new(),
            arg_types,
            return_type,
            arg_names: (0..arity).map(|i| format!("arg{i}")).collect(),
            actual_arg_names: false,
            arg_annotations: vec![Vec::new(); arity],
            annotation_default: None,
        };
        Self {
            record,
            out,
            declared_arity,
            leading_slots,
            hidden_args,
            annotation_shift: 0,
            wide_params_seen: 0,
        }
    }
}

impl MethodVisitor for MethodCollector<'_> {
    fn visit_annotation_default(&mut self) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(DefaultValueCollector::new(
            true,
            &mut self.record.annotation_default,
        )))
    }

    fn visit_annotation(
        &mut self,
        descriptor: &str,
        visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            visible,
            AnnotationSink::List(&mut self.record.annotations),
        )))
    }

    fn visit_annotable_parameter_count(&mut self, count: usize, _visible: bool) {
        // javac leaves synthetic leading parameters out of the attribute.
        self.annotation_shift = self.declared_arity as isize - count as isize;
    }

    fn visit_parameter_annotation(
        &mut self,
        parameter: usize,
        descriptor: &str,
        visible: bool,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        let index = parameter as isize + self.annotation_shift - self.hidden_args as isize;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| self.record.arg_annotations.get_mut(index))?;
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            visible,
            AnnotationSink::List(slot),
        )))
    }

    fn visit_local_variable(&mut self, name: &str, descriptor: &str, index: u16) {
        let slot = i32::from(index) - self.leading_slots;
        if slot == 0 {
            self.wide_params_seen = 0;
        }
        let arg = slot - self.wide_params_seen;
        let Some(arg) = usize::try_from(arg)
            .ok()
            .filter(|arg| *arg < self.record.arg_names.len())
        else {
            return;
        };
        self.record.arg_names[arg] = name.to_string();
        self.record.actual_arg_names = true;
        if matches!(descriptor, "J" | "D") {
            self.wide_params_seen += 1;
        }
    }

    fn visit_end(&mut self) {
        self.out.push(std::mem::take(&mut self.record));
    }
}
