use indexmap::IndexMap;
use jtype_classfile::{AnnotationVisitor, ConstValue};

use super::{AnnotationRecord, AnnotationValueRecord};

/// Where a finished value goes when its collector ends.
pub(super) enum ValueSink<'a> {
    Member(&'a mut IndexMap<String, AnnotationValueRecord>, String),
    Element(&'a mut Vec<AnnotationValueRecord>),
    Slot(&'a mut Option<AnnotationValueRecord>),
}

impl ValueSink<'_> {
    fn deliver(&mut self, value: AnnotationValueRecord) {
        match self {
            ValueSink::Member(values, name) => {
                values.insert(std::mem::take(name), value);
            }
            ValueSink::Element(elements) => elements.push(value),
            ValueSink::Slot(slot) => **slot = Some(value),
        }
    }
}

pub(super) enum AnnotationSink<'a> {
    List(&'a mut Vec<AnnotationRecord>),
    Value(ValueSink<'a>),
}

/// Collects one annotation and hands it to its sink on `visit_end`.
pub(super) struct AnnotationCollector<'a> {
    record: AnnotationRecord,
    sink: AnnotationSink<'a>,
}

impl<'a> AnnotationCollector<'a> {
    pub(super) fn new(descriptor: &str, visible: bool, sink: AnnotationSink<'a>) -> Self {
        Self {
            record: AnnotationRecord {
                descriptor: descriptor.to_string(),
                visible,
                values: IndexMap::new(),
            },
            sink,
        }
    }

    fn insert(&mut self, name: Option<&str>, value: AnnotationValueRecord) {
        self.record
            .values
            .insert(name.unwrap_or_default().to_string(), value);
    }
}

impl AnnotationVisitor for AnnotationCollector<'_> {
    fn visit(&mut self, name: Option<&str>, value: &ConstValue) {
        self.insert(name, AnnotationValueRecord::Const(value.clone()));
    }

    fn visit_enum(&mut self, name: Option<&str>, descriptor: &str, value: &str) {
        self.insert(
            name,
            AnnotationValueRecord::Enum {
                descriptor: descriptor.to_string(),
                name: value.to_string(),
            },
        );
    }

    fn visit_class(&mut self, name: Option<&str>, descriptor: &str) {
        self.insert(name, AnnotationValueRecord::Class(descriptor.to_string()));
    }

    fn visit_annotation(
        &mut self,
        name: Option<&str>,
        descriptor: &str,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        let visible = self.record.visible;
        let sink = ValueSink::Member(&mut self.record.values, name.unwrap_or_default().to_string());
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            visible,
            AnnotationSink::Value(sink),
        )))
    }

    fn visit_array(&mut self, name: Option<&str>) -> Option<Box<dyn AnnotationVisitor + '_>> {
        let visible = self.record.visible;
        let sink = ValueSink::Member(&mut self.record.values, name.unwrap_or_default().to_string());
        Some(Box::new(ArrayCollector::new(visible, sink)))
    }

    fn visit_end(&mut self) {
        let record = std::mem::take(&mut self.record);
        match &mut self.sink {
            AnnotationSink::List(list) => list.push(record),
            AnnotationSink::Value(sink) => sink.deliver(AnnotationValueRecord::Annotation(Box::new(record))),
        }
    }
}

/// Collects the elements of an array-valued member.
pub(super) struct ArrayCollector<'a> {
    visible: bool,
    elements: Vec<AnnotationValueRecord>,
    sink: ValueSink<'a>,
}

impl<'a> ArrayCollector<'a> {
    pub(super) fn new(visible: bool, sink: ValueSink<'a>) -> Self {
        Self {
            visible,
            elements: Vec::new(),
            sink,
        }
    }
}

impl AnnotationVisitor for ArrayCollector<'_> {
    fn visit(&mut self, _name: Option<&str>, value: &ConstValue) {
        self.elements.push(AnnotationValueRecord::Const(value.clone()));
    }

    fn visit_enum(&mut self, _name: Option<&str>, descriptor: &str, value: &str) {
        self.elements.push(AnnotationValueRecord::Enum {
            descriptor: descriptor.to_string(),
            name: value.to_string(),
        });
    }

    fn visit_class(&mut self, _name: Option<&str>, descriptor: &str) {
        self.elements
            .push(AnnotationValueRecord::Class(descriptor.to_string()));
    }

    fn visit_annotation(
        &mut self,
        _name: Option<&str>,
        descriptor: &str,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            self.visible,
            AnnotationSink::Value(ValueSink::Element(&mut self.elements)),
        )))
    }

    fn visit_array(&mut self, _name: Option<&str>) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(ArrayCollector::new(
            self.visible,
            ValueSink::Element(&mut self.elements),
        )))
    }

    fn visit_end(&mut self) {
        let elements = std::mem::take(&mut self.elements);
        self.sink.deliver(AnnotationValueRecord::Array(elements));
    }
}

/// Receives the single unnamed value of an annotation element default.
pub(super) struct DefaultValueCollector<'a> {
    visible: bool,
    slot: &'a mut Option<AnnotationValueRecord>,
}

impl<'a> DefaultValueCollector<'a> {
    pub(super) fn new(visible: bool, slot: &'a mut Option<AnnotationValueRecord>) -> Self {
        Self { visible, slot }
    }
}

impl AnnotationVisitor for DefaultValueCollector<'_> {
    fn visit(&mut self, _name: Option<&str>, value: &ConstValue) {
        *self.slot = Some(AnnotationValueRecord::Const(value.clone()));
    }

    fn visit_enum(&mut self, _name: Option<&str>, descriptor: &str, value: &str) {
        *self.slot = Some(AnnotationValueRecord::Enum {
            descriptor: descriptor.to_string(),
            name: value.to_string(),
        });
    }

    fn visit_class(&mut self, _name: Option<&str>, descriptor: &str) {
        *self.slot = Some(AnnotationValueRecord::Class(descriptor.to_string()));
    }

    fn visit_annotation(
        &mut self,
        _name: Option<&str>,
        descriptor: &str,
    ) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(AnnotationCollector::new(
            descriptor,
            self.visible,
            AnnotationSink::Value(ValueSink::Slot(&mut *self.slot)),
        )))
    }

    fn visit_array(&mut self, _name: Option<&str>) -> Option<Box<dyn AnnotationVisitor + '_>> {
        Some(Box::new(ArrayCollector::new(
            self.visible,
            ValueSink::Slot(&mut *self.slot),
        )))
    }
}
