//! Event-driven reader for the generic `Signature` attribute grammar
//! (JVMS 4.7.9.1).
//!
//! [`SignatureReader`] walks the text once and drives a [`SignatureVisitor`].
//! Every structural position (bound, superclass, parameter, type argument, ...)
//! asks the current visitor for the visitor of the nested type. A visitor that
//! keeps its own state for the nested type can return `Box::new(self)`.

use crate::error::{Error, Result};

/// Wildcard marker of a bounded type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeArgKind {
    /// `=`: the argument is the type itself.
    Exact,
    /// `+`: `? extends T`.
    Extends,
    /// `-`: `? super T`.
    Super,
}

impl TypeArgKind {
    pub fn marker(self) -> char {
        match self {
            TypeArgKind::Exact => '=',
            TypeArgKind::Extends => '+',
            TypeArgKind::Super => '-',
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '=' => Some(TypeArgKind::Exact),
            '+' => Some(TypeArgKind::Extends),
            '-' => Some(TypeArgKind::Super),
            _ => None,
        }
    }
}

pub trait SignatureVisitor {
    fn visit_formal_type_parameter(&mut self, _name: &str) {}

    fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_superclass(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_interface(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_parameter_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_return_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_exception_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    /// `descriptor` is one of `ZBCSIJFDV`.
    fn visit_base_type(&mut self, _descriptor: char) {}

    fn visit_type_variable(&mut self, _name: &str) {}

    fn visit_array_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    fn visit_class_type(&mut self, _name: &str) {}

    /// Simple name of a member type following its (possibly parameterized)
    /// outer class, as in `Outer<T>.Inner`.
    fn visit_inner_class_type(&mut self, _name: &str) {}

    /// Unbounded `*` argument.
    fn visit_type_argument(&mut self) {}

    fn visit_bounded_type_argument(&mut self, _kind: TypeArgKind) -> Box<dyn SignatureVisitor + '_> {
        Box::new(IgnoreSignature)
    }

    /// Ends a class type started by `visit_class_type`.
    fn visit_end(&mut self) {}
}

/// Visitor that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreSignature;

impl SignatureVisitor for IgnoreSignature {}

impl<V: SignatureVisitor + ?Sized> SignatureVisitor for &mut V {
    fn visit_formal_type_parameter(&mut self, name: &str) {
        (**self).visit_formal_type_parameter(name)
    }

    fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_class_bound()
    }

    fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_interface_bound()
    }

    fn visit_superclass(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_superclass()
    }

    fn visit_interface(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_interface()
    }

    fn visit_parameter_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_parameter_type()
    }

    fn visit_return_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_return_type()
    }

    fn visit_exception_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_exception_type()
    }

    fn visit_base_type(&mut self, descriptor: char) {
        (**self).visit_base_type(descriptor)
    }

    fn visit_type_variable(&mut self, name: &str) {
        (**self).visit_type_variable(name)
    }

    fn visit_array_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_array_type()
    }

    fn visit_class_type(&mut self, name: &str) {
        (**self).visit_class_type(name)
    }

    fn visit_inner_class_type(&mut self, name: &str) {
        (**self).visit_inner_class_type(name)
    }

    fn visit_type_argument(&mut self) {
        (**self).visit_type_argument()
    }

    fn visit_bounded_type_argument(&mut self, kind: TypeArgKind) -> Box<dyn SignatureVisitor + '_> {
        (**self).visit_bounded_type_argument(kind)
    }

    fn visit_end(&mut self) {
        (**self).visit_end()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignatureReader<'a> {
    signature: &'a str,
}

impl<'a> SignatureReader<'a> {
    pub fn new(signature: &'a str) -> Self {
        Self { signature }
    }

    /// Walks a class signature (`<T:...>Lsuper;Liface;...`) or a method
    /// signature (`<T:...>(params)ret^ex...`).
    pub fn accept(&self, visitor: &mut (dyn SignatureVisitor + '_)) -> Result<()> {
        let len = self.signature.len();
        let mut pos = 0;

        if self.byte(0)? == b'<' {
            pos = 1;
            loop {
                let end = self.find(b':', pos)?;
                if end == pos {
                    return Err(self.invalid());
                }
                visitor.visit_formal_type_parameter(&self.signature[pos..end]);
                pos = end + 1;

                if matches!(self.byte(pos)?, b'L' | b'[' | b'T') {
                    pos = self.parse_type(pos, &mut *visitor.visit_class_bound())?;
                }
                while self.byte(pos)? == b':' {
                    pos = self.parse_type(pos + 1, &mut *visitor.visit_interface_bound())?;
                }
                if self.byte(pos)? == b'>' {
                    break;
                }
            }
            pos += 1;
        }

        if self.byte(pos)? == b'(' {
            pos += 1;
            while self.byte(pos)? != b')' {
                pos = self.parse_type(pos, &mut *visitor.visit_parameter_type())?;
            }
            pos = self.parse_type(pos + 1, &mut *visitor.visit_return_type())?;
            while pos < len {
                if self.byte(pos)? != b'^' {
                    return Err(self.invalid());
                }
                pos = self.parse_type(pos + 1, &mut *visitor.visit_exception_type())?;
            }
        } else {
            pos = self.parse_type(pos, &mut *visitor.visit_superclass())?;
            while pos < len {
                pos = self.parse_type(pos, &mut *visitor.visit_interface())?;
            }
        }
        Ok(())
    }

    /// Walks a single type signature, as found on fields.
    pub fn accept_type(&self, visitor: &mut (dyn SignatureVisitor + '_)) -> Result<()> {
        let pos = self.parse_type(0, visitor)?;
        if pos != self.signature.len() {
            return Err(self.invalid());
        }
        Ok(())
    }

    fn invalid(&self) -> Error {
        Error::InvalidSignature(self.signature.to_string())
    }

    fn byte(&self, pos: usize) -> Result<u8> {
        self.signature
            .as_bytes()
            .get(pos)
            .copied()
            .ok_or_else(|| self.invalid())
    }

    fn find(&self, needle: u8, from: usize) -> Result<usize> {
        self.signature
            .as_bytes()
            .get(from..)
            .and_then(|rest| rest.iter().position(|b| *b == needle))
            .map(|offset| from + offset)
            .ok_or_else(|| self.invalid())
    }

    fn parse_type(&self, pos: usize, visitor: &mut (dyn SignatureVisitor + '_)) -> Result<usize> {
        let c = self.byte(pos)?;
        let mut pos = pos + 1;
        match c {
            b'Z' | b'B' | b'C' | b'S' | b'I' | b'J' | b'F' | b'D' | b'V' => {
                visitor.visit_base_type(c as char);
                Ok(pos)
            }
            b'[' => self.parse_type(pos, &mut *visitor.visit_array_type()),
            b'T' => {
                let end = self.find(b';', pos)?;
                if end == pos {
                    return Err(self.invalid());
                }
                visitor.visit_type_variable(&self.signature[pos..end]);
                Ok(end + 1)
            }
            b'L' => {
                let mut start = pos;
                let mut visited = false;
                let mut inner = false;
                loop {
                    let c = self.byte(pos)?;
                    pos += 1;
                    match c {
                        b'.' | b';' => {
                            if !visited {
                                self.visit_name(visitor, start, pos - 1, inner)?;
                            }
                            if c == b';' {
                                visitor.visit_end();
                                return Ok(pos);
                            }
                            start = pos;
                            visited = false;
                            inner = true;
                        }
                        b'<' => {
                            self.visit_name(visitor, start, pos - 1, inner)?;
                            visited = true;
                            loop {
                                match self.byte(pos)? {
                                    b'>' => break,
                                    b'*' => {
                                        pos += 1;
                                        visitor.visit_type_argument();
                                    }
                                    b'+' => {
                                        pos = self.parse_type(
                                            pos + 1,
                                            &mut *visitor.visit_bounded_type_argument(TypeArgKind::Extends),
                                        )?;
                                    }
                                    b'-' => {
                                        pos = self.parse_type(
                                            pos + 1,
                                            &mut *visitor.visit_bounded_type_argument(TypeArgKind::Super),
                                        )?;
                                    }
                                    _ => {
                                        pos = self.parse_type(
                                            pos,
                                            &mut *visitor.visit_bounded_type_argument(TypeArgKind::Exact),
                                        )?;
                                    }
                                }
                            }
                            // The closing `>` must be followed by `.` or `;`.
                            pos += 1;
                            if !matches!(self.byte(pos)?, b'.' | b';') {
                                return Err(self.invalid());
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => Err(self.invalid()),
        }
    }

    fn visit_name(
        &self,
        visitor: &mut (dyn SignatureVisitor + '_),
        start: usize,
        end: usize,
        inner: bool,
    ) -> Result<()> {
        if end <= start {
            return Err(self.invalid());
        }
        let name = &self.signature[start..end];
        if inner {
            visitor.visit_inner_class_type(name);
        } else {
            visitor.visit_class_type(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rebuilds signature text from events, so a walk that reproduces its
    /// input proves the event order.
    #[derive(Default)]
    struct Rewriter {
        out: String,
        has_formals: bool,
        has_params: bool,
        arg_stack: u32,
    }

    impl Rewriter {
        fn end_formals(&mut self) {
            if self.has_formals {
                self.has_formals = false;
                self.out.push('>');
            }
        }

        fn end_arguments(&mut self) {
            if self.arg_stack % 2 == 1 {
                self.out.push('>');
            }
            self.arg_stack /= 2;
        }

        fn open_arguments(&mut self) {
            if self.arg_stack % 2 == 0 {
                self.arg_stack |= 1;
                self.out.push('<');
            }
        }
    }

    impl SignatureVisitor for Rewriter {
        fn visit_formal_type_parameter(&mut self, name: &str) {
            if !self.has_formals {
                self.has_formals = true;
                self.out.push('<');
            }
            self.out.push_str(name);
            self.out.push(':');
        }

        fn visit_class_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
            Box::new(self)
        }

        fn visit_interface_bound(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.out.push(':');
            Box::new(self)
        }

        fn visit_superclass(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.end_formals();
            Box::new(self)
        }

        fn visit_interface(&mut self) -> Box<dyn SignatureVisitor + '_> {
            Box::new(self)
        }

        fn visit_parameter_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.end_formals();
            if !self.has_params {
                self.has_params = true;
                self.out.push('(');
            }
            Box::new(self)
        }

        fn visit_return_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.end_formals();
            if !self.has_params {
                self.out.push('(');
            }
            self.out.push(')');
            Box::new(self)
        }

        fn visit_exception_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.out.push('^');
            Box::new(self)
        }

        fn visit_base_type(&mut self, descriptor: char) {
            self.out.push(descriptor);
        }

        fn visit_type_variable(&mut self, name: &str) {
            self.out.push('T');
            self.out.push_str(name);
            self.out.push(';');
        }

        fn visit_array_type(&mut self) -> Box<dyn SignatureVisitor + '_> {
            self.out.push('[');
            Box::new(self)
        }

        fn visit_class_type(&mut self, name: &str) {
            self.out.push('L');
            self.out.push_str(name);
            self.arg_stack *= 2;
        }

        fn visit_inner_class_type(&mut self, name: &str) {
            self.end_arguments();
            self.out.push('.');
            self.out.push_str(name);
            self.arg_stack *= 2;
        }

        fn visit_type_argument(&mut self) {
            self.open_arguments();
            self.out.push('*');
        }

        fn visit_bounded_type_argument(&mut self, kind: TypeArgKind) -> Box<dyn SignatureVisitor + '_> {
            self.open_arguments();
            if kind != TypeArgKind::Exact {
                self.out.push(kind.marker());
            }
            Box::new(self)
        }

        fn visit_end(&mut self) {
            self.end_arguments();
            self.out.push(';');
        }
    }

    fn rewrite(signature: &str) -> String {
        let mut rewriter = Rewriter::default();
        SignatureReader::new(signature).accept(&mut rewriter).unwrap();
        rewriter.out
    }

    #[test]
    fn class_signature_events_reproduce_input() {
        for sig in [
            "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/util/AbstractMap<TK;TV;>;Ljava/util/Map<TK;TV;>;",
            "<T::Ljava/lang/Comparable<-TT;>;>Ljava/lang/Object;",
            "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;Ljava/io/Serializable;",
            "Lcom/example/Outer<Ljava/lang/String;>.Inner<[I>.Deeper;",
        ] {
            assert_eq!(rewrite(sig), sig);
        }
    }

    #[test]
    fn method_signature_events_reproduce_input() {
        for sig in [
            "<T:Ljava/lang/Object;>(TT;[[JLjava/util/List<*>;)TT;^Ljava/io/IOException;^TX;",
            "()V",
            "(Ljava/util/Map<+Ljava/lang/Number;-Ljava/lang/Integer;>;)[Ljava/lang/String;",
        ] {
            assert_eq!(rewrite(sig), sig);
        }
    }

    #[test]
    fn field_type_signature() {
        let mut rewriter = Rewriter::default();
        SignatureReader::new("[Ljava/util/List<TT;>;")
            .accept_type(&mut rewriter)
            .unwrap();
        assert_eq!(rewriter.out, "[Ljava/util/List<TT;>;");
    }

    #[test]
    fn malformed_signatures_are_errors() {
        for sig in ["", "<T>V", "Ljava/lang/Object", "(I", "L;", "Ljava/util/List<TT;>", "Q"] {
            let result = SignatureReader::new(sig).accept(&mut IgnoreSignature);
            assert_eq!(result, Err(Error::InvalidSignature(sig.to_string())), "{sig}");
        }
        assert!(SignatureReader::new("II").accept_type(&mut IgnoreSignature).is_err());
    }
}
