use jtype_classfile::{SignatureReader, SignatureVisitor};

/// Formal type parameter names declared by a class or method signature, in
/// order. Bounds are skipped; they can only be resolved once every class of
/// the build has an identity.
pub fn formal_type_params(signature: &str) -> jtype_classfile::Result<Vec<String>> {
    let mut names = FormalNames::default();
    SignatureReader::new(signature).accept(&mut names)?;
    Ok(names.0)
}

#[derive(Default)]
struct FormalNames(Vec<String>);

impl SignatureVisitor for FormalNames {
    fn visit_formal_type_parameter(&mut self, name: &str) {
        self.0.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_names_in_declaration_order() {
        let names = formal_type_params(
            "<K:Ljava/lang/Object;V::Ljava/lang/Comparable<TV;>;>Ljava/lang/Object;",
        )
        .unwrap();
        assert_eq!(names, vec!["K", "V"]);
        assert_eq!(formal_type_params("(TT;)V").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn malformed_signature_is_an_error() {
        assert!(formal_type_params("<T:Ljava/lang/Object").is_err());
    }
}
