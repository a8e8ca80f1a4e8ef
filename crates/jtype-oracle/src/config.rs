use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tuning knobs for a [`TypeOracle`](crate::TypeOracle).
///
/// ```toml
/// trace_classes = true
/// suppressed_annotation_prefixes = ["javax.validation."]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Internal name of the root class.
    #[serde(default = "default_java_lang_object")]
    pub java_lang_object: String,

    /// Emit a trace event for every collector callback.
    #[serde(default)]
    pub trace_classes: bool,

    /// Annotation packages that are routinely missing from the build. After
    /// the first hint, unresolvable annotations from these are only logged at
    /// debug level.
    #[serde(default = "default_suppressed_annotation_prefixes")]
    pub suppressed_annotation_prefixes: Vec<String>,

    /// When the enclosing parameterization of a member type named by its
    /// binary name cannot be reconstructed, leave the enclosing type off
    /// instead of falling back to the raw enclosing type.
    #[serde(default)]
    pub strict_enclosing_reconstruction: bool,
}

fn default_java_lang_object() -> String {
    jtype_types::JAVA_LANG_OBJECT.to_string()
}

fn default_suppressed_annotation_prefixes() -> Vec<String> {
    vec![
        "javax.validation.".to_string(),
        "com.google.gwt.validation.".to_string(),
    ]
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            java_lang_object: default_java_lang_object(),
            trace_classes: false,
            suppressed_annotation_prefixes: default_suppressed_annotation_prefixes(),
            strict_enclosing_reconstruction: false,
        }
    }
}

impl OracleConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: "jtype::oracle", path = %path.display(), "loaded oracle config");
        Ok(config)
    }

    /// Whether a missing annotation of this qualified name is expected.
    pub(crate) fn is_suppressed_annotation(&self, qualified_name: &str) -> bool {
        self.suppressed_annotation_prefixes
            .iter()
            .any(|prefix| qualified_name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let config = OracleConfig::from_toml_str("").unwrap();
        assert_eq!(config, OracleConfig::default());
        assert!(config.is_suppressed_annotation("javax.validation.constraints.NotNull"));
        assert!(!config.is_suppressed_annotation("javax.inject.Inject"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = OracleConfig::from_toml_str("trace_clases = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }
}
