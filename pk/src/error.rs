//! Template error types

use std::path::PathBuf;
use thiserror::Error;

use crate::family::Family;
use crate::template::Values;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur while loading, resolving or rendering templates
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Template file is empty: {}", .path.display())]
    EmptyDefinition { path: PathBuf },

    #[error("Invalid version block #{index} in {}: {reason}", .path.display())]
    InvalidBlock { path: PathBuf, index: usize, reason: String },

    #[error("Unknown template type '{type_name}' in {}", .path.display())]
    UnknownType { path: PathBuf, type_name: String },

    #[error("Template {} (version {version}) is missing variant field: {field}", .path.display())]
    MissingVariantField {
        path: PathBuf,
        version: String,
        field: &'static str,
    },

    #[error("Version {version} not found in {}", .path.display())]
    VersionNotFound { path: PathBuf, version: String },

    #[error("Version {version} of {} is a {found}, expected {expected}", .path.display())]
    FamilyMismatch {
        path: PathBuf,
        version: String,
        expected: Family,
        found: Family,
    },

    #[error(
        "Missing tags [{}] for template {}\n>>> template:\n{template}\n>>> values: {}",
        .missing.join(", "),
        .path.display(),
        value_summary(.values)
    )]
    Validation {
        path: PathBuf,
        template: String,
        values: Values,
        missing: Vec<String>,
    },

    #[error("Failed to render template {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("Duplicate template name '{name}': {} and {}", .first.display(), .second.display())]
    DuplicateTemplate { name: String, first: PathBuf, second: PathBuf },

    #[error("Failed to scan templates directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl TemplateError {
    /// Check if this error means a file or registry name does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TemplateError::FileNotFound { .. } | TemplateError::TemplateNotFound { .. }
        )
    }

    /// Names of the tags that were missing, for validation failures
    pub fn missing_tags(&self) -> Option<&[String]> {
        match self {
            TemplateError::Validation { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

fn value_summary(values: &Values) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| format!("{:?}", values))
}
