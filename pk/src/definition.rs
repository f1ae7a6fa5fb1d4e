//! Template definition files
//!
//! A definition file is a YAML stream of one or more version blocks:
//!
//! ```yaml
//! version: "1.0.0"
//! desc: Expert role
//! type: RoleBasedPrompt
//! role: expert
//! expertise: [programming]
//! template: |
//!   You are a {{role}} skilled in {{expertise}}.
//! ---
//! version: "1.1.0"
//! ...
//! ```
//!
//! Later documents are newer versions. "Latest" means last in the file, not
//! the greatest version string.
//!
//! Unquoted numeric versions are read as YAML numbers and then turned into
//! strings, so `version: 1.10` becomes `"1.1"`. Quote versions (`"1.10"`) to
//! keep them exactly as written.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::family::{Family, Variant};

/// One version of a template definition
#[derive(Debug, Clone, PartialEq)]
pub struct VersionBlock {
    pub version: String,
    pub desc: String,
    pub family: Family,
    pub template: String,
    pub variant: Variant,
}

/// A parsed definition file
#[derive(Debug, Clone)]
pub struct Definition {
    path: PathBuf,
    blocks: Vec<VersionBlock>,
}

impl Definition {
    /// Read and parse the definition file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Definition::load: called");
        if !path.exists() {
            return Err(TemplateError::FileNotFound { path: path.to_path_buf() });
        }
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse definition `content`, attributing errors to `path`
    pub fn parse(path: impl AsRef<Path>, content: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut blocks = Vec::new();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = Value::deserialize(document).map_err(|source| TemplateError::Yaml {
                path: path.clone(),
                source,
            })?;
            if value.is_null() {
                debug!("Definition::parse: skipping empty document");
                continue;
            }
            let index = blocks.len();
            blocks.push(parse_block(&path, index, value)?);
        }

        if blocks.is_empty() {
            return Err(TemplateError::EmptyDefinition { path });
        }

        debug!(?path, block_count = blocks.len(), "Definition::parse: complete");
        Ok(Self { path, blocks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All version blocks in file order
    pub fn blocks(&self) -> &[VersionBlock] {
        &self.blocks
    }

    /// Version ids in file order
    pub fn versions(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.version.as_str()).collect()
    }

    /// The last block in file order
    pub fn latest(&self) -> &VersionBlock {
        // parse() never builds an empty definition
        &self.blocks[self.blocks.len() - 1]
    }

    /// Select a block: first exact match for `version`, or the latest when `None`
    pub fn select(&self, version: Option<&str>) -> Result<&VersionBlock> {
        match version {
            Some(wanted) => {
                debug!(%wanted, "Definition::select: looking up explicit version");
                self.blocks
                    .iter()
                    .find(|b| b.version == wanted)
                    .ok_or_else(|| TemplateError::VersionNotFound {
                        path: self.path.clone(),
                        version: wanted.to_string(),
                    })
            }
            None => {
                debug!("Definition::select: using latest block");
                Ok(self.latest())
            }
        }
    }
}

fn parse_block(path: &Path, index: usize, value: Value) -> Result<VersionBlock> {
    let invalid = |reason: String| TemplateError::InvalidBlock {
        path: path.to_path_buf(),
        index,
        reason,
    };

    let Value::Mapping(mut mapping) = value else {
        return Err(invalid("expected a mapping".to_string()));
    };

    let version = match mapping.remove("version") {
        Some(v) => scalar_string(&v).ok_or_else(|| invalid("'version' must be a scalar".to_string()))?,
        None => return Err(invalid("missing 'version'".to_string())),
    };
    let desc = match mapping.remove("desc") {
        Some(Value::Null) | None => String::new(),
        Some(v) => scalar_string(&v).ok_or_else(|| invalid("'desc' must be a scalar".to_string()))?,
    };
    let type_name = match mapping.remove("type") {
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid("'type' must be a string".to_string())),
        None => return Err(invalid("missing 'type'".to_string())),
    };
    let template = match mapping.remove("template") {
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid("'template' must be a string".to_string())),
        None => return Err(invalid("missing 'template'".to_string())),
    };

    let family: Family = type_name.parse().map_err(|_| TemplateError::UnknownType {
        path: path.to_path_buf(),
        type_name: type_name.clone(),
    })?;

    for &field in family.required_fields() {
        if is_absent(&mapping, field) {
            return Err(TemplateError::MissingVariantField {
                path: path.to_path_buf(),
                version,
                field,
            });
        }
    }

    let variant = Variant::from_fields(family, &mapping).map_err(invalid)?;

    Ok(VersionBlock {
        version,
        desc,
        family,
        template,
        variant,
    })
}

fn is_absent(mapping: &Mapping, field: &str) -> bool {
    matches!(mapping.get(field), None | Some(Value::Null))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
