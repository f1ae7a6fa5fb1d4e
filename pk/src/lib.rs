//! promptkit - versioned prompt templates
//!
//! Loads prompt template definitions from YAML files, resolves them into one
//! of seven typed template families, discovers the placeholders each body
//! needs and renders them with Handlebars.
//!
//! # Layout
//!
//! ```text
//! templates/
//! ├── base/        # chain_of_thought, few_shot, self_consistency, self_critique
//! ├── domains/     # technical, ...
//! ├── roles/       # expert, ...
//! └── tasks/       # qa, summarization, ...
//! ```
//!
//! Each file holds one or more `---` separated version blocks; the last block
//! is the latest version. A template's name is its file stem.
//!
//! # Example
//!
//! ```ignore
//! use promptkit::{TemplateRegistry, Values};
//!
//! let mut registry = TemplateRegistry::new("templates")?;
//! let mut values = Values::new();
//! values.insert("question".into(), "What is ownership?".into());
//! values.insert("context".into(), "The Rust book, chapter 4".into());
//! let prompt = registry.format_template("qa", None, &values)?;
//! ```
//!
//! # Modules
//!
//! - [`tags`] - placeholder discovery
//! - [`family`] - the template families and their variant fields
//! - [`definition`] - definition file parsing and version selection
//! - [`template`] - resolved templates, validation and rendering
//! - [`registry`] - directory-backed template index
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod definition;
pub mod error;
pub mod family;
pub mod registry;
pub mod tags;
pub mod template;

pub use config::{Config, DuplicatePolicy, RegistryConfig};
pub use definition::{Definition, VersionBlock};
pub use error::{Result, TemplateError};
pub use family::{
    ChainOfThoughtFields, DomainFields, Family, FewShotFields, RoleFields, SelfConsistencyFields, SelfCritiqueFields,
    TaskFields, Variant, VariantOverrides,
};
pub use registry::TemplateRegistry;
pub use tags::extract_tags;
pub use template::{Prompt, PromptTemplate, TemplateInfo, TemplateRecord, Values};
