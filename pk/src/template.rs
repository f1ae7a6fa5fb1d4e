//! Template instances
//!
//! A [`PromptTemplate`] is one resolved version of one definition file. It
//! keeps the active body, the family's variant fields and the set of
//! placeholder tags the body references. The tag set is recomputed whenever
//! the active version changes.
//!
//! Rendering goes through Handlebars, so block syntax (`{{#if}}`, `{{#each}}`)
//! works in bodies. Every plain `{{name}}` tag is a value lookup, even when the
//! name matches a Handlebars helper such as `log` or `len`. Values become text
//! as follows: strings as written, lists as `[a, b]`, and objects (or lists
//! holding objects) as compact JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::definition::{Definition, VersionBlock};
use crate::error::{Result, TemplateError};
use crate::family::{Family, Variant, VariantOverrides};
use crate::tags::{extract_tags, replace_tags};

/// Named values supplied at render time
pub type Values = BTreeMap<String, Value>;

/// Introspection record for a template (`type` is the family tag)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub template_path: PathBuf,
    pub template: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub family: Family,
    pub version: String,
    pub desc: String,
    #[serde(flatten)]
    pub variant: Variant,
}

/// Minimal record needed to rebuild a template
///
/// Unknown keys are ignored, so a serialized [`TemplateInfo`] reads back as a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub template_path: PathBuf,
    #[serde(default)]
    pub version: Option<String>,
}

impl From<&TemplateInfo> for TemplateRecord {
    fn from(info: &TemplateInfo) -> Self {
        Self {
            template_path: info.template_path.clone(),
            version: Some(info.version.clone()),
        }
    }
}

/// Shared contract of every template family
///
/// Implementors provide the accessors and `format`; tag discovery,
/// validation and rendering come for free.
pub trait Prompt {
    /// Source definition file
    fn path(&self) -> &Path;

    /// Active template body
    fn body(&self) -> &str;

    /// Placeholder names referenced by the active body
    fn tag_set(&self) -> &BTreeSet<String>;

    /// Introspection record
    fn info(&self) -> TemplateInfo;

    /// Produce the final prompt text for `values`
    fn format(&self, values: &Values) -> Result<String>;

    /// Copy of the tag set
    fn tags(&self) -> BTreeSet<String> {
        self.tag_set().clone()
    }

    /// Fail if any tag has no value; return (and warn about) names that are not tags
    fn validate_tags(&self, values: &Values) -> Result<Vec<String>> {
        let tags = self.tag_set();
        let missing: Vec<String> = tags.iter().filter(|t| !values.contains_key(*t)).cloned().collect();
        if !missing.is_empty() {
            debug!(path = ?self.path(), ?missing, "validate_tags: missing tags");
            return Err(TemplateError::Validation {
                path: self.path().to_path_buf(),
                template: self.body().to_string(),
                values: values.clone(),
                missing,
            });
        }

        let unused: Vec<String> = values.keys().filter(|k| !tags.contains(*k)).cloned().collect();
        if !unused.is_empty() {
            warn!(path = ?self.path(), "Unused template values: {}", unused.join(", "));
        }
        Ok(unused)
    }

    /// Validate `values` and substitute them into the body
    fn render(&self, values: &Values) -> Result<String> {
        self.validate_tags(values)?;
        let body = replace_tags(self.body(), |name| format!("{{{{{} [{}]}}}}", VALUE_HELPER, name));
        ENGINE
            .render_template(&body, values)
            .map_err(|e| TemplateError::Render {
                path: self.path().to_path_buf(),
                source: Box::new(e),
            })
    }
}

const VALUE_HELPER: &str = "promptkit_value";

static ENGINE: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut hbs = Handlebars::new();
    // Prompts are plain text
    hbs.register_escape_fn(handlebars::no_escape);
    hbs.register_helper(VALUE_HELPER, Box::new(value_helper));
    hbs
});

fn value_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h.param(0).map(|p| prompt_text(p.value())).unwrap_or_default();
    out.write(&text)?;
    Ok(())
}

/// Text a value contributes to a prompt
fn prompt_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) if !items.iter().any(Value::is_object) => {
            let parts: Vec<String> = items.iter().map(prompt_text).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// One resolved version of a template definition
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    path: PathBuf,
    content: String,
    version: String,
    desc: String,
    variant: Variant,
    overrides: VariantOverrides,
    tags: BTreeSet<String>,
}

impl PromptTemplate {
    /// Load the latest version of the definition at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_overrides(path, None, VariantOverrides::default())
    }

    /// Load a specific version of the definition at `path`
    pub fn load_version(path: impl AsRef<Path>, version: &str) -> Result<Self> {
        Self::with_overrides(path, Some(version), VariantOverrides::default())
    }

    /// Load a version (latest when `None`) with explicit variant values taking precedence
    pub fn with_overrides(path: impl AsRef<Path>, version: Option<&str>, overrides: VariantOverrides) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, ?version, "PromptTemplate::with_overrides: called");
        let definition = Definition::load(path)?;
        let block = definition.select(version)?;
        Ok(Self::from_block(path, block, overrides))
    }

    /// Load the well-known definition of `family` under `templates_dir`
    pub fn well_known(family: Family, templates_dir: impl AsRef<Path>) -> Result<Self> {
        Self::well_known_with(family, templates_dir, VariantOverrides::default())
    }

    /// Like [`PromptTemplate::well_known`], with constructor overrides
    pub fn well_known_with(
        family: Family,
        templates_dir: impl AsRef<Path>,
        overrides: VariantOverrides,
    ) -> Result<Self> {
        let path = templates_dir.as_ref().join(family.default_path());
        let template = Self::with_overrides(&path, None, overrides)?;
        if template.family() != family {
            return Err(TemplateError::FamilyMismatch {
                path,
                version: template.version,
                expected: family,
                found: template.variant.family(),
            });
        }
        Ok(template)
    }

    /// Rebuild a template from a record produced by [`Prompt::info`]
    pub fn from_record(record: &TemplateRecord) -> Result<Self> {
        debug!(?record, "PromptTemplate::from_record: called");
        Self::with_overrides(&record.template_path, record.version.as_deref(), VariantOverrides::default())
    }

    fn from_block(path: &Path, block: &VersionBlock, overrides: VariantOverrides) -> Self {
        let mut variant = block.variant.clone();
        variant.apply_overrides(&overrides);
        Self {
            path: path.to_path_buf(),
            content: block.template.clone(),
            version: block.version.clone(),
            desc: block.desc.clone(),
            variant,
            overrides,
            tags: extract_tags(&block.template),
        }
    }

    /// Switch the active version in place
    ///
    /// The definition is re-read and the new state is built completely before
    /// it replaces the current one, so a failed switch changes nothing.
    /// Constructor overrides are re-applied to the new version's fields.
    pub fn switch_version(&mut self, version: &str) -> Result<()> {
        debug!(path = ?self.path, from = %self.version, to = %version, "switch_version: called");
        let definition = Definition::load(&self.path)?;
        let block = definition.select(Some(version))?;
        if block.family != self.family() {
            return Err(TemplateError::FamilyMismatch {
                path: self.path.clone(),
                version: version.to_string(),
                expected: self.family(),
                found: block.family,
            });
        }
        *self = Self::from_block(&self.path, block, self.overrides.clone());
        Ok(())
    }

    /// All version ids of this template's definition, in file order
    pub fn versions(&self) -> Result<Vec<String>> {
        let definition = Definition::load(&self.path)?;
        Ok(definition.versions().into_iter().map(String::from).collect())
    }

    pub fn family(&self) -> Family {
        self.variant.family()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }
}

impl Prompt for PromptTemplate {
    fn path(&self) -> &Path {
        &self.path
    }

    fn body(&self) -> &str {
        &self.content
    }

    fn tag_set(&self) -> &BTreeSet<String> {
        &self.tags
    }

    fn info(&self) -> TemplateInfo {
        TemplateInfo {
            template_path: self.path.clone(),
            template: self.content.clone(),
            tags: self.tags.iter().cloned().collect(),
            family: self.family(),
            version: self.version.clone(),
            desc: self.desc.clone(),
            variant: self.variant.clone(),
        }
    }

    fn format(&self, values: &Values) -> Result<String> {
        // No family adds formatting semantics beyond rendering
        match self.family() {
            Family::Task
            | Family::Domain
            | Family::Role
            | Family::ChainOfThought
            | Family::FewShot
            | Family::SelfConsistency
            | Family::SelfCritique => self.render(values),
        }
    }
}
