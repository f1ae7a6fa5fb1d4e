//! Template registry
//!
//! Scans a directory tree once, loads every definition file it finds and
//! indexes the resulting templates by file stem. Construction is all or
//! nothing: a single malformed file aborts the whole build.
//!
//! Lookups that pin a version switch the stored template in place, so the
//! registry needs `&mut self` for them. Hosts sharing a registry across
//! threads must wrap it in their own lock.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::error::{Result, TemplateError};
use crate::family::Family;
use crate::template::{Prompt, PromptTemplate, TemplateInfo, Values};

/// Indexed collection of templates under one root directory
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    config: RegistryConfig,
    templates: BTreeMap<String, PromptTemplate>,
}

impl TemplateRegistry {
    /// Build a registry over `root` with default options
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(RegistryConfig::new(root))
    }

    /// Build a registry from explicit options
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        debug!(?config, "TemplateRegistry::with_config: called");
        let templates = scan(&config)?;
        info!(
            root = %config.root.display(),
            template_count = templates.len(),
            "Template registry loaded"
        );
        Ok(Self { config, templates })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Look up a template without touching its active version
    pub fn get(&self, name: &str) -> Result<&PromptTemplate> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::TemplateNotFound { name: name.to_string() })
    }

    /// Look up a template, switching it to `version` first when given
    pub fn get_template(&mut self, name: &str, version: Option<&str>) -> Result<&PromptTemplate> {
        let template = self
            .templates
            .get_mut(name)
            .ok_or_else(|| TemplateError::TemplateNotFound { name: name.to_string() })?;
        if let Some(version) = version {
            if version != template.version() {
                debug!(%name, %version, "get_template: switching version");
                template.switch_version(version)?;
            }
        }
        Ok(&*template)
    }

    /// Introspection record of a template
    pub fn get_template_info(&mut self, name: &str, version: Option<&str>) -> Result<TemplateInfo> {
        Ok(self.get_template(name, version)?.info())
    }

    /// All registered names, sorted
    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Names of templates whose family tag equals `type_name`
    ///
    /// An unrecognized tag matches nothing.
    pub fn get_templates_by_type(&self, type_name: &str) -> Vec<&str> {
        match type_name.parse::<Family>() {
            Ok(family) => self.templates_of(family),
            Err(_) => {
                debug!(%type_name, "get_templates_by_type: unknown type");
                Vec::new()
            }
        }
    }

    /// Names of templates belonging to `family`
    pub fn templates_of(&self, family: Family) -> Vec<&str> {
        self.templates
            .iter()
            .filter(|(_, t)| t.family() == family)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Version ids of a template's definition, in file order
    pub fn versions(&self, name: &str) -> Result<Vec<String>> {
        self.get(name)?.versions()
    }

    /// Format one template
    pub fn format_template(&mut self, name: &str, version: Option<&str>, values: &Values) -> Result<String> {
        self.get_template(name, version)?.format(values)
    }

    /// Format several templates against one shared value bag
    ///
    /// `strategy` pairs a template name with the label its output is stored
    /// under. The first failure aborts the call and no partial map is returned.
    ///
    /// With an explicit `version`, members formatted before the failure stay
    /// switched to that version; only the output is all-or-nothing.
    pub fn combine_templates<I, N, L>(
        &mut self,
        strategy: I,
        version: Option<&str>,
        values: &Values,
    ) -> Result<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = (N, L)>,
        N: AsRef<str>,
        L: AsRef<str>,
    {
        let mut combined = BTreeMap::new();
        for (name, label) in strategy {
            let (name, label) = (name.as_ref(), label.as_ref());
            debug!(%name, %label, "combine_templates: formatting");
            let text = self.format_template(name, version, values)?;
            combined.insert(label.to_string(), text);
        }
        Ok(combined)
    }
}

fn scan(config: &RegistryConfig) -> Result<BTreeMap<String, PromptTemplate>> {
    if !config.root.is_dir() {
        return Err(TemplateError::FileNotFound {
            path: config.root.clone(),
        });
    }

    let mut templates: BTreeMap<String, PromptTemplate> = BTreeMap::new();
    let walker = WalkDir::new(&config.root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !config.matches(entry.path()) {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!(?path, "Skipping template with non UTF-8 name");
            continue;
        };

        let template = PromptTemplate::load(path)?;
        debug!(%name, family = %template.family(), version = %template.version(), "scan: loaded template");

        if let Some(previous) = templates.get(name) {
            let first = previous.path().to_path_buf();
            let second = PathBuf::from(path);
            match config.on_duplicate {
                DuplicatePolicy::Reject => {
                    return Err(TemplateError::DuplicateTemplate {
                        name: name.to_string(),
                        first,
                        second,
                    });
                }
                DuplicatePolicy::Overwrite => {
                    warn!(%name, ?first, ?second, "Duplicate template name, later file wins");
                }
            }
        }
        templates.insert(name.to_string(), template);
    }

    Ok(templates)
}
