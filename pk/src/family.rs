//! Template families
//!
//! Every template belongs to one of seven closed families. All families share
//! the same load/validate/render machinery; they differ only in the set of
//! contextual variant fields a definition must carry and in the well-known
//! definition file used when a template is referenced by family alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_yaml::Mapping;
use tracing::debug;

/// The seven recognized template families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    #[serde(rename = "TaskPrompt")]
    Task,
    #[serde(rename = "DomainPrompt")]
    Domain,
    #[serde(rename = "RoleBasedPrompt")]
    Role,
    #[serde(rename = "ChainOfThoughtPrompt")]
    ChainOfThought,
    #[serde(rename = "FewShotPrompt")]
    FewShot,
    #[serde(rename = "SelfConsistencyPrompt")]
    SelfConsistency,
    #[serde(rename = "SelfCritiquePrompt")]
    SelfCritique,
}

impl Family {
    /// All families, in declaration order
    pub const ALL: [Family; 7] = [
        Family::Task,
        Family::Domain,
        Family::Role,
        Family::ChainOfThought,
        Family::FewShot,
        Family::SelfConsistency,
        Family::SelfCritique,
    ];

    /// The type tag used in definition files and template info records
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Task => "TaskPrompt",
            Self::Domain => "DomainPrompt",
            Self::Role => "RoleBasedPrompt",
            Self::ChainOfThought => "ChainOfThoughtPrompt",
            Self::FewShot => "FewShotPrompt",
            Self::SelfConsistency => "SelfConsistencyPrompt",
            Self::SelfCritique => "SelfCritiquePrompt",
        }
    }

    /// Variant fields every version block of this family must supply
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Task => &["task_type", "steps"],
            Self::Domain => &["domain", "subdomains"],
            Self::Role => &["role", "expertise"],
            Self::ChainOfThought => &["steps"],
            Self::FewShot => &["examples"],
            Self::SelfConsistency => &["perspectives"],
            Self::SelfCritique => &[],
        }
    }

    /// Well-known definition file, relative to a templates root
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Task => "tasks/qa.yaml",
            Self::Domain => "domains/technical.yaml",
            Self::Role => "roles/expert.yaml",
            Self::ChainOfThought => "base/chain_of_thought.yaml",
            Self::FewShot => "base/few_shot.yaml",
            Self::SelfConsistency => "base/self_consistency.yaml",
            Self::SelfCritique => "base/self_critique.yaml",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.type_name() == s)
            .ok_or_else(|| format!("Unknown template type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub task_type: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFields {
    pub domain: String,
    pub subdomains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleFields {
    pub role: String,
    pub expertise: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainOfThoughtFields {
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotFields {
    pub examples: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfConsistencyFields {
    pub perspectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfCritiqueFields {
    #[serde(default)]
    pub initial_answer: Option<String>,
}

/// Family-specific variant fields of one resolved version
///
/// Serializes without a tag so the fields flatten into template info records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Variant {
    Task(TaskFields),
    Domain(DomainFields),
    Role(RoleFields),
    ChainOfThought(ChainOfThoughtFields),
    FewShot(FewShotFields),
    SelfConsistency(SelfConsistencyFields),
    SelfCritique(SelfCritiqueFields),
}

impl Variant {
    /// The family this payload belongs to
    pub fn family(&self) -> Family {
        match self {
            Self::Task(_) => Family::Task,
            Self::Domain(_) => Family::Domain,
            Self::Role(_) => Family::Role,
            Self::ChainOfThought(_) => Family::ChainOfThought,
            Self::FewShot(_) => Family::FewShot,
            Self::SelfConsistency(_) => Family::SelfConsistency,
            Self::SelfCritique(_) => Family::SelfCritique,
        }
    }

    /// Build the payload for `family` from the remaining keys of a version block
    ///
    /// Presence of required fields is checked by the caller; this only reports
    /// shape errors such as a scalar where a list is expected.
    pub fn from_fields(family: Family, fields: &Mapping) -> Result<Self, String> {
        let value = serde_yaml::Value::Mapping(fields.clone());
        let variant = match family {
            Family::Task => Self::Task(decode(value)?),
            Family::Domain => Self::Domain(decode(value)?),
            Family::Role => Self::Role(decode(value)?),
            Family::ChainOfThought => Self::ChainOfThought(decode(value)?),
            Family::FewShot => Self::FewShot(decode(value)?),
            Family::SelfConsistency => Self::SelfConsistency(decode(value)?),
            Family::SelfCritique => Self::SelfCritique(decode(value)?),
        };
        Ok(variant)
    }

    /// Apply constructor overrides: non-empty values win, empty ones keep the file value
    pub fn apply_overrides(&mut self, overrides: &VariantOverrides) {
        debug!(family = %self.family(), "Variant::apply_overrides: called");
        match self {
            Self::Task(f) => {
                take_string(&mut f.task_type, &overrides.task_type);
                take_list(&mut f.steps, &overrides.steps);
            }
            Self::Domain(f) => {
                take_string(&mut f.domain, &overrides.domain);
                take_list(&mut f.subdomains, &overrides.subdomains);
            }
            Self::Role(f) => {
                take_string(&mut f.role, &overrides.role);
                take_list(&mut f.expertise, &overrides.expertise);
            }
            Self::ChainOfThought(f) => take_list(&mut f.steps, &overrides.steps),
            Self::FewShot(f) => take_list(&mut f.examples, &overrides.examples),
            Self::SelfConsistency(f) => take_list(&mut f.perspectives, &overrides.perspectives),
            Self::SelfCritique(f) => {
                if let Some(answer) = overrides.initial_answer.as_ref().filter(|a| !a.is_empty()) {
                    f.initial_answer = Some(answer.clone());
                }
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_yaml::Value) -> Result<T, String> {
    serde_yaml::from_value(value).map_err(|e| e.to_string())
}

fn take_string(target: &mut String, value: &Option<String>) {
    if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
        *target = v.clone();
    }
}

fn take_list<T: Clone>(target: &mut Vec<T>, value: &Option<Vec<T>>) {
    if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
        *target = v.clone();
    }
}

/// Explicit variant values supplied when constructing a template
///
/// Fields that do not belong to the template's family are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantOverrides {
    pub task_type: Option<String>,
    pub steps: Option<Vec<String>>,
    pub domain: Option<String>,
    pub subdomains: Option<Vec<String>>,
    pub role: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub examples: Option<Vec<Value>>,
    pub perspectives: Option<Vec<String>>,
    pub initial_answer: Option<String>,
}

impl VariantOverrides {
    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = Some(steps.into_iter().map(Into::into).collect());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = Some(subdomains.into_iter().map(Into::into).collect());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn expertise<I, S>(mut self, expertise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise = Some(expertise.into_iter().map(Into::into).collect());
        self
    }

    pub fn examples(mut self, examples: Vec<Value>) -> Self {
        self.examples = Some(examples);
        self
    }

    pub fn perspectives<I, S>(mut self, perspectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.perspectives = Some(perspectives.into_iter().map(Into::into).collect());
        self
    }

    pub fn initial_answer(mut self, answer: impl Into<String>) -> Self {
        self.initial_answer = Some(answer.into());
        self
    }
}
