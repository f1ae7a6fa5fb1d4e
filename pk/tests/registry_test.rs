//! Integration tests for promptkit
//!
//! These run against the shipped `templates/` tree and small temporary trees.

use std::fs;
use std::path::{Path, PathBuf};

use promptkit::{
    Family, Prompt, PromptTemplate, TemplateError, TemplateRecord, TemplateRegistry, Values, Variant,
    VariantOverrides,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn values(json: Value) -> Values {
    serde_json::from_value(json).expect("values must be an object")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("has parent")).expect("Failed to create dir");
    fs::write(path, content).expect("Failed to write template");
}

// =============================================================================
// Shipped Templates
// =============================================================================

#[test]
fn test_registry_loads_shipped_templates() {
    let registry = TemplateRegistry::new(templates_dir()).expect("Failed to load registry");
    assert_eq!(
        registry.list_templates(),
        vec![
            "chain_of_thought",
            "expert",
            "few_shot",
            "qa",
            "reviewer",
            "self_consistency",
            "self_critique",
            "summarization",
            "technical",
            "translation",
        ]
    );
    for name in registry.list_templates() {
        let template = registry.get(name).unwrap();
        assert!(!template.version().is_empty(), "{} has no version", name);
        assert!(!template.desc().is_empty(), "{} has no desc", name);
    }
}

#[test]
fn test_every_family_has_a_well_known_template() {
    for family in Family::ALL {
        let template = PromptTemplate::well_known(family, templates_dir())
            .unwrap_or_else(|e| panic!("well-known {} failed: {}", family, e));
        assert_eq!(template.family(), family);
        assert_eq!(template.info().family, family);
    }
}

#[test]
fn test_templates_by_type() {
    let registry = TemplateRegistry::new(templates_dir()).unwrap();
    assert_eq!(registry.get_templates_by_type("RoleBasedPrompt"), vec!["expert", "reviewer"]);
    assert_eq!(
        registry.get_templates_by_type("TaskPrompt"),
        vec!["qa", "summarization", "translation"]
    );
    assert_eq!(registry.get_templates_by_type("ChainOfThoughtPrompt"), vec!["chain_of_thought"]);
    assert!(registry.get_templates_by_type("UnknownPrompt").is_empty());
}

#[test]
fn test_latest_version_is_last_block() {
    let mut registry = TemplateRegistry::new(templates_dir()).unwrap();
    assert_eq!(registry.versions("qa").unwrap(), vec!["1.0.0", "1.1.0"]);

    let qa = registry.get_template("qa", None).unwrap();
    assert_eq!(qa.version(), "1.1.0");
    assert!(qa.body().contains("using only the context"));

    let old = registry.get_template("qa", Some("1.0.0")).unwrap();
    assert!(!old.body().contains("using only the context"));
}

#[test]
fn test_format_role_template() {
    let mut registry = TemplateRegistry::new(templates_dir()).unwrap();
    let out = registry
        .format_template(
            "expert",
            None,
            &values(json!({
                "domain": "technology",
                "expertise": ["programming", "system design"],
                "task_instruction": "Answer the following question",
            })),
        )
        .unwrap();
    assert!(out.contains("technology"));
    assert!(out.contains("programming"));
    assert!(out.contains("system design"));
    assert!(out.contains("Answer the following question"));
}

#[test]
fn test_format_task_templates() {
    let cases = [
        (
            "translation",
            json!({
                "source_content": "Hello World. The quick brown fox jumps over the lazy dog.",
                "target_language": "French",
                "requirements": "Keep the tone informal",
                "domain_knowledge": "Use the Oxford dictionary",
            }),
        ),
        (
            "summarization",
            json!({
                "content": "A story about a king from a faraway land and his ten sons.",
                "requirements": "Summarize the central idea",
                "domain_knowledge": "One Thousand and One Nights",
            }),
        ),
    ];
    let mut registry = TemplateRegistry::new(templates_dir()).unwrap();
    for (name, data) in cases {
        let vals = values(data);
        let out = registry.format_template(name, None, &vals).unwrap();
        for value in vals.values() {
            let text = value.as_str().unwrap();
            assert!(out.contains(text), "{} output misses {:?}", name, text);
        }
    }
}

#[test]
fn test_combine_shipped_templates() {
    let mut registry = TemplateRegistry::new(templates_dir()).unwrap();
    let result = registry
        .combine_templates(
            [("expert", "role_prompt"), ("technical", "domain_prompt")],
            None,
            &values(json!({
                "domain": "technology",
                "expertise": ["programming"],
                "task_instruction": "Build a chat application",
                "role_instruction": "You are a JavaScript expert who writes chat front ends",
                "subdomains": ["software development", "frontend", "full stack"],
            })),
        )
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(result["role_prompt"].contains("technology"));
    assert!(result["domain_prompt"].contains("software development"));
    assert!(result["domain_prompt"].contains("JavaScript expert"));
}

#[test]
fn test_info_records() {
    let mut registry = TemplateRegistry::new(templates_dir()).unwrap();

    let info = serde_json::to_value(registry.get_template_info("few_shot", None).unwrap()).unwrap();
    assert_eq!(info["type"], "FewShotPrompt");
    assert_eq!(info["examples"][1]["output"], "15");
    assert_eq!(info["tags"], json!(["examples_text", "question"]));

    let info = serde_json::to_value(registry.get_template_info("reviewer", None).unwrap()).unwrap();
    assert_eq!(info["type"], "RoleBasedPrompt");
    assert_eq!(info["role"], "code reviewer");
    assert_eq!(info["expertise"], json!(["correctness", "readability", "performance"]));
}

#[test]
fn test_well_known_with_overrides() {
    let template = PromptTemplate::well_known_with(
        Family::Domain,
        templates_dir(),
        VariantOverrides::default().subdomains(["sub one", "sub two"]),
    )
    .unwrap();
    match template.variant() {
        Variant::Domain(fields) => {
            assert_eq!(fields.domain, "technology");
            assert_eq!(fields.subdomains, vec!["sub one", "sub two"]);
        }
        other => panic!("unexpected variant: {:?}", other),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

const ROLE_EXPERT: &str = r#"
version: "1.0.0"
desc: Expert role
type: RoleBasedPrompt
role: expert
expertise: [programming, architecture]
template: "You are a {{role}} skilled in {{expertise}}. {{task_instruction}}"
"#;

const DOMAIN_TECHNICAL: &str = r#"
version: "1.0.0"
desc: Technical domain
type: DomainPrompt
domain: Technology
subdomains: [Backend]
template: "Domain {{domain}}: {{subdomains}}"
"#;

#[test]
fn test_role_tag_is_distinct_from_role_attribute() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "roles/role_expert.yaml", ROLE_EXPERT);
    let template = PromptTemplate::load(temp.path().join("roles/role_expert.yaml")).unwrap();

    let err = template
        .format(&values(json!({
            "task_instruction": "Answer the question",
            "expertise": ["programming", "architecture"],
        })))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Validation { .. }));
    assert_eq!(err.missing_tags(), Some(&["role".to_string()][..]));
}

#[test]
fn test_combine_failure_returns_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "roles/role_expert.yaml", ROLE_EXPERT);
    write(temp.path(), "domains/domain_technical.yaml", DOMAIN_TECHNICAL);
    let mut registry = TemplateRegistry::new(temp.path()).unwrap();

    let result = registry.combine_templates(
        [("role_expert", "expertPrompt"), ("domain_technical", "domainPrompt")],
        None,
        &values(json!({ "domain": "Tech", "subdomains": ["Backend"] })),
    );
    let err = result.unwrap_err();
    assert!(matches!(err, TemplateError::Validation { .. }));
}

#[test]
fn test_unknown_type_anywhere_fails_registry() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "roles/role_expert.yaml", ROLE_EXPERT);
    write(temp.path(), "nested/deeper/odd.yml", "version: '1'\ntype: MysteryPrompt\ntemplate: '?'\n");
    let err = TemplateRegistry::new(temp.path()).unwrap_err();
    assert!(matches!(err, TemplateError::UnknownType { ref type_name, .. } if type_name == "MysteryPrompt"));
}

#[test]
fn test_record_round_trip_through_json() {
    let original = PromptTemplate::load_version(templates_dir().join("tasks/qa.yaml"), "1.0.0").unwrap();
    let json = serde_json::to_string(&original.info()).unwrap();
    let record: TemplateRecord = serde_json::from_str(&json).unwrap();
    let rebuilt = PromptTemplate::from_record(&record).unwrap();

    assert_eq!(rebuilt.version(), "1.0.0");
    assert_eq!(rebuilt.desc(), original.desc());
    assert_eq!(rebuilt.family(), Family::Task);
    let vals = values(json!({ "context": "Ownership moves values.", "question": "What moves?" }));
    assert_eq!(rebuilt.render(&vals).unwrap(), original.render(&vals).unwrap());
}
