//! CLI argument parsing for promptkit

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// promptkit - versioned prompt templates
#[derive(Parser, Debug)]
#[command(name = "pk")]
#[command(author, version, about = "Versioned prompt templates", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Templates directory (overrides config)
    #[arg(short = 'd', long = "templates-dir", global = true)]
    pub templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List template names
    List {
        /// Only templates of this type (e.g. RoleBasedPrompt)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,
    },

    /// Show a template's info record
    Info {
        /// Template name
        #[arg(required = true)]
        name: String,

        /// Template version (default: latest)
        #[arg(short = 'v', long = "template-version")]
        version: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Show the placeholders a template needs
    Tags {
        /// Template name
        #[arg(required = true)]
        name: String,

        /// Template version (default: latest)
        #[arg(short = 'v', long = "template-version")]
        version: Option<String>,
    },

    /// List a template's versions in file order
    Versions {
        /// Template name
        #[arg(required = true)]
        name: String,
    },

    /// Render one template
    Render {
        /// Template name
        #[arg(required = true)]
        name: String,

        /// Template version (default: latest)
        #[arg(short = 'v', long = "template-version")]
        version: Option<String>,

        /// Value as key=value; `[a, b]` values become lists
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        set: Vec<(String, Value)>,

        /// YAML file with a mapping of values
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// Render several templates against the same values
    Combine {
        /// Template and output label as name=label
        #[arg(short = 'p', long = "pick", required = true, value_parser = parse_pick)]
        pick: Vec<(String, String)>,

        /// Template version (default: latest)
        #[arg(short = 'v', long = "template-version")]
        version: Option<String>,

        /// Value as key=value; `[a, b]` values become lists
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        set: Vec<(String, Value)>,

        /// YAML file with a mapping of values
        #[arg(long)]
        values: Option<PathBuf>,
    },
}

/// Output format for info records
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: yaml or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse `key=value`; values written as YAML flow collections become lists or maps
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got: {}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Missing key in: {}", s));
    }
    Ok((key.to_string(), parse_value(raw)))
}

fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_yaml::from_str::<Value>(raw) {
            Ok(value) => return value,
            Err(e) => debug!(%raw, %e, "parse_value: not a flow collection, keeping string"),
        }
    }
    Value::String(raw.to_string())
}

/// Parse `name=label`
pub fn parse_pick(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, label)) if !name.trim().is_empty() && !label.trim().is_empty() => {
            Ok((name.trim().to_string(), label.trim().to_string()))
        }
        _ => Err(format!("Expected name=label, got: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from(["pk", "list"]);
        assert!(matches!(cli.command, Command::List { type_name: None }));

        let cli = Cli::parse_from(["pk", "list", "--type", "RoleBasedPrompt"]);
        if let Command::List { type_name } = cli.command {
            assert_eq!(type_name.as_deref(), Some("RoleBasedPrompt"));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_cli_parse_render() {
        let cli = Cli::parse_from([
            "pk",
            "render",
            "expert",
            "-v",
            "1.0.0",
            "-s",
            "role=architect",
            "-s",
            "expertise=[Rust, Go]",
        ]);
        if let Command::Render {
            name,
            version,
            set,
            values,
        } = cli.command
        {
            assert_eq!(name, "expert");
            assert_eq!(version.as_deref(), Some("1.0.0"));
            assert_eq!(
                set,
                vec![
                    ("role".to_string(), json!("architect")),
                    ("expertise".to_string(), json!(["Rust", "Go"])),
                ]
            );
            assert!(values.is_none());
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_cli_parse_combine() {
        let cli = Cli::parse_from(["pk", "combine", "-p", "expert=expertPrompt", "-p", "technical=domainPrompt"]);
        if let Command::Combine { pick, .. } = cli.command {
            assert_eq!(
                pick,
                vec![
                    ("expert".to_string(), "expertPrompt".to_string()),
                    ("technical".to_string(), "domainPrompt".to_string()),
                ]
            );
        } else {
            panic!("Expected Combine command");
        }
    }

    #[test]
    fn test_cli_combine_requires_pick() {
        assert!(Cli::try_parse_from(["pk", "combine"]).is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["pk", "tags", "qa", "-c", "/etc/pk.yml", "-d", "prompts", "-l", "debug"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pk.yml")));
        assert_eq!(cli.templates_dir, Some(PathBuf::from("prompts")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("yaml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("a=b").unwrap(), ("a".to_string(), json!("b")));
        assert_eq!(
            parse_assignment("q=Answer: briefly").unwrap(),
            ("q".to_string(), json!("Answer: briefly"))
        );
        assert_eq!(parse_assignment("n=42").unwrap(), ("n".to_string(), json!("42")));
        assert_eq!(parse_assignment("e=").unwrap(), ("e".to_string(), json!("")));
        assert_eq!(parse_assignment("l=[x, y]").unwrap(), ("l".to_string(), json!(["x", "y"])));
        assert_eq!(parse_assignment("l=[unclosed").unwrap(), ("l".to_string(), json!("[unclosed")));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick("qa=answer").unwrap(), ("qa".to_string(), "answer".to_string()));
        assert!(parse_pick("qa").is_err());
        assert!(parse_pick("qa=").is_err());
    }
}
