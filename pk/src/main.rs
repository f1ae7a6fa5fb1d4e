//! promptkit CLI entry point

use std::fs;
use std::path::Path;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::{debug, info};

use promptkit::cli::{Cli, Command, OutputFormat};
use promptkit::config::{Config, RegistryConfig};
use promptkit::{Prompt, TemplateRegistry, Values};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.templates_dir {
        config.templates_dir = dir;
    }
    info!("promptkit using templates from {}", config.templates_dir.display());

    let mut registry = TemplateRegistry::with_config(RegistryConfig::from(&config))
        .context(format!("Failed to load templates from {}", config.templates_dir.display()))?;

    match cli.command {
        Command::List { type_name } => {
            let names = match type_name.as_deref() {
                Some(t) => registry.get_templates_by_type(t),
                None => registry.list_templates(),
            };
            if names.is_empty() {
                println!("No templates found");
            }
            for name in names {
                let template = registry.get(name)?;
                println!(
                    "{} {} {}",
                    name.cyan(),
                    template.family().to_string().dimmed(),
                    template.version().yellow()
                );
            }
        }
        Command::Info { name, version, format } => {
            let info = registry.get_template_info(&name, version.as_deref())?;
            let out = match format {
                OutputFormat::Yaml => serde_yaml::to_string(&info)?,
                OutputFormat::Json => serde_json::to_string_pretty(&info)?,
            };
            println!("{}", out.trim_end());
        }
        Command::Tags { name, version } => {
            for tag in registry.get_template(&name, version.as_deref())?.tags() {
                println!("{}", tag);
            }
        }
        Command::Versions { name } => {
            let versions = registry.versions(&name)?;
            let latest = versions.len().saturating_sub(1);
            for (i, version) in versions.iter().enumerate() {
                if i == latest {
                    println!("{} {}", version.green(), "(latest)".dimmed());
                } else {
                    println!("{}", version);
                }
            }
        }
        Command::Render {
            name,
            version,
            set,
            values,
        } => {
            let values = collect_values(values.as_deref(), set)?;
            let text = registry.format_template(&name, version.as_deref(), &values)?;
            println!("{}", text);
        }
        Command::Combine {
            pick,
            version,
            set,
            values,
        } => {
            let values = collect_values(values.as_deref(), set)?;
            let combined = registry.combine_templates(pick, version.as_deref(), &values)?;
            for (label, text) in combined {
                println!("{} {}", "==>".green(), label.cyan());
                println!("{}", text);
            }
        }
    }

    Ok(())
}

/// Values from an optional YAML file, overridden by `--set` pairs
fn collect_values(file: Option<&Path>, set: Vec<(String, Value)>) -> Result<Values> {
    let mut values = match file {
        Some(path) => load_values(path)?,
        None => Values::new(),
    };
    values.extend(set);
    Ok(values)
}

fn load_values(path: &Path) -> Result<Values> {
    let content = fs::read_to_string(path).context(format!("Failed to read values file {}", path.display()))?;
    let values: Option<Values> = serde_yaml::from_str(&content).context("Failed to parse values file")?;
    values.ok_or_else(|| eyre!("Values file {} is empty", path.display()))
}
