pub mod toml_config;

use serde_json::Value;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "form-binder")]
#[command(about = "Bind a flat model to a simulated form and trace the sync events")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "form-binder.toml")]
    pub config: String,

    /// JSON file replacing the [model] section of the config
    #[arg(long)]
    pub model: Option<String>,

    /// Application-side write, NAME=VALUE (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    pub sets: Vec<(String, String)>,

    /// Simulated user edit of the element bound to NAME, NAME=VALUE (repeatable)
    #[arg(long = "edit", value_parser = parse_assignment)]
    pub edits: Vec<(String, String)>,

    /// Print calculated properties as templates instead of resolved text
    #[arg(long)]
    pub raw: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_log: bool,
}

pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

/// Numbers, booleans and `null` keep their JSON type; anything else is text.
pub fn parse_cli_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}
