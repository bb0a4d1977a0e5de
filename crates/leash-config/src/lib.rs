// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for leash.
//!
//! [`LeashConfig`] holds the launch defaults the `leash` command line falls
//! back to: interpreter, classpath, VM arguments, auto-exit and whether
//! started children are killed on shutdown.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// The same VM argument appears more than once.
    DuplicateVmArg {
        /// The repeated argument.
        arg: String,
    },
    /// Children will outlive the parent if it is killed.
    UnsupervisedChildren,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::DuplicateVmArg { arg } => {
                write!(f, "vm argument '{arg}' is given more than once")
            }
            ConfigWarning::UnsupervisedChildren => write!(
                f,
                "kill_on_shutdown and auto_exit are both off; children may outlive leash"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Launch defaults for leash.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct LeashConfig {
    /// Runtime executable used to start children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,

    /// Classpath handed to children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classpath: Option<String>,

    /// VM arguments placed before the entry point.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vm_args: Vec<String>,

    /// Start children through the auto-exit trampoline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_exit: Option<bool>,

    /// Kill started children when leash shuts down.
    #[serde(default = "default_kill_on_shutdown")]
    pub kill_on_shutdown: bool,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Working directory for started children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

fn default_kill_on_shutdown() -> bool {
    true
}

impl Default for LeashConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            classpath: None,
            vm_args: Vec::new(),
            auto_exit: None,
            kill_on_shutdown: true,
            log_level: Some("info".into()),
            working_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Environment variable overriding [`LeashConfig::interpreter`].
pub const ENV_INTERPRETER: &str = "LEASH_INTERPRETER";
/// Environment variable overriding [`LeashConfig::classpath`].
pub const ENV_CLASSPATH: &str = "LEASH_CLASSPATH";
/// Environment variable overriding [`LeashConfig::auto_exit`].
pub const ENV_AUTO_EXIT: &str = "LEASH_AUTO_EXIT";
/// Environment variable overriding [`LeashConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "LEASH_LOG_LEVEL";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`LeashConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`LeashConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<LeashConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => LeashConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML string into a [`LeashConfig`].
pub fn parse_toml(content: &str) -> Result<LeashConfig, ConfigError> {
    toml::from_str::<LeashConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply overrides from the process environment.
///
/// Recognised variables:
/// - `LEASH_INTERPRETER`
/// - `LEASH_CLASSPATH`
/// - `LEASH_AUTO_EXIT` (`true`/`false`, `1`/`0`, `yes`/`no`)
/// - `LEASH_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut LeashConfig) -> Result<(), ConfigError> {
    apply_env_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides using `lookup` in place of the process environment.
pub fn apply_env_overrides_from<F>(config: &mut LeashConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_INTERPRETER) {
        config.interpreter = Some(val);
    }
    if let Some(val) = lookup(ENV_CLASSPATH) {
        config.classpath = Some(val);
    }
    if let Some(val) = lookup(ENV_AUTO_EXIT) {
        config.auto_exit = Some(parse_bool(ENV_AUTO_EXIT, &val)?);
    }
    if let Some(val) = lookup(ENV_LOG_LEVEL) {
        config.log_level = Some(val);
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseError {
            reason: format!("{key}: expected a boolean, got '{value}'"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unknown log level, blank interpreter, VM arguments that
/// would be read as the entry point) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &LeashConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(level) = &config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    if let Some(interpreter) = &config.interpreter {
        if interpreter.trim().is_empty() {
            errors.push("interpreter must not be empty".into());
        }
    }

    if let Some(dir) = &config.working_dir {
        if dir.trim().is_empty() {
            errors.push("working_dir must not be empty".into());
        }
    }

    for (i, arg) in config.vm_args.iter().enumerate() {
        if !arg.starts_with('-') {
            errors.push(format!(
                "vm_args[{i}] '{arg}' must start with '-', or it is taken as the entry point"
            ));
        } else if config.vm_args[..i].contains(arg) {
            let warning = ConfigWarning::DuplicateVmArg { arg: arg.clone() };
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    }

    if config.interpreter.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "interpreter".into(),
            hint: "the leash-runtime next to the leash executable is used".into(),
        });
    }
    if !config.kill_on_shutdown && config.auto_exit != Some(true) {
        warnings.push(ConfigWarning::UnsupervisedChildren);
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// VM arguments are replaced, not combined, when the overlay has any.
/// `kill_on_shutdown` is taken from the overlay.
pub fn merge_configs(base: LeashConfig, overlay: LeashConfig) -> LeashConfig {
    LeashConfig {
        interpreter: overlay.interpreter.or(base.interpreter),
        classpath: overlay.classpath.or(base.classpath),
        vm_args: if overlay.vm_args.is_empty() {
            base.vm_args
        } else {
            overlay.vm_args
        },
        auto_exit: overlay.auto_exit.or(base.auto_exit),
        kill_on_shutdown: overlay.kill_on_shutdown,
        log_level: overlay.log_level.or(base.log_level),
        working_dir: overlay.working_dir.or(base.working_dir),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
