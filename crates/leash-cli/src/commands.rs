// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the leash CLI.
//!
//! These functions do not touch the process's own arguments or streams so
//! they can be tested without spawning the binary.

use anyhow::{Context, Result};
use leash_config::{LeashConfig, validate_config};
use leash_core::{LaunchContext, entry};
use leash_host::LaunchBuilder;
use schemars::schema_for;
use std::path::PathBuf;
use std::process::ExitStatus;

/// File name of the runtime executable looked for next to `leash`.
pub const RUNTIME_BIN: &str = "leash-runtime";

/// Launch settings given on the command line. Unset values fall back to the
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Runtime executable.
    pub interpreter: Option<PathBuf>,
    /// Classpath, replacing the configured one.
    pub classpath: Option<String>,
    /// Elements appended to the classpath.
    pub add_classpath: Vec<String>,
    /// VM arguments appended to the configured ones.
    pub vm_args: Vec<String>,
    /// Start through the auto-exit trampoline.
    pub auto_exit: bool,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Entry point to run.
    pub entry: String,
    /// Arguments for the entry point.
    pub args: Vec<String>,
}

/// The runtime next to the current executable, or plain `leash-runtime` to
/// be found on `PATH`.
pub fn default_interpreter() -> PathBuf {
    let name = format!("{RUNTIME_BIN}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Build the launch configuration for `opts` on top of `config`.
pub fn launch_builder(config: &LeashConfig, opts: &LaunchOptions) -> Result<LaunchBuilder> {
    entry::validate_name(&opts.entry)?;

    let interpreter = opts
        .interpreter
        .clone()
        .or_else(|| config.interpreter.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_interpreter);
    let classpath = opts
        .classpath
        .clone()
        .or_else(|| config.classpath.clone())
        .unwrap_or_default();
    let mut vm_args = config.vm_args.clone();
    vm_args.extend(opts.vm_args.iter().cloned());

    let mut builder = LaunchBuilder::for_name(opts.entry.as_str());
    builder
        .context(&LaunchContext {
            interpreter,
            classpath,
            vm_args,
        })
        .auto_exit(opts.auto_exit || config.auto_exit.unwrap_or(false))
        .args(opts.args.iter().cloned());
    for element in &opts.add_classpath {
        builder.add_classpath(element);
    }
    let cwd = opts
        .cwd
        .clone()
        .or_else(|| config.working_dir.as_ref().map(PathBuf::from));
    if let Some(dir) = cwd {
        builder.current_dir(dir);
    }
    Ok(builder)
}

/// The effective configuration as TOML, followed by warnings as comments.
pub fn config_report(config: &LeashConfig) -> Result<String> {
    let warnings = validate_config(config)?;
    let mut report = toml::to_string_pretty(config).context("serialize config")?;
    for warning in &warnings {
        report.push_str(&format!("# warning: {warning}\n"));
    }
    Ok(report)
}

/// JSON schema of the configuration file.
pub fn schema_json() -> Result<String> {
    let value = serde_json::to_value(schema_for!(LeashConfig))?;
    serde_json::to_string_pretty(&value).context("serialize schema")
}

/// Exit code for `leash` after its child ended with `status`.
///
/// A child killed by a signal maps to `128 + signal`, like a shell.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    signal_exit_code(status)
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> u8 {
    use std::os::unix::process::ExitStatusExt;
    status
        .signal()
        .and_then(|sig| u8::try_from(128 + sig).ok())
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> u8 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use leash_core::AUTO_EXIT_PROGRAM;

    fn opts(entry: &str) -> LaunchOptions {
        LaunchOptions {
            interpreter: Some(PathBuf::from("/opt/rt")),
            entry: entry.into(),
            ..Default::default()
        }
    }

    #[test]
    fn options_override_config() {
        let config = LeashConfig {
            interpreter: Some("/cfg/rt".into()),
            classpath: Some("cfg".into()),
            vm_args: vec!["-Dfrom=config".into()],
            auto_exit: Some(true),
            ..Default::default()
        };
        let mut o = opts("demo.Greeter");
        o.vm_args = vec!["-Dfrom=cli".into()];
        o.args = vec!["Ada".into()];

        let b = launch_builder(&config, &o).unwrap();
        assert_eq!(
            b.command().tokens(),
            [
                "/opt/rt",
                "-cp",
                "cfg",
                "-Dfrom=config",
                "-Dfrom=cli",
                AUTO_EXIT_PROGRAM,
                "demo.Greeter",
                "Ada"
            ]
        );
    }

    #[test]
    fn add_classpath_extends_configured_value() {
        let config = LeashConfig {
            classpath: Some("base".into()),
            working_dir: Some("/srv".into()),
            ..Default::default()
        };
        let mut o = opts("demo.Greeter");
        o.add_classpath = vec!["extra".into()];
        let b = launch_builder(&config, &o).unwrap();
        assert_eq!(
            b.get_classpath(),
            format!("base{}extra", leash_core::PATH_LIST_SEPARATOR)
        );
        assert_eq!(b.get_current_dir(), Some(std::path::Path::new("/srv")));
        assert!(!b.get_auto_exit());
    }

    #[test]
    fn malformed_entry_is_rejected() {
        let err = launch_builder(&LeashConfig::default(), &opts("two words")).unwrap_err();
        assert!(err.to_string().contains("invalid entry point"));
    }

    #[test]
    fn report_includes_warnings() {
        let report = config_report(&LeashConfig::default()).unwrap();
        assert!(report.contains("kill_on_shutdown = true"));
        assert!(report.contains("# warning: missing optional field 'interpreter'"));
    }

    #[test]
    fn report_fails_on_invalid_config() {
        let config = LeashConfig {
            vm_args: vec!["oops".into()],
            ..Default::default()
        };
        assert!(config_report(&config).is_err());
    }

    #[test]
    fn schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(&schema_json().unwrap()).unwrap();
        assert!(schema["properties"]["vm_args"].is_object());
    }

    #[cfg(unix)]
    #[test]
    fn exit_codes_follow_shell_convention() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
