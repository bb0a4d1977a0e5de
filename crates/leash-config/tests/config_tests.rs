// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tests for loading leash configuration files.

use leash_config::{ConfigError, LeashConfig, load_config, merge_configs, parse_toml, validate_config};
use std::io::Write;

// ── load_config ─────────────────────────────────────────────────────

#[test]
fn load_without_path_gives_defaults_plus_env() {
    let cfg = load_config(None).unwrap();
    assert!(cfg.kill_on_shutdown);
}

#[test]
fn load_reads_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "interpreter = \"/opt/rt\"").unwrap();
    writeln!(f, "vm_args = [\"-Dk=v\"]").unwrap();
    writeln!(f, "kill_on_shutdown = false").unwrap();

    let cfg = load_config(Some(f.path())).unwrap();
    assert_eq!(cfg.vm_args, ["-Dk=v"]);
    assert!(!cfg.kill_on_shutdown);
}

#[test]
fn load_reports_parse_errors() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "interpreter = [").unwrap();
    let err = load_config(Some(f.path())).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().starts_with("failed to parse config"));
}

#[test]
fn unknown_keys_are_ignored() {
    let cfg = parse_toml("future_option = 1\nclasspath = \"x\"").unwrap();
    assert_eq!(cfg.classpath.as_deref(), Some("x"));
}

// ── serde / schema ──────────────────────────────────────────────────

#[test]
fn serialization_skips_unset_fields() {
    let json = serde_json::to_value(LeashConfig::default()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "kill_on_shutdown": true, "log_level": "info" })
    );
}

#[test]
fn toml_roundtrip_of_merged_config() {
    let base = parse_toml("classpath = \"a\"\nvm_args = [\"-Da\"]").unwrap();
    let overlay = parse_toml("auto_exit = true").unwrap();
    let merged = merge_configs(base, overlay);
    validate_config(&merged).unwrap();

    let text = toml::to_string(&merged).unwrap();
    assert_eq!(parse_toml(&text).unwrap(), merged);
}

#[test]
fn schema_lists_fields() {
    let schema = schemars::schema_for!(LeashConfig);
    let json = serde_json::to_value(&schema).unwrap();
    let props = json["properties"].as_object().expect("object schema");
    for field in ["interpreter", "classpath", "vm_args", "auto_exit", "kill_on_shutdown"] {
        assert!(props.contains_key(field), "missing {field}");
    }
}
