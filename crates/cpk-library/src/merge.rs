//! Legacy JSON → canonical YAML merging and one-way migration.
//!
//! Precedence is fixed: YAML always wins when both sources define a
//! field; a JSON value survives only when the field is entirely absent
//! from YAML. Nested mappings merge key-by-key so a YAML override of one
//! settings key preserves sibling JSON-only keys. Every overlapping field
//! with differing values is recorded as a conflict on the merger
//! instance.

use anyhow::{Result, bail};
use serde_yaml::{Mapping, Value};

use crate::profile::ProfileConfig;

/// One field defined by both sources with differing values. Informational
/// only; never affects validity.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictReport {
    /// Dotted field path, e.g. `settings.validation_level`.
    pub field: String,
    pub yaml_value: Value,
    pub json_value: Value,
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "field '{}': YAML value {:?} overrides JSON value {:?}",
            self.field, self.yaml_value, self.json_value
        )
    }
}

/// Merges legacy JSON profile data into the canonical YAML shape.
/// Conflict state is per-instance, not global.
#[derive(Debug, Default)]
pub struct ProfileMerger {
    conflicts: Vec<ConflictReport>,
}

impl ProfileMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge optional YAML and legacy JSON sources into one profile.
    /// `name` is used when neither source names the profile.
    pub fn merge_profile_configs(
        &mut self,
        yaml: Option<&Mapping>,
        json: Option<&serde_json::Value>,
        name: &str,
    ) -> Result<ProfileConfig> {
        let json_mapping = json.map(normalize_json_profile).transpose()?;

        let mut merged = match (yaml, json_mapping) {
            (None, None) => bail!("No configuration sources provided for profile '{name}'"),
            (Some(yaml), None) => yaml.clone(),
            (None, Some(json)) => json,
            (Some(yaml), Some(json)) => self.merge_mappings(yaml.clone(), json, ""),
        };

        let name_key = Value::from("name");
        if !matches!(merged.get(&name_key), Some(Value::String(_))) {
            merged.insert(name_key, Value::from(name));
        }

        let profile: ProfileConfig = serde_yaml::from_value(Value::Mapping(merged))?;
        Ok(profile)
    }

    /// Conflicts accumulated across all merges on this instance.
    pub fn conflicts(&self) -> &[ConflictReport] {
        &self.conflicts
    }

    pub fn clear_conflicts(&mut self) {
        self.conflicts.clear();
    }

    /// Key-by-key merge with YAML precedence; JSON-only keys survive.
    fn merge_mappings(&mut self, yaml: Mapping, json: Mapping, prefix: &str) -> Mapping {
        let mut merged = yaml;
        for (key, json_value) in json {
            let field = dotted(prefix, &key);
            match merged.get_mut(&key) {
                None => {
                    merged.insert(key, json_value);
                }
                Some(yaml_value) => match (yaml_value, json_value) {
                    (Value::Mapping(yaml_inner), Value::Mapping(json_inner)) => {
                        let inner =
                            self.merge_mappings(std::mem::take(yaml_inner), json_inner, &field);
                        *yaml_inner = inner;
                    }
                    (yaml_value, json_value) => {
                        if *yaml_value != json_value {
                            self.conflicts.push(ConflictReport {
                                field,
                                yaml_value: yaml_value.clone(),
                                json_value,
                            });
                        }
                    }
                },
            }
        }
        merged
    }
}

fn dotted(prefix: &str, key: &Value) -> String {
    let key = key.as_str().unwrap_or("?");
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// One-way migration of a legacy JSON profile into the canonical YAML
/// shape. The output is tagged so downstream validation can relax
/// version-field strictness for migrated data.
pub fn convert_json_to_yaml_config(json: &serde_json::Value, name: &str) -> Result<Mapping> {
    let mut mapping = normalize_json_profile(json)?;

    let name_key = Value::from("name");
    if !matches!(mapping.get(&name_key), Some(Value::String(_))) {
        mapping.insert(name_key, Value::from(name));
    }

    let metadata = mapping
        .entry(Value::from("metadata"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if let Value::Mapping(metadata) = metadata {
        metadata.insert(Value::from("migrated_from_json"), Value::from(true));
        metadata.insert(
            Value::from("migrated_at"),
            Value::from(chrono::Utc::now().to_rfc3339()),
        );
    }

    Ok(mapping)
}

/// Rewrite legacy JSON field names into the canonical shape:
/// `paths` → `contexts`, hook entries → uniform `{ name, config }`.
fn normalize_json_profile(json: &serde_json::Value) -> Result<Mapping> {
    let Some(object) = json.as_object() else {
        bail!("Legacy JSON profile must be an object");
    };

    let mut mapping = Mapping::new();
    for (key, value) in object {
        match key.as_str() {
            "paths" => {
                mapping.insert(Value::from("contexts"), to_yaml(value)?);
            }
            "hooks" => {
                mapping.insert(Value::from("hooks"), normalize_json_hooks(value)?);
            }
            _ => {
                mapping.insert(Value::from(key.as_str()), to_yaml(value)?);
            }
        }
    }
    Ok(mapping)
}

/// Legacy hook entries are either a bare command string or an object.
/// Both normalize to `{ name, config }`; unrecognized object keys are
/// preserved under `config` rather than discarded.
fn normalize_json_hooks(hooks: &serde_json::Value) -> Result<Value> {
    let Some(by_trigger) = hooks.as_object() else {
        // Leave malformed shapes for the schema validator to report.
        return to_yaml(hooks);
    };

    let mut normalized = Mapping::new();
    for (trigger, entries) in by_trigger {
        let Some(entries) = entries.as_array() else {
            normalized.insert(Value::from(trigger.as_str()), to_yaml(entries)?);
            continue;
        };

        let mut references = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            references.push(normalize_hook_entry(entry, index)?);
        }
        normalized.insert(Value::from(trigger.as_str()), Value::Sequence(references));
    }
    Ok(Value::Mapping(normalized))
}

fn normalize_hook_entry(entry: &serde_json::Value, index: usize) -> Result<Value> {
    match entry {
        serde_json::Value::String(command) => {
            let mut reference = Mapping::new();
            reference.insert(Value::from("name"), Value::from(command.as_str()));
            Ok(Value::Mapping(reference))
        }
        serde_json::Value::Object(fields) => {
            let name = fields
                .get("name")
                .or_else(|| fields.get("command"))
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("hook-{index}"));

            let mut config = Mapping::new();
            for (key, value) in fields {
                if key != "name" {
                    config.insert(Value::from(key.as_str()), to_yaml(value)?);
                }
            }

            let mut reference = Mapping::new();
            reference.insert(Value::from("name"), Value::from(name));
            if !config.is_empty() {
                reference.insert(Value::from("config"), Value::Mapping(config));
            }
            Ok(Value::Mapping(reference))
        }
        other => to_yaml(other),
    }
}

fn to_yaml(json: &serde_json::Value) -> Result<Value> {
    Ok(serde_yaml::to_value(json)?)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
