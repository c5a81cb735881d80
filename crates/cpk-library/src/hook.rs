//! Typed hook records: lifecycle trigger, behavior type, and the optional
//! context/script blocks.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cpk_core::ConfigDocument;

/// Named automation unit triggered at a lifecycle point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub hook_type: HookType,
    pub trigger: HookTrigger,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Context-injection payload; required for `context`/`hybrid` hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<HookContextBlock>,
    /// Script payload; required for `script`/`hybrid` hooks. Execution is
    /// a collaborator concern; this core only validates the shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<HookScriptBlock>,
    /// Condition predicates evaluated by the hook runner.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl HookConfig {
    /// Construct from a schema-validated document.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(doc.mapping.clone()))
            .with_context(|| format!("Failed to construct hook from {}", doc.path.display()))
    }
}

/// What the hook does when it fires.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    #[default]
    Context,
    Script,
    Hybrid,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Script => "script",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Lifecycle point the hook binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookTrigger {
    OnSessionStart,
    PerUserMessage,
    OnFileChange,
}

impl HookTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSessionStart => "on_session_start",
            Self::PerUserMessage => "per_user_message",
            Self::OnFileChange => "on_file_change",
        }
    }
}

/// Ordered context sources injected when the hook fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookContextBlock {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: i64,
}

/// External command launched when the hook fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookScriptBlock {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpk_core::{ConfigKind, SourceFingerprint};
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn doc_from(yaml: &str) -> ConfigDocument {
        ConfigDocument {
            path: PathBuf::from("/lib/hooks/h.yaml"),
            kind: ConfigKind::Hook,
            raw: yaml.to_string(),
            mapping: serde_yaml::from_str(yaml).unwrap(),
            fingerprint: SourceFingerprint {
                mtime: SystemTime::UNIX_EPOCH,
                size: yaml.len() as u64,
            },
        }
    }

    #[test]
    fn test_minimal_hook_defaults() {
        let hook =
            HookConfig::from_document(&doc_from("name: lint\ntrigger: on_file_change\n")).unwrap();
        assert_eq!(hook.hook_type, HookType::Context);
        assert_eq!(hook.timeout_secs, 30, "Default timeout should be 30");
        assert!(hook.enabled);
        assert!(hook.context.is_none());
        assert!(hook.conditions.is_empty());
    }

    #[test]
    fn test_full_hook() {
        let yaml = r#"
name: style-guard
type: hybrid
trigger: per_user_message
timeout_secs: 10
enabled: false
context:
  sources:
    - contexts/style.md
  tags: [style]
  priority: 5
script:
  command: ./check.sh
  args: ["--fast"]
  env:
    STRICT: "1"
conditions:
  - file_changed
"#;
        let hook = HookConfig::from_document(&doc_from(yaml)).unwrap();
        assert_eq!(hook.hook_type, HookType::Hybrid);
        assert_eq!(hook.trigger, HookTrigger::PerUserMessage);
        assert_eq!(hook.timeout_secs, 10);
        assert!(!hook.enabled);
        assert_eq!(hook.context.as_ref().unwrap().priority, 5);
        assert_eq!(hook.script.as_ref().unwrap().command, "./check.sh");
        assert_eq!(hook.conditions, vec!["file_changed"]);
    }

    #[test]
    fn test_unknown_trigger_fails_construction() {
        let result = HookConfig::from_document(&doc_from("name: h\ntrigger: bogus_trigger\n"));
        assert!(result.is_err());
    }

    #[test]
    fn test_trigger_round_trip_names() {
        for trigger in [
            HookTrigger::OnSessionStart,
            HookTrigger::PerUserMessage,
            HookTrigger::OnFileChange,
        ] {
            let yaml = serde_yaml::to_string(&trigger).unwrap();
            assert_eq!(yaml.trim(), trigger.as_str());
        }
    }
}
