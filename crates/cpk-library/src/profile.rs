//! Typed profile records.
//!
//! Constructed only through the parse → validate → construct path so a
//! partially-valid profile never circulates.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cpk_core::ConfigDocument;

/// Named bundle of context references, hook bindings, server names, and
/// settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Ordered context document references, relative to the library root.
    /// Entries containing `*` are glob patterns and are not resolved here.
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Trigger name → ordered hook references.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hooks: BTreeMap<String, Vec<HookReference>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<String>,
    #[serde(default)]
    pub settings: ProfileSettings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl ProfileConfig {
    /// Construct from a schema-validated document.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(doc.mapping.clone()))
            .with_context(|| format!("Failed to construct profile from {}", doc.path.display()))
    }

    /// All hook names referenced by this profile, in trigger order.
    pub fn referenced_hooks(&self) -> impl Iterator<Item = &str> {
        self.hooks
            .values()
            .flatten()
            .map(|reference| reference.name.as_str())
    }

    /// Whether this profile was produced by the one-way JSON migration.
    pub fn migrated_from_json(&self) -> bool {
        self.metadata
            .get("migrated_from_json")
            .and_then(serde_yaml::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Uniform hook-reference shape: `{ name, config }`.
///
/// Deserializes from either a bare string (`- lint`) or a mapping
/// (`- { name: lint, priority: 3 }`); keys other than `name` are kept in
/// `config` rather than discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHookReference")]
pub struct HookReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_yaml::Value>,
}

impl HookReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHookReference {
    Name(String),
    Detailed {
        name: String,
        /// Canonical sub-map, as produced by the legacy JSON normalizer.
        #[serde(default)]
        config: BTreeMap<String, serde_yaml::Value>,
        /// Inline keys written directly next to `name` in YAML.
        #[serde(flatten)]
        extra: BTreeMap<String, serde_yaml::Value>,
    },
}

impl From<RawHookReference> for HookReference {
    fn from(raw: RawHookReference) -> Self {
        match raw {
            RawHookReference::Name(name) => Self {
                name,
                config: BTreeMap::new(),
            },
            RawHookReference::Detailed {
                name,
                mut config,
                extra,
            } => {
                config.extend(extra);
                Self { name, config }
            }
        }
    }
}

/// Per-profile validation and loading switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default)]
    pub validation_level: ValidationLevel,
    /// Treat unresolved hook/server references as errors instead of
    /// warnings. Off by default to match load-order-tolerant validation.
    #[serde(default)]
    pub strict_references: bool,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            validation_level: ValidationLevel::default(),
            strict_references: false,
            cache_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Strict,
    #[default]
    Standard,
    Relaxed,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Standard => "standard",
            Self::Relaxed => "relaxed",
        }
    }
}
