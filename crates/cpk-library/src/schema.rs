//! Static schema registry: required/optional fields, deprecated keys, and
//! enum value tables per config kind.

use cpk_core::ConfigKind;

/// Field-level schema for one config kind.
#[derive(Debug, Clone, Copy)]
pub struct SchemaSpec {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Accepted but warned about; never affects validity.
    pub deprecated: &'static [&'static str],
}

impl SchemaSpec {
    pub fn is_known(&self, field: &str) -> bool {
        self.required.contains(&field)
            || self.optional.contains(&field)
            || self.deprecated.contains(&field)
    }
}

pub const PROFILE_SCHEMA: SchemaSpec = SchemaSpec {
    required: &["name"],
    optional: &[
        "description",
        "version",
        "contexts",
        "hooks",
        "mcp_servers",
        "settings",
        "metadata",
    ],
    deprecated: &["legacy_hooks", "old_context_format", "json_config"],
};

pub const HOOK_SCHEMA: SchemaSpec = SchemaSpec {
    required: &["name", "trigger"],
    optional: &[
        "description",
        "type",
        "timeout_secs",
        "enabled",
        "context",
        "script",
        "conditions",
    ],
    deprecated: &["legacy_hooks", "old_context_format", "json_config"],
};

/// Markdown context front-matter: everything is optional.
pub const CONTEXT_SCHEMA: SchemaSpec = SchemaSpec {
    required: &[],
    optional: &["title", "description", "tags", "priority"],
    deprecated: &["old_context_format"],
};

/// Lifecycle points a hook may bind to.
pub const HOOK_TRIGGERS: &[&str] = &["on_session_start", "per_user_message", "on_file_change"];

/// What a hook does when triggered.
pub const HOOK_TYPES: &[&str] = &["context", "script", "hybrid"];

/// Profile `settings.validation_level` values.
pub const VALIDATION_LEVELS: &[&str] = &["strict", "standard", "relaxed"];

pub fn schema_for(kind: ConfigKind) -> &'static SchemaSpec {
    match kind {
        ConfigKind::Profile => &PROFILE_SCHEMA,
        ConfigKind::Hook => &HOOK_SCHEMA,
        ConfigKind::Context => &CONTEXT_SCHEMA,
    }
}
