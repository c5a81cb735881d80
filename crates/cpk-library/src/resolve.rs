//! Cross-reference resolution: context paths, hook names, server names.
//!
//! Asymmetry preserved from observed behavior: missing context files are
//! errors (one per path, never consolidated); missing hooks and unknown
//! servers are warnings, since load order or a sibling library may
//! resolve them later.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use cpk_core::{Diagnostic, DiagnosticKind};

use crate::library::FileIndex;
use crate::profile::ProfileConfig;

/// Validate every reference a profile makes against the discovered index.
pub fn resolve_references(
    profile: &ProfileConfig,
    source: &Path,
    index: &FileIndex,
) -> Vec<Diagnostic> {
    let targets = ReferenceTargets {
        contexts: profile.contexts.clone(),
        hooks: profile.referenced_hooks().map(str::to_string).collect(),
        servers: profile.mcp_servers.clone(),
    };
    targets.resolve(source, index)
}

/// Same checks straight off a parsed mapping. Reference diagnostics must
/// not depend on the record constructing cleanly; a profile with a missing
/// `name` still has checkable context paths.
pub fn resolve_mapping_references(
    mapping: &Mapping,
    source: &Path,
    index: &FileIndex,
) -> Vec<Diagnostic> {
    ReferenceTargets::from_mapping(mapping).resolve(source, index)
}

struct ReferenceTargets {
    contexts: Vec<String>,
    hooks: Vec<String>,
    servers: Vec<String>,
}

impl ReferenceTargets {
    fn from_mapping(mapping: &Mapping) -> Self {
        let mut hooks = Vec::new();
        if let Some(by_trigger) = mapping.get("hooks").and_then(Value::as_mapping) {
            for references in by_trigger.values() {
                let Some(references) = references.as_sequence() else {
                    continue;
                };
                for reference in references {
                    let name = reference.as_str().or_else(|| {
                        reference
                            .as_mapping()
                            .and_then(|m| m.get("name"))
                            .and_then(Value::as_str)
                    });
                    if let Some(name) = name {
                        hooks.push(name.to_string());
                    }
                }
            }
        }

        Self {
            contexts: string_sequence(mapping, "contexts"),
            hooks,
            servers: string_sequence(mapping, "mcp_servers"),
        }
    }

    fn resolve(&self, source: &Path, index: &FileIndex) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for context in &self.contexts {
            // Glob patterns are satisfied by definition; only literal paths
            // must resolve.
            if context.contains('*') {
                continue;
            }
            if !index.root.join(context).is_file() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::MissingFileReference,
                    source,
                    format!("referenced context file does not exist: {context}"),
                ));
            }
        }

        for hook_name in &self.hooks {
            if !index.hooks.contains_key(hook_name) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MissingHookReference,
                    source,
                    format!("referenced hook '{hook_name}' is not defined in the library"),
                ));
            }
        }

        for server in &self.servers {
            if !index.servers.contains(server) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UnknownMcpServer,
                    source,
                    format!("unknown MCP server '{server}'"),
                ));
            }
        }

        diagnostics
    }
}

fn string_sequence(mapping: &Mapping, key: &str) -> Vec<String> {
    mapping
        .get(key)
        .and_then(Value::as_sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
