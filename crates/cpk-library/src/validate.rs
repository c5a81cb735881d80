//! Field, type, and enum checks against the schema registry.
//!
//! Missing required fields are deliberately consolidated into a single
//! diagnostic per file; every other violation gets its own diagnostic.

use serde_yaml::Value;

use cpk_core::{ConfigDocument, ConfigKind, Diagnostic, DiagnosticKind};

use crate::parse::value_type_name;
use crate::schema::{HOOK_TRIGGERS, HOOK_TYPES, VALIDATION_LEVELS, schema_for};

/// Validate a parsed document against its kind's schema.
pub fn validate_schema(doc: &ConfigDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let schema = schema_for(doc.kind);

    let missing: Vec<&str> = schema
        .required
        .iter()
        .copied()
        .filter(|field| is_absent(doc.get(field)))
        .collect();
    if !missing.is_empty() {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::SchemaValidation,
            &doc.path,
            format!("missing required field(s): {}", missing.join(", ")),
        ));
    }

    for field in schema.deprecated {
        if doc.get(field).is_some() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::DeprecatedField,
                &doc.path,
                format!("field '{field}' is deprecated and ignored"),
            ));
        }
    }

    for key in doc.mapping.keys() {
        if let Some(field) = key.as_str()
            && !schema.is_known(field)
        {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::SchemaValidation,
                &doc.path,
                format!("unknown field '{field}' is ignored"),
            ));
        }
    }

    match doc.kind {
        ConfigKind::Profile => validate_profile(doc, &mut diagnostics),
        ConfigKind::Hook => validate_hook(doc, &mut diagnostics),
        ConfigKind::Context => validate_context(doc, &mut diagnostics),
    }

    diagnostics
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn validate_profile(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    check_nonempty_string(doc, "name", diagnostics);
    check_string(doc, "description", diagnostics);
    check_version(doc, diagnostics);
    check_string_sequence(doc, "contexts", diagnostics);
    check_string_sequence(doc, "mcp_servers", diagnostics);
    check_profile_hooks(doc, diagnostics);
    check_profile_settings(doc, diagnostics);
    check_mapping(doc, "metadata", diagnostics);
}

fn validate_hook(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    check_nonempty_string(doc, "name", diagnostics);
    check_string(doc, "description", diagnostics);
    check_enum(doc, "trigger", HOOK_TRIGGERS, diagnostics);
    check_enum(doc, "type", HOOK_TYPES, diagnostics);
    check_positive_integer(doc, "timeout_secs", diagnostics);
    check_bool(doc, "enabled", diagnostics);
    check_string_sequence(doc, "conditions", diagnostics);

    if let Some(context) = present(doc.get("context")) {
        match context.as_mapping() {
            Some(block) => {
                check_block_string_sequence(doc, block, "context.sources", "sources", diagnostics);
                check_block_string_sequence(doc, block, "context.tags", "tags", diagnostics);
                if let Some(priority) = present(block.get("priority"))
                    && priority.as_i64().is_none()
                {
                    push_type_error(doc, "context.priority", "an integer", priority, diagnostics);
                }
            }
            None => push_type_error(doc, "context", "a mapping", context, diagnostics),
        }
    }

    if let Some(script) = present(doc.get("script")) {
        match script.as_mapping() {
            Some(block) => {
                match present(block.get("command")) {
                    Some(command) if command.as_str().is_none() => {
                        push_type_error(doc, "script.command", "a string", command, diagnostics);
                    }
                    Some(_) => {}
                    None => diagnostics.push(Diagnostic::error(
                        DiagnosticKind::SchemaValidation,
                        &doc.path,
                        "script block requires a 'command' field",
                    )),
                }
                check_block_string_sequence(doc, block, "script.args", "args", diagnostics);
            }
            None => push_type_error(doc, "script", "a mapping", script, diagnostics),
        }
    }
}

fn validate_context(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    check_string(doc, "title", diagnostics);
    check_string(doc, "description", diagnostics);
    check_string_sequence(doc, "tags", diagnostics);
    if let Some(priority) = present(doc.get("priority"))
        && priority.as_i64().is_none()
    {
        push_type_error(doc, "priority", "an integer", priority, diagnostics);
    }
}

/// Profile `hooks` is a mapping of trigger → ordered hook references,
/// where each reference is a bare name or a mapping with a `name`.
fn check_profile_hooks(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    let Some(hooks) = present(doc.get("hooks")) else {
        return;
    };
    let Some(hooks) = hooks.as_mapping() else {
        push_type_error(doc, "hooks", "a mapping", hooks, diagnostics);
        return;
    };

    for (key, references) in hooks {
        let Some(trigger) = key.as_str() else {
            push_type_error(doc, "hooks", "string trigger keys", key, diagnostics);
            continue;
        };
        if !HOOK_TRIGGERS.contains(&trigger) {
            diagnostics.push(enum_violation(doc, "hooks", trigger, HOOK_TRIGGERS));
        }

        let field = format!("hooks.{trigger}");
        let Some(references) = references.as_sequence() else {
            push_type_error(doc, &field, "a sequence", references, diagnostics);
            continue;
        };
        for reference in references {
            let named = reference.as_str().is_some()
                || reference
                    .as_mapping()
                    .and_then(|m| m.get("name"))
                    .and_then(Value::as_str)
                    .is_some();
            if !named {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::SchemaValidation,
                    &doc.path,
                    format!("field '{field}' entries must be a hook name or a mapping with 'name'"),
                ));
            }
        }
    }
}

fn check_profile_settings(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    let Some(settings) = present(doc.get("settings")) else {
        return;
    };
    let Some(settings) = settings.as_mapping() else {
        push_type_error(doc, "settings", "a mapping", settings, diagnostics);
        return;
    };

    if let Some(level) = present(settings.get("validation_level")) {
        match level.as_str() {
            Some(value) if !VALIDATION_LEVELS.contains(&value) => {
                diagnostics.push(enum_violation(
                    doc,
                    "settings.validation_level",
                    value,
                    VALIDATION_LEVELS,
                ));
            }
            Some(_) => {}
            None => push_type_error(doc, "settings.validation_level", "a string", level, diagnostics),
        }
    }
    for flag in ["strict_references", "cache_enabled"] {
        if let Some(value) = present(settings.get(flag))
            && value.as_bool().is_none()
        {
            push_type_error(doc, &format!("settings.{flag}"), "a boolean", value, diagnostics);
        }
    }
}

/// `version` must be a string; profiles migrated from legacy JSON get a
/// warning instead so the one-way converter's numeric versions load.
fn check_version(doc: &ConfigDocument, diagnostics: &mut Vec<Diagnostic>) {
    let Some(version) = present(doc.get("version")) else {
        return;
    };
    if version.as_str().is_some() {
        return;
    }

    let migrated = doc
        .get("metadata")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("migrated_from_json"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let message = format!(
        "field 'version' must be a string, found {}",
        value_type_name(version)
    );
    if migrated {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::SchemaValidation,
            &doc.path,
            message,
        ));
    } else {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::SchemaValidation,
            &doc.path,
            message,
        ));
    }
}

fn check_enum(
    doc: &ConfigDocument,
    field: &str,
    allowed: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(value) = present(doc.get(field)) else {
        return;
    };
    match value.as_str() {
        Some(text) if !allowed.contains(&text) => {
            diagnostics.push(enum_violation(doc, field, text, allowed));
        }
        Some(_) => {}
        None => push_type_error(doc, field, "a string", value, diagnostics),
    }
}

fn enum_violation(doc: &ConfigDocument, field: &str, value: &str, allowed: &[&str]) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::SchemaValidation,
        &doc.path,
        format!(
            "field '{field}' has invalid value '{value}'; allowed values: [{}]",
            allowed.join(", ")
        ),
    )
}

fn check_nonempty_string(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(value) = present(doc.get(field)) else {
        return;
    };
    match value.as_str() {
        Some("") => diagnostics.push(Diagnostic::error(
            DiagnosticKind::SchemaValidation,
            &doc.path,
            format!("field '{field}' cannot be empty"),
        )),
        Some(_) => {}
        None => push_type_error(doc, field, "a string", value, diagnostics),
    }
}

fn check_string(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(value) = present(doc.get(field))
        && value.as_str().is_none()
    {
        push_type_error(doc, field, "a string", value, diagnostics);
    }
}

fn check_bool(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(value) = present(doc.get(field))
        && value.as_bool().is_none()
    {
        push_type_error(doc, field, "a boolean", value, diagnostics);
    }
}

fn check_positive_integer(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(value) = present(doc.get(field)) else {
        return;
    };
    match value.as_u64() {
        Some(0) => diagnostics.push(Diagnostic::error(
            DiagnosticKind::SchemaValidation,
            &doc.path,
            format!("field '{field}' must be > 0 (got 0)"),
        )),
        Some(_) => {}
        None => push_type_error(doc, field, "a positive integer", value, diagnostics),
    }
}

fn check_string_sequence(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(value) = present(doc.get(field)) else {
        return;
    };
    check_string_sequence_value(doc, field, value, diagnostics);
}

fn check_block_string_sequence(
    doc: &ConfigDocument,
    block: &serde_yaml::Mapping,
    field: &str,
    key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Some(value) = present(block.get(key)) {
        check_string_sequence_value(doc, field, value, diagnostics);
    }
}

fn check_string_sequence_value(
    doc: &ConfigDocument,
    field: &str,
    value: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(items) = value.as_sequence() else {
        push_type_error(doc, field, "a sequence", value, diagnostics);
        return;
    };
    for item in items {
        if item.as_str().is_none() {
            push_type_error(doc, field, "a sequence of strings", item, diagnostics);
        }
    }
}

fn check_mapping(doc: &ConfigDocument, field: &str, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(value) = present(doc.get(field))
        && value.as_mapping().is_none()
    {
        push_type_error(doc, field, "a mapping", value, diagnostics);
    }
}

fn push_type_error(
    doc: &ConfigDocument,
    field: &str,
    expected: &str,
    value: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    diagnostics.push(Diagnostic::error(
        DiagnosticKind::SchemaValidation,
        &doc.path,
        format!(
            "field '{field}' must be {expected}, found {}",
            value_type_name(value)
        ),
    ));
}

/// Explicit `null` is treated like an absent field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !matches!(v, Value::Null))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
