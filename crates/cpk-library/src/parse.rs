//! YAML syntax parsing with positioned diagnostics.
//!
//! Parser failures never cross the pipeline boundary as raw errors: every
//! failure mode (unreadable file, empty file, malformed YAML, non-mapping
//! top level) becomes exactly one `YAMLSyntaxError` diagnostic.

use std::path::Path;

use cpk_core::{ConfigDocument, ConfigKind, Diagnostic, DiagnosticKind, SourceFingerprint};

const SNIPPET_MAX_LEN: usize = 120;

/// Parse a YAML config file into a `ConfigDocument`.
///
/// The fingerprint is captured from the same open so cache entries match
/// the content that was actually parsed.
pub fn parse_yaml(path: &Path, kind: ConfigKind) -> Result<ConfigDocument, Box<Diagnostic>> {
    let (raw, fingerprint) = read_source(path)?;

    if raw.trim().is_empty() {
        return Err(Box::new(Diagnostic::error(
            DiagnosticKind::YamlSyntax,
            path,
            "file is empty or contains only whitespace",
        )));
    }

    let mapping = mapping_from_str(&raw, path, 0)?;
    Ok(ConfigDocument {
        path: path.to_path_buf(),
        kind,
        raw,
        mapping,
        fingerprint,
    })
}

/// Parse a Markdown context file, extracting its optional `---`-fenced
/// YAML front-matter. A file without front-matter, or with a blank block
/// between the fences, parses to an empty mapping; a malformed block
/// yields a diagnostic whose line number points into the Markdown file,
/// not the extracted block.
pub fn parse_markdown_context(path: &Path) -> Result<ConfigDocument, Box<Diagnostic>> {
    let (raw, fingerprint) = read_source(path)?;

    let mapping = match front_matter_block(&raw) {
        Some((block, line_offset)) if !block.trim().is_empty() => {
            mapping_from_str(block, path, line_offset)?
        }
        _ => serde_yaml::Mapping::new(),
    };

    Ok(ConfigDocument {
        path: path.to_path_buf(),
        kind: ConfigKind::Context,
        raw,
        mapping,
        fingerprint,
    })
}

fn read_source(path: &Path) -> Result<(String, SourceFingerprint), Box<Diagnostic>> {
    let io_diag = |err: &std::io::Error| {
        Box::new(Diagnostic::error(
            DiagnosticKind::YamlSyntax,
            path,
            format!("cannot read file: {err}"),
        ))
    };
    let raw = std::fs::read_to_string(path).map_err(|e| io_diag(&e))?;
    let fingerprint = SourceFingerprint::of(path).map_err(|e| io_diag(&e))?;
    Ok((raw, fingerprint))
}

/// Deserialize a YAML block into a mapping, converting parser position
/// markers into one positioned diagnostic. `line_offset` shifts reported
/// lines for blocks embedded in a larger file.
fn mapping_from_str(
    source: &str,
    path: &Path,
    line_offset: usize,
) -> Result<serde_yaml::Mapping, Box<Diagnostic>> {
    let value: serde_yaml::Value = serde_yaml::from_str(source)
        .map_err(|err| Box::new(syntax_diagnostic(&err, source, path, line_offset)))?;

    match value {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        serde_yaml::Value::Null => Err(Box::new(Diagnostic::error(
            DiagnosticKind::YamlSyntax,
            path,
            "file is empty or contains only whitespace",
        ))),
        other => Err(Box::new(Diagnostic::error(
            DiagnosticKind::YamlSyntax,
            path,
            format!(
                "top-level value must be a mapping, found {}",
                value_type_name(&other)
            ),
        ))),
    }
}

fn syntax_diagnostic(
    err: &serde_yaml::Error,
    source: &str,
    path: &Path,
    line_offset: usize,
) -> Diagnostic {
    let mut diagnostic = Diagnostic::error(
        DiagnosticKind::YamlSyntax,
        path,
        format!("invalid YAML: {err}"),
    );
    if let Some(location) = err.location() {
        let line = location.line() + line_offset;
        diagnostic = diagnostic.with_location(line, location.column());
        if let Some(snippet) = source_line(source, location.line()) {
            diagnostic = diagnostic.with_snippet(snippet);
        }
    }
    diagnostic
}

/// The 1-based `line` from `source`, trimmed and truncated for display.
fn source_line(source: &str, line: usize) -> Option<String> {
    let text = source.lines().nth(line.checked_sub(1)?)?.trim();
    if text.is_empty() {
        return None;
    }
    let mut snippet: String = text.chars().take(SNIPPET_MAX_LEN).collect();
    if text.chars().count() > SNIPPET_MAX_LEN {
        snippet.push('…');
    }
    Some(snippet)
}

/// Locate a leading `---` front-matter fence. Returns the enclosed block
/// and the number of lines preceding it in the file.
fn front_matter_block(raw: &str) -> Option<(&str, usize)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    for (end, _) in rest.match_indices("\n---") {
        let after = &rest[end + 4..];
        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") || after.starts_with('\r') {
            // Opening fence occupies line 1; the block starts on line 2.
            return Some((&rest[..end], 1));
        }
    }
    None
}

pub(crate) fn value_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
