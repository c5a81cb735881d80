//! Library orchestration: discovery, per-file validation, batch
//! validation, and cached profile loading.
//!
//! The per-file pipeline is parse → schema check → construct → resolve.
//! Only a parse failure short-circuits; every later stage appends to the
//! report so one pass surfaces as much as possible.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use cpk_core::{ConfigKind, Diagnostic, DiagnosticKind, LibraryError, ValidationReport};

use crate::cache::{CacheStats, ProfileCache};
use crate::cycles::{ProfileNode, detect_cycles};
use crate::hook::HookConfig;
use crate::parse::{parse_markdown_context, parse_yaml};
use crate::profile::ProfileConfig;
use crate::resolve::{resolve_mapping_references, resolve_references};
use crate::validate::validate_schema;

/// Everything discovery found under the library root, keyed for lookup
/// during reference resolution.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    pub root: PathBuf,
    /// Profile name (file stem) → source path.
    pub profiles: BTreeMap<String, PathBuf>,
    /// Hook name (file stem) → source path.
    pub hooks: BTreeMap<String, PathBuf>,
    pub contexts: BTreeSet<PathBuf>,
    /// MCP server names configured outside the library.
    pub servers: BTreeSet<String>,
}

/// A profile library rooted at one directory, with `profiles/`, `hooks/`,
/// and `contexts/` subdirectories.
#[derive(Debug)]
pub struct ProfileLibrary {
    root: PathBuf,
    known_servers: BTreeSet<String>,
    cache: ProfileCache,
}

impl ProfileLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            known_servers: BTreeSet::new(),
            cache: ProfileCache::new(),
        }
    }

    /// Register the MCP server names profiles are allowed to reference.
    pub fn with_known_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the library root and index every configuration file.
    ///
    /// A missing subdirectory yields an empty index section, not an
    /// error; only a missing root fails. Files with other extensions are
    /// ignored.
    pub fn discover(&self) -> Result<FileIndex> {
        if !self.root.is_dir() {
            return Err(LibraryError::LibraryRootMissing(self.root.clone()).into());
        }

        let profiles = scan_configs(&self.root.join(ConfigKind::Profile.dir_name()))?;
        let hooks = scan_configs(&self.root.join(ConfigKind::Hook.dir_name()))?;
        let mut contexts = BTreeSet::new();
        scan_markdown(&self.root.join(ConfigKind::Context.dir_name()), &mut contexts)?;

        tracing::debug!(
            root = %self.root.display(),
            profiles = profiles.len(),
            hooks = hooks.len(),
            contexts = contexts.len(),
            "library discovery complete"
        );

        Ok(FileIndex {
            root: self.root.clone(),
            profiles,
            hooks,
            contexts,
            servers: self.known_servers.clone(),
        })
    }

    /// Run the full per-file pipeline on one configuration file.
    pub fn validate_file(
        &self,
        path: &Path,
        kind: ConfigKind,
        index: &FileIndex,
    ) -> ValidationReport {
        self.check_file(path, kind, index).0
    }

    /// Validate every discovered file, then check the profile reference
    /// graph for cycles. Diagnostics are sorted by (file, line) so the
    /// report is identical regardless of traversal order.
    pub fn validate_all(&self) -> Result<ValidationReport> {
        let index = self.discover()?;
        let mut report = ValidationReport::new();

        let mut profiles: BTreeMap<String, ProfileNode> = BTreeMap::new();
        let mut declared: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for (name, path) in &index.profiles {
            let (file_report, profile) = self.check_file(path, ConfigKind::Profile, &index);
            report.merge(file_report);
            if let Some(profile) = profile {
                declared
                    .entry(profile.name.clone())
                    .or_default()
                    .push(path.clone());
                profiles.insert(
                    name.clone(),
                    ProfileNode {
                        path: path.clone(),
                        profile,
                    },
                );
            }
        }

        // Declared names must be unique across the load scope, not just
        // file stems.
        for (name, paths) in &declared {
            if paths.len() > 1 {
                let files = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                report.push(Diagnostic::error(
                    DiagnosticKind::SchemaValidation,
                    &paths[0],
                    format!("profile name '{name}' is declared by multiple files: {files}"),
                ));
            }
        }

        for path in index.hooks.values() {
            report.merge(self.validate_file(path, ConfigKind::Hook, &index));
        }
        for path in &index.contexts {
            report.merge(self.validate_file(path, ConfigKind::Context, &index));
        }

        report.extend(detect_cycles(&profiles));
        report.normalize();

        tracing::info!(summary = %report.summary_line(), valid = report.is_valid());
        if report.is_valid() {
            let summary = report.summary_line();
            report.push(Diagnostic::info(
                DiagnosticKind::Summary,
                &self.root,
                format!("library validated cleanly: {summary}"),
            ));
        }
        Ok(report)
    }

    /// Load a profile by name, consulting the cache when asked.
    ///
    /// A name with no backing file raises `LibraryError::ProfileNotFound`;
    /// a file that exists but cannot be parsed or constructed raises the
    /// underlying failure.
    pub fn load(&self, name: &str, use_cache: bool) -> Result<Arc<ProfileConfig>> {
        if use_cache && let Some(profile) = self.cache.get(name) {
            tracing::debug!(profile = name, "profile cache hit");
            return Ok(profile);
        }

        let index = self.discover()?;
        let path = index
            .profiles
            .get(name)
            .ok_or_else(|| LibraryError::ProfileNotFound(name.to_string()))?;

        let doc = parse_yaml(path, ConfigKind::Profile).map_err(|diagnostic| anyhow!("{diagnostic}"))?;
        let profile = Arc::new(ProfileConfig::from_document(&doc)?);

        if profile.settings.cache_enabled {
            self.cache
                .put(name, Arc::clone(&profile), path, doc.fingerprint);
        }
        tracing::debug!(profile = name, path = %path.display(), "profile loaded");
        Ok(profile)
    }

    /// Load a hook definition by name. Hooks are small and reread on
    /// every call.
    pub fn load_hook(&self, name: &str) -> Result<HookConfig> {
        let index = self.discover()?;
        let path = index
            .hooks
            .get(name)
            .ok_or_else(|| LibraryError::HookNotFound(name.to_string()))?;

        let doc = parse_yaml(path, ConfigKind::Hook).map_err(|diagnostic| anyhow!("{diagnostic}"))?;
        HookConfig::from_document(&doc)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self, name: Option<&str>) {
        self.cache.clear(name);
    }

    /// Per-file pipeline. The constructed profile rides along so batch
    /// validation can feed the cycle detector without re-parsing.
    fn check_file(
        &self,
        path: &Path,
        kind: ConfigKind,
        index: &FileIndex,
    ) -> (ValidationReport, Option<ProfileConfig>) {
        let mut report = ValidationReport::new();
        report.record_file(path);

        let doc = match kind {
            ConfigKind::Context => parse_markdown_context(path),
            _ => parse_yaml(path, kind),
        };
        let doc = match doc {
            Ok(doc) => doc,
            Err(diagnostic) => {
                tracing::warn!(file = %path.display(), "parse failed: {}", diagnostic.message);
                report.push(*diagnostic);
                return (report, None);
            }
        };

        report.extend(validate_schema(&doc));

        let profile = match kind {
            ConfigKind::Profile => match ProfileConfig::from_document(&doc) {
                Ok(profile) => {
                    report.extend(resolve_references(&profile, path, index));
                    Some(profile)
                }
                // Schema diagnostics already explain the construction
                // failure; references are still checked off the raw
                // mapping so both classes land in one pass.
                Err(_) => {
                    report.extend(resolve_mapping_references(&doc.mapping, path, index));
                    None
                }
            },
            ConfigKind::Hook | ConfigKind::Context => None,
        };

        (report, profile)
    }
}

/// Index `*.yaml` / `*.yml` files in one directory by stem. When both
/// extensions exist for a stem, `.yaml` wins.
fn scan_configs(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut found = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(found);
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file()
            && matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            found.entry(stem.to_string()).or_insert(path);
        }
    }
    Ok(found)
}

/// Collect `*.md` files recursively. Context directories nest freely.
fn scan_markdown(dir: &Path, contexts: &mut BTreeSet<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            scan_markdown(&path, contexts)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
            contexts.insert(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
