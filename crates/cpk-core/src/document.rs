//! Config file kinds, source fingerprints, and the in-flight document.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Kind of configuration file, assigned once at discovery and threaded
/// through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    Profile,
    Hook,
    Context,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Hook => "hook",
            Self::Context => "context",
        }
    }

    /// Directory under the library root holding files of this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Hook => "hooks",
            Self::Context => "contexts",
        }
    }
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (mtime, size) identity of a source file at read time.
///
/// Cache entries carry this and are evicted when it no longer matches the
/// file on disk. Sub-second mtime resolution is filesystem-dependent;
/// acceptable at human-editing timescales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub mtime: SystemTime,
    pub size: u64,
}

impl SourceFingerprint {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> std::io::Result<Self> {
        Ok(Self {
            mtime: metadata.modified()?,
            size: metadata.len(),
        })
    }

    pub fn of(path: &std::path::Path) -> std::io::Result<Self> {
        Self::from_metadata(&std::fs::metadata(path)?)
    }
}

/// A parsed configuration file, alive only for the duration of the
/// per-file pipeline.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub path: PathBuf,
    pub kind: ConfigKind,
    pub raw: String,
    pub mapping: serde_yaml::Mapping,
    pub fingerprint: SourceFingerprint,
}

impl ConfigDocument {
    /// Fetch a top-level field from the parsed mapping.
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.mapping.get(serde_yaml::Value::String(key.to_string()))
    }

    /// File stem, used as the fallback object name for discovery indexes.
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}
