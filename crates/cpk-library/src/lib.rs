//! Profile library engine: discovery, parsing, schema validation,
//! cross-reference resolution, cycle detection, legacy JSON merging, and
//! mtime-based caching.

pub mod cache;
pub mod cycles;
pub mod hook;
pub mod library;
pub mod merge;
pub mod parse;
pub mod profile;
pub mod resolve;
pub mod schema;
pub mod validate;

pub use cache::{CacheStats, ProfileCache};
pub use cycles::{ProfileNode, detect_cycles};
pub use hook::{HookConfig, HookContextBlock, HookScriptBlock, HookTrigger, HookType};
pub use library::{FileIndex, ProfileLibrary};
pub use merge::{ConflictReport, ProfileMerger, convert_json_to_yaml_config};
pub use parse::{parse_markdown_context, parse_yaml};
pub use profile::{HookReference, ProfileConfig, ProfileSettings, ValidationLevel};
pub use resolve::{resolve_mapping_references, resolve_references};
pub use schema::{SchemaSpec, schema_for};
pub use validate::validate_schema;
