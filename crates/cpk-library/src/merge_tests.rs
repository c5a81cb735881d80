use super::*;
use serde_json::json;

fn yaml_mapping(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_yaml_only_passes_through() {
    let yaml = yaml_mapping("name: dev\ncontexts: [contexts/a.md]\n");
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(Some(&yaml), None, "dev")
        .unwrap();
    assert_eq!(profile.name, "dev");
    assert_eq!(profile.contexts, vec!["contexts/a.md"]);
    assert!(merger.conflicts().is_empty());
}

#[test]
fn test_json_only_maps_paths_to_contexts() {
    let json = json!({
        "paths": ["contexts/a.md", "contexts/b.md"],
        "description": "from json"
    });
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(None, Some(&json), "legacy")
        .unwrap();
    assert_eq!(profile.name, "legacy");
    assert_eq!(profile.contexts, vec!["contexts/a.md", "contexts/b.md"]);
    assert_eq!(profile.description, "from json");
}

#[test]
fn test_neither_source_is_an_error() {
    let mut merger = ProfileMerger::new();
    let err = merger
        .merge_profile_configs(None, None, "ghost")
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_yaml_wins_and_conflict_recorded() {
    let yaml = yaml_mapping("name: dev\ndescription: yaml wins\n");
    let json = json!({"description": "json loses"});
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(Some(&yaml), Some(&json), "dev")
        .unwrap();

    assert_eq!(profile.description, "yaml wins");
    let conflicts = merger.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].field, "description");
    assert_eq!(conflicts[0].yaml_value, Value::from("yaml wins"));
    assert_eq!(conflicts[0].json_value, Value::from("json loses"));
}

#[test]
fn test_identical_values_are_not_conflicts() {
    let yaml = yaml_mapping("name: dev\ndescription: same\n");
    let json = json!({"description": "same"});
    let mut merger = ProfileMerger::new();
    merger
        .merge_profile_configs(Some(&yaml), Some(&json), "dev")
        .unwrap();
    assert!(merger.conflicts().is_empty());
}

#[test]
fn test_nested_merge_preserves_json_only_siblings() {
    // YAML overrides one settings key; the JSON-only sibling survives.
    let yaml = yaml_mapping("name: dev\nsettings:\n  validation_level: strict\n");
    let json = json!({
        "settings": {
            "validation_level": "relaxed",
            "cache_enabled": false
        }
    });
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(Some(&yaml), Some(&json), "dev")
        .unwrap();

    assert_eq!(
        profile.settings.validation_level,
        crate::profile::ValidationLevel::Strict
    );
    assert!(!profile.settings.cache_enabled, "JSON-only sibling kept");

    let conflicts = merger.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].field, "settings.validation_level");
}

#[test]
fn test_json_field_absent_from_yaml_survives() {
    let yaml = yaml_mapping("name: dev\n");
    let json = json!({"paths": ["contexts/legacy.md"], "version": "0.9.0"});
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(Some(&yaml), Some(&json), "dev")
        .unwrap();
    assert_eq!(profile.contexts, vec!["contexts/legacy.md"]);
    assert_eq!(profile.version.as_deref(), Some("0.9.0"));
    assert!(merger.conflicts().is_empty());
}

#[test]
fn test_bare_command_hook_entries_normalize() {
    let json = json!({
        "hooks": {
            "on_session_start": ["./warmup.sh", {"name": "banner", "priority": 2}]
        }
    });
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(None, Some(&json), "legacy")
        .unwrap();

    let refs = &profile.hooks["on_session_start"];
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].name, "./warmup.sh");
    assert_eq!(refs[1].name, "banner");
}

#[test]
fn test_unrecognized_hook_keys_preserved_in_config() {
    let json = json!({
        "hooks": {
            "on_file_change": [
                {"name": "reindex", "debounce_ms": 500, "paths": ["src/"]}
            ]
        }
    });
    let converted = convert_json_to_yaml_config(&json, "legacy").unwrap();
    let hooks = converted.get("hooks").unwrap().as_mapping().unwrap();
    let refs = hooks.get("on_file_change").unwrap().as_sequence().unwrap();
    let config = refs[0].get("config").unwrap().as_mapping().unwrap();
    assert_eq!(config.get("debounce_ms").and_then(Value::as_i64), Some(500));
    assert!(config.get("paths").is_some());
}

#[test]
fn test_hook_entry_without_name_falls_back_to_command() {
    let json = json!({
        "hooks": {"on_session_start": [{"command": "./setup.sh", "timeout": 5}]}
    });
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(None, Some(&json), "legacy")
        .unwrap();
    assert_eq!(profile.hooks["on_session_start"][0].name, "./setup.sh");
}

#[test]
fn test_conflicts_accumulate_and_clear() {
    let yaml = yaml_mapping("name: dev\ndescription: a\n");
    let mut merger = ProfileMerger::new();
    merger
        .merge_profile_configs(Some(&yaml), Some(&json!({"description": "b"})), "dev")
        .unwrap();
    merger
        .merge_profile_configs(Some(&yaml), Some(&json!({"description": "c"})), "dev")
        .unwrap();
    assert_eq!(merger.conflicts().len(), 2);

    merger.clear_conflicts();
    assert!(merger.conflicts().is_empty());
}

#[test]
fn test_convert_tags_migration_metadata() {
    let converted = convert_json_to_yaml_config(&json!({"paths": []}), "legacy").unwrap();
    let metadata = converted.get("metadata").unwrap().as_mapping().unwrap();
    assert_eq!(
        metadata.get("migrated_from_json").and_then(Value::as_bool),
        Some(true)
    );
    assert!(metadata.get("migrated_at").is_some());
}

#[test]
fn test_round_trip_preserves_every_path() {
    let json = json!({
        "paths": ["contexts/a.md", "contexts/b.md", "contexts/deep/c.md"],
        "description": "legacy profile"
    });

    let converted = convert_json_to_yaml_config(&json, "legacy").unwrap();
    let mut merger = ProfileMerger::new();
    let profile = merger
        .merge_profile_configs(Some(&converted), None, "legacy")
        .unwrap();

    for path in ["contexts/a.md", "contexts/b.md", "contexts/deep/c.md"] {
        assert!(
            profile.contexts.iter().any(|c| c == path),
            "path {path} lost in conversion"
        );
    }
    assert!(profile.migrated_from_json());
}

#[test]
fn test_non_object_json_rejected() {
    let mut merger = ProfileMerger::new();
    let err = merger
        .merge_profile_configs(None, Some(&json!(["not", "an", "object"])), "dev")
        .unwrap_err();
    assert!(err.to_string().contains("must be an object"));
}
