//! Integration tests for the load pipeline:
//! source selection, parent inheritance, includes, and saving.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use config_cascade::config::ENV_CONFIG_FILE;
use config_cascade::{Config, ConfigError, LoadOptions, Registry, Resolve};

fn empty_resolver() -> Arc<dyn Resolve> {
    Arc::new(Registry::new())
}

/// Write `content` under `dir` and return the full path.
fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write sample config");
    path
}

fn sample_01() -> String {
    json!({
        "a": 123,
        "b": [1, 2, 3],
        "c": {"ca": 1, "cb": 2, "cc": 3},
        "d": [{"ca": 1, "cb": 2, "cc": 3}, {"ca": 1, "cb": 2, "cc": 3}],
        "e": {"ca": [1, 2, 3], "cb": [1, 2, 3]}
    })
    .to_string()
}

mod loading_tests {
    use super::*;

    #[test]
    fn plain_config_loads_as_parsed() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", &sample_01());

        let config = Config::from_file(&path, empty_resolver()).unwrap();

        assert_eq!(
            config.to_value(),
            json!({
                "a": 123,
                "b": [1, 2, 3],
                "c": {"ca": 1, "cb": 2, "cc": 3},
                "d": [{"ca": 1, "cb": 2, "cc": 3}, {"ca": 1, "cb": 2, "cc": 3}],
                "e": {"ca": [1, 2, 3], "cb": [1, 2, 3]}
            })
        );
    }

    #[test]
    fn yaml_config_loads_by_extension() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.yaml", "a: 1\nb:\n  - x\n  - y\n");

        let config = Config::from_file(&path, empty_resolver()).unwrap();

        assert_eq!(config.to_value(), json!({"a": 1, "b": ["x", "y"]}));
    }

    #[test]
    fn missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.json");

        let err = Config::from_file(&path, empty_resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(p) if p == path));
    }

    #[test]
    fn unknown_extension_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.ini", "a=1");

        let err = Config::from_file(&path, empty_resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(ext) if ext == "ini"));
    }

    #[test]
    fn non_mapping_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", "[1, 2, 3]");

        let err = Config::from_file(&path, empty_resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(_)));
    }

    #[test]
    fn null_values_do_not_create_attributes() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", r#"{"a": 1, "gone": null}"#);

        let config = Config::from_file(&path, empty_resolver()).unwrap();
        assert_eq!(config.to_value(), json!({"a": 1}));
    }

    #[test]
    fn env_var_names_the_source_when_no_file_given() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "from_env.json", r#"{"a": 1}"#);

        // SAFETY: this is the only test touching CONFIG_FILE, and every other
        // test passes an explicit file so the variable is never read there.
        unsafe {
            std::env::set_var(ENV_CONFIG_FILE, &path);
        }
        let result = Config::load(LoadOptions::new());
        unsafe {
            std::env::remove_var(ENV_CONFIG_FILE);
        }

        assert_eq!(result.unwrap().to_value(), json!({"a": 1}));
    }
}

mod parent_tests {
    use super::*;

    #[test]
    fn child_overrides_parent_keys() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "base.json", &sample_01());
        let child = write_file(
            temp.path(),
            "child.json",
            &json!({
                "parent": "base.json",
                "a": 321,
                "e": {"ca": [1, 2, 3], "cb": [3, 2, 1]}
            })
            .to_string(),
        );

        let config = Config::from_file(&child, empty_resolver()).unwrap();

        // Child keys win, parent-only keys survive, the parent key is gone.
        assert_eq!(
            config.to_value(),
            json!({
                "a": 321,
                "b": [1, 2, 3],
                "c": {"ca": 1, "cb": 2, "cc": 3},
                "d": [{"ca": 1, "cb": 2, "cc": 3}, {"ca": 1, "cb": 2, "cc": 3}],
                "e": {"ca": [1, 2, 3], "cb": [3, 2, 1]}
            })
        );
    }

    #[test]
    fn parent_overlay_is_shallow() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "base.json",
            &json!({"c": {"ca": 1, "cb": 2}}).to_string(),
        );
        let child = write_file(
            temp.path(),
            "child.json",
            &json!({"parent": "base.json", "c": {"cc": 3}}).to_string(),
        );

        let config = Config::from_file(&child, empty_resolver()).unwrap();

        // Whole values replace: the child's "c" wins outright.
        assert_eq!(config.to_value(), json!({"c": {"cc": 3}}));
    }

    #[test]
    fn grandparent_chain_resolves_oldest_first() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "oldest.json",
            &json!({"a": 1, "b": 1, "c": 1}).to_string(),
        );
        write_file(
            temp.path(),
            "middle.json",
            &json!({"parent": "oldest.json", "b": 2, "c": 2}).to_string(),
        );
        let child = write_file(
            temp.path(),
            "child.json",
            &json!({"parent": "middle.json", "c": 3}).to_string(),
        );

        let config = Config::from_file(&child, empty_resolver()).unwrap();
        assert_eq!(config.to_value(), json!({"a": 1, "b": 2, "c": 3}));
    }

    #[test]
    fn parent_path_is_relative_to_child_directory() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        write_file(&sub, "base.json", &json!({"a": 1}).to_string());
        let child = write_file(
            &sub,
            "child.json",
            &json!({"parent": "base.json", "b": 2}).to_string(),
        );

        let config = Config::from_file(&child, empty_resolver()).unwrap();
        assert_eq!(config.to_value(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn missing_parent_is_fatal() {
        let temp = TempDir::new().unwrap();
        let child = write_file(
            temp.path(),
            "child.json",
            &json!({"parent": "gone.json"}).to_string(),
        );

        let err = Config::from_file(&child, empty_resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}

mod include_tests {
    use super::*;

    #[test]
    fn include_splices_the_loaded_file() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "inc.json",
            &json!({"cca": 1, "ccb": 2}).to_string(),
        );
        let main = write_file(
            temp.path(),
            "main.json",
            &json!({"c": {"ca": "include::inc.json"}}).to_string(),
        );

        let config = Config::from_file(&main, empty_resolver()).unwrap();
        assert_eq!(config.to_value(), json!({"c": {"ca": {"cca": 1, "ccb": 2}}}));
    }

    #[test]
    fn includes_resolve_transitively() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "leaf.json", &json!({"deep": true}).to_string());
        write_file(
            temp.path(),
            "middle.json",
            &json!({"inner": "include::leaf.json"}).to_string(),
        );
        let main = write_file(
            temp.path(),
            "main.json",
            &json!({"outer": "include::middle.json"}).to_string(),
        );

        let config = Config::from_file(&main, empty_resolver()).unwrap();
        assert_eq!(
            config.to_value(),
            json!({"outer": {"inner": {"deep": true}}})
        );
    }

    #[test]
    fn included_file_resolves_its_own_parent() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "base.json", &json!({"a": 1, "b": 1}).to_string());
        write_file(
            temp.path(),
            "inc.json",
            &json!({"parent": "base.json", "b": 2}).to_string(),
        );
        let main = write_file(
            temp.path(),
            "main.json",
            &json!({"spliced": "include::inc.json"}).to_string(),
        );

        let config = Config::from_file(&main, empty_resolver()).unwrap();
        assert_eq!(config.to_value(), json!({"spliced": {"a": 1, "b": 2}}));
    }

    #[test]
    fn missing_include_is_fatal() {
        let temp = TempDir::new().unwrap();
        let main = write_file(
            temp.path(),
            "main.json",
            &json!({"x": "include::gone.json"}).to_string(),
        );

        let err = Config::from_file(&main, empty_resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}

mod save_tests {
    use super::*;

    #[test]
    fn save_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", &sample_01());
        let config = Config::from_file(&path, empty_resolver()).unwrap();

        let saved = temp.path().join("saved.json");
        config.save_to(&saved).unwrap();

        let reloaded = Config::from_file(&saved, empty_resolver()).unwrap();
        assert_eq!(reloaded.to_value(), config.to_value());
    }

    #[test]
    fn save_to_yaml_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", &sample_01());
        let config = Config::from_file(&path, empty_resolver()).unwrap();

        let saved = temp.path().join("saved.yaml");
        config.save_to(&saved).unwrap();

        let reloaded = Config::from_file(&saved, empty_resolver()).unwrap();
        assert_eq!(reloaded.to_value(), config.to_value());
    }

    #[test]
    fn save_to_unknown_extension_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "config.json", &sample_01());
        let config = Config::from_file(&path, empty_resolver()).unwrap();

        let err = config.save_to(&temp.path().join("out.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(_)));
    }
}
