//! Config aggregation: source selection, parent chain, overlays, lazy reads.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::ConfigError;
use crate::format::FileFormat;
use crate::materialize::{Loaded, materialize};
use crate::overrides::apply_overrides;
use crate::registry::{Registry, Resolve};
use crate::resolve::{PARENT_KEY, resolve_directives};
use crate::tree::{Mapping, Node, mapping_to_value};

/// Environment variable naming the config file when none is given explicitly.
pub const ENV_CONFIG_FILE: &str = "CONFIG_FILE";
/// Fallback config path when no other source names one.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";

/// Options for a full load: source file, raw override tokens, import capability.
pub struct LoadOptions {
    /// Explicit config file path (highest precedence).
    pub file: Option<PathBuf>,
    /// Raw CLI tokens holding `--dotted.path [value]` overrides.
    pub overrides: Vec<String>,
    /// Import capability used for `import::` directives and materialization.
    pub resolver: Arc<dyn Resolve>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self {
            file: None,
            overrides: Vec::new(),
            resolver: Arc::new(Registry::new()),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, tokens: impl IntoIterator<Item = String>) -> Self {
        self.overrides = tokens.into_iter().collect();
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully resolved configuration tree with lazy, materializing read access.
///
/// Construction runs the whole pipeline: source selection, parent chain
/// (oldest ancestor first), per-value directive resolution, and CLI
/// overrides last. A failed load is the `Err` return; no half-loaded
/// instance exists.
pub struct Config {
    attrs: Mapping,
    resolver: Arc<dyn Resolve>,
}

impl Config {
    /// Load using source-path precedence and apply CLI overrides last.
    ///
    /// Precedence: explicit path in the options, then the `CONFIG_FILE`
    /// environment variable, then the fallback `configs/config.json`.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let path = resolve_source_path(options.file);
        let mut config = Self::from_file(&path, options.resolver)?;
        if !options.overrides.is_empty() {
            let base_dir = parent_dir(&path);
            apply_overrides(
                &mut config.attrs,
                &options.overrides,
                &base_dir,
                &config.resolver,
            )?;
        }
        Ok(config)
    }

    /// Load a single file through the parent/directive pipeline, without
    /// CLI overrides. This is the entry point used by `include::`.
    pub fn from_file(path: &Path, resolver: Arc<dyn Resolve>) -> Result<Self, ConfigError> {
        let attrs = load_file(path, &resolver)?;
        Ok(Self { attrs, resolver })
    }

    /// Read and materialize an attribute; `Ok(None)` when absent.
    ///
    /// Every call re-materializes, so object specifications yield a fresh
    /// instance per read.
    pub fn get(&self, name: &str) -> Result<Option<Loaded>, ConfigError> {
        self.get_with(name, &[], &IndexMap::new())
    }

    /// Read with caller-supplied construction arguments.
    ///
    /// Caller kwargs act as defaults (file-supplied params win on
    /// collision); sequence params append after the caller's positionals.
    pub fn get_with(
        &self,
        name: &str,
        args: &[Loaded],
        kwargs: &IndexMap<String, Loaded>,
    ) -> Result<Option<Loaded>, ConfigError> {
        match self.attrs.get(name) {
            Some(node) => materialize(node, &self.resolver, args, kwargs, true).map(Some),
            None => Ok(None),
        }
    }

    /// Like `get`, but classes resolve without being instantiated.
    pub fn get_class(&self, name: &str) -> Result<Option<Loaded>, ConfigError> {
        match self.attrs.get(name) {
            Some(node) => materialize(node, &self.resolver, &[], &IndexMap::new(), false).map(Some),
            None => Ok(None),
        }
    }

    /// Read with a default for absent attributes.
    pub fn get_or(&self, name: &str, default: Loaded) -> Result<Loaded, ConfigError> {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Indexer-style read: absent attributes are an error.
    pub fn try_get(&self, name: &str) -> Result<Loaded, ConfigError> {
        self.get(name)?
            .ok_or_else(|| ConfigError::KeyNotFound(name.to_string()))
    }

    /// Deserialize the raw (un-materialized) attribute into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let node = self
            .raw(name)
            .ok_or_else(|| ConfigError::KeyNotFound(name.to_string()))?;
        serde_json::from_value(node.into()).map_err(|err| ConfigError::Deserialize {
            name: name.to_string(),
            message: err.to_string(),
        })
    }

    /// Live reference to the raw attribute value.
    pub fn raw(&self, name: &str) -> Option<&Node> {
        self.attrs.get(name)
    }

    /// Root attribute mapping.
    pub fn attrs(&self) -> &Mapping {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Mapping {
        &mut self.attrs
    }

    pub fn into_attrs(self) -> Mapping {
        self.attrs
    }

    /// Render the raw attributes as a `serde_json::Value` object.
    pub fn to_value(&self) -> serde_json::Value {
        mapping_to_value(&self.attrs)
    }

    /// Save the current attributes, pretty-printed with sorted keys.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        debug!(path = %path.display(), "saving config");
        let format = FileFormat::from_path(path)?;
        let mut file = fs::File::create(path)?;
        format.write(&self.attrs, &mut file, true, true)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config").field("attrs", &self.attrs).finish()
    }
}

/// Pick the source file by precedence; existence is checked at load time.
fn resolve_source_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config from provided path");
        return path;
    }
    if let Ok(path) = env::var(ENV_CONFIG_FILE) {
        if !path.is_empty() {
            debug!(path = %path, "loading config from path in environment variable");
            return PathBuf::from(path);
        }
    }
    debug!(path = %DEFAULT_CONFIG_PATH, "loading config from fallback path");
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load one file: parse, seed from the parent chain, overlay own pairs.
fn load_file(path: &Path, resolver: &Arc<dyn Resolve>) -> Result<Mapping, ConfigError> {
    if !path.exists() {
        let err = ConfigError::FileNotFound(path.to_path_buf());
        error!(error = %err, "cannot load configuration");
        return Err(err);
    }

    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let Node::Mapping(pairs) = format.parse(path, &text)? else {
        return Err(ConfigError::InvalidRoot(path.to_path_buf()));
    };

    let base_dir = parent_dir(path);
    let mut attrs = Mapping::new();

    // The parent chain seeds the mapping first, oldest ancestor first,
    // regardless of where the parent key sits in the file.
    if let Some(parent) = pairs.get(PARENT_KEY) {
        if !parent.is_null() {
            let Some(parent_path) = parent.as_str() else {
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: format!("{PARENT_KEY:?} must be a string"),
                });
            };
            let parent_file = base_dir.join(parent_path);
            debug!(path = %parent_file.display(), "loading parent config");
            attrs = load_file(&parent_file, resolver)?;
        }
    }

    for (name, value) in pairs {
        if name == PARENT_KEY {
            continue;
        }
        set_attribute(&mut attrs, &name, value, &base_dir, resolver)?;
    }

    Ok(attrs)
}

/// Set one attribute the way the file loader does: null values are skipped
/// and directives resolve before the value lands in the tree. Whole values
/// replace; the overlay is shallow at the top level.
pub(crate) fn set_attribute(
    attrs: &mut Mapping,
    name: &str,
    mut value: Node,
    base_dir: &Path,
    resolver: &Arc<dyn Resolve>,
) -> Result<(), ConfigError> {
    if value.is_null() {
        return Ok(());
    }
    resolve_directives(&mut value, base_dir, resolver)?;
    debug!(key = %name, "set attribute");
    attrs.insert(name.to_string(), value);
    Ok(())
}

/// Directory containing `path`, falling back to the current directory.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_attribute_skips_null() {
        let mut attrs = Mapping::new();
        let resolver: Arc<dyn Resolve> = Arc::new(Registry::new());
        set_attribute(&mut attrs, "a", Node::Null, Path::new("."), &resolver).unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_set_attribute_replaces_whole_value() {
        let mut attrs = Mapping::new();
        let resolver: Arc<dyn Resolve> = Arc::new(Registry::new());
        set_attribute(
            &mut attrs,
            "a",
            Node::from(json!({"x": 1})),
            Path::new("."),
            &resolver,
        )
        .unwrap();
        set_attribute(
            &mut attrs,
            "a",
            Node::from(json!({"y": 2})),
            Path::new("."),
            &resolver,
        )
        .unwrap();
        assert_eq!(mapping_to_value(&attrs), json!({"a": {"y": 2}}));
    }

    #[test]
    fn test_resolve_source_path_explicit_wins() {
        let path = resolve_source_path(Some(PathBuf::from("given.json")));
        assert_eq!(path, PathBuf::from("given.json"));
    }

    #[test]
    fn test_parent_dir_of_bare_filename() {
        assert_eq!(parent_dir(Path::new("config.json")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/b/config.json")), PathBuf::from("a/b"));
    }
}
