//! Dotted-path CLI overrides applied to a loaded configuration tree.
//!
//! Overrides arrive as raw tokens (`--section.key value`). Each key names a
//! dotted path; missing intermediate levels are created on the fly, choosing
//! sequence or mapping from the shape of the *next* path segment.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Number;
use tracing::debug;

use crate::config::set_attribute;
use crate::error::ConfigError;
use crate::registry::Resolve;
use crate::tree::{Mapping, Node, valid_key};

/// Extract `--name [value]` pairs from raw CLI tokens.
///
/// A token starting with `--` is a key; the following token is its value
/// unless it starts with `--` itself, in which case the value is absent.
/// Later occurrences of a key win.
pub fn extract_named_args(tokens: &[String]) -> IndexMap<String, Option<String>> {
    let mut named = IndexMap::new();
    for (i, token) in tokens.iter().enumerate() {
        if !token.starts_with("--") {
            continue;
        }
        let value = match tokens.get(i + 1) {
            Some(next) if !next.starts_with("--") => Some(next.clone()),
            _ => None,
        };
        named.insert(token.clone(), value);
    }
    named
}

/// Convert a string to a number when it parses as one, integers first.
pub fn try_to_number(value: &str) -> Option<Number> {
    if let Ok(int) = value.parse::<i64>() {
        return Some(Number::from(int));
    }
    value.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Evaluate a raw override string as a literal data expression.
///
/// Accepts numbers, quoted strings, booleans, null, bracketed sequences and
/// brace mappings (JSON5 syntax, so single-quoted strings parse too). Falls
/// back to the plain string when parsing fails — never an error.
pub fn evaluate(raw: &str) -> Node {
    match json5::from_str::<serde_json::Value>(raw) {
        Ok(value) => Node::from(value),
        Err(_) => Node::String(raw.to_string()),
    }
}

/// Post-process a raw override value.
///
/// Absent values become null. Values starting with a quote character skip
/// numeric coercion so they stay strings; everything else is coerced to a
/// number when possible, then put through literal evaluation.
pub fn coerce_value(raw: Option<&str>) -> Node {
    let Some(raw) = raw else { return Node::Null };
    if !raw.starts_with('"') && !raw.starts_with('\'') {
        if let Some(number) = try_to_number(raw) {
            return Node::Number(number);
        }
    }
    evaluate(raw)
}

/// Apply `--dotted.path [value]` override tokens to the root mapping.
///
/// `base_dir` anchors directive resolution for single-segment overrides,
/// which go through the same set-attribute path as file values.
pub fn apply_overrides(
    root: &mut Mapping,
    tokens: &[String],
    base_dir: &Path,
    resolver: &Arc<dyn Resolve>,
) -> Result<(), ConfigError> {
    for (key, raw) in extract_named_args(tokens) {
        let name = key.strip_prefix("--").unwrap_or(&key);
        let value = coerce_value(raw.as_deref());
        debug!(key = %name, value = ?value, "applying override");
        apply_override(root, name, value, base_dir, resolver)?;
    }
    Ok(())
}

fn apply_override(
    root: &mut Mapping,
    path: &str,
    value: Node,
    base_dir: &Path,
    resolver: &Arc<dyn Resolve>,
) -> Result<(), ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();

    if segments.len() == 1 {
        // Single segment replaces the whole attribute; directives resolve
        // and null values do not create the attribute.
        return set_attribute(root, segments[0], value, base_dir, resolver);
    }

    // Multiple segments merge into the existing structure in place.
    let mut cursor = root
        .entry(segments[0].to_string())
        .or_insert_with(|| new_container(segments[1]));

    for (i, segment) in segments.iter().enumerate().skip(1) {
        if i == segments.len() - 1 {
            return assign_final(cursor, segment, value, path);
        }
        cursor = match valid_key(cursor, segment) {
            Some(key) => {
                Node::entry_mut(cursor, &key).ok_or_else(|| ConfigError::OverridePath {
                    path: path.to_string(),
                    reason: format!("segment {segment:?} is not addressable"),
                })?
            }
            None => attach_new(cursor, segment, new_container(segments[i + 1]), path)?,
        };
    }

    Ok(())
}

/// Shape of a freshly created level: sequence when the next segment looks
/// like an integer, mapping otherwise.
fn new_container(next_segment: &str) -> Node {
    if next_segment.parse::<i64>().is_ok() {
        Node::Sequence(Vec::new())
    } else {
        Node::Mapping(Mapping::new())
    }
}

/// Attach a fresh container under `segment` and descend into it.
///
/// Sequence parents always append, regardless of the numeric segment value.
fn attach_new<'a>(
    parent: &'a mut Node,
    segment: &str,
    fresh: Node,
    path: &str,
) -> Result<&'a mut Node, ConfigError> {
    match parent {
        Node::Mapping(map) => Ok(map.entry(segment.to_string()).or_insert(fresh)),
        Node::Sequence(items) => {
            items.push(fresh);
            items.last_mut().ok_or_else(|| ConfigError::OverridePath {
                path: path.to_string(),
                reason: "sequence append failed".to_string(),
            })
        }
        _ => Err(ConfigError::OverridePath {
            path: path.to_string(),
            reason: format!("segment {segment:?} cannot be created inside a scalar"),
        }),
    }
}

/// Set the value at the final segment: numeric segments index sequences
/// (an index equal to the length appends), everything else is a mapping key.
fn assign_final(
    container: &mut Node,
    segment: &str,
    value: Node,
    path: &str,
) -> Result<(), ConfigError> {
    match container {
        Node::Sequence(items) => {
            let index = segment.parse::<usize>().map_err(|_| ConfigError::OverridePath {
                path: path.to_string(),
                reason: format!("segment {segment:?} is not a valid sequence index"),
            })?;
            if index < items.len() {
                items[index] = value;
            } else if index == items.len() {
                items.push(value);
            } else {
                return Err(ConfigError::OverridePath {
                    path: path.to_string(),
                    reason: format!(
                        "index {index} is out of range for a sequence of length {}",
                        items.len()
                    ),
                });
            }
            Ok(())
        }
        Node::Mapping(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        _ => Err(ConfigError::OverridePath {
            path: path.to_string(),
            reason: format!("cannot assign {segment:?} inside a scalar value"),
        }),
    }
}
