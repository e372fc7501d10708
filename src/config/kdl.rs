//! KDL parsing for facts and parameters files.
//!
//! Both files share one flat schema: one node per variable, whose first
//! argument is the value. A node with a child block is a map.
//!
//! # KDL Schema
//!
//! ```kdl
//! operatingsystem "Ubuntu"
//! ipaddress "10.42.42.42"
//! monitor #false
//! django_monitor #true
//! url_check #null          // explicit null, rejected by the resolver
//! options {
//!     opt_a "value_a"
//! }
//! ```

use crate::config::schema::{Supplied, Value};
use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::collections::BTreeMap;
use std::path::Path;

/// Parse every node of a document into a name → value map.
///
/// Later nodes with the same name override earlier ones.
pub fn parse_variables(doc: &KdlDocument) -> Result<BTreeMap<String, Supplied>> {
    let mut vars = BTreeMap::new();
    for node in doc.nodes() {
        let name = node.name().value().to_string();
        let value = parse_variable_node(node)?;
        vars.insert(name, value);
    }
    Ok(vars)
}

fn parse_variable_node(node: &KdlNode) -> Result<Supplied> {
    if let Some(children) = node.children() {
        let mut map = BTreeMap::new();
        for child in children.nodes() {
            let key = child.name().value().to_string();
            let Some(entry) = child.entries().first() else {
                return Err(Error::InvalidInput(format!(
                    "map entry '{}' in '{}' has no value",
                    key,
                    node.name().value()
                )));
            };
            let Some(text) = scalar_text(entry) else {
                return Err(Error::InvalidInput(format!(
                    "map entry '{}' in '{}' must be a string, number or bool",
                    key,
                    node.name().value()
                )));
            };
            map.insert(key, text);
        }
        return Ok(Supplied::Value(Value::Map(map)));
    }

    let entry = node.entries().first().ok_or_else(|| {
        Error::InvalidInput(format!("'{}' has no value", node.name().value()))
    })?;

    Ok(match entry.value() {
        KdlValue::Bool(b) => Supplied::Value(Value::Bool(*b)),
        KdlValue::Null => Supplied::Null,
        _ => match scalar_text(entry) {
            Some(text) => Supplied::Value(Value::Str(text)),
            None => {
                return Err(Error::InvalidInput(format!(
                    "'{}' has an unsupported value",
                    node.name().value()
                )));
            }
        },
    })
}

/// Render a scalar entry as text.
///
/// Numbers keep the text they were written with, so `5.0` stays `"5.0"` and
/// `0644` stays `"0644"`.
fn scalar_text(entry: &KdlEntry) -> Option<String> {
    match entry.value() {
        KdlValue::String(s) => Some(s.clone()),
        KdlValue::Integer(_) | KdlValue::Float(_) => Some(number_text(entry)),
        KdlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_text(entry: &KdlEntry) -> String {
    match entry.format() {
        Some(format) if !format.value_repr.trim().is_empty() => {
            format.value_repr.trim().to_string()
        }
        _ => match entry.value() {
            KdlValue::Integer(i) => i.to_string(),
            KdlValue::Float(f) => f.to_string(),
            other => other.to_string(),
        },
    }
}

/// Read and parse a KDL file.
pub fn load_document(path: &Path) -> Result<KdlDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;

    content.parse().map_err(|e| Error::Kdl {
        path: path.display().to_string(),
        message: format!("{}", e),
    })
}

/// Load variables from a KDL file.
pub fn load_variables(path: &Path) -> Result<BTreeMap<String, Supplied>> {
    let doc = load_document(path)?;
    parse_variables(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(kdl: &str) -> Result<BTreeMap<String, Supplied>> {
        let doc: KdlDocument = kdl.parse().unwrap();
        parse_variables(&doc)
    }

    #[test]
    fn test_parse_scalars() {
        let vars = parse(
            r#"
            operatingsystem "Ubuntu"
            monitor #true
            django_monitor #false
            port 8080
        "#,
        )
        .unwrap();

        assert_eq!(vars["operatingsystem"], Supplied::from("Ubuntu"));
        assert_eq!(vars["monitor"], Supplied::from(true));
        assert_eq!(vars["django_monitor"], Supplied::from(false));
        assert_eq!(vars["port"], Supplied::from("8080"));
    }

    #[test]
    fn test_parse_null_is_kept_distinct() {
        let vars = parse("url_check #null").unwrap();
        assert_eq!(vars["url_check"], Supplied::Null);
    }

    #[test]
    fn test_parse_map() {
        let vars = parse(
            r#"
            options {
                opt_a "value_a"
                workers 4
            }
        "#,
        )
        .unwrap();

        let Supplied::Value(Value::Map(map)) = &vars["options"] else {
            panic!("expected a map");
        };
        assert_eq!(map["opt_a"], "value_a");
        assert_eq!(map["workers"], "4");
    }

    #[test]
    fn test_numbers_keep_written_form() {
        let vars = parse(
            r#"
            version 5.0
            config_file_mode 0644
            workers 1e3
            options {
                ratio 0.50
            }
        "#,
        )
        .unwrap();

        assert_eq!(vars["version"], Supplied::from("5.0"));
        assert_eq!(vars["config_file_mode"], Supplied::from("0644"));
        assert_eq!(vars["workers"], Supplied::from("1e3"));
        let Supplied::Value(Value::Map(map)) = &vars["options"] else {
            panic!("expected a map");
        };
        assert_eq!(map["ratio"], "0.50");
    }

    #[test]
    fn test_parse_node_without_value() {
        let err = parse("monitor").unwrap_err();
        assert!(err.to_string().contains("'monitor' has no value"));
    }

    #[test]
    fn test_later_node_wins() {
        let vars = parse(
            r#"
            monitor #false
            monitor #true
        "#,
        )
        .unwrap();
        assert_eq!(vars["monitor"], Supplied::from(true));
    }

    #[test]
    fn test_load_variables_bad_syntax() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.kdl");
        std::fs::write(&path, "monitor {").unwrap();

        let err = load_variables(&path).unwrap_err();
        assert!(matches!(err, Error::Kdl { .. }));
    }

    #[test]
    fn test_load_variables_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_variables(&dir.path().join("missing.kdl")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
