//! Node facts and how they split into resolution scopes.
//!
//! ## Fact sources (highest to lowest)
//!
//! 1. `--fact name=value` flags
//! 2. `--facts <file>` files, later files over earlier ones
//! 3. System facts file (`$WEBSTACK_CONFIG_DIR/facts.kdl` or `~/.config/webstack/facts.kdl`)

use crate::config::kdl::load_variables;
use crate::config::resolver::{ParameterSet, ResolutionContext};
use crate::config::schema::{Supplied, Value};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the system config directory.
pub const CONFIG_DIR_ENV: &str = "WEBSTACK_CONFIG_DIR";

/// Fact naming the node's fully qualified domain name.
pub const FACT_FQDN: &str = "fqdn";
/// Fact naming the node's primary address.
pub const FACT_IPADDRESS: &str = "ipaddress";
/// Fact naming the node's operating system.
pub const FACT_OPERATINGSYSTEM: &str = "operatingsystem";

/// Node-level variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    values: BTreeMap<String, Supplied>,
}

impl Facts {
    /// Create an empty fact set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Supplied>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a fact in place. Replaces any earlier value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Supplied>) {
        self.values.insert(name.into(), value.into());
    }

    /// Merge another fact set into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: Facts) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&Supplied> {
        self.values.get(name)
    }

    /// Get a fact as text. Booleans render as `true`/`false`; maps and nulls
    /// have no text form.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.values.get(name)? {
            Supplied::Value(Value::Str(s)) => Some(s.clone()),
            Supplied::Value(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The node's fqdn, falling back to its hostname.
    pub fn fqdn(&self) -> Option<String> {
        self.text(FACT_FQDN).or_else(|| self.text("hostname"))
    }

    pub fn ipaddress(&self) -> Option<String> {
        self.text(FACT_IPADDRESS)
    }

    pub fn operatingsystem(&self) -> Option<String> {
        self.text(FACT_OPERATINGSYSTEM)
    }

    /// Load facts from a KDL file. The file must exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        let values = load_variables(path)?;
        tracing::debug!(path = %path.display(), facts = values.len(), "loaded facts file");
        Ok(Self { values })
    }

    /// Path of the system facts file.
    ///
    /// Returns `None` when neither `WEBSTACK_CONFIG_DIR` nor a platform
    /// config directory is available.
    pub fn system_facts_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Some(PathBuf::from(dir).join("facts.kdl"));
            }
        }
        dirs::config_dir().map(|d| d.join("webstack").join("facts.kdl"))
    }

    /// Load the system facts file. A missing file yields no facts.
    pub fn load_system() -> Result<Self> {
        match Self::system_facts_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Self::new()),
        }
    }

    /// Split facts into resolution scopes for a module.
    ///
    /// Facts named `<module>_<option>` land in the module scope under
    /// `<option>`. Every fact also lands in the global scope under its own
    /// name.
    pub fn context(&self, module: &str) -> ResolutionContext {
        let prefix = format!("{}_", module);
        let mut context = ResolutionContext::new(module);

        for (name, value) in &self.values {
            if let Some(option) = name.strip_prefix(&prefix) {
                if !option.is_empty() {
                    context
                        .module_scope
                        .insert(option.to_string(), value.clone());
                }
            }
            context.global_scope.insert(name.clone(), value.clone());
        }

        context
    }
}

impl From<BTreeMap<String, Supplied>> for Facts {
    fn from(values: BTreeMap<String, Supplied>) -> Self {
        Self { values }
    }
}

/// Split a `name=value` assignment from the command line.
///
/// The value may be empty and may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| Error::InvalidInput(format!("expected name=value, got '{}'", s)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("missing name in '{}'", s)));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Load parameters from a KDL file. The file must exist.
pub fn load_params_file(path: &Path) -> Result<ParameterSet> {
    let values = load_variables(path)?;
    tracing::debug!(path = %path.display(), params = values.len(), "loaded parameters file");
    Ok(ParameterSet::from(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rspec_facts() -> Facts {
        Facts::new()
            .with("ipaddress", "10.42.42.42")
            .with("operatingsystem", "Ubuntu")
    }

    #[test]
    fn test_context_splits_module_and_global() {
        let facts = rspec_facts()
            .with("monitor", false)
            .with("django_monitor", true);

        let ctx = facts.context("django");

        assert_eq!(ctx.module, "django");
        assert_eq!(ctx.module_scope.get("monitor"), Some(&Supplied::from(true)));
        assert_eq!(ctx.global_scope.get("monitor"), Some(&Supplied::from(false)));
        assert_eq!(
            ctx.global_scope.get("django_monitor"),
            Some(&Supplied::from(true))
        );
        assert!(!ctx.module_scope.contains_key("ipaddress"));
    }

    #[test]
    fn test_context_ignores_bare_prefix() {
        let facts = Facts::new().with("django_", "x");
        let ctx = facts.context("django");
        assert!(ctx.module_scope.is_empty());
    }

    #[test]
    fn test_well_known_facts() {
        let facts = rspec_facts().with("hostname", "rspec");
        assert_eq!(facts.ipaddress().as_deref(), Some("10.42.42.42"));
        assert_eq!(facts.operatingsystem().as_deref(), Some("Ubuntu"));
        assert_eq!(facts.fqdn().as_deref(), Some("rspec"));

        let facts = facts.with("fqdn", "rspec.example42.com");
        assert_eq!(facts.fqdn().as_deref(), Some("rspec.example42.com"));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base = rspec_facts().with("monitor", false);
        base.merge(Facts::new().with("monitor", true));
        assert_eq!(base.get("monitor"), Some(&Supplied::from(true)));
        assert_eq!(base.ipaddress().as_deref(), Some("10.42.42.42"));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("monitor=true").unwrap(),
            ("monitor".to_string(), "true".to_string())
        );
        assert_eq!(
            parse_assignment("url_check=http://x/?a=b").unwrap(),
            ("url_check".to_string(), "http://x/?a=b".to_string())
        );
        assert_eq!(
            parse_assignment("template=").unwrap(),
            ("template".to_string(), String::new())
        );
        assert!(parse_assignment("monitor").is_err());
        assert!(parse_assignment("=true").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.kdl");
        std::fs::write(
            &path,
            r#"
            ipaddress "10.42.42.42"
            django_monitor #true
        "#,
        )
        .unwrap();

        let facts = Facts::load_file(&path).unwrap();
        assert_eq!(facts.ipaddress().as_deref(), Some("10.42.42.42"));
        assert_eq!(
            facts.context("django").module_scope.get("monitor"),
            Some(&Supplied::from(true))
        );
    }

    #[test]
    fn test_load_params_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.kdl");
        std::fs::write(&path, "monitor #true\nurl_check \"http://django.example42.com\"").unwrap();

        let params = load_params_file(&path).unwrap();
        assert_eq!(params.get("monitor"), Some(&Supplied::from(true)));
        assert_eq!(
            params.get("url_check"),
            Some(&Supplied::from("http://django.example42.com"))
        );
    }
}
