//! Option declarations for the django module.
//!
//! This module provides:
//! - [`Value`], the typed value every source resolves to
//! - [`Supplied`], what a single source carries for an option
//! - [`OptionKind`] and [`OptionDecl`], the declared shape of each option
//! - [`ModuleDecl`], the full option table including OS-dependent defaults

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the managed module. Also the prefix of module-scoped variables.
pub const DJANGO_MODULE: &str = "django";

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Str(String),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// Short name of the value's shape, used in mismatch errors.
    pub fn shape(&self) -> String {
        match self {
            Value::Bool(b) => format!("boolean {}", b),
            Value::Str(s) => format!("string {:?}", s),
            Value::Map(_) => "map".to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(m: BTreeMap<String, String>) -> Self {
        Value::Map(m)
    }
}

/// What one source carries for an option it mentions.
///
/// A source that does not mention an option has no entry at all; that is the
/// only way to express absence. `Null` is an explicit null from a facts or
/// parameters file and is never treated as absent or false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supplied {
    Value(Value),
    Null,
}

impl<T: Into<Value>> From<T> for Supplied {
    fn from(v: T) -> Self {
        Supplied::Value(v.into())
    }
}

/// Why a supplied value failed to coerce to its declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    /// Empty where empty cannot mean anything but "unset".
    Empty,
    /// Wrong shape or out-of-range value.
    Invalid,
}

/// Declared type of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Boolean,
    String,
    Enum(&'static [&'static str]),
    Map,
}

impl OptionKind {
    /// Coerce a supplied value to this kind.
    ///
    /// Strings are accepted for booleans (`true`/`false`/`yes`/`no`/`y`/`n`/`1`/`0`),
    /// enums (one of the variants) and maps (a JSON object of strings).
    pub fn coerce(&self, value: &Value) -> Result<Value, CoerceError> {
        match (self, value) {
            (OptionKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (OptionKind::Boolean, Value::Str(s)) => parse_bool(s).map(Value::Bool),
            (OptionKind::String, Value::Str(_)) => Ok(value.clone()),
            (OptionKind::Enum(variants), Value::Str(s)) => {
                if s.is_empty() {
                    Err(CoerceError::Empty)
                } else if variants.contains(&s.as_str()) {
                    Ok(value.clone())
                } else {
                    Err(CoerceError::Invalid)
                }
            }
            (OptionKind::Map, Value::Map(_)) => Ok(value.clone()),
            (OptionKind::Map, Value::Str(s)) => {
                serde_json::from_str::<BTreeMap<String, String>>(s)
                    .map(Value::Map)
                    .map_err(|_| CoerceError::Invalid)
            }
            _ => Err(CoerceError::Invalid),
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, CoerceError> {
    match s.trim().to_lowercase().as_str() {
        "" => Err(CoerceError::Empty),
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(CoerceError::Invalid),
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Boolean => write!(f, "boolean"),
            OptionKind::String => write!(f, "string"),
            OptionKind::Enum(variants) => write!(f, "enum({})", variants.join("|")),
            OptionKind::Map => write!(f, "map"),
        }
    }
}

/// Variants of the `install` option.
pub const INSTALL_METHODS: &[&str] = &["package", "source", "puppi"];

/// Variants of the `web_server` option.
pub const WEB_SERVERS: &[&str] = &["apache", "nginx", "none"];

/// A declared option: name, kind and static default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: Value,
    pub description: &'static str,
}

impl OptionDecl {
    fn new(
        name: &'static str,
        kind: OptionKind,
        default: impl Into<Value>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            default: default.into(),
            description,
        }
    }
}

/// The option table of a module.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// Module name, used as the `<name>_` prefix of module-scoped variables
    pub name: String,
    options: Vec<OptionDecl>,
}

impl ModuleDecl {
    /// The django module, with OS-dependent defaults picked from the
    /// `operatingsystem` fact.
    pub fn django(operatingsystem: Option<&str>) -> Self {
        use OptionKind::*;

        let options = vec![
            OptionDecl::new("my_class", String, "", "Custom class to include"),
            OptionDecl::new("source", String, "", "Source URL of the main config file"),
            OptionDecl::new("source_dir", String, "", "Source URL of the whole config dir"),
            OptionDecl::new(
                "source_dir_purge",
                Boolean,
                false,
                "Purge unmanaged files in config dir",
            ),
            OptionDecl::new("template", String, "", "Template for the main config file"),
            OptionDecl::new(
                "options",
                Map,
                Value::Map(BTreeMap::new()),
                "Custom options passed to the template",
            ),
            OptionDecl::new("version", String, "present", "Package version or ensure value"),
            OptionDecl::new("absent", Boolean, false, "Decommission the module"),
            OptionDecl::new("monitor", Boolean, false, "Register a URL check"),
            OptionDecl::new("monitor_tool", String, "", "Monitoring tool to register with"),
            OptionDecl::new("url_check", String, "", "URL to check when monitoring"),
            OptionDecl::new("url_pattern", String, "Django", "Pattern expected in the checked URL"),
            OptionDecl::new("puppi", Boolean, false, "Enable deployment tool integration"),
            OptionDecl::new("puppi_helper", String, "standard", "Deployment tool helper"),
            OptionDecl::new("debug", Boolean, false, "Write a debug dump of the effective config"),
            OptionDecl::new(
                "audit_only",
                Boolean,
                false,
                "Audit config files without changing them",
            ),
            OptionDecl::new("install", Enum(INSTALL_METHODS), "package", "Installation method"),
            OptionDecl::new(
                "install_source",
                String,
                "",
                "URL of the source or archive to install",
            ),
            OptionDecl::new(
                "install_destination",
                String,
                default_install_destination(operatingsystem),
                "Directory a source or archive install is deployed to",
            ),
            OptionDecl::new(
                "web_server",
                Enum(WEB_SERVERS),
                "apache",
                "Web server fronting the application",
            ),
            OptionDecl::new("package", String, "django", "Package name"),
            OptionDecl::new("config_dir", String, "/etc/django", "Configuration directory"),
            OptionDecl::new(
                "config_file",
                String,
                "/etc/django/django.conf",
                "Main configuration file",
            ),
            OptionDecl::new("config_file_mode", String, "0644", "Main configuration file mode"),
            OptionDecl::new("config_file_owner", String, "root", "Main configuration file owner"),
            OptionDecl::new("config_file_group", String, "root", "Main configuration file group"),
        ];

        Self {
            name: DJANGO_MODULE.to_string(),
            options,
        }
    }

    /// Look up an option declaration by name.
    pub fn option(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.name == name)
    }

    /// All declared options, in declaration order.
    pub fn options(&self) -> &[OptionDecl] {
        &self.options
    }

    /// Name of the module-scoped variable for an option (e.g. `django_monitor`).
    pub fn module_var(&self, option: &str) -> String {
        format!("{}_{}", self.name, option)
    }
}

/// Default deployment root for source and archive installs.
pub fn default_install_destination(operatingsystem: Option<&str>) -> &'static str {
    let os = operatingsystem.unwrap_or_default().to_lowercase();
    match os.as_str() {
        "debian" | "ubuntu" | "mint" => "/var/www",
        "redhat" | "centos" | "scientific" | "fedora" | "amazon" => "/var/www/html",
        "sles" | "opensuse" | "suse" => "/srv/www/htdocs",
        _ => "/var/www",
    }
}
