//! Precedence resolution for module options.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Explicit parameters (passed by the caller)
//! 2. Module-scoped variables (`django_monitor`)
//! 3. Node-wide global variables (`monitor`)
//! 4. Static defaults from the option declaration
//!
//! A source only takes part when it mentions the option. An explicit `false`
//! or empty string is a present value and wins over lower sources; a missing
//! entry is the only way a source can be absent.

use crate::config::schema::{CoerceError, ModuleDecl, OptionDecl, Supplied, Value};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variable", rename_all = "snake_case")]
pub enum ValueSource {
    /// Value passed explicitly as a parameter
    Parameter,
    /// Value from a module-scoped variable (holds the variable name)
    ModuleScope(String),
    /// Value from a node-wide variable (holds the variable name)
    GlobalScope(String),
    /// Static default
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Parameter => write!(f, "param"),
            ValueSource::ModuleScope(var) => write!(f, "module:{}", var),
            ValueSource::GlobalScope(var) => write!(f, "global:{}", var),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Parameters passed explicitly by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<String, Supplied>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Supplied>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a parameter in place. Replaces any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Supplied>) {
        self.values.insert(name.into(), value.into());
    }

    /// Merge another set into this one; `other` wins on conflicts.
    pub fn extend(&mut self, other: ParameterSet) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&Supplied> {
        self.values.get(name)
    }

    /// Names of all supplied parameters.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Supplied>> for ParameterSet {
    fn from(values: BTreeMap<String, Supplied>) -> Self {
        Self { values }
    }
}

/// The two variable scopes an option can be looked up in, besides parameters.
///
/// Both scopes are keyed by bare option name. The module prefix is kept only
/// to report which variable a value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Module name used as the variable prefix (e.g. `django`)
    pub module: String,
    /// Module-scoped variables, keyed by option name
    pub module_scope: BTreeMap<String, Supplied>,
    /// Node-wide variables, keyed by option name
    pub global_scope: BTreeMap<String, Supplied>,
}

impl ResolutionContext {
    /// Create an empty context for a module.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    /// Set a module-scoped variable by option name.
    pub fn with_module_var(
        mut self,
        option: impl Into<String>,
        value: impl Into<Supplied>,
    ) -> Self {
        self.module_scope.insert(option.into(), value.into());
        self
    }

    /// Set a node-wide variable by option name.
    pub fn with_global_var(
        mut self,
        option: impl Into<String>,
        value: impl Into<Supplied>,
    ) -> Self {
        self.global_scope.insert(option.into(), value.into());
        self
    }

    fn module_var(&self, option: &str) -> String {
        format!("{}_{}", self.module, option)
    }
}

/// Resolve one option.
///
/// Picks the highest-precedence source that mentions the option, then checks
/// the picked value against the declared kind. Lower sources are never
/// consulted once a higher one is present, even if its value is rejected.
pub fn resolve(
    option: &OptionDecl,
    params: &ParameterSet,
    context: &ResolutionContext,
    static_default: &Value,
) -> Result<Resolved<Value>> {
    let (supplied, source) = if let Some(v) = params.get(option.name) {
        (v, ValueSource::Parameter)
    } else if let Some(v) = context.module_scope.get(option.name) {
        (v, ValueSource::ModuleScope(context.module_var(option.name)))
    } else if let Some(v) = context.global_scope.get(option.name) {
        (v, ValueSource::GlobalScope(option.name.to_string()))
    } else {
        let value = coerce(option, static_default, &ValueSource::Default)?;
        tracing::trace!(option = option.name, source = "default", "resolved option");
        return Ok(Resolved::new(value, ValueSource::Default));
    };

    let value = match supplied {
        Supplied::Null => {
            return Err(Error::AmbiguousAbsence {
                option: option.name.to_string(),
                origin: source.to_string(),
            });
        }
        Supplied::Value(v) => coerce(option, v, &source)?,
    };

    tracing::trace!(option = option.name, source = %source, "resolved option");
    Ok(Resolved::new(value, source))
}

fn coerce(option: &OptionDecl, value: &Value, source: &ValueSource) -> Result<Value> {
    option.kind.coerce(value).map_err(|e| match e {
        CoerceError::Empty => Error::AmbiguousAbsence {
            option: option.name.to_string(),
            origin: source.to_string(),
        },
        CoerceError::Invalid => Error::TypeMismatch {
            option: option.name.to_string(),
            expected: option.kind.to_string(),
            found: value.shape(),
        },
    })
}

/// Resolve one option of a module by name, using its declared default.
pub fn resolve_option(
    module: &ModuleDecl,
    name: &str,
    params: &ParameterSet,
    context: &ResolutionContext,
) -> Result<Resolved<Value>> {
    let option = module
        .option(name)
        .ok_or_else(|| Error::UnknownOption(name.to_string()))?;
    resolve(option, params, context, &option.default)
}

/// Check that every parameter names an option the module declares.
pub fn check_params(module: &ModuleDecl, params: &ParameterSet) -> Result<()> {
    match params.names().find(|n| module.option(n).is_none()) {
        Some(unknown) => Err(Error::UnknownOption(unknown.to_string())),
        None => Ok(()),
    }
}

/// Resolve every declared option of a module.
///
/// Fails with [`Error::UnknownOption`] if a parameter names an option the
/// module does not declare. Scopes may carry unrelated variables.
pub fn resolve_all(
    module: &ModuleDecl,
    params: &ParameterSet,
    context: &ResolutionContext,
) -> Result<EffectiveConfig> {
    check_params(module, params)?;

    let mut values = BTreeMap::new();
    for option in module.options() {
        let resolved = resolve(option, params, context, &option.default)?;
        values.insert(option.name.to_string(), resolved);
    }

    tracing::debug!(
        module = %module.name,
        options = values.len(),
        "resolved effective config"
    );

    Ok(EffectiveConfig {
        module: module.name.clone(),
        values,
    })
}

/// Fully resolved module configuration with source tracking.
///
/// Built once by [`resolve_all`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    module: String,
    values: BTreeMap<String, Resolved<Value>>,
}

impl EffectiveConfig {
    /// Name of the module this config was resolved for.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Get a resolved option.
    pub fn get(&self, name: &str) -> Result<&Resolved<Value>> {
        self.values
            .get(name)
            .ok_or_else(|| Error::UnknownOption(name.to_string()))
    }

    /// Get a boolean option.
    pub fn bool(&self, name: &str) -> Result<bool> {
        let resolved = self.get(name)?;
        resolved
            .value
            .as_bool()
            .ok_or_else(|| self.mismatch(name, "boolean", &resolved.value))
    }

    /// Get a string or enum option.
    pub fn str(&self, name: &str) -> Result<&str> {
        let resolved = self.get(name)?;
        resolved
            .value
            .as_str()
            .ok_or_else(|| self.mismatch(name, "string", &resolved.value))
    }

    /// Get a map option.
    pub fn map(&self, name: &str) -> Result<&BTreeMap<String, String>> {
        let resolved = self.get(name)?;
        resolved
            .value
            .as_map()
            .ok_or_else(|| self.mismatch(name, "map", &resolved.value))
    }

    /// Where an option's value came from.
    pub fn source(&self, name: &str) -> Result<&ValueSource> {
        self.get(name).map(|r| &r.source)
    }

    /// All resolved options, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved<Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn mismatch(&self, name: &str, expected: &str, value: &Value) -> Error {
        Error::TypeMismatch {
            option: name.to_string(),
            expected: expected.to_string(),
            found: value.shape(),
        }
    }
}
