//! Command implementations for the Webstack CLI.
//!
//! Each command loads its inputs, resolves the module and returns a result
//! that can be printed as JSON or for humans:
//! - `options` - Declared options
//! - `resolve` - Effective configuration with sources
//! - `catalog` - Composed resources
//! - `plan` - Dry-run of the collaborators

use crate::Result;
use crate::catalog::{Catalog, FileContent, Resource, compose};
use crate::cli::InputArgs;
use crate::collaborators::{ApplyReport, DryRun, PlannedAction, apply};
use crate::config::{
    EffectiveConfig, FACT_FQDN, Facts, ModuleDecl, ParameterSet, Resolved, Value, check_params,
    load_params_file, parse_assignment, resolve_all, resolve_option,
};
use serde::Serialize;
use std::fmt::Write as _;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Facts and parameters gathered for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub facts: Facts,
    pub params: ParameterSet,
}

impl Inputs {
    /// Gather facts and parameters from the system facts file and CLI args.
    pub fn load(args: &InputArgs) -> Result<Self> {
        let mut facts = Facts::load_system()?;
        Self::load_with_base(args, &mut facts)?;
        let params = Self::load_params(args)?;
        Ok(Self { facts, params })
    }

    fn load_with_base(args: &InputArgs, facts: &mut Facts) -> Result<()> {
        for path in &args.facts_files {
            facts.merge(Facts::load_file(path)?);
        }
        for assignment in &args.facts {
            let (name, value) = parse_assignment(assignment)?;
            facts.set(name, value);
        }
        if let Some(ref node) = args.node {
            facts.set(FACT_FQDN, node.as_str());
        }
        Ok(())
    }

    fn load_params(args: &InputArgs) -> Result<ParameterSet> {
        let mut params = match args.params_file {
            Some(ref path) => load_params_file(path)?,
            None => ParameterSet::new(),
        };
        for assignment in &args.params {
            let (name, value) = parse_assignment(assignment)?;
            params.insert(name, value);
        }
        Ok(params)
    }

    /// The module declaration for this node.
    pub fn module(&self) -> ModuleDecl {
        ModuleDecl::django(self.facts.operatingsystem().as_deref())
    }

    /// Resolve every option of the module.
    pub fn effective_config(&self) -> Result<EffectiveConfig> {
        let module = self.module();
        let context = self.facts.context(&module.name);
        resolve_all(&module, &self.params, &context)
    }
}

// === options ===

/// One row of `webstack options`.
#[derive(Debug, Serialize)]
pub struct OptionInfo {
    pub name: String,
    pub kind: String,
    pub default: Value,
    pub description: String,
}

/// Result of `webstack options`.
#[derive(Debug, Serialize)]
pub struct OptionsListing {
    pub module: String,
    pub options: Vec<OptionInfo>,
}

impl Output for OptionsListing {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} options ({}):\n", self.module, self.options.len());
        for option in &self.options {
            let _ = writeln!(
                out,
                "  {:<22} {:<28} default: {:<24} {}",
                option.name,
                option.kind,
                display_default(&option.default),
                option.description
            );
        }
        out.trim_end().to_string()
    }
}

fn display_default(value: &Value) -> String {
    match value {
        Value::Str(s) if s.is_empty() => "\"\"".to_string(),
        other => other.to_string(),
    }
}

/// List declared options.
pub fn options(inputs: &Inputs) -> Result<OptionsListing> {
    let module = inputs.module();
    let options = module
        .options()
        .iter()
        .map(|o| OptionInfo {
            name: o.name.to_string(),
            kind: o.kind.to_string(),
            default: o.default.clone(),
            description: o.description.to_string(),
        })
        .collect();
    Ok(OptionsListing {
        module: module.name,
        options,
    })
}

// === resolve ===

/// Result of `webstack resolve`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResolveResult {
    All(EffectiveConfig),
    Single {
        option: String,
        #[serde(flatten)]
        resolved: Resolved<Value>,
    },
}

impl Output for ResolveResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        match self {
            ResolveResult::All(config) => {
                let mut out = format!("{} effective config:\n", config.module());
                for (name, resolved) in config.iter() {
                    let _ = writeln!(
                        out,
                        "  {:<22} = {:<30} [{}]",
                        name,
                        display_default(&resolved.value),
                        resolved.source
                    );
                }
                out.trim_end().to_string()
            }
            ResolveResult::Single { option, resolved } => format!(
                "{} = {} [{}]",
                option,
                display_default(&resolved.value),
                resolved.source
            ),
        }
    }
}

/// Resolve every option, or a single one.
pub fn resolve(inputs: &Inputs, option: Option<&str>) -> Result<ResolveResult> {
    match option {
        None => Ok(ResolveResult::All(inputs.effective_config()?)),
        Some(name) => {
            let module = inputs.module();
            let context = inputs.facts.context(&module.name);
            // Stray parameters are reported even when one option is asked for.
            check_params(&module, &inputs.params)?;
            let resolved = resolve_option(&module, name, &inputs.params, &context)?;
            Ok(ResolveResult::Single {
                option: name.to_string(),
                resolved,
            })
        }
    }
}

// === catalog ===

/// Result of `webstack catalog`.
#[derive(Debug, Serialize)]
pub struct CatalogResult {
    pub module: String,
    #[serde(flatten)]
    pub catalog: Catalog,
}

impl Output for CatalogResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "{} catalog ({} resources):\n",
            self.module,
            self.catalog.len()
        );
        for resource in &self.catalog.resources {
            let _ = writeln!(out, "  {}", resource);
            for line in describe(resource) {
                let _ = writeln!(out, "      {}", line);
            }
        }
        out.trim_end().to_string()
    }
}

fn describe(resource: &Resource) -> Vec<String> {
    match resource {
        Resource::Package(p) => vec![format!("ensure: {}", p.ensure)],
        Resource::File(f) => {
            let mut lines = vec![format!("path: {}", f.path), format!("ensure: {}", f.ensure)];
            if let Some(ref source) = f.source {
                lines.push(format!("source: {}", source));
            }
            match f.content {
                Some(FileContent::Template { ref template, .. }) => {
                    lines.push(format!("template: {}", template))
                }
                Some(FileContent::Inline { .. }) => lines.push("content: inline".to_string()),
                None => {}
            }
            if f.purge {
                lines.push("purge: true".to_string());
            }
            lines
        }
        Resource::Class(_) => Vec::new(),
        Resource::Netinstall(n) => vec![
            format!("url: {}", n.url),
            format!("destination_dir: {}", n.destination_dir),
        ],
        Resource::ArchiveProject(a) => vec![
            format!("source: {}", a.source),
            format!("deploy_root: {}", a.deploy_root),
        ],
        Resource::ToolIntegration(t) => vec![format!("helper: {}", t.helper)],
        Resource::MonitorUrl(m) => vec![
            format!("url: {}", m.url),
            format!("enable: {}", m.enable),
        ],
    }
}

/// Compose the catalog.
pub fn catalog(inputs: &Inputs) -> Result<CatalogResult> {
    let config = inputs.effective_config()?;
    let catalog = compose(&config, &inputs.facts)?;
    Ok(CatalogResult {
        module: config.module().to_string(),
        catalog,
    })
}

// === plan ===

/// Result of `webstack plan`.
#[derive(Debug, Serialize)]
pub struct PlanResult {
    pub module: String,
    pub actions: Vec<PlannedAction>,
    #[serde(flatten)]
    pub report: ApplyReport,
}

impl Output for PlanResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} plan ({} actions):\n", self.module, self.actions.len());
        for action in &self.actions {
            let _ = writeln!(out, "  {}", action);
        }
        for class in &self.report.included_classes {
            let _ = writeln!(out, "  [class] include {}", class);
        }
        out.trim_end().to_string()
    }
}

/// Run the catalog through the dry-run collaborators.
pub fn plan(inputs: &Inputs) -> Result<PlanResult> {
    let CatalogResult { module, catalog } = catalog(inputs)?;
    let mut dry_run = DryRun::new();
    let report = apply(&catalog, &mut dry_run)?;
    Ok(PlanResult {
        module,
        actions: dry_run.into_actions(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    fn args() -> InputArgs {
        InputArgs {
            facts: vec![
                "ipaddress=10.42.42.42".to_string(),
                "operatingsystem=Ubuntu".to_string(),
            ],
            node: Some("rspec.example42.com".to_string()),
            ..Default::default()
        }
    }

    fn inputs(args: &InputArgs) -> Inputs {
        let mut facts = Facts::new();
        Inputs::load_with_base(args, &mut facts).unwrap();
        Inputs {
            facts,
            params: Inputs::load_params(args).unwrap(),
        }
    }

    #[test]
    fn test_node_sets_fqdn() {
        let inputs = inputs(&args());
        assert_eq!(inputs.facts.fqdn().as_deref(), Some("rspec.example42.com"));
    }

    #[test]
    fn test_cli_facts_override_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.kdl");
        std::fs::write(&path, "monitor #true\noperatingsystem \"CentOS\"").unwrap();

        let mut args = args();
        args.facts_files = vec![path];
        let inputs = inputs(&args);

        assert_eq!(inputs.facts.operatingsystem().as_deref(), Some("Ubuntu"));
        assert_eq!(inputs.facts.text("monitor").as_deref(), Some("true"));
    }

    #[test]
    fn test_cli_params_override_params_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.kdl");
        std::fs::write(&path, "monitor #false\nurl_check \"http://a\"").unwrap();

        let mut args = args();
        args.params_file = Some(path);
        args.params = vec!["monitor=true".to_string()];
        let inputs = inputs(&args);

        let config = inputs.effective_config().unwrap();
        assert!(config.bool("monitor").unwrap());
        assert_eq!(config.str("url_check").unwrap(), "http://a");
    }

    #[test]
    fn test_resolve_single_option() {
        let mut args = args();
        args.facts.push("django_monitor=yes".to_string());
        let result = resolve(&inputs(&args), Some("monitor")).unwrap();

        assert_eq!(result.to_human(), "monitor = true [module:django_monitor]");
        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["option"], "monitor");
        assert_eq!(json["value"], true);
        assert_eq!(json["source"]["kind"], "module_scope");
        assert_eq!(json["source"]["variable"], "django_monitor");
    }

    #[test]
    fn test_resolve_single_checks_all_params() {
        let mut args = args();
        args.params = vec!["colour=blue".to_string()];
        let err = resolve(&inputs(&args), Some("monitor")).unwrap_err();
        assert!(matches!(err, Error::UnknownOption(_)));
    }

    #[test]
    fn test_resolve_single_ignores_unrelated_bad_scope() {
        let mut args = args();
        args.facts.push("install=ftp".to_string());
        let inputs = inputs(&args);

        let result = resolve(&inputs, Some("monitor")).unwrap();
        assert_eq!(result.to_human(), "monitor = false [default]");
        assert!(matches!(
            resolve(&inputs, Some("install")),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_catalog_json() {
        let mut args = args();
        args.params = vec![
            "monitor=true".to_string(),
            "url_check=http://django.example42.com".to_string(),
        ];
        let result = catalog(&inputs(&args)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();

        assert_eq!(json["module"], "django");
        let resources = json["resources"].as_array().unwrap();
        assert!(resources
            .iter()
            .any(|r| r["kind"] == "monitor::url" && r["enable"] == true));
    }

    #[test]
    fn test_plan_human() {
        let mut args = args();
        args.params = vec![
            "install=source".to_string(),
            "install_source=http://x/app.tgz".to_string(),
        ];
        let result = plan(&inputs(&args)).unwrap();

        let human = result.to_human();
        assert!(human.contains("[deploy] fetch http://x/app.tgz into /var/www"));
        assert!(!human.contains("[package]"));
    }

    #[test]
    fn test_options_listing() {
        let listing = options(&inputs(&args())).unwrap();
        assert_eq!(listing.module, "django");
        let install = listing
            .options
            .iter()
            .find(|o| o.name == "install")
            .unwrap();
        assert_eq!(install.kind, "enum(package|source|puppi)");
        assert!(listing.to_human().contains("monitor"));
    }
}
