//! Catalog composition.
//!
//! Reads only from the [`EffectiveConfig`] and the node facts; every
//! resolved value is passed through unchanged.

use crate::Result;
use crate::catalog::{
    ArchiveProject, Catalog, ClassInclude, FileContent, ManagedFile, MonitorUrl, Netinstall,
    Package, Resource, ToolIntegration,
};
use crate::config::{EffectiveConfig, Facts};
use std::collections::BTreeMap;

/// Port checked by the URL monitor.
pub const MONITOR_PORT: u16 = 80;

/// Directory the debug dump is written to.
pub const DEBUG_DIR: &str = "/var/tmp";

/// Values derived from the effective config and shared by several resources.
struct Manage {
    package_ensure: String,
    file_ensure: &'static str,
    dir_ensure: &'static str,
    enabled: bool,
    audit: Option<String>,
    noop: bool,
}

impl Manage {
    fn from_config(config: &EffectiveConfig) -> Result<Self> {
        let absent = config.bool("absent")?;
        let audit_only = config.bool("audit_only")?;

        Ok(Self {
            package_ensure: if absent {
                "absent".to_string()
            } else {
                config.str("version")?.to_string()
            },
            file_ensure: if absent { "absent" } else { "present" },
            dir_ensure: if absent { "absent" } else { "directory" },
            enabled: !absent,
            audit: audit_only.then(|| "content".to_string()),
            noop: audit_only,
        })
    }
}

/// Compose the catalog for a resolved module.
pub fn compose(config: &EffectiveConfig, facts: &Facts) -> Result<Catalog> {
    let module = config.module();
    let manage = Manage::from_config(config)?;
    let install = config.str("install")?;
    let mut catalog = Catalog::default();

    if install == "package" {
        catalog.push(Resource::Package(Package {
            name: config.str("package")?.to_string(),
            ensure: manage.package_ensure.clone(),
            noop: manage.noop,
        }));
    }

    catalog.push(Resource::File(config_file(config, facts, &manage)?));

    let source_dir = config.str("source_dir")?;
    if !source_dir.is_empty() {
        let purge = config.bool("source_dir_purge")?;
        let mut dir = ManagedFile::new(
            format!("{}.dir", module),
            config.str("config_dir")?,
            manage.dir_ensure,
        );
        dir.source = Some(source_dir.to_string());
        dir.recurse = true;
        dir.purge = purge;
        dir.force = purge;
        dir.audit = manage.audit.clone();
        dir.noop = manage.noop;
        catalog.push(Resource::File(dir));
    }

    let my_class = config.str("my_class")?;
    if !my_class.is_empty() {
        catalog.push(Resource::Class(ClassInclude {
            name: my_class.to_string(),
        }));
    }

    match install {
        "source" => catalog.push(Resource::Netinstall(Netinstall {
            title: format!("netinstall_{}", module),
            url: config.str("install_source")?.to_string(),
            destination_dir: config.str("install_destination")?.to_string(),
        })),
        "puppi" => catalog.push(Resource::ArchiveProject(ArchiveProject {
            title: module.to_string(),
            source: config.str("install_source")?.to_string(),
            deploy_root: config.str("install_destination")?.to_string(),
            user: "root".to_string(),
            auto_deploy: true,
            enable: manage.enabled,
        })),
        _ => {}
    }

    if config.bool("puppi")? {
        catalog.push(Resource::ToolIntegration(ToolIntegration {
            title: module.to_string(),
            helper: config.str("puppi_helper")?.to_string(),
            variables: config_as_text(config),
        }));
    }

    let url_check = config.str("url_check")?;
    if config.bool("monitor")? && !url_check.is_empty() {
        catalog.push(Resource::MonitorUrl(MonitorUrl {
            title: format!("{}_url", module),
            url: url_check.to_string(),
            pattern: config.str("url_pattern")?.to_string(),
            port: MONITOR_PORT,
            target: facts.ipaddress().unwrap_or_default(),
            tool: config.str("monitor_tool")?.to_string(),
            enable: manage.enabled,
        }));
    }

    if config.bool("debug")? {
        let mut dump = ManagedFile::new(
            format!("debug_{}", module),
            format!("{}/puppet_debug_{}", DEBUG_DIR, module),
            if manage.enabled { "file" } else { "absent" },
        );
        dump.mode = Some("0640".to_string());
        dump.owner = Some("root".to_string());
        dump.group = Some("root".to_string());
        dump.content = Some(FileContent::Inline {
            text: serde_json::to_string_pretty(config)?,
        });
        catalog.push(Resource::File(dump));
    }

    tracing::debug!(module, resources = catalog.len(), "composed catalog");
    Ok(catalog)
}

fn config_file(config: &EffectiveConfig, facts: &Facts, manage: &Manage) -> Result<ManagedFile> {
    let mut file = ManagedFile::new(
        format!("{}.conf", config.module()),
        config.str("config_file")?,
        manage.file_ensure,
    );
    file.mode = Some(config.str("config_file_mode")?.to_string());
    file.owner = Some(config.str("config_file_owner")?.to_string());
    file.group = Some(config.str("config_file_group")?.to_string());
    file.audit = manage.audit.clone();
    file.noop = manage.noop;

    let source = config.str("source")?;
    if !source.is_empty() {
        file.source = Some(source.to_string());
    }

    let template = config.str("template")?;
    if !template.is_empty() {
        file.content = Some(FileContent::Template {
            template: template.to_string(),
            variables: template_variables(config, facts)?,
        });
    }

    Ok(file)
}

/// Variables handed to the template renderer: node identity plus custom options.
fn template_variables(config: &EffectiveConfig, facts: &Facts) -> Result<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    if let Some(fqdn) = facts.fqdn() {
        vars.insert("fqdn".to_string(), fqdn);
    }
    if let Some(ip) = facts.ipaddress() {
        vars.insert("ipaddress".to_string(), ip);
    }
    if let Some(os) = facts.operatingsystem() {
        vars.insert("operatingsystem".to_string(), os);
    }
    for (key, value) in config.map("options")? {
        vars.insert(key.clone(), value.clone());
    }
    Ok(vars)
}

fn config_as_text(config: &EffectiveConfig) -> BTreeMap<String, String> {
    config
        .iter()
        .map(|(name, resolved)| (name.to_string(), resolved.value.to_string()))
        .collect()
}
