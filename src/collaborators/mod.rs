//! Seams to the external services a catalog is realized by.
//!
//! Each service gets the resource exactly as composed. [`apply`] walks a
//! catalog in order and stops at the first collaborator error.
//!
//! [`DryRun`] implements every service by recording what it was asked to do.

use crate::Result;
use crate::catalog::{
    ArchiveProject, Catalog, ManagedFile, MonitorUrl, Netinstall, Package, Resource,
    ToolIntegration,
};
use serde::Serialize;

/// Installs or removes packages.
pub trait PackageService {
    fn ensure_package(&mut self, package: &Package) -> Result<()>;
}

/// Writes, sources or removes files and directories.
pub trait FileService {
    fn materialize(&mut self, file: &ManagedFile) -> Result<()>;
}

/// Enables or disables URL checks.
pub trait MonitorService {
    fn register_url(&mut self, check: &MonitorUrl) -> Result<()>;
}

/// Stages application code and registers with the deployment tool.
pub trait DeployService {
    fn stage_netinstall(&mut self, install: &Netinstall) -> Result<()>;
    fn stage_archive(&mut self, project: &ArchiveProject) -> Result<()>;
    fn register_integration(&mut self, integration: &ToolIntegration) -> Result<()>;
}

/// Everything [`apply`] needs.
pub trait Collaborators: PackageService + FileService + MonitorService + DeployService {}

impl<T: PackageService + FileService + MonitorService + DeployService> Collaborators for T {}

/// Outcome of applying a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Resources handed to a collaborator
    pub applied: usize,
    /// Class includes; no collaborator handles them
    pub included_classes: Vec<String>,
}

/// Hand every resource of a catalog to its collaborator.
pub fn apply<C: Collaborators + ?Sized>(
    catalog: &Catalog,
    services: &mut C,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for resource in &catalog.resources {
        match resource {
            Resource::Package(p) => services.ensure_package(p)?,
            Resource::File(f) => services.materialize(f)?,
            Resource::MonitorUrl(m) => services.register_url(m)?,
            Resource::Netinstall(n) => services.stage_netinstall(n)?,
            Resource::ArchiveProject(a) => services.stage_archive(a)?,
            Resource::ToolIntegration(t) => services.register_integration(t)?,
            Resource::Class(c) => {
                tracing::debug!(class = %c.name, "class include has no collaborator");
                report.included_classes.push(c.name.clone());
                continue;
            }
        }
        report.applied += 1;
    }

    Ok(report)
}

/// One call recorded by [`DryRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    /// Service that would act (`package`, `file`, `monitor`, `deploy`)
    pub service: &'static str,
    /// What it would do
    pub action: String,
    /// What it would act on
    pub target: String,
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} {}", self.service, self.action, self.target)
    }
}

/// Collaborator set that only records and logs what it is asked to do.
#[derive(Debug, Clone, Default)]
pub struct DryRun {
    actions: Vec<PlannedAction>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded actions, in call order.
    pub fn actions(&self) -> &[PlannedAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<PlannedAction> {
        self.actions
    }

    fn record(&mut self, service: &'static str, action: String, target: String) {
        tracing::info!(service, %action, %target, "planned");
        self.actions.push(PlannedAction {
            service,
            action,
            target,
        });
    }
}

impl PackageService for DryRun {
    fn ensure_package(&mut self, package: &Package) -> Result<()> {
        let action = match package.ensure.as_str() {
            "absent" => "remove".to_string(),
            "present" => "install".to_string(),
            version => format!("install {}", version),
        };
        self.record("package", action, package.name.clone());
        Ok(())
    }
}

impl FileService for DryRun {
    fn materialize(&mut self, file: &ManagedFile) -> Result<()> {
        let mut action = match file.ensure.as_str() {
            "absent" => "remove".to_string(),
            "directory" => "sync directory".to_string(),
            _ => "write".to_string(),
        };
        if file.ensure != "absent" {
            if let Some(ref source) = file.source {
                action.push_str(&format!(" from {}", source));
            }
            if file.purge {
                action.push_str(" (purge)");
            }
        }
        if file.noop {
            action.push_str(" (audit only)");
        }
        self.record("file", action, file.path.clone());
        Ok(())
    }
}

impl MonitorService for DryRun {
    fn register_url(&mut self, check: &MonitorUrl) -> Result<()> {
        let action = if check.enable {
            "enable url check"
        } else {
            "disable url check"
        };
        self.record("monitor", action.to_string(), check.url.clone());
        Ok(())
    }
}

impl DeployService for DryRun {
    fn stage_netinstall(&mut self, install: &Netinstall) -> Result<()> {
        self.record(
            "deploy",
            format!("fetch {} into", install.url),
            install.destination_dir.clone(),
        );
        Ok(())
    }

    fn stage_archive(&mut self, project: &ArchiveProject) -> Result<()> {
        let action = if project.enable {
            format!("register archive project {} at", project.title)
        } else {
            format!("remove archive project {} at", project.title)
        };
        self.record("deploy", action, project.deploy_root.clone());
        Ok(())
    }

    fn register_integration(&mut self, integration: &ToolIntegration) -> Result<()> {
        self.record(
            "deploy",
            format!("register helper {} for", integration.helper),
            integration.title.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::catalog::compose;
    use crate::config::{Facts, ModuleDecl, ParameterSet, resolve_all};

    fn catalog_for(params: ParameterSet) -> Catalog {
        let facts = Facts::new()
            .with("ipaddress", "10.42.42.42")
            .with("operatingsystem", "Ubuntu");
        let module = ModuleDecl::django(facts.operatingsystem().as_deref());
        let config = resolve_all(&module, &params, &facts.context(&module.name)).unwrap();
        compose(&config, &facts).unwrap()
    }

    #[test]
    fn test_dry_run_standard_install() {
        let catalog = catalog_for(ParameterSet::new());
        let mut dry_run = DryRun::new();

        let report = apply(&catalog, &mut dry_run).unwrap();

        assert_eq!(report.applied, 2);
        let actions = dry_run.actions();
        assert_eq!(actions[0].service, "package");
        assert_eq!(actions[0].action, "install");
        assert_eq!(actions[0].target, "django");
        assert_eq!(actions[1].service, "file");
        assert_eq!(actions[1].target, "/etc/django/django.conf");
    }

    #[test]
    fn test_dry_run_decommission() {
        let params = ParameterSet::new()
            .with("absent", true)
            .with("monitor", true)
            .with("url_check", "http://django.example42.com");
        let mut dry_run = DryRun::new();
        apply(&catalog_for(params), &mut dry_run).unwrap();

        let actions: Vec<String> = dry_run.actions().iter().map(|a| a.to_string()).collect();
        assert!(actions.contains(&"[package] remove django".to_string()));
        assert!(actions.contains(&"[file] remove /etc/django/django.conf".to_string()));
        assert!(
            actions.contains(&"[monitor] disable url check http://django.example42.com".to_string())
        );
    }

    #[test]
    fn test_dry_run_deploy_stages() {
        let params = ParameterSet::new()
            .with("install", "puppi")
            .with("install_source", "http://x/app.tar.gz")
            .with("puppi", true)
            .with("puppi_helper", "myhelper");
        let mut dry_run = DryRun::new();
        apply(&catalog_for(params), &mut dry_run).unwrap();

        let actions: Vec<String> = dry_run.actions().iter().map(|a| a.to_string()).collect();
        assert!(
            actions.contains(&"[deploy] register archive project django at /var/www".to_string())
        );
        assert!(actions.contains(&"[deploy] register helper myhelper for django".to_string()));
        assert!(!actions.iter().any(|a| a.starts_with("[package]")));
    }

    #[test]
    fn test_class_includes_are_reported_not_applied() {
        let params = ParameterSet::new().with("my_class", "django::spec");
        let mut dry_run = DryRun::new();
        let report = apply(&catalog_for(params), &mut dry_run).unwrap();

        assert_eq!(report.included_classes, vec!["django::spec".to_string()]);
        assert_eq!(report.applied, dry_run.actions().len());
    }

    struct FailingFiles {
        packages: usize,
    }

    impl PackageService for FailingFiles {
        fn ensure_package(&mut self, _: &Package) -> Result<()> {
            self.packages += 1;
            Ok(())
        }
    }

    impl FileService for FailingFiles {
        fn materialize(&mut self, file: &ManagedFile) -> Result<()> {
            Err(Error::Collaborator(format!("cannot write {}", file.path)))
        }
    }

    impl MonitorService for FailingFiles {
        fn register_url(&mut self, _: &MonitorUrl) -> Result<()> {
            Ok(())
        }
    }

    impl DeployService for FailingFiles {
        fn stage_netinstall(&mut self, _: &Netinstall) -> Result<()> {
            Ok(())
        }
        fn stage_archive(&mut self, _: &ArchiveProject) -> Result<()> {
            Ok(())
        }
        fn register_integration(&mut self, _: &ToolIntegration) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_apply_stops_at_collaborator_error() {
        let mut services = FailingFiles { packages: 0 };
        let err = apply(&catalog_for(ParameterSet::new()), &mut services).unwrap_err();

        assert!(matches!(err, Error::Collaborator(_)));
        assert!(err.to_string().contains("/etc/django/django.conf"));
        assert_eq!(services.packages, 1);
    }
}
