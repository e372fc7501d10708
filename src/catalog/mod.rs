//! Resource catalog composed from an [`EffectiveConfig`](crate::config::EffectiveConfig).
//!
//! A catalog is the ordered list of resources the external collaborators are
//! asked to realize. Resources only carry resolved values; nothing here knows
//! how a package is installed or a template rendered.
//!
//! | Kind                      | Title              | Present when                         |
//! |---------------------------|--------------------|--------------------------------------|
//! | `package`                 | `<package>`        | `install == package`                 |
//! | `file`                    | `django.conf`      | always                               |
//! | `file`                    | `django.dir`       | `source_dir` set                     |
//! | `class`                   | `<my_class>`       | `my_class` set                       |
//! | `puppi::netinstall`       | `netinstall_django`| `install == source`                  |
//! | `puppi::project::archive` | `django`           | `install == puppi`                   |
//! | `puppi::ze`               | `django`           | `puppi`                              |
//! | `monitor::url`            | `django_url`       | `monitor` and `url_check` set        |
//! | `file`                    | `debug_django`     | `debug`                              |

pub mod compose;

pub use compose::compose;

use serde::Serialize;
use std::collections::BTreeMap;

/// A package to install or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    /// Version, `present` or `absent`
    pub ensure: String,
    pub noop: bool,
}

/// Content of a managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileContent {
    /// Render `template` with `variables`
    Template {
        template: String,
        variables: BTreeMap<String, String>,
    },
    /// Literal content
    Inline { text: String },
}

/// A file or directory to materialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedFile {
    pub title: String,
    pub path: String,
    /// `present`, `file`, `directory` or `absent`
    pub ensure: String,
    pub mode: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub source: Option<String>,
    pub content: Option<FileContent>,
    pub recurse: bool,
    pub purge: bool,
    pub force: bool,
    pub audit: Option<String>,
    pub noop: bool,
}

impl ManagedFile {
    fn new(title: impl Into<String>, path: impl Into<String>, ensure: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            ensure: ensure.into(),
            mode: None,
            owner: None,
            group: None,
            source: None,
            content: None,
            recurse: false,
            purge: false,
            force: false,
            audit: None,
            noop: false,
        }
    }
}

/// A class to include alongside the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInclude {
    pub name: String,
}

/// Fetch and unpack an application source into a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Netinstall {
    pub title: String,
    pub url: String,
    pub destination_dir: String,
}

/// Register an archive deployment project with the deployment tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveProject {
    pub title: String,
    pub source: String,
    pub deploy_root: String,
    pub user: String,
    pub auto_deploy: bool,
    pub enable: bool,
}

/// Register the module with the deployment tool's info/check helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolIntegration {
    pub title: String,
    pub helper: String,
    pub variables: BTreeMap<String, String>,
}

/// A URL check for the monitoring system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorUrl {
    pub title: String,
    pub url: String,
    pub pattern: String,
    pub port: u16,
    pub target: String,
    pub tool: String,
    pub enable: bool,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Resource {
    #[serde(rename = "package")]
    Package(Package),
    #[serde(rename = "file")]
    File(ManagedFile),
    #[serde(rename = "class")]
    Class(ClassInclude),
    #[serde(rename = "puppi::netinstall")]
    Netinstall(Netinstall),
    #[serde(rename = "puppi::project::archive")]
    ArchiveProject(ArchiveProject),
    #[serde(rename = "puppi::ze")]
    ToolIntegration(ToolIntegration),
    #[serde(rename = "monitor::url")]
    MonitorUrl(MonitorUrl),
}

impl Resource {
    /// Resource type name, as shown in catalogs.
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Package(_) => "package",
            Resource::File(_) => "file",
            Resource::Class(_) => "class",
            Resource::Netinstall(_) => "puppi::netinstall",
            Resource::ArchiveProject(_) => "puppi::project::archive",
            Resource::ToolIntegration(_) => "puppi::ze",
            Resource::MonitorUrl(_) => "monitor::url",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Resource::Package(p) => &p.name,
            Resource::File(f) => &f.title,
            Resource::Class(c) => &c.name,
            Resource::Netinstall(n) => &n.title,
            Resource::ArchiveProject(a) => &a.title,
            Resource::ToolIntegration(t) => &t.title,
            Resource::MonitorUrl(m) => &m.title,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind(), self.title())
    }
}

/// Ordered list of resources for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub resources: Vec<Resource>,
}

impl Catalog {
    /// Find a resource by kind and title.
    pub fn resource(&self, kind: &str, title: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.kind() == kind && r.title() == title)
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        match self.resource("package", name)? {
            Resource::Package(p) => Some(p),
            _ => None,
        }
    }

    pub fn file(&self, title: &str) -> Option<&ManagedFile> {
        match self.resource("file", title)? {
            Resource::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn monitor_url(&self, title: &str) -> Option<&MonitorUrl> {
        match self.resource("monitor::url", title)? {
            Resource::MonitorUrl(m) => Some(m),
            _ => None,
        }
    }

    pub fn netinstall(&self, title: &str) -> Option<&Netinstall> {
        match self.resource("puppi::netinstall", title)? {
            Resource::Netinstall(n) => Some(n),
            _ => None,
        }
    }

    pub fn archive_project(&self, title: &str) -> Option<&ArchiveProject> {
        match self.resource("puppi::project::archive", title)? {
            Resource::ArchiveProject(a) => Some(a),
            _ => None,
        }
    }

    pub fn tool_integration(&self, title: &str) -> Option<&ToolIntegration> {
        match self.resource("puppi::ze", title)? {
            Resource::ToolIntegration(t) => Some(t),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }
}
