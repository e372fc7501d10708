//! CLI argument definitions for Webstack.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Version string shown by `--version`, with build information.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("WEBSTACK_GIT_COMMIT"),
    " ",
    env!("WEBSTACK_BUILD_TIMESTAMP"),
    ")"
);

/// Webstack - resolve and compose the django web application stack.
///
/// Start with `webstack options` to see what can be set, then `webstack resolve`
/// to see where each effective value comes from.
#[derive(Parser, Debug)]
#[command(name = "webstack")]
#[command(author, version = LONG_VERSION, long_about = None)]
#[command(about = "Resolve configuration and compose resources for a web application stack")]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    #[command(flatten)]
    pub inputs: InputArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where facts and parameters come from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Node name; sets the `fqdn` fact
    #[arg(long, global = true, env = "WEBSTACK_NODE")]
    pub node: Option<String>,

    /// KDL file with node facts (repeatable, later files win)
    #[arg(long = "facts", value_name = "FILE", global = true)]
    pub facts_files: Vec<PathBuf>,

    /// Set a node fact (repeatable)
    #[arg(long = "fact", value_name = "NAME=VALUE", global = true)]
    pub facts: Vec<String>,

    /// KDL file with explicit module parameters
    #[arg(long = "params", value_name = "FILE", global = true)]
    pub params_file: Option<PathBuf>,

    /// Set an explicit module parameter (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", global = true)]
    pub params: Vec<String>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List declared options with their kind and default
    Options,

    /// Show the effective configuration and where each value came from
    Resolve {
        /// Resolve a single option instead of all of them
        option: Option<String>,
    },

    /// Show the resources composed from the effective configuration
    Catalog,

    /// Show what the collaborators would be asked to do
    Plan,
}
