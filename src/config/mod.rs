//! Option declarations, node facts and parameter resolution.
//!
//! ## facts.kdl - Node variables
//!
//! Located at:
//! - System: `~/.config/webstack/facts.kdl` (or `$WEBSTACK_CONFIG_DIR/facts.kdl`)
//! - Per invocation: `--facts <file>` and `--fact name=value`
//!
//! Facts named after an option (`monitor`) are node-wide; facts prefixed with
//! the module name (`django_monitor`) are module-scoped.
//!
//! ## params.kdl - Explicit parameters
//!
//! Passed with `--params <file>` and `--param name=value`. Same schema as
//! facts. Parameters must name declared options.
//!
//! ## Precedence
//!
//! For options: parameter > module-scoped fact > node-wide fact > static default
//! For facts: CLI flag > `--facts` files > system facts file
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod facts;
pub mod kdl;
pub mod resolver;
pub mod schema;

pub use facts::{
    CONFIG_DIR_ENV, FACT_FQDN, FACT_IPADDRESS, FACT_OPERATINGSYSTEM, Facts, load_params_file,
    parse_assignment,
};
pub use resolver::{
    EffectiveConfig, ParameterSet, ResolutionContext, Resolved, ValueSource, check_params, resolve,
    resolve_all, resolve_option,
};
pub use schema::{DJANGO_MODULE, ModuleDecl, OptionDecl, OptionKind, Supplied, Value};
