//! Webstack CLI - resolve configuration and compose resources for a web application stack.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use webstack::cli::{Cli, Commands};
use webstack::commands::{self, Inputs, Output};

/// Environment variable holding the log filter (e.g. `debug`, `webstack=trace`).
const LOG_ENV: &str = "WEBSTACK_LOG";

/// Set to `json` for JSON log lines.
const LOG_FORMAT_ENV: &str = "WEBSTACK_LOG_FORMAT";

fn main() {
    init_logging();

    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Err(e) = run_command(cli, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn run_command(cli: Cli, human: bool) -> Result<(), webstack::Error> {
    let inputs = Inputs::load(&cli.inputs)?;
    tracing::debug!(command = ?cli.command, "running command");

    match cli.command {
        Commands::Options => output(&commands::options(&inputs)?, human),
        Commands::Resolve { option } => {
            output(&commands::resolve(&inputs, option.as_deref())?, human)
        }
        Commands::Catalog => output(&commands::catalog(&inputs)?, human),
        Commands::Plan => output(&commands::plan(&inputs)?, human),
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
