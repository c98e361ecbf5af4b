//! Implementation of `sift config`.

use std::process::ExitCode;

use sift_config::is_global_config;

use crate::cli::context::CommandContext;

/// Shows the config files in use and the effective settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    if config.sources.is_empty() {
        println!("# no configuration files found; showing defaults");
    } else {
        println!("# config files (highest precedence first):");
        for path in &config.sources {
            let scope = if is_global_config(path) { " (global)" } else { "" };
            println!("#   {}{scope}", path.display());
        }
    }
    println!();

    match config.settings_to_toml() {
        Ok(toml) => print!("{toml}"),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }

    if config.fields.is_empty() {
        println!();
        println!("# no fields defined; field modifiers leave queries unscoped");
    }

    ExitCode::SUCCESS
}
