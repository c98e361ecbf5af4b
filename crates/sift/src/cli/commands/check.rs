//! Implementation of `sift check`.

use std::process::ExitCode;

use sift_config::{ConfigWarning, discover_configs, merge_configs};

use crate::cli::context::CommandContext;

/// Exit codes for `sift check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Configuration is valid with no warnings.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// Configuration has warnings but is usable.
    pub const WARNINGS: ExitCode = ExitCode::FAILURE;
    /// Configuration has errors and cannot be used.
    pub const ERROR: ExitCode = ExitCode::FAILURE;
}

/// Validates configuration and reports warnings with hints.
pub fn run(ctx: &CommandContext) -> ExitCode {
    println!("Checking configuration...");
    println!();

    let config_files = match discover_configs(&ctx.cwd) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("error: {e}");
            return exit_codes::ERROR;
        }
    };

    if config_files.is_empty() {
        println!("No configuration files found.");
        println!();
        println!("Run 'sift init' to create a configuration file.");
        return exit_codes::OK;
    }

    println!("Config files:");
    for file in &config_files {
        let marker = if file.is_root() { " (root)" } else { "" };
        println!("  {}{marker}", file.path.display());
    }
    println!();

    let config = match merge_configs(&config_files) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return exit_codes::ERROR;
        }
    };

    println!("Fields:");
    if config.fields.is_empty() {
        println!("  (none defined)");
    } else {
        for (name, bit) in &config.fields {
            println!("  {name} -> bit {bit}");
        }
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return exit_codes::OK;
    }

    println!("Warnings ({}):", warnings.len());
    for warning in &warnings {
        println!("  - {warning}");
    }
    println!();

    print_hints(&warnings);

    exit_codes::WARNINGS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|warning| match warning {
            ConfigWarning::NoFieldsDefined => {
                "Add a [fields] table mapping field names to bits, e.g. title = 0."
            }
            ConfigWarning::BitOutOfRange { .. } => "Field bits must be between 0 and 63.",
            ConfigWarning::DuplicateBit { .. } => {
                "Give every field its own bit; closer config files override farther ones by name."
            }
        })
        .collect();

    hints.sort_unstable();
    hints.dedup();

    if !hints.is_empty() {
        println!("Hints:");
        for hint in hints {
            println!("  - {hint}");
        }
    }
}
