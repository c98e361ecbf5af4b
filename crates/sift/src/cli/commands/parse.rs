//! Implementation of `sift parse`.

use std::process::ExitCode;

use sift_query::{UnknownFieldPolicy, parse_with};
use tracing::debug;

use crate::cli::{
    args::ParseCommand,
    context::{CommandContext, resolver},
};

/// Parses a query and prints its tree, or its canonical form with `--canonical`.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let schema = if cmd.no_schema {
        None
    } else {
        match ctx.schema() {
            Ok(schema) => schema,
            Err(code) => return code,
        }
    };

    let mut options = ctx.config.parser_options();
    if cmd.strict {
        options.unknown_fields = UnknownFieldPolicy::Reject;
    }
    if let Some(depth) = cmd.max_depth {
        options.max_depth = depth;
    }
    debug!(?options, schema = schema.is_some(), "parsing query");

    let node = match parse_with(&cmd.query, resolver(schema.as_ref()), options) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match node {
        None => println!("(empty query)"),
        Some(node) if cmd.canonical => match &schema {
            Some(schema) => println!("{}", node.to_query_string_with(schema)),
            None => println!("{}", node.to_query_string()),
        },
        Some(node) => print!("{node}"),
    }

    ExitCode::SUCCESS
}
