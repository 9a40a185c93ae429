//! Catalog inspection commands.

use clap::ArgMatches;
use comfy_table::Table;
use serde_json::json;

use opsctl_core::CatalogSet;

use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::print_output;

pub fn run(matches: &ArgMatches, catalogs: &CatalogSet, output: OutputFormat) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => list(catalogs, output),
        Some(("show", sub)) => {
            let command = sub
                .get_one::<String>("command")
                .expect("clap enforces the argument");
            show(catalogs, command, output)
        }
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn list(catalogs: &CatalogSet, output: OutputFormat) -> Result<()> {
    if catalogs.is_empty() {
        eprintln!("No operations available.");
        eprintln!("Place catalogs in the configuration directory or pass --catalog <file>.");
        return Ok(());
    }

    match output {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["COMMAND", "OPERATION", "CATALOG", "TRAITS"]);
            for (catalog, op) in catalogs.entries() {
                table.add_row(vec![
                    op.command.clone(),
                    op.name.clone(),
                    catalog.to_string(),
                    traits_text(op.mutating, op.paginates()),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        _ => {
            let operations: Vec<_> = catalogs
                .entries()
                .map(|(catalog, op)| {
                    json!({
                        "command": op.command,
                        "operation": op.name,
                        "catalog": catalog,
                        "mutating": op.mutating,
                        "paginated": op.paginates(),
                    })
                })
                .collect();
            print_output(&json!({"operations": operations}), output)
        }
    }
}

fn traits_text(mutating: bool, paginated: bool) -> String {
    match (mutating, paginated) {
        (true, true) => "mutating, paginated".into(),
        (true, false) => "mutating".into(),
        (false, true) => "paginated".into(),
        (false, false) => "read-only".into(),
    }
}

fn show(catalogs: &CatalogSet, command: &str, output: OutputFormat) -> Result<()> {
    let operation = catalogs.find(command).ok_or_else(|| CliError::InvalidInput {
        message: format!("no operation named '{command}' in the loaded catalogs"),
    })?;

    match output {
        OutputFormat::Table => {
            println!("{} ({})", operation.command, operation.name);
            if !operation.about.is_empty() {
                println!("{}", operation.about);
            }
            println!(
                "endpoint: {} {}",
                operation.endpoint.method, operation.endpoint.path
            );
            println!("default selector: {}", operation.default_select);
            println!("{}", traits_text(operation.mutating, operation.paginates()));

            if !operation.fields.is_empty() {
                println!();
                let mut table = Table::new();
                table.set_header(vec!["FLAG", "WIRE FIELD", "KIND", "REQUIRED"]);
                for field in &operation.fields {
                    table.add_row(vec![
                        format!("--{}", field.name),
                        field.wire_name.clone(),
                        format!("{:?}", field.kind).to_lowercase(),
                        if field.required { "yes" } else { "" }.to_string(),
                    ]);
                }
                println!("{table}");
            }
            Ok(())
        }
        _ => {
            let value = serde_json::to_value(operation)?;
            print_output(&value, output)
        }
    }
}
