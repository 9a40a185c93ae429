//! Catalog operation execution: bind CLI flags into a parameter set, run
//! the invocation adapter, print what comes back.

use clap::ArgMatches;
use clap::parser::ValueSource;
use tracing::debug;

use opsctl_core::{
    Adapter, Config, Invocation, InvokeOptions, OperationDescriptor, PaginateOptions, ParamSet,
    ParamValue, ValueKind,
};

use crate::cli::GlobalOpts;
use crate::connection;
use crate::error::{CliError, Result};
use crate::output;

/// Interactive confirmation for mutating operations. A non-interactive
/// stdin counts as a decline; --force is the non-interactive path.
fn terminal_confirm(prompt: &str) -> bool {
    use std::io::IsTerminal;
    if !std::io::stdin().is_terminal() {
        eprintln!("Confirmation required for {prompt}; pass --force to run non-interactively");
        return false;
    }
    dialoguer::Confirm::new()
        .with_prompt(format!("Are you sure you want to run {prompt}?"))
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Run one catalog operation.
pub async fn run(
    operation: &OperationDescriptor,
    matches: &ArgMatches,
    globals: &GlobalOpts,
    config: &Config,
) -> Result<()> {
    let params = bind_params(operation, matches)?;
    debug!(
        operation = %operation.name,
        bound = params.len(),
        "parameters bound"
    );

    let select = matches.get_one::<String>("select").cloned();
    let force = operation.mutating && matches.get_flag("force");
    let no_paginate = operation.paginates() && matches.get_flag("no-paginate");

    let invoker = connection::create_invoker(
        config,
        globals.profile.as_deref(),
        globals.config_file.is_some(),
    )?;
    let adapter = Adapter::new(invoker);

    if operation.paginates() {
        let options = PaginateOptions {
            select,
            no_auto_iterate: no_paginate,
        };
        let mut pager = adapter.invoke_paginated(operation, &params, &options)?;
        while let Some(page) = pager.next_page().await {
            let page = page?;
            if !page.is_null() {
                output::print_output(&page, globals.output)?;
            }
        }
    } else {
        let options = InvokeOptions { select, force };
        match adapter
            .invoke(operation, &params, &options, &terminal_confirm)
            .await?
        {
            Invocation::Completed(value) => {
                // Mutating operations with an empty response body have
                // nothing worth printing; the exit status says it worked.
                let silent = value.is_null()
                    || (operation.mutating
                        && value.as_object().is_some_and(serde_json::Map::is_empty));
                if !silent {
                    output::print_output(&value, globals.output)?;
                }
            }
            Invocation::Skipped => {
                eprintln!("Operation cancelled");
            }
        }
    }

    Ok(())
}

/// Collect the flags the caller actually passed into a parameter set.
/// Only command-line values count as caller-bound.
fn bind_params(operation: &OperationDescriptor, matches: &ArgMatches) -> Result<ParamSet> {
    let mut params = ParamSet::new();

    for field in &operation.fields {
        if matches.value_source(&field.name) != Some(ValueSource::CommandLine) {
            continue;
        }

        let value = match field.kind {
            ValueKind::String => match matches.get_one::<String>(&field.name) {
                Some(v) => ParamValue::Str(v.clone()),
                None => continue,
            },
            ValueKind::Integer => match matches.get_one::<i64>(&field.name) {
                Some(v) => ParamValue::Int(*v),
                None => continue,
            },
            ValueKind::Number => match matches.get_one::<f64>(&field.name) {
                Some(v) => ParamValue::Num(*v),
                None => continue,
            },
            ValueKind::Boolean => match matches.get_one::<bool>(&field.name) {
                Some(v) => ParamValue::Bool(*v),
                None => continue,
            },
            ValueKind::StringList => match matches.get_many::<String>(&field.name) {
                Some(values) => ParamValue::List(values.cloned().collect()),
                None => continue,
            },
            ValueKind::KeyValueMap => match matches.get_many::<String>(&field.name) {
                Some(values) => {
                    let pairs = values
                        .map(|raw| parse_key_value(raw))
                        .collect::<Result<Vec<_>>>()?;
                    ParamValue::Map(pairs)
                }
                None => continue,
            },
            ValueKind::Json => match matches.get_one::<String>(&field.name) {
                Some(raw) => ParamValue::Json(read_json_input(raw)?),
                None => continue,
            },
        };

        params.bind(field.name.clone(), value)?;
    }

    Ok(params)
}

/// Parse a `key=value` pair.
fn parse_key_value(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidInput {
            message: format!("invalid pair '{raw}', expected key=value"),
        }),
    }
}

/// Read a JSON value from a string or, with a `@` prefix, from a file.
fn read_json_input(raw: &str) -> Result<serde_json::Value> {
    let text = if let Some(path) = raw.strip_prefix('@') {
        std::fs::read_to_string(path).map_err(|e| CliError::InvalidInput {
            message: format!("failed to read {path}: {e}"),
        })?
    } else {
        raw.to_string()
    };

    serde_json::from_str(&text).map_err(|e| CliError::InvalidInput {
        message: format!("invalid JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsctl_core::{EndpointSpec, FieldSpec};

    fn op() -> OperationDescriptor {
        OperationDescriptor {
            name: "SubmitJob".into(),
            command: "submit-job".into(),
            about: String::new(),
            mutating: false,
            fields: vec![
                FieldSpec {
                    name: "name".into(),
                    wire_name: "Name".into(),
                    kind: ValueKind::String,
                    required: true,
                    help: String::new(),
                },
                FieldSpec {
                    name: "priority".into(),
                    wire_name: "Priority".into(),
                    kind: ValueKind::Integer,
                    required: false,
                    help: String::new(),
                },
                FieldSpec {
                    name: "tag".into(),
                    wire_name: "Tags".into(),
                    kind: ValueKind::KeyValueMap,
                    required: false,
                    help: String::new(),
                },
            ],
            pagination: None,
            default_select: "*".into(),
            endpoint: EndpointSpec {
                method: "POST".into(),
                path: "/v1/SubmitJob".into(),
            },
        }
    }

    fn matches_for(args: &[&str]) -> ArgMatches {
        let mut set = opsctl_core::CatalogSet::new();
        set.push(opsctl_core::Catalog {
            catalog: opsctl_core::CatalogInfo {
                name: "jobs".into(),
                about: String::new(),
            },
            operations: vec![op()],
        })
        .unwrap();
        let cli = crate::cli::build_cli(&set);
        let mut full = vec!["opsctl"];
        full.extend_from_slice(args);
        let top = cli.try_get_matches_from(full).unwrap();
        let (_, sub) = top.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn only_passed_flags_are_bound() {
        let sub = matches_for(&["submit-job", "--name", "nightly"]);
        let params = bind_params(&op(), &sub).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(
            params.get("name"),
            Some(&ParamValue::Str("nightly".into()))
        );
        assert!(params.is_caller_bound("name"));
        assert!(params.get("priority").is_none());
    }

    #[test]
    fn typed_and_repeated_flags_bind() {
        let sub = matches_for(&[
            "submit-job",
            "--name",
            "n",
            "--priority",
            "5",
            "--tag",
            "env=prod",
            "--tag",
            "team=core",
        ]);
        let params = bind_params(&op(), &sub).unwrap();
        assert_eq!(params.get("priority"), Some(&ParamValue::Int(5)));
        assert_eq!(
            params.get("tag"),
            Some(&ParamValue::Map(vec![
                ("env".into(), "prod".into()),
                ("team".into(), "core".into()),
            ]))
        );
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
        assert_eq!(
            parse_key_value("k=v=w").unwrap(),
            ("k".into(), "v=w".into())
        );
    }

    #[test]
    fn json_input_reads_inline_and_file() {
        assert_eq!(
            read_json_input(r#"{"a": 1}"#).unwrap(),
            serde_json::json!({"a": 1})
        );
        assert!(read_json_input("{broken").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"[1, 2]"#).unwrap();
        assert_eq!(
            read_json_input(&format!("@{}", path.display())).unwrap(),
            serde_json::json!([1, 2])
        );
    }
}
