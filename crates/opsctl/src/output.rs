//! Output rendering for projected results.

use comfy_table::Table;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::{CliError, Result};

/// Print a projected value in the requested format.
pub fn print_output(data: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(data).map_err(|e| CliError::Output {
                message: format!("YAML error: {e}"),
            })?;
            print!("{text}");
        }
        OutputFormat::Table => print_as_table(data),
    }
    Ok(())
}

fn print_as_table(value: &Value) {
    match value {
        Value::Array(rows) if !rows.is_empty() => {
            let mut table = Table::new();
            if let Value::Object(first) = &rows[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);
                for row in rows {
                    if let Value::Object(obj) = row {
                        table.add_row(
                            headers
                                .iter()
                                .map(|h| cell_text(obj.get(h).unwrap_or(&Value::Null)))
                                .collect::<Vec<_>>(),
                        );
                    }
                }
            } else {
                table.set_header(vec!["VALUE"]);
                for row in rows {
                    table.add_row(vec![cell_text(row)]);
                }
            }
            println!("{table}");
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["FIELD", "VALUE"]);
            for (key, val) in obj {
                table.add_row(vec![key.clone(), cell_text(val)]);
            }
            println!("{table}");
        }
        other => println!("{}", cell_text(other)),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
    }
}
