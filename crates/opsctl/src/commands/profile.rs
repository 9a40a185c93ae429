//! Profile management command implementations.

use std::path::Path;

use clap::ArgMatches;
use comfy_table::Table;
use serde_json::json;
use tracing::debug;

use opsctl_core::{Config, ConfigError, Profile};

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::print_output;

pub fn run(
    matches: &ArgMatches,
    config: &mut Config,
    config_path: Option<&Path>,
    output: OutputFormat,
) -> Result<()> {
    match matches.subcommand() {
        Some(("set", sub)) => set(sub, config, config_path),
        Some(("list", _)) => list(config, config_path, output),
        Some(("show", sub)) => show(sub, config, output),
        Some(("remove", sub)) => remove(sub, config, config_path),
        Some(("use", sub)) => use_default(sub, config, config_path),
        Some(("path", _)) => path(config_path),
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn save(config: &Config, config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => config.save_to_path(path)?,
        None => config.save()?,
    }
    Ok(())
}

fn set(matches: &ArgMatches, config: &mut Config, config_path: Option<&Path>) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .expect("clap enforces the argument");
    let url = matches
        .get_one::<String>("url")
        .expect("clap enforces the argument");

    let profile = Profile {
        url: url.clone(),
        token: matches.get_one::<String>("token").cloned(),
        insecure: matches.get_flag("insecure"),
    };

    debug!(profile = %name, "storing profile");
    config.set_profile(name.clone(), profile);
    save(config, config_path)?;
    eprintln!("Profile '{name}' saved");
    Ok(())
}

fn list(config: &Config, config_path: Option<&Path>, output: OutputFormat) -> Result<()> {
    let mut names: Vec<&String> = config.profiles.keys().collect();
    names.sort();

    match output {
        OutputFormat::Table => {
            if let Some(path) = resolved_path(config_path) {
                println!("Configuration file: {path}");
                println!();
            }
            if names.is_empty() {
                println!("No profiles configured.");
                println!("Use 'opsctl profile set' to create a profile.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["NAME", "URL", "AUTH", "DEFAULT"]);
            for name in names {
                let profile = &config.profiles[name];
                let is_default = config.default_profile.as_deref() == Some(name.as_str());
                table.add_row(vec![
                    name.clone(),
                    profile.url.clone(),
                    if profile.token.is_some() {
                        "token"
                    } else {
                        "none"
                    }
                    .to_string(),
                    if is_default { "*" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        _ => {
            let profiles: Vec<_> = names
                .iter()
                .map(|name| {
                    let profile = &config.profiles[*name];
                    json!({
                        "name": name,
                        "url": profile.url,
                        "has_token": profile.token.is_some(),
                        "insecure": profile.insecure,
                        "is_default": config.default_profile.as_deref() == Some(name.as_str()),
                    })
                })
                .collect();
            print_output(
                &json!({
                    "config_path": resolved_path(config_path),
                    "profiles": profiles,
                    "count": profiles.len(),
                }),
                output,
            )
        }
    }
}

fn show(matches: &ArgMatches, config: &Config, output: OutputFormat) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .expect("clap enforces the argument");
    let profile = config
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;

    // The token itself never leaves the config file.
    let value = json!({
        "name": name,
        "url": profile.url,
        "token": if profile.token.is_some() { "configured" } else { "not set" },
        "insecure": profile.insecure,
        "is_default": config.default_profile.as_deref() == Some(name.as_str()),
    });

    print_output(&value, output)
}

fn remove(matches: &ArgMatches, config: &mut Config, config_path: Option<&Path>) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .expect("clap enforces the argument");
    if !config.remove_profile(name) {
        return Err(ConfigError::ProfileNotFound { name: name.clone() }.into());
    }
    save(config, config_path)?;
    eprintln!("Profile '{name}' removed");
    Ok(())
}

fn use_default(
    matches: &ArgMatches,
    config: &mut Config,
    config_path: Option<&Path>,
) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .expect("clap enforces the argument");
    if !config.profiles.contains_key(name) {
        return Err(ConfigError::ProfileNotFound { name: name.clone() }.into());
    }
    config.default_profile = Some(name.clone());
    save(config, config_path)?;
    eprintln!("Default profile set to '{name}'");
    Ok(())
}

fn path(config_path: Option<&Path>) -> Result<()> {
    match resolved_path(config_path) {
        Some(path) => println!("{path}"),
        None => eprintln!("No configuration path available on this platform"),
    }
    Ok(())
}

fn resolved_path(config_path: Option<&Path>) -> Option<String> {
    config_path
        .map(|p| p.display().to_string())
        .or_else(|| Config::config_path().ok().map(|p| p.display().to_string()))
}
