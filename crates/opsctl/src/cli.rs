//! CLI structure.
//!
//! The command tree is built at runtime: global flags and the static
//! management commands come first, then every operation descriptor in the
//! loaded catalogs becomes a subcommand whose flags mirror the
//! descriptor's fields 1:1. Reserved per-operation flags: `--select`
//! controls the output projection, `--force` skips confirmation on
//! mutating operations, `--no-paginate` fetches a single page.

use clap::builder::NonEmptyStringValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;

use opsctl_core::{CatalogSet, FieldSpec, OperationDescriptor, ValueKind};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    #[default]
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Global flags, extracted once after parsing. Verbosity is consumed by
/// the tracing setup before clap runs and is not carried here.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub profile: Option<String>,
    pub config_file: Option<PathBuf>,
    pub output: OutputFormat,
}

impl GlobalOpts {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            profile: matches.get_one::<String>("profile").cloned(),
            config_file: matches.get_one::<PathBuf>("config-file").cloned(),
            output: matches
                .get_one::<OutputFormat>("output")
                .copied()
                .unwrap_or_default(),
        }
    }
}

/// Build the full command tree for the loaded catalogs.
pub fn build_cli(catalogs: &CatalogSet) -> Command {
    let mut cmd = Command::new("opsctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Data-driven CLI for remote service operations")
        .long_about(
            "Data-driven CLI for remote service operations\n\n\
             Operations are declared in TOML catalogs; every declared operation\n\
             becomes a subcommand. Catalogs are loaded from the configuration\n\
             directory's catalogs/ folder and from --catalog paths.\n\n\
             EXAMPLES:\n    \
             # Configure an endpoint profile\n    \
             opsctl profile set prod --url https://ops.example.com --token TOKEN\n\n    \
             # Inspect what the loaded catalogs provide\n    \
             opsctl catalog list\n\n    \
             # Call an operation, projecting one response field\n    \
             opsctl get-job --job-id job-42 --select Job.Status\n\n    \
             # Fetch a single page of a listing\n    \
             opsctl list-jobs --no-paginate",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("profile")
                .long("profile")
                .short('p')
                .global(true)
                .env("OPSCTL_PROFILE")
                .help("Profile to use for this command")
                .value_parser(NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("config-file")
                .long("config-file")
                .global(true)
                .env("OPSCTL_CONFIG_FILE")
                .help("Path to alternate configuration file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .global(true)
                .action(ArgAction::Append)
                .help("Additional operation catalog to load (repeatable)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .global(true)
                .value_parser(value_parser!(OutputFormat))
                .default_value("json")
                .help("Output format"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Enable verbose logging (-v, -vv, -vvv)"),
        )
        .subcommand(profile_command())
        .subcommand(catalog_command())
        .subcommand(Command::new("version").about("Version information"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(value_parser!(clap_complete::Shell)),
                ),
        );

    for operation in catalogs.operations() {
        cmd = cmd.subcommand(operation_command(operation));
    }

    cmd
}

fn profile_command() -> Command {
    Command::new("profile")
        .about("Profile management")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("set")
                .about("Create or update a profile")
                .arg(Arg::new("name").required(true).help("Profile name"))
                .arg(
                    Arg::new("url")
                        .long("url")
                        .required(true)
                        .help("Base URL of the service API"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Bearer token sent with each request"),
                )
                .arg(
                    Arg::new("insecure")
                        .long("insecure")
                        .action(ArgAction::SetTrue)
                        .help("Accept invalid TLS certificates"),
                ),
        )
        .subcommand(Command::new("list").about("List configured profiles"))
        .subcommand(
            Command::new("show")
                .about("Show details of a profile")
                .arg(Arg::new("name").required(true).help("Profile name")),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a profile")
                .arg(Arg::new("name").required(true).help("Profile name")),
        )
        .subcommand(
            Command::new("use")
                .about("Set the default profile")
                .arg(Arg::new("name").required(true).help("Profile name")),
        )
        .subcommand(Command::new("path").about("Show the configuration file path"))
}

fn catalog_command() -> Command {
    Command::new("catalog")
        .about("Inspect loaded operation catalogs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List every available operation"))
        .subcommand(
            Command::new("show")
                .about("Show one operation in detail")
                .arg(Arg::new("command").required(true).help("Operation command name")),
        )
}

/// Turn one descriptor into a subcommand.
fn operation_command(operation: &OperationDescriptor) -> Command {
    let mut cmd = Command::new(operation.command.clone());
    if !operation.about.is_empty() {
        cmd = cmd.about(operation.about.clone());
    }

    for field in &operation.fields {
        cmd = cmd.arg(field_arg(field));
    }

    cmd = cmd.arg(
        Arg::new("select")
            .long("select")
            .help(format!(
                "Output selector: '*' for the whole response, a field path, or '^param' to echo an input (default: '{}')",
                operation.default_select
            ))
            .value_parser(NonEmptyStringValueParser::new()),
    );

    if operation.mutating {
        cmd = cmd.arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Skip the confirmation prompt"),
        );
    }
    if operation.paginates() {
        cmd = cmd.arg(
            Arg::new("no-paginate")
                .long("no-paginate")
                .action(ArgAction::SetTrue)
                .help("Fetch a single page instead of auto-iterating"),
        );
    }

    cmd
}

/// Map one field spec onto a clap argument. Required fields stay optional
/// at the parser level; the engine validates and reports them together.
fn field_arg(field: &FieldSpec) -> Arg {
    let mut arg = Arg::new(field.name.clone()).long(field.name.clone());

    if !field.help.is_empty() {
        arg = arg.help(field.help.clone());
    } else if field.required {
        arg = arg.help("(required)");
    }

    match field.kind {
        ValueKind::String => arg,
        ValueKind::Integer => arg.value_parser(value_parser!(i64)),
        ValueKind::Number => arg.value_parser(value_parser!(f64)),
        ValueKind::Boolean => arg.value_parser(value_parser!(bool)),
        ValueKind::StringList => arg.action(ArgAction::Append),
        ValueKind::KeyValueMap => arg.action(ArgAction::Append).value_name("KEY=VALUE"),
        ValueKind::Json => arg.value_name("JSON|@FILE"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsctl_core::Catalog;

    const JOBS: &str = r#"
[catalog]
name = "jobs"

[[operation]]
name = "ListJobs"
command = "list-jobs"
about = "List jobs"
default-select = "Jobs"
endpoint = { method = "POST", path = "/v1/ListJobs" }

[[operation.field]]
name = "status"
wire-name = "Status"

[[operation.field]]
name = "next-token"
wire-name = "NextToken"

[operation.pagination]
cursor-param = "next-token"
cursor-response-field = "NextToken"

[[operation]]
name = "CancelJob"
command = "cancel-job"
mutating = true
endpoint = { method = "POST", path = "/v1/CancelJob" }

[[operation.field]]
name = "job-id"
wire-name = "JobId"
required = true
"#;

    fn catalogs() -> CatalogSet {
        let mut set = CatalogSet::new();
        set.push(Catalog::parse(JOBS, "jobs.toml").unwrap()).unwrap();
        set
    }

    #[test]
    fn operations_become_subcommands() {
        let cli = build_cli(&catalogs());
        let names: Vec<_> = cli.get_subcommands().map(|c| c.get_name()).collect();
        assert!(names.contains(&"list-jobs"));
        assert!(names.contains(&"cancel-job"));
        assert!(names.contains(&"profile"));
        assert!(names.contains(&"catalog"));
    }

    #[test]
    fn reserved_flags_follow_the_descriptor() {
        let cli = build_cli(&catalogs());

        let list = cli.find_subcommand("list-jobs").unwrap();
        let list_args: Vec<_> = list.get_arguments().map(|a| a.get_id().as_str()).collect();
        assert!(list_args.contains(&"select"));
        assert!(list_args.contains(&"no-paginate"));
        assert!(!list_args.contains(&"force"));

        let cancel = cli.find_subcommand("cancel-job").unwrap();
        let cancel_args: Vec<_> = cancel.get_arguments().map(|a| a.get_id().as_str()).collect();
        assert!(cancel_args.contains(&"force"));
        assert!(!cancel_args.contains(&"no-paginate"));
    }

    #[test]
    fn operation_flags_parse() {
        let cli = build_cli(&catalogs());
        let matches = cli
            .try_get_matches_from([
                "opsctl",
                "list-jobs",
                "--status",
                "RUNNING",
                "--select",
                "Jobs",
                "--no-paginate",
            ])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "list-jobs");
        assert_eq!(sub.get_one::<String>("status").unwrap(), "RUNNING");
        assert!(sub.get_flag("no-paginate"));
    }

    #[test]
    fn debug_assert_catches_command_conflicts() {
        build_cli(&catalogs()).debug_assert();
    }
}
