//! Error types for the opsctl binary.
//!
//! Engine and config errors are wrapped into one CLI-facing type that
//! knows how to print a cargo-style diagnostic with follow-up suggestions.

use colored::Colorize;
use thiserror::Error;

use opsctl_core::{ConfigError, CoreError};

/// Cargo-style diagnostic formatter for CLI errors:
///
/// ```text
/// error: connection error calling ListJobs: ...
///
///   tip: check the endpoint URL in the profile:
///       opsctl profile show <name>
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the opsctl binary.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("output formatting error: {message}")]
    Output { message: String },
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Helpful follow-ups for resolving this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::Config(ConfigError::NoProfile) => vec![
                "create a profile: opsctl profile set <name> --url <url> --token <token>"
                    .to_string(),
                "list existing profiles: opsctl profile list".to_string(),
            ],
            CliError::Config(ConfigError::ProfileNotFound { name }) => vec![
                "list available profiles: opsctl profile list".to_string(),
                format!("create it: opsctl profile set {name} --url <url>"),
            ],
            CliError::Engine(CoreError::Connection { .. }) => vec![
                "check the endpoint URL: opsctl profile show <name>".to_string(),
                "for self-signed certificates, set the profile with --insecure".to_string(),
            ],
            CliError::Engine(err) if err.status() == Some(404) => vec![
                "verify the resource identifier is correct".to_string(),
                "list available resources to find the correct one".to_string(),
            ],
            CliError::Engine(err) if err.status() == Some(401) || err.status() == Some(403) => {
                vec![
                    "check the token configured for this profile: opsctl profile show <name>"
                        .to_string(),
                ]
            }
            CliError::Engine(CoreError::Validation(_)) => vec![
                "see the operation's flags: opsctl <command> --help".to_string(),
            ],
            CliError::Engine(CoreError::Selector { .. }) => vec![
                "valid selectors: '*', a response field path like Job.Status, or '^param'"
                    .to_string(),
            ],
            CliError::Engine(CoreError::Catalog { .. }) => vec![
                "inspect what loaded correctly: opsctl catalog list".to_string(),
            ],
            CliError::InvalidInput { .. } => vec![
                "check the command syntax: opsctl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }
        diag.print();
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output {
            message: format!("JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Output {
            message: format!("IO error: {err}"),
        }
    }
}
