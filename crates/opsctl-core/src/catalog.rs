//! Operation catalogs.
//!
//! A catalog is a TOML document declaring a family of operation
//! descriptors for one service surface. The CLI loads every catalog it can
//! find and turns each descriptor into a subcommand, so adding an
//! operation is a data change, not a code change.
//!
//! ```toml
//! [catalog]
//! name = "jobs"
//! about = "Batch job service"
//!
//! [[operation]]
//! name = "ListJobs"
//! command = "list-jobs"
//! mutating = false
//! default-select = "Jobs"
//! endpoint = { method = "POST", path = "/v1/ListJobs" }
//!
//! [[operation.field]]
//! name = "status"
//! wire-name = "Status"
//!
//! [[operation.field]]
//! name = "next-token"
//! wire-name = "NextToken"
//!
//! [operation.pagination]
//! cursor-param = "next-token"
//! cursor-response-field = "NextToken"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogInfo {
    pub name: String,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    pub catalog: CatalogInfo,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationDescriptor>,
}

impl Catalog {
    /// Parse and validate a catalog document. `origin` names the source
    /// (a path, usually) for error reporting.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(text).map_err(|e| CoreError::Catalog {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        catalog.validate(origin)?;
        Ok(catalog)
    }

    /// Load a catalog from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::Catalog {
            origin: path.display().to_string(),
            message: format!("failed to read file: {e}"),
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    fn validate(&self, origin: &str) -> Result<()> {
        if self.catalog.name.is_empty() {
            return Err(CoreError::Catalog {
                origin: origin.to_string(),
                message: "catalog name is empty".into(),
            });
        }
        let mut commands = std::collections::HashSet::new();
        for operation in &self.operations {
            operation.validate().map_err(|e| CoreError::Catalog {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
            if !commands.insert(operation.command.as_str()) {
                return Err(CoreError::Catalog {
                    origin: origin.to_string(),
                    message: format!("command '{}' is declared twice", operation.command),
                });
            }
        }
        Ok(())
    }
}

/// Every catalog loaded for one CLI run, with command names unique across
/// the whole set.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    catalogs: Vec<Catalog>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, catalog: Catalog) -> Result<()> {
        for operation in &catalog.operations {
            if let Some((owner, _)) = self.entry(&operation.command) {
                return Err(CoreError::Catalog {
                    origin: catalog.catalog.name.clone(),
                    message: format!(
                        "command '{}' already provided by catalog '{}'",
                        operation.command, owner
                    ),
                });
            }
        }
        debug!(
            catalog = %catalog.catalog.name,
            operations = catalog.operations.len(),
            "catalog registered"
        );
        self.catalogs.push(catalog);
        Ok(())
    }

    /// Iterate `(catalog name, descriptor)` pairs in load order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &OperationDescriptor)> {
        self.catalogs.iter().flat_map(|c| {
            c.operations
                .iter()
                .map(move |op| (c.catalog.name.as_str(), op))
        })
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.entries().map(|(_, op)| op)
    }

    /// Find a descriptor by CLI command name.
    pub fn find(&self, command: &str) -> Option<&OperationDescriptor> {
        self.operations().find(|op| op.command == command)
    }

    fn entry(&self, command: &str) -> Option<(&str, &OperationDescriptor)> {
        self.entries().find(|(_, op)| op.command == command)
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.iter().all(|c| c.operations.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOBS: &str = r#"
[catalog]
name = "jobs"

[[operation]]
name = "ListJobs"
command = "list-jobs"
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

    #[test]
    fn parses_a_catalog() {
        let catalog = Catalog::parse(JOBS, "jobs.toml").unwrap();
        assert_eq!(catalog.catalog.name, "jobs");
        assert_eq!(catalog.operations.len(), 2);

        let list = &catalog.operations[0];
        assert!(list.paginates());
        assert!(!list.mutating);
        assert_eq!(list.default_select, "Jobs");

        let cancel = &catalog.operations[1];
        assert!(cancel.mutating);
        assert_eq!(cancel.default_select, "*");
        assert!(cancel.field("job-id").unwrap().required);
    }

    #[test]
    fn rejects_invalid_toml() {
        let err = Catalog::parse("not toml [", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn rejects_duplicate_command_in_one_catalog() {
        let doubled = format!(
            "{JOBS}\n[[operation]]\nname = \"CancelJob2\"\ncommand = \"cancel-job\"\nendpoint = {{ method = \"POST\", path = \"/v1/x\" }}\n"
        );
        assert!(Catalog::parse(&doubled, "jobs.toml").is_err());
    }

    #[test]
    fn set_rejects_cross_catalog_collisions() {
        let mut set = CatalogSet::new();
        set.push(Catalog::parse(JOBS, "jobs.toml").unwrap()).unwrap();

        let other = r#"
[catalog]
name = "other"

[[operation]]
name = "CancelJob"
command = "cancel-job"
endpoint = { method = "POST", path = "/v1/CancelJob" }
"#;
        let err = set
            .push(Catalog::parse(other, "other.toml").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("jobs"));
    }

    #[test]
    fn find_resolves_commands() {
        let mut set = CatalogSet::new();
        set.push(Catalog::parse(JOBS, "jobs.toml").unwrap()).unwrap();
        assert_eq!(set.find("list-jobs").unwrap().name, "ListJobs");
        assert!(set.find("nope").is_none());
        assert!(!set.is_empty());
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.toml");
        std::fs::write(&path, JOBS).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.catalog.name, "jobs");

        let err = Catalog::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
