//! Operation descriptors.
//!
//! A descriptor is the static metadata for one wrapped service operation:
//! which parameters exist, which are required, whether the operation
//! mutates remote state (and therefore prompts for confirmation), whether
//! it paginates, what the output selector defaults to, and where on the
//! wire the call goes. Descriptors are declared in catalog files and never
//! change after load.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Flag names reserved by the engine and the CLI front end. A descriptor
/// field may not collide with any of these.
pub const RESERVED_FLAGS: &[&str] = &[
    "select",
    "force",
    "no-paginate",
    "help",
    "profile",
    "config-file",
    "catalog",
    "output",
    "verbose",
];

/// Command names taken by the CLI's own management commands.
pub const RESERVED_COMMANDS: &[&str] = &["profile", "catalog", "version", "completions", "help"];

/// Value shape of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// Repeatable flag collected into a JSON array of strings.
    StringList,
    /// Repeatable `key=value` flag collected into a JSON object.
    KeyValueMap,
    /// Raw JSON document, inline or `@file`.
    Json,
}

impl ValueKind {
    /// True for kinds that map onto a single scalar query parameter.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            ValueKind::String | ValueKind::Integer | ValueKind::Number | ValueKind::Boolean
        )
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSpec {
    /// Logical name, used as the CLI flag (`--job-id`).
    pub name: String,
    /// Field name in the request payload (`JobId`).
    pub wire_name: String,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub help: String,
}

/// Pagination wiring for list/describe-style operations. The cursor's
/// wire field comes from the declared parameter's `wire_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaginationSpec {
    /// Logical parameter that carries a manually supplied cursor.
    pub cursor_param: String,
    /// Response field the continuation token is read from.
    pub cursor_response_field: String,
}

/// Where the invoker places the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EndpointSpec {
    /// HTTP method: GET, POST, PUT, PATCH or DELETE.
    pub method: String,
    /// Path, optionally containing `{WireName}` segments substituted from
    /// the request body.
    pub path: String,
}

impl EndpointSpec {
    /// Wire names referenced by `{...}` segments in the path.
    pub fn template_vars(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    vars.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        vars
    }
}

const KNOWN_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Static metadata for one wrapped operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OperationDescriptor {
    /// Remote operation name (`ListJobs`).
    pub name: String,
    /// Verb-noun CLI command (`list-jobs`).
    pub command: String,
    #[serde(default)]
    pub about: String,
    /// Mutating operations are gated behind a confirmation prompt.
    #[serde(default)]
    pub mutating: bool,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub pagination: Option<PaginationSpec>,
    /// Selector applied when the caller does not pass one. `*` means the
    /// whole response.
    #[serde(default = "default_select")]
    pub default_select: String,
    pub endpoint: EndpointSpec,
}

fn default_select() -> String {
    "*".to_string()
}

/// Names used as CLI flags: lowercase kebab-case, starting with a letter.
fn is_flag_safe(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl OperationDescriptor {
    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate the required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn paginates(&self) -> bool {
        self.pagination.is_some()
    }

    /// Check internal consistency. Called once at catalog load.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::Validation("operation name is empty".into()));
        }
        if self.command.is_empty() {
            return Err(CoreError::Validation(format!(
                "operation '{}' has an empty command name",
                self.name
            )));
        }
        if !is_flag_safe(&self.command) {
            return Err(CoreError::Validation(format!(
                "operation '{}': command '{}' must be lowercase kebab-case",
                self.name, self.command
            )));
        }
        if RESERVED_COMMANDS.contains(&self.command.as_str()) {
            return Err(CoreError::Validation(format!(
                "operation '{}': command name '{}' is reserved",
                self.name, self.command
            )));
        }
        if !KNOWN_METHODS.contains(&self.endpoint.method.as_str()) {
            return Err(CoreError::Validation(format!(
                "operation '{}' uses unknown HTTP method '{}'",
                self.name, self.endpoint.method
            )));
        }
        if self.endpoint.path.is_empty() {
            return Err(CoreError::Validation(format!(
                "operation '{}' has an empty endpoint path",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        let mut seen_wire = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.wire_name.is_empty() {
                return Err(CoreError::Validation(format!(
                    "operation '{}' declares a field with an empty name",
                    self.name
                )));
            }
            if !is_flag_safe(&field.name) {
                return Err(CoreError::Validation(format!(
                    "operation '{}': field name '{}' must be lowercase kebab-case",
                    self.name, field.name
                )));
            }
            if RESERVED_FLAGS.contains(&field.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "operation '{}': field name '{}' is reserved",
                    self.name, field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "operation '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
            if !seen_wire.insert(field.wire_name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "operation '{}' declares wire field '{}' twice",
                    self.name, field.wire_name
                )));
            }
            // GET/DELETE requests carry parameters in the query string,
            // which cannot represent nested documents.
            if matches!(self.endpoint.method.as_str(), "GET" | "DELETE")
                && matches!(field.kind, ValueKind::Json | ValueKind::KeyValueMap)
            {
                return Err(CoreError::Validation(format!(
                    "operation '{}': field '{}' has a structured kind but the {} endpoint only carries query parameters",
                    self.name, field.name, self.endpoint.method
                )));
            }
        }

        for var in self.endpoint.template_vars() {
            match self.fields.iter().find(|f| f.wire_name == var) {
                Some(field) if field.kind.is_scalar() => {}
                Some(field) => {
                    return Err(CoreError::Validation(format!(
                        "operation '{}': path segment '{{{var}}}' refers to non-scalar field '{}'",
                        self.name, field.name
                    )));
                }
                None => {
                    return Err(CoreError::Validation(format!(
                        "operation '{}': path segment '{{{var}}}' does not match a declared wire field",
                        self.name
                    )));
                }
            }
        }

        if let Some(pagination) = &self.pagination {
            let cursor = self.field(&pagination.cursor_param).ok_or_else(|| {
                CoreError::Validation(format!(
                    "operation '{}': pagination cursor parameter '{}' is not a declared field",
                    self.name, pagination.cursor_param
                ))
            })?;
            if cursor.kind != ValueKind::String {
                return Err(CoreError::Validation(format!(
                    "operation '{}': cursor parameter '{}' must be a string",
                    self.name, pagination.cursor_param
                )));
            }
            if cursor.required {
                return Err(CoreError::Validation(format!(
                    "operation '{}': cursor parameter '{}' cannot be required",
                    self.name, pagination.cursor_param
                )));
            }
            if pagination.cursor_response_field.is_empty() {
                return Err(CoreError::Validation(format!(
                    "operation '{}': pagination response field is empty",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_op() -> OperationDescriptor {
        OperationDescriptor {
            name: "ListJobs".into(),
            command: "list-jobs".into(),
            about: String::new(),
            mutating: false,
            fields: vec![
                FieldSpec {
                    name: "status".into(),
                    wire_name: "Status".into(),
                    kind: ValueKind::String,
                    required: false,
                    help: String::new(),
                },
                FieldSpec {
                    name: "next-token".into(),
                    wire_name: "NextToken".into(),
                    kind: ValueKind::String,
                    required: false,
                    help: String::new(),
                },
            ],
            pagination: Some(PaginationSpec {
                cursor_param: "next-token".into(),
                cursor_response_field: "NextToken".into(),
            }),
            default_select: "Jobs".into(),
            endpoint: EndpointSpec {
                method: "POST".into(),
                path: "/v1/ListJobs".into(),
            },
        }
    }

    #[test]
    fn valid_descriptor_passes() {
        assert!(list_op().validate().is_ok());
    }

    #[test]
    fn duplicate_field_rejected() {
        let mut op = list_op();
        let dup = op.fields[0].clone();
        op.fields.push(dup);
        assert!(op.validate().is_err());
    }

    #[test]
    fn reserved_flag_rejected() {
        let mut op = list_op();
        op.fields[0].name = "select".into();
        assert!(op.validate().is_err());
    }

    #[test]
    fn undeclared_cursor_rejected() {
        let mut op = list_op();
        op.fields.retain(|f| f.name != "next-token");
        let err = op.validate().unwrap_err();
        assert!(err.to_string().contains("next-token"));
    }

    #[test]
    fn unknown_method_rejected() {
        let mut op = list_op();
        op.endpoint.method = "FETCH".into();
        assert!(op.validate().is_err());
    }

    #[test]
    fn template_vars_are_extracted() {
        let endpoint = EndpointSpec {
            method: "GET".into(),
            path: "/v1/jobs/{JobId}/logs/{Stream}".into(),
        };
        assert_eq!(endpoint.template_vars(), vec!["JobId", "Stream"]);

        let plain = EndpointSpec {
            method: "GET".into(),
            path: "/v1/jobs".into(),
        };
        assert!(plain.template_vars().is_empty());
    }

    #[test]
    fn template_must_match_a_scalar_wire_field() {
        let mut op = list_op();
        op.endpoint.path = "/v1/jobs/{JobId}".into();
        assert!(op.validate().is_err());

        op.fields.push(FieldSpec {
            name: "job-id".into(),
            wire_name: "JobId".into(),
            kind: ValueKind::String,
            required: true,
            help: String::new(),
        });
        assert!(op.validate().is_ok());
    }

    #[test]
    fn structured_kind_on_get_rejected() {
        let mut op = list_op();
        op.endpoint.method = "GET".into();
        op.fields[0].kind = ValueKind::Json;
        assert!(op.validate().is_err());
    }
}
