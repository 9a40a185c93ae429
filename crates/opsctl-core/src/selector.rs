//! Output selectors.
//!
//! A selector decides which part of a response the caller sees. Three
//! forms exist: `*` surfaces the whole response, a dotted field path
//! surfaces that field, and `^param` echoes back the input bound to
//! `param` instead of anything from the wire.

use serde_json::Value;

use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, Result};
use crate::params::ParamSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    WholeResponse,
    /// Dotted path into the response object, e.g. `Job.Status`.
    FieldPath(Vec<String>),
    /// Echo the named input parameter.
    EchoInput(String),
}

impl Selector {
    /// Parse a selector expression. Fails fast on syntactic problems so an
    /// invalid expression never reaches the wire.
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Selector {
                expression: expression.to_string(),
                message: "expression is empty".into(),
            });
        }
        if trimmed == "*" {
            return Ok(Selector::WholeResponse);
        }
        if let Some(param) = trimmed.strip_prefix('^') {
            if param.is_empty() {
                return Err(CoreError::Selector {
                    expression: expression.to_string(),
                    message: "'^' must be followed by a parameter name".into(),
                });
            }
            if param.contains('.') {
                return Err(CoreError::Selector {
                    expression: expression.to_string(),
                    message: "parameter echo does not take a path".into(),
                });
            }
            return Ok(Selector::EchoInput(param.to_string()));
        }

        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CoreError::Selector {
                expression: expression.to_string(),
                message: "field path contains an empty segment".into(),
            });
        }
        Ok(Selector::FieldPath(segments))
    }

    /// Check the selector against an operation's declared parameters.
    /// Only `^param` has anything to check: the echoed parameter must
    /// exist in the descriptor.
    pub fn validate_against(&self, descriptor: &OperationDescriptor) -> Result<()> {
        if let Selector::EchoInput(param) = self
            && descriptor.field(param).is_none()
        {
            return Err(CoreError::Selector {
                expression: format!("^{param}"),
                message: format!(
                    "operation '{}' has no parameter '{param}'",
                    descriptor.name
                ),
            });
        }
        Ok(())
    }

    /// True when the selector reads from the input side rather than the
    /// response.
    pub fn echoes_input(&self) -> bool {
        matches!(self, Selector::EchoInput(_))
    }

    /// Apply the selector. A field path that does not exist in the
    /// response yields JSON null; there is no response schema to validate
    /// against.
    pub fn project(&self, response: &Value, params: &ParamSet) -> Value {
        match self {
            Selector::WholeResponse => response.clone(),
            Selector::FieldPath(segments) => {
                let mut current = response;
                for segment in segments {
                    match current.get(segment) {
                        Some(next) => current = next,
                        None => return Value::Null,
                    }
                }
                current.clone()
            }
            Selector::EchoInput(param) => params
                .get(param)
                .map(|v| v.to_json())
                .unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::WholeResponse => write!(f, "*"),
            Selector::FieldPath(segments) => write!(f, "{}", segments.join(".")),
            Selector::EchoInput(param) => write!(f, "^{param}"),
        }
    }
}
