//! Request intent assembly.
//!
//! A request intent is the ephemeral payload for one wire call: the
//! operation name plus a JSON body mirroring the service's request shape.
//! Building one validates the parameter set against the descriptor; every
//! bound value is copied to its wire field unchanged.

use serde_json::{Map, Value};

use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, Result};
use crate::params::ParamSet;

#[derive(Debug, Clone)]
pub struct RequestIntent {
    pub operation: String,
    pub body: Map<String, Value>,
}

impl RequestIntent {
    /// Assemble the wire payload from a parameter set.
    ///
    /// Fails with a validation error when a bound parameter is not
    /// declared by the descriptor or a required parameter is missing.
    /// Both are local failures: nothing has touched the network yet.
    pub fn build(descriptor: &OperationDescriptor, params: &ParamSet) -> Result<Self> {
        for (name, _) in params.iter() {
            if descriptor.field(name).is_none() {
                return Err(CoreError::Validation(format!(
                    "operation '{}' has no parameter '{}'",
                    descriptor.name, name
                )));
            }
        }

        let missing: Vec<&str> = descriptor
            .required_fields()
            .filter(|f| params.get(&f.name).is_none())
            .map(|f| f.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "operation '{}' is missing required parameter(s): {}",
                descriptor.name,
                missing.join(", ")
            )));
        }

        // Path templates consume their fields at send time, so a field
        // referenced from the endpoint path must be bound even when it is
        // not marked required.
        for var in descriptor.endpoint.template_vars() {
            let bound = descriptor
                .fields
                .iter()
                .find(|f| f.wire_name == var)
                .is_some_and(|f| params.get(&f.name).is_some());
            if !bound {
                return Err(CoreError::Validation(format!(
                    "operation '{}': endpoint path needs '{}' but no parameter supplies it",
                    descriptor.name, var
                )));
            }
        }

        let mut body = Map::new();
        for field in &descriptor.fields {
            if let Some(value) = params.get(&field.name) {
                body.insert(field.wire_name.clone(), value.to_json());
            }
        }

        Ok(RequestIntent {
            operation: descriptor.name.clone(),
            body,
        })
    }

    /// The body as a JSON value.
    pub fn body_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}
