//! # opsctl-core
//!
//! The invocation engine behind the opsctl CLI. Remote service operations
//! are described as data ([`OperationDescriptor`]) in TOML catalogs; one
//! generic adapter turns any descriptor plus a caller-supplied parameter
//! set into a validated, optionally confirmed, optionally paginated call
//! against a [`ServiceInvoker`].
//!
//! The crate deliberately owns none of the remote semantics. Whatever the
//! service does with a request - authentication, retries, payload
//! validation - belongs to the invoker implementation and the service
//! behind it. The engine's job is the mechanical part that would otherwise
//! be stamped out once per operation: copy bound parameters into the wire
//! shape, gate mutating calls behind a confirmation, loop on continuation
//! cursors, and project the response through a selector.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod params;
pub mod request;
pub mod selector;

pub use adapter::{
    Adapter, ConfirmPrompt, Invocation, InvokeOptions, PageCursor, PaginateOptions, ServiceInvoker,
};
pub use catalog::{Catalog, CatalogInfo, CatalogSet};
pub use config::{Config, ConfigError, Profile};
pub use descriptor::{EndpointSpec, FieldSpec, OperationDescriptor, PaginationSpec, ValueKind};
pub use error::{CoreError, InvokeFault, Result};
pub use http::{HttpInvoker, HttpInvokerBuilder};
pub use params::{ParamSet, ParamValue, Provenance};
pub use request::RequestIntent;
pub use selector::Selector;
