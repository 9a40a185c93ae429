//! The command invocation adapter.
//!
//! One adapter instance serves every operation: it validates the
//! parameter set, gates mutating calls behind an injected confirmation,
//! places the call through a [`ServiceInvoker`], and projects the
//! response through the selector. Paginated operations run the same
//! pipeline in a loop driven by the continuation cursor.
//!
//! Per invocation the flow is
//! `Built -> Validated -> (Confirmed | Skipped) -> Called -> {Succeeded | Failed}`,
//! where only the paginated variant loops on `Called`.

use async_trait::async_trait;
use futures::Stream;
use futures::stream;
use serde_json::Value;
use tracing::{debug, info};

use crate::descriptor::{OperationDescriptor, PaginationSpec};
use crate::error::{CoreError, InvokeFault, Result};
use crate::params::{ParamSet, ParamValue};
use crate::request::RequestIntent;
use crate::selector::Selector;

/// The wrapped service client. One call per request; any retry the
/// implementation performs internally is its own business.
#[async_trait]
pub trait ServiceInvoker: Send + Sync {
    async fn invoke(
        &self,
        operation: &OperationDescriptor,
        request: &RequestIntent,
    ) -> std::result::Result<Value, InvokeFault>;
}

/// Confirmation capability for mutating operations. Injected so tests can
/// answer deterministically instead of reading a terminal.
pub trait ConfirmPrompt {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Outcome of a single invocation. A declined confirmation is a normal
/// outcome with no output, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Completed(Value),
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Selector expression; falls back to the descriptor's default.
    pub select: Option<String>,
    /// Skip the confirmation prompt on mutating operations.
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PaginateOptions {
    pub select: Option<String>,
    /// Fetch a single page even when the response carries a cursor.
    pub no_auto_iterate: bool,
}

/// Generic invocation adapter over a service invoker.
pub struct Adapter<I> {
    invoker: I,
}

impl<I: ServiceInvoker> Adapter<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Invoke a non-paginated operation: at most one wire call.
    pub async fn invoke(
        &self,
        descriptor: &OperationDescriptor,
        params: &ParamSet,
        options: &InvokeOptions,
        confirm: &dyn ConfirmPrompt,
    ) -> Result<Invocation> {
        let selector = self.resolve_selector(descriptor, options.select.as_deref())?;
        let request = RequestIntent::build(descriptor, params)?;

        if descriptor.mutating && !options.force {
            let prompt = confirmation_prompt(descriptor, params);
            if !confirm.confirm(&prompt) {
                info!(operation = %descriptor.name, "confirmation declined, skipping call");
                return Ok(Invocation::Skipped);
            }
        }

        // An input echo on a read-only operation needs nothing from the
        // wire, so the call is elided entirely.
        if selector.echoes_input() && !descriptor.mutating {
            return Ok(Invocation::Completed(selector.project(&Value::Null, params)));
        }

        debug!(
            operation = %descriptor.name,
            endpoint = %format!("{} {}", descriptor.endpoint.method, descriptor.endpoint.path),
            "invoking service operation"
        );
        let response = self
            .invoker
            .invoke(descriptor, &request)
            .await
            .map_err(|fault| wrap_fault(&descriptor.name, fault))?;

        Ok(Invocation::Completed(selector.project(&response, params)))
    }

    /// Start a paginated invocation. Validation and selector parsing fail
    /// fast here; the returned cursor performs one wire call per
    /// [`PageCursor::next_page`].
    ///
    /// A caller-bound cursor parameter switches to manual paging: exactly
    /// one page is fetched regardless of `no_auto_iterate`.
    pub fn invoke_paginated(
        &self,
        descriptor: &OperationDescriptor,
        params: &ParamSet,
        options: &PaginateOptions,
    ) -> Result<PageCursor<'_, I>> {
        let pagination = descriptor.pagination.clone().ok_or_else(|| {
            CoreError::Validation(format!(
                "operation '{}' does not paginate",
                descriptor.name
            ))
        })?;
        let selector = self.resolve_selector(descriptor, options.select.as_deref())?;
        let request = RequestIntent::build(descriptor, params)?;

        let manual = params.is_caller_bound(&pagination.cursor_param);
        let auto_iterate = !options.no_auto_iterate && !manual;
        if manual {
            debug!(
                operation = %descriptor.name,
                cursor = %pagination.cursor_param,
                "cursor supplied by caller, auto-iteration disabled"
            );
        }

        let state = if selector.echoes_input() && !descriptor.mutating {
            PageState::Echo
        } else {
            PageState::Ready
        };

        Ok(PageCursor {
            invoker: &self.invoker,
            descriptor: descriptor.clone(),
            params: params.clone(),
            selector,
            pagination,
            request,
            cursor: None,
            auto_iterate,
            state,
        })
    }

    fn resolve_selector(
        &self,
        descriptor: &OperationDescriptor,
        select: Option<&str>,
    ) -> Result<Selector> {
        let expression = select.unwrap_or(&descriptor.default_select);
        let selector = Selector::parse(expression)?;
        selector.validate_against(descriptor)?;
        Ok(selector)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Echo,
    Ready,
    Done,
}

/// Sequential page iterator for a paginated operation. Page N+1 is never
/// requested before page N's continuation token is known. There is no
/// iteration cap; termination relies on the service eventually returning
/// an empty token.
#[derive(Debug)]
pub struct PageCursor<'a, I> {
    invoker: &'a I,
    descriptor: OperationDescriptor,
    params: ParamSet,
    selector: Selector,
    pagination: PaginationSpec,
    request: RequestIntent,
    cursor: Option<String>,
    auto_iterate: bool,
    state: PageState,
}

impl<'a, I: ServiceInvoker> PageCursor<'a, I> {
    /// Fetch and project the next page. Returns `None` once the sequence
    /// is exhausted; after an error the sequence is over.
    pub async fn next_page(&mut self) -> Option<Result<Value>> {
        match self.state {
            PageState::Done => None,
            PageState::Echo => {
                self.state = PageState::Done;
                Some(Ok(self.selector.project(&Value::Null, &self.params)))
            }
            PageState::Ready => {
                let request = match self.cursor.take() {
                    None => self.request.clone(),
                    Some(token) => {
                        // A caller-bound cursor means manual paging and no
                        // second page, so this engine bind cannot collide.
                        let mut params = self.params.clone();
                        let built = params
                            .bind_engine(
                                self.pagination.cursor_param.clone(),
                                ParamValue::Str(token),
                            )
                            .and_then(|()| RequestIntent::build(&self.descriptor, &params));
                        match built {
                            Ok(request) => request,
                            Err(e) => {
                                self.state = PageState::Done;
                                return Some(Err(e));
                            }
                        }
                    }
                };

                debug!(
                    operation = %self.descriptor.name,
                    endpoint = %format!("{} {}", self.descriptor.endpoint.method, self.descriptor.endpoint.path),
                    "invoking service operation"
                );
                let response = match self.invoker.invoke(&self.descriptor, &request).await {
                    Ok(response) => response,
                    Err(fault) => {
                        self.state = PageState::Done;
                        return Some(Err(wrap_fault(&self.descriptor.name, fault)));
                    }
                };

                let page = self.selector.project(&response, &self.params);
                let next = response
                    .get(&self.pagination.cursor_response_field)
                    .and_then(Value::as_str)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string);

                match next {
                    Some(token) if self.auto_iterate => self.cursor = Some(token),
                    _ => self.state = PageState::Done,
                }

                Some(Ok(page))
            }
        }
    }

    /// Adapt the cursor into a lazy stream of projected pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> + 'a {
        stream::unfold(self, |mut pager| async move {
            pager.next_page().await.map(|item| (item, pager))
        })
    }
}

fn wrap_fault(operation: &str, fault: InvokeFault) -> CoreError {
    match fault {
        InvokeFault::Service {
            status,
            code,
            message,
        } => CoreError::Service {
            operation: operation.to_string(),
            status,
            code,
            message,
        },
        InvokeFault::Transport {
            message,
            name_resolution,
        } => {
            let message = if name_resolution {
                format!(
                    "{message}; the service hostname could not be resolved - check the profile URL and your network/DNS settings"
                )
            } else {
                message
            };
            CoreError::Connection {
                operation: operation.to_string(),
                message,
            }
        }
    }
}

/// Build the confirmation prompt for a mutating operation: command and
/// operation name plus the identifying values the caller bound.
fn confirmation_prompt(descriptor: &OperationDescriptor, params: &ParamSet) -> String {
    let identifiers: Vec<String> = descriptor
        .required_fields()
        .filter(|f| params.is_caller_bound(&f.name))
        .filter_map(|f| params.get(&f.name).map(|v| format!("\"{}\"", v.display())))
        .collect();

    if identifiers.is_empty() {
        format!("{} ({})", descriptor.command, descriptor.name)
    } else {
        format!(
            "{} ({}) on {}",
            descriptor.command,
            descriptor.name,
            identifiers.join(", ")
        )
    }
}
