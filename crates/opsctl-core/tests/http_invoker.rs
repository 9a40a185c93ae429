//! HttpInvoker against a local mock service: wire shapes, auth header,
//! error mapping, and the full adapter pipeline over HTTP.

use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsctl_core::{
    Adapter, EndpointSpec, FieldSpec, HttpInvoker, Invocation, InvokeOptions, OperationDescriptor,
    PaginateOptions, PaginationSpec, ParamSet, ParamValue, RequestIntent, ServiceInvoker,
    ValueKind,
};

fn field(name: &str, wire: &str, kind: ValueKind, required: bool) -> FieldSpec {
    FieldSpec {
        name: name.into(),
        wire_name: wire.into(),
        kind,
        required,
        help: String::new(),
    }
}

fn submit_job_op() -> OperationDescriptor {
    OperationDescriptor {
        name: "SubmitJob".into(),
        command: "submit-job".into(),
        about: String::new(),
        mutating: true,
        fields: vec![
            field("name", "Name", ValueKind::String, true),
            field("priority", "Priority", ValueKind::Integer, false),
        ],
        pagination: None,
        default_select: "JobId".into(),
        endpoint: EndpointSpec {
            method: "POST".into(),
            path: "/v1/SubmitJob".into(),
        },
    }
}

fn get_job_logs_op() -> OperationDescriptor {
    OperationDescriptor {
        name: "GetJobLogs".into(),
        command: "get-job-logs".into(),
        about: String::new(),
        mutating: false,
        fields: vec![
            field("job-id", "JobId", ValueKind::String, true),
            field("stream", "Stream", ValueKind::String, false),
        ],
        pagination: None,
        default_select: "*".into(),
        endpoint: EndpointSpec {
            method: "GET".into(),
            path: "/v1/jobs/{JobId}/logs".into(),
        },
    }
}

fn list_jobs_op() -> OperationDescriptor {
    OperationDescriptor {
        name: "ListJobs".into(),
        command: "list-jobs".into(),
        about: String::new(),
        mutating: false,
        fields: vec![field("next-token", "NextToken", ValueKind::String, false)],
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

fn invoker(server: &MockServer) -> HttpInvoker {
    HttpInvoker::builder()
        .url(server.uri())
        .token("test-token")
        .build()
        .unwrap()
}

#[tokio::test]
async fn post_sends_json_body_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/SubmitJob"))
        .and(bearer_token("test-token"))
        .and(body_json(json!({"Name": "nightly", "Priority": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"JobId": "job-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ParamSet::new();
    params.bind("name", ParamValue::Str("nightly".into())).unwrap();
    params.bind("priority", ParamValue::Int(3)).unwrap();
    let request = RequestIntent::build(&submit_job_op(), &params).unwrap();

    let response = invoker(&server)
        .invoke(&submit_job_op(), &request)
        .await
        .unwrap();
    assert_eq!(response, json!({"JobId": "job-1"}));
}

#[tokio::test]
async fn get_substitutes_path_and_sends_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs/job-42/logs"))
        .and(query_param("Stream", "stderr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Lines": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ParamSet::new();
    params.bind("job-id", ParamValue::Str("job-42".into())).unwrap();
    params.bind("stream", ParamValue::Str("stderr".into())).unwrap();
    let request = RequestIntent::build(&get_job_logs_op(), &params).unwrap();

    let response = invoker(&server)
        .invoke(&get_job_logs_op(), &request)
        .await
        .unwrap();
    assert_eq!(response, json!({"Lines": []}));
}

#[tokio::test]
async fn empty_success_body_becomes_an_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/SubmitJob"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut params = ParamSet::new();
    params.bind("name", ParamValue::Str("n".into())).unwrap();
    let request = RequestIntent::build(&submit_job_op(), &params).unwrap();

    let response = invoker(&server)
        .invoke(&submit_job_op(), &request)
        .await
        .unwrap();
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn error_status_maps_to_a_service_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/SubmitJob"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "duplicate job name", "code": "Conflict"})),
        )
        .mount(&server)
        .await;

    let mut params = ParamSet::new();
    params.bind("name", ParamValue::Str("n".into())).unwrap();
    let request = RequestIntent::build(&submit_job_op(), &params).unwrap();

    let fault = invoker(&server)
        .invoke(&submit_job_op(), &request)
        .await
        .unwrap_err();
    let text = fault.to_string();
    assert!(text.contains("duplicate job name"), "got: {text}");
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_a_transport_fault() {
    // Nothing listens on this port.
    let invoker = HttpInvoker::builder()
        .url("http://127.0.0.1:9")
        .build()
        .unwrap();

    let mut params = ParamSet::new();
    params.bind("name", ParamValue::Str("n".into())).unwrap();
    let request = RequestIntent::build(&submit_job_op(), &params).unwrap();

    let fault = invoker.invoke(&submit_job_op(), &request).await.unwrap_err();
    assert!(matches!(
        fault,
        opsctl_core::InvokeFault::Transport { .. }
    ));
}

#[tokio::test]
async fn adapter_paginates_over_http() {
    use futures::StreamExt;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ListJobs"))
        .and(body_json(json!({})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"Jobs": [{"Id": 1}], "NextToken": "A"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/ListJobs"))
        .and(body_json(json!({"NextToken": "A"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Jobs": [{"Id": 2}], "NextToken": ""})),
        )
        .mount(&server)
        .await;

    let adapter = Adapter::new(invoker(&server));
    let pages: Vec<_> = adapter
        .invoke_paginated(&list_jobs_op(), &ParamSet::new(), &PaginateOptions::default())
        .unwrap()
        .into_stream()
        .collect()
        .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].as_ref().unwrap(), &json!([{"Id": 1}]));
    assert_eq!(pages[1].as_ref().unwrap(), &json!([{"Id": 2}]));
}

#[tokio::test]
async fn adapter_invokes_mutating_operation_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/SubmitJob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"JobId": "job-7"})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = Adapter::new(invoker(&server));
    let mut params = ParamSet::new();
    params.bind("name", ParamValue::Str("nightly".into())).unwrap();

    let outcome = adapter
        .invoke(
            &submit_job_op(),
            &params,
            &InvokeOptions::default(),
            &|_: &str| true,
        )
        .await
        .unwrap();

    // Default selector picks the JobId field out of the response.
    assert_eq!(outcome, Invocation::Completed(json!("job-7")));
}
