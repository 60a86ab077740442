//! Wire-format tests for the correlation envelope.
//!
//! Inline snapshots pin the exact JSON text that callers parse.

use cipherbox_proto::{
    Correlation, CorrelationId, CorrelationMode, ErrorKind, OperationTag, Outcome,
    PayloadLimits, RequestValidator, Response,
};
use serde_json::json;

/// Validate, and on rejection build the response the worker would send.
fn reject(mode: CorrelationMode, message: &serde_json::Value) -> String {
    let validator = RequestValidator::new(mode, PayloadLimits::default());
    let rejection = validator.validate(message).unwrap_err();
    Response::failure(rejection.correlation, rejection.kind).to_json()
}

#[test]
fn empty_message_gets_error_marker() {
    insta::assert_snapshot!(
        reject(CorrelationMode::MessageId, &json!([])),
        @r#"["error","MalformedRequest"]"#
    );
}

#[test]
fn unknown_operation_is_addressed_by_id() {
    insta::assert_snapshot!(
        reject(CorrelationMode::MessageId, &json!(["rotate-keys", "corr-4"])),
        @r#"["corr-4",{"error":"UnsupportedOperation"}]"#
    );
}

#[test]
fn numeric_ids_are_echoed_as_numbers() {
    insta::assert_snapshot!(
        reject(CorrelationMode::MessageId, &json!(["encrypt", 17, "hello"])),
        @r#"[17,{"error":"MissingParameter"}]"#
    );
}

#[test]
fn tag_mode_failures_use_error_marker() {
    insta::assert_snapshot!(
        reject(CorrelationMode::OperationTag, &json!(["encrypt", "hello"])),
        @r#"["error","MissingParameter"]"#
    );
}

#[test]
fn key_not_initialized_scenario() {
    let response = Response::failure(
        Correlation::Id(CorrelationId::from("corr-9")),
        ErrorKind::KeyNotInitialized,
    );
    insta::assert_snapshot!(response.to_json(), @r#"["corr-9",{"error":"KeyNotInitialized"}]"#);
}

#[test]
fn public_key_response_shape() {
    let response = Response::success(
        Correlation::Id(CorrelationId::from("corr-1")),
        Outcome::PublicKey("QUJD".to_string()),
    );
    insta::assert_snapshot!(response.to_json(), @r#"["corr-1",{"publicKey":"QUJD"}]"#);
}

#[test]
fn tag_mode_success_is_keyed_by_operation() {
    let response = Response::success(
        Correlation::Tag(OperationTag::Decrypt),
        Outcome::Plaintext("hello".to_string()),
    );
    insta::assert_snapshot!(response.to_json(), @r#"["decrypt","hello"]"#);
}
