use crate::{ADMIN_DISABLED_FAULT, NOT_CONFIGURED_FAULT, RpcError};

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, pat};

#[test]
fn given_admin_disabled_fault_text_when_classified_then_admin_disabled() {
    // When
    let error = RpcError::fault(format!("Server fault: {ADMIN_DISABLED_FAULT}"));

    // Then
    assert_that!(error, pat!(RpcError::AdminDisabled { .. }));
    assert_that!(error.is_network(), eq(false));
}

#[test]
fn given_not_configured_fault_text_when_classified_then_not_configured() {
    // When
    let error = RpcError::fault(NOT_CONFIGURED_FAULT);

    // Then
    assert_that!(error.is_not_configured(), eq(true));
}

#[test]
fn given_other_fault_text_when_classified_then_plain_fault() {
    // When
    let error = RpcError::fault("disk full");

    // Then
    assert_that!(
        error,
        pat!(RpcError::Fault {
            message: eq("disk full"),
            ..
        })
    );
}

#[test]
fn given_connection_refused_when_inspected_then_network_class_with_safe_message() {
    // When
    let error = RpcError::connection_refused("https://127.0.0.1:2124/ssg/services/nodeapi");

    // Then
    assert_that!(error.is_network(), eq(true));
    assert_that!(error.is_connection_refused(), eq(true));
    assert_that!(error.safe_message(), eq("connection refused"));
    assert_that!(error.to_string(), contains_substring("127.0.0.1:2124"));
}

#[test]
fn given_timeout_when_inspected_then_network_but_not_refused() {
    // When
    let error = RpcError::network("https://127.0.0.1:2124", "timed out");

    // Then
    assert_that!(error.is_network(), eq(true));
    assert_that!(error.is_connection_refused(), eq(false));
    assert_that!(error.safe_message(), eq("timed out"));
}
