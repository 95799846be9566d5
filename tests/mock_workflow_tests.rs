//! Full mocking workflows through the facade crate
//!
//! These tests mirror how a test suite consumes the library: one context
//! per harness, `ensure_subject` at the start of each test method, stubs
//! before the code under test runs, assertions after.

use std::sync::Arc;
use understudy::matchers::{any, eq};
use understudy::{
    CallDelegate, CallResult, Invocation, Mock, MockContext, MockedType, Raised, ReturnKind, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// The code under test: stores a document and notifies on success
fn store_and_notify(storage: &Mock, notifier: &Mock, document: &str) -> Result<bool, Raised> {
    let stored = storage
        .invoke_values("save", vec![document.into()])
        .expect("mock misuse")?;
    let stored = stored.as_bool().unwrap_or(false);
    if stored {
        notifier
            .invoke_values("notify", vec![format!("stored {}", document).into()])
            .expect("mock misuse")?;
    }
    Ok(stored)
}

fn storage_type() -> MockedType {
    MockedType::new("Storage").method("save", 1, ReturnKind::Bool)
}

fn notifier_type() -> MockedType {
    MockedType::new("Notifier").method("notify", 1, ReturnKind::Void)
}

#[test]
fn test_success_path_notifies_in_order() {
    init_tracing();
    let context = MockContext::new();
    context.ensure_subject("test_success_path_notifies_in_order");
    let storage = context.mock("storage", storage_type());
    let notifier = context.mock("notifier", notifier_type());

    storage.returns(true).call("save", vec![eq("doc")]).unwrap();
    notifier.stubs().call("notify", vec![any()]).unwrap();

    assert_eq!(store_and_notify(&storage, &notifier, "doc"), Ok(true));

    storage
        .assert_invoked_in_sequence()
        .call("save", vec![eq("doc")])
        .unwrap();
    notifier
        .assert_invoked_in_sequence()
        .call("notify", vec![eq("stored doc")])
        .unwrap();
    context.assert_no_more_invocations().unwrap();
}

#[test]
fn test_failure_path_stays_silent() {
    init_tracing();
    let context = MockContext::new();
    context.ensure_subject("test_failure_path_stays_silent");
    let storage = context.mock("storage", storage_type());
    let notifier = context.mock("notifier", notifier_type());

    storage.returns(false).call("save", vec![any()]).unwrap();

    assert_eq!(store_and_notify(&storage, &notifier, "doc"), Ok(false));

    notifier.assert_not_invoked().call("notify", vec![any()]).unwrap();
}

#[test]
fn test_raised_storage_error_reaches_the_caller() {
    init_tracing();
    let context = MockContext::new();
    let storage = context.mock("storage", storage_type());
    let notifier = context.mock("notifier", notifier_type());

    storage
        .once_raises(Raised::new("DiskFull", "no space left"))
        .call("save", vec![any()])
        .unwrap();

    let result = store_and_notify(&storage, &notifier, "doc");
    assert_eq!(result, Err(Raised::new("DiskFull", "no space left")));

    // The raised call is part of the observed history
    storage.assert_invoked().call("save", vec![eq("doc")]).unwrap();
    notifier.assert_not_invoked().call("notify", vec![any()]).unwrap();
}

#[test]
fn test_partial_mock_overrides_only_what_is_stubbed() {
    init_tracing();

    struct RealStorage;
    impl CallDelegate for RealStorage {
        fn call(&self, invocation: &Invocation) -> CallResult {
            // The original accepts everything except empty documents
            let document = invocation.argument_snapshots()[0]
                .as_str()
                .unwrap_or("")
                .to_string();
            Ok(Value::Bool(!document.is_empty()))
        }
    }

    let context = MockContext::new();
    let storage = context.partial_mock("storage", storage_type(), Arc::new(RealStorage));

    // Unstubbed calls run the original behavior
    assert_eq!(
        storage.invoke_values("save", vec!["doc".into()]).unwrap(),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        storage.invoke_values("save", vec!["".into()]).unwrap(),
        Ok(Value::Bool(false))
    );

    // A stub takes precedence where it matches
    storage.returns(false).call("save", vec![eq("doc")]).unwrap();
    assert_eq!(
        storage.invoke_values("save", vec!["doc".into()]).unwrap(),
        Ok(Value::Bool(false))
    );
    assert_eq!(
        storage.invoke_values("save", vec!["other".into()]).unwrap(),
        Ok(Value::Bool(true))
    );
}
