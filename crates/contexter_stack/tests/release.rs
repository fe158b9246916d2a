//! Release-order and error-propagation tests for `Contexter`.
//!
//! These tests cover reverse-order release, suppression, and the rule that
//! the most recent cleanup error replaces whatever error was pending.


use contexter_stack::error::BoxError;
use contexter_stack::resource::{Closing, Managed};
use contexter_stack::stack::Contexter;
use test_utils::{EventLog, Handle, Named, Tracked, name_of};

// ─────────────────────────────────────────────────────────────────────────
// Release order
// ─────────────────────────────────────────────────────────────────────────

const NAMES: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

/// Test that N resources are released in exact reverse order, for N = 0..=8.
#[test]
fn release_is_reverse_of_registration() {
    for n in 0..=NAMES.len() {
        let log = EventLog::new();
        let mut stack = Contexter::default();
        stack.activate().unwrap();

        for (i, &name) in NAMES.iter().take(n).enumerate() {
            if i % 2 == 0 {
                stack.register(Managed(Tracked::new(name, &log))).unwrap();
            } else {
                stack.register(Closing(Handle::new(name, &log))).unwrap();
            }
        }
        assert_eq!(stack.len(), n);

        log.clear();
        stack.deactivate(None).unwrap();

        let released: Vec<String> = log
            .events()
            .into_iter()
            .map(|event| event.split(':').nth(1).unwrap_or_default().to_owned())
            .collect();
        let expected: Vec<String> = NAMES
            .iter()
            .take(n)
            .rev()
            .map(|name| (*name).to_owned())
            .collect();
        assert_eq!(released, expected, "release order for n = {n}");
    }
}

/// Test that every entry is released even when several cleanups fail.
#[test]
fn failing_cleanups_do_not_stop_release() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Closing(Handle::new("a", &log).failing_close("a failed")))
        .unwrap();
    stack
        .register(Managed(Tracked::new("b", &log).failing_exit("b failed")))
        .unwrap();
    stack
        .register(Closing(Handle::new("c", &log).failing_close("c failed")))
        .unwrap();
    log.clear();

    let error = stack.deactivate(None).unwrap_err();

    assert_eq!(
        log.events(),
        vec!["close:c", "exit:b", "saw:b:c failed", "close:a"]
    );
    assert_eq!(name_of(&error), Some("a failed"));
}

// ─────────────────────────────────────────────────────────────────────────
// Suppression
// ─────────────────────────────────────────────────────────────────────────

/// Test that a suppressing exit clears the body error.
#[test]
fn suppressing_exit_clears_body_error() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Managed(Tracked::new("outer", &log)))
        .unwrap();
    stack
        .register(Managed(Tracked::new("guard", &log).suppressing()))
        .unwrap();

    let result = stack.deactivate(Some(Box::new(Named("body"))));

    assert!(result.is_ok());
    // The outer resource runs after the suppression and sees no error.
    assert!(log.with_prefix("saw:outer").is_empty());
    assert_eq!(log.with_prefix("saw:guard:"), vec!["body"]);
}

/// Test that closing never suppresses the body error.
#[test]
fn close_does_not_suppress() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack.register(Closing(Handle::new("file", &log))).unwrap();

    let error = stack
        .deactivate(Some(Box::new(Named("body"))))
        .unwrap_err();

    assert_eq!(name_of(&error), Some("body"));
    assert_eq!(log.with_prefix("close:"), vec!["file"]);
}

/// Test that the body error propagates unchanged when nothing suppresses it.
#[test]
fn body_error_propagates_unchanged() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack.register(Managed(Tracked::new("a", &log))).unwrap();
    stack.register(Managed(Tracked::new("b", &log))).unwrap();

    let error = stack
        .deactivate(Some(Box::new(Named("body"))))
        .unwrap_err();

    assert_eq!(name_of(&error), Some("body"));
    assert_eq!(log.with_prefix("saw:"), vec!["b:body", "a:body"]);
}

/// Test that an empty scope hands back the incoming error as-is.
#[test]
fn empty_scope_returns_incoming_error() {
    let mut stack = Contexter::default();
    stack.activate().unwrap();

    let error = stack
        .deactivate(Some(Box::new(Named("body"))))
        .unwrap_err();
    assert_eq!(name_of(&error), Some("body"));

    stack.activate().unwrap();
    assert!(stack.deactivate(None).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────
// Most recent cleanup error wins
// ─────────────────────────────────────────────────────────────────────────

/// Test that the error of the last-released resource is the one propagated.
#[test]
fn last_released_error_wins() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Managed(Tracked::new("r1", &log).failing_exit("E1")))
        .unwrap();
    stack
        .register(Closing(Handle::new("r2", &log).failing_close("E2")))
        .unwrap();

    let error = stack.deactivate(None).unwrap_err();

    assert_eq!(name_of(&error), Some("E1"));
    // R1 saw E2 as the pending error before replacing it.
    assert_eq!(log.with_prefix("saw:r1:"), vec!["E2"]);
}

/// Test that a cleanup error replaces the body error.
#[test]
fn cleanup_error_replaces_body_error() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Closing(Handle::new("db", &log).failing_close("db close")))
        .unwrap();

    let error = stack
        .deactivate(Some(Box::new(Named("body"))))
        .unwrap_err();
    assert_eq!(name_of(&error), Some("db close"));
}

/// Test that a cleanup error after a suppression still propagates.
#[test]
fn cleanup_error_after_suppression_propagates() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Closing(Handle::new("late", &log).failing_close("late")))
        .unwrap();
    stack
        .register(Managed(Tracked::new("guard", &log).suppressing()))
        .unwrap();

    let error = stack
        .deactivate(Some(Box::new(Named("body"))))
        .unwrap_err();
    assert_eq!(name_of(&error), Some("late"));
}

/// Test that a suppressing exit also clears an earlier cleanup error.
#[test]
fn suppression_clears_cleanup_error() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();
    stack
        .register(Managed(Tracked::new("guard", &log).suppressing()))
        .unwrap();
    stack
        .register(Closing(Handle::new("flaky", &log).failing_close("flaky")))
        .unwrap();

    assert!(stack.deactivate(None).is_ok());
    assert_eq!(log.with_prefix("saw:guard:"), vec!["flaky"]);
}

// ─────────────────────────────────────────────────────────────────────────
// Callbacks
// ─────────────────────────────────────────────────────────────────────────

/// Test that exit callbacks and plain callbacks share the release order.
#[test]
fn callbacks_release_in_reverse_order() {
    let log = EventLog::new();
    let mut stack = Contexter::default();
    stack.activate().unwrap();

    let first = log.clone();
    stack
        .callback(move || {
            first.push("callback");
            Ok(())
        })
        .unwrap();
    let second = log.clone();
    stack
        .push_exit(move |error| {
            second.push(format!("exit:{}", error.is_some()));
            Ok(false)
        })
        .unwrap();
    let third = log.clone();
    stack
        .callback_with(
            move |name: &'static str| {
                third.push(name);
                Ok(())
            },
            "bound",
        )
        .unwrap();

    stack.deactivate(None).unwrap();
    assert_eq!(log.events(), vec!["bound", "exit:false", "callback"]);
}

/// Test that an exit callback can suppress a body error.
#[test]
fn exit_callback_suppresses() {
    let mut stack = Contexter::default();
    let outcome = stack.scope(|stack| {
        stack.push_exit(|error| Ok(error.and_then(name_of) == Some("expected")))?;
        Err::<(), BoxError>(Box::new(Named("expected")))
    });

    assert!(matches!(outcome, Ok(None)));
}

/// Test that an unsuppressed body error escapes the structured scope.
#[test]
fn scope_propagates_body_error() {
    let mut stack = Contexter::default();
    let outcome: Result<Option<()>, BoxError> =
        stack.scope(|_| Err(Box::new(Named("unexpected"))));

    let error = outcome.unwrap_err();
    assert_eq!(name_of(&error), Some("unexpected"));
    assert!(!stack.is_active());
}
