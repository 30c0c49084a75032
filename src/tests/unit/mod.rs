//! Unit tests for the confirmation state machine and its timing semantics
//!
//! All timer-dependent tests run with paused tokio time, so the polling
//! budget elapses deterministically.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::application::ports::SessionStore;
use crate::domain::{AttemptStatus, GatewayPaymentState};
use crate::shared::error::AppError;
use crate::tests::common::{harness, harness_with_gateway, initiate_request, ScriptedGateway};

#[tokio::test(start_paused = true)]
async fn success_after_two_pending_polls() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![
        Ok(GatewayPaymentState::Pending),
        Ok(GatewayPaymentState::Pending),
        Ok(GatewayPaymentState::Success),
    ]);

    let snapshot = h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    assert_eq!(snapshot.reference, "abc123");
    assert_eq!(snapshot.status, AttemptStatus::Pending);

    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert_eq!(snapshot.attempts_made, 3);
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(snapshot.entitlement_warning.is_none());
    assert_eq!(h.metrics.get_metrics().succeeded, 1);
}

#[tokio::test(start_paused = true)]
async fn completed_is_a_synonym_for_success() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway
        .script_status(vec![Ok(GatewayPaymentState::parse("completed"))]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn all_pending_times_out_exactly_on_budget() {
    // 40 attempts x 3 s: the 40th poll lands at t = 120 s
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(119)).await;
    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Pending);
    assert_eq!(snapshot.attempts_made, 39);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::TimedOut);
    assert_eq!(snapshot.attempts_made, 40);

    // Timeout is an unknown outcome, not a failure: the session is never
    // touched and the loop issues no further polls
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 0);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.gateway.status_calls.load(Ordering::SeqCst), 40);
    assert_eq!(h.metrics.get_metrics().timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn decline_stops_the_loop_immediately() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![
        Ok(GatewayPaymentState::Pending),
        Ok(GatewayPaymentState::Failed),
    ]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Failed);
    assert_eq!(snapshot.attempts_made, 2);
    assert_eq!(h.gateway.status_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.get_metrics().declined, 1);
}

#[tokio::test(start_paused = true)]
async fn initiation_failure_is_synchronous_and_registers_nothing() {
    let h = harness();
    h.gateway
        .script_initiate(Err(AppError::Initiation("card declined at setup".into())));

    let result = h.service.initiate(initiate_request("plan_pro")).await;
    assert!(matches!(result, Err(AppError::Initiation(_))));

    // No attempt exists and no polling timer was scheduled
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.gateway.status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.get_metrics().attempts_initiated, 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_requests_never_reach_the_gateway() {
    let h = harness();
    let mut request = initiate_request("plan_pro");
    request.amount = -1.0;

    let result = h.service.initiate(request).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(h.gateway.initiate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn transient_poll_errors_do_not_fail_the_attempt() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    let mut script: Vec<_> = (0..5)
        .map(|n| Err(AppError::Gateway(format!("connection reset {}", n))))
        .collect();
    script.push(Ok(GatewayPaymentState::Success));
    h.gateway.script_status(script);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert_eq!(snapshot.attempts_made, 6);
    assert_eq!(h.metrics.get_metrics().transient_poll_errors, 5);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_gateway_states_are_pending_equivalent() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![
        Ok(GatewayPaymentState::Unrecognized("processing".into())),
        Ok(GatewayPaymentState::Unrecognized("awaiting_pin".into())),
        Ok(GatewayPaymentState::Success),
    ]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert_eq!(snapshot.attempts_made, 3);
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_stops_polling() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();

    // 10 polls by t = 31 s
    tokio::time::sleep(Duration::from_secs(31)).await;
    let snapshot = h.service.cancel("abc123").await.unwrap();
    assert!(!snapshot.active);
    assert_eq!(snapshot.status, AttemptStatus::Pending);
    assert_eq!(snapshot.attempts_made, 10);

    // Second cancel changes nothing
    let again = h.service.cancel("abc123").await.unwrap();
    assert!(!again.active);
    assert_eq!(again.attempts_made, 10);
    assert_eq!(h.metrics.get_metrics().cancelled, 1);

    // No further ticks run after cancellation
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.gateway.status_calls.load(Ordering::SeqCst), 10);
    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_terminal_state_is_a_no_op() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![Ok(GatewayPaymentState::Success)]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = h.service.cancel("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert!(snapshot.active);
    assert_eq!(h.metrics.get_metrics().cancelled, 0);
}

#[tokio::test(start_paused = true)]
async fn terminal_state_survives_later_script_entries() {
    // Even with a decline queued after the success, the first terminal
    // transition wins and nothing resurrects the attempt
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![
        Ok(GatewayPaymentState::Success),
        Ok(GatewayPaymentState::Failed),
    ]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(200)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert_eq!(h.gateway.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_failure_keeps_success_with_secondary_warning() {
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![Ok(GatewayPaymentState::Success)]);
    h.sessions.fail_refresh("session service down");

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = h.service.status("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert!(snapshot.entitlement_warning.is_some());
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.metrics.get_metrics().refresh_warnings, 1);
}

#[tokio::test(start_paused = true)]
async fn status_checks_never_overlap_for_one_reference() {
    // Each status call takes a second; sequential ticks must wait for the
    // prior response before issuing the next check
    let gateway = ScriptedGateway::new().with_status_delay(Duration::from_secs(1));
    let h = harness_with_gateway(gateway);
    h.gateway.script_initiate(Ok("abc123"));

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert!(h.gateway.status_calls.load(Ordering::SeqCst) >= 4);
    assert!(!h.gateway.overlap_detected.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn new_attempt_for_same_flow_supersedes_previous() {
    let h = harness();
    h.gateway.script_initiate(Ok("ref_one"));
    h.gateway.script_initiate(Ok("ref_two"));

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();

    // The superseded attempt is cancelled and dropped from the registry
    assert!(matches!(
        h.service.status("ref_one").await,
        Err(AppError::UnknownAttempt(_))
    ));
    assert_eq!(h.metrics.get_metrics().cancelled, 1);

    let new = h.service.status("ref_two").await.unwrap();
    assert!(new.active);
    assert_eq!(new.status, AttemptStatus::Pending);

    // Only the new attempt keeps polling
    let polls_so_far = h.gateway.status_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(8)).await;
    assert_eq!(
        h.gateway.status_calls.load(Ordering::SeqCst),
        polls_so_far + 2
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_during_entitlement_refresh_lets_it_finish() {
    // The session refresh runs after the success transition; a cancel
    // arriving while it is still in flight must not abort it
    let h = harness();
    h.gateway.script_initiate(Ok("abc123"));
    h.gateway.script_status(vec![Ok(GatewayPaymentState::Success)]);
    h.sessions.delay_refresh(Duration::from_secs(5));

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();

    // Success lands at t = 3 s; the refresh is mid-flight at t = 4 s
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 0);

    let snapshot = h.service.cancel("abc123").await.unwrap();
    assert_eq!(snapshot.status, AttemptStatus::Success);
    assert!(snapshot.active);
    assert_eq!(h.metrics.get_metrics().cancelled, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.sessions.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(h.sessions.current().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn finished_attempt_releases_its_flow() {
    // Once an attempt reaches a terminal state it no longer owns the
    // checkout flow, so a later initiation for the same purpose does not
    // cancel or drop it
    let h = harness();
    h.gateway.script_initiate(Ok("ref_one"));
    h.gateway.script_initiate(Ok("ref_two"));
    h.gateway.script_status(vec![Ok(GatewayPaymentState::Success)]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();

    let old = h.service.status("ref_one").await.unwrap();
    assert_eq!(old.status, AttemptStatus::Success);
    let new = h.service.status("ref_two").await.unwrap();
    assert!(new.active);
    assert_eq!(h.metrics.get_metrics().cancelled, 0);
}

#[tokio::test(start_paused = true)]
async fn finished_attempts_are_evicted_after_retention() {
    let h = harness();
    h.gateway.script_initiate(Ok("ref_one"));
    h.gateway.script_status(vec![Ok(GatewayPaymentState::Success)]);

    h.service.initiate(initiate_request("plan_pro")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.service.status("ref_one").await.is_ok());

    // Past the retention window, the next initiation sweeps it out
    tokio::time::sleep(Duration::from_secs(
        h.config.polling.retention_seconds + 60,
    ))
    .await;
    h.service.initiate(initiate_request("plan_basic")).await.unwrap();

    assert!(matches!(
        h.service.status("ref_one").await,
        Err(AppError::UnknownAttempt(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_references_are_reported_as_such() {
    let h = harness();
    assert!(matches!(
        h.service.status("missing").await,
        Err(AppError::UnknownAttempt(_))
    ));
    assert!(matches!(
        h.service.cancel("missing").await,
        Err(AppError::UnknownAttempt(_))
    ));
}

#[test]
fn default_config_matches_design_budget() {
    let config = crate::tests::config::test_config();
    assert_eq!(config.polling.interval_seconds, 3);
    assert_eq!(config.polling.max_attempts, 40);
    assert_eq!(config.polling.retention_seconds, 900);
    assert_eq!(config.confirmation_budget(), Duration::from_secs(120));
    assert!(config.validate_config().is_ok());
}
