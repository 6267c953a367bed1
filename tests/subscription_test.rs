//! Subscription lifecycle: listen, failure handling, two-phase stop,
//! restart-in-place, and delete guards.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use streamvisor::{
    ReadFrom, RunState, StreamMessage, SubscribeOptions, SubscriptionError, Subscriptions,
    WaitForFinish,
};

fn registry(client: Arc<ScriptedClient>) -> Subscriptions {
    Subscriptions::with_config(client, fast_config())
}

#[tokio::test]
async fn test_listen_transitions_to_running() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    assert!(sub.state().is(RunState::Initial));
    assert!(!sub.has_worker_handle());

    sub.listen().unwrap();
    assert!(sub.state().is(RunState::Running));
    assert!(sub.has_worker_handle());
    wait_until("the worker to open the stream", || client.calls() == 1).await;
}

#[tokio::test]
async fn test_listen_is_idempotent_while_handle_present() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap().listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.calls(), 1, "a second listen must not spawn a worker");
}

#[tokio::test]
async fn test_transport_failure_turns_dead() {
    let client = ScriptedClient::failing();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the subscription to die", || {
        sub.state().is(RunState::Dead)
    })
    .await;

    let statistic = sub.statistic();
    assert_eq!(statistic.errors_count(), 1);
    let last = statistic.last_error().expect("last_error must be recorded");
    assert!(matches!(*last, SubscriptionError::Client(_)));
    assert!(!sub.is_worker_alive());

    // The handle stays assigned, so listen on a dead subscription is a no-op;
    // reviving it is restart's job.
    sub.listen().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_handler_failure_is_fatal_and_recorded() {
    let client = ScriptedClient::scripted(
        vec![event_msg("orders", 1, 10, 9)],
        AfterFeed::StayOpen,
    );
    let registry = registry(client.clone());
    let sub = registry.create(
        "orders",
        SubscribeOptions::default(),
        failing_handler("handler exploded"),
    );

    sub.listen().unwrap();
    wait_until("the subscription to die", || {
        sub.state().is(RunState::Dead)
    })
    .await;

    let statistic = sub.statistic();
    assert_eq!(statistic.errors_count(), 1);
    assert_eq!(statistic.events_processed(), 0);
    let last = statistic.last_error().unwrap();
    assert!(matches!(*last, SubscriptionError::Handler(_)));
    // Handler failure aborts the message before the checkpoint applies it.
    assert!(sub.checkpoint().is_empty());
}

#[tokio::test]
async fn test_update_hook_failure_is_fatal_but_value_sticks() {
    let client = ScriptedClient::scripted(
        vec![event_msg("orders", 7, 10, 9)],
        AfterFeed::StayOpen,
    );
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());
    sub.checkpoint()
        .as_revision()
        .unwrap()
        .register_update_hook(|_| Err("sink offline".into()));

    sub.listen().unwrap();
    wait_until("the subscription to die", || {
        sub.state().is(RunState::Dead)
    })
    .await;

    let last = sub.statistic().last_error().unwrap();
    assert!(matches!(*last, SubscriptionError::UpdateHook(_)));
    assert_eq!(sub.checkpoint().as_revision().unwrap().get(), Some(7));
}

#[tokio::test]
async fn test_events_reach_handler_and_checkpoint() {
    let client = ScriptedClient::scripted(
        vec![event_msg("orders", 1, 10, 9), event_msg("orders", 2, 20, 19)],
        AfterFeed::StayOpen,
    );
    let registry = registry(client.clone());
    let (handler, count) = counting_handler();
    let sub = registry.create("orders", SubscribeOptions::default(), handler);

    sub.listen().unwrap();
    wait_until("both events to be processed", || {
        sub.statistic().events_processed() == 2
    })
    .await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(sub.checkpoint().as_revision().unwrap().get(), Some(2));
}

#[tokio::test]
async fn test_checkpoint_markers_update_without_delivery() {
    let client = ScriptedClient::scripted(
        vec![StreamMessage::Checkpoint {
            commit_position: 1023,
            prepare_position: 0,
        }],
        AfterFeed::StayOpen,
    );
    let registry = registry(client.clone());
    let sub = registry.create_for_all(SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the marker to reach the checkpoint", || {
        sub.checkpoint().is_present()
    })
    .await;

    let position = sub.checkpoint().as_position().unwrap().get().unwrap();
    assert_eq!(position.commit_position, 1023);
    assert_eq!(position.prepare_position, 0);
    assert_eq!(sub.statistic().events_processed(), 0);
}

#[tokio::test]
async fn test_stop_listening_two_phase_with_forced_abort() {
    // A hanging transport ignores the cooperative signal, so only the forced
    // phase can end the worker.
    let client = ScriptedClient::hanging();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;

    sub.stop_listening().unwrap();
    assert!(sub.state().is(RunState::Halting));

    sub.wait_for_finish().await;
    assert!(sub.state().is(RunState::Stopped));
    assert!(!sub.has_worker_handle());
    assert!(!sub.is_worker_alive());
}

#[tokio::test]
async fn test_stop_listening_cooperative_path() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;

    sub.stop_listening().unwrap();
    sub.wait_for_finish().await;
    assert!(sub.state().is(RunState::Stopped));
    assert!(!sub.has_worker_handle());
}

#[tokio::test]
async fn test_stop_listening_noop_without_live_worker() {
    let client = ScriptedClient::idle();
    let live_registry = registry(client.clone());
    let sub = live_registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.stop_listening().unwrap();
    assert!(sub.state().is(RunState::Initial));
    assert!(!sub.has_worker_handle());

    let dead_client = ScriptedClient::failing();
    let dead_registry = registry(dead_client.clone());
    let dead = dead_registry.create("orders", SubscribeOptions::default(), ok_handler());
    dead.listen().unwrap();
    wait_until("the subscription to die", || {
        dead.state().is(RunState::Dead)
    })
    .await;

    dead.stop_listening().unwrap();
    assert!(dead.state().is(RunState::Dead), "stop must not touch a dead subscription");
    assert!(dead.has_worker_handle());
}

#[tokio::test]
async fn test_restart_resumes_from_checkpoint() {
    let client = ScriptedClient::fail_once_then_idle(vec![event_msg("orders", 5, 50, 49)]);
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());
    let statistic = sub.statistic();

    sub.listen().unwrap();
    wait_until("the first worker to die", || sub.state().is(RunState::Dead)).await;
    assert_eq!(statistic.errors_count(), 1);
    assert!(statistic.last_restart_at().is_none());

    sub.restart().unwrap();
    assert!(sub.state().is(RunState::Running));
    assert!(statistic.last_restart_at().is_some());
    wait_until("a new worker to open the stream", || client.calls() == 2).await;

    // Same statistic object, same checkpoint - restart resumes, not recreates.
    assert!(Arc::ptr_eq(&statistic, &sub.statistic()));
    let options = client.captured_options();
    assert_eq!(options[0].start, None);
    assert_eq!(options[1].start, Some(ReadFrom::Revision(5)));
}

#[tokio::test]
async fn test_restart_noop_while_worker_alive() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;

    sub.restart().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.calls(), 1);
    assert!(sub.statistic().last_restart_at().is_none());
}

#[tokio::test]
async fn test_delete_refuses_while_alive_then_disposes() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;

    let err = sub.delete().unwrap_err();
    assert!(matches!(err, SubscriptionError::WorkerAlive));
    assert!(!sub.is_disposed());
    assert!(sub.state().is(RunState::Running), "a refused delete must not mutate");

    sub.stop_listening().unwrap();
    sub.wait_for_finish().await;

    sub.delete().unwrap();
    assert!(sub.is_disposed());
    assert!(!sub.has_worker_handle());

    assert!(matches!(
        sub.listen().unwrap_err(),
        SubscriptionError::Disposed
    ));
    assert!(matches!(
        sub.stop_listening().unwrap_err(),
        SubscriptionError::Disposed
    ));
    assert!(matches!(
        sub.restart().unwrap_err(),
        SubscriptionError::Disposed
    ));
    assert!(matches!(
        sub.delete().unwrap_err(),
        SubscriptionError::Disposed
    ));
}

#[tokio::test]
async fn test_worker_options_are_adjusted_not_caller_options() {
    let client = ScriptedClient::idle();
    let registry = registry(client.clone());
    let options = SubscribeOptions {
        skip_decryption: Some(true),
        ..SubscribeOptions::default()
    };
    let sub = registry.create("orders", options, ok_handler());

    sub.listen().unwrap();
    wait_until("the worker to open the stream", || client.calls() == 1).await;

    let sent = &client.captured_options()[0];
    // Transport-level deserialization is forced off; the wrapper decodes.
    assert_eq!(sent.skip_deserialization, Some(true));
    assert_eq!(sent.skip_decryption, Some(true));
    // The setup the caller handed over stays untouched.
    assert_eq!(sub.setup().options.skip_deserialization, None);
}

#[tokio::test]
async fn test_wait_for_finish_returns_once_dead() {
    let client = ScriptedClient::failing();
    let registry = registry(client.clone());
    let sub = registry.create("orders", SubscribeOptions::default(), ok_handler());

    sub.listen().unwrap();
    sub.wait_for_finish().await;
    assert!(sub.state().is(RunState::Dead));
}
