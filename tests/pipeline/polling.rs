use super::pipeline_harness::{
    FakeQueue, FakeRegistry, FlakyQueue, ScriptedProbes, config, harness, labelled_metadata,
    push_message, raw_message,
};
use imagecheck::config::ReliabilityConfig;
use imagecheck::daemon::{MessageOutcome, poll_loop, poll_once};
use imagecheck::error::ImageCheckError;
use imagecheck::event::SkipReason;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn every_message_is_acknowledged_even_when_handling_fails() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );
    let queue = FakeQueue::new(vec![
        raw_message("bad", "{not json"),
        push_message("good", "payments/api", "1.4.2"),
        push_message("untagged", "payments/api", "latest"),
    ]);

    let handled = poll_once(&queue, &h.pipeline).await.unwrap();

    assert_eq!(handled, 3);
    assert_eq!(
        queue.acknowledged(),
        vec!["rh-bad", "rh-good", "rh-untagged"]
    );
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn empty_poll_handles_nothing() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );
    let queue = FakeQueue::new(Vec::new());

    assert_eq!(poll_once(&queue, &h.pipeline).await.unwrap(), 0);
    assert!(queue.acknowledged().is_empty());
    assert!(h.registry.calls().is_empty());
}

#[tokio::test]
async fn untagged_push_is_skipped_without_pulling() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    let outcome = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", ""))
        .await
        .unwrap();

    assert_eq!(outcome, MessageOutcome::Skipped(SkipReason::Untagged));
    assert!(h.registry.calls().is_empty());
}

#[tokio::test]
async fn non_push_event_is_skipped() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );
    let body = r#"{"detail":{"eventSource":"ecr.amazonaws.com","eventName":"DeleteRepository"}}"#;

    let outcome = h
        .pipeline
        .handle_message(&raw_message("m1", body))
        .await
        .unwrap();

    assert_eq!(outcome, MessageOutcome::Skipped(SkipReason::NotPutImage));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn latest_is_evaluated_when_skip_policy_is_off() {
    let mut cfg = config(false);
    cfg.policy.skip_untagged = false;
    let h = harness(
        &cfg,
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    let outcome = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", "latest"))
        .await
        .unwrap();

    assert!(matches!(outcome, MessageOutcome::Evaluated { .. }));
    assert!(
        h.registry
            .calls()
            .contains(&"pull 123456789012.dkr.ecr.us-east-1.amazonaws.com/payments/api:latest".to_string())
    );
}

#[tokio::test]
async fn queue_errors_do_not_stop_polling() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );
    let queue = FlakyQueue::default();
    let reliability = ReliabilityConfig {
        initial_backoff_secs: 0,
        max_backoff_secs: 0,
        max_restarts: 1,
    };

    let finished = tokio::time::timeout(
        Duration::from_millis(300),
        poll_loop(&queue, &h.pipeline, Duration::from_millis(1), &reliability),
    )
    .await;

    assert!(finished.is_err(), "poll loop returned on a queue error");
    assert!(queue.polls.load(Ordering::SeqCst) > 10);
}

#[tokio::test]
async fn malformed_body_is_reported_as_decoding_error() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    let err = h
        .pipeline
        .handle_message(&raw_message("m1", "{not json"))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageCheckError::Other(_)));
    assert!(format!("{err:#}").contains("decoding message m1"));
    assert!(h.registry.calls().is_empty());
}
