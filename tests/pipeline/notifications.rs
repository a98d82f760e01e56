use super::pipeline_harness::{
    DELETE_HOOK, FakeRegistry, OK_HOOK, ScriptedProbes, WARNING_HOOK, config, harness,
    labelled_metadata, push_message, unlabelled_metadata,
};
use imagecheck::daemon::MessageOutcome;
use imagecheck::notify::{Audience, palette};

#[tokio::test]
async fn accepted_image_notifies_ok_audience_with_report_link() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (notification, report_url, webhook) = &sent[0];
    assert_eq!(webhook, OK_HOOK);
    assert_eq!(notification.audience, Audience::Ok);
    assert_eq!(notification.title, "⌘ payments/api:1.4.2");
    assert_eq!(
        report_url.as_deref(),
        Some("https://reports.example.com/1.html")
    );
    assert_eq!(h.sink.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn old_base_image_notifies_warning_audience() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default().answer("/etc/alpine-release", "ALPINE:3.4.0"),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2, WARNING_HOOK);
    assert_eq!(sent[0].0.color, palette::WARN);
    assert!(sent[0].0.body.contains("Linux distribution is old"));
}

#[tokio::test]
async fn enforced_delete_notifies_delete_audience() {
    let h = harness(
        &config(false),
        FakeRegistry::new(unlabelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (notification, _, webhook) = &sent[0];
    assert_eq!(webhook, DELETE_HOOK);
    assert_eq!(notification.color, palette::CRITICAL);
    assert!(notification.body.contains(" * Image Deleted"));
    assert!(
        notification
            .body
            .contains("Missing required label 'owner_team'")
    );
}

#[tokio::test]
async fn dry_run_delete_goes_to_warning_audience() {
    let h = harness(
        &config(true),
        FakeRegistry::new(unlabelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (notification, _, webhook) = &sent[0];
    assert_eq!(webhook, WARNING_HOOK);
    assert_eq!(notification.color, palette::CONCERN);
    assert!(!notification.body.contains("Image Deleted"));
}

#[tokio::test]
async fn failed_report_upload_still_notifies_without_link() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        true,
    );

    let outcome = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        MessageOutcome::Evaluated {
            report_url: None,
            notified: 1,
            ..
        }
    ));
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.is_none());
}

#[tokio::test]
async fn audience_without_webhooks_is_dropped() {
    let mut cfg = config(false);
    cfg.notify.ok_webhooks.clear();
    let h = harness(
        &cfg,
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    let outcome = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        MessageOutcome::Evaluated { notified: 0, .. }
    ));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn published_report_escapes_and_names_the_image() {
    let h = harness(
        &config(true),
        FakeRegistry::new(unlabelled_metadata()),
        ScriptedProbes::default(),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let published = h.sink.published.lock().unwrap();
    let html = &published[0];
    assert!(html.contains("payments&#x2F;api:1.4.2"));
    assert!(html.contains("Missing required label &#x27;owner_team&#x27;"));
    assert!(html.contains("check-base_distribution"));
}
