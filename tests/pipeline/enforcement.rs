use super::pipeline_harness::{
    FakeRegistry, ScriptedProbes, config, harness, labelled_metadata, push_message,
    unlabelled_metadata,
};
use imagecheck::Decision;
use imagecheck::error::{ImageCheckError, RegistryError};
use imagecheck::daemon::MessageOutcome;

#[tokio::test]
async fn compliant_image_is_accepted_and_cleaned_up() {
    let h = harness(
        &config(false),
        FakeRegistry::new(labelled_metadata()),
        ScriptedProbes::default().answer("/etc/alpine-release", "ALPINE:3.8.1"),
        false,
    );

    let outcome = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        MessageOutcome::Evaluated {
            decision: Decision::Accept,
            deleted: false,
            ..
        }
    ));
    let calls = h.registry.calls();
    assert!(calls.iter().all(|call| !call.starts_with("delete")));
    assert_eq!(calls.last().unwrap(), "remove_local sha256:4f2c");
}

#[tokio::test]
async fn missing_owner_label_deletes_by_tag_then_digest() {
    let h = harness(
        &config(false),
        FakeRegistry::new(unlabelled_metadata()),
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
        MessageOutcome::Evaluated {
            decision: Decision::Delete,
            deleted: true,
            ..
        }
    ));
    let calls = h.registry.calls();
    let deletes: Vec<_> = calls
        .iter()
        .filter(|call| call.starts_with("delete"))
        .cloned()
        .collect();
    assert_eq!(
        deletes,
        vec![
            "delete_tag payments/api:1.4.2".to_string(),
            "delete_digest payments/api sha256:9a1b".to_string(),
        ]
    );
}

#[tokio::test]
async fn dry_run_never_deletes() {
    let h = harness(
        &config(true),
        FakeRegistry::new(unlabelled_metadata()),
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
        MessageOutcome::Evaluated {
            decision: Decision::Delete,
            deleted: false,
            ..
        }
    ));
    assert!(
        h.registry
            .calls()
            .iter()
            .all(|call| !call.starts_with("delete"))
    );
}

#[tokio::test]
async fn image_without_digest_is_deleted_by_tag_only() {
    let mut metadata = unlabelled_metadata();
    metadata.digest = None;
    let h = harness(
        &config(false),
        FakeRegistry::new(metadata),
        ScriptedProbes::default(),
        false,
    );

    h.pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap();

    let calls = h.registry.calls();
    assert!(calls.contains(&"delete_tag payments/api:1.4.2".to_string()));
    assert!(calls.iter().all(|call| !call.starts_with("delete_digest")));
}

#[tokio::test]
async fn authentication_failure_surfaces_as_error() {
    let mut registry = FakeRegistry::new(labelled_metadata());
    registry.fail_auth = true;
    let h = harness(&config(false), registry, ScriptedProbes::default(), false);

    let err = h
        .pipeline
        .handle_message(&push_message("m1", "payments/api", "1.4.2"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImageCheckError::Registry(RegistryError::Auth { .. })
    ));
    assert!(err.to_string().contains("123456789012"));
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.registry.calls().len(), 1);
}
