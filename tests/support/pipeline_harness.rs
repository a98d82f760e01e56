#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use imagecheck::config::Config;
use imagecheck::daemon::{Collaborators, Pipeline};
use imagecheck::error::{ProbeError, QueueError, RegistryError, ReportError};
use imagecheck::image::{ImageMetadata, ImageReference};
use imagecheck::notify::{Notification, Notifier};
use imagecheck::probe::{ProbeOutput, ProbeRequest, ProbeResult, ProbeRunner};
use imagecheck::queue::{Queue, QueueMessage};
use imagecheck::registry::{Credentials, Registry};
use imagecheck::report::ReportSink;
use serde_json::json;

pub const DELETE_HOOK: &str = "https://teams.example.com/delete";
pub const WARNING_HOOK: &str = "https://teams.example.com/warning";
pub const OK_HOOK: &str = "https://teams.example.com/ok";

pub fn config(dry_run: bool) -> Config {
    let mut config = Config::default();
    config.policy.dry_run = dry_run;
    config.notify.delete_webhooks = vec![DELETE_HOOK.to_string()];
    config.notify.warning_webhooks = vec![WARNING_HOOK.to_string()];
    config.notify.ok_webhooks = vec![OK_HOOK.to_string()];
    config
}

pub fn labelled_metadata() -> ImageMetadata {
    let mut metadata = ImageMetadata {
        image_id: "sha256:4f2c".into(),
        digest: Some("sha256:9a1b".into()),
        ..ImageMetadata::default()
    };
    metadata
        .labels
        .insert("owner_team".into(), "payments".into());
    metadata
}

pub fn unlabelled_metadata() -> ImageMetadata {
    let mut metadata = labelled_metadata();
    metadata.labels.clear();
    metadata
}

/// A CloudWatch envelope around an ECR `PutImage` CloudTrail record.
pub fn push_message(id: &str, repository: &str, tag: &str) -> QueueMessage {
    let body = json!({
        "version": "0",
        "source": "aws.ecr",
        "detail-type": "AWS API Call via CloudTrail",
        "detail": {
            "eventSource": "ecr.amazonaws.com",
            "eventName": "PutImage",
            "awsRegion": "us-east-1",
            "eventTime": "2018-06-01T10:00:00Z",
            "requestParameters": {
                "repositoryName": repository,
                "imageTag": tag,
                "registryId": "123456789012"
            },
            "userIdentity": { "arn": "arn:aws:iam::123456789012:user/ci" }
        }
    });
    QueueMessage {
        id: id.to_string(),
        body: body.to_string(),
        receipt_handle: format!("rh-{id}"),
    }
}

pub fn raw_message(id: &str, body: &str) -> QueueMessage {
    QueueMessage {
        id: id.to_string(),
        body: body.to_string(),
        receipt_handle: format!("rh-{id}"),
    }
}

pub struct FakeRegistry {
    pub metadata: ImageMetadata,
    pub fail_auth: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn new(metadata: ImageMetadata) -> Self {
        Self {
            metadata,
            fail_auth: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Registry for FakeRegistry {
    fn name(&self) -> &str {
        "fake"
    }

    fn authenticate<'a>(
        &'a self,
        registry_id: &'a str,
        region: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Credentials, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("authenticate {registry_id} {region}"));
            if self.fail_auth {
                return Err(RegistryError::Auth {
                    registry_id: registry_id.to_string(),
                    message: "AccessDeniedException".into(),
                });
            }
            Ok(Credentials {
                username: "AWS".into(),
                password: "token".into(),
                endpoint: String::new(),
            })
        })
    }

    fn pull<'a>(
        &'a self,
        reference: &'a ImageReference,
        _credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = Result<ImageMetadata, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("pull {}", reference.pull_ref()));
            Ok(self.metadata.clone())
        })
    }

    fn delete_tag<'a>(
        &'a self,
        reference: &'a ImageReference,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("delete_tag {reference}"));
            Ok(())
        })
    }

    fn delete_digest<'a>(
        &'a self,
        reference: &'a ImageReference,
        digest: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("delete_digest {} {digest}", reference.repository));
            Ok(())
        })
    }

    fn remove_local<'a>(
        &'a self,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.record(format!("remove_local {image_id}"));
            Ok(())
        })
    }
}

/// Answers probes whose command line contains a given fragment; anything
/// else behaves like a missing entrypoint.
#[derive(Default)]
pub struct ScriptedProbes {
    responses: Vec<(&'static str, ProbeResult)>,
}

impl ScriptedProbes {
    pub fn answer(mut self, fragment: &'static str, output: &str) -> Self {
        self.responses.push((fragment, Ok(ProbeOutput::new(output))));
        self
    }
}

impl ProbeRunner for ScriptedProbes {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run<'a>(
        &'a self,
        _image_id: &'a str,
        request: &'a ProbeRequest,
    ) -> Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>> {
        let line = request.display();
        let result = self
            .responses
            .iter()
            .find(|(fragment, _)| line.contains(fragment))
            .map_or_else(
                || {
                    Err(ProbeError::MissingEntrypoint {
                        entrypoint: request.entrypoint.clone(),
                    })
                },
                |(_, result)| result.clone(),
            );
        Box::pin(async move { result })
    }
}

pub struct FakeSink {
    pub fail: bool,
    pub published: Mutex<Vec<String>>,
}

impl FakeSink {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            published: Mutex::new(Vec::new()),
        }
    }
}

impl ReportSink for FakeSink {
    fn name(&self) -> &str {
        "fake"
    }

    fn publish<'a>(
        &'a self,
        html: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>> {
        Box::pin(async move {
            if self.fail {
                return Err(ReportError::Upload("AccessDenied".into()));
            }
            let mut published = self.published.lock().unwrap();
            published.push(html.to_string());
            Ok(format!("https://reports.example.com/{}.html", published.len()))
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Notification, Option<String>, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Notification, Option<String>, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn send<'a>(
        &'a self,
        notification: &'a Notification,
        report_url: Option<&'a str>,
        webhook: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), imagecheck::error::NotifyError>> + Send + 'a>>
    {
        Box::pin(async move {
            self.sent.lock().unwrap().push((
                notification.clone(),
                report_url.map(str::to_string),
                webhook.to_string(),
            ));
            Ok(())
        })
    }
}

pub struct FakeQueue {
    pub batch: Mutex<Vec<QueueMessage>>,
    pub acknowledged: Mutex<Vec<String>>,
}

impl FakeQueue {
    pub fn new(batch: Vec<QueueMessage>) -> Self {
        Self {
            batch: Mutex::new(batch),
            acknowledged: Mutex::new(Vec::new()),
        }
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }
}

impl Queue for FakeQueue {
    fn name(&self) -> &str {
        "fake"
    }

    fn poll<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<QueueMessage>, QueueError>> + Send + 'a>> {
        Box::pin(async move { Ok(std::mem::take(&mut *self.batch.lock().unwrap())) })
    }

    fn acknowledge<'a>(
        &'a self,
        message: &'a QueueMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async move {
            self.acknowledged
                .lock()
                .unwrap()
                .push(message.receipt_handle.clone());
            Ok(())
        })
    }
}

/// Fails every other receive, starting with the first.
#[derive(Default)]
pub struct FlakyQueue {
    pub polls: AtomicUsize,
}

impl Queue for FlakyQueue {
    fn name(&self) -> &str {
        "flaky"
    }

    fn poll<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<QueueMessage>, QueueError>> + Send + 'a>> {
        Box::pin(async move {
            if self.polls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Err(QueueError::Receive("ThrottlingException".into()))
            } else {
                Ok(Vec::new())
            }
        })
    }

    fn acknowledge<'a>(
        &'a self,
        _message: &'a QueueMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}

pub struct Harness {
    pub registry: Arc<FakeRegistry>,
    pub sink: Arc<FakeSink>,
    pub notifier: Arc<RecordingNotifier>,
    pub pipeline: Pipeline,
}

pub fn harness(
    config: &Config,
    registry: FakeRegistry,
    probes: ScriptedProbes,
    sink_fails: bool,
) -> Harness {
    let registry = Arc::new(registry);
    let sink = Arc::new(FakeSink::new(sink_fails));
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = Pipeline::new(
        config,
        Collaborators {
            registry: registry.clone(),
            probe: Arc::new(probes),
            report_sink: sink.clone(),
            notifier: notifier.clone(),
        },
    )
    .unwrap();
    Harness {
        registry,
        sink,
        notifier,
        pipeline,
    }
}
