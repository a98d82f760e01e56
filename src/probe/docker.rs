use super::{ProbeOutput, ProbeRequest, ProbeResult, ProbeRunner};
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::process::{self, CommandError, CommandOutput, CommandSpec};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// `docker run` exit codes that describe the container, not the probe.
const EXIT_DAEMON_ERROR: i32 = 125;
const EXIT_NOT_EXECUTABLE: i32 = 126;
const EXIT_NOT_FOUND: i32 = 127;

/// Probe runner backed by the docker CLI.
pub struct DockerProbeRunner {
    config: ProbeConfig,
}

impl DockerProbeRunner {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    pub(crate) fn run_args(
        &self,
        container_name: &str,
        image_id: &str,
        request: &ProbeRequest,
    ) -> Vec<String> {
        let network = if request.network { "bridge" } else { "none" };
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container_name.to_string(),
            "--network".to_string(),
            network.to_string(),
            "--ipc".to_string(),
            "none".to_string(),
            "--cpu-shares".to_string(),
            self.config.cpu_shares.to_string(),
            "--memory".to_string(),
            self.config.memory.clone(),
            "--security-opt".to_string(),
            "no-new-privileges".to_string(),
            "--entrypoint".to_string(),
            request.entrypoint.clone(),
            image_id.to_string(),
        ];
        args.extend(request.args.iter().cloned());
        args
    }

    async fn force_remove(&self, container_name: &str) {
        let spec = CommandSpec::new(&self.config.docker).args(["rm", "-f", container_name]);
        if let Err(e) = process::run(&spec, Duration::from_secs(30)).await {
            tracing::warn!(container = container_name, "failed to remove probe container: {e}");
        }
    }
}

/// Map a finished `docker run` onto the probe contract.
pub(crate) fn classify(entrypoint: &str, output: &CommandOutput) -> ProbeResult {
    match output.code {
        Some(0) => Ok(ProbeOutput::new(output.combined())),
        Some(EXIT_NOT_EXECUTABLE | EXIT_NOT_FOUND) => Err(ProbeError::MissingEntrypoint {
            entrypoint: entrypoint.to_string(),
        }),
        Some(EXIT_DAEMON_ERROR) => Err(ProbeError::Spawn(output.stderr.trim().to_string())),
        Some(code) => Err(ProbeError::NonZeroExit {
            code,
            output: output.combined(),
        }),
        None => Err(ProbeError::Spawn("probe container was killed".into())),
    }
}

impl ProbeRunner for DockerProbeRunner {
    fn name(&self) -> &str {
        "docker"
    }

    fn run<'a>(
        &'a self,
        image_id: &'a str,
        request: &'a ProbeRequest,
    ) -> Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>> {
        Box::pin(async move {
            let container_name = format!("imagecheck-probe-{}", uuid::Uuid::new_v4().simple());
            let spec = CommandSpec::new(&self.config.docker).args(self.run_args(
                &container_name,
                image_id,
                request,
            ));
            tracing::debug!(probe = %request.display(), network = request.network, "running probe");

            match process::run(&spec, self.timeout()).await {
                Ok(output) => classify(&request.entrypoint, &output),
                Err(CommandError::Timeout { secs, .. }) => {
                    self.force_remove(&container_name).await;
                    Err(ProbeError::Timeout { secs })
                }
                Err(e @ CommandError::Spawn { .. }) => Err(ProbeError::Spawn(e.to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::fake_cli;
    use tempfile::TempDir;

    fn runner_with(docker: &std::path::Path, timeout_secs: u64) -> DockerProbeRunner {
        DockerProbeRunner::new(&ProbeConfig {
            docker: docker.display().to_string(),
            timeout_secs,
            ..ProbeConfig::default()
        })
    }

    fn output(code: Option<i32>, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[test]
    fn run_args_isolate_network_by_default() {
        let runner = DockerProbeRunner::new(&ProbeConfig::default());
        let args = runner.run_args("probe-1", "sha256:abc", &ProbeRequest::new("java", ["-version"]));

        let joined = args.join(" ");
        assert!(joined.starts_with("run --rm --name probe-1"));
        assert!(joined.contains("--network none"));
        assert!(joined.contains("--ipc none"));
        assert!(joined.contains("--cpu-shares 256"));
        assert!(joined.ends_with("--entrypoint java sha256:abc -version"));
    }

    #[test]
    fn run_args_enable_network_on_request() {
        let runner = DockerProbeRunner::new(&ProbeConfig::default());
        let request = ProbeRequest::shell("apk update").with_network();
        let args = runner.run_args("probe-2", "img", &request);
        assert!(args.join(" ").contains("--network bridge"));
    }

    #[test]
    fn success_returns_combined_output() {
        let result = classify(
            "java",
            &output(Some(0), "", "openjdk version \"1.8.0_171\""),
        );
        assert_eq!(
            result.unwrap().output,
            "openjdk version \"1.8.0_171\"".to_string()
        );
    }

    #[test]
    fn exit_127_means_missing_entrypoint() {
        let result = classify("node", &output(Some(127), "", "executable file not found"));
        assert_eq!(
            result.unwrap_err(),
            ProbeError::MissingEntrypoint {
                entrypoint: "node".into()
            }
        );
    }

    #[test]
    fn exit_125_is_container_failure() {
        let result = classify("java", &output(Some(125), "", "Unable to find image"));
        assert!(matches!(result, Err(ProbeError::Spawn(msg)) if msg.contains("Unable")));
    }

    #[test]
    fn other_exit_codes_keep_output() {
        let result = classify("java", &output(Some(1), "", "Unrecognized VM option"));
        assert!(matches!(
            result,
            Err(ProbeError::NonZeroExit { code: 1, output }) if output.contains("Unrecognized")
        ));
    }

    #[tokio::test]
    async fn timed_out_probe_removes_its_container() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("docker.log");
        let docker = fake_cli(
            tmp.path(),
            "docker",
            &format!(
                "case \"$1\" in\n  run) sleep 5 ;;\n  rm) echo \"$@\" >> '{}' ;;\nesac",
                log.display()
            ),
        );

        let result = runner_with(&docker, 1)
            .run("sha256:abc", &ProbeRequest::new("java", ["-version"]))
            .await;

        assert_eq!(result, Err(ProbeError::Timeout { secs: 1 }));
        let removed = std::fs::read_to_string(&log).unwrap();
        assert!(removed.starts_with("rm -f imagecheck-probe-"));
    }

    #[tokio::test]
    async fn missing_entrypoint_is_reported_from_exit_status() {
        let tmp = TempDir::new().unwrap();
        let docker = fake_cli(
            tmp.path(),
            "docker",
            "echo 'exec: \"node\": executable file not found' >&2\nexit 127",
        );

        let result = runner_with(&docker, 10)
            .run("sha256:abc", &ProbeRequest::new("node", ["--version"]))
            .await;

        assert_eq!(
            result,
            Err(ProbeError::MissingEntrypoint {
                entrypoint: "node".into()
            })
        );
    }

    #[tokio::test]
    async fn missing_docker_binary_is_spawn_failure() {
        let tmp = TempDir::new().unwrap();
        let result = runner_with(&tmp.path().join("no-docker"), 10)
            .run("sha256:abc", &ProbeRequest::new("java", ["-version"]))
            .await;
        assert!(matches!(result, Err(ProbeError::Spawn(_))));
    }
}
