//! Subprocess execution shared by the CLI-backed adapters (`docker`, `aws`).

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Maximum captured output per stream (1 MB).
const MAX_OUTPUT_BYTES: usize = 1_048_576;

/// A command line plus the environment and stdin it should run with.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(&'static str, String)>,
    pub stdin: Option<Vec<u8>>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: Vec<(&'static str, String)>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Command line for logs; arguments are shown, stdin never is.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, for tools that report on either stream.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs}s and was killed")]
    Timeout { program: String, secs: u64 },
}

fn truncate_output(bytes: &[u8], stream: &str) -> String {
    let mut text = String::from_utf8_lossy(bytes).to_string();
    if text.len() > MAX_OUTPUT_BYTES {
        text.truncate(text.floor_char_boundary(MAX_OUTPUT_BYTES));
        text.push_str(&format!("\n... [{stream} truncated at 1MB]"));
    }
    text
}

/// Run a command to completion, killing it when `timeout` elapses.
pub async fn run(spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput, CommandError> {
    let mut cmd = tokio::process::Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    let spawn_error = |source| CommandError::Spawn {
        program: spec.program.clone(),
        source,
    };

    let mut child = cmd.spawn().map_err(spawn_error)?;
    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(input), Some(mut pipe)) = (spec.stdin.as_deref(), stdin) {
            pipe.write_all(input).await?;
        }
        Ok::<(), std::io::Error>(())
    };

    // stdin is fed while output is drained, both under the same deadline.
    let work = async { tokio::join!(feed, child.wait_with_output()) };
    match tokio::time::timeout(timeout, work).await {
        Ok((fed, Ok(output))) => {
            if let Err(e) = fed {
                // A child may exit without reading all of its input.
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(spawn_error(e));
                }
            }
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: truncate_output(&output.stdout, "output"),
                stderr: truncate_output(&output.stderr, "stderr"),
            })
        }
        Ok((_, Err(e))) => Err(spawn_error(e)),
        Err(_) => Err(CommandError::Timeout {
            program: spec.program.clone(),
            secs: timeout.as_secs(),
        }),
    }
}
