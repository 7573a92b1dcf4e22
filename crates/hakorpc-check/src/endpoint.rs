//! # External Endpoint Validation
//!
//! Per-endpoint configuration files have their own schema, owned by the
//! endpoint package and checked by its validator program. This module is
//! the seam to it: [`EndpointValidator`] is what the pipeline calls, and
//! [`ProcessEndpointValidator`] runs the program as a child process.
//!
//! Problems with the collaborator itself (schema not installed, program
//! missing, crash, timeout) become diagnostics. They never stop the run.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{ValidatorCommand, ValidatorConfig, ENDPOINT_SCHEMA_ENV};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Checks one endpoint configuration file.
pub trait EndpointValidator {
    /// Problems that would make every [`validate`](Self::validate) call
    /// fail the same way, reported once instead of per file.
    fn check_ready(&self) -> Result<(), Vec<String>> {
        Ok(())
    }

    /// Diagnostic lines for `endpoint_config`. Empty means valid.
    fn validate(&self, endpoint_config: &Path) -> Vec<String>;
}

impl<F> EndpointValidator for F
where
    F: Fn(&Path) -> Vec<String>,
{
    fn validate(&self, endpoint_config: &Path) -> Vec<String> {
        self(endpoint_config)
    }
}

/// Returns the same lines for every file. Stands in for the external
/// program where it is not installed.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointValidator {
    lines: Vec<String>,
}

impl StaticEndpointValidator {
    /// A validator that accepts everything.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A validator that reports `lines` for every file.
    pub fn reporting<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl EndpointValidator for StaticEndpointValidator {
    fn validate(&self, _endpoint_config: &Path) -> Vec<String> {
        self.lines.clone()
    }
}

/// Runs `<program> <args…> --schema <schema> --check-paths <config>`.
///
/// Everything the program prints on stdout, then stderr, is reported line
/// by line. Exit status 0 and 1 both mean the program ran normally (1 is
/// its "invalid" answer, already explained by its output).
#[derive(Debug, Clone)]
pub struct ProcessEndpointValidator {
    schema: PathBuf,
    command: ValidatorCommand,
    timeout: Duration,
}

impl ProcessEndpointValidator {
    pub fn new(schema: impl Into<PathBuf>, command: ValidatorCommand, timeout: Duration) -> Self {
        Self {
            schema: schema.into(),
            command,
            timeout,
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(
            config.endpoint_schema.path(),
            config.validator_command.clone(),
            config.validator_timeout,
        )
    }

    fn spawn(&self, endpoint_config: &Path) -> io::Result<Child> {
        Command::new(&self.command.program)
            .args(&self.command.args)
            .arg("--schema")
            .arg(&self.schema)
            .arg("--check-paths")
            .arg(endpoint_config)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

impl EndpointValidator for ProcessEndpointValidator {
    fn check_ready(&self) -> Result<(), Vec<String>> {
        if self.schema.is_file() {
            return Ok(());
        }
        tracing::warn!(schema = %self.schema.display(), "endpoint schema not found");
        Err(vec![
            format!("{}: endpoint schema not found", self.schema.display()),
            format!("Set {ENDPOINT_SCHEMA_ENV} or pass --endpoint-schema."),
        ])
    }

    fn validate(&self, endpoint_config: &Path) -> Vec<String> {
        if let Err(lines) = self.check_ready() {
            return lines;
        }

        let program = &self.command.program;
        let mut child = match self.spawn(endpoint_config) {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(program = %program, "endpoint validator not found");
                return vec![
                    format!("{program}: endpoint validator not found"),
                    "Install hakoniwa-pdu-endpoint or pass --endpoint-validator.".to_string(),
                ];
            }
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "cannot start endpoint validator");
                return vec![format!("{program}: cannot start endpoint validator: {e}")];
            }
        };
        tracing::debug!(program = %program, config = %endpoint_config.display(), "endpoint validator started");
        let deadline = Instant::now() + self.timeout;

        let (tx, rx) = mpsc::channel();
        let mut pipes = 0;
        if let Some(stdout) = child.stdout.take() {
            drain(stdout, Stream::Stdout, tx.clone());
            pipes += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            drain(stderr, Stream::Stderr, tx.clone());
            pipes += 1;
        }
        drop(tx);

        let config = endpoint_config.display();
        let timed_out = || {
            tracing::warn!(config = %config, timeout = ?self.timeout, "endpoint validator timed out");
            vec![format!(
                "{config}: validator timed out after {}s",
                self.timeout.as_secs()
            )]
        };

        let status = match wait_with_deadline(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => return timed_out(),
            Err(e) => return vec![format!("{config}: cannot wait for validator: {e}")],
        };

        // A background process the validator left behind can hold the
        // pipes open after it exits, so reads are bounded by the deadline
        // too. Unfinished reader threads are abandoned.
        let Some(output) = collect_output(&rx, pipes, deadline) else {
            return timed_out();
        };
        let mut lines = output_lines(&output.stdout);
        lines.extend(output_lines(&output.stderr));

        match status.code() {
            Some(0 | 1) => {}
            Some(code) => lines.push(format!("{config}: validator failed with exit code {code}")),
            None => lines.push(format!("{config}: validator terminated by signal")),
        }
        lines
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Default)]
struct Output {
    stdout: String,
    stderr: String,
}

/// Read a pipe to the end on its own thread so a chatty child never blocks
/// on a full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

/// Wait for `pipes` drained buffers. `None` if the deadline passes first.
fn collect_output(rx: &Receiver<(Stream, Vec<u8>)>, pipes: usize, deadline: Instant) -> Option<Output> {
    let mut output = Output::default();
    for _ in 0..pipes {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let (stream, bytes) = match rx.recv_timeout(remaining) {
            Ok(received) => received,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        match stream {
            Stream::Stdout => output.stdout = text,
            Stream::Stderr => output.stderr = text,
        }
    }
    Some(output)
}

fn output_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.lines().map(str::to_string).collect()
}

/// `None` if the deadline passed; the child has then been killed and
/// reaped.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
