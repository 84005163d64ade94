//! External process execution
//!
//! [`CommandRunner`] is the single point through which every external tool
//! is launched. It captures both output streams into a [`CommandResult`]
//! and re-broadcasts each chunk on its [`OutputBus`] as it arrives.

use crate::core::{CommandOutput, CommandResult, Error, Result, FAILURE_EXIT_CODE};
use crate::runtime::stream::{Channel, OutputBus};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// Tool launched when no command is given
pub const DEFAULT_COMMAND: &str = "sam";

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// How long output is still drained once the process has exited
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// How one standard stream of the child is wired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
    #[default]
    Piped,
    Inherit,
    Null,
}

impl StdioMode {
    fn to_stdio(self) -> Stdio {
        match self {
            Self::Piped => Stdio::piped(),
            Self::Inherit => Stdio::inherit(),
            Self::Null => Stdio::null(),
        }
    }
}

/// Wiring of stdin, stdout and stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdioOptions {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
}

impl StdioOptions {
    /// The same mode for all three streams
    pub fn all(mode: StdioMode) -> Self {
        Self {
            stdin: mode,
            stdout: mode,
            stderr: mode,
        }
    }
}

/// Configuration for a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommandOptions {
    pub command: String,
    pub args: Vec<String>,
    /// Working directory; `None` runs in the current process directory
    pub cwd: Option<PathBuf>,
    pub stdio: StdioOptions,
    /// Publish chunks on the output bus
    pub emit_output: bool,
}

impl RunCommandOptions {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            stdio: StdioOptions::default(),
            emit_output: true,
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn stdio(mut self, stdio: StdioOptions) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn emit_output(mut self, emit: bool) -> Self {
        self.emit_output = emit;
        self
    }

    /// `command` followed by its first argument, for messages
    pub fn display_name(&self) -> String {
        match self.args.first() {
            Some(first) => format!("{} {}", self.command, first),
            None => self.command.clone(),
        }
    }
}

/// Launches external processes and streams their output
///
/// One runner (and therefore one bus) is created at startup and shared
/// through `Arc` by every caller. Invocations may run concurrently; each
/// gets its own [`CommandResult`] while all of them publish onto the same
/// two channels.
#[derive(Debug, Default)]
pub struct CommandRunner {
    bus: OutputBus,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self {
            bus: OutputBus::new(),
        }
    }

    /// A new runner ready to be shared
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The bus this runner publishes on
    pub fn bus(&self) -> &OutputBus {
        &self.bus
    }

    /// Run a command to completion
    ///
    /// Resolves with the exit code and the output once the process exits,
    /// whatever the exit code. Output written later by a background process
    /// still holding the pipes is not waited for. Fails with
    /// [`Error::InvalidCommand`] only when the process cannot be started or
    /// its output cannot be read.
    pub async fn run_command(&self, options: RunCommandOptions) -> Result<CommandResult> {
        let label = options.display_name();
        debug!(command = %options.command, args = ?options.args, cwd = ?options.cwd, "running command");

        let mut command = Command::new(&options.command);
        command
            .args(&options.args)
            .stdin(options.stdio.stdin.to_stdio())
            .stdout(options.stdio.stdout.to_stdio())
            .stderr(options.stdio.stderr.to_stdio());
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| {
            Error::invalid_command(format!("Error running command '{}'", label), e)
        })?;

        // The wrapped tools run non-interactively; close stdin right away.
        drop(child.stdin.take());

        let emit = options.emit_output;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut stdout_text = String::new();
        let mut stderr_text = String::new();
        let (drained, status) = {
            let drain = async {
                tokio::try_join!(
                    self.capture(stdout, Channel::Stdout, emit, &mut stdout_text),
                    self.capture(stderr, Channel::Stderr, emit, &mut stderr_text),
                )
            };
            let wait = child.wait();
            tokio::pin!(drain, wait);

            // The process exiting ends the call; a background process that
            // inherited the pipes only gets a short grace period.
            tokio::select! {
                drained = &mut drain => (Some(drained), (&mut wait).await),
                status = &mut wait => {
                    let drained = tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut drain).await.ok();
                    (drained, status)
                }
            }
        };

        match drained {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(Error::invalid_command(
                    format!("Error reading output of '{}'", label),
                    e,
                ))
            }
            None => debug!(command = %label, "output still open after exit, detaching"),
        }
        let status = status.map_err(|e| {
            Error::invalid_command(format!("Error waiting for command '{}'", label), e)
        })?;

        let exit_code = status.code().unwrap_or(FAILURE_EXIT_CODE);
        debug!(command = %label, exit_code, "command finished");

        Ok(CommandResult {
            exit_code,
            output: CommandOutput {
                stdout: stdout_text,
                stderr: stderr_text,
            },
        })
    }

    async fn capture<R>(
        &self,
        stream: Option<R>,
        channel: Channel,
        emit: bool,
        captured: &mut String,
    ) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let Some(mut stream) = stream else {
            return Ok(());
        };

        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut decoder = ChunkDecoder::default();
        loop {
            let read = stream.read(&mut buffer).await?;
            let chunk = if read == 0 {
                decoder.finish()
            } else {
                decoder.decode(&buffer[..read])
            };

            if !chunk.is_empty() {
                captured.push_str(&chunk);
                if emit {
                    self.bus.publish(channel, &chunk);
                }
            }

            if read == 0 {
                return Ok(());
            }
        }
    }
}

/// Turns raw reads into text without splitting multi-byte characters
///
/// Bytes of an incomplete trailing UTF-8 sequence are held back until the
/// next read; genuinely invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct ChunkDecoder {
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let keep = incomplete_suffix_len(&self.pending);
        let split = self.pending.len() - keep;
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        text
    }

    pub(crate) fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a truncated UTF-8 sequence at the end of `bytes`
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    // A sequence is at most 4 bytes, so only the last 3 can be a prefix.
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let byte = bytes[i];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            _ => return 0,
        };
        let available = bytes.len() - i;
        return if available < width { available } else { 0 };
    }
    0
}
