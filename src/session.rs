//! Interactive question/answer loop

use std::io::{BufRead, Write};
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::llm::Panel;
use crate::progress::ProgressObserver;
use crate::report::Report;

pub const FAREWELL: &str = "Goodbye!";
pub const EMPTY_INPUT_HINT: &str = "Please enter a question (or 'exit' to quit).";

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `exit` or `quit`
    Exit,
    /// Input was closed
    EndOfInput,
    /// Ctrl+C or SIGTERM
    Interrupted,
}

/// Whether a request ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answered {
    Done,
    Interrupted,
}

pub struct Session<'a> {
    panel: &'a Panel,
    progress: &'a dyn ProgressObserver,
    report: Report,
    prompt: String,
    shutdown: CancellationToken,
}

impl<'a> Session<'a> {
    pub fn new(
        panel: &'a Panel,
        progress: &'a dyn ProgressObserver,
        report: Report,
        prompt: impl Into<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            panel,
            progress,
            report,
            prompt: prompt.into(),
            shutdown,
        }
    }

    /// Read queries until exit, end of input or shutdown
    pub async fn run<W: Write>(
        &self,
        mut lines: mpsc::Receiver<String>,
        out: &mut W,
    ) -> Result<SessionEnd> {
        loop {
            write!(out, "{}", self.prompt)?;
            out.flush()?;

            let line = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    writeln!(out, "\n{}", FAREWELL)?;
                    return Ok(SessionEnd::Interrupted);
                }
                line = lines.recv() => line,
            };

            let Some(line) = line else {
                writeln!(out, "\n{}", FAREWELL)?;
                return Ok(SessionEnd::EndOfInput);
            };

            let query = line.trim();
            if query.is_empty() {
                writeln!(out, "{}", EMPTY_INPUT_HINT)?;
                continue;
            }

            if is_exit_command(query) {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(SessionEnd::Exit);
            }

            if self.answer(query, out).await? == Answered::Interrupted {
                return Ok(SessionEnd::Interrupted);
            }
        }
    }

    /// Answer one query and print the report.
    ///
    /// A fault inside the pipeline is reported and swallowed so the caller can
    /// move on to the next query.
    pub async fn answer<W: Write>(&self, query: &str, out: &mut W) -> Result<Answered> {
        let request = self.shutdown.child_token();
        tracing::info!(query_len = query.len(), "answering query");

        let outcome = AssertUnwindSafe(self.panel.process(query, &request, self.progress))
            .catch_unwind()
            .await;

        if self.shutdown.is_cancelled() {
            self.progress.finished();
            writeln!(out, "\n{}", FAREWELL)?;
            return Ok(Answered::Interrupted);
        }

        match outcome {
            Ok(response) => {
                write!(out, "{}", self.report.render(&response))?;
                writeln!(out)?;
            }
            Err(panic) => {
                self.progress.finished();
                let reason = panic_message(panic.as_ref());
                tracing::error!(%reason, "request failed unexpectedly");
                writeln!(out, "\nSomething went wrong while answering: {}\n", reason)?;
            }
        }
        out.flush()?;

        Ok(Answered::Done)
    }
}

/// `exit` or `quit`, any case
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}

/// Cancel the returned token on Ctrl+C (or SIGTERM on unix)
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                        _ = token_clone.cancelled() => return,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not install SIGTERM handler");
                    tokio::select! {
                        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                        _ = token_clone.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
    });

    token
}

/// Feed stdin lines into a channel from a dedicated thread.
///
/// Blocking reads stay off the runtime, and the thread never holds up
/// process exit.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
}

/// Feed lines from any reader into a channel from a dedicated thread.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending input.
pub fn spawn_line_reader<R>(mut reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let std::borrow::Cow::Owned(_) = line {
                        tracing::debug!("replaced invalid UTF-8 in input line");
                    }
                    if tx.blocking_send(line.into_owned()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read input");
                    break;
                }
            }
        }
    });
    rx
}
