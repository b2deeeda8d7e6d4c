//! JSON-lines view transport over a child process's stdio.
//!
//! The host writes one [`WireRequest`] per line to the child's stdin and reads
//! view messages from its stdout. Stderr is forwarded to the log. The view
//! side of the same protocol is [`serve_stdio`].

use std::process::Stdio;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::codec::{self, RenderId};
use crate::error::TransportError;
use crate::protocol::{ViewEvent, ViewResponse, WireRequest};
use crate::transport::{RenderEngine, ViewTransport};

/// Transport to a view running as a subprocess.
pub struct StdioTransport {
    child: Child,
    lines: Option<mpsc::UnboundedSender<String>>,
}

impl StdioTransport {
    /// Spawn `command_line` (split with shell quoting rules) as the view.
    ///
    /// Returns the transport and the child's parsed event stream. The stream
    /// ends when the child closes stdout.
    pub fn spawn(
        command_line: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ViewEvent>), TransportError> {
        let argv = shell_words::split(command_line).map_err(|e| TransportError::InvalidCommand {
            command: command_line.to_string(),
            reason: e.to_string(),
        })?;
        let Some((program, args)) = argv.split_first() else {
            return Err(TransportError::InvalidCommand {
                command: command_line.to_string(),
                reason: "empty command".to_string(),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransportError::Spawn {
                command: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(TransportError::Closed)?;
        let stdout = child.stdout.take().ok_or(TransportError::Closed)?;
        let stderr = child.stderr.take().ok_or(TransportError::Closed)?;
        log::info!("Spawned view '{program}' (pid {:?})", child.id());

        // Writer task: one request per line
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(line) = line_rx.recv().await {
                let written = async {
                    stdin.write_all(line.as_bytes()).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    log::warn!("StdioTransport: failed to write to view: {e}");
                    break;
                }
            }
            log::debug!("StdioTransport: writer stopped");
        });

        // Reader task: classify stdout lines
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match ViewEvent::parse_line(line) {
                            Ok(Some(event)) => {
                                if event_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                log::warn!(
                                    "StdioTransport: unparseable view output: {e}: {line:?}"
                                );
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::warn!("StdioTransport: error reading view stdout: {e}");
                        break;
                    }
                }
            }
            log::debug!("StdioTransport: view stdout closed");
        });

        // Stderr task
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.is_empty() {
                    log::warn!("[view stderr] {line}");
                }
            }
        });

        Ok((
            Self {
                child,
                lines: Some(line_tx),
            },
            event_rx,
        ))
    }
}

impl ViewTransport for StdioTransport {
    fn post(&mut self, request: &WireRequest) -> Result<(), TransportError> {
        let tx = self.lines.as_ref().ok_or(TransportError::Closed)?;
        let line = codec::to_line(request)?;
        tx.send(line).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.lines.take();
        if let Err(e) = self.child.start_kill() {
            log::debug!("StdioTransport: view already exited: {e}");
        }
    }
}

/// Run the view side of the stdio protocol until `reader` reaches EOF.
///
/// Signals readiness, then answers each request line with one response
/// line. A request that cannot be decoded is answered with a failed response
/// carrying its `renderId` when one can be recovered.
pub async fn serve_stdio<E, R, W>(
    engine: E,
    reader: R,
    mut writer: W,
) -> Result<(), TransportError>
where
    E: RenderEngine,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_line(&mut writer, &ViewEvent::ready_line()).await?;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match codec::decode(line) {
            Ok(request) => {
                log::debug!("Rendering {}", request.render_id.short());
                engine.render(&request)
            }
            Err(e) => {
                log::warn!("Rejecting request: {e}");
                ViewResponse {
                    render_id: recover_render_id(line),
                    lines_added: Some(0),
                    lines_removed: Some(0),
                    applied_options: None,
                    error: Some(e.to_string()),
                }
            }
        };
        write_line(&mut writer, &serde_json::to_string(&response)?).await?;
    }
    log::debug!("View input closed");
    Ok(())
}

fn recover_render_id(line: &str) -> Option<RenderId> {
    let value: Value = serde_json::from_str(line).ok()?;
    value
        .get("renderId")
        .and_then(Value::as_str)
        .map(RenderId::new)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
