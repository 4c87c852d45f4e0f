//! Console transport for playing a gamebook in a terminal.

use async_trait::async_trait;
use gamebook_error::{TransportError, TransportErrorKind, TransportResult};
use gamebook_interface::{MessageId, Reply, Transport};
use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Transport that prints messages and treats each input line as a reply.
///
/// Lines are read in the background as they arrive. Every search returns
/// the lines typed since the previous search; the `since` argument is not
/// needed because a console has a single conversation.
pub struct ConsoleTransport {
    output: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    replies: Mutex<mpsc::UnboundedReceiver<Reply>>,
    next_id: AtomicU64,
}

impl ConsoleTransport {
    /// Console on stdin and stdout.
    ///
    /// Stdin is read on a detached thread: a blocking read cannot be
    /// cancelled, and the process must be able to exit while it waits.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("gamebook-stdin".to_string())
            .spawn(move || read_lines_blocking(std::io::stdin().lock(), tx));
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to start console input thread, replies disabled");
        }
        Self::from_parts(tokio::io::stdout(), rx)
    }

    /// Console on arbitrary streams.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_io<R, W>(input: R, output: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(read_lines(input, tx));
        Self::from_parts(output, rx)
    }

    fn from_parts<W>(output: W, replies: mpsc::UnboundedReceiver<Reply>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            output: Mutex::new(Box::new(output)),
            replies: Mutex::new(replies),
            next_id: AtomicU64::new(0),
        }
    }
}

/// Numbers input lines and forwards the non-blank ones as replies.
struct LineReplies {
    tx: mpsc::UnboundedSender<Reply>,
    count: u64,
}

impl LineReplies {
    fn new(tx: mpsc::UnboundedSender<Reply>) -> Self {
        Self { tx, count: 0 }
    }

    /// Returns false once nobody is listening.
    fn push(&mut self, line: String) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        self.count += 1;
        self.tx
            .send(Reply::new(format!("line-{}", self.count), line))
            .is_ok()
    }
}

async fn read_lines<R>(input: R, tx: mpsc::UnboundedSender<Reply>)
where
    R: AsyncBufRead + Send + Unpin,
{
    let mut replies = LineReplies::new(tx);
    let mut lines = input.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !replies.push(line) {
                    break;
                }
            }
            Ok(None) => {
                debug!("Console input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                break;
            }
        }
    }
}

fn read_lines_blocking<R>(input: R, tx: mpsc::UnboundedSender<Reply>)
where
    R: BufRead,
{
    let mut replies = LineReplies::new(tx);
    for line in input.lines() {
        match line {
            Ok(line) => {
                if !replies.push(line) {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                return;
            }
        }
    }
    debug!("Console input closed");
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn publish(&self, text: &str) -> TransportResult<MessageId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut output = self.output.lock().await;
        output
            .write_all(format!("{}\n\n", text).as_bytes())
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Rejected(e.to_string())))?;
        output
            .flush()
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Rejected(e.to_string())))?;
        Ok(MessageId::new(format!("console-{}", id)))
    }

    async fn search_replies(&self, _since: &MessageId) -> TransportResult<Vec<Reply>> {
        let mut replies = self.replies.lock().await;
        let mut found = Vec::new();
        while let Ok(reply) = replies.try_recv() {
            found.push(reply);
        }
        Ok(found)
    }

    fn name(&self) -> &str {
        "console"
    }
}
