use devproxy_protocol::{Command, Response};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task;

use crate::{fault, Registry};

/// Upper bound for a single command line, including the newline.
pub const MAX_COMMAND_LEN: u64 = 16 * 1024 * 1024;

/// Accepts connections and answers exactly one command on each of them.
#[derive(Clone)]
pub struct App {
    pub registry: Registry,
}

impl App {
    pub fn new() -> Self {
        App {
            registry: Registry::new(),
        }
    }

    pub async fn run(&self, listener: TcpListener) -> crate::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            log::debug!("Accepted connection from {}", peer);
            let app = self.clone();
            task::spawn(async move {
                if let Err(err) = app.handle_connection(stream).await {
                    log::warn!("Connection to {} failed: {}", peer, err);
                }
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream) -> crate::Result<()> {
        let mut stream = BufReader::new(stream);
        let response = match read_line(&mut stream, MAX_COMMAND_LEN).await? {
            Line::Complete(line) => {
                log::debug!("request: {}", String::from_utf8_lossy(&line).trim_end());
                self.handle_request(&line).await
            }
            Line::Closed => {
                log::debug!("Peer closed without sending a command.");
                return Ok(());
            }
            Line::TooLong => {
                log::warn!("Dropping command longer than {} bytes.", MAX_COMMAND_LEN);
                fault!("command exceeds {} bytes", MAX_COMMAND_LEN).into_response()
            }
        };
        let mut reply = serde_json::to_string(&response)?;
        log::debug!("response: {}", reply);
        reply.push('\n');

        stream.get_mut().write_all(reply.as_bytes()).await?;
        stream.get_mut().flush().await?;
        stream.get_mut().shutdown().await?;
        Ok(())
    }

    async fn handle_request(&self, line: &[u8]) -> Response {
        let command: Command = match serde_json::from_slice(line) {
            Ok(x) => x,
            Err(err) => return fault!("cannot decode command: {}", err).into_response(),
        };
        // targets are plain blocking code
        let registry = self.registry.clone();
        match task::spawn_blocking(move || registry.dispatch(command)).await {
            Ok(x) => x,
            Err(err) => fault!("target panicked: {}", err).into_response(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Line {
    Complete(Vec<u8>),
    Closed,
    TooLong,
}

/// Read up to `limit` bytes looking for a newline.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R, limit: u64) -> std::io::Result<Line> {
    let mut buf = Vec::new();
    let n = AsyncReadExt::take(&mut *reader, limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        Ok(Line::Closed)
    } else if buf.last() != Some(&b'\n') && n as u64 >= limit {
        Ok(Line::TooLong)
    } else {
        Ok(Line::Complete(buf))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
