//! Newline-delimited JSON over TCP, one connection per command.
use std::time::Duration;

use async_trait::async_trait;
use devproxy_protocol::{Command, Response};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;

use crate::{Rpc, TransportError};

/// Upper bound for a single response line, including the newline.
pub const MAX_RESPONSE_LEN: u64 = 64 * 1024 * 1024;

/// Every request connects, writes one line, reads one line and closes the connection again.
///
/// Nothing is shared between two requests, so a failed request cannot affect the next one.
/// By default there is no timeout: a remote which never answers blocks the request forever.
#[derive(Clone, Debug)]
pub struct LineRpc {
    host: String,
    port: u16,
    read_timeout: Option<Duration>,
}

impl LineRpc {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            read_timeout: None,
        }
    }

    /// Bound the time spent between connecting and receiving the response line.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }
}

#[async_trait]
impl Rpc for LineRpc {
    async fn request(&mut self, command: Command) -> crate::Result<Response> {
        let mut line = serde_json::to_string(&command).map_err(TransportError::Malformed)?;
        log::debug!("-> {}:{} {}", self.host, self.port, line);
        line.push('\n');

        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let reply = match self.read_timeout {
            Some(timeout) => match time::timeout(timeout, exchange(stream, &line)).await {
                Ok(x) => x?,
                Err(_) => return Err(TransportError::Timeout.into()),
            },
            None => exchange(stream, &line).await?,
        };
        log::debug!(
            "<- {}:{} {}",
            self.host,
            self.port,
            String::from_utf8_lossy(&reply).trim_end()
        );

        Response::decode(&reply).map_err(|x| TransportError::Malformed(x).into())
    }
}

async fn exchange(stream: TcpStream, line: &str) -> crate::Result<Vec<u8>> {
    let mut stream = BufReader::new(stream);
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await?;

    let reply = match read_line(&mut stream, MAX_RESPONSE_LEN).await? {
        Line::Complete(x) => x,
        Line::Closed => return Err(TransportError::ConnectionClosed.into()),
        Line::TooLong => return Err(TransportError::TooLong(MAX_RESPONSE_LEN).into()),
    };
    // the peer may already be gone, the response is complete either way
    let _ = stream.get_mut().shutdown().await;
    Ok(reply)
}

#[derive(Debug, PartialEq)]
enum Line {
    Complete(Vec<u8>),
    Closed,
    TooLong,
}

/// Read up to `limit` bytes looking for a newline.
///
/// A line cut short by the peer closing the connection still counts as complete.
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
