//! # Client Library for devproxy Remote Objects
//!
//! This library provides a local stand-in, the [`Proxy`], for an object living in another
//! process. It's just a slim layer combining `devproxy_protocol` with a line-oriented JSON
//! transport.
//!
//! Errors are captured in the [`enum@Error`] type. Failures which happened on the remote side
//! after a command was delivered surface as [`Error::Remote`], network failures are passed
//! through as [`Error::Io`].
//!
//! The [`Proxy`] accepts any [`Rpc`] implementation. This `#[async_trait]` abstracts over the
//! way a [`Command`] reaches the remote side. The concrete implementation shipped here is
//! [`line::LineRpc`], which opens a fresh TCP connection for every single command.
//!
//! ```no_run
//! use devproxy_client::{Proxy, Value};
//!
//! let mut widget = Proxy::new("127.0.0.1", 5905, "Widget")?;
//! let doubled = widget.call("get_value", vec![Value::Int(5)])?;
//! assert_eq!(doubled, Value::Int(10));
//! # Ok::<(), devproxy_client::Error>(())
//! ```
use std::io;

use async_trait::async_trait;
use devproxy_protocol::{Command, Response, UnmarshalError};
use thiserror::Error;

pub mod line;
pub mod proxy;
pub mod remote;

pub use devproxy_protocol as protocol;
pub use line::LineRpc;
pub use protocol::{Kwargs, RemoteVar, Value};
pub use proxy::{BoundMethod, Member, Proxy, RESERVED_PREFIX};
pub use remote::RemoteException;

/// The response could not be interpreted, or did not arrive at all.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unexpected response status `{0}`")]
    UnexpectedStatus(String),
    #[error("Malformed response: {0}")]
    Malformed(serde_json::Error),
    #[error("Success response without a return value")]
    MissingReturn,
    #[error("Connection closed before a response was received")]
    ConnectionClosed,
    #[error("Timeout")]
    Timeout,
    #[error("Response exceeds {0} bytes")]
    TooLong(u64),
}

/// Error type unifying errors that may occur on the transport or on the remote side.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error occurred: {0}")]
    Io(io::Error),
    #[error("Transport Error: {0}")]
    Transport(TransportError),
    #[error("Remote Exception: {0}")]
    Remote(RemoteException),
    #[error("Unmarshal Error: {0}")]
    Unmarshal(UnmarshalError),
    #[error("`{0}` is callable, not an attribute")]
    Callable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(x: io::Error) -> Self {
        Error::Io(x)
    }
}

impl From<TransportError> for Error {
    fn from(x: TransportError) -> Self {
        Error::Transport(x)
    }
}

impl From<RemoteException> for Error {
    fn from(x: RemoteException) -> Self {
        Error::Remote(x)
    }
}

impl From<UnmarshalError> for Error {
    fn from(x: UnmarshalError) -> Self {
        Error::Unmarshal(x)
    }
}

/// An `#[async_trait]` defining a request-response interface to the remote side.
///
/// Exactly one [`Response`] is produced per [`Command`]. Implementations must not retry.
#[async_trait]
pub trait Rpc: Send + 'static {
    async fn request(&mut self, command: Command) -> crate::Result<Response>;
}
